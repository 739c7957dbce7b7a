use crate::shared::constants::UNKNOWN_LABEL;
use crate::shared::face_box::FaceBox;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Known(String),
    Unknown,
}

impl Identity {
    pub fn is_known(&self) -> bool {
        matches!(self, Identity::Known(_))
    }

    /// Display label; unknown faces use the actuator's "Unauthorized" label.
    pub fn label(&self) -> &str {
        match self {
            Identity::Known(name) => name,
            Identity::Unknown => UNKNOWN_LABEL,
        }
    }
}

/// One located face from a recognition pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub face_box: FaceBox,
    pub identity: Identity,
    /// Distance to the closest roster embedding; `None` when the roster is empty.
    pub distance: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Denied,
}

impl AccessDecision {
    /// Granted iff any detection resolved to a known identity.
    pub fn from_detections(detections: &[Detection]) -> Self {
        if detections.iter().any(|d| d.identity.is_known()) {
            AccessDecision::Granted
        } else {
            AccessDecision::Denied
        }
    }

    pub fn is_granted(self) -> bool {
        self == AccessDecision::Granted
    }

    pub fn as_status(self) -> &'static str {
        match self {
            AccessDecision::Granted => "granted",
            AccessDecision::Denied => "denied",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(identity: Identity) -> Detection {
        Detection {
            face_box: FaceBox::new(0, 10, 10, 0),
            identity,
            distance: Some(0.3),
        }
    }

    #[test]
    fn test_no_detections_is_denied() {
        assert_eq!(AccessDecision::from_detections(&[]), AccessDecision::Denied);
    }

    #[test]
    fn test_only_unknown_is_denied() {
        let dets = vec![detection(Identity::Unknown), detection(Identity::Unknown)];
        assert_eq!(AccessDecision::from_detections(&dets), AccessDecision::Denied);
    }

    #[test]
    fn test_any_known_grants_even_with_unknowns() {
        let dets = vec![
            detection(Identity::Unknown),
            detection(Identity::Known("Seeleal13".into())),
        ];
        assert_eq!(AccessDecision::from_detections(&dets), AccessDecision::Granted);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(AccessDecision::Granted.as_status(), "granted");
        assert_eq!(AccessDecision::Denied.as_status(), "denied");
    }

    #[test]
    fn test_labels() {
        assert_eq!(Identity::Known("Ada".into()).label(), "Ada");
        assert_eq!(Identity::Unknown.label(), "Unauthorized");
    }
}
