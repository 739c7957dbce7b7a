use super::face_encoder::Embedding;
use super::identity::Identity;
use super::roster::AuthorizedRoster;

/// Resolves embeddings against the roster with a two-stage distance check.
///
/// The closest reference embedding wins, but only if it passes both the
/// coarse tolerance (`distance <= tolerance`) and the strict acceptance bound
/// (`distance < acceptance_threshold`).
#[derive(Clone, Copy, Debug)]
pub struct FaceMatcher {
    tolerance: f64,
    acceptance_threshold: f64,
}

/// Outcome of matching one embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub identity: Identity,
    pub distance: Option<f64>,
}

impl FaceMatcher {
    pub fn new(tolerance: f64, acceptance_threshold: f64) -> Self {
        Self {
            tolerance,
            acceptance_threshold,
        }
    }

    pub fn resolve(&self, roster: &AuthorizedRoster, embedding: &Embedding) -> MatchResult {
        let best = roster
            .references()
            .map(|(name, reference)| (name, euclidean_distance(reference, embedding)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((name, distance)) => {
                let coarse = distance <= self.tolerance;
                let strict = distance < self.acceptance_threshold;
                let identity = if coarse && strict {
                    Identity::Known(name.to_string())
                } else {
                    Identity::Unknown
                };
                MatchResult {
                    identity,
                    distance: Some(distance),
                }
            }
            None => MatchResult {
                identity: Identity::Unknown,
                distance: None,
            },
        }
    }
}

/// Euclidean distance; mismatched lengths compare over the shorter prefix.
pub fn euclidean_distance(a: &Embedding, b: &Embedding) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x as f64) - (*y as f64);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::config::AccessConfig;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    fn roster_with(name: &str, embedding: Embedding) -> AuthorizedRoster {
        let mut roster = AuthorizedRoster::new();
        roster.add(name, embedding);
        roster
    }

    #[test]
    fn test_euclidean_distance() {
        assert_relative_eq!(euclidean_distance(&array![0.0, 0.0], &array![3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_empty_roster_resolves_unknown() {
        let matcher = FaceMatcher::new(0.6, 0.5);
        let result = matcher.resolve(&AuthorizedRoster::new(), &array![0.0]);
        assert_eq!(result.identity, Identity::Unknown);
        assert_eq!(result.distance, None);
    }

    #[rstest]
    #[case::well_inside(0.3, true)]
    #[case::just_below_threshold(0.49, true)]
    #[case::at_threshold(0.5, false)]
    #[case::between_threshold_and_tolerance(0.55, false)]
    #[case::beyond_tolerance(0.7, false)]
    fn test_acceptance_boundaries(#[case] distance: f32, #[case] known: bool) {
        let matcher = FaceMatcher::new(0.6, 0.5);
        let roster = roster_with("Seeleal13", array![0.0, 0.0]);
        let result = matcher.resolve(&roster, &array![distance, 0.0]);
        assert_eq!(result.identity.is_known(), known, "distance {distance}");
        assert_relative_eq!(result.distance.unwrap(), distance as f64, epsilon = 1e-6);
    }

    #[test]
    fn test_coarse_check_must_also_pass() {
        // Strict bound looser than the tolerance: coarse test rejects.
        let matcher = FaceMatcher::new(0.4, 0.5);
        let roster = roster_with("Seeleal13", array![0.0]);
        let result = matcher.resolve(&roster, &array![0.45]);
        assert_eq!(result.identity, Identity::Unknown);
    }

    /// Unit vector at `cosine` similarity to `[1, 0]`.
    fn at_cosine(cosine: f32) -> Embedding {
        array![cosine, (1.0 - cosine * cosine).sqrt()]
    }

    #[rstest]
    #[case::same_person_live_frame(0.7, true)]
    #[case::just_above_acceptance(0.55, true)]
    #[case::coarse_only(0.45, false)]
    #[case::different_person(0.3, false)]
    fn test_default_matcher_on_normalized_embeddings(#[case] cosine: f32, #[case] known: bool) {
        let matcher = AccessConfig::default().matcher();
        let roster = roster_with("Seeleal13", array![1.0, 0.0]);
        let result = matcher.resolve(&roster, &at_cosine(cosine));
        let expected = (2.0 - 2.0 * cosine as f64).sqrt();
        assert_relative_eq!(result.distance.unwrap(), expected, epsilon = 1e-5);
        assert_eq!(result.identity.is_known(), known, "cosine {cosine}");
    }

    #[test]
    fn test_closest_reference_wins() {
        let matcher = FaceMatcher::new(0.6, 0.5);
        let mut roster = AuthorizedRoster::new();
        roster.add("far", array![0.4, 0.0]);
        roster.add("near", array![0.1, 0.0]);
        let result = matcher.resolve(&roster, &array![0.0, 0.0]);
        assert_eq!(result.identity, Identity::Known("near".into()));
    }

    #[test]
    fn test_any_reference_of_an_identity_can_match() {
        let matcher = FaceMatcher::new(0.6, 0.5);
        let mut roster = AuthorizedRoster::new();
        roster.add("Seeleal13", array![5.0, 5.0]);
        roster.add("Seeleal13", array![0.0, 0.2]);
        let result = matcher.resolve(&roster, &array![0.0, 0.0]);
        assert_eq!(result.identity, Identity::Known("Seeleal13".into()));
    }
}
