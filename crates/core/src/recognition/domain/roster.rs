use super::face_encoder::Embedding;

/// An authorized identity and its reference embeddings.
#[derive(Clone, Debug)]
pub struct RosterEntry {
    pub name: String,
    pub embeddings: Vec<Embedding>,
}

/// The fixed set of authorized identities.
///
/// Built once at startup and shared read-only between threads.
#[derive(Clone, Debug, Default)]
pub struct AuthorizedRoster {
    entries: Vec<RosterEntry>,
}

impl AuthorizedRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference embedding, creating the entry on first use of `name`.
    pub fn add(&mut self, name: &str, embedding: Embedding) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.embeddings.push(embedding),
            None => self.entries.push(RosterEntry {
                name: name.to_string(),
                embeddings: vec![embedding],
            }),
        }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every `(name, embedding)` pair, in insertion order.
    pub fn references(&self) -> impl Iterator<Item = (&str, &Embedding)> {
        self.entries
            .iter()
            .flat_map(|e| e.embeddings.iter().map(move |emb| (e.name.as_str(), emb)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_add_creates_entry() {
        let mut roster = AuthorizedRoster::new();
        roster.add("Seeleal13", array![0.1, 0.2]);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.entries()[0].name, "Seeleal13");
    }

    #[test]
    fn test_add_same_name_appends_embedding() {
        let mut roster = AuthorizedRoster::new();
        roster.add("Seeleal13", array![0.1, 0.2]);
        roster.add("Seeleal13", array![0.3, 0.4]);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.entries()[0].embeddings.len(), 2);
        assert_eq!(roster.references().count(), 2);
    }

    #[test]
    fn test_references_preserve_order() {
        let mut roster = AuthorizedRoster::new();
        roster.add("a", array![1.0]);
        roster.add("b", array![2.0]);
        let names: Vec<&str> = roster.references().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
