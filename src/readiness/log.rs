/// Fixed substrings that mark a launched container as likely ready.
///
/// Matching is case-sensitive and optimistic only: the health prober has
/// the final word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessMarkers {
    patterns: Vec<String>,
}

impl ReadinessMarkers {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// The first marker contained in `line`, if any.
    pub fn find(&self, line: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| line.contains(p.as_str()))
            .map(String::as_str)
    }
}
