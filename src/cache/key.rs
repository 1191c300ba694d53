use std::fmt;

/// Cache key: an ordered tuple of string segments, e.g. `(eventsubs, <uuid>)`.
///
/// Keys compare by deep value equality, so equal tuples share cache state.
/// Invalidation works on the prefix relation: invalidating `(eventsubs)` also
/// hits `(eventsubs, <uuid>)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn of(resource: impl Into<String>) -> Self {
        Self(vec![resource.into()])
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Append one segment, e.g. `QueryKey::of("teams").with(uuid)`.
    pub fn with(mut self, segment: impl ToString) -> Self {
        self.0.push(segment.to_string());
        self
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(":"))
    }
}
