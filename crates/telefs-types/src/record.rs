use std::fmt;

use serde::{Deserialize, Serialize};

/// A single catalog entry.
///
/// The catalog format carries names only: no size, hash, or timestamp is
/// retained for a stored object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRecord {
    name: String,
}

impl ObjectRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The object's path-like name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_name(self) -> String {
        self.name
    }
}

impl fmt::Display for ObjectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for ObjectRecord {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ObjectRecord {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_string() {
        let record = ObjectRecord::new("docs/a.txt");
        assert_eq!(serde_json::to_string(&record).unwrap(), "\"docs/a.txt\"");
    }

    #[test]
    fn display_is_name() {
        assert_eq!(ObjectRecord::from("x").to_string(), "x");
    }
}
