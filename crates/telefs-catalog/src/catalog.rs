//! The in-memory form of a catalog snapshot.

use std::collections::HashSet;

use telefs_types::ObjectRecord;

/// An ordered list of object names with no duplicates.
///
/// Order is append order. A `Catalog` handed out by the store is a snapshot:
/// edits return a new value and leave the original untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<ObjectRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from names in order. Later duplicates are dropped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let records = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| seen.insert(name.clone()))
            .map(ObjectRecord::new)
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(ObjectRecord::name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name() == name)
    }

    /// A copy with `name` appended, or an unchanged copy if it is present.
    pub fn with_appended(&self, name: &str) -> Catalog {
        let mut next = self.clone();
        if !next.contains(name) {
            next.records.push(ObjectRecord::new(name));
        }
        next
    }

    /// A copy extended with every entry of `other` not already present, in
    /// `other`'s order.
    pub fn merged_with(&self, other: &Catalog) -> Catalog {
        let mut seen: HashSet<&str> = self.names().collect();
        let mut next = self.clone();
        for record in other.records() {
            if seen.insert(record.name()) {
                next.records.push(record.clone());
            }
        }
        next
    }

    /// Names in `self` that `other` lacks, in `self`'s order.
    pub fn missing_from<'a>(&'a self, other: &Catalog) -> Vec<&'a str> {
        let present: HashSet<&str> = other.names().collect();
        self.names().filter(|n| !present.contains(n)).collect()
    }

    /// Entries whose name starts with `prefix`, in catalog order. An empty
    /// prefix matches everything.
    pub fn filter_prefix(&self, prefix: &str) -> Vec<ObjectRecord> {
        self.records
            .iter()
            .filter(|r| r.name().starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// The edit a writer wants reflected in the catalog.
///
/// When a publish loses a race the store reloads the newer catalog and
/// re-applies the delta on top of it, instead of resending its stale
/// snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogDelta {
    additions: Vec<String>,
}

impl CatalogDelta {
    /// A delta that adds a single name.
    pub fn append(name: impl Into<String>) -> Self {
        Self {
            additions: vec![name.into()],
        }
    }

    /// Also add `names`, keeping the first occurrence of each.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.additions.contains(&name) {
                self.additions.push(name);
            }
        }
    }

    pub fn additions(&self) -> &[String] {
        &self.additions
    }

    /// `catalog` with every addition appended that is not yet present.
    pub fn apply(&self, catalog: &Catalog) -> Catalog {
        self.additions
            .iter()
            .fold(catalog.clone(), |acc, name| acc.with_appended(name))
    }
}
