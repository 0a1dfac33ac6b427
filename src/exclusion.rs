//! Per-type field exclusions, resolved per operation.

use crate::model::Mapped;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Merge,
    Serialize,
    Deserialize,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Serialize => write!(f, "serialize"),
            Self::Deserialize => write!(f, "deserialize"),
        }
    }
}

/// Declared exclusion slots of one mapped type.
///
/// A declared operation slot wins over the shared one even when it is
/// empty; the two are never combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionTable {
    merge: Option<Vec<&'static str>>,
    serialize: Option<Vec<&'static str>>,
    deserialize: Option<Vec<&'static str>>,
    shared: Option<Vec<&'static str>>,
}

impl ExclusionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(mut self, fields: &[&'static str]) -> Self {
        self.shared = Some(fields.to_vec());
        self
    }

    pub fn merge(mut self, fields: &[&'static str]) -> Self {
        self.merge = Some(fields.to_vec());
        self
    }

    pub fn serialize(mut self, fields: &[&'static str]) -> Self {
        self.serialize = Some(fields.to_vec());
        self
    }

    pub fn deserialize(mut self, fields: &[&'static str]) -> Self {
        self.deserialize = Some(fields.to_vec());
        self
    }

    fn slot(&self, operation: Operation) -> Option<&Vec<&'static str>> {
        match operation {
            Operation::Merge => self.merge.as_ref(),
            Operation::Serialize => self.serialize.as_ref(),
            Operation::Deserialize => self.deserialize.as_ref(),
        }
    }

    pub fn resolve(&self, operation: Operation) -> ExclusionSet {
        self.slot(operation)
            .or(self.shared.as_ref())
            .map(|fields| fields.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet(BTreeSet<&'static str>);

impl ExclusionSet {
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<&'static str> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = &'static str>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Field names `operation` must skip on `target`.
pub fn exclusions(target: &dyn Mapped, operation: Operation) -> ExclusionSet {
    target.descriptor().exclusions().resolve(operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_excludes_nothing() {
        let table = ExclusionTable::new();
        assert!(table.resolve(Operation::Merge).is_empty());
        assert!(table.resolve(Operation::Serialize).is_empty());
    }

    #[test]
    fn test_shared_slot_is_fallback() {
        let table = ExclusionTable::new().shared(&["secret"]).merge(&["id"]);
        let merge = table.resolve(Operation::Merge);
        assert!(merge.contains("id"));
        assert!(!merge.contains("secret"));

        assert!(table.resolve(Operation::Serialize).contains("secret"));
        assert!(table.resolve(Operation::Deserialize).contains("secret"));
    }

    #[test]
    fn test_declared_empty_slot_overrides_shared() {
        let table = ExclusionTable::new().shared(&["secret"]).serialize(&[]);
        assert!(table.resolve(Operation::Serialize).is_empty());
    }
}
