//! Fields and field tables
//!
//! Field objects are built once by the declaring type and shared through
//! `Arc`: subtypes, mixins, unions and mapped types reference them instead
//! of cloning, so `Field::origin` always names the declaring type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// What a complex type does with input keys it does not declare
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "AdditionalFieldsRepr", into = "String")]
pub enum AdditionalFields {
    /// Pass unknown keys through untouched
    Allow,
    /// Drop unknown keys silently
    #[default]
    Forbid,
    /// Reject unknown keys with a validation issue
    Error,
}

impl AdditionalFields {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Forbid => "forbid",
            Self::Error => "error",
        }
    }

    /// Policy of a union over several members: allow > error > forbid
    pub fn combine(policies: impl IntoIterator<Item = Self>) -> Self {
        policies.into_iter().fold(Self::Forbid, |acc, p| match (acc, p) {
            (Self::Allow, _) | (_, Self::Allow) => Self::Allow,
            (Self::Error, _) | (_, Self::Error) => Self::Error,
            _ => Self::Forbid,
        })
    }
}

impl fmt::Display for AdditionalFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AdditionalFields> for String {
    fn from(policy: AdditionalFields) -> Self {
        policy.as_str().to_string()
    }
}

/// `true`/`false` are accepted as allow/forbid
#[derive(Deserialize)]
#[serde(untagged)]
enum AdditionalFieldsRepr {
    Flag(bool),
    Name(PolicyName),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum PolicyName {
    Allow,
    Forbid,
    Error,
}

impl From<AdditionalFieldsRepr> for AdditionalFields {
    fn from(repr: AdditionalFieldsRepr) -> Self {
        match repr {
            AdditionalFieldsRepr::Flag(true) | AdditionalFieldsRepr::Name(PolicyName::Allow) => Self::Allow,
            AdditionalFieldsRepr::Flag(false) | AdditionalFieldsRepr::Name(PolicyName::Forbid) => Self::Forbid,
            AdditionalFieldsRepr::Name(PolicyName::Error) => Self::Error,
        }
    }
}

/// By-name reference to a type in some document
///
/// Field and item types are never held as live objects, which keeps
/// self-referencing types representable in an immutable graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeLink {
    pub document: String,
    pub name: String,
}

impl TypeLink {
    pub fn new(document: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.document, self.name)
    }
}

/// A field as declared by its owning type
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeLink,
    pub is_array: bool,
    pub required: bool,
    pub exclusive: bool,
    pub default: Option<Value>,
    pub fixed: Option<Value>,
    pub description: Option<String>,
    pub readonly: bool,
    pub writeonly: bool,
    pub deprecated: bool,
    /// Name of the type that declared the field
    pub origin: String,
}

/// A shared field plus the `required` flag in effect for one type
///
/// Mapped `partial`/`required` types flip the flag here and leave the
/// shared [`Field`] untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub field: Arc<Field>,
    pub required: bool,
}

impl FieldRef {
    pub fn new(field: Arc<Field>) -> Self {
        let required = field.required;
        Self { field, required }
    }

    pub fn with_required(&self, required: bool) -> Self {
        Self {
            field: Arc::clone(&self.field),
            required,
        }
    }

    /// Whether both refer to the same declared field object
    pub fn shares_field(&self, other: &FieldRef) -> bool {
        Arc::ptr_eq(&self.field, &other.field)
    }
}

impl Deref for FieldRef {
    type Target = Field;

    fn deref(&self) -> &Field {
        &self.field
    }
}

/// Insertion-ordered fields with case-insensitive lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTable {
    entries: IndexMap<String, FieldRef>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldRef> {
        self.entries.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    /// Insert or replace; a replaced field keeps its position
    pub fn insert(&mut self, field: FieldRef) {
        self.entries.insert(field.name.to_lowercase(), field);
    }

    /// Insert unless a field with that name is already present
    pub fn insert_if_absent(&mut self, field: FieldRef) -> bool {
        let key = field.name.to_lowercase();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, field);
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldRef> {
        self.entries.shift_remove(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldRef> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|f| f.name.as_str())
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&FieldRef) -> bool) {
        self.entries.retain(|_, f| keep(f));
    }

    pub fn map_required(&mut self, mut required: impl FnMut(&FieldRef) -> bool) {
        for field in self.entries.values_mut() {
            field.required = required(field);
        }
    }
}

impl<'a> IntoIterator for &'a FieldTable {
    type Item = &'a FieldRef;
    type IntoIter = indexmap::map::Values<'a, String, FieldRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl FromIterator<FieldRef> for FieldTable {
    fn from_iter<I: IntoIterator<Item = FieldRef>>(iter: I) -> Self {
        let mut table = Self::new();
        for field in iter {
            table.insert(field);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn field(name: &str, origin: &str) -> FieldRef {
        FieldRef::new(Arc::new(Field {
            name: name.to_string(),
            ty: TypeLink::new("builtins", "string"),
            is_array: false,
            required: true,
            exclusive: false,
            default: None,
            fixed: None,
            description: None,
            readonly: false,
            writeonly: false,
            deprecated: false,
            origin: origin.to_string(),
        }))
    }

    #[rstest]
    #[case(&[], AdditionalFields::Forbid)]
    #[case(&[AdditionalFields::Forbid, AdditionalFields::Error], AdditionalFields::Error)]
    #[case(&[AdditionalFields::Error, AdditionalFields::Allow, AdditionalFields::Forbid], AdditionalFields::Allow)]
    fn test_combine_policies(#[case] policies: &[AdditionalFields], #[case] expected: AdditionalFields) {
        assert_eq!(AdditionalFields::combine(policies.iter().copied()), expected);
    }

    #[test]
    fn test_policy_accepts_bool_or_name() {
        let parsed: Vec<AdditionalFields> = serde_json::from_str(r#"[true, false, "error", "allow"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                AdditionalFields::Allow,
                AdditionalFields::Forbid,
                AdditionalFields::Error,
                AdditionalFields::Allow
            ]
        );
        assert_eq!(serde_json::to_string(&AdditionalFields::Error).unwrap(), r#""error""#);
    }

    #[test]
    fn test_table_lookup_is_case_insensitive() {
        let mut table = FieldTable::new();
        table.insert(field("firstName", "User"));
        assert!(table.contains("FIRSTNAME"));
        assert_eq!(table.get("firstname").map(|f| f.origin.as_str()), Some("User"));
    }

    #[test]
    fn test_replace_keeps_position_and_first_wins_on_insert_if_absent() {
        let mut table: FieldTable = [field("a", "Base"), field("b", "Base")].into_iter().collect();
        table.insert(field("A", "Child"));
        assert!(!table.insert_if_absent(field("b", "Other")));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["A", "b"]);
        assert_eq!(table.get("b").map(|f| f.origin.as_str()), Some("Base"));
    }

    #[test]
    fn test_required_override_shares_field() {
        let original = field("a", "Base");
        let relaxed = original.with_required(false);
        assert!(relaxed.shares_field(&original));
        assert!(!relaxed.required);
        assert!(relaxed.field.required);
    }
}
