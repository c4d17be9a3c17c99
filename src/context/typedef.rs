//! Resolved type declarations and their identity

use crate::provider::Location;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// Identity of a declaration: where it lives and what it is called
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub path: PathBuf,
    pub name: String,
    pub offset: usize,
}

impl From<&Location> for TypeKey {
    fn from(location: &Location) -> Self {
        Self {
            path: location.path.clone(),
            name: location.name.clone(),
            offset: location.offset,
        }
    }
}

/// A declaration with its rendered text.
///
/// Equality and hashing only look at the identity, so two lookups of the
/// same type compare equal even if rendered differently.
#[derive(Debug, Clone)]
pub struct TypeDef {
    key: TypeKey,
    text: String,
}

impl TypeDef {
    pub fn new(location: &Location, text: impl Into<String>) -> Self {
        Self {
            key: TypeKey::from(location),
            text: text.into(),
        }
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn path(&self) -> &std::path::Path {
        &self.key.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for TypeDef {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeDef {}

impl Hash for TypeDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
