//! Data exchanged between the symbol providers and the context driver.
//!
//! Positions are byte offsets into the file content the provider parsed.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;

/// Syntactic kind of a structure node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A function or method
    Function,
    /// An implementation block (`impl Type`, `impl Trait for Type`)
    Impl,
    /// Anything else, tagged with the parser's node kind
    Other(String),
}

impl NodeKind {
    /// Kinds kept when shaping a forest
    pub fn is_function_or_impl(&self) -> bool {
        matches!(self, NodeKind::Function | NodeKind::Impl)
    }
}

/// A declaration as reported by `flat_structure_of`.
///
/// `parent` indexes into the same flat list and must point to an earlier
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StructureNode {
    /// Declared name (or rendered header for impl blocks)
    pub label: String,
    /// Signature text; for functions the name is omitted
    pub detail: Option<String>,
    pub kind: NodeKind,
    pub parent: Option<usize>,
}

impl StructureNode {
    pub fn new(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            label: label.into(),
            detail: None,
            kind,
            parent: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Where a declaration comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Declared inside the workspace
    Project,
    /// Standard library, platform or third-party source
    External,
}

/// A resolved type declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub path: PathBuf,
    pub name: String,
    /// Byte offset of the declaration item
    pub offset: usize,
    pub origin: Origin,
}

impl Location {
    pub fn is_external(&self) -> bool {
        self.origin == Origin::External
    }
}

/// A type mentioned somewhere in source, not yet resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// File containing the mention
    pub path: PathBuf,
    /// Head identifier, e.g. `Vec` for `Vec<Foo>`
    pub name: String,
    /// Byte offset of the head identifier
    pub offset: usize,
    /// Text span between the angle brackets of the generic arguments
    pub generics: Option<Range<usize>>,
    /// Number of generic arguments the parser saw
    pub arity: usize,
}

impl TypeRef {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, offset: usize) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            offset,
            generics: None,
            arity: 0,
        }
    }

    pub fn with_generics(mut self, span: Range<usize>, arity: usize) -> Self {
        self.generics = Some(span);
        self.arity = arity;
        self
    }
}

/// The function matched by `resolve_declaration`
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    /// Type the function belongs to, when it could be located
    pub owner: Option<Location>,
    /// Type references of the parameters, in parameter order
    pub params: Vec<TypeRef>,
    /// Type references of the return type
    pub ret: Vec<TypeRef>,
}
