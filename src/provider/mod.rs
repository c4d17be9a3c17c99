//! Symbol providers: syntax and definition queries consumed by the context
//! driver.
//!
//! A provider is started before its first query and shut down after its
//! last; [`ProviderSession`] ties that lifecycle to a scope. Providers are
//! not shared between concurrent extractions.

mod java;
mod rust;
mod types;
mod workspace;

pub use java::JavaProvider;
pub use rust::RustProvider;
pub use types::{Declaration, Location, NodeKind, Origin, StructureNode, TypeRef};
pub use workspace::{FileScope, ImplSite, Import, IndexedType, WorkspaceIndex};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::indexer::SourceLanguage;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// Capabilities the context driver needs from a language backend
pub trait SymbolProvider {
    fn language(&self) -> SourceLanguage;

    /// Prepare the provider for queries
    fn start(&mut self) -> Result<(), ProviderError>;

    /// Release everything acquired by `start`. Must be safe to call twice.
    fn shutdown(&mut self);

    /// Find the function in `path` structurally equal to a normalized
    /// signature. `Ok(None)` when nothing matches.
    fn resolve_declaration(
        &mut self,
        path: &Path,
        signature: &str,
    ) -> Result<Option<Declaration>, ProviderError>;

    /// Jump to the declaration of the type named at `offset` in `path`.
    /// `Ok(None)` for built-in or unknown types.
    fn definition_of(&mut self, path: &Path, offset: usize)
    -> Result<Option<Location>, ProviderError>;

    /// Rendered declaration of a type, without method bodies
    fn describe(&mut self, location: &Location) -> Result<Option<String>, ProviderError>;

    /// Types referenced by the members (fields, variants) of a type
    fn member_type_refs(&mut self, location: &Location) -> Result<Vec<TypeRef>, ProviderError>;

    /// Every declaration of a file as a flat, parent-indexed list
    fn flat_structure_of(&mut self, path: &Path) -> Result<Vec<StructureNode>, ProviderError>;

    /// Files that may hold implementation blocks for a type, its own file
    /// first. Backends without detached impls only report the declaring file.
    fn impl_files(&mut self, location: &Location) -> Result<Vec<PathBuf>, ProviderError> {
        Ok(vec![location.path.clone()])
    }

    /// Raw file content
    fn source_text(&mut self, path: &Path) -> Result<String, ProviderError>;
}

impl<P: SymbolProvider + ?Sized> SymbolProvider for Box<P> {
    fn language(&self) -> SourceLanguage {
        (**self).language()
    }

    fn start(&mut self) -> Result<(), ProviderError> {
        (**self).start()
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }

    fn resolve_declaration(
        &mut self,
        path: &Path,
        signature: &str,
    ) -> Result<Option<Declaration>, ProviderError> {
        (**self).resolve_declaration(path, signature)
    }

    fn definition_of(
        &mut self,
        path: &Path,
        offset: usize,
    ) -> Result<Option<Location>, ProviderError> {
        (**self).definition_of(path, offset)
    }

    fn describe(&mut self, location: &Location) -> Result<Option<String>, ProviderError> {
        (**self).describe(location)
    }

    fn member_type_refs(&mut self, location: &Location) -> Result<Vec<TypeRef>, ProviderError> {
        (**self).member_type_refs(location)
    }

    fn flat_structure_of(&mut self, path: &Path) -> Result<Vec<StructureNode>, ProviderError> {
        (**self).flat_structure_of(path)
    }

    fn impl_files(&mut self, location: &Location) -> Result<Vec<PathBuf>, ProviderError> {
        (**self).impl_files(location)
    }

    fn source_text(&mut self, path: &Path) -> Result<String, ProviderError> {
        (**self).source_text(path)
    }
}

/// A started provider that is shut down when the session is dropped,
/// including on early returns and unwinding.
pub struct ProviderSession<'a, P: SymbolProvider + ?Sized> {
    provider: &'a mut P,
}

impl<'a, P: SymbolProvider + ?Sized> ProviderSession<'a, P> {
    pub fn start(provider: &'a mut P) -> Result<Self, ProviderError> {
        if let Err(e) = provider.start() {
            provider.shutdown();
            return Err(e);
        }
        Ok(Self { provider })
    }
}

impl<P: SymbolProvider + ?Sized> Deref for ProviderSession<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.provider
    }
}

impl<P: SymbolProvider + ?Sized> DerefMut for ProviderSession<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.provider
    }
}

impl<P: SymbolProvider + ?Sized> Drop for ProviderSession<'_, P> {
    fn drop(&mut self) {
        self.provider.shutdown();
    }
}

/// Build the backend for `language` rooted at `workspace`
pub fn provider_for(
    language: SourceLanguage,
    workspace: &Path,
    config: &ProviderConfig,
) -> Result<Box<dyn SymbolProvider + Send>, ProviderError> {
    Ok(match language {
        SourceLanguage::Rust => Box::new(RustProvider::new(workspace, config.clone())?),
        SourceLanguage::Java => Box::new(JavaProvider::new(workspace, config.clone())?),
    })
}
