//! Type-context extraction: the bounded dependency closure of one function.
//!
//! The driver resolves the target function, seeds the walk with its owning
//! type, then visits parameter types, the return type and (for class-model
//! languages) the owner's fields, followed by one nested level of member
//! types. Each visited type contributes its declaration card and, unless it
//! is an external leaf, the impl blocks written for it: those in its own file
//! first, then those in other files in path order.

mod accumulator;
mod forest;
pub mod matching;
mod signature;
mod typedef;

pub use accumulator::Accumulator;
pub use forest::{Forest, TreeNode, build, filter_by_impl_owner, prune};
pub use signature::normalize_signature;
pub use typedef::{TypeDef, TypeKey};

use crate::config::ExtractionConfig;
use crate::error::{ContextError, ProviderError};
use crate::indexer::SourceLanguage;
use crate::provider::{Location, ProviderSession, SymbolProvider, TypeRef};
use matching::{head_identifier, is_trait_impl, split_top_level_commas};
use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Switches for one extraction
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Merge impl blocks of one type into a single body
    pub merge_impls: bool,
    /// Prefix type cards with their path trimmed to the project root
    pub include_path: bool,
    /// Render external types as leaf cards without descending into them
    pub ignore_std: bool,
    /// Keep trait impls of dependent types
    pub include_trait_impls: bool,
    pub project_root_marker: String,
    /// Optional cancellation flag, checked before each dependent type
    pub cancelled: Option<Arc<AtomicBool>>,
}

impl ExtractOptions {
    /// Set a cancellation flag. Once it is true the extraction stops at the
    /// next dependent and fails with [`ContextError::Cancelled`].
    pub fn with_cancellation_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(cancelled);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for ExtractOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            merge_impls: config.merge_impls,
            include_path: config.include_path,
            ignore_std: config.ignore_std,
            include_trait_impls: config.include_trait_impls,
            project_root_marker: config.project_root_marker.clone(),
            cancelled: None,
        }
    }
}

/// Result of one extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Rendered context, empty when nothing resolved
    pub context: String,
    /// Number of distinct types visited
    pub types_visited: usize,
    /// Number of entries in the rendered context
    pub entries: usize,
}

/// Extract the type context of the function `signature` declared in `path`.
///
/// The provider is started for the call and shut down before returning,
/// whether the extraction succeeds or not.
pub fn extract_context<P: SymbolProvider + ?Sized>(
    provider: &mut P,
    path: &Path,
    signature: &str,
    options: &ExtractOptions,
) -> Result<Extraction, ContextError> {
    let language = provider.language();
    let normalized = normalize_signature(signature, language);
    if normalized == ";" {
        return Err(ContextError::InvalidSignature(signature.to_string()));
    }

    let mut session = ProviderSession::start(provider)?;
    let declaration = session
        .resolve_declaration(path, &normalized)?
        .ok_or_else(|| ContextError::SignatureMismatch {
            path: path.display().to_string(),
            signature: normalized.clone(),
        })?;
    tracing::debug!(
        "Resolved '{}' in {:?} (owner: {:?})",
        declaration.name,
        path,
        declaration.owner.as_ref().map(|o| o.name.as_str())
    );

    let mut builder = ContextBuilder::new(&mut *session, options);

    if let Some(owner) = &declaration.owner {
        builder.visit(owner, true)?;
    }
    for type_ref in declaration.params.iter().chain(&declaration.ret) {
        builder.visit_ref(type_ref)?;
    }
    if language == SourceLanguage::Java
        && let Some(owner) = &declaration.owner
    {
        for type_ref in builder.provider.member_type_refs(owner)? {
            builder.visit_ref(&type_ref)?;
        }
    }

    // one nested level over the members of everything expanded so far
    let expanded = std::mem::take(&mut builder.expanded);
    for location in &expanded {
        for type_ref in builder.provider.member_type_refs(location)? {
            builder.visit_ref(&type_ref)?;
        }
    }

    let extraction = builder.finish();
    tracing::info!(
        "Extracted context for '{}': {} types, {} entries",
        declaration.name,
        extraction.types_visited,
        extraction.entries
    );
    Ok(extraction)
}

/// Mutable state threaded through one extraction
struct ContextBuilder<'a, P: SymbolProvider + ?Sized> {
    provider: &'a mut P,
    options: &'a ExtractOptions,
    visited: HashSet<TypeKey>,
    /// Non-leaf types whose members are still to be walked
    expanded: Vec<Location>,
    accumulator: Accumulator,
}

impl<'a, P: SymbolProvider + ?Sized> ContextBuilder<'a, P> {
    fn new(provider: &'a mut P, options: &'a ExtractOptions) -> Self {
        Self {
            provider,
            options,
            visited: HashSet::new(),
            expanded: Vec::new(),
            accumulator: Accumulator::new(options.merge_impls),
        }
    }

    fn finish(self) -> Extraction {
        Extraction {
            context: self.accumulator.to_string(),
            types_visited: self.visited.len(),
            entries: self.accumulator.len(),
        }
    }

    /// Whether a resolved type may be descended into
    fn is_expandable(&self, location: &Location) -> bool {
        !(self.options.ignore_std && location.is_external())
    }

    /// Render a type once. The owner is always expanded in full.
    fn visit(&mut self, location: &Location, is_owner: bool) -> Result<(), ContextError> {
        if !self.visited.insert(TypeKey::from(location)) {
            return Ok(());
        }

        let Some(text) = self.provider.describe(location)? else {
            tracing::debug!("No declaration text for '{}' at {:?}", location.name, location.path);
            return Ok(());
        };
        let typedef = TypeDef::new(location, text);
        self.accumulator.append_typedef(
            &typedef,
            self.options.include_path,
            &self.options.project_root_marker,
        );

        if !is_owner && !self.is_expandable(location) {
            tracing::debug!("'{}' is external; kept as a leaf", location.name);
            return Ok(());
        }

        let mut impls = Vec::new();
        for file in self.provider.impl_files(location)? {
            let flat = self.provider.flat_structure_of(&file)?;
            impls.extend(filter_by_impl_owner(TreeNode::from_flat(flat), &location.name));
        }
        if !is_owner && !self.options.include_trait_impls {
            impls.retain(|tree| !is_trait_impl(&tree.node.label));
        }
        for tree in &impls {
            self.accumulator.append_node(tree);
        }

        self.expanded.push(location.clone());
        Ok(())
    }

    fn visit_ref(&mut self, type_ref: &TypeRef) -> Result<(), ContextError> {
        if self.options.is_cancelled() {
            tracing::info!("Extraction cancelled after {} types", self.visited.len());
            return Err(ContextError::Cancelled);
        }
        let generics = type_ref.generics.clone();
        match self.locate(&type_ref.path, type_ref.offset, generics, type_ref.arity)? {
            Some(location) => self.visit(&location, false),
            None => {
                tracing::debug!("Unresolved type '{}' in {:?}", type_ref.name, type_ref.path);
                Ok(())
            }
        }
    }

    /// Definition lookup where a timeout counts as unresolved
    fn definition(&mut self, path: &Path, offset: usize) -> Result<Option<Location>, ContextError> {
        match self.provider.definition_of(path, offset) {
            Ok(found) => Ok(found),
            Err(ProviderError::Timeout { query, millis }) => {
                tracing::warn!(
                    "{} at {:?}:{} exceeded {} ms; treating the type as unresolved",
                    query,
                    path,
                    offset,
                    millis
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the type named at `offset`, falling back to its generic
    /// arguments when the head is unknown or external
    fn locate(
        &mut self,
        path: &Path,
        offset: usize,
        generics: Option<Range<usize>>,
        arity: usize,
    ) -> Result<Option<Location>, ContextError> {
        let head = self.definition(path, offset)?;
        if let Some(location) = &head
            && self.is_expandable(location)
        {
            return Ok(head);
        }
        if let Some(span) = generics
            && let Some(found) = self.probe_generic_args(path, span, arity)?
        {
            return Ok(Some(found));
        }
        Ok(head)
    }

    /// Try each generic argument in turn; the first one that resolves to an
    /// expandable type wins
    fn probe_generic_args(
        &mut self,
        path: &Path,
        span: Range<usize>,
        arity: usize,
    ) -> Result<Option<Location>, ContextError> {
        let text = self.provider.source_text(path)?;
        let Some(inner) = text.get(span.clone()) else {
            tracing::debug!("Generic span {:?} out of range in {:?}", span, path);
            return Ok(None);
        };

        let args = split_top_level_commas(inner);
        if args.len() > arity {
            tracing::debug!(
                "Parsed {} generic arguments but found {} in '{}'; skipping the rest",
                arity,
                args.len(),
                inner
            );
        }

        for (rel, arg) in args.into_iter().take(arity) {
            let Some(head) = head_identifier(arg) else {
                continue;
            };
            let base = span.start + rel;
            let nested = head.generics.map(|g| base + g.start..base + g.end);
            let nested_arity = nested
                .as_ref()
                .and_then(|g| text.get(g.clone()))
                .map_or(0, |t| split_top_level_commas(t).len());
            if let Some(found) = self.locate(path, base + head.offset, nested, nested_arity)?
                && self.is_expandable(&found)
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests;
