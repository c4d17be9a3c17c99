//! Workspace state shared by the tree-sitter backends: the declaration
//! index used for definition lookups, the open-file cache and the per-query
//! clock.

use super::types::{Location, Origin};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::indexer::{FileWalker, SourceLanguage};
use std::collections::HashMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tree_sitter::{Language, Node, Parser, Tree};

/// Language-specific hooks used to build and query the workspace index
pub trait Grammar {
    const LANGUAGE: SourceLanguage;

    fn ts_language() -> Language;

    /// Named type declarations in a file as `(name, declaration start)`
    fn type_declarations(root: Node<'_>, source: &str) -> Vec<(String, usize)>;

    /// Self types of the impl blocks in a file as `(name, qualifier)`.
    /// Class-model languages have none.
    fn impl_targets(_root: Node<'_>, _source: &str) -> Vec<(String, Vec<String>)> {
        Vec::new()
    }

    /// Module identity and imports of a file
    fn file_scope(root: Node<'_>, source: &str, path: &Path) -> FileScope;

    /// Key comparable with `FileScope::module` for an import's module path
    fn module_key(module: &[String]) -> Option<String>;
}

/// One imported name. Wildcard imports use `*` as the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: Vec<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl Import {
    pub fn new(module: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            module,
            name: name.into(),
            alias: None,
        }
    }

    /// Name the import is visible under
    pub fn visible_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileScope {
    /// Module (Rust) or package (Java) the file belongs to
    pub module: Option<String>,
    pub imports: Vec<Import>,
}

/// A type declaration recorded in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedType {
    pub name: String,
    pub path: PathBuf,
    pub offset: usize,
    pub origin: Origin,
}

impl IndexedType {
    pub fn location(&self) -> Location {
        Location {
            path: self.path.clone(),
            name: self.name.clone(),
            offset: self.offset,
            origin: self.origin,
        }
    }
}

/// An impl block written for a type named `name` somewhere in the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplSite {
    pub path: PathBuf,
    /// Path qualifying the self type, e.g. `crate::model` in `impl crate::model::Foo`
    pub qualifier: Vec<String>,
}

/// Type declarations of the workspace and external roots, by name
#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    types: HashMap<String, Vec<IndexedType>>,
    impls: HashMap<String, Vec<ImplSite>>,
    scopes: HashMap<PathBuf, FileScope>,
    external_roots: Vec<PathBuf>,
    std_path_markers: Vec<String>,
}

impl WorkspaceIndex {
    /// Walk and parse every source file of `G`'s language
    pub fn build<G: Grammar>(workspace: &Path, config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut parser = new_parser::<G>()?;
        let mut index = WorkspaceIndex {
            std_path_markers: config.std_path_markers.clone(),
            ..Default::default()
        };

        let mut roots = vec![(workspace.to_path_buf(), false)];
        for root in &config.external_roots {
            match root.canonicalize() {
                Ok(canonical) => {
                    index.external_roots.push(canonical.clone());
                    roots.push((canonical, true));
                }
                Err(e) => tracing::warn!("Skipping external root {:?}: {}", root, e),
            }
        }

        for (root, external) in roots {
            let files = FileWalker::new(&root, config.max_file_size)
                .with_exclude_patterns(config.exclude_patterns.clone())
                .with_language(G::LANGUAGE)
                .walk()
                .map_err(|e| ProviderError::Unavailable(format!("{:#}", e)))?;

            tracing::debug!(
                "Indexing {} {} files under {:?}{}",
                files.len(),
                G::LANGUAGE,
                root,
                if external { " (external)" } else { "" }
            );

            for file in files {
                let Some(tree) = parser.parse(&file.content, None) else {
                    tracing::warn!("Parser gave up on {:?}", file.path);
                    continue;
                };
                let root_node = tree.root_node();
                let origin = if external {
                    Origin::External
                } else {
                    index.origin_of(&file.path)
                };
                for (name, offset) in G::type_declarations(root_node, &file.content) {
                    index.types.entry(name.clone()).or_default().push(IndexedType {
                        name,
                        path: file.path.clone(),
                        offset,
                        origin,
                    });
                }
                for (name, qualifier) in G::impl_targets(root_node, &file.content) {
                    index.impls.entry(name).or_default().push(ImplSite {
                        path: file.path.clone(),
                        qualifier,
                    });
                }
                index.scopes.insert(
                    file.path.clone(),
                    G::file_scope(root_node, &file.content, &file.path),
                );
            }
        }

        for candidates in index.types.values_mut() {
            candidates.sort_by(|a, b| a.path.cmp(&b.path).then(a.offset.cmp(&b.offset)));
        }
        for sites in index.impls.values_mut() {
            sites.sort_by(|a, b| a.path.cmp(&b.path));
            sites.dedup();
        }

        Ok(index)
    }

    pub fn file_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.values().map(Vec::len).sum()
    }

    pub fn scope(&self, path: &Path) -> Option<&FileScope> {
        self.scopes.get(path)
    }

    /// External when under an external root or a standard-library path
    pub fn origin_of(&self, path: &Path) -> Origin {
        let text = path.to_string_lossy();
        if self.external_roots.iter().any(|root| path.starts_with(root))
            || self
                .std_path_markers
                .iter()
                .any(|marker| !marker.is_empty() && text.contains(marker.as_str()))
        {
            Origin::External
        } else {
            Origin::Project
        }
    }

    /// Location of a declaration found by walking a parsed file
    pub fn location_at(&self, path: &Path, name: &str, offset: usize) -> Location {
        Location {
            path: path.to_path_buf(),
            name: name.to_string(),
            offset,
            origin: self.origin_of(path),
        }
    }

    /// Files holding impl blocks for the type at `location`: its own file
    /// first, then every other file whose impl self type resolves to the same
    /// declaration, in path order
    pub fn impl_files<G: Grammar>(&self, location: &Location) -> Vec<PathBuf> {
        let mut files = vec![location.path.clone()];
        for site in self.impls.get(&location.name).into_iter().flatten() {
            if files.contains(&site.path) {
                continue;
            }
            let same_type = self
                .lookup::<G>(&location.name, &site.path, &site.qualifier)
                .is_some_and(|t| t.path == location.path && t.offset == location.offset);
            if same_type {
                files.push(site.path.clone());
            } else {
                tracing::debug!(
                    "impl {} in {:?} is for another type of that name",
                    location.name,
                    site.path
                );
            }
        }
        files
    }

    /// Find the declaration a name used in `from` refers to.
    ///
    /// Preference: a qualified path, the same file, an explicit import, a
    /// wildcard import, the same directory or package, then the first
    /// candidate by path.
    pub fn lookup<G: Grammar>(
        &self,
        name: &str,
        from: &Path,
        qualifier: &[String],
    ) -> Option<&IndexedType> {
        let scope = self.scopes.get(from);

        let mut target = name;
        let mut module_hint = None;
        if !qualifier.is_empty() {
            module_hint = G::module_key(qualifier);
        } else if let Some(import) = scope.and_then(|s| {
            s.imports
                .iter()
                .find(|i| !i.is_wildcard() && i.visible_name() == name)
        }) {
            target = &import.name;
            module_hint = G::module_key(&import.module);
        }

        let candidates = self.types.get(target)?;
        if candidates.len() == 1 {
            return candidates.first();
        }

        let module_of = |c: &IndexedType| self.scopes.get(&c.path).and_then(|s| s.module.clone());

        if let Some(hint) = &module_hint
            && let Some(found) = candidates
                .iter()
                .find(|c| module_of(*c).as_deref() == Some(hint.as_str()))
        {
            return Some(found);
        }

        if qualifier.is_empty()
            && let Some(found) = candidates.iter().find(|c| c.path == from)
        {
            return Some(found);
        }

        if let Some(scope) = scope {
            for import in scope.imports.iter().filter(|i| i.is_wildcard()) {
                let Some(key) = G::module_key(&import.module) else {
                    continue;
                };
                if let Some(found) = candidates
                    .iter()
                    .find(|c| module_of(*c).as_deref() == Some(key.as_str()))
                {
                    return Some(found);
                }
            }
        }

        let from_module = scope.and_then(|s| s.module.clone());
        if let Some(found) = candidates.iter().find(|c| {
            c.path.parent() == from.parent()
                || (from_module.is_some() && module_of(*c) == from_module)
        }) {
            return Some(found);
        }

        tracing::debug!(
            "Ambiguous type '{}' referenced from {:?}: {} candidates, using the first",
            name,
            from,
            candidates.len()
        );
        candidates.first()
    }
}

/// A parsed source file kept open for the session
pub struct SourceFile {
    pub content: String,
    pub tree: Tree,
}

/// Files opened during one session, parsed once on first use
pub struct OpenFiles {
    parser: Parser,
    files: HashMap<PathBuf, SourceFile>,
}

impl OpenFiles {
    pub fn new<G: Grammar>() -> Result<Self, ProviderError> {
        Ok(Self {
            parser: new_parser::<G>()?,
            files: HashMap::new(),
        })
    }

    pub fn open(&mut self, path: &Path) -> Result<&SourceFile, ProviderError> {
        if !self.files.contains_key(path) {
            let content = fs::read_to_string(path)
                .map_err(|_| ProviderError::FileNotFound(path.display().to_string()))?;
            let tree = self.parse(&content, path)?;
            tracing::debug!("Opened {:?}", path);
            self.files
                .insert(path.to_path_buf(), SourceFile { content, tree });
        }
        self.files
            .get(path)
            .ok_or_else(|| ProviderError::FileNotFound(path.display().to_string()))
    }

    /// Parse a snippet that is not backed by a file
    pub fn parse_snippet(&mut self, text: &str) -> Result<Tree, ProviderError> {
        self.parse(text, Path::new("<signature>"))
    }

    fn parse(&mut self, text: &str, path: &Path) -> Result<Tree, ProviderError> {
        self.parser
            .parse(text, None)
            .ok_or_else(|| ProviderError::ParseFailed {
                path: path.display().to_string(),
                reason: "parser returned no tree".to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn close_all(&mut self) {
        self.files.clear();
    }
}

fn new_parser<G: Grammar>() -> Result<Parser, ProviderError> {
    let mut parser = Parser::new();
    parser
        .set_language(&G::ts_language())
        .map_err(|e| ProviderError::Unavailable(format!("failed to load {} grammar: {}", G::LANGUAGE, e)))?;
    Ok(parser)
}

/// Measures provider queries against the configured budget
#[derive(Debug, Clone, Copy)]
pub struct QueryClock {
    budget: Duration,
}

impl QueryClock {
    pub fn new(budget_ms: u64) -> Self {
        Self {
            budget: Duration::from_millis(budget_ms),
        }
    }

    pub fn check(&self, query: &str, started: Instant) -> Result<(), ProviderError> {
        if started.elapsed() > self.budget {
            return Err(ProviderError::Timeout {
                query: query.to_string(),
                millis: self.budget.as_millis() as u64,
            });
        }
        Ok(())
    }
}

/// Index, open files and clock of one provider session
pub struct Workspace<G: Grammar> {
    pub root: PathBuf,
    pub config: ProviderConfig,
    pub files: OpenFiles,
    pub index: Option<WorkspaceIndex>,
    pub clock: QueryClock,
    _grammar: PhantomData<G>,
}

impl<G: Grammar> Workspace<G> {
    pub fn new(root: impl Into<PathBuf>, config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            root: root.into(),
            clock: QueryClock::new(config.query_timeout_ms),
            config,
            files: OpenFiles::new::<G>()?,
            index: None,
            _grammar: PhantomData,
        })
    }

    pub fn start(&mut self) -> Result<(), ProviderError> {
        if self.index.is_some() {
            return Ok(());
        }
        let root = self
            .root
            .canonicalize()
            .map_err(|e| ProviderError::Unavailable(format!("{:?}: {}", self.root, e)))?;
        let started = Instant::now();
        let index = WorkspaceIndex::build::<G>(&root, &self.config)?;
        tracing::info!(
            "{} provider started: {} files, {} types indexed in {:?}",
            G::LANGUAGE,
            index.file_count(),
            index.type_count(),
            started.elapsed()
        );
        self.root = root;
        self.index = Some(index);
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if self.index.take().is_some() {
            tracing::info!(
                "{} provider stopped ({} files were open)",
                G::LANGUAGE,
                self.files.len()
            );
        }
        self.files.close_all();
    }

    pub fn index(&self) -> Result<&WorkspaceIndex, ProviderError> {
        self.index.as_ref().ok_or(ProviderError::NotStarted)
    }

    pub fn impl_files(&self, location: &Location) -> Result<Vec<PathBuf>, ProviderError> {
        Ok(self.index()?.impl_files::<G>(location))
    }

    /// The index together with the open-file cache, for queries that need both
    pub fn session(&mut self) -> Result<(&WorkspaceIndex, &mut OpenFiles), ProviderError> {
        let index = self.index.as_ref().ok_or(ProviderError::NotStarted)?;
        Ok((index, &mut self.files))
    }

    pub fn source_text(&mut self, path: &Path) -> Result<String, ProviderError> {
        let (_, files) = self.session()?;
        Ok(files.open(path)?.content.clone())
    }
}

/// Source text covered by a node
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Text of a node's field, if present
pub fn field_text<'a>(node: Node<'_>, field: &str, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| node_text(n, source))
}

/// Innermost node whose kind is one of `kinds` and that starts at `offset`
pub fn node_starting_at<'t>(root: Node<'t>, offset: usize, kinds: &[&str]) -> Option<Node<'t>> {
    let mut node = root.descendant_for_byte_range(offset, offset)?;
    loop {
        if node.start_byte() == offset && kinds.contains(&node.kind()) {
            return Some(node);
        }
        if node.start_byte() < offset {
            return None;
        }
        node = node.parent()?;
    }
}

/// Every descendant (or self) of one of the given kinds, in source order
pub fn collect_kinds<'t>(node: Node<'t>, kinds: &[&str], out: &mut Vec<Node<'t>>) {
    if kinds.contains(&node.kind()) {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_kinds(child, kinds, out);
    }
}

/// Nearest ancestor (or self) of one of the given kinds
pub fn enclosing<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut current = Some(node);
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}
