//! Rust backend built on tree-sitter-rust

use super::types::{Declaration, Location, NodeKind, StructureNode, TypeRef};
use super::workspace::{
    FileScope, Grammar, Import, OpenFiles, Workspace, WorkspaceIndex, collect_kinds, enclosing,
    field_text, node_starting_at, node_text,
};
use super::SymbolProvider;
use crate::config::ProviderConfig;
use crate::context::matching::{collapse_whitespace, squash_whitespace};
use crate::error::ProviderError;
use crate::indexer::SourceLanguage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tree_sitter::{Language, Node};

/// Items that declare a named type
const TYPE_ITEMS: &[&str] = &[
    "struct_item",
    "enum_item",
    "union_item",
    "trait_item",
    "type_item",
];

const FUNCTION_ITEMS: &[&str] = &["function_item", "function_signature_item"];

const OTHER_ITEMS: &[&str] = &[
    "struct_item",
    "enum_item",
    "union_item",
    "trait_item",
    "type_item",
    "mod_item",
    "const_item",
    "static_item",
    "macro_definition",
    "field_declaration",
    "enum_variant",
];

pub struct RustGrammar;

impl Grammar for RustGrammar {
    const LANGUAGE: SourceLanguage = SourceLanguage::Rust;

    fn ts_language() -> Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn type_declarations(root: Node<'_>, source: &str) -> Vec<(String, usize)> {
        let mut found = Vec::new();
        collect_type_items(root, source, &mut found);
        found
    }

    fn impl_targets(root: Node<'_>, source: &str) -> Vec<(String, Vec<String>)> {
        let mut impls = Vec::new();
        collect_kinds(root, &["impl_item"], &mut impls);
        impls
            .into_iter()
            .filter_map(|imp| type_head(imp.child_by_field_name("type")?, source))
            .collect()
    }

    fn file_scope(root: Node<'_>, source: &str, path: &Path) -> FileScope {
        let mut imports = Vec::new();
        collect_imports(root, source, &mut imports);
        FileScope {
            module: module_name(path),
            imports,
        }
    }

    fn module_key(module: &[String]) -> Option<String> {
        match module.last().map(String::as_str) {
            None | Some("self") | Some("super") => None,
            Some(last) => Some(last.to_string()),
        }
    }
}

/// Module a file defines: `crate` for crate roots, the directory for
/// `mod.rs`, the file stem otherwise
fn module_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    match stem {
        "lib" | "main" => Some("crate".to_string()),
        "mod" => path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(str::to_string),
        _ => Some(stem.to_string()),
    }
}

fn collect_type_items(node: Node<'_>, source: &str, out: &mut Vec<(String, usize)>) {
    if TYPE_ITEMS.contains(&node.kind())
        && let Some(name) = field_text(node, "name", source)
    {
        out.push((name.to_string(), node.start_byte()));
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_type_items(child, source, out);
    }
}

fn collect_imports(node: Node<'_>, source: &str, out: &mut Vec<Import>) {
    if node.kind() == "use_declaration" {
        if let Some(argument) = node.child_by_field_name("argument") {
            flatten_use_tree(argument, source, &[], out);
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_imports(child, source, out);
    }
}

fn path_segments(text: &str) -> Vec<String> {
    text.split("::")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand a use tree such as `crate::a::{B, c::D as E, f::*}`
fn flatten_use_tree(node: Node<'_>, source: &str, prefix: &[String], out: &mut Vec<Import>) {
    match node.kind() {
        "identifier" | "scoped_identifier" => {
            let mut segments = prefix.to_vec();
            segments.extend(path_segments(node_text(node, source)));
            if let Some(name) = segments.pop() {
                out.push(Import::new(segments, name));
            }
        }
        "use_as_clause" => {
            let (Some(path), Some(alias)) = (
                node.child_by_field_name("path"),
                field_text(node, "alias", source),
            ) else {
                return;
            };
            let before = out.len();
            flatten_use_tree(path, source, prefix, out);
            if let Some(import) = out.get_mut(before) {
                import.alias = Some(alias.to_string());
            }
        }
        "scoped_use_list" => {
            let mut nested = prefix.to_vec();
            if let Some(path) = field_text(node, "path", source) {
                nested.extend(path_segments(path));
            }
            if let Some(list) = node.child_by_field_name("list") {
                flatten_use_tree(list, source, &nested, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                flatten_use_tree(child, source, prefix, out);
            }
        }
        "use_wildcard" => {
            let text = node_text(node, source).trim_end_matches('*');
            let mut segments = prefix.to_vec();
            segments.extend(path_segments(text));
            out.push(Import::new(segments, "*"));
        }
        _ => {}
    }
}

/// Head name and module qualifier of a type node
fn type_head(node: Node<'_>, source: &str) -> Option<(String, Vec<String>)> {
    match node.kind() {
        "type_identifier" => Some((node_text(node, source).to_string(), Vec::new())),
        "scoped_type_identifier" => {
            let name = field_text(node, "name", source)?;
            let qualifier = field_text(node, "path", source)
                .map(path_segments)
                .unwrap_or_default();
            Some((name.to_string(), qualifier))
        }
        "generic_type" => type_head(node.child_by_field_name("type")?, source),
        "reference_type" | "pointer_type" => type_head(node.child_by_field_name("type")?, source),
        _ => None,
    }
}

fn head_ref(node: Node<'_>, source: &str, path: &Path) -> Option<TypeRef> {
    let name_node = match node.kind() {
        "type_identifier" => node,
        "scoped_type_identifier" => node.child_by_field_name("name")?,
        _ => return None,
    };
    Some(TypeRef::new(
        path,
        node_text(name_node, source),
        name_node.start_byte(),
    ))
}

/// Collect the nominal types mentioned in a type expression
fn collect_type_refs(node: Node<'_>, source: &str, path: &Path, out: &mut Vec<TypeRef>) {
    match node.kind() {
        "type_identifier" | "scoped_type_identifier" => out.extend(head_ref(node, source, path)),
        "generic_type" => {
            let Some(mut head) = node
                .child_by_field_name("type")
                .and_then(|n| head_ref(n, source, path))
            else {
                return;
            };
            if let Some(args) = node.child_by_field_name("type_arguments") {
                let (start, end) = (args.start_byte() + 1, args.end_byte().saturating_sub(1));
                if start < end {
                    let mut cursor = args.walk();
                    let arity = args.named_children(&mut cursor).count();
                    head = head.with_generics(start..end, arity);
                }
            }
            out.push(head);
        }
        "reference_type" | "pointer_type" => {
            if let Some(inner) = node.child_by_field_name("type") {
                collect_type_refs(inner, source, path, out);
            }
        }
        "array_type" => {
            if let Some(element) = node.child_by_field_name("element") {
                collect_type_refs(element, source, path, out);
            }
        }
        "abstract_type" | "dynamic_type" => {
            if let Some(bound) = node.child_by_field_name("trait") {
                collect_type_refs(bound, source, path, out);
            }
        }
        "parameter" => {
            if let Some(ty) = node.child_by_field_name("type") {
                collect_type_refs(ty, source, path, out);
            }
        }
        "primitive_type" | "unit_type" | "never_type" | "lifetime" | "self_parameter"
        | "line_comment" | "block_comment" => {}
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_type_refs(child, source, path, out);
            }
        }
    }
}

/// Comparable shape of a function: name, receiver, parameter and return
/// types with whitespace removed
#[derive(Debug, Clone, PartialEq, Eq)]
struct FnShape {
    name: String,
    receiver: Option<String>,
    params: Vec<String>,
    ret: Option<String>,
}

impl FnShape {
    fn of(node: Node<'_>, source: &str) -> Option<Self> {
        let name = field_text(node, "name", source)?.to_string();
        let parameters = node.child_by_field_name("parameters")?;
        let mut receiver = None;
        let mut params = Vec::new();
        let mut cursor = parameters.walk();
        for param in parameters.named_children(&mut cursor) {
            match param.kind() {
                "self_parameter" => receiver = Some(squash_whitespace(node_text(param, source))),
                "parameter" if field_text(param, "pattern", source) == Some("self") => {
                    receiver = Some(squash_whitespace(node_text(param, source)));
                }
                "parameter" => {
                    if let Some(ty) = field_text(param, "type", source) {
                        params.push(squash_whitespace(ty));
                    }
                }
                "variadic_parameter" => params.push("...".to_string()),
                _ => {}
            }
        }
        let ret = field_text(node, "return_type", source).map(squash_whitespace);
        Some(Self {
            name,
            receiver,
            params,
            ret,
        })
    }
}

/// The impl or trait item a function is declared in, if any
fn container(function: Node<'_>) -> Option<Node<'_>> {
    let list = function.parent()?;
    if list.kind() != "declaration_list" {
        return None;
    }
    list.parent()
        .filter(|p| matches!(p.kind(), "impl_item" | "trait_item"))
}

/// Header text of an item up to its body
fn header_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    let end = node
        .child_by_field_name("body")
        .map_or(node.end_byte(), |body| body.start_byte());
    source
        .get(node.start_byte()..end)
        .unwrap_or("")
        .trim()
        .trim_end_matches(';')
        .trim_end()
}

/// Function signature with its name cut out: `pub fn(&self) -> u32`
fn function_detail(node: Node<'_>, source: &str) -> Option<String> {
    let name = node.child_by_field_name("name")?;
    let header = header_text(node, source);
    let start = node.start_byte();
    let name_start = name.start_byte().checked_sub(start)?;
    let name_end = name.end_byte().checked_sub(start)?;
    let head = header.get(..name_start)?;
    let tail = header.get(name_end..)?;
    Some(collapse_whitespace(&format!("{}{}", head.trim_end(), tail)))
}

/// `impl [!]Trait for Type` or `impl Type`, without generics or where clause
fn impl_label(node: Node<'_>, source: &str) -> Option<String> {
    let self_type = collapse_whitespace(field_text(node, "type", source)?);
    let negative = {
        let mut cursor = node.walk();
        node.children(&mut cursor).any(|c| c.kind() == "!")
    };
    Some(match field_text(node, "trait", source) {
        Some(trait_name) => format!(
            "impl {}{} for {}",
            if negative { "!" } else { "" },
            collapse_whitespace(trait_name),
            self_type
        ),
        None => format!("impl {}", self_type),
    })
}

fn structure_entry(node: Node<'_>, source: &str) -> Option<StructureNode> {
    let kind = node.kind();
    if FUNCTION_ITEMS.contains(&kind) {
        let name = field_text(node, "name", source)?;
        let mut entry = StructureNode::new(name, NodeKind::Function);
        entry.detail = function_detail(node, source);
        return Some(entry);
    }
    if kind == "impl_item" {
        let label = impl_label(node, source)?;
        return Some(
            StructureNode::new(label, NodeKind::Impl)
                .with_detail(collapse_whitespace(header_text(node, source))),
        );
    }
    if OTHER_ITEMS.contains(&kind) {
        let label = field_text(node, "name", source).unwrap_or(kind);
        return Some(StructureNode::new(label, NodeKind::Other(kind.to_string())));
    }
    None
}

fn walk_structure(node: Node<'_>, source: &str, parent: Option<usize>, out: &mut Vec<StructureNode>) {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    for child in children {
        match structure_entry(child, source) {
            Some(mut entry) => {
                entry.parent = parent;
                let idx = out.len();
                out.push(entry);
                // items local to a function body are not part of the file outline
                if !FUNCTION_ITEMS.contains(&child.kind()) {
                    walk_structure(child, source, Some(idx), out);
                }
            }
            None => walk_structure(child, source, parent, out),
        }
    }
}

/// Render a trait with its items reduced to signatures
fn render_trait(node: Node<'_>, source: &str) -> String {
    let mut lines = vec![format!("{} {{", header_text(node, source))];
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for item in body.named_children(&mut cursor) {
            match item.kind() {
                "function_item" => lines.push(format!("{};", header_text(item, source))),
                "attribute_item" | "line_comment" | "block_comment" => {}
                _ => lines.push(node_text(item, source).to_string()),
            }
        }
    }
    lines.push("}".to_string());
    lines.join("\n")
}

fn field_list_refs(body: Node<'_>, source: &str, path: &Path, out: &mut Vec<TypeRef>) {
    let mut cursor = body.walk();
    match body.kind() {
        "field_declaration_list" => {
            for field in body.named_children(&mut cursor) {
                if field.kind() == "field_declaration"
                    && let Some(ty) = field.child_by_field_name("type")
                {
                    collect_type_refs(ty, source, path, out);
                }
            }
        }
        "ordered_field_declaration_list" => {
            for ty in body.children_by_field_name("type", &mut cursor) {
                collect_type_refs(ty, source, path, out);
            }
        }
        _ => {}
    }
}

/// Symbol provider for Rust workspaces
pub struct RustProvider {
    ws: Workspace<RustGrammar>,
}

impl RustProvider {
    pub fn new(root: &Path, config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            ws: Workspace::new(root, config)?,
        })
    }

    /// Location of the type an impl block is written for
    fn impl_owner(
        index: &WorkspaceIndex,
        impl_node: Node<'_>,
        source: &str,
        path: &Path,
    ) -> Option<Location> {
        let (name, qualifier) = type_head(impl_node.child_by_field_name("type")?, source)?;
        index
            .lookup::<RustGrammar>(&name, path, &qualifier)
            .map(|t| t.location())
    }

    fn open<'f>(files: &'f mut OpenFiles, path: &Path) -> Result<(Node<'f>, &'f str), ProviderError> {
        let file = files.open(path)?;
        Ok((file.tree.root_node(), file.content.as_str()))
    }
}

impl SymbolProvider for RustProvider {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Rust
    }

    fn start(&mut self) -> Result<(), ProviderError> {
        self.ws.start()
    }

    fn shutdown(&mut self) {
        self.ws.shutdown()
    }

    fn resolve_declaration(
        &mut self,
        path: &Path,
        signature: &str,
    ) -> Result<Option<Declaration>, ProviderError> {
        let clock = self.ws.clock;
        let started = Instant::now();
        let (index, files) = self.ws.session()?;

        let probe_tree = files.parse_snippet(signature)?;
        let mut probes = Vec::new();
        collect_kinds(probe_tree.root_node(), FUNCTION_ITEMS, &mut probes);
        let Some(wanted) = probes.first().and_then(|n| FnShape::of(*n, signature)) else {
            tracing::debug!("Signature did not parse as a function: {}", signature);
            return Ok(None);
        };

        let (root, source) = Self::open(files, path)?;
        let mut functions = Vec::new();
        collect_kinds(root, FUNCTION_ITEMS, &mut functions);

        let best = functions
            .into_iter()
            .filter(|f| FnShape::of(*f, source).as_ref() == Some(&wanted))
            .min_by_key(|f| {
                let rank = match container(*f).map(|c| c.kind()) {
                    Some("impl_item") => 0,
                    Some(_) => 1,
                    None => 2,
                };
                (rank, f.start_byte())
            });
        let Some(function) = best else {
            clock.check("resolve_declaration", started)?;
            return Ok(None);
        };

        let owner = match container(function) {
            Some(c) if c.kind() == "impl_item" => Self::impl_owner(index, c, source, path),
            Some(c) => field_text(c, "name", source)
                .map(|name| index.location_at(path, name, c.start_byte())),
            None => None,
        };

        let mut params = Vec::new();
        if let Some(parameters) = function.child_by_field_name("parameters") {
            let mut cursor = parameters.walk();
            for param in parameters.named_children(&mut cursor) {
                if param.kind() == "parameter" {
                    collect_type_refs(param, source, path, &mut params);
                }
            }
        }
        let mut ret = Vec::new();
        if let Some(ret_type) = function.child_by_field_name("return_type") {
            collect_type_refs(ret_type, source, path, &mut ret);
        }

        clock.check("resolve_declaration", started)?;
        Ok(Some(Declaration {
            name: wanted.name,
            owner,
            params,
            ret,
        }))
    }

    fn definition_of(
        &mut self,
        path: &Path,
        offset: usize,
    ) -> Result<Option<Location>, ProviderError> {
        let clock = self.ws.clock;
        let started = Instant::now();
        let (index, files) = self.ws.session()?;
        let (root, source) = Self::open(files, path)?;

        let Some(leaf) = root.descendant_for_byte_range(offset, offset) else {
            return Ok(None);
        };
        if !matches!(leaf.kind(), "type_identifier" | "identifier") {
            return Ok(None);
        }
        let name = node_text(leaf, source);

        let found = if name == "Self" {
            enclosing(leaf, &["impl_item"])
                .and_then(|imp| Self::impl_owner(index, imp, source, path))
        } else {
            let qualifier = leaf
                .parent()
                .filter(|p| p.kind() == "scoped_type_identifier")
                .and_then(|p| field_text(p, "path", source))
                .map(path_segments)
                .unwrap_or_default();
            index
                .lookup::<RustGrammar>(name, path, &qualifier)
                .map(|t| t.location())
        };

        clock.check("definition_of", started)?;
        Ok(found)
    }

    fn describe(&mut self, location: &Location) -> Result<Option<String>, ProviderError> {
        let (_, files) = self.ws.session()?;
        let (root, source) = Self::open(files, &location.path)?;
        Ok(
            node_starting_at(root, location.offset, TYPE_ITEMS).map(|node| match node.kind() {
                "trait_item" => render_trait(node, source),
                _ => node_text(node, source).to_string(),
            }),
        )
    }

    fn member_type_refs(&mut self, location: &Location) -> Result<Vec<TypeRef>, ProviderError> {
        let (_, files) = self.ws.session()?;
        let (root, source) = Self::open(files, &location.path)?;
        let mut refs = Vec::new();
        let Some(node) = node_starting_at(root, location.offset, TYPE_ITEMS) else {
            return Ok(refs);
        };
        let path = location.path.as_path();
        match node.kind() {
            "struct_item" | "union_item" => {
                if let Some(body) = node.child_by_field_name("body") {
                    field_list_refs(body, source, path, &mut refs);
                }
            }
            "enum_item" => {
                if let Some(variants) = node.child_by_field_name("body") {
                    let mut cursor = variants.walk();
                    for variant in variants.named_children(&mut cursor) {
                        if let Some(body) = variant.child_by_field_name("body") {
                            field_list_refs(body, source, path, &mut refs);
                        }
                    }
                }
            }
            "type_item" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    collect_type_refs(ty, source, path, &mut refs);
                }
            }
            _ => {}
        }
        Ok(refs)
    }

    fn flat_structure_of(&mut self, path: &Path) -> Result<Vec<StructureNode>, ProviderError> {
        let (_, files) = self.ws.session()?;
        let (root, source) = Self::open(files, path)?;
        let mut nodes = Vec::new();
        walk_structure(root, source, None, &mut nodes);
        Ok(nodes)
    }

    fn impl_files(&mut self, location: &Location) -> Result<Vec<PathBuf>, ProviderError> {
        self.ws.impl_files(location)
    }

    fn source_text(&mut self, path: &Path) -> Result<String, ProviderError> {
        self.ws.source_text(path)
    }
}
