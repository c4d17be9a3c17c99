//! Java backend built on tree-sitter-java

use super::types::{Declaration, Location, NodeKind, StructureNode, TypeRef};
use super::workspace::{
    FileScope, Grammar, Import, OpenFiles, Workspace, collect_kinds, enclosing, field_text,
    node_starting_at, node_text,
};
use super::SymbolProvider;
use crate::config::ProviderConfig;
use crate::context::matching::{collapse_whitespace, squash_whitespace};
use crate::error::ProviderError;
use crate::indexer::SourceLanguage;
use std::path::Path;
use std::time::Instant;
use tree_sitter::{Language, Node};

const TYPE_DECLS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const CALLABLES: &[&str] = &[
    "method_declaration",
    "constructor_declaration",
    "compact_constructor_declaration",
];

/// Canonical modifier order used when rendering declarations
const MODIFIER_ORDER: &[&str] = &[
    "public",
    "protected",
    "private",
    "abstract",
    "static",
    "final",
    "sealed",
    "non-sealed",
    "transient",
    "volatile",
    "synchronized",
    "native",
    "strictfp",
    "default",
];

const PROBE_CLASS: &str = "class __Probe { ";

pub struct JavaGrammar;

impl Grammar for JavaGrammar {
    const LANGUAGE: SourceLanguage = SourceLanguage::Java;

    fn ts_language() -> Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn type_declarations(root: Node<'_>, source: &str) -> Vec<(String, usize)> {
        let mut found = Vec::new();
        let mut nodes = Vec::new();
        collect_kinds(root, TYPE_DECLS, &mut nodes);
        for node in nodes {
            if let Some(name) = field_text(node, "name", source) {
                found.push((name.to_string(), node.start_byte()));
            }
        }
        found
    }

    fn file_scope(root: Node<'_>, source: &str, _path: &Path) -> FileScope {
        let mut scope = FileScope::default();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    let text = node_text(child, source);
                    let package = text
                        .trim()
                        .trim_start_matches("package")
                        .trim_end_matches(';')
                        .trim();
                    scope.module = Some(squash_whitespace(package));
                }
                "import_declaration" => {
                    let body = node_text(child, source)
                        .trim()
                        .trim_start_matches("import")
                        .trim_end_matches(';')
                        .trim();
                    let body = body.strip_prefix("static ").unwrap_or(body);
                    let mut segments: Vec<String> = squash_whitespace(body)
                        .split('.')
                        .map(str::to_string)
                        .collect();
                    if let Some(name) = segments.pop()
                        && !segments.is_empty()
                    {
                        scope.imports.push(Import::new(segments, name));
                    }
                }
                _ => {}
            }
        }
        scope
    }

    fn module_key(module: &[String]) -> Option<String> {
        (!module.is_empty()).then(|| module.join("."))
    }
}

fn head_ref(node: Node<'_>, source: &str, path: &Path) -> Option<TypeRef> {
    let name_node = match node.kind() {
        "type_identifier" => node,
        "scoped_type_identifier" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .filter(|c| c.kind() == "type_identifier")
                .last()?
        }
        _ => return None,
    };
    Some(TypeRef::new(
        path,
        node_text(name_node, source),
        name_node.start_byte(),
    ))
}

/// Collect the class and interface types mentioned in a type expression
fn collect_type_refs(node: Node<'_>, source: &str, path: &Path, out: &mut Vec<TypeRef>) {
    match node.kind() {
        "type_identifier" | "scoped_type_identifier" => out.extend(head_ref(node, source, path)),
        "generic_type" => {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            let Some(mut head) = children.first().and_then(|n| head_ref(*n, source, path)) else {
                return;
            };
            if let Some(args) = children.iter().find(|c| c.kind() == "type_arguments") {
                let (start, end) = (args.start_byte() + 1, args.end_byte().saturating_sub(1));
                if start < end {
                    let mut cursor = args.walk();
                    let arity = args.named_children(&mut cursor).count();
                    head = head.with_generics(start..end, arity);
                }
            }
            out.push(head);
        }
        "array_type" => {
            if let Some(element) = node.child_by_field_name("element") {
                collect_type_refs(element, source, path, out);
            }
        }
        "integral_type" | "floating_point_type" | "boolean_type" | "void_type"
        | "dimensions" | "annotation" | "marker_annotation" | "line_comment"
        | "block_comment" => {}
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_type_refs(child, source, path, out);
            }
        }
    }
}

/// Type node of a formal or spread parameter
fn parameter_type(param: Node<'_>) -> Option<Node<'_>> {
    match param.kind() {
        "formal_parameter" => param.child_by_field_name("type"),
        "spread_parameter" => {
            let mut cursor = param.walk();
            param
                .named_children(&mut cursor)
                .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator"))
        }
        _ => None,
    }
}

/// Comparable shape of a method: name, return type and parameter types
#[derive(Debug, Clone, PartialEq, Eq)]
struct MethodShape {
    name: String,
    ret: String,
    params: Vec<String>,
}

impl MethodShape {
    fn of(node: Node<'_>, source: &str) -> Option<Self> {
        let name = field_text(node, "name", source)?.to_string();
        let mut ret = squash_whitespace(field_text(node, "type", source)?);
        if let Some(dims) = field_text(node, "dimensions", source) {
            ret.push_str(&squash_whitespace(dims));
        }
        let mut params = Vec::new();
        if let Some(parameters) = node.child_by_field_name("parameters") {
            let mut cursor = parameters.walk();
            for param in parameters.named_children(&mut cursor) {
                let Some(ty) = parameter_type(param) else {
                    continue;
                };
                let mut text = squash_whitespace(node_text(ty, source));
                if let Some(dims) = field_text(param, "dimensions", source) {
                    text.push_str(&squash_whitespace(dims));
                }
                if param.kind() == "spread_parameter" {
                    text.push_str("...");
                }
                params.push(text);
            }
        }
        Some(Self { name, ret, params })
    }
}

/// Non-annotation modifiers in canonical order, and where they end
fn modifiers(node: Node<'_>, source: &str) -> (Vec<String>, Option<usize>) {
    let mut cursor = node.walk();
    let Some(mods) = node
        .children(&mut cursor)
        .find(|c| c.kind() == "modifiers")
    else {
        return (Vec::new(), None);
    };
    let mut mod_cursor = mods.walk();
    let mut words: Vec<String> = mods
        .children(&mut mod_cursor)
        .filter(|c| !matches!(c.kind(), "annotation" | "marker_annotation"))
        .map(|c| node_text(c, source).to_string())
        .collect();
    words.sort_by_key(|w| {
        MODIFIER_ORDER
            .iter()
            .position(|m| *m == w.as_str())
            .unwrap_or(MODIFIER_ORDER.len())
    });
    (words, Some(mods.end_byte()))
}

/// Declaration text from after the modifiers up to the body, with the
/// modifiers re-emitted in canonical order
fn declaration_header(node: Node<'_>, source: &str) -> String {
    let (words, mods_end) = modifiers(node, source);
    let start = mods_end.unwrap_or(node.start_byte());
    let end = node
        .child_by_field_name("body")
        .map_or(node.end_byte(), |b| b.start_byte());
    let rest = source
        .get(start..end)
        .unwrap_or("")
        .trim()
        .trim_end_matches(';');
    let mut parts = words;
    parts.push(collapse_whitespace(rest));
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

fn render_field(node: Node<'_>, source: &str) -> Option<String> {
    let (mut parts, _) = modifiers(node, source);
    parts.push(collapse_whitespace(field_text(node, "type", source)?));
    let mut cursor = node.walk();
    let names: Vec<String> = node
        .children_by_field_name("declarator", &mut cursor)
        .filter_map(|d| {
            let name = field_text(d, "name", source)?;
            let dims = field_text(d, "dimensions", source).unwrap_or("");
            Some(format!("{}{}", name, squash_whitespace(dims)))
        })
        .collect();
    parts.push(names.join(", "));
    Some(format!("{};", parts.join(" ")))
}

fn render_members(body: Node<'_>, source: &str, lines: &mut Vec<String>) {
    let mut constants = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        let kind = member.kind();
        match kind {
            "field_declaration" | "constant_declaration" => {
                lines.extend(render_field(member, source));
            }
            "annotation_type_element_declaration" => {
                lines.push(collapse_whitespace(node_text(member, source)));
            }
            "enum_constant" => {
                if let Some(name) = field_text(member, "name", source) {
                    constants.push(name.to_string());
                }
            }
            "enum_body_declarations" => render_members(member, source, lines),
            _ if CALLABLES.contains(&kind) => {
                lines.push(format!("{};", declaration_header(member, source)));
            }
            _ if TYPE_DECLS.contains(&kind) => lines.push(render_type(member, source)),
            _ => {}
        }
    }
    if !constants.is_empty() {
        lines.insert(0, format!("{};", constants.join(", ")));
    }
}

/// Render a type declaration with members reduced to signatures
fn render_type(node: Node<'_>, source: &str) -> String {
    let mut lines = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        render_members(body, source, &mut lines);
    }
    lines.insert(0, format!("{} {{", declaration_header(node, source)));
    lines.push("}".to_string());
    lines.join("\n")
}

fn structure_entry(node: Node<'_>, source: &str) -> Option<StructureNode> {
    let kind = node.kind();
    if CALLABLES.contains(&kind) {
        let name = field_text(node, "name", source)?;
        return Some(
            StructureNode::new(name, NodeKind::Function)
                .with_detail(declaration_header(node, source)),
        );
    }
    if TYPE_DECLS.contains(&kind) {
        let name = field_text(node, "name", source)?;
        return Some(StructureNode::new(name, NodeKind::Other(kind.to_string())));
    }
    if kind == "field_declaration" {
        let mut cursor = node.walk();
        let label = node
            .children_by_field_name("declarator", &mut cursor)
            .find_map(|d| field_text(d, "name", source))
            .unwrap_or(kind);
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
                walk_structure(child, source, Some(idx), out);
            }
            None => walk_structure(child, source, parent, out),
        }
    }
}

/// Symbol provider for Java workspaces
pub struct JavaProvider {
    ws: Workspace<JavaGrammar>,
}

impl JavaProvider {
    pub fn new(root: &Path, config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            ws: Workspace::new(root, config)?,
        })
    }

    fn open<'f>(files: &'f mut OpenFiles, path: &Path) -> Result<(Node<'f>, &'f str), ProviderError> {
        let file = files.open(path)?;
        Ok((file.tree.root_node(), file.content.as_str()))
    }
}

impl SymbolProvider for JavaProvider {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Java
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

        let probe_source = format!("{}{} }}", PROBE_CLASS, signature);
        let probe_tree = files.parse_snippet(&probe_source)?;
        let mut probes = Vec::new();
        collect_kinds(probe_tree.root_node(), &["method_declaration"], &mut probes);
        let Some(wanted) = probes
            .first()
            .and_then(|n| MethodShape::of(*n, &probe_source))
        else {
            tracing::debug!("Signature did not parse as a method: {}", signature);
            return Ok(None);
        };

        let (root, source) = Self::open(files, path)?;
        let mut methods = Vec::new();
        collect_kinds(root, &["method_declaration"], &mut methods);
        let Some(method) = methods
            .into_iter()
            .find(|m| MethodShape::of(*m, source).as_ref() == Some(&wanted))
        else {
            clock.check("resolve_declaration", started)?;
            return Ok(None);
        };

        let owner = enclosing(method, TYPE_DECLS).and_then(|decl| {
            field_text(decl, "name", source)
                .map(|name| index.location_at(path, name, decl.start_byte()))
        });

        let mut params = Vec::new();
        if let Some(parameters) = method.child_by_field_name("parameters") {
            let mut cursor = parameters.walk();
            for param in parameters.named_children(&mut cursor) {
                if let Some(ty) = parameter_type(param) {
                    collect_type_refs(ty, source, path, &mut params);
                }
            }
        }
        let mut ret = Vec::new();
        if let Some(ty) = method.child_by_field_name("type") {
            collect_type_refs(ty, source, path, &mut ret);
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
        let qualifier: Vec<String> = leaf
            .parent()
            .filter(|p| p.kind() == "scoped_type_identifier")
            .map(|p| {
                let text = squash_whitespace(node_text(p, source));
                let mut segments: Vec<String> = text.split('.').map(str::to_string).collect();
                segments.pop();
                segments
            })
            .unwrap_or_default();

        let found = index
            .lookup::<JavaGrammar>(name, path, &qualifier)
            .map(|t| t.location());
        clock.check("definition_of", started)?;
        Ok(found)
    }

    fn describe(&mut self, location: &Location) -> Result<Option<String>, ProviderError> {
        let (_, files) = self.ws.session()?;
        let (root, source) = Self::open(files, &location.path)?;
        Ok(node_starting_at(root, location.offset, TYPE_DECLS).map(|node| render_type(node, source)))
    }

    fn member_type_refs(&mut self, location: &Location) -> Result<Vec<TypeRef>, ProviderError> {
        let (_, files) = self.ws.session()?;
        let (root, source) = Self::open(files, &location.path)?;
        let mut refs = Vec::new();
        let Some(node) = node_starting_at(root, location.offset, TYPE_DECLS) else {
            return Ok(refs);
        };
        let path = location.path.as_path();

        if let Some(components) = node.child_by_field_name("parameters") {
            let mut cursor = components.walk();
            for component in components.named_children(&mut cursor) {
                if let Some(ty) = parameter_type(component) {
                    collect_type_refs(ty, source, path, &mut refs);
                }
            }
        }

        let Some(body) = node.child_by_field_name("body") else {
            return Ok(refs);
        };
        let mut containers = vec![body];
        let mut cursor = body.walk();
        containers.extend(
            body.named_children(&mut cursor)
                .filter(|c| c.kind() == "enum_body_declarations"),
        );
        for container in containers {
            let mut cursor = container.walk();
            for member in container.named_children(&mut cursor) {
                if member.kind() == "field_declaration"
                    && let Some(ty) = member.child_by_field_name("type")
                {
                    collect_type_refs(ty, source, path, &mut refs);
                }
            }
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

    fn source_text(&mut self, path: &Path) -> Result<String, ProviderError> {
        self.ws.source_text(path)
    }
}

#[cfg(test)]
mod tests;
