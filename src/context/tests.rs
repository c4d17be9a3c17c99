//! Driver tests against an in-memory symbol provider

use super::*;
use crate::provider::{Declaration, NodeKind, Origin, StructureNode};
use std::collections::HashMap;
use std::path::PathBuf;

const FILE: &str = "/ws/src/lib.rs";
const SRC: &str = "fn f(p: Point, v: Vec<Foo>, w: Wrap<u8, Bar>, o: Option<Box<Qux>>, s: String, x: Pair<Left, Right>) -> Label";

#[derive(Default)]
struct FakeProvider {
    language: Option<SourceLanguage>,
    declaration: Option<Declaration>,
    /// offset in SRC -> resolved location
    definitions: HashMap<usize, Location>,
    timeouts: Vec<usize>,
    unavailable: bool,
    members: HashMap<String, Vec<TypeRef>>,
    structure: Vec<StructureNode>,
    /// structure of other files holding impl blocks, in path order
    impl_files: Vec<(PathBuf, Vec<StructureNode>)>,
    describe_calls: HashMap<String, usize>,
    shutdowns: usize,
}

fn location(name: &str, origin: Origin) -> Location {
    Location {
        path: PathBuf::from(FILE),
        name: name.to_string(),
        offset: 1000 + name.len() * 31 + name.bytes().map(usize::from).sum::<usize>(),
        origin,
    }
}

fn at(needle: &str) -> usize {
    SRC.find(needle).unwrap()
}

/// Reference to the type written at `needle`, with generics read from SRC
fn type_ref(needle: &str) -> TypeRef {
    let offset = at(needle);
    let head = matching::head_identifier(&SRC[offset..]).unwrap();
    let mut r = TypeRef::new(FILE, head.name, offset);
    if let Some(g) = head.generics {
        let span = offset + g.start..offset + g.end;
        let arity = matching::split_top_level_commas(&SRC[span.clone()]).len();
        r = r.with_generics(span, arity);
    }
    r
}

impl FakeProvider {
    fn new(owner: Option<&str>, params: &[&str], ret: &[&str]) -> Self {
        let mut provider = FakeProvider {
            declaration: Some(Declaration {
                name: "f".to_string(),
                owner: owner.map(|o| location(o, Origin::Project)),
                params: params.iter().map(|p| type_ref(p)).collect(),
                ret: ret.iter().map(|r| type_ref(r)).collect(),
            }),
            ..Default::default()
        };
        if let Some(owner) = owner {
            provider.structure.push(StructureNode::new(
                format!("impl {}", owner),
                NodeKind::Impl,
            ));
            let idx = provider.structure.len() - 1;
            provider.structure.push(
                StructureNode::new("run", NodeKind::Function)
                    .with_detail("pub fn(&self)")
                    .with_parent(idx),
            );
        }
        provider
    }

    fn define(mut self, needle: &str, name: &str, origin: Origin) -> Self {
        self.definitions.insert(at(needle), location(name, origin));
        self
    }

    fn member(mut self, owner: &str, needle: &str) -> Self {
        self.members
            .entry(owner.to_string())
            .or_default()
            .push(type_ref(needle));
        self
    }

    fn impl_block(mut self, label: &str, methods: &[&str]) -> Self {
        self.structure.push(StructureNode::new(label, NodeKind::Impl));
        let idx = self.structure.len() - 1;
        for m in methods {
            self.structure.push(
                StructureNode::new(*m, NodeKind::Function)
                    .with_detail("fn(&self)")
                    .with_parent(idx),
            );
        }
        self
    }
}

impl SymbolProvider for FakeProvider {
    fn language(&self) -> SourceLanguage {
        self.language.unwrap_or(SourceLanguage::Rust)
    }

    fn start(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shutdowns += 1;
    }

    fn resolve_declaration(
        &mut self,
        _path: &Path,
        signature: &str,
    ) -> Result<Option<Declaration>, ProviderError> {
        assert!(signature.ends_with(';'));
        Ok(self.declaration.clone())
    }

    fn definition_of(
        &mut self,
        _path: &Path,
        offset: usize,
    ) -> Result<Option<Location>, ProviderError> {
        if self.unavailable {
            return Err(ProviderError::Unavailable("backend crashed".to_string()));
        }
        if self.timeouts.contains(&offset) {
            return Err(ProviderError::Timeout {
                query: "definition_of".to_string(),
                millis: 5,
            });
        }
        Ok(self.definitions.get(&offset).cloned())
    }

    fn describe(&mut self, location: &Location) -> Result<Option<String>, ProviderError> {
        *self.describe_calls.entry(location.name.clone()).or_default() += 1;
        Ok(Some(format!("struct {} {{\n    ..\n}}", location.name)))
    }

    fn member_type_refs(&mut self, location: &Location) -> Result<Vec<TypeRef>, ProviderError> {
        Ok(self.members.get(&location.name).cloned().unwrap_or_default())
    }

    fn flat_structure_of(&mut self, path: &Path) -> Result<Vec<StructureNode>, ProviderError> {
        Ok(self
            .impl_files
            .iter()
            .find(|(p, _)| p == path)
            .map_or_else(|| self.structure.clone(), |(_, nodes)| nodes.clone()))
    }

    fn impl_files(&mut self, location: &Location) -> Result<Vec<PathBuf>, ProviderError> {
        let mut files = vec![location.path.clone()];
        files.extend(self.impl_files.iter().map(|(p, _)| p.clone()));
        Ok(files)
    }

    fn source_text(&mut self, _path: &Path) -> Result<String, ProviderError> {
        Ok(SRC.to_string())
    }
}

fn run(provider: &mut FakeProvider, options: &ExtractOptions) -> Result<Extraction, ContextError> {
    extract_context(provider, Path::new(FILE), "pub fn f()", options)
}

fn cards(extraction: &Extraction) -> Vec<String> {
    extraction
        .context
        .lines()
        .filter(|l| l.starts_with("struct ") || l.starts_with("impl "))
        .map(|l| l.trim_end_matches(" {").to_string())
        .collect()
}

#[test]
fn test_owner_then_params_then_return() {
    let mut provider = FakeProvider::new(Some("Shape"), &["Point"], &["Label"])
        .define("Point", "Point", Origin::Project)
        .define("Label", "Label", Origin::Project);
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();

    assert_eq!(
        cards(&extraction),
        vec!["struct Shape", "impl Shape", "struct Point", "struct Label"]
    );
    assert_eq!(extraction.types_visited, 3);
    assert!(extraction.context.contains("impl Shape {\npub fn run(&self);\n}"));
    assert_eq!(provider.shutdowns, 1);
}

#[test]
fn test_each_type_visited_once() {
    let mut provider = FakeProvider::new(Some("Shape"), &["Point", "Point"], &["Label"])
        .define("Point", "Point", Origin::Project)
        .define("Label", "Shape", Origin::Project)
        .member("Point", "Label")
        .member("Shape", "Point");
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();

    assert_eq!(cards(&extraction), vec!["struct Shape", "impl Shape", "struct Point"]);
    assert_eq!(extraction.types_visited, 2);
    assert!(provider.describe_calls.values().all(|&n| n == 1));
}

#[test]
fn test_external_type_is_leaf() {
    let mut provider = FakeProvider::new(Some("Shape"), &["String"], &[])
        .define("String", "String", Origin::External)
        .member("String", "Point")
        .define("Point", "Point", Origin::Project)
        .impl_block("impl String", &["len"]);
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();

    assert_eq!(cards(&extraction), vec!["struct Shape", "impl Shape", "struct String"]);
}

#[test]
fn test_external_expanded_without_std_cutoff() {
    let mut provider = FakeProvider::new(Some("Shape"), &["String"], &[])
        .define("String", "String", Origin::External)
        .member("String", "Point")
        .define("Point", "Point", Origin::Project)
        .impl_block("impl String", &["len"]);
    let options = ExtractOptions {
        ignore_std: false,
        ..Default::default()
    };
    let extraction = run(&mut provider, &options).unwrap();

    assert_eq!(
        cards(&extraction),
        vec![
            "struct Shape",
            "impl Shape",
            "struct String",
            "impl String",
            "struct Point"
        ]
    );
}

#[test]
fn test_external_owner_is_expanded() {
    let mut provider = FakeProvider::new(Some("Shape"), &[], &[]).member("Shape", "Point");
    if let Some(decl) = provider.declaration.as_mut() {
        decl.owner = Some(location("Shape", Origin::External));
    }
    provider = provider.define("Point", "Point", Origin::Project);
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();

    assert_eq!(cards(&extraction), vec!["struct Shape", "impl Shape", "struct Point"]);
}

#[test]
fn test_generic_argument_fallback() {
    let mut provider = FakeProvider::new(None, &["Vec<Foo>", "Option<Box<Qux>>"], &[])
        .define("Foo", "Foo", Origin::Project)
        .define("Qux", "Qux", Origin::Project);
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();

    assert_eq!(cards(&extraction), vec!["struct Foo", "struct Qux"]);
}

#[test]
fn test_generic_fallback_skips_unresolvable_arguments() {
    let mut provider = FakeProvider::new(None, &["Wrap<u8, Bar>"], &[])
        .define("Bar", "Bar", Origin::Project);
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();
    assert_eq!(cards(&extraction), vec!["struct Bar"]);
}

#[test]
fn test_external_head_prefers_project_argument() {
    let mut provider = FakeProvider::new(None, &["Vec<Foo>", "Option<Box<Qux>>"], &[])
        .define("Vec", "Vec", Origin::External)
        .define("Foo", "Foo", Origin::Project)
        .define("Option", "Option", Origin::External);
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();

    // Qux is unknown, so Option stays as a leaf card
    assert_eq!(cards(&extraction), vec!["struct Foo", "struct Option"]);
}

#[test]
fn test_generic_probe_respects_parsed_arity() {
    let mut reference = type_ref("Pair<Left, Right>");
    reference.arity = 1;
    let mut provider = FakeProvider::new(None, &[], &[]).define("Right", "Right", Origin::Project);
    if let Some(decl) = provider.declaration.as_mut() {
        decl.params.push(reference);
    }
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();
    assert_eq!(extraction.context, "");
}

#[test]
fn test_timeout_is_unresolved() {
    let mut provider = FakeProvider::new(Some("Shape"), &["Point"], &["Label"])
        .define("Point", "Point", Origin::Project)
        .define("Label", "Label", Origin::Project);
    provider.timeouts.push(at("Point"));
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();

    assert_eq!(cards(&extraction), vec!["struct Shape", "impl Shape", "struct Label"]);
}

#[test]
fn test_unavailable_provider_fails_and_shuts_down() {
    let mut provider = FakeProvider::new(Some("Shape"), &["Point"], &[]);
    provider.unavailable = true;
    let err = run(&mut provider, &ExtractOptions::default()).unwrap_err();

    assert!(matches!(err, ContextError::Provider(ProviderError::Unavailable(_))));
    assert_eq!(provider.shutdowns, 1);
}

#[test]
fn test_signature_mismatch() {
    let mut provider = FakeProvider::default();
    let err = run(&mut provider, &ExtractOptions::default()).unwrap_err();

    match err {
        ContextError::SignatureMismatch { path, signature } => {
            assert_eq!(path, FILE);
            assert_eq!(signature, "fn f();");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(provider.shutdowns, 1);
}

#[test]
fn test_empty_signature_is_invalid() {
    let mut provider = FakeProvider::default();
    let err = extract_context(&mut provider, Path::new(FILE), " { } ", &ExtractOptions::default())
        .unwrap_err();
    assert!(matches!(err, ContextError::InvalidSignature(_)));
}

#[test]
fn test_trait_impls_kept_only_for_owner() {
    let mut provider = FakeProvider::new(Some("Shape"), &["Point"], &[])
        .define("Point", "Point", Origin::Project)
        .impl_block("impl Display for Shape", &["fmt"])
        .impl_block("impl Point", &["x"])
        .impl_block("impl Display for Point", &["fmt"]);
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();
    assert_eq!(
        cards(&extraction),
        vec![
            "struct Shape",
            "impl Shape",
            "impl Display for Shape",
            "struct Point",
            "impl Point"
        ]
    );

    let options = ExtractOptions {
        include_trait_impls: true,
        ..Default::default()
    };
    let extraction = run(&mut provider, &options).unwrap();
    assert!(cards(&extraction).contains(&"impl Display for Point".to_string()));
}

#[test]
fn test_merges_scattered_impl_blocks() {
    let mut provider = FakeProvider::new(Some("Shape"), &[], &[])
        .impl_block("impl Shape", &["a"])
        .impl_block("impl Shape", &["b"]);
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();

    assert_eq!(
        extraction.context,
        "struct Shape {\n..\n}\nimpl Shape {\npub fn run(&self);\nfn a(&self);\nfn b(&self);\n}"
    );

    let options = ExtractOptions {
        merge_impls: false,
        ..Default::default()
    };
    let extraction = run(&mut provider, &options).unwrap();
    assert_eq!(extraction.context, "struct Shape {\n..\n}\npub fn run(&self)\nfn a(&self)\nfn b(&self)");
}

#[test]
fn test_nested_level_is_bounded() {
    let mut provider = FakeProvider::new(None, &["Point"], &[])
        .define("Point", "Point", Origin::Project)
        .define("Label", "Label", Origin::Project)
        .define("Foo", "Foo", Origin::Project)
        .member("Point", "Label")
        .member("Label", "Foo");
    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();
    assert_eq!(cards(&extraction), vec!["struct Point", "struct Label"]);
}

#[test]
fn test_class_model_walks_owner_fields_first() {
    let build = |language| {
        let mut provider = FakeProvider::new(Some("Calc"), &[], &[])
            .define("Point", "Point", Origin::Project)
            .define("Label", "Label", Origin::Project)
            .member("Calc", "Point")
            .member("Point", "Label");
        provider.language = Some(language);
        provider
    };

    let mut java = build(SourceLanguage::Java);
    let extraction = run(&mut java, &ExtractOptions::default()).unwrap();
    assert_eq!(
        cards(&extraction),
        vec!["struct Calc", "impl Calc", "struct Point", "struct Label"]
    );

    let mut rust = build(SourceLanguage::Rust);
    let extraction = run(&mut rust, &ExtractOptions::default()).unwrap();
    assert_eq!(cards(&extraction), vec!["struct Calc", "impl Calc", "struct Point"]);
}

#[test]
fn test_include_path_prefix() {
    let mut provider = FakeProvider::new(Some("Shape"), &[], &[]);
    let options = ExtractOptions {
        include_path: true,
        ..Default::default()
    };
    let extraction = run(&mut provider, &options).unwrap();
    assert!(extraction.context.starts_with("// ws/src/lib.rs\nstruct Shape {"));
}

#[test]
fn test_deterministic_output() {
    let make = || {
        FakeProvider::new(Some("Shape"), &["Vec<Foo>", "Point"], &["Label"])
            .define("Foo", "Foo", Origin::Project)
            .define("Point", "Point", Origin::Project)
            .define("Label", "Label", Origin::Project)
            .member("Shape", "Label")
            .member("Foo", "Point")
    };
    let first = run(&mut make(), &ExtractOptions::default()).unwrap();
    for _ in 0..5 {
        assert_eq!(run(&mut make(), &ExtractOptions::default()).unwrap(), first);
    }
}

#[test]
fn test_impls_from_other_files_merge_after_own_file() {
    let mut provider = FakeProvider::new(Some("Shape"), &[], &[]);
    let ops = vec![
        StructureNode::new("impl Shape", NodeKind::Impl),
        StructureNode::new("scale", NodeKind::Function)
            .with_detail("pub fn(&mut self, by: f64)")
            .with_parent(0),
        StructureNode::new("impl Other", NodeKind::Impl),
        StructureNode::new("skip", NodeKind::Function)
            .with_detail("fn(&self)")
            .with_parent(2),
    ];
    provider.impl_files.push((PathBuf::from("/ws/src/ops.rs"), ops));

    let extraction = run(&mut provider, &ExtractOptions::default()).unwrap();
    assert_eq!(
        extraction.context,
        "struct Shape {\n..\n}\nimpl Shape {\npub fn run(&self);\npub fn scale(&mut self, by: f64);\n}"
    );
}

#[test]
fn test_cancelled_extraction_stops_and_shuts_down() {
    let mut provider = FakeProvider::new(Some("Shape"), &["Point"], &["Label"])
        .define("Point", "Point", Origin::Project)
        .define("Label", "Label", Origin::Project);
    let flag = Arc::new(AtomicBool::new(true));
    let options = ExtractOptions::default().with_cancellation_flag(flag);

    let err = run(&mut provider, &options).unwrap_err();
    assert!(matches!(err, ContextError::Cancelled));
    assert!(!provider.describe_calls.contains_key("Point"));
    assert_eq!(provider.shutdowns, 1);
}
