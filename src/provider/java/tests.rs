//! Tests for the Java symbol provider

use super::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CALCULATOR: &str = r#"package com.acme.calc;

import java.util.List;
import com.acme.model.Foo;

/**
 * Adds numbers.
 */
@Service
final public class Calculator extends Base implements Op {
    private static final int LIMIT = 10, OTHER[] = {};
    protected Foo last;

    public Calculator(int seed) {
        this.seed = seed;
    }

    public int add(int a, int b) {
        return a + b;
    }

    @Override
    public List<Foo> collect(List<Foo> items, String... tags) {
        return items;
    }

    static class Inner {
        Mode mode;
    }
}
"#;

const FOO: &str = r#"package com.acme.model;

public class Foo {
    private Bar bar;
    public Foo(Bar bar) { this.bar = bar; }
    public Bar getBar() { return bar; }
}
"#;

const BAR: &str = r#"package com.acme.model;

public enum Bar {
    ONE, TWO;

    private Mode mode;

    Bar next() { return ONE; }
}
"#;

fn workspace() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let calc = root.join("src/main/java/com/acme/calc");
    let model = root.join("src/main/java/com/acme/model");
    fs::create_dir_all(&calc).unwrap();
    fs::create_dir_all(&model).unwrap();
    fs::write(calc.join("Calculator.java"), CALCULATOR).unwrap();
    fs::write(model.join("Foo.java"), FOO).unwrap();
    fs::write(model.join("Bar.java"), BAR).unwrap();
    (temp_dir, root)
}

fn calculator_path(root: &Path) -> PathBuf {
    root.join("src/main/java/com/acme/calc/Calculator.java")
}

fn started(root: &Path) -> JavaProvider {
    let mut provider = JavaProvider::new(root, ProviderConfig::default()).unwrap();
    provider.start().unwrap();
    provider
}

#[test]
fn test_resolve_primitive_method() {
    let (_tmp, root) = workspace();
    let mut provider = started(&root);
    let decl = provider
        .resolve_declaration(&calculator_path(&root), "int add(int a, int b);")
        .unwrap()
        .unwrap();
    assert_eq!(decl.name, "add");
    assert_eq!(decl.owner.unwrap().name, "Calculator");
    assert!(decl.params.is_empty());
    assert!(decl.ret.is_empty());
}

#[test]
fn test_resolve_generic_and_varargs() {
    let (_tmp, root) = workspace();
    let mut provider = started(&root);
    let decl = provider
        .resolve_declaration(
            &calculator_path(&root),
            "List< Foo > collect(List<Foo> items, String ... tags);",
        )
        .unwrap()
        .unwrap();
    let names: Vec<&str> = decl.params.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["List", "String"]);
    assert_eq!(decl.params[0].arity, 1);
    let span = decl.params[0].generics.clone().unwrap();
    assert_eq!(&CALCULATOR[span], "Foo");
    assert_eq!(decl.ret[0].name, "List");
}

#[test]
fn test_resolve_mismatch() {
    let (_tmp, root) = workspace();
    let mut provider = started(&root);
    let path = calculator_path(&root);
    assert!(provider.resolve_declaration(&path, "long add(int a, int b);").unwrap().is_none());
    assert!(provider.resolve_declaration(&path, "int add(int a);").unwrap().is_none());
    assert!(provider.resolve_declaration(&path, "int sub(int a, int b);").unwrap().is_none());
}

#[test]
fn test_definition_of_import_and_package() {
    let (_tmp, root) = workspace();
    let mut provider = started(&root);

    let offset = CALCULATOR.find("Foo last").unwrap();
    let foo = provider
        .definition_of(&calculator_path(&root), offset)
        .unwrap()
        .unwrap();
    assert_eq!(foo.name, "Foo");
    assert!(foo.path.ends_with("model/Foo.java"));

    // same package, no import
    let bar_offset = FOO.find("Bar bar;").unwrap();
    let bar = provider
        .definition_of(&foo.path, bar_offset)
        .unwrap()
        .unwrap();
    assert!(bar.path.ends_with("model/Bar.java"));

    // not part of the workspace
    let list_offset = CALCULATOR.find("List<Foo> collect").unwrap();
    assert!(
        provider
            .definition_of(&calculator_path(&root), list_offset)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_describe_class() {
    let (_tmp, root) = workspace();
    let mut provider = started(&root);
    let owner = provider
        .resolve_declaration(&calculator_path(&root), "int add(int a, int b);")
        .unwrap()
        .unwrap()
        .owner
        .unwrap();
    let text = provider.describe(&owner).unwrap().unwrap();
    assert_eq!(
        text,
        "public final class Calculator extends Base implements Op {\n\
         private static final int LIMIT, OTHER[];\n\
         protected Foo last;\n\
         public Calculator(int seed);\n\
         public int add(int a, int b);\n\
         public List<Foo> collect(List<Foo> items, String... tags);\n\
         static class Inner {\n\
         Mode mode;\n\
         }\n\
         }"
    );
}

#[test]
fn test_describe_enum() {
    let (_tmp, root) = workspace();
    let mut provider = started(&root);
    let foo_path = root.join("src/main/java/com/acme/model/Foo.java");
    let bar = provider
        .definition_of(&foo_path, FOO.find("Bar bar;").unwrap())
        .unwrap()
        .unwrap();
    let text = provider.describe(&bar).unwrap().unwrap();
    assert_eq!(
        text,
        "public enum Bar {\nONE, TWO;\nprivate Mode mode;\nBar next();\n}"
    );

    let refs = provider.member_type_refs(&bar).unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].name, "Mode");
}

#[test]
fn test_member_type_refs() {
    let (_tmp, root) = workspace();
    let mut provider = started(&root);
    let owner = provider
        .resolve_declaration(&calculator_path(&root), "int add(int a, int b);")
        .unwrap()
        .unwrap()
        .owner
        .unwrap();
    let refs = provider.member_type_refs(&owner).unwrap();
    let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
    // nested type fields belong to the nested type
    assert_eq!(names, vec!["Foo"]);
}

#[test]
fn test_flat_structure_has_no_impl_blocks() {
    let (_tmp, root) = workspace();
    let mut provider = started(&root);
    let nodes = provider.flat_structure_of(&calculator_path(&root)).unwrap();
    assert!(nodes.iter().all(|n| n.kind != NodeKind::Impl));

    let add = nodes.iter().find(|n| n.label == "add").unwrap();
    assert_eq!(add.kind, NodeKind::Function);
    assert_eq!(add.detail.as_deref(), Some("public int add(int a, int b)"));
    assert_eq!(nodes[add.parent.unwrap()].label, "Calculator");
}

#[test]
fn test_file_scope() {
    let mut files = OpenFiles::new::<JavaGrammar>().unwrap();
    let source = "package a.b;\nimport static x.y.Z.call;\nimport c.d.*;\nclass K {}\n";
    let tree = files.parse_snippet(source).unwrap();
    let scope = JavaGrammar::file_scope(tree.root_node(), source, Path::new("K.java"));
    assert_eq!(scope.module.as_deref(), Some("a.b"));
    assert_eq!(scope.imports.len(), 2);
    assert_eq!(scope.imports[0].name, "call");
    assert!(scope.imports[1].is_wildcard());
    assert_eq!(
        JavaGrammar::module_key(&scope.imports[1].module).as_deref(),
        Some("c.d")
    );
}
