/// Benchmarks for workspace walking and type-context extraction
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tempfile::TempDir;
use type_context::config::ProviderConfig;
use type_context::indexer::{FileWalker, SourceLanguage};
use type_context::provider::provider_for;
use type_context::{ExtractOptions, extract_context};

/// Helper to create a chain of modules, each type holding the previous one
fn create_test_files(dir: &TempDir, count: usize) -> anyhow::Result<()> {
    let src_dir = dir.path().join("src");
    std::fs::create_dir_all(&src_dir)?;

    for i in 0..count {
        let field = if i == 0 {
            "pub value: i32,".to_string()
        } else {
            format!("pub inner: Vec<crate::module_{}::Data{}>,", i - 1, i - 1)
        };
        let content = format!(
            r#"
pub struct Data{i} {{
    {field}
    pub name: String,
}}

impl Data{i} {{
    pub fn new(name: String) -> Self {{
        todo!()
    }}
}}

impl Data{i} {{
    pub fn process(&self, other: &Data{i}) -> Option<Data{i}> {{
        None
    }}
}}
"#
        );
        std::fs::write(src_dir.join(format!("module_{}.rs", i)), content)?;
    }

    Ok(())
}

fn benchmark_walking(c: &mut Criterion) {
    let mut group = c.benchmark_group("walking");

    for file_count in [10, 50, 100].iter() {
        let codebase_dir = TempDir::new().unwrap();
        create_test_files(&codebase_dir, *file_count).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_files", file_count)),
            file_count,
            |b, _| {
                b.iter(|| {
                    let walker = FileWalker::new(codebase_dir.path(), 1_048_576)
                        .with_language(SourceLanguage::Rust);
                    black_box(walker.walk().unwrap())
                });
            },
        );
    }

    group.finish();
}

fn benchmark_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let options = ExtractOptions::default();

    for file_count in [10, 50, 100].iter() {
        let codebase_dir = TempDir::new().unwrap();
        create_test_files(&codebase_dir, *file_count).unwrap();
        let root = codebase_dir.path().canonicalize().unwrap();
        let last = file_count - 1;
        let path = root.join(format!("src/module_{}.rs", last));
        let signature = format!("pub fn process(&self, other: &Data{last}) -> Option<Data{last}>");

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_files", file_count)),
            file_count,
            |b, _| {
                b.iter(|| {
                    let mut provider =
                        provider_for(SourceLanguage::Rust, &root, &ProviderConfig::default())
                            .unwrap();
                    extract_context(provider.as_mut(), &path, black_box(&signature), &options)
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_walking, benchmark_extraction);
criterion_main!(benches);
