//! Integration tests for building an index from a project tree.

use std::fs;
use std::path::{Path, PathBuf};

use depgraph::{DepGraph, ExtractionWarningKind, ScanConfig, SymbolKind};
use tempfile::TempDir;

/// Create a temporary project with the given files.
fn project_with_files(files: &[(&str, &str)]) -> (TempDir, DepGraph) {
    let dir = tempfile::tempdir().expect("should create temp dir");
    for (path, content) in files {
        let full_path = dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("should create parent dirs");
        }
        fs::write(&full_path, content).expect("should write file");
    }
    let depgraph = DepGraph::new(dir.path()).expect("should open project");
    (dir, depgraph)
}

#[test]
fn indexes_every_swift_file_and_persists_the_result() {
    let (_dir, depgraph) = project_with_files(&[
        ("Sources/App/Model.swift", "struct Model {\n    let id: Int\n}\n"),
        (
            "Sources/App/Service.swift",
            "final class Service {\n    func load() -> Model {\n        Model(id: 1)\n    }\n}\n",
        ),
        ("README.md", "# Not Swift\n"),
    ]);

    let (index, stats) = depgraph.index().expect("index should succeed");

    assert_eq!(stats.files_indexed, 2);
    assert_eq!(stats.files_skipped, 0);
    assert!(stats.warnings.is_empty());
    assert_eq!(index.file_count(), 2);
    assert!(index.contains_file(Path::new("Sources/App/Model.swift")));
    assert!(!index.contains_file(Path::new("README.md")));
    assert!(depgraph.index_path().exists(), "index should be saved");
}

#[test]
fn declarations_carry_kind_span_and_container() {
    let (_dir, depgraph) = project_with_files(&[(
        "Sources/Shapes.swift",
        "\
protocol Shape {
    func area() -> Double
}

struct Circle: Shape {
    let radius: Double

    func area() -> Double {
        radius * radius * 3.14
    }
}
",
    )]);

    let (index, _) = depgraph.index().expect("index should succeed");
    let file = Path::new("Sources/Shapes.swift");
    let spans: Vec<(&str, SymbolKind, u32, u32, Option<&str>)> = index
        .declarations_in(file)
        .iter()
        .map(|d| {
            (
                d.name.as_str(),
                d.kind,
                d.start_line,
                d.end_line,
                d.container.as_deref(),
            )
        })
        .collect();

    assert_eq!(
        spans,
        vec![
            ("Shape", SymbolKind::Protocol, 1, 3, None),
            ("area", SymbolKind::Function, 2, 2, Some("Shape")),
            ("Circle", SymbolKind::Struct, 5, 11, None),
            ("radius", SymbolKind::Variable, 6, 6, Some("Circle")),
            ("area", SymbolKind::Function, 8, 10, Some("Circle")),
        ]
    );
    assert_eq!(index.conformance_count(), 1);
}

#[test]
fn references_are_joined_across_files_by_name() {
    let (_dir, depgraph) = project_with_files(&[
        ("Sources/A.swift", "func helper() {}\n"),
        ("Sources/B.swift", "func run() {\n    helper()\n}\n"),
        ("Sources/C.swift", "func other() {\n    helper()\n    helper()\n}\n"),
    ]);

    let (index, _) = depgraph.index().expect("index should succeed");

    let sites: Vec<(PathBuf, u32)> = index
        .references_to("helper")
        .map(|r| (r.file.clone(), r.line))
        .collect();
    assert_eq!(
        sites,
        vec![
            (PathBuf::from("Sources/B.swift"), 2),
            (PathBuf::from("Sources/C.swift"), 2),
            (PathBuf::from("Sources/C.swift"), 3),
        ]
    );
    assert!(index.is_declared("helper"));
}

#[test]
fn excluded_and_hidden_directories_are_not_indexed() {
    let (_dir, depgraph) = project_with_files(&[
        ("Sources/Main.swift", "func main() {}\n"),
        (".build/debug/Gen.swift", "func generated() {}\n"),
        ("Pods/Lib/Lib.swift", "func vendored() {}\n"),
        (".hidden/Secret.swift", "func secret() {}\n"),
    ]);

    let (index, _) = depgraph.index().expect("index should succeed");

    let files: Vec<&Path> = index.files().map(|f| f.path.as_path()).collect();
    assert_eq!(files, vec![Path::new("Sources/Main.swift")]);
}

#[test]
fn config_file_controls_extensions_and_index_location() {
    let (dir, _) = project_with_files(&[
        ("Sources/Main.swift", "func main() {}\n"),
        ("Sources/Interface.swiftinterface", "func exported() {}\n"),
        (
            ".depgraph/config.yaml",
            "extensions: [swift, swiftinterface]\nindex-path: out/graph.db\n",
        ),
    ]);

    let depgraph = DepGraph::new(dir.path()).expect("should open project");
    let (index, _) = depgraph.index().expect("index should succeed");

    assert_eq!(index.file_count(), 2);
    assert!(index.is_declared("exported"));
    assert!(depgraph.index_path().ends_with("out/graph.db"));
    assert!(dir.path().join("out/graph.db").exists());
}

#[test]
fn malformed_file_contributes_partial_result_and_warning() {
    let (_dir, depgraph) = project_with_files(&[
        ("Sources/Good.swift", "func good() {}\n"),
        ("Sources/Broken.swift", "struct Broken {\n    func half() {\n"),
    ]);

    let (index, stats) = depgraph.index().expect("index should succeed");

    assert_eq!(stats.files_indexed, 2);
    assert!(index.is_declared("good"));
    assert!(index.is_declared("Broken"), "partial extraction is kept");
    assert!(
        stats
            .warnings
            .iter()
            .any(|w| w.kind == ExtractionWarningKind::UnbalancedBraces
                && w.path == Path::new("Sources/Broken.swift")),
        "expected an unbalanced-braces warning, got {:?}",
        stats.warnings
    );
}

#[test]
fn non_utf8_file_is_skipped_with_warning() {
    let (dir, depgraph) = project_with_files(&[("Sources/Good.swift", "func good() {}\n")]);
    fs::write(dir.path().join("Sources/Latin1.swift"), [0x66, 0xff, 0xfe, 0x0a])
        .expect("should write file");

    let (index, stats) = depgraph.index().expect("index should succeed");

    assert_eq!(stats.files_indexed, 1);
    assert_eq!(stats.files_skipped, 1);
    assert!(!index.contains_file(Path::new("Sources/Latin1.swift")));
    assert_eq!(stats.warnings[0].kind, ExtractionWarningKind::Encoding);
}

#[test]
fn empty_project_yields_empty_index() {
    let (_dir, depgraph) = project_with_files(&[]);

    let (index, stats) = depgraph.index().expect("index should succeed");

    assert_eq!(stats.files_indexed, 0);
    assert_eq!(index.file_count(), 0);
    assert_eq!(index.declaration_count(), 0);
}

#[test]
fn thread_count_does_not_change_the_index() {
    let files: Vec<(String, String)> = (0..20)
        .map(|i| {
            (
                format!("Sources/M{i}.swift"),
                format!("struct Type{i} {{}}\nfunc use{i}() {{ _ = Type{}() }}\n", (i + 1) % 20),
            )
        })
        .collect();
    let borrowed: Vec<(&str, &str)> = files
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();
    let (dir, _) = project_with_files(&borrowed);

    let single = ScanConfig {
        threads: Some(1),
        ..ScanConfig::default()
    };
    let many = ScanConfig {
        threads: Some(8),
        ..ScanConfig::default()
    };
    let (a, _) = DepGraph::with_config(dir.path(), single)
        .expect("should open project")
        .index()
        .expect("index should succeed");
    let (b, _) = DepGraph::with_config(dir.path(), many)
        .expect("should open project")
        .index()
        .expect("index should succeed");

    assert_eq!(a, b);
}
