//! Integration tests for sharing an index between threads.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use depgraph::{ConformanceGraph, DepGraph, Index, LineRange};
use tempfile::TempDir;

fn indexed_project(modules: usize) -> (TempDir, DepGraph, Index) {
    let dir = tempfile::tempdir().expect("should create temp dir");
    fs::create_dir_all(dir.path().join("Sources")).expect("should create dir");
    for i in 0..modules {
        let next = (i + 1) % modules;
        let content = format!(
            "protocol Role{i} {{}}\n\
             struct Unit{i}: Role{i} {{\n\
             \x20   func work() -> Unit{next} {{\n\
             \x20       Unit{next}()\n\
             \x20   }}\n\
             }}\n"
        );
        fs::write(dir.path().join(format!("Sources/Unit{i}.swift")), content)
            .expect("should write file");
    }
    let depgraph = DepGraph::new(dir.path()).expect("should open project");
    let (index, _) = depgraph.index().expect("index should succeed");
    (dir, depgraph, index)
}

#[test]
fn concurrent_impact_queries_return_consistent_results() {
    let (_dir, depgraph, index) = indexed_project(10);
    let index = Arc::new(index);
    let range = LineRange::new(1, 6).expect("valid range");

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let index = Arc::clone(&index);
            let depgraph = depgraph.clone();
            thread::spawn(move || {
                let file = PathBuf::from(format!("Sources/Unit{}.swift", t % 10));
                depgraph
                    .impact(&index, &file, range)
                    .expect("impact should succeed")
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    for result in &results {
        assert_eq!(result.impacted_files.len(), 1, "{result:?}");
    }
    let serial = depgraph
        .impact(&index, Path::new("Sources/Unit3.swift"), range)
        .expect("impact should succeed");
    assert_eq!(results[3], serial);
}

#[test]
fn conformance_graph_can_be_walked_from_many_threads() {
    let (_dir, _depgraph, index) = indexed_project(6);
    let graph = Arc::new(ConformanceGraph::from_index(&index));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let graph = Arc::clone(&graph);
            thread::spawn(move || graph.subtypes(&format!("Role{i}")))
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let hops = handle.join().expect("thread panicked");
        assert_eq!(hops.len(), 1);
        assert_eq!(hops[0].name, format!("Unit{i}"));
    }
}

#[test]
fn concurrent_loads_see_the_same_index() {
    let (_dir, depgraph, index) = indexed_project(5);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = depgraph.store().clone();
            thread::spawn(move || store.load().expect("load should succeed"))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("thread panicked"), index);
    }
}
