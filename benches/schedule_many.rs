//! schedule many benches
#[macro_use]
extern crate criterion;

use criterion::Criterion;
use fcompile::{
    graph::TaskTree,
    scheduler,
    types::{SourceId, Task},
};
use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;

/// A minimal stand-in compiler: given a source path as `$1`, writes an empty
/// `<module>.mod` for each module the source defines, so the scheduler's
/// interface-hash rehash step has a real file to read.
fn write_stub_compiler(dir: &std::path::Path) {
    let path = dir.join("stub_compiler.sh");
    std::fs::write(
        &path,
        r#"#!/bin/sh
set -e
grep -i '^module ' "$1" | while read -r _kw name _rest; do
  : > "$(echo "$name" | tr 'A-Z' 'a-z').mod"
done
"#,
    )
    .unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
}

/// Builds a linear chain of `n` synthetic sources on disk: `src0` defines
/// `m0`; `src1` uses `m0` and defines `m1`; and so on. Every source is
/// therefore a direct ancestor dependency of exactly the next one.
fn build_chain(dir: &std::path::Path, n: usize) -> HashMap<SourceId, Task> {
    let mut tasks = HashMap::new();
    for i in 0..n {
        let name = format!("src{i}.f90");
        let body = if i == 0 {
            format!("module m{i}\nend module m{i}\n")
        } else {
            format!("use m{prev}\nmodule m{i}\nend module m{i}\n", prev = i - 1)
        };
        let path = dir.join(&name);
        std::fs::write(&path, body).unwrap();
        tasks.insert(
            SourceId::new(name),
            Task {
                source: path,
                args: vec!["sh".into(), "stub_compiler.sh".into()],
                includes: vec![],
            },
        );
    }
    tasks
}

fn graph_build_benchmark(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let tasks = build_chain(dir.path(), 500);

    let mut group = c.benchmark_group("graph build");
    group.sample_size(10);
    group.bench_function("500-node chain", |b| {
        b.iter(|| {
            let _ = TaskTree::build(&tasks).unwrap();
        });
    });
}

fn scheduler_run_benchmark(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    write_stub_compiler(dir.path());
    let tasks = build_chain(dir.path(), 100);
    let tree = std::sync::Arc::new(TaskTree::build(&tasks).unwrap());
    let tasks = std::sync::Arc::new(tasks);
    let changed: Vec<SourceId> = tasks.keys().cloned().collect();

    let prev_cwd = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let mut group = c.benchmark_group("schedule many");
    group.sample_size(10);
    group.bench_function("100-node chain, 4 workers", |b| {
        b.to_async(tokio::runtime::Runtime::new().unwrap()).iter(|| {
            let tree = tree.clone();
            let tasks = tasks.clone();
            let changed = changed.clone();
            async move {
                let (_, outcome) = scheduler::run(tree, tasks, HashMap::new(), changed, 4).await;
                outcome.unwrap();
            }
        });
    });

    std::env::set_current_dir(prev_cwd).unwrap();
}

criterion_group!(benches, graph_build_benchmark, scheduler_run_benchmark);
criterion_main!(benches);
