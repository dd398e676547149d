use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dm_fs::{NormalizedPath, find_container_and_relative, io, relative_key};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_atomic_benchmark(c: &mut Criterion) {
    c.bench_function("io::write_atomic", |b| {
        let dir = tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("metadata.json"));
        let content = br#"{".": {"type": "dataset"}}"#;

        b.iter(|| {
            io::write_atomic(black_box(&path), black_box(content)).unwrap();
        })
    });
}

fn find_container_benchmark(c: &mut Criterion) {
    c.bench_function("layout::find_container_and_relative (found)", |b| {
        let dir = tempdir().unwrap();
        let experiment = dir.path().join("p/c/e");
        fs::create_dir_all(experiment.join(".datalad")).unwrap();
        let start = experiment.join("raw/run/deep");
        fs::create_dir_all(&start).unwrap();

        b.iter(|| {
            let found = find_container_and_relative(black_box(&start), dir.path());
            assert!(found.is_some());
        })
    });

    c.bench_function("path::relative_key", |b| {
        let base = Path::new("/managed/root");
        let path = Path::new("/managed/root/project/campaign/experiment/raw/file.dat");
        b.iter(|| relative_key(black_box(base), black_box(path)).unwrap())
    });
}

criterion_group!(benches, write_atomic_benchmark, find_container_benchmark);
criterion_main!(benches);
