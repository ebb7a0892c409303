//! # Segue Performance Benchmarks
//!
//! Benchmarks for the retrieval engine and the graph builder.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench retrieval
//! cargo bench build
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::io::Write;

use segue::builder::build_track_graph_from_csv;
use segue::db::SqliteGraphStore;
use segue::retrieval;
use segue::store::{GraphStore, MemoryGraphStore};

const TRACKS: usize = 1_000;

/// Ring-with-chords graph: every track connects to its next five
/// neighbors with varying weights, giving a branching factor of ten.
fn populate(store: &mut dyn GraphStore) {
    for i in 0..TRACKS {
        for step in 1..=5 {
            let j = (i + step) % TRACKS;
            let weight = ((i + step) % 17 + 1) as u32;
            store
                .upsert_edge(&track_id(i), &track_id(j), weight)
                .expect("benchmark edge upsert");
        }
    }
}

fn track_id(i: usize) -> String {
    format!("track_{i:04}")
}

fn benchmark_retrieval(c: &mut Criterion) {
    let mut group = c.benchmark_group("retrieval");

    let mut memory = MemoryGraphStore::new();
    populate(&mut memory);

    let mut sqlite = SqliteGraphStore::open_in_memory().expect("in-memory sqlite");
    populate(&mut sqlite);

    let seeds = vec![track_id(0), track_id(500)];

    group.bench_function("single_seed_memory", |b| {
        b.iter(|| {
            retrieval::related_tracks(black_box("track_0000"), &memory, Some(10)).unwrap()
        })
    });

    group.bench_function("single_seed_sqlite", |b| {
        b.iter(|| {
            retrieval::related_tracks(black_box("track_0000"), &sqlite, Some(10)).unwrap()
        })
    });

    for max_hops in [1u32, 2, 3] {
        group.bench_with_input(
            BenchmarkId::new("multi_seed_memory", max_hops),
            &max_hops,
            |b, &max_hops| {
                b.iter(|| {
                    retrieval::related_tracks_for_multiple(
                        black_box(&seeds),
                        &memory,
                        Some(25),
                        max_hops,
                    )
                    .unwrap()
                })
            },
        );
    }

    group.bench_with_input(
        BenchmarkId::new("multi_seed_sqlite", 2u32),
        &2u32,
        |b, &max_hops| {
            b.iter(|| {
                retrieval::related_tracks_for_multiple(
                    black_box(&seeds),
                    &sqlite,
                    Some(25),
                    max_hops,
                )
                .unwrap()
            })
        },
    );

    group.finish();
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(20);

    // 200 playlists of 20 tracks drawn from a 1000-track catalog.
    let mut csv = String::from("track_id,playlist_id\n");
    for playlist in 0..200 {
        for slot in 0..20 {
            let track = (playlist * 13 + slot * 7) % TRACKS;
            csv.push_str(&format!("{},playlist_{playlist:03}\n", track_id(track)));
        }
    }

    let mut file = tempfile::NamedTempFile::new().expect("temp csv");
    file.write_all(csv.as_bytes()).expect("write temp csv");
    let csv_path = file.path().to_path_buf();

    group.bench_function("csv_into_memory_store", |b| {
        b.iter(|| {
            let mut store = MemoryGraphStore::new();
            build_track_graph_from_csv(black_box(&csv_path), &mut store).unwrap()
        })
    });

    group.bench_function("csv_into_sqlite_store", |b| {
        b.iter(|| {
            let mut store = SqliteGraphStore::open_in_memory().unwrap();
            build_track_graph_from_csv(black_box(&csv_path), &mut store).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_retrieval, benchmark_build);
criterion_main!(benches);
