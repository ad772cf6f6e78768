// Store benchmarks for the opening explorer.
//
// Covers position hashing, entry encoding and decoding, single-game merges
// at various game lengths, and point probes against a populated store.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use opening_explorer::stats::{decode, encode};
use opening_explorer::{
    Blake3PositionHasher, GameReference, ImportCoordinator, Month, Outcome, PositionHasher,
    PositionKey, PositionStore, Speed, StatEntry,
};

fn game(i: usize) -> GameReference {
    let outcomes = [Outcome::WhiteWins, Outcome::Draw, Outcome::BlackWins];
    GameReference {
        id: format!("b{:07}", i).parse().expect("bench id"),
        outcome: outcomes[i % 3],
        speed: Speed::ALL[i % Speed::ALL.len()],
        month: Month::try_from((2015 * 12 + i % 120) as u16).expect("bench month"),
        rating: 1000 + (i % 1500) as u16,
    }
}

fn line(hasher: &Blake3PositionHasher, game: usize, plies: usize) -> Vec<PositionKey> {
    // Shared opening, then positions unique to the game.
    (0..plies)
        .map(|ply| {
            let canonical = if ply < 8 {
                format!("opening {}", ply)
            } else {
                format!("game {} ply {}", game, ply)
            };
            hasher.hash(canonical.as_str())
        })
        .collect()
}

fn bench_hash_position(c: &mut Criterion) {
    let hasher = Blake3PositionHasher::standard();
    let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    c.bench_function("position/hash_fen", |b| {
        b.iter(|| hasher.hash(black_box(fen)));
    });
}

fn bench_codec(c: &mut Criterion) {
    let entry: StatEntry = (0..200).map(|i| StatEntry::from_game_ref(&game(i))).sum();
    let bytes = encode(&entry);

    c.bench_function("codec/encode_full_entry", |b| {
        b.iter(|| encode(black_box(&entry)));
    });
    c.bench_function("codec/decode_full_entry", |b| {
        b.iter(|| decode(black_box(&bytes)).unwrap());
    });
}

fn bench_merge_game(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/merge_game");
    let hasher = Blake3PositionHasher::standard();

    for plies in [20, 80, 200] {
        let store = Arc::new(PositionStore::open_temporary().unwrap());
        let coordinator = ImportCoordinator::new(store);
        let mut i = 0;

        group.throughput(Throughput::Elements(plies as u64));
        group.bench_with_input(BenchmarkId::from_parameter(plies), &plies, |b, &plies| {
            b.iter(|| {
                i += 1;
                coordinator
                    .merge_game(&game(i), line(&hasher, i, plies))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_probe(c: &mut Criterion) {
    let hasher = Blake3PositionHasher::standard();
    let store = Arc::new(PositionStore::open_temporary().unwrap());
    let coordinator = ImportCoordinator::new(Arc::clone(&store));
    for i in 0..1_000 {
        coordinator.merge_game(&game(i), line(&hasher, i, 40)).unwrap();
    }

    let hot = hasher.hash("opening 0");
    let cold = hasher.hash("game 500 ply 30");
    let missing = hasher.hash("never played");

    let mut group = c.benchmark_group("store/get");
    for (name, key) in [("hot", hot), ("cold", cold), ("missing", missing)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &key, |b, key| {
            b.iter(|| store.get(key).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_hash_position,
    bench_codec,
    bench_merge_game,
    bench_probe,
);
criterion_main!(benches);
