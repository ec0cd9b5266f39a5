use criterion::{black_box, criterion_group, criterion_main, Criterion};

use caissa_engine::{MoveFilter, Position};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn movegen_benches(c: &mut Criterion) {
    let start = Position::starting();
    let kiwipete = Position::from_fen(KIWIPETE).unwrap();

    c.bench_function("legal_moves startpos", |b| {
        b.iter(|| black_box(&start).legal_moves(MoveFilter::default()))
    });

    c.bench_function("legal_moves kiwipete", |b| {
        b.iter(|| black_box(&kiwipete).legal_moves(MoveFilter::default()))
    });

    c.bench_function("perft3 startpos", |b| {
        b.iter(|| black_box(&start).perft(3))
    });

    c.bench_function("perft2 kiwipete", |b| {
        b.iter(|| black_box(&kiwipete).perft(2))
    });
}

criterion_group!(benches, movegen_benches);
criterion_main!(benches);
