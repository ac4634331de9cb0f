use cchess::{MoveList, Position, START_FEN};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const MIDGAME_FEN: &str = "1rbakabr1/9/1cn3nc1/p1p1p1p1p/9/2P6/P3P1P1P/1CN1C1N2/9/R1BAKAB1R w";

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_all_moves", |b| {
        let position = Position::from_fen(MIDGAME_FEN).unwrap();
        b.iter(|| {
            let mut mvs = MoveList::new();
            position.generate_all_moves(&mut mvs);
            black_box(mvs.len())
        })
    });

    c.bench_function("generate_all_moves_noncheck", |b| {
        let mut position = Position::from_fen(MIDGAME_FEN).unwrap();
        b.iter(|| {
            let mut mvs = MoveList::new();
            position.generate_all_moves_noncheck(&mut mvs);
            black_box(mvs.len())
        })
    });

    c.bench_function("generate_all_capture_moves", |b| {
        let position = Position::from_fen(START_FEN).unwrap();
        b.iter(|| {
            let mut mvs = MoveList::new();
            position.generate_all_capture_moves(&mut mvs);
            black_box(mvs.len())
        })
    });
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
