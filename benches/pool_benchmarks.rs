use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use kanadrill::engine::catalog::{Catalog, Script, Selection};
use kanadrill::engine::matcher;
use kanadrill::engine::pool::{DEFAULT_WEIGHT, WeightedCharacterPool};
use kanadrill::session::observer::NoopObserver;
use kanadrill::session::quiz::{QuizSession, SessionSettings};

fn full_pool() -> WeightedCharacterPool {
    let selection = Selection {
        scripts: Script::all().to_vec(),
        dakuten: true,
        combinations: true,
    };
    let chars = Catalog::load()
        .unwrap()
        .practice_set(&selection, DEFAULT_WEIGHT)
        .unwrap();
    WeightedCharacterPool::new(chars).unwrap()
}

fn bench_draw(c: &mut Criterion) {
    let pool = full_pool();
    let mut rng = SmallRng::seed_from_u64(42);

    c.bench_function("pool draw (208 characters)", |b| {
        b.iter(|| black_box(pool.draw_index(&mut rng)))
    });

    c.bench_function("pool draw_excluding (208 characters)", |b| {
        b.iter(|| black_box(pool.draw_excluding(black_box("き"), &mut rng)))
    });
}

fn bench_adjust(c: &mut Criterion) {
    let mut pool = full_pool();
    let glyphs: Vec<String> = pool.characters().iter().map(|c| c.glyph.clone()).collect();

    c.bench_function("adjust_weight over all glyphs", |b| {
        b.iter(|| {
            for (i, g) in glyphs.iter().enumerate() {
                let delta = if i % 3 == 0 { 2.0 } else { -1.0 };
                pool.adjust_weight(black_box(g), delta);
            }
        })
    });
}

fn bench_matcher(c: &mut Criterion) {
    let answers = ["shi", "si"];
    c.bench_function("classify full-width input", |b| {
        b.iter(|| matcher::classify(black_box("ＳＨ"), black_box(&answers)))
    });
}

fn bench_session(c: &mut Criterion) {
    c.bench_function("session 500 correct answers", |b| {
        b.iter(|| {
            let mut session = QuizSession::with_rng(
                full_pool(),
                SessionSettings::default(),
                Box::new(NoopObserver),
                SmallRng::seed_from_u64(7),
            )
            .unwrap();
            for _ in 0..500 {
                let answer = session.current_character().answers[0].clone();
                black_box(session.input_changed(&answer));
            }
        })
    });
}

criterion_group!(benches, bench_draw, bench_adjust, bench_matcher, bench_session);
criterion_main!(benches);
