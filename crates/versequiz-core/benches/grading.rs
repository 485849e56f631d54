use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use versequiz_core::grader::similarity;
use versequiz_core::weights::WeightTable;

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");

    let verse = "For God so loved the world, that he gave his only begotten Son, \
                 that whosoever believeth in him should not perish, but have everlasting life.";
    let close = "for god so loved the world that he gave his only son that whoever \
                 believes in him should not perish but have eternal life";
    let korean = "하나님이 세상을 이처럼 사랑하사 독생자를 주셨으니 이는 그를 믿는 자마다 멸망하지 않고 영생을 얻게 하려 하심이라";
    let long = verse.repeat(10);

    group.bench_function("english_close", |b| {
        b.iter(|| similarity(black_box(verse), black_box(close)))
    });

    group.bench_function("korean_identical_spacing", |b| {
        let squashed: String = korean.split_whitespace().collect();
        b.iter(|| similarity(black_box(korean), black_box(&squashed)))
    });

    group.bench_function("ten_verses", |b| {
        b.iter(|| similarity(black_box(&long), black_box(close)))
    });

    group.finish();
}

fn bench_weighted_draw(c: &mut Criterion) {
    let mut group = c.benchmark_group("weighted_draw");

    for size in [100usize, 10_000] {
        let table = WeightTable::from_weights((0..size as u64).map(|i| 1 + i % 17).collect());
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_function(format!("{size}_verses"), |b| {
            b.iter(|| table.sample(black_box(&mut rng)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_similarity, bench_weighted_draw);
criterion_main!(benches);
