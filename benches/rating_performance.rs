//! Performance benchmarks for rating calculations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use paddle_rating::types::GroupStageMatch;
use paddle_rating::{
    calculate_group_stage_ratings, calculate_initial_rating, calculate_match_rating,
};
use std::collections::BTreeMap;

fn bench_match_rating(c: &mut Criterion) {
    c.bench_function("match_rating_upset", |b| {
        b.iter(|| calculate_match_rating(black_box(2022), black_box(2089)))
    });

    c.bench_function("match_rating_top_bracket", |b| {
        b.iter(|| calculate_match_rating(black_box(1500), black_box(1800)))
    });
}

fn bench_initial_rating(c: &mut Criterion) {
    c.bench_function("initial_rating_extrapolated", |b| {
        b.iter(|| calculate_initial_rating(black_box(1800), black_box(12), black_box(true)))
    });
}

fn bench_group_stage(c: &mut Criterion) {
    // Eight-player round robin
    let players: Vec<String> = (0..8).map(|i| format!("player_{}", i)).collect();
    let initial: BTreeMap<String, i64> = players
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), 1500 + (i as i64 * 37)))
        .collect();

    let mut matches = Vec::new();
    for (i, a) in players.iter().enumerate() {
        for (j, b) in players.iter().enumerate().skip(i + 1) {
            let (winner, loser) = if (i + j) % 3 == 0 { (b, a) } else { (a, b) };
            matches.push(GroupStageMatch::new(
                format!("{}-{}", i, j),
                winner.clone(),
                loser.clone(),
            ));
        }
    }

    c.bench_function("group_stage_round_robin_8", |b| {
        b.iter(|| calculate_group_stage_ratings(black_box(&matches), black_box(&initial)))
    });
}

criterion_group!(
    benches,
    bench_match_rating,
    bench_initial_rating,
    bench_group_stage
);
criterion_main!(benches);
