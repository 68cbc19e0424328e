use criterion::{criterion_group, criterion_main, Criterion};
use hybridai_core::{Request, RequestKind, RouterConfig, StrategyRouter, Urgency};
use std::hint::black_box;

fn bench_route_simple_command(c: &mut Criterion) {
    let router = StrategyRouter::default();
    let request = Request::new(RequestKind::VoiceCommand, "Take picture.");

    c.bench_function("route_simple_command", |b| {
        b.iter(|| router.route(black_box(&request)));
    });
}

fn bench_route_keyword_scan(c: &mut Criterion) {
    let router = StrategyRouter::default();
    let request = Request::new(
        RequestKind::TextQuery,
        "could you help me understand what the sign on the left side of the platform says",
    )
    .with_context("location", "station")
    .with_context("timeOfDay", "evening");

    c.bench_function("route_keyword_scan", |b| {
        b.iter(|| router.route(black_box(&request)));
    });
}

fn bench_route_large_keyword_lists(c: &mut Criterion) {
    let mut config = RouterConfig::new();
    config
        .analysis_keywords
        .extend((0..200).map(|i| format!("topic{i}")));
    let router = StrategyRouter::new(config);
    let request = Request::new(RequestKind::Transcript, "nothing here matches any keyword at all")
        .with_urgency(Urgency::Normal);

    c.bench_function("route_large_keyword_lists", |b| {
        b.iter(|| router.route(black_box(&request)));
    });
}

criterion_group!(
    benches,
    bench_route_simple_command,
    bench_route_keyword_scan,
    bench_route_large_keyword_lists
);
criterion_main!(benches);
