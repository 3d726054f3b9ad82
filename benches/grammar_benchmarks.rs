use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use socialhook::command::{parse, Route};
use socialhook::config::RouteTokens;
use socialhook::dispatch::{CommandDispatcher, CommandRequest};
use socialhook::notify::LogNotifier;
use socialhook::services::{LogService, ServiceRegistry};
use std::sync::Arc;

const INPUTS: [(Route, &str); 4] = [
    (Route::Make, "twitter: hello world"),
    (Route::MakeAttachments, "twitter: a.png, b.png, c.png; three pictures"),
    (Route::Reply, "twitter: https://x.com/a/status/1; glad you liked it"),
    (
        Route::ReplyAttachments,
        "twitter: https://x.com/a/status/1; img1,img2; nice",
    ),
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for (route, text) in INPUTS {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_function(BenchmarkId::new("route", route.as_str()), |b| {
            b.iter(|| parse(route, std::hint::black_box(text)));
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    let mut registry = ServiceRegistry::new();
    registry
        .register("twitter", Arc::new(LogService::new("twitter")))
        .expect("register log service");
    let dispatcher = CommandDispatcher::new(
        Arc::new(registry),
        Arc::new(LogNotifier),
        RouteTokens::uniform("bench"),
    );
    let request = CommandRequest {
        token: "bench".into(),
        user_id: "U1".into(),
        user_name: None,
        text: "twitter: https://x.com/a/status/1; img1,img2; nice".into(),
    };

    c.bench_function("dispatch_reply_attachments", |b| {
        b.to_async(&runtime)
            .iter(|| dispatcher.dispatch(Route::ReplyAttachments, &request));
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_parse, bench_dispatch
);

criterion_main!(benches);
