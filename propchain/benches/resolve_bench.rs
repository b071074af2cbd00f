use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use propchain::placeholder::{Mode, PlaceholderExpander};
use propchain::profiles::Profiles;
use propchain::source::MapSource;
use propchain::Environment;

fn layered_environment(depth: usize) -> Environment {
    let env = Environment::new();
    for layer in 0..depth {
        let mut source = MapSource::new(format!("layer{layer}"));
        for key in 0..50 {
            source.insert(format!("layer{layer}.key{key}"), format!("value{key}"));
        }
        env.sources().add_last(Arc::new(source));
    }
    env.sources().add_last(Arc::new(
        MapSource::new("templates")
            .with("host", "#{layer0.key1}.example.com")
            .with("url", "https://#{host}:#{port:8443}/#{layer0.key2}"),
    ));
    env
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    // Deeper chains mean more sources walked before a hit in the last layer
    for depth in [1, 8, 32] {
        let env = layered_environment(depth);
        let key = format!("layer{}.key10", depth - 1);
        group.bench_with_input(BenchmarkId::new("last_layer", depth), &key, |b, key| {
            b.iter(|| env.get(black_box(key)).unwrap());
        });
    }

    let env = layered_environment(8);
    group.bench_function("missing_key", |b| {
        b.iter(|| env.get(black_box("no.such.key")).unwrap());
    });

    group.bench_function("typed_u16", |b| {
        env.sources()
            .add_first(Arc::new(MapSource::new("typed").with("port", "8080")));
        b.iter(|| env.get_as::<u16>(black_box("port")).unwrap());
    });

    group.finish();
}

fn bench_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion");

    let env = layered_environment(8);
    group.bench_function("nested_template", |b| {
        b.iter(|| env.get(black_box("url")).unwrap());
    });

    let expander = PlaceholderExpander::default();
    let text = "#{a}/#{b:fallback}/#{c:#{a}}/plain text/#{a}".repeat(10);
    group.bench_function("expander_only", |b| {
        b.iter(|| {
            expander
                .replace_placeholders(black_box(&text), Mode::Permissive, |key| {
                    (key == "a").then(|| "A".to_string())
                })
                .unwrap()
        });
    });

    group.finish();
}

fn bench_profiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("profiles");

    group.bench_function("parse", |b| {
        b.iter(|| Profiles::parse(black_box(&["(cloud | onprem) & !test & (eu | us)"])).unwrap());
    });

    let profiles = Profiles::parse(&["(cloud | onprem) & !test & (eu | us)"]).unwrap();
    group.bench_function("matches", |b| {
        b.iter(|| profiles.matches(|label| label == "cloud" || label == "eu"));
    });

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_expansion, bench_profiles);
criterion_main!(benches);
