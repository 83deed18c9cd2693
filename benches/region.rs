use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mapshare::{RegionConfig, SharedRegion};

fn region_benches(c: &mut Criterion) {
    let config = RegionConfig {
        name: format!("bench_region_{}", std::process::id()),
        ..RegionConfig::default()
    };
    let mut writer = SharedRegion::create_or_open(&config).expect("create region");
    let reader = SharedRegion::open(&config).expect("open region");

    let long = "x".repeat(1500);
    let short = "short";

    c.bench_function("write_alternating_lengths", |b| {
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let text = if flip { long.as_str() } else { short };
            writer.write(black_box(text.as_bytes())).expect("write")
        })
    });

    writer.write(long.as_bytes()).expect("write");
    c.bench_function("read_checked", |b| b.iter(|| reader.read().expect("read")));
    c.bench_function("read_unchecked", |b| b.iter(|| reader.read_bytes()));

    drop(reader);
    drop(writer);
    let _ = SharedRegion::remove(&config);
}

criterion_group!(benches, region_benches);
criterion_main!(benches);
