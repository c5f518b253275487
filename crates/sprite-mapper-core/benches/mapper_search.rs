use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sprite_mapper_core::prelude::*;

fn generate_requests(count: usize, min_size: u32, max_size: u32) -> Vec<ImageRequest<String>> {
    let mut rng = StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            ImageRequest::new(format!("tex_{}", i), w, h)
        })
        .collect()
}

fn bench_full_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapper_search");
    group.sample_size(20);

    for count in [25, 50, 100] {
        let requests = generate_requests(count, 16, 64);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("exhaustive", count), &requests, |b, reqs| {
            let mut mapper = AtlasMapper::default();
            b.iter(|| black_box(mapper.map(reqs).expect("map")));
        });

        group.bench_with_input(BenchmarkId::new("cutoff_0.9", count), &requests, |b, reqs| {
            let cfg = MapperConfig::builder().cutoff_efficiency(0.9).build();
            let mut mapper = AtlasMapper::new(cfg);
            b.iter(|| black_box(mapper.map(reqs).expect("map")));
        });

        group.bench_with_input(BenchmarkId::new("budget_4", count), &requests, |b, reqs| {
            let cfg = MapperConfig::builder().max_candidate_atlases(Some(4)).build();
            let mut mapper = AtlasMapper::new(cfg);
            b.iter(|| black_box(mapper.map(reqs).expect("map")));
        });
    }

    group.finish();
}

fn bench_single_trial(c: &mut Criterion) {
    let mut group = c.benchmark_group("skyline_trial");

    for count in [100, 500] {
        let requests = generate_requests(count, 8, 48);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("place_all", count), &requests, |b, reqs| {
            let mut surface = SkylineSurface::new();
            b.iter(|| {
                surface.configure(1024, 4096);
                for r in reqs {
                    let _ = black_box(surface.try_place(r.width, r.height));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_search, bench_single_trial);
criterion_main!(benches);
