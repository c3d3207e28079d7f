use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::DMatrix;
use trackeval_core::classify::classify;
use trackeval_core::hungarian;
use trackeval_core::matcher::MatcherConfig;
use trackeval_core::types::{DetectionPoint, TrackSegment};

/// `n` tracks on a ring, `len` frames each, staggered start frames.
fn make_tracks(n: usize, len: u32, offset: f64) -> Vec<TrackSegment> {
    (0..n)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / n as f64;
            let r = 4.0 * n as f64;
            let t0 = (i % 7) as u32;
            TrackSegment::from_detections((t0..t0 + len).map(|t| {
                let drift = 0.1 * t as f64;
                DetectionPoint::new(
                    r * angle.cos() + drift + offset,
                    r * angle.sin(),
                    0.0,
                    t,
                )
            }))
            .unwrap()
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let config = MatcherConfig::new(5.0, Default::default());

    for n in [50, 200, 500] {
        let refs = make_tracks(n, 30, 0.0);
        let cands = make_tracks(n, 25, 1.5);
        group.bench_function(format!("{n}_tracks"), |b| {
            b.iter(|| black_box(classify(&refs, &cands, &config).unwrap()));
        });
    }

    group.finish();
}

fn bench_hungarian(c: &mut Criterion) {
    let mut group = c.benchmark_group("hungarian");

    for n in [10, 50, 100] {
        let costs = DMatrix::from_fn(n, 2 * n, |r, col| ((r * 31 + col * 17) % 97) as f64);
        group.bench_function(format!("{n}x{}", 2 * n), |b| {
            b.iter(|| black_box(hungarian::solve(&costs).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_hungarian);
criterion_main!(benches);
