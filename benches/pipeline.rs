use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use erpsim::{average_epochs, extract_epochs, synthesize, EpochConfig, SynthConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TARGETS: [f64; 6] = [0.0, 2.0, 3.0, 5.0, 8.0, 9.0];

fn bench_synthesize(c: &mut Criterion) {
    let cfg = SynthConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    c.bench_function("synthesize [2500×24, 6 targets]", |b| {
        b.iter(|| {
            let sig = synthesize(black_box(&TARGETS), &cfg, &mut rng).unwrap();
            black_box(sig.n_samples())
        })
    });
}

fn bench_synthesize_long(c: &mut Criterion) {
    // 10 min session with a target every 2 s.
    let cfg = SynthConfig { duration: 600.0, ..SynthConfig::default() };
    let targets: Vec<f64> = (0..300).map(|i| i as f64 * 2.0).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    c.bench_function("synthesize [150000×24, 300 targets]", |b| {
        b.iter(|| {
            let sig = synthesize(black_box(&targets), &cfg, &mut rng).unwrap();
            black_box(sig.n_samples())
        })
    });
}

fn bench_extract_average(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let sig = synthesize(&TARGETS, &SynthConfig::default(), &mut rng).unwrap();
    let cfg = EpochConfig::default();
    c.bench_function("extract + average ch3 [-0.2, 0.8)", |b| {
        b.iter(|| {
            let stack = extract_epochs(black_box(&sig), 3, &TARGETS, &cfg).unwrap();
            let evoked = average_epochs(&stack).unwrap();
            black_box(evoked.data[0])
        })
    });
}

criterion_group!(benches, bench_synthesize, bench_synthesize_long, bench_extract_average);
criterion_main!(benches);
