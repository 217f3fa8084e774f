/// Shared helpers for the integration tests.
use erpsim::{DenseSignal, Event, EventTimeline, SynthConfig};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[allow(unused)]
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

#[allow(unused)]
/// Default synthesis config with the noise switched off.
pub fn noiseless() -> SynthConfig {
    SynthConfig { noise_std: 0.0, ..SynthConfig::default() }
}

#[allow(unused)]
/// One-second frames with targets at the given steps.
pub fn timeline_with_targets(n_frames: usize, targets: &[usize]) -> EventTimeline {
    let events = (0..n_frames)
        .map(|step| Event {
            step,
            time_sec: step as f64,
            is_target: targets.contains(&step),
        })
        .collect();
    EventTimeline::from_events(events).unwrap()
}

#[allow(unused)]
/// Single-channel signal at `sfreq` whose value equals the sample index.
pub fn ramp_signal(n_samples: usize, sfreq: f64) -> DenseSignal {
    let times = Array1::from_shape_fn(n_samples, |i| i as f64 / sfreq);
    let data = Array2::from_shape_fn((n_samples, 1), |(i, _)| i as f64);
    DenseSignal::new(times, data).unwrap()
}

#[allow(unused)]
/// Maximum absolute difference between two arrays.
pub fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0_f64, f64::max)
}
