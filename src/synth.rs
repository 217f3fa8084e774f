//! Synthetic EEG driven by an oddball timeline.
//!
//! Signal model, for sample time `t` and channel `c`:
//!
//! ```text
//! x[t, c] = noise[t, c] + w_c · Σ_k A · exp(-½ ((t - (t0_k + latency)) / width)²)
//! ```
//!
//! with `noise ~ N(0, noise_std²)` i.i.d., `w_c` the channel weight
//! (strong / weak / 0) and `t0_k` the target timestamps.  Every bump is
//! evaluated over the whole time axis, so distant tails are tiny but not
//! zero.
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::config::SynthConfig;
use crate::error::{invalid, Result};

/// Dense multichannel recording: `data` is `[T, C]`, `times` is `[T]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSignal {
    times: Array1<f64>,
    data: Array2<f64>,
}

impl DenseSignal {
    /// Wrap a timestamp vector and a `[T, C]` grid.
    ///
    /// Fails when the row count does not match `times`, or the signal has
    /// no channels.
    pub fn new(times: Array1<f64>, data: Array2<f64>) -> Result<Self> {
        if data.nrows() != times.len() {
            return Err(invalid(format!(
                "signal has {} rows but {} timestamps",
                data.nrows(),
                times.len()
            )));
        }
        if data.ncols() == 0 {
            return Err(invalid("signal has no channels"));
        }
        Ok(Self { times, data })
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_channels(&self) -> usize {
        self.data.ncols()
    }

    /// One channel as a `[T]` view.
    pub fn channel(&self, c: usize) -> Result<ArrayView1<'_, f64>> {
        if c >= self.n_channels() {
            return Err(invalid(format!(
                "channel {c} out of range for {} channels",
                self.n_channels()
            )));
        }
        Ok(self.data.column(c))
    }

    /// Column names of the signal table: `ch0 .. ch{C-1}`.
    pub fn channel_names(&self) -> Vec<String> {
        (0..self.n_channels()).map(|c| format!("ch{c}")).collect()
    }

    /// Resolve a `chN` column name to its index.
    pub fn channel_index(&self, name: &str) -> Result<usize> {
        name.strip_prefix("ch")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&c| c < self.n_channels())
            .ok_or_else(|| invalid(format!("unknown channel name {name:?}")))
    }

    pub fn into_parts(self) -> (Array1<f64>, Array2<f64>) {
        (self.times, self.data)
    }
}

/// Sample timestamps for `duration` seconds at `sfreq`.
///
/// Uses the arange form `i / sfreq` for every `i` with `i / sfreq < duration`;
/// if that count differs from `n_expected` the axis is rebuilt as
/// `linspace(0, duration, n_expected, endpoint = false)`.
pub fn time_axis(sfreq: f64, duration: f64, n_expected: usize) -> Array1<f64> {
    let step = 1.0 / sfreq;
    let n_arange = (duration / step).ceil().max(0.0) as usize;
    if n_arange == n_expected {
        Array1::from_shape_fn(n_expected, |i| i as f64 * step)
    } else {
        debug!(n_arange, n_expected, "arange length mismatch, using linspace");
        let dt = duration / n_expected as f64;
        Array1::from_shape_fn(n_expected, |i| i as f64 * dt)
    }
}

/// Gaussian bump `amplitude · exp(-½ ((t - peak) / width)²)` over all of `times`.
pub fn gaussian_template(
    times: &Array1<f64>,
    peak: f64,
    width: f64,
    amplitude: f64,
) -> Array1<f64> {
    times.mapv(|t| {
        let z = (t - peak) / width;
        amplitude * (-0.5 * z * z).exp()
    })
}

/// Add one template per target into `data` (`[T, C]`) following the channel
/// weighting in `cfg`.
fn inject_templates(
    data: &mut Array2<f64>,
    times: &Array1<f64>,
    target_times: &[f64],
    cfg: &SynthConfig,
) {
    let groups = [
        (&cfg.strong_channels, cfg.strong_weight),
        (&cfg.weak_channels, cfg.weak_weight),
    ];
    for &t0 in target_times {
        let bump = gaussian_template(times, t0 + cfg.latency, cfg.width, cfg.amplitude);
        for (channels, weight) in groups {
            for &c in channels {
                data.column_mut(c).scaled_add(weight, &bump);
            }
        }
    }
}

/// Noise-free signal: only the injected templates.
pub fn render_template(target_times: &[f64], cfg: &SynthConfig) -> Result<DenseSignal> {
    let noise = Array2::zeros((cfg.n_samples(), cfg.n_channels));
    synthesize_with_noise(target_times, cfg, noise)
}

/// Build a signal on top of a caller-supplied `[T, C]` noise realization.
///
/// `noise` must have shape `(cfg.n_samples(), cfg.n_channels)`.  The
/// returned data is exactly `noise + render_template(..)`.
pub fn synthesize_with_noise(
    target_times: &[f64],
    cfg: &SynthConfig,
    noise: Array2<f64>,
) -> Result<DenseSignal> {
    cfg.validate()?;
    let n_samples = cfg.n_samples();
    if noise.dim() != (n_samples, cfg.n_channels) {
        return Err(invalid(format!(
            "noise shape {:?} does not match ({n_samples}, {})",
            noise.dim(),
            cfg.n_channels
        )));
    }
    if let Some(t) = target_times.iter().find(|t| !t.is_finite()) {
        return Err(invalid(format!("non-finite target timestamp {t}")));
    }

    let times = time_axis(cfg.sfreq, cfg.duration, n_samples);
    let mut data = noise;
    inject_templates(&mut data, &times, target_times, cfg);

    debug!(
        n_samples,
        n_channels = cfg.n_channels,
        n_targets = target_times.len(),
        "synthesized signal"
    );
    DenseSignal::new(times, data)
}

/// Draw an i.i.d. `N(0, std²)` grid of shape `(n_samples, n_channels)`.
pub fn gaussian_noise<R: Rng + ?Sized>(
    n_samples: usize,
    n_channels: usize,
    std: f64,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let normal = Normal::new(0.0, std)
        .map_err(|e| invalid(format!("noise_std {std}: {e}")))?;
    Ok(Array2::from_shape_simple_fn((n_samples, n_channels), || normal.sample(&mut *rng)))
}

/// Synthesize a noisy signal with injected templates at `target_times`.
///
/// # Errors
///
/// [`ErpError::InvalidParameter`](crate::ErpError::InvalidParameter) for any
/// configuration rejected by [`SynthConfig::validate`] or a non-finite
/// target timestamp.
pub fn synthesize<R: Rng + ?Sized>(
    target_times: &[f64],
    cfg: &SynthConfig,
    rng: &mut R,
) -> Result<DenseSignal> {
    cfg.validate()?;
    let noise = gaussian_noise(cfg.n_samples(), cfg.n_channels, cfg.noise_std, rng)?;
    synthesize_with_noise(target_times, cfg, noise)
}
