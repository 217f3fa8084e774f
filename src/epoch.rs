//! Event-locked epoching and averaging.
//!
//! For each event `t0` the sample nearest `t0` becomes the anchor and the
//! window `[anchor - n_pre, anchor + n_post)` is cut from one channel.
//! Windows that would start before sample 0, or whose end reaches the last
//! sample, are dropped rather than zero-padded.  The kept windows are
//! stacked into an `[E, n_pre + n_post]` array and averaged over `E`.
use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::{debug, info};

use crate::config::EpochConfig;
use crate::error::{invalid, ErpError, Result};
use crate::synth::DenseSignal;

/// Windows cut around the events that survived boundary rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochStack {
    /// `[E, n_pre + n_post]`.
    pub data: Array2<f64>,
    /// Anchor sample index of each kept epoch.
    pub anchors: Vec<usize>,
    /// Event timestamp of each kept epoch.
    pub event_times: Vec<f64>,
    /// Number of events offered for extraction.
    pub n_candidates: usize,
    /// Sampling rate inferred from the timestamps.
    pub sfreq: f64,
    pub n_pre: usize,
    pub n_post: usize,
    pub tmin: f64,
    pub tmax: f64,
}

impl EpochStack {
    pub fn n_epochs(&self) -> usize {
        self.data.nrows()
    }

    pub fn window_len(&self) -> usize {
        self.n_pre.saturating_add(self.n_post)
    }

    pub fn is_empty(&self) -> bool {
        self.n_epochs() == 0
    }

    /// Events dropped by the boundary policy.
    pub fn n_dropped(&self) -> usize {
        self.n_candidates.saturating_sub(self.n_epochs())
    }

    /// Relative time of each window sample.
    pub fn times(&self) -> Array1<f64> {
        relative_time_axis(self.tmin, self.tmax, self.window_len())
    }
}

/// Averaged response over a relative time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Evoked {
    pub times: Array1<f64>,
    pub data: Array1<f64>,
    /// Number of epochs averaged.
    pub n_averaged: usize,
}

impl Evoked {
    /// Latency and value of the maximum inside `[lo, hi]` seconds.
    ///
    /// Returns `None` when no sample of the axis falls in the window.
    pub fn peak_in_window(&self, lo: f64, hi: f64) -> Option<(f64, f64)> {
        self.times
            .iter()
            .zip(self.data.iter())
            .filter(|&(&t, _)| t >= lo && t <= hi)
            .fold(None, |best: Option<(f64, f64)>, (&t, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((t, v)),
            })
    }
}

/// `1 / median(diff(times))`.
///
/// The median makes the estimate robust to jitter in irregularly sampled
/// recordings.
///
/// # Errors
///
/// [`ErpError::DegenerateInput`] when there are fewer than two timestamps or
/// the median spacing is not a positive finite number.
pub fn infer_sfreq(times: ArrayView1<'_, f64>) -> Result<f64> {
    if times.len() < 2 {
        return Err(ErpError::DegenerateInput(format!(
            "need at least 2 timestamps to infer sfreq, got {}",
            times.len()
        )));
    }
    let mut diffs: Vec<f64> = times
        .iter()
        .zip(times.iter().skip(1))
        .map(|(a, b)| b - a)
        .collect();
    if diffs.iter().any(|d| d.is_nan()) {
        return Err(ErpError::DegenerateInput("NaN in timestamps".into()));
    }
    diffs.sort_by(f64::total_cmp);

    let n = diffs.len();
    let median = if n % 2 == 1 {
        diffs[n / 2]
    } else {
        0.5 * (diffs[n / 2 - 1] + diffs[n / 2])
    };
    if !(median.is_finite() && median > 0.0) {
        return Err(ErpError::DegenerateInput(format!(
            "median timestamp spacing is {median}"
        )));
    }
    Ok(1.0 / median)
}

/// Index of the timestamp closest to `t0` (first one on ties).
///
/// `times` must be non-empty.
pub fn nearest_sample(times: ArrayView1<'_, f64>, t0: f64) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, &t) in times.iter().enumerate() {
        let d = (t - t0).abs();
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

/// `linspace(tmin, tmax, n, endpoint = false)`.
pub fn relative_time_axis(tmin: f64, tmax: f64, n: usize) -> Array1<f64> {
    let step = (tmax - tmin) / n as f64;
    Array1::from_shape_fn(n, |i| tmin + i as f64 * step)
}

/// Cut windows of `channel` around each of `event_times`.
///
/// Window sizes come from [`EpochConfig::window_samples`] at the sampling
/// rate inferred from the signal's timestamps.  `cfg.channel` is ignored;
/// the channel is passed explicitly.
///
/// # Errors
///
/// * [`ErpError::InvalidParameter`] for an invalid window, a zero-length
///   window, an out-of-range channel or a non-finite event timestamp.
/// * [`ErpError::DegenerateInput`] when the sampling rate cannot be inferred.
///
/// An empty result is not an error here; [`average_epochs`] rejects it.
/// A window at least as long as the recording drops every event, and the
/// returned stack then has no columns either.
pub fn extract_epochs(
    signal: &DenseSignal,
    channel: usize,
    event_times: &[f64],
    cfg: &EpochConfig,
) -> Result<EpochStack> {
    cfg.validate()?;
    let x = signal.channel(channel)?;
    if let Some(t) = event_times.iter().find(|t| !t.is_finite()) {
        return Err(invalid(format!("non-finite event timestamp {t}")));
    }
    let times = signal.times().view();
    let sfreq = infer_sfreq(times)?;
    let (n_pre, n_post) = cfg.window_samples(sfreq);
    let win = n_pre.saturating_add(n_post);
    if win == 0 {
        return Err(invalid(format!(
            "window [{}, {}) has no samples at {sfreq} Hz",
            cfg.tmin, cfg.tmax
        )));
    }

    let n_t = signal.n_samples();
    if win >= n_t {
        debug!(win, n_t, "window longer than recording, all epochs dropped");
        return Ok(EpochStack {
            data: Array2::zeros((0, 0)),
            anchors: Vec::new(),
            event_times: Vec::new(),
            n_candidates: event_times.len(),
            sfreq,
            n_pre,
            n_post,
            tmin: cfg.tmin,
            tmax: cfg.tmax,
        });
    }

    let mut rows: Vec<f64> = Vec::with_capacity(event_times.len().saturating_mul(win).min(n_t));
    let mut anchors = Vec::new();
    let mut kept_times = Vec::new();

    for &t0 in event_times {
        let idx = nearest_sample(times, t0);
        if idx < n_pre || n_post >= n_t - idx {
            debug!(t0, idx, n_pre, n_post, n_t, "epoch outside recording, dropped");
            continue;
        }
        rows.extend(x.slice(ndarray::s![idx - n_pre..idx + n_post]).iter());
        anchors.push(idx);
        kept_times.push(t0);
    }

    let data = Array2::from_shape_vec((anchors.len(), win), rows)
        .map_err(|e| invalid(format!("epoch stack shape: {e}")))?;

    info!(
        channel,
        sfreq,
        kept = anchors.len(),
        candidates = event_times.len(),
        window = win,
        "extracted epochs"
    );

    Ok(EpochStack {
        data,
        anchors,
        event_times: kept_times,
        n_candidates: event_times.len(),
        sfreq,
        n_pre,
        n_post,
        tmin: cfg.tmin,
        tmax: cfg.tmax,
    })
}

/// Sample-wise mean of all epochs in `stack`.
///
/// # Errors
///
/// [`ErpError::EmptyEpochSet`] when the stack holds no epochs.
pub fn average_epochs(stack: &EpochStack) -> Result<Evoked> {
    let empty = ErpError::EmptyEpochSet {
        n_candidates: stack.n_candidates,
    };
    if stack.is_empty() {
        return Err(empty);
    }
    let data = stack.data.mean_axis(Axis(0)).ok_or(empty)?;
    Ok(Evoked {
        times: stack.times(),
        data,
        n_averaged: stack.n_epochs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn sfreq_from_median_ignores_jitter() {
        let t = array![0.0, 0.01, 0.02, 0.0305, 0.04, 0.05];
        let sfreq = infer_sfreq(t.view()).unwrap();
        assert_abs_diff_eq!(sfreq, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn sfreq_even_count_takes_middle_mean() {
        let t = array![0.0, 0.1, 0.3, 0.6, 1.0];
        // diffs 0.1 0.2 0.3 0.4 → median 0.25
        assert_abs_diff_eq!(infer_sfreq(t.view()).unwrap(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn constant_timestamps_are_degenerate() {
        let t = array![1.0, 1.0, 1.0];
        assert!(matches!(infer_sfreq(t.view()), Err(ErpError::DegenerateInput(_))));
        let t = array![1.0];
        assert!(matches!(infer_sfreq(t.view()), Err(ErpError::DegenerateInput(_))));
    }

    #[test]
    fn nearest_prefers_first_on_tie() {
        let t = array![0.0, 1.0, 2.0];
        assert_eq!(nearest_sample(t.view(), 0.5), 0);
        assert_eq!(nearest_sample(t.view(), 1.6), 2);
        assert_eq!(nearest_sample(t.view(), -3.0), 0);
    }

    #[test]
    fn relative_axis_is_half_open() {
        let ax = relative_time_axis(-0.2, 0.8, 5);
        let expected = [-0.2, 0.0, 0.2, 0.4, 0.6];
        for (a, e) in ax.iter().zip(expected) {
            assert_abs_diff_eq!(*a, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn n_dropped_saturates_on_inconsistent_counts() {
        let stack = EpochStack {
            data: Array2::zeros((2, 3)),
            anchors: vec![5, 9],
            event_times: vec![0.5, 0.9],
            n_candidates: 1,
            sfreq: 10.0,
            n_pre: 1,
            n_post: 2,
            tmin: -0.1,
            tmax: 0.2,
        };
        assert_eq!(stack.n_dropped(), 0);
    }

    #[test]
    fn peak_in_window_picks_maximum() {
        let ev = Evoked {
            times: array![0.0, 0.1, 0.2, 0.3, 0.4],
            data: array![5.0, 1.0, 3.0, 2.0, 9.0],
            n_averaged: 1,
        };
        assert_eq!(ev.peak_in_window(0.05, 0.35), Some((0.2, 3.0)));
        assert_eq!(ev.peak_in_window(0.5, 0.6), None);
    }
}
