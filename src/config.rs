//! Pipeline configuration.
//!
//! One struct per stage plus [`PipelineConfig`] bundling them.  All fields
//! have defaults matching the reference oddball experiment: 10 one-second
//! frames at a 0.6 target ratio, 24 channels at 250 Hz, and a P300-like bump
//! of 3.0 at 300 ms read from channel 3.
use serde::{Deserialize, Serialize};

use crate::error::{invalid, Result};

/// Configuration for the oddball timeline.
///
/// ```
/// use erpsim::TimelineConfig;
///
/// let cfg = TimelineConfig {
///     total_frames: 200,     // longer session
///     target_ratio: 0.2,     // rarer oddballs
///     ..TimelineConfig::default()
/// };
/// assert_eq!(cfg.frame_period, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Number of frames (steps) in the sequence.
    ///
    /// Default: `10`.
    pub total_frames: usize,

    /// Duration of one frame in seconds.  Step `i` starts at `i × frame_period`.
    ///
    /// Default: `1.0` s.
    pub frame_period: f64,

    /// Fraction of frames labelled as targets, in `[0, 1]`.
    ///
    /// The target count is `round(total_frames × target_ratio)`.  No
    /// spacing constraint is applied, so high ratios give unrealistically
    /// dense oddballs.
    ///
    /// Default: `0.6`.
    pub target_ratio: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            total_frames: 10,
            frame_period: 1.0,
            target_ratio: 0.6,
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.total_frames == 0 {
            return Err(invalid("total_frames must be positive"));
        }
        if !(self.frame_period.is_finite() && self.frame_period > 0.0) {
            return Err(invalid(format!(
                "frame_period must be positive, got {}",
                self.frame_period
            )));
        }
        if !(0.0..=1.0).contains(&self.target_ratio) {
            return Err(invalid(format!(
                "target_ratio must lie in [0, 1], got {}",
                self.target_ratio
            )));
        }
        Ok(())
    }
}

/// Configuration for the synthetic EEG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Nominal sampling rate in Hz.
    ///
    /// Default: `250.0` Hz.
    pub sfreq: f64,

    /// Recording length in seconds.  Should cover the timeline.
    ///
    /// Default: `10.0` s.
    pub duration: f64,

    /// Number of channels (`ch0 .. ch{n-1}`).
    ///
    /// Default: `24`.
    pub n_channels: usize,

    /// Standard deviation of the Gaussian background noise.
    ///
    /// Set to `0.0` for a noise-free signal.
    ///
    /// Default: `0.3`.
    pub noise_std: f64,

    /// Delay from event onset to template peak in seconds.
    ///
    /// Default: `0.30` s.
    pub latency: f64,

    /// Standard deviation of the Gaussian template in seconds.
    ///
    /// Default: `0.05` s.
    pub width: f64,

    /// Template peak height before channel weighting.
    ///
    /// Default: `3.0`.
    pub amplitude: f64,

    /// Channels receiving the template at [`strong_weight`](Self::strong_weight).
    ///
    /// Default: `[3, 4, 17]` (Fz, Pz, Cz in the reference montage).
    pub strong_channels: Vec<usize>,

    /// Channels receiving the template at [`weak_weight`](Self::weak_weight).
    /// Must not overlap `strong_channels`.
    ///
    /// Default: `[0, 1, 2, 5, 6, 7, 16, 18, 23]`.
    pub weak_channels: Vec<usize>,

    /// Default: `1.0`.
    pub strong_weight: f64,

    /// Default: `0.5`.
    pub weak_weight: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sfreq: 250.0,
            duration: 10.0,
            n_channels: 24,
            noise_std: 0.3,
            latency: 0.30,
            width: 0.05,
            amplitude: 3.0,
            strong_channels: vec![3, 4, 17],
            weak_channels: vec![0, 1, 2, 5, 6, 7, 16, 18, 23],
            strong_weight: 1.0,
            weak_weight: 0.5,
        }
    }
}

impl SynthConfig {
    /// Expected number of samples, `floor(duration × sfreq)`.
    ///
    /// ```
    /// use erpsim::SynthConfig;
    /// assert_eq!(SynthConfig::default().n_samples(), 2500);
    /// ```
    pub fn n_samples(&self) -> usize {
        (self.duration * self.sfreq) as usize
    }

    /// Template weight applied to `channel` (0 for unweighted channels).
    pub fn channel_weight(&self, channel: usize) -> f64 {
        if self.strong_channels.contains(&channel) {
            self.strong_weight
        } else if self.weak_channels.contains(&channel) {
            self.weak_weight
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(invalid(format!("{name} must be positive, got {v}")))
            }
        };
        positive("sfreq", self.sfreq)?;
        positive("duration", self.duration)?;
        positive("width", self.width)?;

        if self.n_channels == 0 {
            return Err(invalid("n_channels must be positive"));
        }
        if self.n_samples() == 0 {
            return Err(invalid(format!(
                "duration × sfreq = {} yields no samples",
                self.duration * self.sfreq
            )));
        }
        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err(invalid(format!(
                "noise_std must be non-negative, got {}",
                self.noise_std
            )));
        }
        for (name, v) in [
            ("latency", self.latency),
            ("amplitude", self.amplitude),
            ("strong_weight", self.strong_weight),
            ("weak_weight", self.weak_weight),
        ] {
            if !v.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {v}")));
            }
        }
        for &c in self.strong_channels.iter().chain(&self.weak_channels) {
            if c >= self.n_channels {
                return Err(invalid(format!(
                    "channel {c} out of range for {} channels",
                    self.n_channels
                )));
            }
        }
        if let Some(c) = self
            .strong_channels
            .iter()
            .find(|&&c| self.weak_channels.contains(&c))
        {
            return Err(invalid(format!(
                "channel {c} is listed as both strong and weak"
            )));
        }
        Ok(())
    }
}

/// Configuration for epoch extraction and averaging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochConfig {
    /// Channel index to epoch.
    ///
    /// Default: `3` (`ch3`, strongest response).
    pub channel: usize,

    /// Window start relative to the event, in seconds.  Must be `≤ 0`.
    ///
    /// Default: `-0.2` s.
    pub tmin: f64,

    /// Window end relative to the event (exclusive), in seconds.  Must be `> 0`.
    ///
    /// Default: `0.8` s.
    pub tmax: f64,

    /// Latency range `(lo, hi)` searched for the evoked peak.
    ///
    /// Default: `(0.25, 0.45)` s.
    pub component_window: (f64, f64),
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            channel: 3,
            tmin: -0.2,
            tmax: 0.8,
            component_window: (0.25, 0.45),
        }
    }
}

impl EpochConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.tmin.is_finite() && self.tmin <= 0.0) {
            return Err(invalid(format!("tmin must be ≤ 0, got {}", self.tmin)));
        }
        if !(self.tmax.is_finite() && self.tmax > 0.0) {
            return Err(invalid(format!("tmax must be > 0, got {}", self.tmax)));
        }
        Ok(())
    }

    /// Samples before and after the anchor: `(floor(|tmin| × sfreq), floor(tmax × sfreq))`.
    ///
    /// A `1e-9` tolerance is added before flooring so that an inferred rate
    /// like `249.9999999999` Hz still gives a whole number of samples.
    ///
    /// ```
    /// use erpsim::EpochConfig;
    /// let cfg = EpochConfig::default();
    /// assert_eq!(cfg.window_samples(250.0), (50, 200));
    /// assert_eq!(cfg.window_samples(249.999_999_999_9), (50, 200));
    /// ```
    pub fn window_samples(&self, sfreq: f64) -> (usize, usize) {
        const TOL: f64 = 1e-9;
        let n_pre = (self.tmin.abs() * sfreq + TOL).floor() as usize;
        let n_post = (self.tmax * sfreq + TOL).floor() as usize;
        (n_pre, n_post)
    }
}

/// Configuration for the whole simulation-and-analysis pipeline.
///
/// Loadable from JSON; missing fields fall back to their defaults:
///
/// ```
/// use erpsim::PipelineConfig;
///
/// let cfg: PipelineConfig =
///     serde_json::from_str(r#"{ "epochs": { "channel": 4 } }"#).unwrap();
/// assert_eq!(cfg.epochs.channel, 4);
/// assert_eq!(cfg.synth.n_channels, 24);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub timeline: TimelineConfig,
    pub synth: SynthConfig,
    pub epochs: EpochConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.timeline.validate()?;
        self.synth.validate()?;
        self.epochs.validate()?;
        if self.epochs.channel >= self.synth.n_channels {
            return Err(invalid(format!(
                "epoch channel {} out of range for {} channels",
                self.epochs.channel, self.synth.n_channels
            )));
        }
        Ok(())
    }
}
