mod common;
use common::rng;
use erpsim::{generate_timeline, target_count, ErpError, TimelineConfig};

#[test]
fn target_and_standard_counts_hold_for_all_ratios() {
    let mut r = rng(11);
    for total_frames in [1, 2, 7, 10, 33, 100] {
        for ratio in [0.0, 0.1, 0.25, 0.5, 0.6, 0.9, 1.0] {
            let cfg = TimelineConfig { total_frames, frame_period: 0.5, target_ratio: ratio };
            let tl = generate_timeline(&cfg, &mut r).unwrap();
            let expected = target_count(total_frames, ratio);
            assert_eq!(tl.len(), total_frames);
            assert_eq!(tl.n_targets(), expected, "N={total_frames} ratio={ratio}");
            let n_standard = tl.events().iter().filter(|e| !e.is_target).count();
            assert_eq!(n_standard, total_frames - expected);
        }
    }
}

#[test]
fn steps_are_contiguous_and_times_increase() {
    let cfg = TimelineConfig { total_frames: 50, frame_period: 0.25, target_ratio: 0.3 };
    let tl = generate_timeline(&cfg, &mut rng(3)).unwrap();
    for (i, ev) in tl.events().iter().enumerate() {
        assert_eq!(ev.step, i);
        assert_eq!(ev.time_sec, i as f64 * 0.25);
    }
    assert!(tl.events().windows(2).all(|w| w[1].time_sec > w[0].time_sec));
}

#[test]
fn reference_session_has_six_targets() {
    let tl = generate_timeline(&TimelineConfig::default(), &mut rng(0)).unwrap();
    assert_eq!(tl.n_targets(), 6);
    assert_eq!(tl.target_times().len(), 6);
    assert!(tl.target_times().iter().all(|&t| (0.0..10.0).contains(&t)));
}

#[test]
fn seeded_generation_is_reproducible() {
    let cfg = TimelineConfig { total_frames: 40, ..TimelineConfig::default() };
    let a = generate_timeline(&cfg, &mut rng(42)).unwrap();
    let b = generate_timeline(&cfg, &mut rng(42)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn invalid_parameters_fail_fast() {
    let bad = [
        TimelineConfig { target_ratio: 1.01, ..Default::default() },
        TimelineConfig { target_ratio: -0.5, ..Default::default() },
        TimelineConfig { total_frames: 0, ..Default::default() },
        TimelineConfig { frame_period: 0.0, ..Default::default() },
        TimelineConfig { frame_period: -1.0, ..Default::default() },
    ];
    for cfg in bad {
        let err = generate_timeline(&cfg, &mut rng(1)).unwrap_err();
        assert!(matches!(err, ErpError::InvalidParameter(_)), "{cfg:?} → {err}");
    }
}
