mod common;
use common::{rng, timeline_with_targets};
use erpsim::io::{read_signal, read_timeline, write_evoked, write_signal, write_timeline};
use erpsim::{
    average_epochs, extract_epochs, read_signal_csv, read_timeline_csv, synthesize,
    write_evoked_csv, write_signal_csv, write_timeline_csv, EpochConfig, SynthConfig,
};

#[test]
fn timeline_table_layout() {
    let tl = timeline_with_targets(3, &[1]);
    let mut buf = Vec::new();
    write_timeline(&tl, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text, "step,time_sec,is_target\n0,0,0\n1,1,1\n2,2,0\n");
    assert_eq!(read_timeline(text.as_bytes()).unwrap(), tl);
}

#[test]
fn signal_table_round_trips_exactly() {
    let cfg = SynthConfig {
        duration: 2.0,
        n_channels: 4,
        strong_channels: vec![1],
        weak_channels: vec![2],
        ..SynthConfig::default()
    };
    let sig = synthesize(&[0.5], &cfg, &mut rng(4)).unwrap();
    let mut buf = Vec::new();
    write_signal(&sig, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("timestamp_sec,ch0,ch1,ch2,ch3\n"));
    assert_eq!(read_signal(text.as_bytes()).unwrap(), sig);
}

#[test]
fn staged_files_match_in_memory_result() {
    let dir = tempfile::tempdir().unwrap();
    let tl_path = dir.path().join("oddball_input.csv");
    let sig_path = dir.path().join("epoch_p300.csv");
    let erp_path = dir.path().join("erp.csv");

    let tl = timeline_with_targets(10, &[0, 2, 3, 5, 8, 9]);
    write_timeline_csv(&tl, &tl_path).unwrap();
    let sig = synthesize(&tl.target_times(), &SynthConfig::default(), &mut rng(8)).unwrap();
    write_signal_csv(&sig, &sig_path).unwrap();

    let tl_back = read_timeline_csv(&tl_path).unwrap();
    let sig_back = read_signal_csv(&sig_path).unwrap();
    let cfg = EpochConfig::default();
    let from_files = extract_epochs(&sig_back, 3, &tl_back.target_times(), &cfg).unwrap();
    let in_memory = extract_epochs(&sig, 3, &tl.target_times(), &cfg).unwrap();
    assert_eq!(from_files, in_memory);
    assert_eq!(from_files.n_epochs(), 5); // t = 0 is dropped

    let evoked = average_epochs(&from_files).unwrap();
    write_evoked_csv(&evoked, &from_files, &erp_path).unwrap();
    let text = std::fs::read_to_string(&erp_path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "time_sec,average,epoch_0,epoch_1,epoch_2,epoch_3,epoch_4"
    );
    assert_eq!(lines.count(), 250);
}

#[test]
fn evoked_table_rejects_mismatched_stack() {
    let sig = synthesize(&[2.0, 4.0], &SynthConfig::default(), &mut rng(1)).unwrap();
    let short_cfg = EpochConfig { tmax: 0.4, ..EpochConfig::default() };
    let short = extract_epochs(&sig, 3, &[2.0, 4.0], &short_cfg).unwrap();
    let long = extract_epochs(&sig, 3, &[2.0, 4.0], &EpochConfig::default()).unwrap();
    let evoked = average_epochs(&long).unwrap();
    assert!(write_evoked(&evoked, &short, Vec::new()).is_err());
}

#[test]
fn missing_file_reports_path() {
    let err = read_timeline_csv(std::path::Path::new("/nonexistent/oddball.csv")).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/oddball.csv"));
}
