//! CSV tables handed between pipeline stages.
//!
//! Timeline table: `step,time_sec,is_target` (0/1).  The legacy column names
//! `frame` and `is_oddball` are accepted on read.
//!
//! Signal table: `timestamp_sec,ch0,ch1,…`.
//!
//! Evoked table (for an external plotter): `time_sec,average,epoch_0,…`.
//!
//! Floats are written with Rust's shortest round-trip formatting, so a
//! write → read cycle reproduces every value exactly.
use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::epoch::{EpochStack, Evoked};
use crate::synth::DenseSignal;
use crate::timeline::{Event, EventTimeline};

// ── Low-level CSV helpers ─────────────────────────────────────────────────────

/// Header plus data rows, each split on `,` and trimmed.  Blank lines are skipped.
struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines();
        let header = loop {
            match lines.next() {
                Some(line) => {
                    let line = line.context("reading CSV header")?;
                    if !line.trim().is_empty() {
                        break split_row(&line);
                    }
                }
                None => bail!("empty CSV table"),
            }
        };
        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            let line = line.with_context(|| format!("reading CSV line {}", i + 2))?;
            if line.trim().is_empty() {
                continue;
            }
            let row = split_row(&line);
            if row.len() != header.len() {
                bail!(
                    "CSV line {}: {} fields, header has {}",
                    i + 2,
                    row.len(),
                    header.len()
                );
            }
            rows.push(row);
        }
        Ok(Self { header, rows })
    }

    fn column(&self, names: &[&str]) -> Result<usize> {
        self.header
            .iter()
            .position(|h| names.contains(&h.as_str()))
            .with_context(|| format!("missing column {:?}", names[0]))
    }
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',').map(|f| f.trim().to_string()).collect()
}

fn parse_f64(field: &str, row: usize, col: &str) -> Result<f64> {
    field
        .parse::<f64>()
        .with_context(|| format!("row {row}, column {col}: {field:?} is not a number"))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(f))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("opening {}", path.display()))
}

// ── Timeline table ────────────────────────────────────────────────────────────

pub fn write_timeline<W: Write>(timeline: &EventTimeline, mut w: W) -> Result<()> {
    writeln!(w, "step,time_sec,is_target")?;
    for ev in timeline.events() {
        writeln!(w, "{},{},{}", ev.step, ev.time_sec, u8::from(ev.is_target))?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_timeline<R: Read>(reader: R) -> Result<EventTimeline> {
    let table = Table::parse(reader)?;
    let c_step = table.column(&["step", "frame"])?;
    let c_time = table.column(&["time_sec"])?;
    let c_target = table.column(&["is_target", "is_oddball"])?;

    let mut events = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let step = row[c_step]
            .parse::<usize>()
            .with_context(|| format!("row {i}: bad step {:?}", row[c_step]))?;
        let time_sec = parse_f64(&row[c_time], i, "time_sec")?;
        let is_target = match row[c_target].as_str() {
            "0" => false,
            "1" => true,
            other => bail!("row {i}: is_target must be 0 or 1, got {other:?}"),
        };
        events.push(Event { step, time_sec, is_target });
    }
    Ok(EventTimeline::from_events(events)?)
}

pub fn write_timeline_csv(timeline: &EventTimeline, path: &Path) -> Result<()> {
    write_timeline(timeline, create(path)?)
}

pub fn read_timeline_csv(path: &Path) -> Result<EventTimeline> {
    read_timeline(open(path)?).with_context(|| format!("parsing {}", path.display()))
}

// ── Signal table ──────────────────────────────────────────────────────────────

pub fn write_signal<W: Write>(signal: &DenseSignal, mut w: W) -> Result<()> {
    let mut header = String::from("timestamp_sec");
    for name in signal.channel_names() {
        header.push(',');
        header.push_str(&name);
    }
    writeln!(w, "{header}")?;
    for (t, row) in signal.times().iter().zip(signal.data().rows()) {
        write!(w, "{t}")?;
        for v in row {
            write!(w, ",{v}")?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

/// Read a signal table.  Channel columns are taken in header order after
/// `timestamp_sec` and must be named `ch0, ch1, …` consecutively.
pub fn read_signal<R: Read>(reader: R) -> Result<DenseSignal> {
    let table = Table::parse(reader)?;
    let c_time = table.column(&["timestamp_sec"])?;
    let channels: Vec<usize> = (0..table.header.len()).filter(|&c| c != c_time).collect();
    for (k, &c) in channels.iter().enumerate() {
        if table.header[c] != format!("ch{k}") {
            bail!("expected column ch{k}, found {:?}", table.header[c]);
        }
    }

    let n_t = table.rows.len();
    let mut times = Vec::with_capacity(n_t);
    let mut data = Vec::with_capacity(n_t * channels.len());
    for (i, row) in table.rows.iter().enumerate() {
        times.push(parse_f64(&row[c_time], i, "timestamp_sec")?);
        for &c in &channels {
            data.push(parse_f64(&row[c], i, &table.header[c])?);
        }
    }
    let data = Array2::from_shape_vec((n_t, channels.len()), data)?;
    Ok(DenseSignal::new(Array1::from_vec(times), data)?)
}

pub fn write_signal_csv(signal: &DenseSignal, path: &Path) -> Result<()> {
    write_signal(signal, create(path)?)
}

pub fn read_signal_csv(path: &Path) -> Result<DenseSignal> {
    read_signal(open(path)?).with_context(|| format!("parsing {}", path.display()))
}

// ── Evoked table ──────────────────────────────────────────────────────────────

/// One row per relative-time sample: the average followed by every epoch.
pub fn write_evoked<W: Write>(evoked: &Evoked, stack: &EpochStack, mut w: W) -> Result<()> {
    if stack.window_len() != evoked.data.len() {
        bail!(
            "evoked has {} samples but epochs have {}",
            evoked.data.len(),
            stack.window_len()
        );
    }
    write!(w, "time_sec,average")?;
    for e in 0..stack.n_epochs() {
        write!(w, ",epoch_{e}")?;
    }
    writeln!(w)?;
    for (j, (t, avg)) in evoked.times.iter().zip(evoked.data.iter()).enumerate() {
        write!(w, "{t},{avg}")?;
        for v in stack.data.column(j) {
            write!(w, ",{v}")?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_evoked_csv(evoked: &Evoked, stack: &EpochStack, path: &Path) -> Result<()> {
    write_evoked(evoked, stack, create(path)?)
}
