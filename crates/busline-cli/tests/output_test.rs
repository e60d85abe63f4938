//! What a traced run writes, captured through a `tracing-subscriber` fmt
//! layer pointed at a shared buffer.

use std::{
    io,
    sync::{Arc, Mutex, PoisonError},
};

use busline_cli::{Args, run_traced};
use clap::Parser;
use tracing::Level;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
        String::from_utf8(bytes).unwrap().lines().map(str::to_owned).collect()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn completion_marker_is_the_last_line() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let config = Args::try_parse_from([
        "busline",
        "-d",
        "2",
        "-a",
        "1",
        "--hold-min",
        "0",
        "--hold-max",
        "0",
        "--jitter-max",
        "0",
    ])
    .unwrap()
    .simulation_config()
    .unwrap();

    let report = run_traced(config, 1).await.unwrap();

    let lines = captured.lines();
    let last = lines.last().unwrap();
    assert!(last.contains("simulation: all devices finished"), "last line was {last:?}");
    assert_eq!(lines.iter().filter(|l| l.contains("all devices finished")).count(), 1);

    // The summary sits directly above the marker, after the device summaries.
    let summary = report.to_string();
    let at = lines.iter().position(|l| l.contains(&summary)).unwrap();
    assert_eq!(at, lines.len() - 2);
    let device_summaries: Vec<_> =
        lines.iter().enumerate().filter(|(_, l)| l.contains("device summary")).collect();
    assert_eq!(device_summaries.len(), 2);
    assert!(device_summaries.iter().all(|(i, _)| *i < at));
}
