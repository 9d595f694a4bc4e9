//! The record emission loop
//!
//! Each iteration generates one record, writes it as a single line, advances
//! the sequence counter and sleeps for the configured interval. The loop stops
//! once the configured total has been written, or when the reader goes away.

use eyre::{Context, Result};
use rand::Rng;
use std::io::{self, Write};
use std::thread;

use crate::config::{RecordFormat, Settings};
use crate::generator::Record;

/// Writes generated records to a sink at a fixed cadence
pub struct Emitter<W: Write, R: Rng> {
    settings: Settings,
    writer: W,
    rng: R,
    /// Sequence number of the next record; starts at 1
    next_seq: u64,
}

impl<W: Write, R: Rng> Emitter<W, R> {
    /// Create a new emitter writing to `writer`
    pub fn new(settings: Settings, writer: W, rng: R) -> Self {
        Self {
            settings,
            writer,
            rng,
            next_seq: 1,
        }
    }

    /// Number of records written so far
    pub fn emitted(&self) -> u64 {
        self.next_seq - 1
    }

    /// Whether the configured total has been reached
    pub fn is_done(&self) -> bool {
        self.settings.total.is_some_and(|total| self.emitted() >= total)
    }

    /// Generate and write a single record
    pub fn emit_one(&mut self) -> io::Result<Record> {
        let record = Record::generate(self.next_seq, &self.settings.language, &mut self.rng);

        let line = match self.settings.format {
            RecordFormat::Json => record.to_json().map_err(io::Error::other)?,
            RecordFormat::Text => record.format_text(),
        };
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;

        self.next_seq += 1;
        Ok(record)
    }

    /// Run until the configured total is reached, returning the number of records written.
    ///
    /// A closed reader (broken pipe) ends the run cleanly; other write errors are returned.
    pub fn run(&mut self) -> Result<u64> {
        log::info!(
            "Emitting records every {:?} ({})",
            self.settings.interval,
            match self.settings.total {
                Some(total) => format!("{} total", total),
                None => "unbounded".to_string(),
            }
        );

        while !self.is_done() {
            match self.emit_one() {
                Ok(record) => log::trace!("Emitted seq={} level={}", record.seq, record.level),
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    log::info!("Output closed after {} records", self.emitted());
                    return Ok(self.emitted());
                }
                Err(e) => return Err(e).context(format!("Failed to write record {}", self.next_seq)),
            }

            if self.is_done() {
                break;
            }
            thread::sleep(self.settings.interval);
        }

        log::info!("Reached total of {} records", self.emitted());
        Ok(self.emitted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Severity;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::{Duration, Instant};

    fn settings(total: Option<u64>, interval: Duration) -> Settings {
        Settings {
            interval,
            total,
            ..Default::default()
        }
    }

    fn lines(buf: &[u8]) -> Vec<String> {
        String::from_utf8(buf.to_vec()).unwrap().lines().map(String::from).collect()
    }

    /// Writer that fails every write with the given error kind
    struct FailingWriter(io::ErrorKind);

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(self.0, "sink failed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_emits_exact_total() {
        let mut buf = Vec::new();
        let mut emitter = Emitter::new(settings(Some(5), Duration::ZERO), &mut buf, StdRng::seed_from_u64(1));
        assert_eq!(emitter.run().unwrap(), 5);
        assert!(emitter.is_done());
        assert_eq!(lines(&buf).len(), 5);
    }

    #[test]
    fn test_zero_total_emits_nothing() {
        let mut buf = Vec::new();
        let mut emitter = Emitter::new(settings(Some(0), Duration::ZERO), &mut buf, StdRng::seed_from_u64(1));
        assert_eq!(emitter.run().unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_sequence_is_gapless_from_one() {
        let mut buf = Vec::new();
        let mut emitter = Emitter::new(settings(Some(50), Duration::ZERO), &mut buf, StdRng::seed_from_u64(2));
        emitter.run().unwrap();

        let seqs: Vec<u64> = lines(&buf)
            .iter()
            .map(|line| serde_json::from_str::<Record>(line).unwrap().seq)
            .collect();
        assert_eq!(seqs, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_json_lines_are_parseable_records() {
        let mut buf = Vec::new();
        let mut emitter = Emitter::new(settings(Some(20), Duration::ZERO), &mut buf, StdRng::seed_from_u64(3));
        emitter.run().unwrap();

        for line in lines(&buf) {
            let value: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert!(value["time"].is_string());
            assert!(value["msg"].is_string());
            assert_eq!(value["language"], "rust");
            let level: Severity = value["level"].as_str().unwrap().parse().unwrap();
            assert!(Severity::ALL.contains(&level));
        }
    }

    #[test]
    fn test_text_format() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        let config = Settings {
            format: RecordFormat::Text,
            ..settings(Some(3), Duration::ZERO)
        };
        let mut emitter = Emitter::new(config, &mut buf, StdRng::seed_from_u64(4));
        emitter.run().unwrap();

        let lines = lines(&buf);
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.starts_with("time="));
            assert!(line.contains(&format!(" seq={} ", i + 1)));
            assert!(line.contains(" msg=\""));
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let records = |seed| {
            let mut buf = Vec::new();
            let mut emitter = Emitter::new(settings(Some(10), Duration::ZERO), &mut buf, StdRng::seed_from_u64(seed));
            emitter.run().unwrap();
            lines(&buf)
                .iter()
                .map(|line| {
                    let record: Record = serde_json::from_str(line).unwrap();
                    (record.level, record.msg, record.request_id, record.duration_ms)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(records(99), records(99));
    }

    #[test]
    fn test_interval_between_records_not_after_last() {
        let mut buf = Vec::new();
        let mut emitter = Emitter::new(
            settings(Some(3), Duration::from_millis(20)),
            &mut buf,
            StdRng::seed_from_u64(5),
        );
        let start = Instant::now();
        emitter.run().unwrap();
        let elapsed = start.elapsed();

        // Two sleeps between three records
        assert!(elapsed >= Duration::from_millis(40), "finished too fast: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(60 + 500), "finished too slow: {:?}", elapsed);
    }

    #[test]
    fn test_broken_pipe_ends_cleanly() {
        let mut emitter = Emitter::new(
            settings(None, Duration::ZERO),
            FailingWriter(io::ErrorKind::BrokenPipe),
            StdRng::seed_from_u64(6),
        );
        assert_eq!(emitter.run().unwrap(), 0);
    }

    #[test]
    fn test_other_write_errors_propagate() {
        let mut emitter = Emitter::new(
            settings(Some(3), Duration::ZERO),
            FailingWriter(io::ErrorKind::PermissionDenied),
            StdRng::seed_from_u64(7),
        );
        let err = emitter.run().unwrap_err();
        assert!(err.to_string().contains("Failed to write record 1"));
    }
}
