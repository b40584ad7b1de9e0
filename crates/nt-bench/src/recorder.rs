//! CSV run-history recording.
//!
//! One file per run under `<results>/<benchmark>/<policy>/`, one row per
//! step. Column order is fixed for a run: timestamp, the parameter values,
//! the acceptance flag and normalized scores, the aggregate metrics, then
//! the raw per-sample throughput and memory readings.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use nt_optimizer::{Recorder, StepRecord};
use nt_types::TunerResult;

pub struct CsvRecorder {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl CsvRecorder {
    /// Create a timestamped history file for one run.
    pub fn create(results_dir: &Path, benchmark: &str, policy: &str) -> TunerResult<Self> {
        let dir = results_dir.join(benchmark).join(policy);
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.csv", Utc::now().format("%y-%m-%d_%H-%M-%S")));
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self { writer, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Recorder for CsvRecorder {
    fn write_header(&mut self, parameter_names: &[String], samples: usize) -> TunerResult<()> {
        write!(self.writer, "time")?;
        for name in parameter_names {
            write!(self.writer, ",{name}")?;
        }
        write!(
            self.writer,
            ",accepted,performance(%),size_decrease(%),throughput_increase(%),\
             memory_usage_decrease(%),size(B),mean_throughput(MB/s),mean_memory_usage"
        )?;
        for i in 0..samples {
            write!(self.writer, ",throughput_{i}")?;
        }
        for i in 0..samples {
            write!(self.writer, ",memory_usage_{i}")?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    fn record(&mut self, record: &StepRecord) -> TunerResult<()> {
        write!(
            self.writer,
            "{}",
            record.timestamp.format("%y-%m-%d_%H:%M:%S")
        )?;
        for value in &record.values {
            write!(self.writer, ",{value}")?;
        }
        write!(
            self.writer,
            ",{},{:.2},{:.2},{:.3},{:.3},{},{:.3},{:.1}",
            record.accepted,
            record.performance,
            record.size_decrease,
            record.throughput_increase,
            record.memory_decrease,
            record.file_size,
            record.mean_throughput,
            record.mean_memory
        )?;
        for throughput in &record.throughputs {
            write!(self.writer, ",{throughput:.1}")?;
        }
        for memory in &record.memory_usages {
            write!(self.writer, ",{memory:.1}")?;
        }
        writeln!(self.writer)?;

        // A benchmark iteration can take minutes; keep rows durable.
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> StepRecord {
        StepRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 14, 9, 30, 0).unwrap(),
            values: vec!["lz4".into(), "52428800".into(), "65536".into(), "1".into()],
            accepted: true,
            performance: 4.321,
            size_decrease: 10.0,
            throughput_increase: 2.5,
            memory_decrease: 0.5,
            file_size: 123_456_789,
            mean_throughput: 512.25,
            mean_memory: 364_520.0,
            throughputs: vec![500.0, 524.5],
            memory_usages: vec![364_000.0, 365_040.0],
        }
    }

    fn parameter_names() -> Vec<String> {
        ["compression_type", "cluster_size", "page_size", "cluster_bunch"]
            .map(String::from)
            .to_vec()
    }

    #[test]
    fn header_and_rows_have_matching_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = CsvRecorder::create(dir.path(), "lhcb", "annealer").unwrap();

        recorder.write_header(&parameter_names(), 2).unwrap();
        recorder.record(&sample_record()).unwrap();

        let content = fs::read_to_string(recorder.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let header_fields: Vec<&str> = lines[0].split(',').collect();
        let row_fields: Vec<&str> = lines[1].split(',').collect();
        // time + 4 parameters + 8 fixed metric columns + 2x2 samples
        assert_eq!(header_fields.len(), 17);
        assert_eq!(row_fields.len(), header_fields.len());

        assert!(lines[0].starts_with("time,compression_type,cluster_size"));
        assert!(lines[0].ends_with("throughput_0,throughput_1,memory_usage_0,memory_usage_1"));
    }

    #[test]
    fn rows_format_values_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = CsvRecorder::create(dir.path(), "lhcb", "hill_climber").unwrap();

        recorder.write_header(&parameter_names(), 2).unwrap();
        recorder.record(&sample_record()).unwrap();

        let content = fs::read_to_string(recorder.path()).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert!(row.contains(",lz4,52428800,65536,1,"));
        assert!(row.contains(",true,4.32,10.00,2.500,0.500,123456789,512.250,364520.0"));
        assert!(row.ends_with(",500.0,524.5,364000.0,365040.0"));
    }

    #[test]
    fn history_file_lands_under_benchmark_and_policy() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = CsvRecorder::create(dir.path(), "cms", "random_walker").unwrap();

        let path = recorder.path();
        assert!(path.starts_with(dir.path().join("cms").join("random_walker")));
        assert_eq!(path.extension().unwrap(), "csv");
    }
}
