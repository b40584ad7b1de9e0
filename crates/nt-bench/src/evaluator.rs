//! Benchmark execution against the iotools binaries.
//!
//! One evaluation generates an RNTuple with the candidate storage settings
//! via `gen_<benchmark>`, then runs the matching read benchmark under
//! `/usr/bin/time` the requested number of times. Everything is
//! synchronous: a benchmark's resource usage must not overlap another run,
//! and a hung benchmark simply blocks the walker.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use nt_optimizer::{Evaluator, RawMetrics};
use nt_types::{Settings, TunerError, TunerResult};

use crate::parse::{max_resident_kb, throughput_mbps};

/// Runs iotools generators and benchmarks for one benchmark id.
pub struct IotoolsEvaluator {
    benchmark: String,
    /// Directory holding the `gen_<benchmark>` and `<benchmark>` binaries.
    iotools_dir: PathBuf,
    /// Directory holding the reference ROOT files the generators read.
    reference_dir: PathBuf,
    /// Directory for temporarily generated RNTuple files.
    scratch_dir: PathBuf,
    use_rdf: bool,
    drop_page_cache: bool,
    keep_generated: bool,
}

impl IotoolsEvaluator {
    pub fn new(
        benchmark: impl Into<String>,
        iotools_dir: impl Into<PathBuf>,
        reference_dir: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            benchmark: benchmark.into(),
            iotools_dir: iotools_dir.into(),
            reference_dir: reference_dir.into(),
            scratch_dir: scratch_dir.into(),
            use_rdf: false,
            drop_page_cache: true,
            keep_generated: false,
        }
    }

    pub fn with_rdf(mut self, enabled: bool) -> Self {
        self.use_rdf = enabled;
        self
    }

    pub fn with_page_cache_drop(mut self, enabled: bool) -> Self {
        self.drop_page_cache = enabled;
        self
    }

    pub fn with_keep_generated(mut self, enabled: bool) -> Self {
        self.keep_generated = enabled;
        self
    }

    fn error(&self, message: impl Into<String>) -> TunerError {
        TunerError::Evaluation {
            benchmark: self.benchmark.clone(),
            message: message.into(),
        }
    }

    /// Stem of the reference data file each benchmark reads.
    fn reference_stem(&self) -> TunerResult<&'static str> {
        match self.benchmark.as_str() {
            "atlas" => Ok("gg_data"),
            "cms" => Ok("ttjet"),
            "h1" => Ok("h1dstX10"),
            "lhcb" => Ok("B2HHH"),
            other => Err(self.error(format!("unknown benchmark: {other}"))),
        }
    }

    /// Path of the RNTuple generated for a parameter set.
    pub(crate) fn generated_path(&self, settings: &Settings) -> TunerResult<PathBuf> {
        let stem = self.reference_stem()?;
        Ok(self.scratch_dir.join(format!(
            "{stem}~{}_{}_{}.ntuple",
            settings.compression_type, settings.page_size, settings.cluster_size
        )))
    }

    /// Generate the RNTuple for this parameter set, reusing an existing
    /// file if a previous evaluation left one behind.
    fn generate(&self, settings: &Settings) -> TunerResult<PathBuf> {
        let output_path = self.generated_path(settings)?;
        if output_path.exists() {
            debug!(path = %output_path.display(), "reusing generated file");
            return Ok(output_path);
        }

        let generator = self.iotools_dir.join(format!("gen_{}", self.benchmark));
        let reference = self
            .reference_dir
            .join(format!("{}.root", self.reference_stem()?));

        let output = Command::new(&generator)
            .arg("-i")
            .arg(&reference)
            .arg("-o")
            .arg(&self.scratch_dir)
            .arg("-c")
            .arg(settings.compression_type.as_str())
            .arg("-p")
            .arg(settings.page_size.to_string())
            .arg("-x")
            .arg(settings.cluster_size.to_string())
            .output()
            .map_err(|e| self.error(format!("failed to run {}: {e}", generator.display())))?;

        if !output.status.success() {
            return Err(self.error(format!(
                "generator exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output_path)
    }

    /// Ask the kernel to drop the page cache so repeated runs read from
    /// disk. Best effort; needs root.
    fn drop_caches(&self) {
        let status = Command::new("sh")
            .arg("-c")
            .arg("sync; echo 3 > /proc/sys/vm/drop_caches")
            .status();
        match status {
            Ok(status) if status.success() => {}
            _ => warn!("could not drop the page cache; results may be warm"),
        }
    }

    /// One benchmark run; returns the merged stdout/stderr text.
    fn run_once(&self, data_file: &Path, cluster_bunch: u64) -> TunerResult<String> {
        let benchmark = self.iotools_dir.join(&self.benchmark);

        let mut command = Command::new("/usr/bin/time");
        command
            .arg(&benchmark)
            .arg("-i")
            .arg(data_file)
            .arg("-x")
            .arg(cluster_bunch.to_string())
            .arg("-p");
        if self.use_rdf {
            command.arg("-r");
        }

        let output = command
            .output()
            .map_err(|e| self.error(format!("failed to run {}: {e}", benchmark.display())))?;

        // The benchmark prints metrics on stdout, /usr/bin/time reports on
        // stderr; parsing wants both.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(self.error(format!(
                "benchmark exited with {}: {}",
                output.status,
                text.trim()
            )));
        }
        Ok(text)
    }
}

impl Evaluator for IotoolsEvaluator {
    fn evaluate(&mut self, settings: &Settings, samples: usize) -> TunerResult<RawMetrics> {
        info!(
            benchmark = %self.benchmark,
            compression = %settings.compression_type,
            cluster_size = settings.cluster_size,
            page_size = settings.page_size,
            cluster_bunch = settings.cluster_bunch,
            "evaluating parameter set"
        );

        let data_file = self.generate(settings)?;
        let file_size = fs::metadata(&data_file)?.len();

        let mut throughputs = Vec::with_capacity(samples);
        let mut memory_usages = Vec::with_capacity(samples);
        for run in 0..samples {
            if self.drop_page_cache {
                self.drop_caches();
            }

            let output = self.run_once(&data_file, settings.cluster_bunch)?;
            let throughput = throughput_mbps(&output)
                .ok_or_else(|| self.error("output is missing the RNTuple reader counters"))?;
            let memory = max_resident_kb(&output)
                .ok_or_else(|| self.error("output is missing the maxresident figure"))?;

            debug!(run, throughput, memory, "benchmark run finished");
            throughputs.push(throughput);
            memory_usages.push(memory);
        }

        if !self.keep_generated {
            if let Err(e) = fs::remove_file(&data_file) {
                warn!(path = %data_file.display(), "could not remove generated file: {e}");
            }
        }

        Ok(RawMetrics {
            file_size,
            throughputs,
            memory_usages,
        })
    }
}
