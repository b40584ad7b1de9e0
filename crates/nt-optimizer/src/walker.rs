//! The search driver.
//!
//! A [`Walker`] owns one [`Configuration`] and walks it through the search
//! space: each iteration proposes a mutation, scores it against the run's
//! baseline via the external [`Evaluator`], and asks the acceptance policy
//! whether to keep or revert the move. Every iteration emits exactly one
//! [`StepRecord`] through the [`Recorder`] seam.
//!
//! Lifecycle: constructed, baseline-calibrated exactly once, then iterated.
//! Everything is synchronous; a benchmark run must never overlap another.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nt_types::{Configuration, RunConfig, Settings, TunerError, TunerResult};

use crate::policy::{policy_for, AcceptancePolicy};
use crate::schedule::{change_count_weights, sample_change_count};
use crate::score::{mean, score, BaselineMetrics, RawMetrics};

/// Sentinel performance written for the baseline calibration record,
/// distinguishing it from regular steps.
pub const BASELINE_PERFORMANCE: f64 = -999.0;

/// External component that runs a real benchmark for a parameter set.
pub trait Evaluator {
    /// Evaluate one parameter set, returning the generated file size and
    /// `samples` throughput/memory readings.
    fn evaluate(&mut self, settings: &Settings, samples: usize) -> TunerResult<RawMetrics>;
}

/// Sink for the per-iteration run history.
pub trait Recorder {
    fn write_header(&mut self, parameter_names: &[String], samples: usize) -> TunerResult<()>;

    fn record(&mut self, record: &StepRecord) -> TunerResult<()>;
}

/// One row of run history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub timestamp: DateTime<Utc>,
    /// Raw parameter values of the evaluated candidate, in parameter order.
    pub values: Vec<String>,
    pub accepted: bool,
    pub performance: f64,
    pub size_decrease: f64,
    pub throughput_increase: f64,
    pub memory_decrease: f64,
    pub file_size: u64,
    pub mean_throughput: f64,
    pub mean_memory: f64,
    pub throughputs: Vec<f64>,
    pub memory_usages: Vec<f64>,
}

pub struct Walker {
    config: Configuration,
    policy: Box<dyn AcceptancePolicy>,
    weights: Option<Vec<f64>>,
    multi_step: bool,
    iterations: usize,
    evaluations: usize,
    baseline: Option<BaselineMetrics>,
    performance: f64,
}

impl Walker {
    pub fn new(run: &RunConfig, config: Configuration) -> TunerResult<Self> {
        if let Some(weights) = &run.weights {
            if weights.len() != 3 {
                return Err(TunerError::Config(format!(
                    "expected 3 metric weights (size, throughput, memory), got {}",
                    weights.len()
                )));
            }
            if weights.iter().sum::<f64>() <= 0.0 {
                return Err(TunerError::Config(
                    "metric weights must sum to a positive value".into(),
                ));
            }
        }

        Ok(Self {
            config,
            policy: policy_for(run.policy, run.temperature_const),
            weights: run.weights.clone(),
            multi_step: run.multi_step,
            iterations: run.iterations,
            evaluations: run.evaluations,
            baseline: None,
            performance: 0.0,
        })
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// The currently accepted performance. Meaningless before calibration.
    pub fn performance(&self) -> f64 {
        self.performance
    }

    pub fn baseline(&self) -> Option<&BaselineMetrics> {
        self.baseline.as_ref()
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Evaluate the run's default parameter set and store its aggregated
    /// metrics as the scoring baseline. Must run exactly once, before any
    /// iteration.
    pub fn calibrate_baseline<E, C>(
        &mut self,
        defaults: &Settings,
        evaluator: &mut E,
        recorder: &mut C,
    ) -> TunerResult<()>
    where
        E: Evaluator,
        C: Recorder,
    {
        if self.baseline.is_some() {
            return Err(TunerError::Config("baseline already calibrated".into()));
        }

        let raw = evaluator.evaluate(defaults, self.evaluations)?;
        let mean_throughput = mean(&raw.throughputs);
        let mean_memory = mean(&raw.memory_usages);

        self.baseline = Some(BaselineMetrics {
            file_size: raw.file_size,
            throughput: mean_throughput,
            memory: mean_memory,
        });
        self.performance = 0.0;

        info!(
            file_size = raw.file_size,
            throughput = mean_throughput,
            memory = mean_memory,
            "baseline calibrated"
        );

        recorder.record(&StepRecord {
            timestamp: Utc::now(),
            values: defaults.value_strings(),
            accepted: false,
            performance: BASELINE_PERFORMANCE,
            size_decrease: 0.0,
            throughput_increase: 0.0,
            memory_decrease: 0.0,
            file_size: raw.file_size,
            mean_throughput,
            mean_memory,
            throughputs: raw.throughputs,
            memory_usages: raw.memory_usages,
        })
    }

    /// Run one search iteration: mutate (except at iteration 0), evaluate,
    /// score, then commit or revert according to the acceptance policy.
    ///
    /// An evaluator failure aborts the iteration before any record is
    /// written and leaves the configuration in its mutated state.
    pub fn run_iteration<E, C, R>(
        &mut self,
        iteration: usize,
        evaluator: &mut E,
        recorder: &mut C,
        rng: &mut R,
    ) -> TunerResult<()>
    where
        E: Evaluator,
        C: Recorder,
        R: Rng,
    {
        let baseline = self.baseline.ok_or(TunerError::UninitializedBaseline)?;

        // Iteration 0 scores the starting configuration as-is.
        let stepped = iteration > 0;
        if stepped {
            if self.multi_step {
                let weights = change_count_weights(
                    iteration,
                    self.iterations,
                    self.config.mutatable_count(),
                );
                let count = sample_change_count(&weights, rng);
                self.config.step_many(count, rng)?;
            } else {
                self.config.step(rng)?;
            }
        }

        let settings = self.config.settings()?;
        let raw = evaluator.evaluate(&settings, self.evaluations)?;
        let mean_throughput = mean(&raw.throughputs);
        let mean_memory = mean(&raw.memory_usages);
        let result = score(
            raw.file_size,
            mean_throughput,
            mean_memory,
            &baseline,
            self.weights.as_deref(),
        );

        // Candidate values, captured before any revert.
        let values = self.config.value_strings();

        let accepted = self
            .policy
            .accept(result.performance, self.performance, iteration, rng);

        if accepted {
            self.performance = result.performance;
        } else if stepped {
            self.config.revert()?;
        }

        debug!(
            iteration,
            accepted,
            candidate = result.performance,
            current = self.performance,
            "iteration scored"
        );

        recorder.record(&StepRecord {
            timestamp: Utc::now(),
            values,
            accepted,
            performance: result.performance,
            size_decrease: result.size_decrease,
            throughput_increase: result.throughput_increase,
            memory_decrease: result.memory_decrease,
            file_size: raw.file_size,
            mean_throughput,
            mean_memory,
            throughputs: raw.throughputs,
            memory_usages: raw.memory_usages,
        })
    }

    /// Drive a full run: header, baseline calibration, then every
    /// iteration in order.
    pub fn evolve<E, C, R>(
        &mut self,
        defaults: &Settings,
        evaluator: &mut E,
        recorder: &mut C,
        rng: &mut R,
    ) -> TunerResult<()>
    where
        E: Evaluator,
        C: Recorder,
        R: Rng,
    {
        recorder.write_header(&self.config.names(), self.evaluations)?;

        info!(policy = self.policy.name(), "calibrating baseline");
        self.calibrate_baseline(defaults, evaluator, recorder)?;

        for iteration in 0..self.iterations {
            self.run_iteration(iteration, evaluator, recorder, rng)?;
            info!(
                iteration,
                performance = self.performance,
                "step complete"
            );
        }
        Ok(())
    }
}
