//! Run configuration for one optimization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domains::{Compression, Settings};

/// Unique optimization run identifier.
pub type RunId = Uuid;

/// Which acceptance policy drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyChoice {
    RandomWalk,
    HillClimb,
    Anneal,
}

/// Top-level configuration for an optimization run.
///
/// Externally supplied (typically deserialized from a JSON file); the core
/// treats it as immutable for the duration of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "Uuid::new_v4")]
    pub id: RunId,

    /// Which iotools benchmark to tune against (e.g. "lhcb").
    pub benchmark: String,

    /// Starting parameter values.
    #[serde(default)]
    pub start: Settings,

    /// Restricted compression domain; `None` allows all codecs.
    #[serde(default)]
    pub compression_types: Option<Vec<Compression>>,

    /// Number of search iterations.
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Benchmark runs per evaluated configuration.
    #[serde(default = "default_evaluations")]
    pub evaluations: usize,

    pub policy: PolicyChoice,

    /// Annealing temperature constant (ignored by the other policies).
    #[serde(default = "default_temperature_const")]
    pub temperature_const: f64,

    /// Per-metric weights (size, throughput, memory); `None` weighs equally.
    #[serde(default)]
    pub weights: Option<Vec<f64>>,

    /// Mutate several parameters per step instead of one.
    #[serde(default)]
    pub multi_step: bool,

    /// Run the benchmark through RDataFrame.
    #[serde(default)]
    pub use_rdf: bool,

    /// RNG seed; a random seed is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_iterations() -> usize {
    100
}

fn default_evaluations() -> usize {
    10
}

fn default_temperature_const() -> f64 {
    2.5
}

impl RunConfig {
    pub fn new(benchmark: impl Into<String>, policy: PolicyChoice) -> Self {
        Self {
            id: Uuid::new_v4(),
            benchmark: benchmark.into(),
            start: Settings::default(),
            compression_types: None,
            iterations: default_iterations(),
            evaluations: default_evaluations(),
            policy,
            temperature_const: default_temperature_const(),
            weights: None,
            multi_step: false,
            use_rdf: false,
            seed: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_start(mut self, start: Settings) -> Self {
        self.start = start;
        self
    }

    pub fn with_compression_types(mut self, types: Vec<Compression>) -> Self {
        self.compression_types = Some(types);
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_evaluations(mut self, n: usize) -> Self {
        self.evaluations = n;
        self
    }

    pub fn with_temperature_const(mut self, c: f64) -> Self {
        self.temperature_const = c;
        self
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_multi_step(mut self, enabled: bool) -> Self {
        self.multi_step = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
