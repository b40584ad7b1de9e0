//! # nt-optimizer
//!
//! Stochastic local-search engine for RNTuple storage parameters.
//!
//! Provides the multi-objective scoring functions, the multi-parameter
//! change schedule, the acceptance policies (random walk, hill climbing,
//! simulated annealing), and the [`Walker`] that drives one optimization
//! run against an external [`Evaluator`].

mod policy;
mod schedule;
mod score;
mod walker;

pub use policy::{policy_for, AcceptancePolicy, Anneal, HillClimb, RandomWalk};
pub use schedule::{change_count_weights, sample_change_count};
pub use score::{
    aggregate, mean, memory_decrease, score, size_decrease, throughput_increase, BaselineMetrics,
    RawMetrics, StepScore,
};
pub use walker::{Evaluator, Recorder, StepRecord, Walker, BASELINE_PERFORMANCE};
