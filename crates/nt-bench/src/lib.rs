//! # nt-bench
//!
//! The tuner's external collaborators made concrete: generation and
//! execution of iotools benchmarks, parsing of their textual output into
//! raw metrics, and CSV run-history recording.

pub mod evaluator;
pub mod parse;
pub mod recorder;

pub use evaluator::IotoolsEvaluator;
pub use recorder::CsvRecorder;
