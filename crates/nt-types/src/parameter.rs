//! Tunable parameter model.
//!
//! A [`Parameter`] is a single knob in the search space with a mutation rule
//! and one level of undo. The three variants share the same capability
//! surface (`step`, `revert`, `value`, `can_mutate`) but differ in how a
//! step moves through the domain: [`Parameter::Discrete`] takes a local ±1
//! move along an ordered domain, [`Parameter::Categorical`] jumps uniformly
//! to any other entry, and [`Parameter::Continuous`] applies a bounded
//! perturbation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{TunerError, TunerResult};

/// A concrete value held by a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(u64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

/// A parameter whose domain is an explicit list of values.
///
/// Used for both the categorical and discrete variants; only the stepping
/// rule differs between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListParameter {
    pub name: String,
    pub allowed_values: Vec<ParameterValue>,
    /// Display labels, e.g. "64 KB" for a raw byte count.
    pub value_names: Vec<String>,
    pub current_idx: usize,
    pub previous_idx: Option<usize>,
}

impl ListParameter {
    pub fn new(
        name: impl Into<String>,
        allowed_values: Vec<ParameterValue>,
        value_names: Option<Vec<String>>,
        current: &ParameterValue,
    ) -> TunerResult<Self> {
        let name = name.into();
        let current_idx = allowed_values
            .iter()
            .position(|v| v == current)
            .ok_or_else(|| TunerError::InvalidParameterValue {
                parameter: name.clone(),
                value: current.to_string(),
                allowed: allowed_values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;

        let value_names = value_names
            .unwrap_or_else(|| allowed_values.iter().map(|v| v.to_string()).collect());

        Ok(Self {
            name,
            allowed_values,
            value_names,
            current_idx,
            previous_idx: None,
        })
    }

    pub fn value(&self) -> &ParameterValue {
        &self.allowed_values[self.current_idx]
    }

    pub fn label(&self) -> &str {
        &self.value_names[self.current_idx]
    }

    fn revert(&mut self) -> TunerResult<()> {
        let previous = self
            .previous_idx
            .take()
            .ok_or_else(|| TunerError::NoPriorState {
                parameter: self.name.clone(),
            })?;
        self.current_idx = previous;
        Ok(())
    }

    /// Local move along the ordered domain: reflect at both boundaries,
    /// otherwise pick one of the two neighbours uniformly.
    fn step_discrete<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.previous_idx = Some(self.current_idx);
        if self.allowed_values.len() < 2 {
            return;
        }

        let last = self.allowed_values.len() - 1;
        self.current_idx = match self.current_idx {
            0 => 1,
            idx if idx == last => last - 1,
            idx if rng.gen_bool(0.5) => idx + 1,
            idx => idx - 1,
        };
    }

    /// Jump to any index other than the current one, uniformly.
    fn step_categorical<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.previous_idx = Some(self.current_idx);
        if self.allowed_values.len() < 2 {
            return;
        }

        let drawn = rng.gen_range(0..self.allowed_values.len() - 1);
        self.current_idx = if drawn >= self.current_idx {
            drawn + 1
        } else {
            drawn
        };
    }

    fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.current_idx = rng.gen_range(0..self.allowed_values.len());
        self.previous_idx = None;
    }
}

/// A bounded real-valued parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousParameter {
    pub name: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub current_value: f64,
    pub previous_value: Option<f64>,
}

impl ContinuousParameter {
    pub fn new(
        name: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
        current: f64,
    ) -> TunerResult<Self> {
        let name = name.into();
        if !(lower_bound..=upper_bound).contains(&current) {
            return Err(TunerError::InvalidParameterValue {
                parameter: name,
                value: current.to_string(),
                allowed: format!("[{lower_bound}, {upper_bound}]"),
            });
        }
        Ok(Self {
            name,
            lower_bound,
            upper_bound,
            current_value: current,
            previous_value: None,
        })
    }

    /// Maximum perturbation per step: 10% of the allowed range.
    fn max_step_size(&self) -> f64 {
        (self.upper_bound - self.lower_bound) / 10.0
    }

    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.previous_value = Some(self.current_value);

        let step = self.max_step_size();
        let delta = rng.gen_range(-step..=step);
        self.current_value = (self.current_value + delta).clamp(self.lower_bound, self.upper_bound);
    }

    fn revert(&mut self) -> TunerResult<()> {
        let previous = self
            .previous_value
            .take()
            .ok_or_else(|| TunerError::NoPriorState {
                parameter: self.name.clone(),
            })?;
        self.current_value = previous;
        Ok(())
    }

    fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.current_value = rng.gen_range(self.lower_bound..=self.upper_bound);
        self.previous_value = None;
    }
}

/// A single tunable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    Categorical(ListParameter),
    Discrete(ListParameter),
    Continuous(ContinuousParameter),
}

impl Parameter {
    pub fn categorical(
        name: impl Into<String>,
        allowed_values: Vec<ParameterValue>,
        value_names: Option<Vec<String>>,
        current: &ParameterValue,
    ) -> TunerResult<Self> {
        Ok(Self::Categorical(ListParameter::new(
            name,
            allowed_values,
            value_names,
            current,
        )?))
    }

    pub fn discrete(
        name: impl Into<String>,
        allowed_values: Vec<ParameterValue>,
        value_names: Option<Vec<String>>,
        current: &ParameterValue,
    ) -> TunerResult<Self> {
        Ok(Self::Discrete(ListParameter::new(
            name,
            allowed_values,
            value_names,
            current,
        )?))
    }

    pub fn continuous(
        name: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
        current: f64,
    ) -> TunerResult<Self> {
        Ok(Self::Continuous(ContinuousParameter::new(
            name,
            lower_bound,
            upper_bound,
            current,
        )?))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Categorical(p) | Self::Discrete(p) => &p.name,
            Self::Continuous(p) => &p.name,
        }
    }

    pub fn value(&self) -> ParameterValue {
        match self {
            Self::Categorical(p) | Self::Discrete(p) => p.value().clone(),
            Self::Continuous(p) => ParameterValue::Float(p.current_value),
        }
    }

    /// Display label for the current value.
    pub fn label(&self) -> String {
        match self {
            Self::Categorical(p) | Self::Discrete(p) => p.label().to_string(),
            Self::Continuous(p) => p.current_value.to_string(),
        }
    }

    /// Whether a step can actually change the value.
    pub fn can_mutate(&self) -> bool {
        match self {
            Self::Categorical(p) | Self::Discrete(p) => p.allowed_values.len() > 1,
            Self::Continuous(_) => true,
        }
    }

    /// Mutate the parameter, recording the prior state for one revert.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self {
            Self::Categorical(p) => p.step_categorical(rng),
            Self::Discrete(p) => p.step_discrete(rng),
            Self::Continuous(p) => p.step(rng),
        }
    }

    /// Restore the state recorded by the most recent step.
    pub fn revert(&mut self) -> TunerResult<()> {
        match self {
            Self::Categorical(p) | Self::Discrete(p) => p.revert(),
            Self::Continuous(p) => p.revert(),
        }
    }

    /// Jump to a uniformly random value within the domain.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self {
            Self::Categorical(p) | Self::Discrete(p) => p.randomize(rng),
            Self::Continuous(p) => p.randomize(rng),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.name(), self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn int_values(values: &[u64]) -> Vec<ParameterValue> {
        values.iter().map(|v| ParameterValue::Int(*v)).collect()
    }

    fn sample_discrete(current: u64) -> Parameter {
        Parameter::discrete(
            "cluster_size",
            int_values(&[16, 32, 64, 128, 256]),
            None,
            &ParameterValue::Int(current),
        )
        .unwrap()
    }

    #[test]
    fn discrete_lower_boundary_steps_up() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut param = sample_discrete(16);

        param.step(&mut rng);
        assert_eq!(param.value(), ParameterValue::Int(32));

        param.revert().unwrap();
        assert_eq!(param.value(), ParameterValue::Int(16));
    }

    #[test]
    fn discrete_upper_boundary_steps_down() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut param = sample_discrete(256);

        param.step(&mut rng);
        assert_eq!(param.value(), ParameterValue::Int(128));

        param.revert().unwrap();
        assert_eq!(param.value(), ParameterValue::Int(256));
    }

    #[test]
    fn discrete_interior_moves_to_neighbour() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..50 {
            let mut param = sample_discrete(64);
            param.step(&mut rng);
            let stepped = param.value().as_u64().unwrap();
            assert!(stepped == 32 || stepped == 128, "not a neighbour: {stepped}");

            param.revert().unwrap();
            assert_eq!(param.value(), ParameterValue::Int(64));
        }
    }

    #[test]
    fn categorical_never_repeats_current() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut param = Parameter::categorical(
            "compression_type",
            vec![
                ParameterValue::Text("none".into()),
                ParameterValue::Text("zlib".into()),
                ParameterValue::Text("lz4".into()),
                ParameterValue::Text("lzma".into()),
                ParameterValue::Text("zstd".into()),
            ],
            None,
            &ParameterValue::Text("lz4".into()),
        )
        .unwrap();

        for _ in 0..100 {
            let before = param.value();
            param.step(&mut rng);
            assert_ne!(param.value(), before);

            param.revert().unwrap();
            assert_eq!(param.value(), before);
        }
    }

    #[test]
    fn continuous_stays_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut param = Parameter::continuous("fill_ratio", 0.0, 1.0, 0.95).unwrap();

        for _ in 0..200 {
            param.step(&mut rng);
            let value = param.value().as_f64().unwrap();
            assert!((0.0..=1.0).contains(&value), "out of bounds: {value}");
        }
    }

    #[test]
    fn continuous_revert_restores_exact_value() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut param = Parameter::continuous("fill_ratio", 0.0, 1.0, 0.5).unwrap();

        param.step(&mut rng);
        param.revert().unwrap();
        assert_eq!(param.value().as_f64().unwrap(), 0.5);
    }

    #[test]
    fn revert_without_step_errors() {
        let mut param = sample_discrete(64);
        let err = param.revert().unwrap_err();
        assert!(matches!(err, TunerError::NoPriorState { .. }));
    }

    #[test]
    fn revert_clears_pending_state() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut param = sample_discrete(64);

        param.step(&mut rng);
        param.revert().unwrap();
        assert!(param.revert().is_err());
    }

    #[test]
    fn construction_rejects_value_outside_domain() {
        let err = Parameter::discrete(
            "cluster_bunch",
            int_values(&[1, 2, 3]),
            None,
            &ParameterValue::Int(7),
        )
        .unwrap_err();
        assert!(matches!(err, TunerError::InvalidParameterValue { .. }));

        let err = Parameter::continuous("x", 0.0, 1.0, 2.0).unwrap_err();
        assert!(matches!(err, TunerError::InvalidParameterValue { .. }));
    }

    #[test]
    fn single_value_domain_cannot_mutate() {
        let param = Parameter::categorical(
            "compression_type",
            vec![ParameterValue::Text("lz4".into())],
            None,
            &ParameterValue::Text("lz4".into()),
        )
        .unwrap();
        assert!(!param.can_mutate());
    }

    #[test]
    fn randomize_stays_in_domain() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut param = sample_discrete(64);

        for _ in 0..20 {
            param.randomize(&mut rng);
            let value = param.value().as_u64().unwrap();
            assert!([16, 32, 64, 128, 256].contains(&value));
        }
    }
}
