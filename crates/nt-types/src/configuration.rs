//! One point in the search space.
//!
//! A [`Configuration`] owns the four storage parameters in a fixed order and
//! exposes the mutation protocol the search loop drives: a single-parameter
//! [`Configuration::step`], a multi-parameter [`Configuration::step_many`],
//! and a [`Configuration::revert`] that undoes exactly the parameters
//! touched by the most recent step. It is created once per optimization run
//! and mutated in place for its lifetime.

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domains::{
    cluster_bunch_parameter, cluster_size_parameter, compression_parameter, page_size_parameter,
    Compression, Settings,
};
use crate::errors::{TunerError, TunerResult};
use crate::parameter::{Parameter, ParameterValue};

// Fixed parameter order; the run history relies on it staying stable.
const COMPRESSION: usize = 0;
const CLUSTER_SIZE: usize = 1;
const PAGE_SIZE: usize = 2;
const CLUSTER_BUNCH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    parameters: Vec<Parameter>,
    /// Indices mutated by the most recent step, in mutation order.
    mutated: Vec<usize>,
}

impl Configuration {
    /// Build a configuration starting from the given settings.
    ///
    /// `compression_types` restricts the codec domain; `None` allows all
    /// five codecs. A one-element restriction pins the compression type for
    /// the whole run.
    pub fn from_settings(
        settings: &Settings,
        compression_types: Option<&[Compression]>,
    ) -> TunerResult<Self> {
        let allowed = compression_types.unwrap_or(&Compression::ALL);
        let parameters = vec![
            compression_parameter(settings.compression_type, allowed)?,
            cluster_size_parameter(settings.cluster_size)?,
            page_size_parameter(settings.page_size)?,
            cluster_bunch_parameter(settings.cluster_bunch)?,
        ];
        Ok(Self {
            parameters,
            mutated: Vec::new(),
        })
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name().into()).collect()
    }

    pub fn values(&self) -> Vec<ParameterValue> {
        self.parameters.iter().map(|p| p.value()).collect()
    }

    /// Raw value strings in parameter order, as written to run history.
    pub fn value_strings(&self) -> Vec<String> {
        self.parameters
            .iter()
            .map(|p| p.value().to_string())
            .collect()
    }

    fn mutatable_indices(&self) -> Vec<usize> {
        self.parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| p.can_mutate())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn mutatable_count(&self) -> usize {
        self.mutatable_indices().len()
    }

    /// Step one uniformly chosen mutatable parameter.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TunerResult<()> {
        let candidates = self.mutatable_indices();
        if candidates.is_empty() {
            return Err(TunerError::Config(
                "configuration has no mutatable parameters".into(),
            ));
        }

        let idx = candidates[rng.gen_range(0..candidates.len())];
        self.parameters[idx].step(rng);
        self.mutated = vec![idx];
        Ok(())
    }

    /// Step `count` distinct mutatable parameters, drawn uniformly without
    /// replacement over all of them.
    pub fn step_many<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> TunerResult<()> {
        let candidates = self.mutatable_indices();
        if count == 0 || count > candidates.len() {
            return Err(TunerError::Config(format!(
                "cannot step {count} of {} mutatable parameters",
                candidates.len()
            )));
        }

        let picks = sample(rng, candidates.len(), count);
        self.mutated = picks.into_iter().map(|i| candidates[i]).collect();
        for &idx in &self.mutated {
            self.parameters[idx].step(rng);
        }
        Ok(())
    }

    /// Undo exactly the parameters touched by the preceding step call.
    pub fn revert(&mut self) -> TunerResult<()> {
        if self.mutated.is_empty() {
            return Err(TunerError::NoPriorState {
                parameter: "configuration".into(),
            });
        }

        let mutated = std::mem::take(&mut self.mutated);
        for idx in mutated {
            self.parameters[idx].revert()?;
        }
        Ok(())
    }

    /// Jump every parameter to a random point in its domain.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for param in &mut self.parameters {
            param.randomize(rng);
        }
        self.mutated.clear();
    }

    /// The current parameter values as a settings bundle for evaluation.
    pub fn settings(&self) -> TunerResult<Settings> {
        let compression = self.parameters[COMPRESSION].value();
        let compression = compression
            .as_str()
            .map(Compression::from_str)
            .transpose()?
            .ok_or_else(|| TunerError::Config("compression value is not textual".into()))?;

        let int_at = |idx: usize| {
            self.parameters[idx].value().as_u64().ok_or_else(|| {
                TunerError::Config(format!(
                    "parameter {} holds a non-integer value",
                    self.parameters[idx].name()
                ))
            })
        };

        Ok(Settings {
            compression_type: compression,
            cluster_size: int_at(CLUSTER_SIZE)?,
            page_size: int_at(PAGE_SIZE)?,
            cluster_bunch: int_at(CLUSTER_BUNCH)?,
        })
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current configuration:")?;
        for param in &self.parameters {
            writeln!(f, "  {param}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::{KIB, MIB};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn default_config() -> Configuration {
        Configuration::from_settings(&Settings::default(), None).unwrap()
    }

    #[test]
    fn parameter_order_is_fixed() {
        let config = default_config();
        assert_eq!(
            config.names(),
            vec![
                "compression_type",
                "cluster_size",
                "page_size",
                "cluster_bunch"
            ]
        );
    }

    #[test]
    fn settings_round_trip() {
        let config = default_config();
        assert_eq!(config.settings().unwrap(), Settings::default());
    }

    #[test]
    fn step_mutates_exactly_one_parameter() {
        let mut rng = ChaCha8Rng::seed_from_u64(19);
        let mut config = default_config();
        let before = config.value_strings();

        config.step(&mut rng).unwrap();
        let after = config.value_strings();
        let changed = before.iter().zip(&after).filter(|(a, b)| a != b).count();
        assert_eq!(changed, 1);

        config.revert().unwrap();
        assert_eq!(config.value_strings(), before);
    }

    #[test]
    fn step_many_mutates_distinct_parameters() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let mut config = default_config();
        let before = config.value_strings();

        config.step_many(4, &mut rng).unwrap();
        let after = config.value_strings();
        let changed = before.iter().zip(&after).filter(|(a, b)| a != b).count();
        assert_eq!(changed, 4);

        config.revert().unwrap();
        assert_eq!(config.value_strings(), before);
    }

    #[test]
    fn step_many_rejects_bad_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut config = default_config();
        assert!(config.step_many(0, &mut rng).is_err());
        assert!(config.step_many(5, &mut rng).is_err());
    }

    #[test]
    fn revert_without_step_errors() {
        let mut config = default_config();
        let err = config.revert().unwrap_err();
        assert!(matches!(err, TunerError::NoPriorState { .. }));
    }

    #[test]
    fn revert_clears_mutation_record() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut config = default_config();

        config.step(&mut rng).unwrap();
        config.revert().unwrap();
        assert!(config.revert().is_err());
    }

    #[test]
    fn pinned_compression_is_never_stepped() {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let mut config =
            Configuration::from_settings(&Settings::default(), Some(&[Compression::Lz4])).unwrap();
        assert_eq!(config.mutatable_count(), 3);

        for _ in 0..100 {
            config.step(&mut rng).unwrap();
            assert_eq!(
                config.settings().unwrap().compression_type,
                Compression::Lz4
            );
        }
    }

    #[test]
    fn step_many_reaches_every_mutatable_parameter() {
        // Full-width multi-step must include the last mutatable parameter.
        let mut rng = ChaCha8Rng::seed_from_u64(37);
        let mut config =
            Configuration::from_settings(&Settings::default(), Some(&[Compression::Lz4])).unwrap();
        let before = config.value_strings();

        config.step_many(3, &mut rng).unwrap();
        let after = config.value_strings();
        assert_ne!(before[3], after[3], "cluster_bunch was excluded");
    }

    #[test]
    fn randomize_keeps_values_in_domain() {
        let mut rng = ChaCha8Rng::seed_from_u64(41);
        let mut config = default_config();

        for _ in 0..20 {
            config.randomize(&mut rng);
            let settings = config.settings().unwrap();
            assert!(settings.cluster_bunch >= 1 && settings.cluster_bunch <= 5);
            assert!(settings.page_size >= 16 * KIB && settings.page_size <= 16 * MIB);
        }
    }
}
