//! Acceptance policies.
//!
//! A policy decides whether a scored candidate becomes the new current
//! state. The three variants span the exploration spectrum: [`RandomWalk`]
//! accepts everything, [`HillClimb`] only strict improvements, and
//! [`Anneal`] accepts worsening moves with a probability that decays as
//! the temperature schedule cools.

use rand::{Rng, RngCore};

use nt_types::PolicyChoice;

/// Common trait for all acceptance policies.
pub trait AcceptancePolicy {
    /// Decide whether `candidate` replaces `current` at this iteration.
    fn accept(&self, candidate: f64, current: f64, iteration: usize, rng: &mut dyn RngCore)
        -> bool;

    /// Human-readable policy name, also used for the run history path.
    fn name(&self) -> &'static str;
}

/// Pure exploration: every candidate is accepted, so the current
/// performance tracks the most recently visited point rather than the best.
pub struct RandomWalk;

impl AcceptancePolicy for RandomWalk {
    fn accept(&self, _: f64, _: f64, _: usize, _: &mut dyn RngCore) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "random_walker"
    }
}

/// Strict greedy ascent: plateaus and regressions are rejected.
pub struct HillClimb;

impl AcceptancePolicy for HillClimb {
    fn accept(&self, candidate: f64, current: f64, _: usize, _: &mut dyn RngCore) -> bool {
        candidate > current
    }

    fn name(&self) -> &'static str {
        "hill_climber"
    }
}

/// Simulated annealing with a logarithmic cooling schedule.
pub struct Anneal {
    pub temperature_const: f64,
}

impl Anneal {
    pub fn new(temperature_const: f64) -> Self {
        Self { temperature_const }
    }

    /// `T(i) = c / ln(i + 2)`: strictly decreasing, positive for all
    /// `i >= 0`.
    pub fn temperature(&self, iteration: usize) -> f64 {
        self.temperature_const / (iteration as f64 + 2.0).ln()
    }

    /// Metropolis acceptance probability for a performance delta.
    pub fn acceptance_probability(&self, delta: f64, iteration: usize) -> f64 {
        (delta / self.temperature(iteration)).exp()
    }
}

impl AcceptancePolicy for Anneal {
    fn accept(
        &self,
        candidate: f64,
        current: f64,
        iteration: usize,
        rng: &mut dyn RngCore,
    ) -> bool {
        let delta = candidate - current;
        delta > 0.0 || self.acceptance_probability(delta, iteration) > rng.gen::<f64>()
    }

    fn name(&self) -> &'static str {
        "annealer"
    }
}

/// Construct the policy selected by a run configuration.
pub fn policy_for(choice: PolicyChoice, temperature_const: f64) -> Box<dyn AcceptancePolicy> {
    match choice {
        PolicyChoice::RandomWalk => Box::new(RandomWalk),
        PolicyChoice::HillClimb => Box::new(HillClimb),
        PolicyChoice::Anneal => Box::new(Anneal::new(temperature_const)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn random_walk_accepts_everything() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let policy = RandomWalk;
        assert!(policy.accept(-100.0, 50.0, 0, &mut rng));
        assert!(policy.accept(0.0, 0.0, 99, &mut rng));
    }

    #[test]
    fn hill_climb_requires_strict_improvement() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let policy = HillClimb;

        for iteration in [0, 10, 1000] {
            assert!(policy.accept(5.1, 5.0, iteration, &mut rng));
            assert!(!policy.accept(5.0, 5.0, iteration, &mut rng));
            assert!(!policy.accept(4.9, 5.0, iteration, &mut rng));
        }
    }

    #[test]
    fn anneal_always_accepts_improvements() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let policy = Anneal::new(2.5);

        for iteration in [0, 10, 100_000] {
            assert!(policy.accept(0.001, 0.0, iteration, &mut rng));
        }
    }

    #[test]
    fn temperature_decreases_and_stays_positive() {
        let policy = Anneal::new(2.5);
        let mut previous = f64::INFINITY;
        for iteration in [0, 1, 10, 100, 10_000] {
            let t = policy.temperature(iteration);
            assert!(t > 0.0);
            assert!(t < previous);
            previous = t;
        }
    }

    #[test]
    fn acceptance_probability_decays_with_iteration() {
        let policy = Anneal::new(2.5);
        let delta = -1.0;
        let p_early = policy.acceptance_probability(delta, 1);
        let p_mid = policy.acceptance_probability(delta, 10);
        let p_late = policy.acceptance_probability(delta, 1000);
        assert!(p_early > p_mid);
        assert!(p_mid > p_late);
    }

    #[test]
    fn anneal_rejects_large_regressions_late_in_the_run() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let policy = Anneal::new(2.5);
        // T(1e9) is tiny; exp(-50/T) underflows to 0 and can never win
        // the coin flip.
        for _ in 0..100 {
            assert!(!policy.accept(-50.0, 0.0, 1_000_000_000, &mut rng));
        }
    }

    #[test]
    fn policy_for_matches_choice() {
        assert_eq!(policy_for(PolicyChoice::RandomWalk, 2.5).name(), "random_walker");
        assert_eq!(policy_for(PolicyChoice::HillClimb, 2.5).name(), "hill_climber");
        assert_eq!(policy_for(PolicyChoice::Anneal, 2.5).name(), "annealer");
    }
}
