//! Change-count schedule for multi-parameter stepping.
//!
//! Early iterations favour wide moves that touch several parameters at
//! once; by the end of the run every step mutates a single parameter, so
//! the search narrows into plain local climbing. The distribution over
//! "how many parameters to change" is a pure function of the iteration,
//! the run length, and the number of mutatable parameters.

use rand::Rng;

/// Probability weights over change counts `k = 1..=n` for one iteration.
///
/// Linear interpolation between an initial distribution with weights
/// proportional to `n - k + 1` and a terminal point-mass on `k = 1`.
/// Iterations at or past the end of the run use the terminal distribution.
pub fn change_count_weights(
    iteration: usize,
    total_iterations: usize,
    mutatable_count: usize,
) -> Vec<f64> {
    let n = mutatable_count.max(1);
    let weight_sum = (n * (n + 1) / 2) as f64;
    let t = if total_iterations <= 1 {
        1.0
    } else {
        (iteration as f64 / (total_iterations as f64 - 1.0)).min(1.0)
    };

    (0..n)
        .map(|k| {
            let initial = (n - k) as f64 / weight_sum;
            let terminal = if k == 0 { 1.0 } else { 0.0 };
            (1.0 - t) * initial + t * terminal
        })
        .collect()
}

/// Draw a change count from the weight vector; returns `k` in `1..=n`.
pub fn sample_change_count<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let u = rng.gen::<f64>();
    let mut cumulative = 0.0;
    for (k, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if u < cumulative {
            return k + 1;
        }
    }
    // Floating-point round-off can leave the cumulative sum a hair below 1.
    weights.len().max(1)
}
