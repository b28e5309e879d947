//! Blast-radius target selection.
//!
//! Selection is a pure function of a population, a count and a random
//! source. Callers pass `rand::thread_rng()` in production and a seeded
//! `StdRng` when they need reproducible selections.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Number of hosts a blast radius selects: `floor(population * percent / 100)`.
///
/// Percentages above 100 are treated as 100.
pub fn sample_count(population: usize, blast_radius: u32) -> usize {
    let percent = blast_radius.min(100) as usize;
    population * percent / 100
}

/// Pick `count` distinct hosts uniformly at random, without replacement.
///
/// Never returns more hosts than the population holds, and never a host
/// outside it. The order of the result is random.
pub fn sample_hosts<R>(population: &[String], count: usize, rng: &mut R) -> Vec<String>
where
    R: Rng + ?Sized,
{
    population
        .choose_multiple(rng, count.min(population.len()))
        .cloned()
        .collect()
}

/// The hosts chosen for one attack run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSelection {
    /// Size of the effective host population.
    pub population: usize,
    /// Requested percentage.
    pub blast_radius: u32,
    /// Selected hosts.
    pub hosts: Vec<String>,
}

impl TargetSelection {
    /// Returns true if no host was selected.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Number of selected hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// True when a non-zero blast radius over a non-empty population still
    /// selected nothing because of rounding down.
    pub fn rounded_to_zero(&self) -> bool {
        self.hosts.is_empty() && self.population > 0 && self.blast_radius > 0
    }
}

/// Select `blast_radius` percent of `population` (assumed duplicate-free).
pub fn select_targets<R>(population: &[String], blast_radius: u32, rng: &mut R) -> TargetSelection
where
    R: Rng + ?Sized,
{
    let count = sample_count(population.len(), blast_radius);
    TargetSelection {
        population: population.len(),
        blast_radius,
        hosts: sample_hosts(population, count, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn hosts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("host{:02}", i)).collect()
    }

    #[test]
    fn count_rounds_down() {
        assert_eq!(sample_count(7, 34), 2);
        assert_eq!(sample_count(9, 34), 3);
        assert_eq!(sample_count(3, 10), 0);
        assert_eq!(sample_count(10, 0), 0);
        assert_eq!(sample_count(10, 100), 10);
        assert_eq!(sample_count(0, 100), 0);
    }

    #[test]
    fn count_caps_at_full_population() {
        assert_eq!(sample_count(10, 250), 10);
    }

    #[test]
    fn sampling_bounds_hold_for_all_sizes() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 0..25 {
            let population = hosts(n);
            let universe: HashSet<&String> = population.iter().collect();
            for percent in [0, 1, 13, 34, 50, 99, 100] {
                let selection = select_targets(&population, percent, &mut rng);
                assert_eq!(selection.len(), n * percent as usize / 100);

                let unique: HashSet<&String> = selection.hosts.iter().collect();
                assert_eq!(unique.len(), selection.len(), "duplicates for n={} p={}", n, percent);
                assert!(unique.is_subset(&universe));
            }
        }
    }

    #[test]
    fn full_blast_radius_selects_everyone() {
        let population = hosts(6);
        let mut rng = StdRng::seed_from_u64(1);
        let mut selected = select_targets(&population, 100, &mut rng).hosts;
        selected.sort();
        assert_eq!(selected, population);
    }

    #[test]
    fn zero_blast_radius_selects_nobody() {
        let population = hosts(6);
        let mut rng = StdRng::seed_from_u64(1);
        let selection = select_targets(&population, 0, &mut rng);
        assert!(selection.is_empty());
        assert!(!selection.rounded_to_zero());
    }

    #[test]
    fn small_population_rounds_to_zero() {
        let population = hosts(3);
        let mut rng = StdRng::seed_from_u64(1);
        let selection = select_targets(&population, 25, &mut rng);
        assert!(selection.is_empty());
        assert!(selection.rounded_to_zero());
    }

    #[test]
    fn seeded_source_is_reproducible() {
        let population = hosts(20);
        let a = select_targets(&population, 40, &mut StdRng::seed_from_u64(99));
        let b = select_targets(&population, 40, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_count_is_capped() {
        let population = hosts(4);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(sample_hosts(&population, 10, &mut rng).len(), 4);
    }
}
