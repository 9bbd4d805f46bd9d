//! Unique forward/reverse pair assignment by seeded rejection sampling.
//!
//! For each destination cell, in order, the assigner draws a forward index
//! uniformly from `[0, F)` and a reverse index uniformly from `[0, R)`,
//! redrawing the reverse index while it equals the forward index. If the
//! resulting [`PairKey`] was already handed out, the *whole pair* is drawn
//! again. Accepted keys go into the run's [`CoveredSet`], which only grows.
//!
//! A forward index may appear in many pairs as long as its reverse partner
//! differs, and vice versa; uniqueness is a property of the pair.
//!
//! ## Cost
//! With `U = F·R − min(F, R)` usable pairs and `k` of them already covered,
//! a cell needs about `U / (U − k)` pair draws on average (see
//! [`expected_attempts`]). That is close to one for most of a plate and grows
//! as the pair space fills. There is no attempt cap: the only termination
//! guarantee is the capacity check performed before the first draw, which
//! rejects runs with more cells than usable pairs.
//!
//! ## Randomness
//! The random source is an explicit `rand::Rng` owned by the caller and lent
//! to one [`PairAssigner`]. Deterministic runs use
//! `StdRng::seed_from_u64(seed)`, seeded once before the first cell, so the
//! whole output is a function of the seed, the pools, the cells and the
//! volume. Independent runs never share a generator or a covered set.
//!
//! # Examples
//! ```
//! use primerplate::assign::assign;
//! use primerplate::pool::{partition, DEFAULT_OFFSET};
//! use primerplate::well::{well_grid, PlateFormat};
//! let pools = partition(&well_grid(PlateFormat::Wells384), DEFAULT_OFFSET).unwrap();
//! let cells = PlateFormat::Wells384.wells();
//! let records = assign(&pools, &cells, 500.0, 7, true).unwrap();
//! assert_eq!(records.len(), 768);
//! assert_eq!(records[0].destination, "A1");
//! assert_eq!(records[767].destination, "P24");
//! ```
use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PlateError, Result};
use crate::pool::PrimerPools;
use crate::transfer::TransferRecord;
use crate::well::CellId;

/// A `(forward_index, reverse_index)` pair, relative to the active pools.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PairKey {
    pub forward: usize,
    pub reverse: usize,
}

/// Pairs handed out so far in one run.
#[derive(Clone, Debug, Default)]
pub struct CoveredSet(HashSet<PairKey>);

impl CoveredSet {
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn contains(&self, key: &PairKey) -> bool { self.0.contains(key) }

    /// Insert `key`; returns `false` if it was already covered.
    fn insert(&mut self, key: PairKey) -> bool { self.0.insert(key) }
}

/// Number of distinct pairs the assigner can ever produce for pools of size
/// `forward` and `reverse`: all index pairs minus the equal-index ones.
pub fn usable_pairs(forward: usize, reverse: usize) -> usize {
    forward * reverse - forward.min(reverse)
}

/// Expected number of pair draws needed to find an unseen pair once
/// `covered` pairs are taken, assuming uniform draws over the usable space.
///
/// Returns `f64::INFINITY` when the space is exhausted.
pub fn expected_attempts(forward: usize, reverse: usize, covered: usize) -> f64 {
    let usable = usable_pairs(forward, reverse);
    if covered >= usable {
        return f64::INFINITY;
    }
    usable as f64 / (usable - covered) as f64
}

/// Draw statistics for one run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DrawStats {
    /// Forward draws, including those discarded.
    pub forward_draws: u64,
    /// Reverse draws, including same-index redraws.
    pub reverse_draws: u64,
    /// Complete pairs rejected because they were already covered.
    pub rejected_pairs: u64,
}

/// Stateful pair drawer for one run.
///
/// Owns the run's [`CoveredSet`] and borrows the random source.
pub struct PairAssigner<'r, R: Rng + ?Sized> {
    forward_size: usize,
    reverse_size: usize,
    rng: &'r mut R,
    covered: CoveredSet,
    stats: DrawStats,
}

impl<'r, R: Rng + ?Sized> PairAssigner<'r, R> {
    /// Create an assigner over pools of the given sizes.
    pub fn new(forward_size: usize, reverse_size: usize, rng: &'r mut R) -> Result<Self> {
        if forward_size == 0 || reverse_size == 0 {
            return Err(PlateError::config(format!(
                "both pools must be non-empty (forward {forward_size}, reverse {reverse_size})"
            )));
        }
        Ok(PairAssigner { forward_size, reverse_size, rng, covered: CoveredSet::default(), stats: DrawStats::default() })
    }

    pub fn capacity(&self) -> usize { usable_pairs(self.forward_size, self.reverse_size) }

    /// Pairs still available to [`next_pair`](Self::next_pair).
    pub fn remaining(&self) -> usize { self.capacity() - self.covered.len() }

    pub fn covered(&self) -> &CoveredSet { &self.covered }

    pub fn stats(&self) -> DrawStats { self.stats }

    /// Fail with [`PlateError::Capacity`] unless `cells` more pairs can be drawn.
    pub fn ensure_capacity(&self, cells: usize) -> Result<()> {
        if cells > self.remaining() {
            return Err(PlateError::Capacity { cells, capacity: self.remaining() });
        }
        Ok(())
    }

    /// Draw the next unseen pair and mark it covered.
    pub fn next_pair(&mut self) -> Result<PairKey> {
        self.ensure_capacity(1)?;
        loop {
            let forward = self.rng.gen_range(0..self.forward_size);
            self.stats.forward_draws += 1;
            // A single reverse primer cannot differ from forward index 0.
            if self.reverse_size == 1 && forward == 0 {
                continue;
            }
            let reverse = loop {
                let r = self.rng.gen_range(0..self.reverse_size);
                self.stats.reverse_draws += 1;
                if r != forward {
                    break r;
                }
            };
            let key = PairKey { forward, reverse };
            if self.covered.insert(key) {
                return Ok(key);
            }
            self.stats.rejected_pairs += 1;
        }
    }
}

/// Draw one unique pair per cell for pools of size `forward_size` and
/// `reverse_size`, consuming `rng`.
///
/// Capacity is checked before any draw, so a failing call leaves `rng`
/// untouched and produces nothing.
pub fn assign_pairs<R: Rng + ?Sized>(
    forward_size: usize,
    reverse_size: usize,
    cells: usize,
    rng: &mut R,
) -> Result<Vec<PairKey>> {
    let mut assigner = PairAssigner::new(forward_size, reverse_size, rng)?;
    assigner.ensure_capacity(cells)?;
    let mut pairs = Vec::with_capacity(cells);
    for _ in 0..cells {
        pairs.push(assigner.next_pair()?);
    }
    let stats = assigner.stats();
    log::debug!(
        "assigned {cells} pairs from {forward_size}x{reverse_size} pools: {} forward draws, {} reverse draws, {} rejected pairs",
        stats.forward_draws,
        stats.reverse_draws,
        stats.rejected_pairs
    );
    Ok(pairs)
}

/// Assign a unique primer pair to every cell using the supplied random source.
///
/// Emits two records per cell, forward first, both addressed to the cell and
/// carrying `volume`.
pub fn assign_with_rng<R: Rng + ?Sized>(
    pools: &PrimerPools,
    cells: &[CellId],
    volume: f64,
    rng: &mut R,
) -> Result<Vec<TransferRecord>> {
    if cells.is_empty() {
        return Err(PlateError::config("no destination cells to assign"));
    }
    let pairs = assign_pairs(pools.forward.len(), pools.reverse.len(), cells.len(), rng)?;

    let mut records = Vec::with_capacity(cells.len() * 2);
    for (cell, key) in cells.iter().zip(pairs) {
        let destination = cell.to_string();
        for source in [pools.forward.get(key.forward), pools.reverse.get(key.reverse)] {
            let source = source.ok_or_else(|| PlateError::config(format!("pair {key:?} is outside the active pools")))?;
            records.push(TransferRecord { source: source.to_string(), destination: destination.clone(), volume });
        }
    }
    Ok(records)
}

/// Assign a unique primer pair to every cell.
///
/// With `deterministic` set, a fresh `StdRng` seeded from `seed` drives the
/// whole run; otherwise the generator is seeded from OS entropy and `seed`
/// is ignored.
pub fn assign(
    pools: &PrimerPools,
    cells: &[CellId],
    volume: f64,
    seed: u64,
    deterministic: bool,
) -> Result<Vec<TransferRecord>> {
    let mut rng = if deterministic { StdRng::seed_from_u64(seed) } else { StdRng::from_entropy() };
    assign_with_rng(pools, cells, volume, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::IdentifierPool;
    use crate::well::{enumerate_wells, PlateFormat};
    use rand::RngCore;

    fn labelled_pools(forward: usize, reverse: usize) -> PrimerPools {
        PrimerPools {
            forward: IdentifierPool::new((0..forward).map(|i| format!("F{i:02}")).collect()),
            reverse: IdentifierPool::new((0..reverse).map(|i| format!("R{i:02}")).collect()),
        }
    }

    /// Random source that must never be consulted.
    struct Untouchable;

    impl RngCore for Untouchable {
        fn next_u32(&mut self) -> u32 { panic!("rng consulted") }
        fn next_u64(&mut self) -> u64 { panic!("rng consulted") }
        fn fill_bytes(&mut self, _dest: &mut [u8]) { panic!("rng consulted") }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> core::result::Result<(), rand::Error> {
            panic!("rng consulted")
        }
    }

    #[test]
    fn two_records_per_cell_in_cell_order() {
        let pools = labelled_pools(20, 20);
        let cells = PlateFormat::Wells96.wells();
        let records = assign(&pools, &cells, 250.0, 3, true).unwrap();
        assert_eq!(records.len(), 2 * cells.len());
        for (pair, cell) in records.chunks(2).zip(&cells) {
            assert_eq!(pair[0].destination, cell.to_string());
            assert_eq!(pair[1].destination, cell.to_string());
            assert!(pair[0].source.starts_with('F'));
            assert!(pair[1].source.starts_with('R'));
            assert_eq!(pair[0].volume, 250.0);
        }
        let every_other: Vec<&str> = records.iter().step_by(2).map(|r| r.destination.as_str()).collect();
        let expected: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        assert_eq!(every_other, expected);
    }

    #[test]
    fn pairs_are_globally_unique_and_never_equal_index() {
        let mut rng = StdRng::seed_from_u64(11);
        let pairs = assign_pairs(30, 25, 384, &mut rng).unwrap();
        let unique: HashSet<PairKey> = pairs.iter().copied().collect();
        assert_eq!(unique.len(), 384);
        assert!(pairs.iter().all(|k| k.forward != k.reverse && k.forward < 30 && k.reverse < 25));
    }

    #[test]
    fn forward_indices_repeat_across_pairs() {
        // 5 forward primers over 40 cells forces reuse of forward indices.
        let mut rng = StdRng::seed_from_u64(5);
        let pairs = assign_pairs(5, 12, 40, &mut rng).unwrap();
        let forwards: HashSet<usize> = pairs.iter().map(|k| k.forward).collect();
        assert!(forwards.len() <= 5);
        assert_eq!(pairs.iter().copied().collect::<HashSet<_>>().len(), 40);
    }

    #[test]
    fn same_seed_same_output() {
        let pools = labelled_pools(84, 84);
        let cells = PlateFormat::Wells384.wells();
        let a = assign(&pools, &cells, 500.0, 42, true).unwrap();
        let b = assign(&pools, &cells, 500.0, 42, true).unwrap();
        assert_eq!(a, b);
        let c = assign(&pools, &cells, 500.0, 43, true).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn unseeded_runs_still_produce_unique_pairs() {
        let pools = labelled_pools(10, 10);
        let cells = enumerate_wells(8, 10).unwrap();
        let records = assign(&pools, &cells, 1.0, 0, false).unwrap();
        let pairs: HashSet<(&str, &str)> =
            records.chunks(2).map(|p| (p[0].source.as_str(), p[1].source.as_str())).collect();
        assert_eq!(pairs.len(), 80);
    }

    #[test]
    fn capacity_error_before_any_draw() {
        let pools = labelled_pools(2, 2);
        let cells = enumerate_wells(1, 5).unwrap();
        let err = assign_with_rng(&pools, &cells, 1.0, &mut Untouchable).unwrap_err();
        assert!(matches!(err, PlateError::Capacity { cells: 5, capacity: 2 }));
    }

    #[test]
    fn fourteen_primer_pools_cannot_fill_a_384_plate() {
        let pools = labelled_pools(14, 14);
        let cells = PlateFormat::Wells384.wells();
        let err = assign(&pools, &cells, 1.0, 7, true).unwrap_err();
        assert!(matches!(err, PlateError::Capacity { cells: 384, capacity: 182 }));
    }

    #[test]
    fn fills_the_entire_usable_space() {
        let mut rng = StdRng::seed_from_u64(1);
        let pairs = assign_pairs(3, 3, 6, &mut rng).unwrap();
        let mut sorted = pairs.clone();
        sorted.sort();
        let expected: Vec<PairKey> = [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)]
            .into_iter()
            .map(|(forward, reverse)| PairKey { forward, reverse })
            .collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn single_reverse_primer_only_pairs_with_other_forwards() {
        let mut rng = StdRng::seed_from_u64(9);
        let pairs = assign_pairs(2, 1, 1, &mut rng).unwrap();
        assert_eq!(pairs, vec![PairKey { forward: 1, reverse: 0 }]);
        assert!(matches!(assign_pairs(1, 1, 1, &mut rng), Err(PlateError::Capacity { .. })));
    }

    #[test]
    fn empty_inputs_are_configuration_errors() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(assign_pairs(0, 4, 1, &mut rng), Err(PlateError::Configuration(_))));
        let pools = labelled_pools(4, 4);
        assert!(matches!(assign(&pools, &[], 1.0, 0, true), Err(PlateError::Configuration(_))));
    }

    #[test]
    fn next_pair_refuses_once_exhausted() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut a = PairAssigner::new(2, 2, &mut rng).unwrap();
        assert_eq!(a.capacity(), 2);
        a.next_pair().unwrap();
        a.next_pair().unwrap();
        assert_eq!(a.covered().len(), 2);
        assert!(matches!(a.next_pair(), Err(PlateError::Capacity { .. })));
    }

    #[test]
    fn expected_attempts_grow_as_space_fills() {
        assert_eq!(expected_attempts(3, 3, 0), 1.0);
        assert_eq!(expected_attempts(3, 3, 3), 2.0);
        assert_eq!(expected_attempts(3, 3, 5), 6.0);
        assert!(expected_attempts(3, 3, 6).is_infinite());
        assert_eq!(usable_pairs(84, 84), 6972);
        assert_eq!(usable_pairs(14, 14), 182);
        assert_eq!(usable_pairs(5, 2), 8);
    }
}
