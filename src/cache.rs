use std::collections::BTreeMap;

use crate::cpu::{Cost, CpuProfile, INF_COST};
use crate::error::Error;
use crate::instruction::{
    check_sequence_cost, check_sequence_value, sequence_cost, Instruction, Op, Operand,
};

/// Bounds and best-known sequence for one multiplier.
///
/// Invariants: `lower <= cost(instrs) <= upper` when `instrs` is
/// non-empty; a finished entry has `lower == upper == cost(instrs)`
/// and `value(instrs)` equal to its key. `lower` never decreases and
/// `upper` never increases except through `clear`.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub lower: Cost,
    pub upper: Cost,
    pub finished: bool,
    pub instrs: Vec<Instruction>,
}

impl CacheEntry {
    /// The no-information entry materialised on a cache miss.
    fn open() -> Self {
        CacheEntry {
            lower: 0.0,
            upper: INF_COST,
            finished: false,
            instrs: Vec::new(),
        }
    }
}

/// A multiplication-sequence cache.
///
/// Keys are the signed multipliers searched so far, including every
/// sub-multiplier the search recursed into. An unfinished entry
/// records partial information: bounds from cutoffs and the best
/// sequence seen so far. On later searches the lower bound allows a
/// cutoff without repeating the work.
#[derive(Clone, Debug)]
pub struct MultCache {
    pub profile: CpuProfile,
    entries: BTreeMap<i64, CacheEntry>,
    pub hits_exact: u64,
    pub hits_partial: u64,
    pub misses: u64,
}

impl MultCache {
    pub fn new(profile: CpuProfile) -> Self {
        let mut cache = MultCache {
            profile,
            entries: BTreeMap::new(),
            hits_exact: 0,
            hits_partial: 0,
            misses: 0,
        };
        cache.clear();
        cache
    }

    /// Reset to the preloaded state and zero the statistics. The
    /// preload holds 0 and 1, plus -1 when the profile has a negate
    /// instruction.
    pub fn clear(&mut self) {
        self.entries.clear();

        let zero_cost = self.profile.costs.zero;
        self.entries.insert(
            0,
            CacheEntry {
                lower: zero_cost,
                upper: zero_cost,
                finished: true,
                instrs: vec![Instruction::new(Op::Zero, zero_cost)],
            },
        );
        let nop_cost = self.profile.costs.nop;
        self.entries.insert(
            1,
            CacheEntry {
                lower: nop_cost,
                upper: nop_cost,
                finished: true,
                instrs: vec![Instruction::new(Op::Nop, nop_cost)],
            },
        );
        if self.profile.costs.negate.is_finite() {
            let negate_cost = self.profile.costs.negate;
            self.entries.insert(
                -1,
                CacheEntry {
                    lower: negate_cost,
                    upper: negate_cost,
                    finished: true,
                    instrs: vec![Instruction::new(Op::Negate, negate_cost)],
                },
            );
        }

        self.hits_exact = 0;
        self.hits_partial = 0;
        self.misses = 0;
    }

    /// Fetch the entry for `n`, recording hit/miss statistics. A miss
    /// materialises (and stores) a no-information entry. The returned
    /// entry is a copy; callers may mutate it freely.
    pub fn lookup(&mut self, n: i64) -> CacheEntry {
        match self.entries.get(&n) {
            Some(entry) => {
                if entry.finished {
                    self.hits_exact += 1;
                } else {
                    self.hits_partial += 1;
                }
                entry.clone()
            }
            None => {
                self.misses += 1;
                let entry = CacheEntry::open();
                self.entries.insert(n, entry.clone());
                entry
            }
        }
    }

    /// Unconditional set.
    pub fn insert(&mut self, n: i64, lower: Cost, upper: Cost, finished: bool, instrs: &[Instruction]) {
        self.entries.insert(
            n,
            CacheEntry {
                lower,
                upper,
                finished,
                instrs: instrs.to_vec(),
            },
        );
    }

    /// Set iff `n` is unknown, the cached upper bound is worse, or it
    /// is equal but the cached entry is unfinished (so a finished
    /// result at the same cost upgrades it).
    pub fn insert_or_update(
        &mut self,
        n: i64,
        lower: Cost,
        upper: Cost,
        finished: bool,
        instrs: &[Instruction],
    ) {
        let do_insert = match self.entries.get(&n) {
            Some(entry) => entry.upper > upper || (entry.upper == upper && !entry.finished),
            None => true,
        };
        if do_insert {
            self.insert(n, lower, upper, finished, instrs);
        }
    }

    /// Per-field monotone update: `lower` only rises, `upper` only
    /// falls. A strict upper improvement requires `instrs` and, when
    /// `finished` is unspecified, marks the entry finished. Whenever
    /// an entry becomes finished its lower bound is pulled up to the
    /// upper bound so that finished entries are exact.
    pub fn update_field(
        &mut self,
        n: i64,
        lower: Option<Cost>,
        upper: Option<Cost>,
        finished: Option<bool>,
        instrs: Option<&[Instruction]>,
    ) {
        let entry = self.entries.entry(n).or_insert_with(CacheEntry::open);
        let mut worse = true;

        if let Some(lo) = lower {
            if lo > entry.lower {
                entry.lower = lo;
            }
        }
        if let Some(up) = upper {
            if up < entry.upper {
                debug_assert!(
                    instrs.is_some(),
                    "an upper-bound improvement must carry its sequence"
                );
                entry.upper = up;
                if up < entry.lower {
                    entry.lower = up;
                }
                worse = false;
            }
        }
        if let Some(fin) = finished {
            if !entry.finished {
                entry.finished = fin;
            }
        }
        if let Some(seq) = instrs {
            if !worse {
                entry.instrs = seq.to_vec();
            }
        }
        if finished.is_none() && !worse {
            entry.finished = true;
        }
        if entry.finished {
            entry.lower = entry.upper;
        }
    }

    /// Make sure the partial products along `instrs` are in the
    /// cache, each as a non-finished upper bound.
    pub fn update_sequence_partials(&mut self, instrs: &[Instruction]) {
        let (mut n, mut m) = (1i64, 1i64);
        let mut cost: Cost = 0.0;
        for (i, instr) in instrs.iter().enumerate() {
            match instr.op {
                Op::Shift(amount) => {
                    m = n;
                    n <<= amount;
                }
                Op::Add(Operand::R1) => n += 1,
                Op::Add(Operand::Factor) => n += m,
                Op::Add(Operand::ReverseR1) | Op::Subtract(Operand::ReverseR1) => n = 1 - n,
                Op::Add(Operand::ReverseFactor) | Op::Subtract(Operand::ReverseFactor) => {
                    n = m - n
                }
                Op::Subtract(Operand::R1) => n -= 1,
                Op::Subtract(Operand::Factor) => n -= m,
                Op::Zero => return,
                Op::Negate => n = -n,
                Op::Nop => {}
            }
            cost += instr.cost;
            self.insert_or_update(n, 0.0, cost, false, &instrs[..=i]);
        }
    }

    /// Run the entry invariants across the whole cache.
    pub fn check(&self) -> Result<(), Error> {
        for (num, entry) in &self.entries {
            if entry.finished {
                check_sequence_cost(entry.upper, &entry.instrs)?;
                check_sequence_value(*num, &entry.instrs)?;
                if entry.lower != entry.upper {
                    return Err(Error::InvariantViolation(format!(
                        "finished entry {} has bounds ({}, {})",
                        num, entry.lower, entry.upper
                    )));
                }
            }
            if !entry.instrs.is_empty() {
                let cost = sequence_cost(&entry.instrs);
                if !(entry.lower <= cost && cost <= entry.upper) {
                    return Err(Error::InvariantViolation(format!(
                        "entry {} cost {} outside bounds ({}, {})",
                        num, cost, entry.lower, entry.upper
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, n: i64) -> Option<&CacheEntry> {
        self.entries.get(&n)
    }

    pub fn contains(&self, n: i64) -> bool {
        self.entries.contains_key(&n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&i64, &CacheEntry)> {
        self.entries.iter()
    }
}
