use crate::binary_method;
use crate::cache::MultCache;
use crate::cpu::{Cost, CpuProfile, INF_COST};
use crate::error::Error;
use crate::instruction::{sequence_cost, sequence_value, Instruction, Op, Operand};
use crate::search_methods;

/// A pluggable search step. Each method receives the sub-multiplier
/// being sought, the current cost limit, the cost incurred so far,
/// the instruction prefix built so far, and the best candidate seen;
/// it returns a possibly tightened limit and candidate. The order of
/// the methods is the branching heuristic.
pub type SearchMethod = fn(
    &mut MultSearch,
    i64,
    Cost,
    Cost,
    &[Instruction],
    Vec<Instruction>,
) -> Result<(Cost, Vec<Instruction>), Error>;

/// Multiplication-sequence search engine: a bounded alpha-beta
/// enumeration over decomposition strategies, seeded by the binary
/// method and memoised in `cache`.
pub struct MultSearch {
    pub profile: CpuProfile,
    pub cache: MultCache,
    pub debug: bool,
    /// Search methods plugged in by the caller; `find_sequence`
    /// installs the sign-appropriate defaults.
    pub search_methods: Option<Vec<SearchMethod>>,
    // Nesting level for debug traces.
    indent: usize,
}

impl MultSearch {
    pub fn new(profile: CpuProfile) -> Self {
        MultSearch {
            profile,
            cache: MultCache::new(profile),
            debug: false,
            search_methods: None,
            indent: 0,
        }
    }

    pub(crate) fn debug_msg(&mut self, msg: &str, relative_indent: i32) {
        if self.debug {
            eprintln!("{}{}", " ".repeat(self.indent), msg);
            if relative_indent >= 0 {
                self.indent += relative_indent as usize;
            } else {
                self.indent = self.indent.saturating_sub(-relative_indent as usize);
            }
        }
    }

    fn dedent(&mut self) {
        if self.debug {
            self.indent = self.indent.saturating_sub(2);
        }
    }

    /// Split `n` into its absolute value and a pending-negation flag,
    /// rejecting negative multipliers the profile cannot realise.
    pub(crate) fn need_negation(&self, n: i64) -> Result<(i64, bool), Error> {
        if n < 0 {
            if !self.profile.can_negate() {
                return Err(Error::UnsupportedNegation {
                    profile: self.profile.name.to_string(),
                    multiplier: n,
                });
            }
            Ok((-n, true))
        } else {
            Ok((n, false))
        }
    }

    /// Strip low-order zeros with a single shift appended to
    /// `instrs`. Machines that shift one place at a time are covered
    /// by the profile's shift cost function.
    pub(crate) fn make_odd(&self, n: i64, instrs: &mut Vec<Instruction>) -> (i64, Cost, u32) {
        let amount = n.trailing_zeros();
        if amount == 0 {
            return (n, 0.0, 0);
        }
        let shift_cost = self.profile.shift_cost(amount);
        instrs.push(Instruction::new(Op::Shift(amount), shift_cost));
        (n >> amount, shift_cost, amount)
    }

    /// Feasible sequence from the binary representation of `n`; an
    /// upper bound only. Exposed for tooling.
    pub fn binary_sequence(&mut self, n: i64) -> Result<(Cost, Vec<Instruction>), Error> {
        binary_method::binary_sequence(self, n)
    }

    /// Top-level search: return a minimum-cost sequence realising
    /// `n`, relative to the explored decomposition family. Results
    /// and all intermediate bounds are memoised.
    pub fn find_sequence(&mut self, n: i64) -> Result<(Cost, Vec<Instruction>), Error> {
        let methods = search_methods::default_methods(n);
        self.find_sequence_with(n, methods)
    }

    /// `find_sequence` with a caller-supplied search-method list.
    pub fn find_sequence_with(
        &mut self,
        n: i64,
        methods: Vec<SearchMethod>,
    ) -> Result<(Cost, Vec<Instruction>), Error> {
        let entry = self.cache.lookup(n);
        if entry.finished {
            return Ok((entry.upper, entry.instrs));
        }

        self.search_methods = Some(methods);

        // The binary sequence gives a workable upper bound to start
        // the alpha-beta search from.
        let (seed_cost, seed_instrs) = if entry.upper.is_infinite() {
            binary_method::binary_sequence(self, n)?
        } else {
            (entry.upper, entry.instrs)
        };

        let (_cost, instrs) = self.alpha_beta(n, 0.0, seed_cost)?;

        if !instrs.is_empty() && sequence_value(&instrs) == n {
            let cost = sequence_cost(&instrs);
            self.cache
                .update_field(n, None, Some(cost), Some(true), Some(&instrs));
            Ok((cost, instrs))
        } else {
            self.cache
                .update_field(n, None, Some(seed_cost), Some(true), Some(&seed_instrs));
            Ok((seed_cost, seed_instrs))
        }
    }

    /// Alpha-beta search for the sub-multiplier `n`.
    ///
    /// `lower` is the cost already incurred on the way here for the
    /// top-level multiplier; it is what must be added to the cost of
    /// `n` when comparing against `limit`. `limit` is the cost of the
    /// best complete sequence seen so far; it only ever tightens.
    ///
    /// The return is the best total found with `n` in the sequence,
    /// or `(INF_COST, [])` on a cutoff. Cutoffs leave the cache's
    /// lower bound updated so later searches can cut off sooner.
    pub(crate) fn alpha_beta(
        &mut self,
        n: i64,
        mut lower: Cost,
        mut limit: Cost,
    ) -> Result<(Cost, Vec<Instruction>), Error> {
        self.debug_msg(
            &format!(
                "alpha-beta search for {} in at most {} = max allotted cost: {}, incurred cost {}",
                n,
                limit - lower,
                limit,
                lower
            ),
            2,
        );

        let cached = self.cache.lookup(n);
        if cached.finished {
            self.debug_msg(
                &format!("alpha-beta using cache entry for {} cost: {}", n, cached.upper),
                -2,
            );
            // r[1] already holds the input, so |n| = 1 contributes no
            // instructions to the caller's glue.
            let instrs = if n.abs() == 1 { Vec::new() } else { cached.instrs };
            return Ok((cached.upper, instrs));
        }

        let orig_n = n;
        let (n, need_negation) = self.need_negation(n)?;

        let mut instrs: Vec<Instruction> = Vec::new();
        let (m_abs, shift_cost, shift_amount) = self.make_odd(n, &mut instrs);

        lower += shift_cost;
        if lower > limit {
            self.debug_msg(
                &format!(
                    "**beta cutoff after shift for {} incurred {} > {} allotted",
                    n, lower, limit
                ),
                -2,
            );
            return Ok((INF_COST, Vec::new()));
        }

        // Search for the negative odd part directly; the negation
        // folds into the sub-search.
        let m = if need_negation { -m_abs } else { m_abs };

        let mut candidate: Vec<Instruction> = Vec::new();

        if (-1..=1).contains(&m) {
            // With caching enabled the finished-entry check above
            // catches these earlier; kept for the extreme cases.
            let entry = self.cache.lookup(m);
            limit = entry.upper + shift_cost;
            lower = limit;
            candidate = entry.instrs;
        } else {
            let methods = match &self.search_methods {
                Some(ms) => ms.clone(),
                None => search_methods::default_methods(m),
            };
            let mut search_limit = limit;
            for method in methods {
                let (candidate_upper, new_candidate) =
                    method(self, m, search_limit, lower, &instrs, candidate)?;
                candidate = new_candidate;
                if candidate_upper + shift_cost < search_limit {
                    search_limit = candidate_upper;
                    self.debug_msg(
                        &format!(
                            "*alpha-beta lowering limit of {} cost to {}",
                            m, search_limit
                        ),
                        0,
                    );
                }
            }
            if search_limit < limit {
                limit = search_limit + shift_cost;
            }
        }

        if !candidate.is_empty() {
            if shift_amount > 0 {
                candidate.push(Instruction::new(Op::Shift(shift_amount), shift_cost));
            }
            // Key the entry by the multiplier the candidate actually
            // realises; on the reverse-subtract paths that can differ
            // from the positive `n` searched here.
            let key = sequence_value(&candidate);
            let candidate_cost = sequence_cost(&candidate);
            self.cache
                .insert_or_update(key, candidate_cost, candidate_cost, true, &candidate);
        } else {
            candidate = cached.instrs;
        }

        if candidate.is_empty() {
            self.debug_msg(
                &format!(
                    "**cutoffs before anything found for {}; lower bound updated to {}",
                    orig_n,
                    limit - lower
                ),
                0,
            );
            self.cache
                .update_field(orig_n, Some(limit - lower), None, None, None);
        }

        self.dedent();
        Ok((limit, candidate))
    }

    /// Try writing `n = factor * m`: search `m`, then glue with a
    /// shift and an add/subtract against the factor register.
    pub(crate) fn try_shift_op_factor(
        &mut self,
        n: i64,
        factor: i64,
        op: Op,
        shift_amount: u32,
        upper: Cost,
        instrs: &[Instruction],
        candidate: Vec<Instruction>,
    ) -> Result<(Cost, Vec<Instruction>), Error> {
        if n % factor != 0 {
            return Ok((upper, candidate));
        }
        let shift_cost = self.profile.shift_cost(shift_amount);
        let op_cost = self.profile.op_cost(op);
        let shift_op_cost = op_cost + shift_cost;
        let lower = sequence_cost(instrs) + shift_op_cost;
        if lower < upper {
            let m = n / factor;
            self.debug_msg(&format!("Trying factor {}...", factor), 0);
            let (try_cost, mut try_instrs) =
                self.alpha_beta(m, lower, upper - (lower - shift_op_cost))?;
            // The glue arithmetic only holds when the sub-search's
            // reported cost matches its sequence.
            if try_cost < upper - lower && sequence_cost(&try_instrs) == try_cost {
                try_instrs.push(Instruction::new(Op::Shift(shift_amount), shift_cost));
                try_instrs.push(Instruction::new(op, op_cost));
                let total = try_cost + shift_op_cost;
                self.debug_msg(
                    &format!(
                        "*update {} using factor {}; cost {} < previous limit {}",
                        n, factor, total, upper
                    ),
                    0,
                );
                let key = sequence_value(&try_instrs);
                self.cache
                    .update_field(key, None, Some(total), None, Some(&try_instrs));
                return Ok((total, try_instrs));
            }
        }
        Ok((upper, candidate))
    }

    /// Try reaching `n` from its neighbour `n + increment`, gluing
    /// with an add or subtract of `r[1]` (or a reverse subtract when
    /// `op_flag` says so).
    pub(crate) fn try_plus_offset(
        &mut self,
        n: i64,
        increment: i64,
        limit: Cost,
        lower: Cost,
        candidate: Vec<Instruction>,
        op_flag: Operand,
    ) -> Result<(Cost, Vec<Instruction>), Error> {
        let op = if increment < 0 {
            Op::Add(op_flag)
        } else {
            Op::Subtract(op_flag)
        };
        let op_cost = self.profile.op_cost(op);
        let try_lower = lower + op_cost;
        if try_lower < limit {
            let n1 = n + increment;

            let cached = self.cache.lookup(n1);
            let (neighbor_cost, mut neighbor_instrs) = if cached.finished {
                (cached.upper, cached.instrs)
            } else {
                if self.debug {
                    let which = if n1 < n { "lower" } else { "upper" };
                    self.debug_msg(&format!("Trying {} neighbor {} of {}...", which, n1, n), 0);
                }
                self.alpha_beta(n1, try_lower, limit)?
            };

            let try_cost = neighbor_cost + op_cost;
            if try_cost < limit && sequence_cost(&neighbor_instrs) == neighbor_cost {
                self.debug_msg(
                    &format!("*neighbor {} update cost {}, previously {}.", n, try_cost, limit),
                    0,
                );
                neighbor_instrs.push(Instruction::new(op, op_cost));
                let key = sequence_value(&neighbor_instrs);
                let entry_lower = self.cache.lookup(key).lower;
                self.cache
                    .insert_or_update(key, entry_lower, try_cost, false, &neighbor_instrs);
                return Ok((try_cost, neighbor_instrs));
            }
        }
        Ok((limit, candidate))
    }
}
