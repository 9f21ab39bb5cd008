//! The pluggable search steps driven by the alpha-beta loop.
//!
//! Every method has the `SearchMethod` signature: it receives the
//! sub-multiplier sought, the current cost limit, the cost incurred
//! so far, the instruction prefix built by the caller, and the best
//! candidate so far; it returns a possibly tightened `(limit,
//! candidate)` pair. A method that improves the bound also updates
//! the cache entry for its sub-problem.

use crate::binary_method::binary_sequence_inner;
use crate::cpu::Cost;
use crate::error::Error;
use crate::instruction::{sequence_cost, sequence_value, Instruction, Op, Operand};
use crate::mult::{MultSearch, SearchMethod};

fn signum(n: i64) -> i64 {
    if n > 0 {
        1
    } else {
        -1
    }
}

/// The default branching order. Searching towards zero first gives
/// better cache reuse; for negative numbers a negation candidate is
/// established early because it always succeeds and is within one
/// instruction of optimal, which gives the rest of the search a
/// reasonable bound.
pub fn default_methods(n: i64) -> Vec<SearchMethod> {
    if n > 0 {
        vec![
            search_cache,
            search_short_factors,
            search_add_one,
            search_subtract_one,
        ]
    } else {
        vec![
            search_cache,
            search_short_factors,
            search_add_or_subtract_one,
            search_negate_subtract_one,
        ]
    }
}

/// Is what we want already in the cache?
pub fn search_cache(
    engine: &mut MultSearch,
    n: i64,
    limit: Cost,
    _lower: Cost,
    instrs: &[Instruction],
    candidate: Vec<Instruction>,
) -> Result<(Cost, Vec<Instruction>), Error> {
    let cached = engine.cache.lookup(n);
    let try_limit = cached.upper + sequence_cost(instrs);
    if try_limit < limit {
        engine.debug_msg(
            &format!(
                "*include cache value {} in sequence; search limit {} < {}.",
                n, try_limit, limit
            ),
            0,
        );
        return Ok((cached.upper, cached.instrs));
    }
    Ok((limit, candidate))
}

/// Factor `n` by small odd factors of the form 2^i +/- 1, gluing each
/// hit with a shift and an add/subtract against the factor register.
pub fn search_short_factors(
    engine: &mut MultSearch,
    n: i64,
    mut upper: Cost,
    _lower: Cost,
    instrs: &[Instruction],
    mut candidate: Vec<Instruction>,
) -> Result<(Cost, Vec<Instruction>), Error> {
    let abs_n = n.abs();

    // 3 = 2+1 and 5 = 4+1 are handled ahead of the loop so the
    // degenerate subtraction factors 2-1 = 1 and 4-1 = 3 are never
    // tried; factor 3 itself is the loop's 2+1 case.
    for (factor, shift_amount) in [(3i64, 1u32), (5, 2)] {
        if factor > abs_n {
            break;
        }
        (upper, candidate) = engine.try_shift_op_factor(
            n,
            factor,
            Op::Add(Operand::Factor),
            shift_amount,
            upper,
            instrs,
            candidate,
        )?;
    }

    let (mut i, mut j) = (3u32, 8i64);
    while j - 1 <= abs_n {
        if n < 0 {
            // Allow an exact tie to succeed with subtraction: for a
            // negative number the subtract then reverses into the
            // negation we need anyway.
            let eps = engine.profile.eps();
            let (try_cost, mut try_instrs) = engine.try_shift_op_factor(
                -n,
                j - 1,
                Op::Subtract(Operand::Factor),
                i,
                upper + eps,
                instrs,
                candidate.clone(),
            )?;
            if try_cost < upper
                && try_instrs.last().map(|x| x.op) == Some(Op::Subtract(Operand::Factor))
            {
                engine.debug_msg(
                    &format!(
                        "*update {} using factor {}; cost {} < previous limit {}",
                        n,
                        j - 1,
                        try_cost,
                        upper
                    ),
                    0,
                );
                if let Some(last) = try_instrs.last_mut() {
                    last.op = Op::Subtract(Operand::ReverseFactor);
                }
                let key = sequence_value(&try_instrs);
                engine
                    .cache
                    .update_field(key, None, Some(try_cost), None, Some(&try_instrs));
                candidate = try_instrs;
                upper = try_cost;
            }
        }

        (upper, candidate) = engine.try_shift_op_factor(
            n,
            j - 1,
            Op::Subtract(Operand::Factor),
            i,
            upper,
            instrs,
            candidate,
        )?;
        (upper, candidate) = engine.try_shift_op_factor(
            n,
            j + 1,
            Op::Add(Operand::Factor),
            i,
            upper,
            instrs,
            candidate,
        )?;

        i += 1;
        j <<= 1;
    }

    Ok((upper, candidate))
}

/// Reach `n` from the neighbour one closer to zero, gluing with an
/// add of `r[1]`.
pub fn search_add_one(
    engine: &mut MultSearch,
    n: i64,
    upper: Cost,
    lower: Cost,
    _instrs: &[Instruction],
    candidate: Vec<Instruction>,
) -> Result<(Cost, Vec<Instruction>), Error> {
    let increment = -signum(n);
    engine.try_plus_offset(n, increment, upper, lower, candidate, Operand::R1)
}

/// Reach `n` from the neighbour one further from zero, gluing with a
/// subtract of `r[1]`.
pub fn search_subtract_one(
    engine: &mut MultSearch,
    n: i64,
    upper: Cost,
    lower: Cost,
    _instrs: &[Instruction],
    candidate: Vec<Instruction>,
) -> Result<(Cost, Vec<Instruction>), Error> {
    let increment = signum(n);
    engine.try_plus_offset(n, increment, upper, lower, candidate, Operand::R1)
}

/// Neighbour search for either sign. Positive numbers go towards
/// zero first for cache reuse; negative numbers establish a negation
/// bound first, then try both neighbours.
pub fn search_add_or_subtract_one(
    engine: &mut MultSearch,
    n: i64,
    mut upper: Cost,
    lower: Cost,
    instrs: &[Instruction],
    mut candidate: Vec<Instruction>,
) -> Result<(Cost, Vec<Instruction>), Error> {
    if n.abs() == 1 {
        engine.cache.lookup(n);
    } else if n > 0 {
        (upper, candidate) = search_subtract_one(engine, n, upper, lower, instrs, candidate)?;
        (upper, candidate) = search_add_one(engine, n, upper, lower, instrs, candidate)?;
    } else {
        (upper, candidate) = search_negate(engine, n, upper, lower, instrs, candidate)?;
        (upper, candidate) = search_add_one(engine, n, upper, lower, instrs, candidate)?;
        (upper, candidate) = search_subtract_one(engine, n, upper, lower, instrs, candidate)?;
    }
    Ok((upper, candidate))
}

/// For negative `n`: take the positive counterpart's sequence and
/// append a negate.
pub fn search_negate(
    engine: &mut MultSearch,
    n: i64,
    upper: Cost,
    mut lower: Cost,
    _instrs: &[Instruction],
    candidate: Vec<Instruction>,
) -> Result<(Cost, Vec<Instruction>), Error> {
    if n < 0 && engine.profile.can_negate() {
        engine.debug_msg(&format!("Looking at cached positive value {} of {}", -n, n), 0);

        let negate_cost = engine.profile.costs.negate;
        lower += negate_cost;
        if lower >= upper {
            engine.debug_msg(
                &format!("**alpha cutoff in negate for {} in cost {} >= {}", n, lower, upper),
                0,
            );
            return Ok((upper, candidate));
        }

        let cached = engine.cache.lookup(-n);
        let (mut positive_cost, mut positive_instrs) = (cached.upper, cached.instrs);
        if positive_cost.is_infinite() {
            (positive_cost, positive_instrs) = binary_sequence_inner(engine, -n)?;
        }

        let try_cost = positive_cost + negate_cost;
        if try_cost < upper {
            engine.debug_msg(&format!("Negation {} update {} < {} ...", n, try_cost, upper), 0);
            positive_instrs.push(Instruction::new(Op::Negate, negate_cost));
            return Ok((try_cost, positive_instrs));
        }
    }
    Ok((upper, candidate))
}

/// For negative `n`: rewrite the negation as `r[1] - r[n]` against
/// the neighbour one above the positive counterpart. An epsilon is
/// added to the limit so an exact tie still folds the negation into
/// the subtract.
pub fn search_negate_subtract_one(
    engine: &mut MultSearch,
    n: i64,
    upper: Cost,
    lower: Cost,
    _instrs: &[Instruction],
    candidate: Vec<Instruction>,
) -> Result<(Cost, Vec<Instruction>), Error> {
    let cached = engine.cache.lookup(n);
    if cached.finished {
        let instrs = if n == 1 { Vec::new() } else { cached.instrs };
        return Ok((cached.upper, instrs));
    }
    if n > 1 {
        // A negative number never costs less than its positive
        // counterpart, so reversing a subtraction buys nothing here.
        return Ok((upper, candidate));
    }
    let eps = engine.profile.eps();
    engine.try_plus_offset(-n, 1, upper + eps, lower, candidate, Operand::ReverseR1)
}
