use crate::cpu::Cost;
use crate::error::Error;
use crate::instruction::{bin2str, Instruction, Op, Operand};
use crate::mult::MultSearch;

/// Cost and sequence for `n` using the binary representation of the
/// number, assuming a mostly empty cache (0 and 1 are always there).
///
/// Each one bit other than the highest-order one bit costs a `shift`
/// over the preceding run of zeros plus an addition. If subtraction
/// is available, a run of more than two ones is instead a shift over
/// the run plus one subtraction. Addition is preferred for short runs
/// since `x = (x << 1) + x` beats `x = (x << 2) - x` on cache reuse.
///
/// With cost one for add, subtract, and shift by any amount:
///
/// ```text
/// number  cost  remarks
/// ------  ----  -------
/// 0       1     load constant zero
/// 1       0     do nothing; the operand register already holds x
/// 10      1     shift one
/// 11      2     shift one; add
/// 101     2     shift two; add
/// 110     3     shift one; add; shift one
/// 111     2     shift three; subtract one      (subtract available)
/// 111     4     shift one; add; shift one; add (no subtract)
/// ```
///
/// If the cache has been populated, a cached bound may shorten the
/// produced sequence further. The result is an upper bound only; the
/// cache entry is never marked finished here.
pub fn binary_sequence(engine: &mut MultSearch, n: i64) -> Result<(Cost, Vec<Instruction>), Error> {
    let entry = engine.cache.lookup(n);
    if entry.finished {
        return Ok((entry.upper, entry.instrs));
    }
    binary_sequence_inner(engine, n)
}

pub(crate) fn binary_sequence_inner(
    engine: &mut MultSearch,
    n: i64,
) -> Result<(Cost, Vec<Instruction>), Error> {
    if n == 0 {
        let zero_cost = engine.profile.costs.zero;
        return Ok((zero_cost, vec![Instruction::new(Op::Zero, zero_cost)]));
    }

    let orig_n = n;
    let (mut n, mut need_negation) = engine.need_negation(n)?;

    // Accumulated in reverse order and flipped at the end.
    let mut instrs: Vec<Instruction> = Vec::new();
    let mut cost: Cost = 0.0;

    while n > 1 {
        if need_negation {
            let cached = engine.cache.lookup(-n);
            if cached.upper.is_finite() {
                cost += splice(&mut instrs, cached.instrs, cached.upper);
                need_negation = false;
                break;
            }
        }

        let cached = engine.cache.lookup(n);
        if cached.upper.is_finite() {
            // With a negation still pending and a reversible
            // subtract, keep going: a run of ones further up may fold
            // the negation into a final reverse subtract.
            if !(need_negation && engine.profile.subtract_can_negate()) {
                cost += splice(&mut instrs, cached.instrs, cached.upper);
                break;
            }
        }

        let (odd, shift_cost, _amount) = engine.make_odd(n, &mut instrs);
        n = odd;
        cost += shift_cost;
        if n == 1 {
            break;
        }

        let one_run = n.trailing_ones();
        let try_reverse_subtract = need_negation && engine.profile.subtract_can_negate();
        if engine.profile.can_subtract() && (one_run > 2 || try_reverse_subtract) {
            if try_reverse_subtract {
                cost += push_op(engine, &mut instrs, Op::Subtract(Operand::ReverseR1));
                need_negation = false;
            } else {
                cost += push_op(engine, &mut instrs, Op::Subtract(Operand::R1));
            }
            n += 1;
        } else {
            cost += push_op(engine, &mut instrs, Op::Add(Operand::R1));
            n -= 1;
        }
    }

    instrs.reverse();

    if need_negation {
        cost += push_op(engine, &mut instrs, Op::Negate);
    }

    engine.debug_msg(
        &format!(
            "binary method for {} = {} has cost {}",
            orig_n,
            bin2str(orig_n),
            cost
        ),
        0,
    );

    engine.cache.insert_or_update(orig_n, 0.0, cost, false, &instrs);

    Ok((cost, instrs))
}

fn push_op(engine: &MultSearch, instrs: &mut Vec<Instruction>, op: Op) -> Cost {
    let cost = engine.profile.op_cost(op);
    instrs.push(Instruction::new(op, cost));
    cost
}

/// Append a cached sequence to the reverse-order accumulator.
fn splice(instrs: &mut Vec<Instruction>, mut cached: Vec<Instruction>, upper: Cost) -> Cost {
    cached.reverse();
    instrs.extend(cached);
    upper
}
