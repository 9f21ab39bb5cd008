use std::fmt;

use crate::cpu::{Cost, CpuProfile};
use crate::error::Error;

/// Which registers an `add`/`subtract` reads. `r[1]` holds the
/// initial input value; `r[n]` the running result; `r[n-1]` the value
/// of `r[n]` just before the most recent shift (the factor register).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// `r[n] = r[n] op r[1]`
    R1,
    /// `r[n] = r[n] op r[n-1]`
    Factor,
    /// `r[n] = r[1] - r[n]`
    ReverseR1,
    /// `r[n] = r[n-1] - r[n]`
    ReverseFactor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// `r[n] = r[1]`; stands for the input register already holding
    /// the value, so its cost must be 0.
    Nop,
    /// `r[n] = 0`
    Zero,
    /// `r[n] = -r[n]`
    Negate,
    /// `r[n] = r[n] << amount`, recording the old `r[n]` in `r[n-1]`
    Shift(u32),
    Add(Operand),
    Subtract(Operand),
}

/// One operation of a multiplication sequence. The cost is redundant
/// with `(op, profile)`; it is kept on the record for convenience.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instruction {
    pub op: Op,
    pub cost: Cost,
}

impl Instruction {
    pub fn new(op: Op, cost: Cost) -> Self {
        Instruction { op, cost }
    }
}

impl fmt::Display for Instruction {
    /// Compact form, e.g. `n<<3`, `n-1`, `m-n`. No cost is shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Op::Nop => write!(f, "nop"),
            Op::Zero => write!(f, "0"),
            Op::Negate => write!(f, "-n"),
            Op::Shift(amount) => write!(f, "n<<{}", amount),
            Op::Add(Operand::R1) => write!(f, "n+1"),
            Op::Add(Operand::Factor) => write!(f, "n+m"),
            Op::Add(Operand::ReverseR1) | Op::Subtract(Operand::ReverseR1) => write!(f, "1-n"),
            Op::Add(Operand::ReverseFactor) | Op::Subtract(Operand::ReverseFactor) => {
                write!(f, "m-n")
            }
            Op::Subtract(Operand::R1) => write!(f, "n-1"),
            Op::Subtract(Operand::Factor) => write!(f, "n-m"),
        }
    }
}

/// Compact form of a whole sequence: `[n<<4, n+1, n<<2, n-m]`.
pub fn sequence_to_string(instrs: &[Instruction]) -> String {
    let parts: Vec<String> = instrs.iter().map(|i| i.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// The multiplier realised by a sequence, simulating `(n, m)` =
/// (running result, factor register) from `(1, 1)`.
pub fn sequence_value(instrs: &[Instruction]) -> i64 {
    let (mut n, mut m) = (1i64, 1i64);
    for instr in instrs {
        match instr.op {
            Op::Shift(amount) => {
                m = n;
                n <<= amount;
            }
            Op::Add(Operand::R1) => n += 1,
            Op::Add(Operand::Factor) => n += m,
            Op::Add(Operand::ReverseR1) | Op::Subtract(Operand::ReverseR1) => n = 1 - n,
            Op::Add(Operand::ReverseFactor) | Op::Subtract(Operand::ReverseFactor) => n = m - n,
            Op::Subtract(Operand::R1) => n -= 1,
            Op::Subtract(Operand::Factor) => n -= m,
            Op::Zero => return 0,
            Op::Negate => n = -n,
            Op::Nop => {}
        }
    }
    n
}

/// Sum of the per-instruction costs.
pub fn sequence_cost(instrs: &[Instruction]) -> Cost {
    instrs.iter().map(|i| i.cost).sum()
}

/// Check that the sequence realises the expected multiplier.
pub fn check_sequence_value(n: i64, instrs: &[Instruction]) -> Result<(), Error> {
    let actual = sequence_value(instrs);
    if actual != n {
        return Err(Error::InvariantViolation(format!(
            "value of {} is {}; expecting {}",
            sequence_to_string(instrs),
            actual,
            n
        )));
    }
    Ok(())
}

/// Check that the sequence costs what the caller believes it costs.
/// An infinite expected cost marks "no known sequence" and is not
/// checked against the instructions.
pub fn check_sequence_cost(cost: Cost, instrs: &[Instruction]) -> Result<(), Error> {
    if cost.is_infinite() {
        return Ok(());
    }
    let actual = sequence_cost(instrs);
    if actual != cost {
        return Err(Error::InvariantViolation(format!(
            "cost of {} is {}; expecting {}",
            sequence_to_string(instrs),
            actual,
            cost
        )));
    }
    Ok(())
}

/// Parse one compact-form instruction, reconstructing its cost from
/// the given profile. Inverts `Display` on engine-producible
/// instructions.
pub fn parse_instruction(s: &str, profile: &CpuProfile) -> Result<Instruction, Error> {
    let op = match s {
        "nop" => Op::Nop,
        "0" => Op::Zero,
        "-n" => Op::Negate,
        "n+1" => Op::Add(Operand::R1),
        "n+m" => Op::Add(Operand::Factor),
        "n-1" => Op::Subtract(Operand::R1),
        "n-m" => Op::Subtract(Operand::Factor),
        "1-n" => Op::Subtract(Operand::ReverseR1),
        "m-n" => Op::Subtract(Operand::ReverseFactor),
        _ => match s.strip_prefix("n<<") {
            Some(rest) => {
                let amount: u32 = rest
                    .parse()
                    .map_err(|_| Error::Parse(format!("bad shift amount in \"{}\"", s)))?;
                Op::Shift(amount)
            }
            None => return Err(Error::Parse(format!("unconvertible instruction \"{}\"", s))),
        },
    };
    Ok(Instruction::new(op, profile.op_cost(op)))
}

/// Parse a bracketed sequence, e.g. `[n<<4, n+1, n<<2, n-m, -n]`.
pub fn parse_sequence(s: &str, profile: &CpuProfile) -> Result<Vec<Instruction>, Error> {
    let inner = s
        .trim()
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| Error::Parse(format!("expected a bracketed sequence, got \"{}\"", s)))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(", ")
        .map(|tok| parse_instruction(tok, profile))
        .collect()
}

pub(crate) fn bin2str(n: i64) -> String {
    if n < 0 {
        format!("-{:b}", -n)
    } else {
        format!("{:b}", n)
    }
}

const SEP_LEN: usize = 60;

fn assignment(instr: &Instruction, op1: &str) -> String {
    let rhs = match instr.op {
        Op::Nop => op1.to_string(),
        Op::Zero => "0".to_string(),
        Op::Negate => format!("-{}", op1),
        Op::Shift(amount) => format!("{} << {}", op1, amount),
        Op::Add(Operand::R1) => format!("{} + r[1]", op1),
        Op::Add(Operand::Factor) => format!("{} + r[n-1]", op1),
        Op::Add(Operand::ReverseR1) | Op::Subtract(Operand::ReverseR1) => {
            format!("r[1] - {}", op1)
        }
        Op::Add(Operand::ReverseFactor) | Op::Subtract(Operand::ReverseFactor) => {
            format!("r[n-1] - {}", op1)
        }
        Op::Subtract(Operand::R1) => format!("{} - r[1]", op1),
        Op::Subtract(Operand::Factor) => format!("{} - r[n-1]", op1),
    };
    let stmt = format!("r[n] = {};", rhs);
    format!("{:24}cost: {:2}", stmt, instr.cost)
}

/// Render a sequence as a register-transfer listing with a running
/// product column, the way the CLI reports each search result.
pub fn format_sequence(instrs: &[Instruction], n: Option<i64>, stored_cost: Option<Cost>) -> String {
    let mut out = String::new();
    out.push_str(&"-".repeat(SEP_LEN));
    out.push('\n');

    let cost = stored_cost.unwrap_or_else(|| sequence_cost(instrs));
    let mut intro = "Instruction sequence".to_string();
    if let Some(n) = n {
        intro.push_str(&format!(" for {:2} = {}", n, bin2str(n)));
    }
    out.push_str(&format!("{}, cost: {:2}:\n", intro, cost));

    if !instrs.is_empty() {
        out.push_str(&format!("{:9}: r[1] = <initial value>; cost:  0\n", 1));
    }

    let (mut value, mut prev) = (1i64, 1i64);
    let mut op1 = "r[1]";
    for instr in instrs {
        match instr.op {
            Op::Shift(amount) => {
                prev = value;
                value <<= amount;
            }
            Op::Add(Operand::R1) => value += 1,
            Op::Add(Operand::Factor) => value += prev,
            Op::Add(Operand::ReverseR1) | Op::Subtract(Operand::ReverseR1) => value = 1 - value,
            Op::Add(Operand::ReverseFactor) | Op::Subtract(Operand::ReverseFactor) => {
                value = prev - value
            }
            Op::Subtract(Operand::R1) => value -= 1,
            Op::Subtract(Operand::Factor) => value -= prev,
            Op::Zero => value = 0,
            Op::Negate => value = -value,
            Op::Nop => {}
        }
        out.push_str(&format!("{:9}: {}\n", value, assignment(instr, op1)));
        op1 = "r[n]";
    }

    out.push_str(&"=".repeat(SEP_LEN));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::DEFAULT_PROFILE;

    fn instr(op: Op) -> Instruction {
        Instruction::new(op, DEFAULT_PROFILE.op_cost(op))
    }

    fn sample() -> Vec<Instruction> {
        vec![
            instr(Op::Shift(4)),
            instr(Op::Add(Operand::R1)),
            instr(Op::Shift(2)),
            instr(Op::Subtract(Operand::Factor)),
            instr(Op::Negate),
        ]
    }

    #[test]
    fn test_compact_display() {
        let strs: Vec<String> = sample().iter().map(|i| i.to_string()).collect();
        assert_eq!(strs, ["n<<4", "n+1", "n<<2", "n-m", "-n"]);
        assert_eq!(
            sequence_to_string(&sample()),
            "[n<<4, n+1, n<<2, n-m, -n]"
        );
    }

    #[test]
    fn test_parse_inverts_display() {
        let parsed = parse_sequence("[n<<4, n+1, n<<2, n-m, -n]", &DEFAULT_PROFILE).unwrap();
        assert_eq!(parsed, sample());

        for i in sample() {
            let roundtrip = parse_instruction(&i.to_string(), &DEFAULT_PROFILE).unwrap();
            assert_eq!(roundtrip, i, "round-trip of {}", i);
        }
    }

    #[test]
    fn test_parse_reverse_subtracts() {
        let parsed = parse_sequence("[n<<1, 1-n, m-n]", &DEFAULT_PROFILE).unwrap();
        assert_eq!(parsed[1].op, Op::Subtract(Operand::ReverseR1));
        assert_eq!(parsed[2].op, Op::Subtract(Operand::ReverseFactor));
        assert_eq!(sequence_to_string(&parsed), "[n<<1, 1-n, m-n]");
    }

    #[test]
    fn test_parse_empty_sequence() {
        assert_eq!(parse_sequence("[]", &DEFAULT_PROFILE).unwrap(), Vec::new());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_instruction("n*2", &DEFAULT_PROFILE),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_instruction("n<<x", &DEFAULT_PROFILE),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_sequence("n<<1, n+1", &DEFAULT_PROFILE),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_sequence_value() {
        // ((1<<4) + 1) << 2 = 68; 68 - 17 = 51; negated.
        assert_eq!(sequence_value(&sample()), -51);
        assert_eq!(sequence_value(&[]), 1);
        assert_eq!(sequence_value(&[instr(Op::Zero)]), 0);
        assert_eq!(sequence_value(&[instr(Op::Nop)]), 1);

        // 1 - ((1<<2)) = -3 via a reverse subtract.
        let rev = vec![instr(Op::Shift(2)), instr(Op::Subtract(Operand::ReverseR1))];
        assert_eq!(sequence_value(&rev), -3);

        // (1<<3) - 1 = 7, then r[n-1] - r[n] = 8 - 7 ... the factor
        // register still holds 8 from the shift.
        let revf = vec![
            instr(Op::Shift(3)),
            instr(Op::Subtract(Operand::R1)),
            instr(Op::Subtract(Operand::ReverseFactor)),
        ];
        assert_eq!(sequence_value(&revf), 1);
    }

    #[test]
    fn test_sequence_cost() {
        assert_eq!(sequence_cost(&sample()), 5.0);
        assert_eq!(sequence_cost(&[]), 0.0);
        assert_eq!(sequence_cost(&[instr(Op::Nop)]), 0.0);
    }

    #[test]
    fn test_check_helpers() {
        assert!(check_sequence_value(-51, &sample()).is_ok());
        assert!(check_sequence_value(51, &sample()).is_err());
        assert!(check_sequence_cost(5.0, &sample()).is_ok());
        assert!(check_sequence_cost(4.0, &sample()).is_err());
        assert!(check_sequence_cost(crate::cpu::INF_COST, &sample()).is_ok());
    }

    #[test]
    fn test_format_sequence() {
        let seq = vec![instr(Op::Shift(3)), instr(Op::Subtract(Operand::R1))];
        let text = format_sequence(&seq, Some(7), Some(2.0));
        assert!(text.contains("Instruction sequence for  7 = 111, cost:  2:"));
        assert!(text.contains("r[1] = <initial value>"));
        assert!(text.contains("r[n] = r[1] << 3;"));
        assert!(text.contains("r[n] = r[n] - r[1];"));
        // Running product column ends at the multiplier.
        assert!(text.contains("        7: "));
    }

    #[test]
    fn test_bin2str() {
        assert_eq!(bin2str(7), "111");
        assert_eq!(bin2str(-6), "-110");
        assert_eq!(bin2str(0), "0");
    }
}
