use crate::instruction::Op;

/// Instruction-sequence costs. Infinity stands in both for "operation
/// unavailable in this profile" and for "no known upper bound".
pub type Cost = f64;

pub const INF_COST: Cost = f64::INFINITY;

/// Do instructions allow up to 3 operands or 2?
///
/// Two-address instructions are of the form `reg op= operand`, for
/// example `r1 += r2`. Three-address instructions are of the form
/// `reg = operand1 op operand2`, for example `r1 = r2 + r3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionType {
    TwoAddress,
    ThreeAddress,
}

/// Per-operation costs of a profile. An `INF_COST` entry means the
/// operation is not available. Note that:
/// - a shift of one place can be simulated by a doubling add:
///   `r1 << 1 == r1 + r1`
/// - `zero` can be simulated via `r1 - r1` when subtract exists
/// - `nop` stands for the initial register already holding the input
///   value, which is why its cost is (and must be) 0
///
/// `eps` is not an operation: it is the sub-unit nudge used to let
/// specific rewrites win exact cost ties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpCosts {
    pub add: Cost,
    pub copy: Cost,
    pub eps: Cost,
    pub negate: Cost,
    pub nop: Cost,
    pub shift: Cost,
    pub subtract: Cost,
    pub zero: Cost,
}

/// A CPU profile: which operations exist, what they cost, and how
/// many temporary registers the sequence may use.
///
/// Three registers allow negation by reversing a subtraction's
/// operands: `r1 = r0 - r1` is the negative of `r1 = r1 - r0`.
#[derive(Clone, Copy, Debug)]
pub struct CpuProfile {
    pub name: &'static str,
    pub instruction_type: InstructionType,
    pub max_registers: u32,
    pub costs: OpCosts,
    /// Cost of a shift as a function of the shift amount. Machines
    /// that only shift one place at a time pay per place.
    pub shift_cost: fn(u32) -> Cost,
}

impl CpuProfile {
    pub fn can_subtract(&self) -> bool {
        self.costs.subtract.is_finite()
    }

    pub fn subtract_can_negate(&self) -> bool {
        self.can_subtract() && self.max_registers > 2
    }

    pub fn can_negate(&self) -> bool {
        self.costs.negate.is_finite() || self.subtract_can_negate()
    }

    pub fn has_true_shift(&self) -> bool {
        self.costs.shift.is_finite()
    }

    pub fn can_zero(&self) -> bool {
        self.can_negate() || self.costs.zero.is_finite()
    }

    pub fn eps(&self) -> Cost {
        self.costs.eps
    }

    pub fn shift_cost(&self, amount: u32) -> Cost {
        (self.shift_cost)(amount)
    }

    /// The cost of one instruction under this profile.
    pub fn op_cost(&self, op: Op) -> Cost {
        match op {
            Op::Nop => self.costs.nop,
            Op::Zero => self.costs.zero,
            Op::Negate => self.costs.negate,
            Op::Shift(amount) => self.shift_cost(amount),
            Op::Add(_) => self.costs.add,
            Op::Subtract(_) => self.costs.subtract,
        }
    }
}

fn flat_shift_cost(_amount: u32) -> Cost {
    1.0
}

fn per_place_shift_cost(amount: u32) -> Cost {
    amount as Cost
}

/// Classic RISC where every operation takes one cycle.
pub const RISC_EQUAL_TIME: CpuProfile = CpuProfile {
    name: "POWER 3-address, 3-register",
    instruction_type: InstructionType::ThreeAddress,
    max_registers: 3,
    costs: OpCosts {
        add: 1.0,
        copy: 1.0,
        eps: 0.1,
        negate: 1.0,
        nop: 0.0,
        shift: 1.0,
        subtract: 1.0,
        zero: 1.0,
    },
    shift_cost: flat_shift_cost,
};

/// Addition chains: "add" and "copy" only. A shift of s places is s
/// doubling adds.
pub const CHAINED_ADDS: CpuProfile = CpuProfile {
    name: "chained adds",
    instruction_type: InstructionType::TwoAddress,
    max_registers: 3,
    costs: OpCosts {
        add: 1.0,
        copy: 1.0,
        eps: 0.1,
        negate: INF_COST,
        nop: 0.0,
        shift: INF_COST,
        subtract: INF_COST,
        zero: INF_COST,
    },
    shift_cost: per_place_shift_cost,
};

/// Add and subtract but no negate instruction; negation is only
/// reachable by reversing a subtraction.
pub const ADD_SUBTRACT: CpuProfile = CpuProfile {
    name: "add_subtract",
    instruction_type: InstructionType::ThreeAddress,
    max_registers: 3,
    costs: OpCosts {
        add: 1.0,
        copy: 1.0,
        eps: 0.1,
        negate: INF_COST,
        nop: 0.0,
        shift: INF_COST,
        subtract: 1.0,
        zero: 1.0,
    },
    shift_cost: per_place_shift_cost,
};

pub const DEFAULT_PROFILE: CpuProfile = RISC_EQUAL_TIME;
