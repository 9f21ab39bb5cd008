pub mod binary_method;
pub mod cache;
pub mod cpu;
pub mod error;
pub mod instruction;
pub mod io;
pub mod mult;
pub mod search_methods;

// Re-exports: the public vocabulary used by the CLI and tests
pub use cache::{CacheEntry, MultCache};
pub use cpu::{
    Cost, CpuProfile, InstructionType, OpCosts, ADD_SUBTRACT, CHAINED_ADDS, DEFAULT_PROFILE,
    INF_COST, RISC_EQUAL_TIME,
};
pub use error::Error;
pub use instruction::{
    check_sequence_cost, check_sequence_value, format_sequence, parse_instruction, parse_sequence,
    sequence_cost, sequence_to_string, sequence_value, Instruction, Op, Operand,
};
pub use mult::{MultSearch, SearchMethod};
