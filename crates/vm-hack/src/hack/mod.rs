mod instruction;

pub use instruction::{Comp, Dest, Instruction, Jump, Register, Target};
