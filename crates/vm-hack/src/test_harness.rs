//! Test harness for vm-hack unit and integration tests.
//!
//! Provides helpers for translating VM text plus a minimal interpreter for
//! the target machine, so tests can assert on the *semantics* of generated
//! assembly (stack-pointer discipline, frame round-trips) instead of only on
//! its text. The interpreter resolves symbols the way an assembler would:
//! labels become instruction addresses, unknown symbols become variable
//! cells allocated from RAM 16 upward.
//!
//! This module is only available when running tests (`#[cfg(test)]`) or with
//! the `test-harness` feature.

#![allow(
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]

use std::collections::HashMap;

use crate::hack::{Comp, Dest, Instruction, Jump, Register, Target};
use crate::translate::Translator;
use crate::vm::parse_line;

/// Parse and translate every line of `text` with `translator`, panicking on
/// the first error. Lines are trimmed; `//` comments and blanks are skipped.
pub fn translate_text(translator: &mut Translator, text: &str) -> Vec<Instruction> {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.split_once("//").map_or(line, |(code, _)| code).trim();
        if line.is_empty() {
            continue;
        }
        let command = parse_line(line).expect("parse");
        out.extend(translator.translate(&command).expect("translate"));
    }
    out
}

/// Render instructions to their textual assembly lines.
pub fn render(instructions: &[Instruction]) -> Vec<String> {
    instructions.iter().map(ToString::to_string).collect()
}

const RAM_SIZE: usize = 32768;
/// Where symbols that are neither labels nor predefined registers (static
/// cells) get allocated.
const FIRST_VARIABLE: i16 = 16;

#[derive(Debug, Clone, Copy)]
enum MachineOp {
    Load(i16),
    Compute {
        dest: Option<Dest>,
        comp: Comp,
        jump: Option<Jump>,
    },
}

/// A minimal interpreter for the 16-bit target machine.
#[derive(Debug)]
pub struct Machine {
    ram: Vec<i16>,
    a: i16,
    d: i16,
    pc: usize,
    rom: Vec<MachineOp>,
}

impl Machine {
    pub fn new(instructions: &[Instruction]) -> Self {
        // First pass: label definitions. Labels occupy no instruction slot.
        let mut labels: HashMap<&str, usize> = HashMap::new();
        let mut slot = 0usize;
        for instruction in instructions {
            match instruction {
                Instruction::Label(name) => {
                    labels.insert(name, slot);
                }
                _ => slot += 1,
            }
        }

        // Second pass: resolve A-targets to load values.
        let mut variables: HashMap<&str, i16> = HashMap::new();
        let mut next_variable = FIRST_VARIABLE;
        let mut rom = Vec::with_capacity(slot);
        for instruction in instructions {
            match instruction {
                Instruction::Label(_) => {}
                Instruction::A(target) => {
                    let value = match target {
                        Target::Constant(value) => *value as i16,
                        Target::Register(register) => register.address() as i16,
                        Target::Symbol(name) => match labels.get(name.as_str()) {
                            Some(index) => *index as i16,
                            None => *variables.entry(name).or_insert_with(|| {
                                let address = next_variable;
                                next_variable += 1;
                                address
                            }),
                        },
                    };
                    rom.push(MachineOp::Load(value));
                }
                Instruction::C { dest, comp, jump } => {
                    rom.push(MachineOp::Compute {
                        dest: *dest,
                        comp: *comp,
                        jump: *jump,
                    });
                }
            }
        }

        Self {
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
            rom,
        }
    }

    pub fn ram(&self, address: u16) -> i16 {
        self.ram[address as usize]
    }

    pub fn set_ram(&mut self, address: u16, value: i16) {
        self.ram[address as usize] = value;
    }

    pub fn sp(&self) -> i16 {
        self.base(Register::Sp)
    }

    pub fn base(&self, register: Register) -> i16 {
        self.ram[register.address() as usize]
    }

    /// Primes `SP`, `LCL`, `ARG`, `THIS` and `THAT` in one call.
    pub fn set_bases(&mut self, sp: i16, lcl: i16, arg: i16, this: i16, that: i16) {
        self.ram[Register::Sp.address() as usize] = sp;
        self.ram[Register::Lcl.address() as usize] = lcl;
        self.ram[Register::Arg.address() as usize] = arg;
        self.ram[Register::This.address() as usize] = this;
        self.ram[Register::That.address() as usize] = that;
    }

    /// Executes one instruction. Returns `false` once the program counter has
    /// run off the end of the program.
    pub fn step(&mut self) -> bool {
        let Some(op) = self.rom.get(self.pc).copied() else {
            return false;
        };
        match op {
            MachineOp::Load(value) => {
                self.a = value;
                self.pc += 1;
            }
            MachineOp::Compute { dest, comp, jump } => {
                let address = (self.a as u16 as usize) % RAM_SIZE;
                let result = eval(comp, self.a, self.d, self.ram[address]);
                if let Some(dest) = dest {
                    if dest.writes_m() {
                        self.ram[address] = result;
                    }
                    if dest.writes_a() {
                        self.a = result;
                    }
                    if dest.writes_d() {
                        self.d = result;
                    }
                }
                if jump.is_some_and(|jump| jump_taken(jump, result)) {
                    self.pc = self.a as u16 as usize;
                } else {
                    self.pc += 1;
                }
            }
        }
        true
    }

    /// Executes until the program counter runs off the end or `max_steps` is
    /// reached (programs that halt in a tight loop never run off the end).
    /// Returns the number of steps executed.
    pub fn run(&mut self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && self.step() {
            steps += 1;
        }
        steps
    }
}

fn eval(comp: Comp, a: i16, d: i16, m: i16) -> i16 {
    match comp {
        Comp::Zero => 0,
        Comp::One => 1,
        Comp::NegOne => -1,
        Comp::D => d,
        Comp::A => a,
        Comp::M => m,
        Comp::NotD => !d,
        Comp::NotA => !a,
        Comp::NotM => !m,
        Comp::NegD => d.wrapping_neg(),
        Comp::NegA => a.wrapping_neg(),
        Comp::NegM => m.wrapping_neg(),
        Comp::DPlusOne => d.wrapping_add(1),
        Comp::APlusOne => a.wrapping_add(1),
        Comp::MPlusOne => m.wrapping_add(1),
        Comp::DMinusOne => d.wrapping_sub(1),
        Comp::AMinusOne => a.wrapping_sub(1),
        Comp::MMinusOne => m.wrapping_sub(1),
        Comp::DPlusA => d.wrapping_add(a),
        Comp::DPlusM => d.wrapping_add(m),
        Comp::DMinusA => d.wrapping_sub(a),
        Comp::DMinusM => d.wrapping_sub(m),
        Comp::AMinusD => a.wrapping_sub(d),
        Comp::MMinusD => m.wrapping_sub(d),
        Comp::DAndA => d & a,
        Comp::DAndM => d & m,
        Comp::DOrA => d | a,
        Comp::DOrM => d | m,
    }
}

fn jump_taken(jump: Jump, value: i16) -> bool {
    match jump {
        Jump::Jgt => value > 0,
        Jump::Jeq => value == 0,
        Jump::Jge => value >= 0,
        Jump::Jlt => value < 0,
        Jump::Jne => value != 0,
        Jump::Jle => value <= 0,
        Jump::Jmp => true,
    }
}
