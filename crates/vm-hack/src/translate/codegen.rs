use crate::hack::{Comp, Dest, Instruction, Jump, Register};
use crate::vm::{ArithmeticOp, Command, Segment};
use crate::{Error, Result};

use super::labels::LabelGenerator;

/// First RAM cell of the runtime stack.
pub const STACK_BASE: u16 = 256;
/// First of the eight physical `temp` cells.
const TEMP_BASE: u16 = 5;
const MAX_TEMP_INDEX: u16 = 7;
/// Largest value an A-instruction can load.
const MAX_CONSTANT: u16 = 32767;
/// Stack words a `call` pushes besides the arguments: the return address and
/// the four saved segment bases.
const FRAME_WORDS: u16 = 5;

/// Translates VM commands into target-machine assembly.
///
/// One instance must serve a complete program translation run: its label
/// counters are what keep generated control-flow labels unique across unit
/// boundaries. `static` cells are named after the current unit, set with
/// [`set_unit`](Self::set_unit) (a fresh translator starts in unit `Main`).
#[derive(Debug)]
pub struct Translator {
    labels: LabelGenerator,
    unit: String,
}

impl Translator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            labels: LabelGenerator::new(),
            unit: "Main".to_string(),
        }
    }

    /// Sets the translation unit whose `static` cells subsequent commands
    /// refer to. Distinct units get distinct `<unit>.<i>` cells; that
    /// isolation is the point of the naming scheme.
    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Translates one command into its assembly expansion.
    ///
    /// The match is exhaustive over the closed [`Command`] type, so a command
    /// kind that silently produces no code cannot exist.
    pub fn translate(&mut self, command: &Command) -> Result<Vec<Instruction>> {
        match command {
            Command::Push(segment, index) => self.push(*segment, *index),
            Command::Pop(segment, index) => self.pop(*segment, *index),
            Command::Arithmetic(op) => Ok(self.arithmetic(*op)),
            Command::Label(name) => Ok(self.label(name)),
            Command::Goto(name) => Ok(self.goto(name)),
            Command::IfGoto(name) => Ok(self.if_goto(name)),
            Command::Call(function, args) => Ok(self.call(function, *args)),
            Command::Function(function, locals) => Ok(self.function(function, *locals)),
            Command::Return => Ok(self.ret()),
        }
    }

    /// `push <segment> <index>`: load the source value into `D`, store it at
    /// the stack top, increment the stack pointer.
    pub fn push(&self, segment: Segment, index: u16) -> Result<Vec<Instruction>> {
        let mut out = Vec::new();
        match segment {
            Segment::Constant => {
                check_constant(segment, index)?;
                push_constant(&mut out, index);
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                check_constant(segment, index)?;
                out.push(Instruction::constant(index));
                out.push(Instruction::assign(Dest::D, Comp::A));
                out.push(Instruction::register(base_register(segment)));
                out.push(Instruction::assign(Dest::A, Comp::DPlusM));
                out.push(Instruction::assign(Dest::D, Comp::M));
                push_d(&mut out);
            }
            Segment::Temp => {
                check_temp(index)?;
                // Physical cell, absolute address resolved at generation time.
                out.push(Instruction::constant(TEMP_BASE + index));
                out.push(Instruction::assign(Dest::D, Comp::M));
                push_d(&mut out);
            }
            Segment::Pointer => {
                out.push(Instruction::register(pointer_register(index)?));
                out.push(Instruction::assign(Dest::D, Comp::M));
                push_d(&mut out);
            }
            Segment::Static => {
                check_constant(segment, index)?;
                out.push(Instruction::symbol(self.static_symbol(index)));
                out.push(Instruction::assign(Dest::D, Comp::M));
                push_d(&mut out);
            }
        }
        Ok(out)
    }

    /// `pop <segment> <index>`: decrement the stack pointer, load the old top
    /// into `D`, store it at the destination. For indirect segments the
    /// destination address is computed first and pinned in `R13`, because
    /// computing it needs `D` before the pop overwrites it.
    pub fn pop(&self, segment: Segment, index: u16) -> Result<Vec<Instruction>> {
        let mut out = Vec::new();
        match segment {
            Segment::Constant => {
                return Err(Error::InvalidOperand(format!(
                    "`pop constant {index}`: constant is not a valid pop target"
                )));
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                check_constant(segment, index)?;
                out.push(Instruction::constant(index));
                out.push(Instruction::assign(Dest::D, Comp::A));
                out.push(Instruction::register(base_register(segment)));
                out.push(Instruction::assign(Dest::D, Comp::DPlusM));
                out.push(Instruction::register(Register::R13));
                out.push(Instruction::assign(Dest::M, Comp::D));
                pop_to_d(&mut out);
                out.push(Instruction::register(Register::R13));
                out.push(Instruction::assign(Dest::A, Comp::M));
                out.push(Instruction::assign(Dest::M, Comp::D));
            }
            Segment::Temp => {
                check_temp(index)?;
                pop_to_d(&mut out);
                out.push(Instruction::constant(TEMP_BASE + index));
                out.push(Instruction::assign(Dest::M, Comp::D));
            }
            Segment::Pointer => {
                let register = pointer_register(index)?;
                pop_to_d(&mut out);
                out.push(Instruction::register(register));
                out.push(Instruction::assign(Dest::M, Comp::D));
            }
            Segment::Static => {
                check_constant(segment, index)?;
                pop_to_d(&mut out);
                out.push(Instruction::symbol(self.static_symbol(index)));
                out.push(Instruction::assign(Dest::M, Comp::D));
            }
        }
        Ok(out)
    }

    /// Arithmetic, logical and comparison commands. Binary ops net one slot
    /// off the stack, unary ops leave the depth unchanged, comparisons write
    /// all-ones for true and zero for false.
    pub fn arithmetic(&mut self, op: ArithmeticOp) -> Vec<Instruction> {
        match op {
            ArithmeticOp::Add => binary_op(Comp::DPlusM),
            ArithmeticOp::Sub => binary_op(Comp::MMinusD),
            ArithmeticOp::And => binary_op(Comp::DAndM),
            ArithmeticOp::Or => binary_op(Comp::DOrM),
            ArithmeticOp::Neg => unary_op(Comp::NegM),
            ArithmeticOp::Not => unary_op(Comp::NotM),
            ArithmeticOp::Eq => self.comparison(Jump::Jeq),
            ArithmeticOp::Gt => self.comparison(Jump::Jgt),
            ArithmeticOp::Lt => self.comparison(Jump::Jlt),
        }
    }

    /// `label L`: a bare destination marker. Uniqueness across the program is
    /// the source's responsibility; names are emitted as-is.
    #[must_use]
    pub fn label(&self, name: &str) -> Vec<Instruction> {
        vec![Instruction::label(name)]
    }

    /// `goto L`: unconditional jump.
    #[must_use]
    pub fn goto(&self, name: &str) -> Vec<Instruction> {
        vec![
            Instruction::symbol(name),
            Instruction::branch(Comp::Zero, Jump::Jmp),
        ]
    }

    /// `if-goto L`: pop unconditionally, jump iff the popped value is
    /// non-zero.
    #[must_use]
    pub fn if_goto(&self, name: &str) -> Vec<Instruction> {
        let mut out = Vec::new();
        pop_to_d(&mut out);
        out.push(Instruction::symbol(name));
        out.push(Instruction::branch(Comp::D, Jump::Jne));
        out
    }

    /// `call f n`: push the return address and the caller's `LCL`, `ARG`,
    /// `THIS`, `THAT` (in that order, which `return` undoes in reverse),
    /// reposition `ARG` below the `n` pushed arguments, point `LCL` at the
    /// stack top, jump to `f`, and define the fresh return label.
    pub fn call(&mut self, function: &str, args: u16) -> Vec<Instruction> {
        debug_assert!(args <= MAX_CONSTANT - FRAME_WORDS);
        let return_label = self.labels.next_return();
        let mut out = Vec::new();
        out.push(Instruction::symbol(return_label.clone()));
        out.push(Instruction::assign(Dest::D, Comp::A));
        push_d(&mut out);
        for base in [Register::Lcl, Register::Arg, Register::This, Register::That] {
            out.push(Instruction::register(base));
            out.push(Instruction::assign(Dest::D, Comp::M));
            push_d(&mut out);
        }
        // ARG = SP - args - FRAME_WORDS
        out.push(Instruction::register(Register::Sp));
        out.push(Instruction::assign(Dest::D, Comp::M));
        out.push(Instruction::constant(args + FRAME_WORDS));
        out.push(Instruction::assign(Dest::D, Comp::DMinusA));
        out.push(Instruction::register(Register::Arg));
        out.push(Instruction::assign(Dest::M, Comp::D));
        // LCL = SP
        out.push(Instruction::register(Register::Sp));
        out.push(Instruction::assign(Dest::D, Comp::M));
        out.push(Instruction::register(Register::Lcl));
        out.push(Instruction::assign(Dest::M, Comp::D));
        out.push(Instruction::symbol(function));
        out.push(Instruction::branch(Comp::Zero, Jump::Jmp));
        out.push(Instruction::label(return_label));
        out
    }

    /// `function f k`: entry label plus `k` zero-initialized local slots.
    #[must_use]
    pub fn function(&self, function: &str, locals: u16) -> Vec<Instruction> {
        let mut out = vec![Instruction::label(function)];
        for _ in 0..locals {
            push_constant(&mut out, 0);
        }
        out
    }

    /// `return`: capture the frame base and the saved return address, move
    /// the return value into the caller's argument slot, reposition the stack
    /// pointer just above it, restore the four saved bases walking the frame
    /// downward, and jump to the return address.
    ///
    /// The return address is read into `R14` before anything is restored:
    /// for an argumentless call it lives in the cell `ARG` points at, and the
    /// return value relocation would overwrite it.
    #[must_use]
    pub fn ret(&self) -> Vec<Instruction> {
        let mut out = Vec::new();
        // R13 = frame = LCL
        out.push(Instruction::register(Register::Lcl));
        out.push(Instruction::assign(Dest::D, Comp::M));
        out.push(Instruction::register(Register::R13));
        out.push(Instruction::assign(Dest::M, Comp::D));
        // R14 = *(frame - FRAME_WORDS)
        out.push(Instruction::constant(FRAME_WORDS));
        out.push(Instruction::assign(Dest::A, Comp::DMinusA));
        out.push(Instruction::assign(Dest::D, Comp::M));
        out.push(Instruction::register(Register::R14));
        out.push(Instruction::assign(Dest::M, Comp::D));
        // *ARG = pop()
        pop_to_d(&mut out);
        out.push(Instruction::register(Register::Arg));
        out.push(Instruction::assign(Dest::A, Comp::M));
        out.push(Instruction::assign(Dest::M, Comp::D));
        // SP = ARG + 1
        out.push(Instruction::register(Register::Arg));
        out.push(Instruction::assign(Dest::D, Comp::MPlusOne));
        out.push(Instruction::register(Register::Sp));
        out.push(Instruction::assign(Dest::M, Comp::D));
        // restore THAT, THIS, ARG, LCL from frame-1 .. frame-4
        for base in [Register::That, Register::This, Register::Arg, Register::Lcl] {
            out.push(Instruction::register(Register::R13));
            out.push(Instruction::assign(Dest::D, Comp::MMinusOne));
            out.push(Instruction::assign(Dest::Am, Comp::D));
            out.push(Instruction::assign(Dest::D, Comp::M));
            out.push(Instruction::register(base));
            out.push(Instruction::assign(Dest::M, Comp::D));
        }
        // jump to the saved return address
        out.push(Instruction::register(Register::R14));
        out.push(Instruction::assign(Dest::A, Comp::M));
        out.push(Instruction::branch(Comp::Zero, Jump::Jmp));
        out
    }

    /// The fixed prologue of a complete program: point the stack pointer at
    /// the stack base, then `call Sys.init 0`. Uses the same label counters
    /// as ordinary calls, so the bootstrap return label can never collide
    /// with one generated later.
    pub fn bootstrap(&mut self) -> Vec<Instruction> {
        let mut out = vec![
            Instruction::constant(STACK_BASE),
            Instruction::assign(Dest::D, Comp::A),
            Instruction::register(Register::Sp),
            Instruction::assign(Dest::M, Comp::D),
        ];
        out.extend(self.call("Sys.init", 0));
        out
    }

    fn static_symbol(&self, index: u16) -> String {
        format!("{}.{index}", self.unit)
    }

    fn comparison(&mut self, condition: Jump) -> Vec<Instruction> {
        let labels = self.labels.next_comparison();
        let mut out = Vec::new();
        pop_to_d(&mut out);
        out.push(Instruction::register(Register::Sp));
        out.push(Instruction::assign(Dest::M, Comp::MMinusOne));
        out.push(Instruction::assign(Dest::A, Comp::M));
        out.push(Instruction::assign(Dest::D, Comp::MMinusD));
        out.push(Instruction::symbol(labels.if_true.clone()));
        out.push(Instruction::branch(Comp::D, condition));
        out.push(Instruction::register(Register::Sp));
        out.push(Instruction::assign(Dest::A, Comp::M));
        out.push(Instruction::assign(Dest::M, Comp::Zero));
        out.push(Instruction::symbol(labels.end.clone()));
        out.push(Instruction::branch(Comp::Zero, Jump::Jmp));
        out.push(Instruction::label(labels.if_true));
        out.push(Instruction::register(Register::Sp));
        out.push(Instruction::assign(Dest::A, Comp::M));
        out.push(Instruction::assign(Dest::M, Comp::NegOne));
        out.push(Instruction::label(labels.end));
        out.push(Instruction::register(Register::Sp));
        out.push(Instruction::assign(Dest::M, Comp::MPlusOne));
        out
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

/// Store `D` at the stack top and increment the stack pointer.
fn push_d(out: &mut Vec<Instruction>) {
    out.push(Instruction::register(Register::Sp));
    out.push(Instruction::assign(Dest::A, Comp::M));
    out.push(Instruction::assign(Dest::M, Comp::D));
    out.push(Instruction::register(Register::Sp));
    out.push(Instruction::assign(Dest::M, Comp::MPlusOne));
}

/// Decrement the stack pointer and load the old top into `D`.
fn pop_to_d(out: &mut Vec<Instruction>) {
    out.push(Instruction::register(Register::Sp));
    out.push(Instruction::assign(Dest::M, Comp::MMinusOne));
    out.push(Instruction::assign(Dest::A, Comp::M));
    out.push(Instruction::assign(Dest::D, Comp::M));
}

fn push_constant(out: &mut Vec<Instruction>, value: u16) {
    out.push(Instruction::constant(value));
    out.push(Instruction::assign(Dest::D, Comp::A));
    push_d(out);
}

fn binary_op(comp: Comp) -> Vec<Instruction> {
    let mut out = Vec::new();
    pop_to_d(&mut out);
    out.push(Instruction::register(Register::Sp));
    out.push(Instruction::assign(Dest::M, Comp::MMinusOne));
    out.push(Instruction::assign(Dest::A, Comp::M));
    out.push(Instruction::assign(Dest::M, comp));
    out.push(Instruction::register(Register::Sp));
    out.push(Instruction::assign(Dest::M, Comp::MPlusOne));
    out
}

fn unary_op(comp: Comp) -> Vec<Instruction> {
    vec![
        Instruction::register(Register::Sp),
        Instruction::assign(Dest::M, Comp::MMinusOne),
        Instruction::assign(Dest::A, Comp::M),
        Instruction::assign(Dest::M, comp),
        Instruction::register(Register::Sp),
        Instruction::assign(Dest::M, Comp::MPlusOne),
    ]
}

/// Base-pointer cell of an indirect segment. Callers guarantee `segment` is
/// one of the four indirect segments.
const fn base_register(segment: Segment) -> Register {
    match segment {
        Segment::Argument => Register::Arg,
        Segment::This => Register::This,
        Segment::That => Register::That,
        _ => Register::Lcl,
    }
}

fn pointer_register(index: u16) -> Result<Register> {
    match index {
        0 => Ok(Register::This),
        1 => Ok(Register::That),
        _ => Err(Error::InvalidOperand(format!(
            "pointer index must be 0 or 1, got {index}"
        ))),
    }
}

fn check_temp(index: u16) -> Result<()> {
    if index > MAX_TEMP_INDEX {
        return Err(Error::InvalidOperand(format!(
            "temp index must be at most {MAX_TEMP_INDEX}, got {index}"
        )));
    }
    Ok(())
}

fn check_constant(segment: Segment, index: u16) -> Result<()> {
    if index > MAX_CONSTANT {
        return Err(Error::InvalidOperand(format!(
            "{segment} index {index} exceeds {MAX_CONSTANT}"
        )));
    }
    Ok(())
}
