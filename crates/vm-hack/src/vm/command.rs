/// A VM memory segment with its addressing mode.
///
/// `Local`, `Argument`, `This` and `That` are reached through one indirection
/// via their base-pointer cells. `Temp` and `Pointer` are fixed physical
/// cells, `Static` is a per-unit named cell, and `Constant` is an immediate
/// value rather than storage: it is valid for `push` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
}

impl Segment {
    /// `true` for the four segments addressed through a base-pointer cell.
    #[must_use]
    pub const fn is_indirect(self) -> bool {
        matches!(self, Self::Local | Self::Argument | Self::This | Self::That)
    }
}

/// Arithmetic, logical and comparison commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

/// One VM command, as produced by [`parse_line`](crate::vm::parse_line).
///
/// The variant set is closed: the translator matches it exhaustively, so an
/// unhandled command is a compile error rather than silently empty output.
/// `Pop(Segment::Constant, _)` is never constructed by the parser and is
/// rejected by the code generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(ArithmeticOp),
    Label(String),
    Goto(String),
    IfGoto(String),
    Call(String, u16),
    Function(String, u16),
    Return,
}
