#![allow(
    clippy::cast_possible_truncation // intentional: indices are range-checked to 15 bits before narrowing
)]

pub mod error;
pub mod hack;
pub mod translate;
pub mod vm;

/// Test harness module for writing unit and integration tests.
///
/// This module is only available when running tests or when the
/// `test-harness` feature is enabled.
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use error::{Error, Result};
pub use hack::Instruction;
pub use translate::{
    SourceUnit, TranslateOptions, TranslatedProgram, Translator, translate_program,
};
pub use vm::{ArithmeticOp, Command, Segment, parse_line};
