mod codegen;
mod labels;

pub use codegen::{STACK_BASE, Translator};
pub use labels::{ComparisonLabels, LabelGenerator};

use crate::Error;
use crate::hack::Instruction;
use crate::vm::parse_line;

/// One translation unit: a named sequence of already-trimmed, non-empty,
/// non-comment VM command lines. The name scopes the unit's `static` cells.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub name: String,
    pub lines: Vec<String>,
}

impl SourceUnit {
    /// Builds a unit from raw source text, stripping `//` comments and blank
    /// lines the way the file driver does.
    #[must_use]
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| {
                line.split_once("//")
                    .map_or(line, |(code, _)| code)
                    .trim()
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .collect();
        Self {
            name: name.into(),
            lines,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Emit the stack-initialization + `call Sys.init 0` prologue before any
    /// unit's code.
    pub bootstrap: bool,
}

/// A line that failed to translate. The line produced no output; translation
/// continued with the next one.
#[derive(Debug)]
pub struct Diagnostic {
    pub unit: String,
    pub line: String,
    pub error: Error,
}

#[derive(Debug)]
pub struct TranslatedProgram {
    pub instructions: Vec<Instruction>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TranslatedProgram {
    /// Renders the program as assembly text lines, in emission order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.instructions.iter().map(ToString::to_string).collect()
    }
}

/// Translates a complete program: the optional bootstrap sequence followed by
/// every unit's commands in the given order, all through one [`Translator`]
/// so generated labels stay unique across unit boundaries.
///
/// Translation failures are per-line: a failing line yields a [`Diagnostic`]
/// and no output, and the run continues.
#[must_use]
pub fn translate_program(units: &[SourceUnit], options: &TranslateOptions) -> TranslatedProgram {
    let mut translator = Translator::new();
    let mut instructions = Vec::new();
    let mut diagnostics = Vec::new();

    if options.bootstrap {
        instructions.extend(translator.bootstrap());
    }

    for unit in units {
        tracing::debug!(unit = %unit.name, lines = unit.lines.len(), "translating unit");
        translator.set_unit(&unit.name);
        for line in &unit.lines {
            match parse_line(line).and_then(|command| translator.translate(&command)) {
                Ok(expansion) => instructions.extend(expansion),
                Err(error) => {
                    tracing::warn!(unit = %unit.name, "skipping `{line}`: {error}");
                    diagnostics.push(Diagnostic {
                        unit: unit.name.clone(),
                        line: line.clone(),
                        error,
                    });
                }
            }
        }
    }

    TranslatedProgram {
        instructions,
        diagnostics,
    }
}
