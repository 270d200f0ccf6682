use super::{ArithmeticOp, Command, Segment};
use crate::{Error, Result};

/// Largest value an A-instruction can load.
const MAX_CONSTANT: u32 = 32767;
const MAX_TEMP_INDEX: u32 = 7;
const MAX_POINTER_INDEX: u32 = 1;
/// Stack words a `call` pushes besides the arguments: the return address and
/// the four saved segment bases.
const FRAME_WORDS: u32 = 5;

/// Prefixes of internally generated labels. A user symbol shaped like
/// `<prefix><digits>` would collide with generated control flow, so the
/// parser rejects exactly that shape (`RETURN_VALUE` stays legal).
const RESERVED_PREFIXES: [&str; 3] = ["RETURN_", "TRUE_", "END_"];

/// Parses one already-trimmed, non-empty, non-comment VM line.
///
/// All operand validation happens here: arity, numeric indices, segment
/// ranges, `pop constant`, and symbol well-formedness, so downstream code
/// only ever sees constructible [`Command`] values.
pub fn parse_line(line: &str) -> Result<Command> {
    let mut tokens = line.split_whitespace();
    let Some(mnemonic) = tokens.next() else {
        return Err(Error::UnknownCommand(line.to_string()));
    };
    let operands: Vec<&str> = tokens.collect();

    match mnemonic {
        "push" | "pop" => {
            check_arity(line, &operands, 2)?;
            let segment = parse_segment(line, operands[0])?;
            let index = parse_index(line, operands[1])?;
            check_segment_range(line, segment, index)?;
            if mnemonic == "push" {
                Ok(Command::Push(segment, index))
            } else if segment == Segment::Constant {
                Err(Error::InvalidOperand(format!(
                    "`{line}`: constant is not a valid pop target"
                )))
            } else {
                Ok(Command::Pop(segment, index))
            }
        }
        "add" | "sub" | "neg" | "eq" | "gt" | "lt" | "and" | "or" | "not" => {
            check_arity(line, &operands, 0)?;
            let op = match mnemonic {
                "add" => ArithmeticOp::Add,
                "sub" => ArithmeticOp::Sub,
                "neg" => ArithmeticOp::Neg,
                "eq" => ArithmeticOp::Eq,
                "gt" => ArithmeticOp::Gt,
                "lt" => ArithmeticOp::Lt,
                "and" => ArithmeticOp::And,
                "or" => ArithmeticOp::Or,
                _ => ArithmeticOp::Not,
            };
            Ok(Command::Arithmetic(op))
        }
        "label" | "goto" | "if-goto" => {
            check_arity(line, &operands, 1)?;
            let name = parse_symbol(line, operands[0])?;
            Ok(match mnemonic {
                "label" => Command::Label(name),
                "goto" => Command::Goto(name),
                _ => Command::IfGoto(name),
            })
        }
        "call" => {
            check_arity(line, &operands, 2)?;
            let function = parse_symbol(line, operands[0])?;
            let args = parse_index(line, operands[1])?;
            if u32::from(args) > MAX_CONSTANT - FRAME_WORDS {
                return Err(Error::InvalidOperand(format!(
                    "`{line}`: argument count {args} exceeds {}",
                    MAX_CONSTANT - FRAME_WORDS
                )));
            }
            Ok(Command::Call(function, args))
        }
        "function" => {
            check_arity(line, &operands, 2)?;
            let function = parse_symbol(line, operands[0])?;
            let locals = parse_index(line, operands[1])?;
            Ok(Command::Function(function, locals))
        }
        "return" => {
            check_arity(line, &operands, 0)?;
            Ok(Command::Return)
        }
        _ => Err(Error::UnknownCommand(line.to_string())),
    }
}

fn check_arity(line: &str, operands: &[&str], expected: usize) -> Result<()> {
    if operands.len() == expected {
        Ok(())
    } else {
        Err(Error::InvalidOperand(format!(
            "`{line}`: expected {expected} operand(s), got {}",
            operands.len()
        )))
    }
}

fn parse_segment(line: &str, token: &str) -> Result<Segment> {
    match token {
        "constant" => Ok(Segment::Constant),
        "local" => Ok(Segment::Local),
        "argument" => Ok(Segment::Argument),
        "this" => Ok(Segment::This),
        "that" => Ok(Segment::That),
        "temp" => Ok(Segment::Temp),
        "pointer" => Ok(Segment::Pointer),
        "static" => Ok(Segment::Static),
        _ => Err(Error::InvalidOperand(format!(
            "`{line}`: unknown segment `{token}`"
        ))),
    }
}

fn parse_index(line: &str, token: &str) -> Result<u16> {
    let value: u32 = token
        .parse()
        .map_err(|_| Error::MalformedIndex(format!("`{token}` in `{line}`")))?;
    if value > MAX_CONSTANT {
        return Err(Error::InvalidOperand(format!(
            "`{line}`: index {value} exceeds {MAX_CONSTANT}"
        )));
    }
    Ok(value as u16)
}

fn check_segment_range(line: &str, segment: Segment, index: u16) -> Result<()> {
    let limit = match segment {
        Segment::Temp => MAX_TEMP_INDEX,
        Segment::Pointer => MAX_POINTER_INDEX,
        _ => return Ok(()),
    };
    if u32::from(index) > limit {
        return Err(Error::InvalidOperand(format!(
            "`{line}`: {segment} index must be at most {limit}"
        )));
    }
    Ok(())
}

fn parse_symbol(line: &str, token: &str) -> Result<String> {
    let mut chars = token.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || "_.$:".contains(c));
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || "_.$:".contains(c));
    if !head_ok || !tail_ok {
        return Err(Error::InvalidOperand(format!(
            "`{line}`: `{token}` is not a valid symbol"
        )));
    }
    if is_reserved(token) {
        return Err(Error::InvalidOperand(format!(
            "`{line}`: `{token}` collides with the generated label namespace"
        )));
    }
    Ok(token.to_string())
}

fn is_reserved(name: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_and_pop() {
        assert_eq!(
            parse_line("push constant 7").unwrap(),
            Command::Push(Segment::Constant, 7)
        );
        assert_eq!(
            parse_line("pop that 5").unwrap(),
            Command::Pop(Segment::That, 5)
        );
        assert_eq!(
            parse_line("push temp 7").unwrap(),
            Command::Push(Segment::Temp, 7)
        );
        assert_eq!(
            parse_line("pop pointer 1").unwrap(),
            Command::Pop(Segment::Pointer, 1)
        );
    }

    #[test]
    fn test_parse_control_flow() {
        assert_eq!(
            parse_line("label LOOP").unwrap(),
            Command::Label("LOOP".to_string())
        );
        assert_eq!(
            parse_line("if-goto LOOP").unwrap(),
            Command::IfGoto("LOOP".to_string())
        );
        assert_eq!(
            parse_line("call Sys.init 0").unwrap(),
            Command::Call("Sys.init".to_string(), 0)
        );
        assert_eq!(
            parse_line("function Main.fib 2").unwrap(),
            Command::Function("Main.fib".to_string(), 2)
        );
        assert_eq!(parse_line("return").unwrap(), Command::Return);
    }

    #[test]
    fn test_pop_constant_is_invalid() {
        let err = parse_line("pop constant 0").unwrap_err();
        assert!(matches!(err, Error::InvalidOperand(_)), "got {err:?}");
    }

    #[test]
    fn test_out_of_range_indices() {
        assert!(matches!(
            parse_line("push temp 8").unwrap_err(),
            Error::InvalidOperand(_)
        ));
        assert!(matches!(
            parse_line("push pointer 2").unwrap_err(),
            Error::InvalidOperand(_)
        ));
        assert!(matches!(
            parse_line("push constant 32768").unwrap_err(),
            Error::InvalidOperand(_)
        ));
    }

    #[test]
    fn test_malformed_index() {
        assert!(matches!(
            parse_line("push local abc").unwrap_err(),
            Error::MalformedIndex(_)
        ));
        assert!(matches!(
            parse_line("push constant -1").unwrap_err(),
            Error::MalformedIndex(_)
        ));
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = parse_line("frobnicate local 1").unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(_)), "got {err:?}");
    }

    #[test]
    fn test_wrong_arity() {
        assert!(matches!(
            parse_line("push constant").unwrap_err(),
            Error::InvalidOperand(_)
        ));
        assert!(matches!(
            parse_line("add 1").unwrap_err(),
            Error::InvalidOperand(_)
        ));
        assert!(matches!(
            parse_line("return now").unwrap_err(),
            Error::InvalidOperand(_)
        ));
    }

    #[test]
    fn test_reserved_label_shapes_rejected() {
        assert!(matches!(
            parse_line("label TRUE_3").unwrap_err(),
            Error::InvalidOperand(_)
        ));
        assert!(matches!(
            parse_line("goto RETURN_0").unwrap_err(),
            Error::InvalidOperand(_)
        ));
        // Only the exact <prefix><digits> shape collides.
        assert!(parse_line("label TRUE_BRANCH").is_ok());
        assert!(parse_line("label RETURN_VALUE").is_ok());
        assert!(parse_line("label END_12X").is_ok());
    }
}
