//! Arithmetic, logical and comparison translation.

use vm_hack::test_harness::*;
use vm_hack::{ArithmeticOp, Translator};

#[test]
fn test_binary_ops_reduce_depth_by_one() {
    let mut translator = Translator::new();
    for op in [
        ArithmeticOp::Add,
        ArithmeticOp::Sub,
        ArithmeticOp::And,
        ArithmeticOp::Or,
    ] {
        let out = render(&translator.arithmetic(op));
        // Two decrements, one increment: net one slot off the stack.
        let down = out.iter().filter(|l| *l == "M=M-1").count();
        let up = out.iter().filter(|l| *l == "M=M+1").count();
        assert_eq!((down, up), (2, 1), "{op:?}");
    }
}

#[test]
fn test_binary_op_operator_lines() {
    let mut translator = Translator::new();
    let add = render(&translator.arithmetic(ArithmeticOp::Add));
    assert!(add.contains(&"M=D+M".to_string()));
    let sub = render(&translator.arithmetic(ArithmeticOp::Sub));
    assert!(sub.contains(&"M=M-D".to_string()));
    let and = render(&translator.arithmetic(ArithmeticOp::And));
    assert!(and.contains(&"M=D&M".to_string()));
    let or = render(&translator.arithmetic(ArithmeticOp::Or));
    assert!(or.contains(&"M=D|M".to_string()));
}

#[test]
fn test_unary_ops_keep_depth() {
    let mut translator = Translator::new();
    let neg = render(&translator.arithmetic(ArithmeticOp::Neg));
    assert_eq!(neg, ["@SP", "M=M-1", "A=M", "M=-M", "@SP", "M=M+1"]);
    let not = render(&translator.arithmetic(ArithmeticOp::Not));
    assert_eq!(not, ["@SP", "M=M-1", "A=M", "M=!M", "@SP", "M=M+1"]);
}

#[test]
fn test_comparisons_allocate_fresh_label_pairs() {
    let mut translator = Translator::new();
    let first = render(&translator.arithmetic(ArithmeticOp::Eq));
    let second = render(&translator.arithmetic(ArithmeticOp::Eq));
    assert!(first.contains(&"(TRUE_0)".to_string()));
    assert!(first.contains(&"(END_0)".to_string()));
    assert!(second.contains(&"(TRUE_1)".to_string()));
    assert!(second.contains(&"(END_1)".to_string()));
    // Re-emitting the same source form must never reuse a label.
    assert!(!second.contains(&"(TRUE_0)".to_string()));
}

#[test]
fn test_comparison_jump_conditions() {
    let mut translator = Translator::new();
    let eq = render(&translator.arithmetic(ArithmeticOp::Eq));
    assert!(eq.contains(&"D;JEQ".to_string()));
    let gt = render(&translator.arithmetic(ArithmeticOp::Gt));
    assert!(gt.contains(&"D;JGT".to_string()));
    let lt = render(&translator.arithmetic(ArithmeticOp::Lt));
    assert!(lt.contains(&"D;JLT".to_string()));
}

#[test]
fn test_comparison_truth_values_on_machine() {
    for (program, expected) in [
        ("push constant 4\npush constant 4\neq", -1),
        ("push constant 4\npush constant 5\neq", 0),
        ("push constant 9\npush constant 5\ngt", -1),
        ("push constant 5\npush constant 9\ngt", 0),
        ("push constant 5\npush constant 9\nlt", -1),
        ("push constant 9\npush constant 5\nlt", 0),
    ] {
        let mut translator = Translator::new();
        let instructions = translate_text(&mut translator, program);
        let mut machine = Machine::new(&instructions);
        machine.set_bases(256, 300, 400, 3000, 3010);
        machine.run(1_000);
        assert_eq!(machine.ram(256), expected, "{program}");
        assert_eq!(machine.sp(), 257, "{program}");
    }
}

#[test]
fn test_neg_and_not_on_machine() {
    let mut translator = Translator::new();
    let instructions = translate_text(&mut translator, "push constant 21\nneg");
    let mut machine = Machine::new(&instructions);
    machine.set_bases(256, 300, 400, 3000, 3010);
    machine.run(1_000);
    assert_eq!(machine.ram(256), -21);
    assert_eq!(machine.sp(), 257);

    let mut translator = Translator::new();
    let instructions = translate_text(&mut translator, "push constant 0\nnot");
    let mut machine = Machine::new(&instructions);
    machine.set_bases(256, 300, 400, 3000, 3010);
    machine.run(1_000);
    assert_eq!(machine.ram(256), -1);
}

#[test]
fn test_comparison_then_branch_sequence_order() {
    // function Main.fib 0; push argument 0; push constant 1; eq; if-goto BASE
    let mut translator = Translator::new();
    let out = render(&translate_text(
        &mut translator,
        "function Main.fib 0\npush argument 0\npush constant 1\neq\nif-goto BASE",
    ));
    assert_eq!(out[0], "(Main.fib)");
    let fetch = out.iter().position(|l| l == "@ARG").unwrap();
    let push_one = out.iter().position(|l| l == "@1").unwrap();
    let compare = out.iter().position(|l| l == "@TRUE_0").unwrap();
    let end_label = out.iter().position(|l| l == "(END_0)").unwrap();
    let branch = out.iter().position(|l| l == "@BASE").unwrap();
    assert!(fetch < push_one && push_one < compare && compare < end_label && end_label < branch);
    assert_eq!(out[branch + 1], "D;JNE");
    // The conditional branch pops unconditionally first.
    assert_eq!(out[branch - 2..branch], ["A=M".to_string(), "D=M".to_string()]);
}
