//! The bootstrap prologue: stack initialization plus `call Sys.init 0`.

use vm_hack::hack::Register;
use vm_hack::test_harness::*;
use vm_hack::{SourceUnit, TranslateOptions, Translator, translate_program};

#[test]
fn test_bootstrap_initializes_stack_then_calls_sys_init() {
    let mut translator = Translator::new();
    let out = render(&translator.bootstrap());
    assert_eq!(out[..4], ["@256", "D=A", "@SP", "M=D"].map(String::from));
    assert!(out.contains(&"@Sys.init".to_string()));
    assert_eq!(out.last().unwrap(), "(RETURN_0)");
}

#[test]
fn test_bootstrap_shares_the_call_counter() {
    let mut translator = Translator::new();
    let bootstrap = render(&translator.bootstrap());
    let call = render(&translator.call("Main.main", 0));
    assert!(bootstrap.contains(&"(RETURN_0)".to_string()));
    assert!(call.contains(&"(RETURN_1)".to_string()));
}

#[test]
fn test_program_with_no_calls_still_gets_one_sys_init_call() {
    let unit = SourceUnit::from_text(
        "Sys",
        "function Sys.init 0\npush constant 12\npush constant 30\nadd\npop temp 0\nlabel HALT\ngoto HALT",
    );
    let program = translate_program(&[unit], &TranslateOptions { bootstrap: true });
    let lines = program.lines();

    // Bootstrap comes first, before any unit code.
    assert_eq!(lines[..4], ["@256", "D=A", "@SP", "M=D"].map(String::from));
    assert_eq!(lines.iter().filter(|l| *l == "@Sys.init").count(), 1);
    assert_eq!(lines.iter().filter(|l| *l == "(RETURN_0)").count(), 1);
    assert!(!lines.contains(&"(RETURN_1)".to_string()));

    // And the whole program actually runs.
    let mut machine = Machine::new(&program.instructions);
    machine.run(10_000);
    assert_eq!(machine.ram(5), 42);
    // SP sits above the Sys.init frame: 256 + 5 pushed frame words.
    assert_eq!(machine.sp(), 261);
    assert_eq!(machine.base(Register::Arg), 256);
}

#[test]
fn test_bootstrap_is_not_emitted_by_default() {
    let unit = SourceUnit::from_text("Main", "push constant 1");
    let program = translate_program(&[unit], &TranslateOptions::default());
    assert_eq!(program.lines()[0], "@1");
}
