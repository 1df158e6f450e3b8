mod common;

use common::*;

fn eval(expr: &str) -> String {
    let output = run_main(&format!("tampilkan({expr});"));
    assert_eq!(output.len(), 1);
    output[0].clone()
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(eval("2+3*4"), "14");
    assert_eq!(eval("(2+3)*4"), "20");
    assert_eq!(eval("10 - 4 - 3"), "3");
}

#[test]
fn equal_tiers_associate_left_to_right() {
    assert_eq!(eval("2 ** 3 ** 2"), "64");
}

#[test]
fn division_is_always_fractional() {
    assert_eq!(eval("7 / 2"), "3.5");
    assert_eq!(eval("6 / 2"), "3.0");
    assert_eq!(eval("1.5 + 1"), "2.5");
}

#[test]
fn modulo_and_bitwise_operators() {
    assert_eq!(eval("7 % 3"), "1");
    assert_eq!(eval("1 << 4"), "16");
    assert_eq!(eval("6 & 3"), "2");
    assert_eq!(eval("6 | 3"), "7");
    assert_eq!(eval("1 + 2 & 3"), "3");
}

#[test]
fn keyword_comparisons() {
    assert_eq!(eval("1 adalah 1"), "benar");
    assert_eq!(eval("1 bukan 1"), "salah");
    assert_eq!(eval("2 >= 3"), "salah");
}

#[test]
fn relational_and_logical_operators_share_a_tier() {
    // Reads as (benar || salah) == salah.
    assert_eq!(eval("benar || salah == salah"), "salah");
    assert_eq!(eval("(1 + 1) == 2 && benar"), "benar");
}

#[test]
fn relational_operators_bind_tighter_than_arithmetic() {
    let program = compile(&in_main("tampilkan(1 + 1 == 2);"));
    assert!(contains_sequence(
        &program.code,
        &[
            Instruction::LoadConst(Value::Int(1)),
            Instruction::LoadConst(Value::Int(1)),
            Instruction::LoadConst(Value::Int(2)),
            Instruction::Compare(CompareOp::Eq),
            Instruction::Binary(BinaryOp::Add),
        ]
    ));

    // 1 + (1 == 2) adds a boolean to a number.
    let mut vm = Vm::new(program);
    assert_eq!(vm.run(), Err(VmError::TypeMismatch("number")));
}

#[test]
fn string_concatenation() {
    assert_eq!(eval("\"ab\" + 'cd'"), "abcd");
}

#[test]
fn print_joins_its_arguments() {
    assert_eq!(eval("\"x=\", 5, \" \", benar"), "x=5 benar");
}

#[test]
fn calls_are_operands() {
    let output = run(
        "fungsi ganda(n) {\n    hasilkan n * 2;\n}\nutama() {\n    tampilkan(ganda(3) + 1);\n    tampilkan(ganda(ganda(2)));\n}\n",
    );
    assert_eq!(output, lines(&["7", "8"]));
}

#[test]
fn consecutive_operators_are_rejected() {
    let err = compile_err(&in_main("variabel x = 1 + * 2;"));
    assert_eq!(err.to_string(), "Error: Illegal token '*' (on line number 2)");
}

#[test]
fn trailing_operator_needs_an_operand() {
    let err = compile_err(&in_main("variabel x = 1 +;"));
    assert_eq!(
        err.to_string(),
        "Error: Expecting expression after '+' (on line number 2)"
    );
}

#[test]
fn unary_minus_is_not_an_operand() {
    let err = compile_err(&in_main("variabel x = -1;"));
    assert_eq!(err.to_string(), "Error: Illegal token '-' (on line number 2)");
}

#[test]
fn empty_guard_has_no_expression() {
    let err = compile_err(&in_main("jika () {\n}"));
    assert_eq!(err.to_string(), "Error: Expression not found (on line number 2)");
}

#[test]
fn oversized_integer_literal_is_rejected() {
    let err = compile_err(&in_main("variabel x = 99999999999999999999;"));
    assert_eq!(
        err.to_string(),
        "Error: Integer literal '99999999999999999999' is out of range (on line number 2)"
    );
}
