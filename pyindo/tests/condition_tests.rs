mod common;

use common::*;

const CHAIN: &str = "fungsi pilih(x) {
    jika (x == 1) {
        tampilkan(\"satu\");
    } selainnya jika (x == 2) {
        tampilkan(\"dua\");
    } selainnya {
        tampilkan(\"lain\");
    }
}
utama() {
    pilih(1);
    pilih(2);
    pilih(3);
}
";

#[test]
fn exactly_one_clause_runs() {
    assert_eq!(run(CHAIN), lines(&["satu", "dua", "lain"]));
}

#[test]
fn exactly_one_clause_runs_for_each_ordering() {
    let source = "fungsi banding(a, b) {
    jika (a > b) {
        tampilkan(\"lebih\");
    } selainnya jika (a == b) {
        tampilkan(\"sama\");
    } selainnya {
        tampilkan(\"kurang\");
    }
}
utama() {
    banding(3, 1);
    banding(2, 2);
    banding(1, 3);
}
";
    assert_eq!(run(source), lines(&["lebih", "sama", "kurang"]));
}

#[test]
fn three_way_chain_shares_one_exit() {
    let program = compile(CHAIN);
    let code = &program.chunks[0].code;
    let exits: Vec<u32> = code
        .iter()
        .filter_map(|instruction| match instruction {
            Instruction::Jump(target) => Some(*target),
            _ => None,
        })
        .collect();
    assert_eq!(exits.len(), 2);
    assert_eq!(exits[0], exits[1]);

    // The exit is right after the else body, where the implicit null
    // return of the function begins.
    let exit = exits[0] as usize;
    assert_eq!(code[exit], Instruction::LoadConst(Value::Null));
    assert_eq!(code[exit + 1], Instruction::Return);

    // Each guard skips to the start of the next clause.
    let skips: Vec<u32> = code
        .iter()
        .filter_map(|instruction| match instruction {
            Instruction::JumpIfFalse(target) => Some(*target),
            _ => None,
        })
        .collect();
    assert_eq!(skips.len(), 2);
    assert_eq!(code[skips[0] as usize], Instruction::LoadName("x".to_string()));
    assert_eq!(
        code[skips[1] as usize],
        Instruction::LoadName("tampilkan".to_string())
    );
}

#[test]
fn false_guard_without_else_runs_nothing() {
    let output = run_main("jika (salah) {\n    tampilkan(\"tidak\");\n}\ntampilkan(\"selesai\");");
    assert_eq!(output, lines(&["selesai"]));
}

#[test]
fn comments_may_separate_a_clause_from_selainnya() {
    let output = run_main(
        "jika (salah) {\n    tampilkan(1);\n} // catatan\n/* blok */ selainnya {\n    tampilkan(2);\n}",
    );
    assert_eq!(output, lines(&["2"]));
}

#[test]
fn nested_chains_resolve_independently() {
    let output = run_main(
        "variabel a = 1;
variabel b = 2;
jika (a == 1) {
    jika (b == 1) {
        tampilkan(\"a1 b1\");
    } selainnya {
        tampilkan(\"a1 b lain\");
    }
} selainnya {
    tampilkan(\"a lain\");
}",
    );
    assert_eq!(output, lines(&["a1 b lain"]));
}

#[test]
fn conditions_run_at_top_level() {
    let output = run("variabel g = 3;\njika (g > 2) {\n    tampilkan(\"besar\");\n}\nutama() {}\n");
    assert_eq!(output, lines(&["besar"]));
}

#[test]
fn else_after_else_is_rejected() {
    let err = compile_err(&in_main(
        "jika (benar) {\n} selainnya {\n} selainnya {\n}",
    ));
    assert_eq!(
        err.to_string(),
        "Error: Unexpected 'selainnya' (on line number 4)"
    );
}

#[test]
fn selainnya_without_a_chain_is_rejected() {
    let err = compile_err(&in_main("selainnya {\n}"));
    assert_eq!(
        err.to_string(),
        "Error: Unexpected 'selainnya' (on line number 2)"
    );
}

#[test]
fn else_clause_takes_no_guard() {
    let err = compile_err(&in_main("jika (benar) {\n} selainnya (salah) {\n}"));
    assert_eq!(
        err.to_string(),
        "Error: Expecting '{' but got '(' (on line number 3)"
    );
}
