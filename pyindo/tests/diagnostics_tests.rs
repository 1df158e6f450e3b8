mod common;

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use common::*;
use pyindo::SourceFileError;

fn message(source: &str) -> String {
    compile_err(source).to_string()
}

#[test]
fn missing_entrypoint_is_reported_without_line() {
    let err = compile_err("fungsi f() {\n}\n");
    assert_eq!(err.line(), None);
    assert_eq!(
        err.to_string(),
        "Error: Entrypoint is not exist, you should create it first using `utama` function"
    );
}

#[test]
fn duplicate_function_is_rejected() {
    assert_eq!(
        message("fungsi foo() {}\nfungsi foo() {}\nutama() {}\n"),
        "Error: 'foo' function is already declared before (on line number 2)"
    );
}

#[test]
fn undeclared_call_target_is_rejected() {
    assert_eq!(
        message(&in_main("bar();")),
        "Error: 'bar' function is not declared anywhere (on line number 2)"
    );
}

#[test]
fn unterminated_block_reports_end_of_file_line() {
    assert_eq!(
        message("utama() {\n    tampilkan(1);\n"),
        "Error: Expecting '}' but have reached the End Of File (on line number 3)"
    );
}

#[test]
fn unterminated_block_comment_truncates_input() {
    let output = run("utama() {\n    tampilkan(1);\n}\n/* tidak ditutup\nutama() {}\n");
    assert_eq!(output, lines(&["1"]));
    assert_eq!(
        message("utama() {\n/* tidak ditutup\n"),
        "Error: Expecting '}' but have reached the End Of File (on line number 3)"
    );
}

#[test]
fn undeclared_identifier_is_rejected() {
    assert_eq!(
        message(&in_main("tampilkan(y);")),
        "Error: Identifier 'y' has not declared yet (on line number 2)"
    );
}

#[test]
fn globals_are_not_visible_inside_functions() {
    assert_eq!(
        message("variabel g = 1;\nutama() {\n    tampilkan(g);\n}\n"),
        "Error: Identifier 'g' has not declared yet (on line number 3)"
    );
}

#[test]
fn duplicate_variable_is_rejected() {
    assert_eq!(
        message(&in_main("variabel a = 1;\nvariabel a = 2;")),
        "Error: Identifier 'a' is already declared before (on line number 3)"
    );
}

#[test]
fn constants_cannot_be_reassigned() {
    assert_eq!(
        message(&in_main("konstanta PI = 3;\nPI = 4;")),
        "Error: Identifier 'PI' is a constant and cannot be reassigned (on line number 3)"
    );
    assert_eq!(
        message(&in_main("konstanta k;")),
        "Error: Constant 'k' must be initialized (on line number 2)"
    );
}

#[test]
fn illegal_identifier_name() {
    assert_eq!(
        message(&in_main("variabel 9abc = 1;")),
        "Error: Illegal identifier name: 9abc (on line number 2)"
    );
}

#[test]
fn missing_semicolon_after_call() {
    assert_eq!(
        message("utama() {\n    tampilkan(1)\n}\n"),
        "Error: Expecting ';' but got '}' (on line number 3)"
    );
}

#[test]
fn keywords_require_a_following_space() {
    assert_eq!(
        message("fungsi(a) {}\nutama() {}\n"),
        "Error: Expecting ' ' but got '(' (on line number 1)"
    );
}

#[test]
fn loop_control_outside_loop() {
    assert_eq!(
        message(&in_main("berhenti;")),
        "Error: 'berhenti' statement is only allowed inside a loop (on line number 2)"
    );
}

#[test]
fn return_outside_function() {
    assert_eq!(
        message("hasilkan 1;\nutama() {}\n"),
        "Error: 'hasilkan' statement is only allowed inside a function (on line number 1)"
    );
}

#[test]
fn reserved_statements_are_not_supported() {
    assert_eq!(
        message(&in_main("untuk (i) {\n}")),
        "Error: 'untuk' statement is not supported yet (on line number 2)"
    );
    assert_eq!(
        message(&in_main("variabel x = 1;\nhapus x;")),
        "Error: 'hapus' statement is not supported yet (on line number 3)"
    );
}

#[test]
fn entrypoint_rules() {
    assert_eq!(
        message("utama(x) {}\n"),
        "Error: Entrypoint 'utama' does not accept parameters (on line number 1)"
    );
    assert_eq!(
        message("fungsi f() {\n    utama() {}\n}\n"),
        "Error: 'utama' function must be declared at the top level (on line number 2)"
    );
}

#[test]
fn stray_closers_are_rejected() {
    assert_eq!(
        message(&in_main("variabel x = 1);")),
        "Error: Unexpected ')' (on line number 2)"
    );
    assert_eq!(message("}\n"), "Error: Unexpected '}' (on line number 1)");
    assert_eq!(message("{\n"), "Error: Unexpected '{' (on line number 1)");
}

#[test]
fn invariant_errors_ask_for_a_report() {
    let err = CompileError::invariant("label L3 marked twice");
    assert!(err.is_invariant());
    assert_eq!(
        err.to_string(),
        "[!] Compiler Error: label L3 marked twice\n\n--+--(Please file an issue in the github repository if you found this)\n--+--"
    );
}

#[test]
fn compile_source_file_reads_from_disk() {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be monotonic")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("pyindo_diag_{unique}.pyind"));
    fs::write(&path, "utama() {\n    tampilkan(1 +);\n}\n").expect("temp source should be writable");

    let result = compile_source_file(&path);
    let _ = fs::remove_file(&path);

    match result {
        Err(SourceFileError::Compile(err)) => {
            assert_eq!(err.line(), Some(2));
            assert_eq!(err.message(), "Expecting expression after '+'");
        }
        other => panic!("expected compile error, got {other:?}"),
    }
}

#[test]
fn missing_source_file_is_an_io_error() {
    let result = compile_source_file("/nonexistent/pyindo/tidak_ada.pyind");
    assert!(matches!(result, Err(SourceFileError::Io(_))));
}
