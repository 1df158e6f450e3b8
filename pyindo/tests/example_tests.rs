mod common;

use common::*;

#[test]
fn halo_sample() {
    assert_eq!(run(include_str!("../samples/halo.pyind")), lines(&["Halo, Dunia!"]));
}

#[test]
fn faktorial_sample() {
    let program = compile(include_str!("../samples/faktorial.pyind"));
    assert_eq!(program.chunks.len(), 1);
    assert_eq!(program.chunks[0].name, "faktorial");
    assert_eq!(run(include_str!("../samples/faktorial.pyind")), lines(&["5! = 120"]));
}

#[test]
fn fizzbuzz_sample() {
    let expected = lines(&[
        "1", "2", "Fizz", "4", "Buzz", "Fizz", "7", "8", "Fizz", "Buzz", "11", "Fizz", "13", "14",
        "FizzBuzz",
    ]);
    assert_eq!(run(include_str!("../samples/fizzbuzz.pyind")), expected);
}

#[test]
fn hitung_sample() {
    assert_eq!(
        run(include_str!("../samples/hitung.pyind")),
        lines(&["Total ganjil: 25"])
    );
}

#[test]
fn samples_compile_from_disk() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("samples");
    for name in ["halo", "faktorial", "fizzbuzz", "hitung"] {
        let path = dir.join(format!("{name}.pyind"));
        compile_source_file(&path).expect("sample should compile");
    }
}
