use std::io;
use std::path::Path;
use std::process::ExitCode;

use pyindo::{
    CompileError, DisassembleOptions, Program, SourceFileError, Vm, compile_source,
    compile_source_file, disassemble_program_with_options, logging,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

const EX_USAGE: u8 = 64;
const EX_NOINPUT: u8 = 66;
const EX_SOFTWARE: u8 = 70;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliConfig {
    source: Option<String>,
    disasm: bool,
    emit_json_path: Option<String>,
    run: bool,
    repl: bool,
    help: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            source: None,
            disasm: false,
            emit_json_path: None,
            run: true,
            repl: false,
            help: false,
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    logging::init()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_cli_args(&args) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Ok(ExitCode::from(EX_USAGE));
        }
    };
    if cli.help {
        print_usage();
        return Ok(ExitCode::SUCCESS);
    }
    if cli.repl {
        run_repl()?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(source) = cli.source.as_deref() else {
        print_usage();
        return Ok(ExitCode::from(EX_USAGE));
    };

    let program = match compile_source_file(source) {
        Ok(program) => program,
        Err(SourceFileError::Io(err)) => {
            eprintln!("cannot read '{source}': {err}");
            return Ok(ExitCode::from(EX_NOINPUT));
        }
        Err(SourceFileError::Compile(err)) => {
            report_compile_error(&err);
            return Ok(ExitCode::from(EX_SOFTWARE));
        }
    };
    debug!(
        source,
        instructions = program.code.len(),
        chunks = program.chunks.len(),
        "compiled"
    );

    if let Some(path) = cli.emit_json_path.as_deref() {
        write_json(&program, Path::new(path))?;
        println!("wrote {path}");
    }
    if cli.disasm {
        let options = DisassembleOptions {
            color: logging::ansi_enabled(),
        };
        print!("{}", disassemble_program_with_options(&program, options));
    }
    if cli.run {
        let mut vm = Vm::new(program).with_echo(true);
        if let Err(err) = vm.run() {
            eprintln!("{}", logging::error_label(&format!("runtime error: {err}")));
            return Ok(ExitCode::from(EX_SOFTWARE));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn parse_cli_args(args: &[String]) -> Result<CliConfig, String> {
    let mut cfg = CliConfig::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => {
                cfg.help = true;
                index += 1;
            }
            "-D" | "--disasm" => {
                cfg.disasm = true;
                index += 1;
            }
            "--emit-json" => {
                let path = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --emit-json".to_string())?;
                cfg.emit_json_path = Some(path.clone());
                index += 2;
            }
            "--no-run" => {
                cfg.run = false;
                index += 1;
            }
            "--repl" => {
                cfg.repl = true;
                index += 1;
            }
            value if value.starts_with('-') => {
                return Err(format!("unknown flag '{value}'"));
            }
            path => {
                if cfg.source.is_some() {
                    return Err("multiple source paths provided".to_string());
                }
                cfg.source = Some(path.to_string());
                index += 1;
            }
        }
    }

    if cfg.repl && cfg.source.is_some() {
        return Err("--repl does not take a source path".to_string());
    }
    Ok(cfg)
}

fn print_usage() {
    println!("Usage:");
    println!("  pyindo [-D|--disasm] [--emit-json <path>] [--no-run] <source_path>");
    println!("  pyindo --repl");
    println!("  pyindo -h|--help");
}

fn report_compile_error(err: &CompileError) {
    if err.is_invariant() {
        warn!("internal compiler invariant violated");
    }
    println!("{err}");
}

fn write_json(program: &Program, path: &Path) -> Result<(), io::Error> {
    let json = program.to_json().map_err(io::Error::other)?;
    std::fs::write(path, json)
}

/// Each entered line becomes the body of `utama`.
fn wrap_repl_line(line: &str) -> String {
    format!("utama() {{\n{line}\n}}\n")
}

fn run_repl() -> Result<(), Box<dyn std::error::Error>> {
    println!("Pyindo REPL");
    println!("history: up/down arrows, commands: .help, .quit");
    let mut editor = DefaultEditor::new()?;
    let prompt = logging::prompt();
    loop {
        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line {
                    ".quit" | ".exit" => break,
                    ".help" => {
                        println!("enter statements such as: tampilkan(1 + 2);");
                        continue;
                    }
                    _ => {}
                }
                let _ = editor.add_history_entry(line);
                let program = match compile_source(&wrap_repl_line(line)) {
                    Ok(program) => program,
                    Err(err) => {
                        println!("{}", logging::error_label(&err.to_string()));
                        continue;
                    }
                };
                let mut vm = Vm::new(program).with_echo(true);
                if let Err(err) = vm.run() {
                    println!("{}", logging::error_label(&format!("runtime error: {err}")));
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("sampai jumpa");
                break;
            }
            Err(err) => {
                return Err(Box::new(io::Error::other(err.to_string())));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_cli_args, wrap_repl_line};

    fn s(value: &str) -> String {
        value.to_string()
    }

    #[test]
    fn parse_cli_defaults() {
        let cfg = parse_cli_args(&[]).expect("parse should succeed");
        assert!(cfg.run);
        assert!(!cfg.disasm);
        assert!(!cfg.repl);
        assert!(cfg.emit_json_path.is_none());
        assert!(cfg.source.is_none());
    }

    #[test]
    fn parse_cli_disasm_without_running() {
        let cfg = parse_cli_args(&[s("-D"), s("--no-run"), s("demo.pyind")])
            .expect("parse should succeed");
        assert!(cfg.disasm);
        assert!(!cfg.run);
        assert_eq!(cfg.source.as_deref(), Some("demo.pyind"));
    }

    #[test]
    fn parse_cli_emit_json_requires_path() {
        let err = parse_cli_args(&[s("--emit-json")]).expect_err("parse should fail");
        assert!(err.contains("missing value"));

        let cfg = parse_cli_args(&[s("--emit-json"), s("out.json"), s("a.pyind")])
            .expect("parse should succeed");
        assert_eq!(cfg.emit_json_path.as_deref(), Some("out.json"));
    }

    #[test]
    fn parse_cli_rejects_multiple_sources() {
        let err = parse_cli_args(&[s("a.pyind"), s("b.pyind")]).expect_err("parse should fail");
        assert!(err.contains("multiple source paths"));
    }

    #[test]
    fn parse_cli_rejects_unknown_flag() {
        let err = parse_cli_args(&[s("--jit")]).expect_err("parse should fail");
        assert_eq!(err, "unknown flag '--jit'");
    }

    #[test]
    fn repl_line_compiles_as_entrypoint() {
        let program = pyindo::compile_source(&wrap_repl_line("tampilkan(1 + 2);"))
            .expect("compile should succeed");
        let mut vm = pyindo::Vm::new(program);
        vm.run().expect("run should succeed");
        assert_eq!(vm.output(), ["3".to_string()]);
    }
}
