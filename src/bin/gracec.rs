extern crate log;
extern crate simplelog;

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::process::Command;
use std::time::Instant;

use inkwell::context::Context;
use log::info;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use grace_lang::cli::{configure_cli, ERR_COMPILE};
use grace_lang::compiler::llvm::IrGen;
use grace_lang::compiler::{parse_and_analyze, BuildMode};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    configure_logging();
    let config = configure_cli().get_matches();

    let optimize = config.is_present("optimize");
    let asm_stdout = config.is_present("asm-stdout");
    let imm_stdout = config.is_present("imm-stdout");

    // -f and -i read the source from stdin, write one artifact to stdout,
    // and skip the link step; -f wins when both are given.
    if asm_stdout || imm_stdout {
        let mut text = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut text) {
            eprintln!("could not read standard input: {}", e);
            return ERR_COMPILE;
        }
        return compile_stream(&text, optimize, asm_stdout);
    }

    match config.value_of("input") {
        Some(input) => compile_file(Path::new(input), optimize),
        None => {
            eprintln!("usage: gracec [options] filename (see --help)");
            ERR_COMPILE
        }
    }
}

fn configure_logging() {
    let level = match std::env::var("GRACE_LOG").as_deref() {
        Ok("debug") => LevelFilter::Debug,
        Ok("info") => LevelFilter::Info,
        _ => LevelFilter::Warn,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Front + back half against one fresh LLVM context; prints the single
/// diagnostic line and returns the exit code on failure.
fn build_module<'ctx>(
    context: &'ctx Context,
    text: &str,
    name: &str,
    optimize: bool,
    file_label: &str,
) -> Result<IrGen<'ctx>, i32> {
    let front = Instant::now();
    let program = match parse_and_analyze(text, BuildMode::Full) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e.format(file_label));
            return Err(ERR_COMPILE);
        }
    };
    info!("frontend: {}s", front.elapsed().as_secs_f32());

    let lowering = Instant::now();
    let mut llvm = match IrGen::new(context, name) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("{}", e.format(file_label));
            return Err(ERR_COMPILE);
        }
    };
    if let Err(e) = llvm.ingest(&program) {
        eprintln!("{}", e.format(file_label));
        return Err(ERR_COMPILE);
    }
    for w in llvm.warnings() {
        eprintln!("{}", w.format(file_label));
    }
    if optimize {
        llvm.optimize();
    }
    if let Err(e) = llvm.verify() {
        eprintln!("{}", e.format(file_label));
        return Err(ERR_COMPILE);
    }
    info!("llvm: {}s", lowering.elapsed().as_secs_f32());

    Ok(llvm)
}

fn compile_stream(text: &str, optimize: bool, emit_asm: bool) -> i32 {
    let context = Context::create();
    let llvm = match build_module(&context, text, "grace", optimize, "<stdin>") {
        Ok(l) => l,
        Err(code) => return code,
    };

    let mut out = io::stdout();
    let written = if emit_asm {
        llvm.write_assembly(&mut out)
    } else {
        llvm.write_ir(&mut out)
    };
    match written {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("could not write output: {}", e);
            ERR_COMPILE
        }
    }
}

fn compile_file(src: &Path, optimize: bool) -> i32 {
    let file_label = src.to_string_lossy().to_string();
    let text = match fs::read_to_string(src) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("could not open {}: {}", file_label, e);
            return ERR_COMPILE;
        }
    };
    let name = src
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "grace".into());

    let context = Context::create();
    let llvm = match build_module(&context, &text, &name, optimize, &file_label) {
        Ok(l) => l,
        Err(code) => return code,
    };

    let imm = src.with_extension("imm");
    let asm = src.with_extension("asm");
    let obj = src.with_extension("o");

    let written = emit_to(&imm, |f| llvm.write_ir(f))
        .and_then(|_| emit_to(&asm, |f| llvm.write_assembly(f)))
        .and_then(|_| emit_to(&obj, |f| llvm.write_object(f)));
    if let Err(msg) = written {
        eprintln!("{}", msg);
        return ERR_COMPILE;
    }

    link(src, &obj)
}

fn emit_to<F>(path: &Path, write: F) -> Result<(), String>
where
    F: FnOnce(&mut File) -> Result<(), String>,
{
    let mut f = File::create(path)
        .map_err(|e| format!("could not create {}: {}", path.display(), e))?;
    write(&mut f).map_err(|e| format!("could not write {}: {}", path.display(), e))
}

/// Final step: hand the object file to the external linker together with
/// the precompiled runtime archive.  The linker's exit code becomes ours.
fn link(src: &Path, obj: &Path) -> i32 {
    let exe = src.with_extension("exe");
    let linker = std::env::var("GRACE_LD").unwrap_or_else(|_| "cc".into());
    let runtime_dir = std::env::var("GRACE_RUNTIME_DIR").unwrap_or_else(|_| "./runtime".into());
    let runtime_lib = std::env::var("GRACE_RUNTIME_LIB").unwrap_or_else(|_| "grace".into());

    let status = Command::new(&linker)
        .arg("-no-pie")
        .arg("-o")
        .arg(&exe)
        .arg(obj)
        .arg("-L")
        .arg(&runtime_dir)
        .arg(format!("-l{}", runtime_lib))
        .status();

    match status {
        Ok(s) => s.code().unwrap_or(ERR_COMPILE),
        Err(e) => {
            eprintln!("failed to run linker {}: {}", linker, e);
            ERR_COMPILE
        }
    }
}
