use clap::{App, Arg};

/// Exit code for every usage, lexing, parsing, semantic, symbol-table,
/// codegen, and internal error.  Success is 0 and a failed link step
/// propagates the linker's own exit code.
pub const ERR_COMPILE: i32 = 1;

pub fn configure_cli() -> App<'static, 'static> {
    App::new("gracec")
        .version("0.1.0")
        .about("Compiles Grace language files into native executables via LLVM")
        .arg(
            Arg::with_name("optimize")
                .short("O")
                .help("Enable the optimization pass pipeline"),
        )
        .arg(
            Arg::with_name("asm-stdout")
                .short("f")
                .help("Read source from stdin and emit target assembly to stdout (no link step)"),
        )
        .arg(
            Arg::with_name("imm-stdout")
                .short("i")
                .help("Read source from stdin and emit the intermediate listing to stdout (no link step)"),
        )
        .arg(
            Arg::with_name("input")
                .index(1)
                .help("Grace source file to compile"),
        )
}
