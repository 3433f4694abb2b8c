use std::fs;
use std::io::{self, Read, Write};

use encoding_rs_io::DecodeReaderBytesBuilder;
use log::debug;

use crate::environment::Environment;
use crate::error;
use crate::evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;

/* The thin ambient shell around the library: a REPL and a file runner, implementing the line
protocol the core's public `Lex`/`Parse`/`Eval` interfaces are specified against. Neither
function belongs to the "interesting" 6,900-line core — they are glue, the way the teacher's own
`run_file`/`run_prompt` are glue around its scanner/parser/interpreter. */

/// Reads `path`, decoding it as UTF-8 through the corpus's encoding crate rather than the
/// naive `from_utf8_lossy` the teacher's own `run_file` uses, so a genuinely undecodable file
/// is reported rather than silently replaced character-by-character. Exits 65 if lexing/parsing
/// reported anything through the `error` module and 66 if the file cannot be read at all,
/// matching the teacher's `HAD_ERROR`-gated exit-code convention in its own `run_file`.
pub fn run_file(path: &str) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(io_err) => {
            error::error(0, &format!("could not read '{path}': {io_err}"));
            std::process::exit(66);
        }
    };

    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding_rs::UTF_8))
        .build(bytes.as_slice());
    let mut source = String::new();
    if let Err(io_err) = decoder.read_to_string(&mut source) {
        error::error(0, &format!("could not decode '{path}' as UTF-8: {io_err}"));
        std::process::exit(65);
    }

    let env = Environment::new();
    run(&source, &env);

    if error::had_error() {
        std::process::exit(65);
    }
}

/// A persistent environment survives across lines, so a `let` on one line is visible to the
/// next — this is what makes the REPL feel like one running program instead of N independent
/// evaluations. `error::reset()` after each line mirrors the teacher's own `run_prompt`, which
/// clears `HAD_ERROR` per iteration rather than letting one bad line poison the rest of the
/// session.
pub fn run_prompt() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let env = Environment::new();

    loop {
        print!(">> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        let bytes_read = stdin.read_line(&mut line).unwrap_or(0);
        if bytes_read == 0 {
            break; // EOF (Ctrl-D)
        }

        run(&line, &env);
        error::reset();
    }
}

/// Lexes, parses, and — only if parsing produced no errors — evaluates `source` against `env`,
/// printing the result per the REPL line protocol. Parser errors are reported through the
/// `error` module (for `run_file`'s exit-code decision) in addition to the REPL's own
/// `"Parse error:\n"` presentation.
fn run(source: &str, env: &Environment) {
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        println!("Parse error:");
        for message in parser.errors() {
            println!("\t{message}");
            error::error(0, message);
        }
        return;
    }

    debug!("parsed {} statement(s), evaluating", program.statements.len());
    match evaluator::eval_program(&program, env) {
        Ok(value) => println!("{value}"),
        Err(message) => println!("ERROR: {message}"),
    }
}
