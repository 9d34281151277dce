use clap::{App, Arg};
use monkey::interpreter::Interpreter;
use monkey::object::Object;
use monkey::parser::Parser;
use std::fs;
use std::io::{self, BufRead, Write};
use tracing::Level;

// Line that ends a group of REPL input.
const SENTINEL: &str = ";";

enum Outcome {
    Ok,
    ParseError,
    RuntimeError,
}

fn main() {
    let matches = App::new("monkey")
        .about("Runs a Monkey script, or starts a REPL when none is given")
        .arg(
            Arg::with_name("ast")
                .long("ast")
                .help("Prints the parsed program before evaluating it"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Raises the log level, may be repeated"),
        )
        .arg(Arg::with_name("script").index(1).help("Script to run"))
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let show_ast = matches.is_present("ast");
    match matches.value_of("script") {
        Some(file) => run_file(file, show_ast),
        None => run_prompt(show_ast),
    }
}

fn run_file(file: &str, show_ast: bool) {
    let contents = match fs::read_to_string(file) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("could not read {}: {}", file, e);
            std::process::exit(66);
        }
    };
    let mut interpreter = Interpreter::new();
    match run(&mut interpreter, &contents, show_ast) {
        Outcome::ParseError => std::process::exit(65),
        Outcome::RuntimeError => std::process::exit(70),
        Outcome::Ok => (),
    }
}

fn run_prompt(show_ast: bool) {
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!(">> ");
        if io::stdout().flush().is_err() {
            return;
        }
        let mut source = String::new();
        loop {
            match lines.next() {
                Some(Ok(line)) if line.trim() == SENTINEL => break,
                Some(Ok(line)) => {
                    source.push_str(&line);
                    source.push('\n');
                }
                Some(Err(e)) => {
                    eprintln!("failed to read line: {}", e);
                    return;
                }
                None => {
                    if !source.trim().is_empty() {
                        run(&mut interpreter, &source, show_ast);
                    }
                    return;
                }
            }
        }
        run(&mut interpreter, &source, show_ast);
    }
}

fn run(interpreter: &mut Interpreter, source: &str, show_ast: bool) -> Outcome {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    if show_ast {
        print!("{}", program);
    }
    if parser.has_errors() {
        for e in parser.errors() {
            eprintln!("{}", e);
        }
        return Outcome::ParseError;
    }
    match interpreter.interpret(&program) {
        Object::Error(message) => {
            eprintln!("ERROR: {}", message);
            Outcome::RuntimeError
        }
        Object::Nil => Outcome::Ok,
        result => {
            println!("{}", result);
            Outcome::Ok
        }
    }
}
