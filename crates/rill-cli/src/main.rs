//! Command-line interface for rill.
//!
//! Usage:
//!   rill <file|->              - Parse a document and print its IR as JSON
//!   rill <file|-> --validate   - Check the document, printing diagnostics
//!   rill <file|-> --events     - Print the structural event trace

use std::io::Read;

use clap::{Arg, ArgAction, Command};

use rill_parse::{EventKind, Options, Severity};
use rill_stream::StreamParser;

const EXIT_SUCCESS: i32 = 0;
const EXIT_SYNTAX_ERROR: i32 = 1;
const EXIT_IO_ERROR: i32 = 3;

fn main() {
    let matches = Command::new("rill")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Streaming parser for LLM-emitted rill documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("input")
                .help("Input file, or '-' for stdin")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .help("Check the document and report diagnostics, no JSON output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("events")
                .long("events")
                .help("Print the structural event trace instead of JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("extract")
                .long("extract")
                .help("Run the noise preprocessor on the input first")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Promote warnings to errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("indent-size")
                .long("indent-size")
                .help("Spaces per indentation level")
                .value_parser(clap::value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            Arg::new("intent-key")
                .long("intent-key")
                .help("Key treated as an intent container (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("allow-tabs")
                .long("allow-tabs")
                .help("Accept tabs in indentation without a warning")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("preserve-comments")
                .long("preserve-comments")
                .help("Keep comment lines as events")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let input = matches.get_one::<String>("input").unwrap();
    let source = match read_input(input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {}", input, err);
            std::process::exit(EXIT_IO_ERROR);
        }
    };
    let source = if matches.get_flag("extract") {
        rill_stream::extract_payload(&source).to_string()
    } else {
        source
    };

    let mut opts = Options::default()
        .with_indent_size(*matches.get_one::<usize>("indent-size").unwrap())
        .with_allow_tabs(matches.get_flag("allow-tabs"))
        .with_preserve_comments(matches.get_flag("preserve-comments"))
        .with_strict(matches.get_flag("strict"));
    if let Some(keys) = matches.get_many::<String>("intent-key") {
        opts = opts.with_intent_keys(keys.cloned());
    }

    let filename = if input == "-" { "<stdin>" } else { input.as_str() };
    let code = if matches.get_flag("validate") {
        run_validate(&source, &opts, filename)
    } else {
        run_parse(&source, &opts, filename, matches.get_flag("events"))
    };
    std::process::exit(code);
}

fn read_input(input: &str) -> std::io::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input)
    }
}

fn run_parse(source: &str, opts: &Options, filename: &str, events: bool) -> i32 {
    let mut stream = StreamParser::new(opts.clone());
    if events {
        for kind in [
            EventKind::Line,
            EventKind::Key,
            EventKind::Value,
            EventKind::BlockStart,
            EventKind::BlockEnd,
            EventKind::Indent,
            EventKind::Dedent,
            EventKind::IntentReady,
        ] {
            stream.on(kind, |event| println!("{:?}", event));
        }
    }
    stream.write(source);
    let build = stream.end();

    for diag in stream.diagnostics() {
        eprint!("{}", diag.render(filename, source));
    }
    for error in &build.errors {
        eprintln!("{}", error);
    }
    if !build.unresolved_refs.is_empty() {
        eprintln!("unresolved refs: {}", build.unresolved_refs.join(", "));
    }

    if !events {
        match serde_json::to_string_pretty(&build.value.to_json()) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("error: cannot serialize value: {}", err);
                return EXIT_IO_ERROR;
            }
        }
    }

    let failed = stream
        .diagnostics()
        .iter()
        .any(|d| d.severity == Severity::Error);
    if failed && opts.strict {
        EXIT_SYNTAX_ERROR
    } else {
        EXIT_SUCCESS
    }
}

fn run_validate(source: &str, opts: &Options, filename: &str) -> i32 {
    match rill_stream::validate(source, opts) {
        Ok(()) => {
            eprintln!("{}: ok", filename);
            EXIT_SUCCESS
        }
        Err(report) => {
            for diag in &report.parse {
                eprint!("{}", diag.render(filename, source));
            }
            for diag in &report.ir {
                eprintln!("{}", diag);
            }
            EXIT_SYNTAX_ERROR
        }
    }
}
