//! Command-line front end.

use clap::Parser;
use noesis::{Error, Options, Reasoner, Serializer};
use std::io::Read;
use std::path::PathBuf;
use std::process::exit;

/// Forward- and backward-chaining reasoner for a Horn subset of
/// Notation3.
#[derive(Parser)]
#[command(name = "noesis", version, about)]
struct Args {
    /// Input N3 document; `-` reads standard input.
    file: PathBuf,
    /// Print a derivation comment above each derived triple.
    #[arg(long)]
    explain: bool,
    /// Disable every builtin except log:implies and log:impliedBy.
    #[arg(long)]
    restricted: bool,
    /// Rewrite http:// to https:// before dereferencing.
    #[arg(long)]
    https: bool,
    /// Fix time:localTime to this xsd:dateTime lexical.
    #[arg(long)]
    now: Option<String>,
    /// Salt log:skolem IRIs per run instead of keeping them stable
    /// across runs.
    #[arg(long)]
    salted_skolem: bool,
    /// Suppress the derived triples; print only collected output
    /// strings.
    #[arg(long)]
    quiet: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let text = match read_input(&args.file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("noesis: {}", e);
            exit(1);
        }
    };

    let mut reasoner = Reasoner::new(Options {
        super_restricted: args.restricted,
        enforce_https: args.https,
        proof_comments: args.explain,
        deterministic_skolem: !args.salted_skolem,
        fixed_now: args.now.clone(),
    });
    if let Err(e) = reasoner.load_str(&text) {
        eprintln!("noesis: {}", e);
        exit(1);
    }
    match reasoner.run() {
        Ok(()) => {}
        Err(e @ Error::FuseTriggered { .. }) => {
            eprintln!("noesis: {}", e);
            exit(2);
        }
        Err(e) => {
            eprintln!("noesis: {}", e);
            exit(1);
        }
    }

    if !args.quiet {
        let writer = Serializer::new(reasoner.prolog());
        let mut out = String::new();
        writer.write_preamble(&mut out);
        for derivation in reasoner.derived() {
            if args.explain {
                out.push_str(&derivation.render(reasoner.rules(), reasoner.prolog()));
                out.push('\n');
            }
            out.push_str(&writer.triple(&derivation.fact));
            out.push('\n');
        }
        print!("{}", out);
    }
    let outputs = reasoner.output_strings();
    if !outputs.is_empty() {
        print!("{}", outputs);
    }
}

fn read_input(path: &PathBuf) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}
