//! `json-fmt`: reformat a JSON document.
//!
//! Usage:
//!   json-fmt [--pretty] [--indent N]
//!
//! The document is read from stdin and written to stdout, compact unless
//! `--pretty` or `--indent` is given. Set `RUST_LOG=json_mapper=debug` to see
//! mapper diagnostics on stderr.

use json_mapper::json_cli::{format_json, FormatOptions};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();

    let options = match FormatOptions::from_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("usage: json-fmt [--pretty] [--indent N]");
            std::process::exit(2);
        }
    };

    match format_json(io::stdin().lock(), options) {
        Ok(result) => {
            let mut stdout = io::stdout();
            if let Err(e) = stdout
                .write_all(result.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
            {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
