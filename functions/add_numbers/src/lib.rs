//! `add_numbers` gateway tool
//!
//! Reads `{"number1": n, "number2": m}` on stdin and writes the sum to
//! stdout.

use serde::Deserialize;
use std::io::{self, Read, Write};

#[derive(Debug, Default, Deserialize)]
struct Arguments {
    #[serde(default)]
    number1: f64,
    #[serde(default)]
    number2: f64,
}

/// Compute the tool output for the given JSON arguments
pub fn run(input: &[u8]) -> String {
    match serde_json::from_slice::<Arguments>(input) {
        Ok(args) => format!("🤖 result = {}", format_number(args.number1 + args.number2)),
        Err(e) => format!("🤖 invalid arguments: {e}"),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Entry point called by the gateway
#[allow(unsafe_code)]
#[unsafe(no_mangle)]
pub extern "C" fn handle() {
    let mut input = Vec::new();
    if io::stdin().read_to_end(&mut input).is_err() {
        return;
    }
    let mut stdout = io::stdout();
    let _ = stdout.write_all(run(&input).as_bytes());
    let _ = stdout.flush();
}
