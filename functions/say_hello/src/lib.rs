//! `say_hello` gateway tool

use serde::Deserialize;
use std::io::{self, Read, Write};

#[derive(Debug, Deserialize)]
struct Arguments {
    name: String,
}

/// Compute the tool output for the given JSON arguments
pub fn run(input: &[u8]) -> String {
    match serde_json::from_slice::<Arguments>(input) {
        Ok(args) => format!("🟣👋🙂 Hello {}", args.name),
        Err(e) => format!("🟣 invalid arguments: {e}"),
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
