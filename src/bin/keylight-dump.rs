//! Reads MIDI messages as hex lines from stdin and prints the events that come
//! out of the pedal chain as JSON, one per line.
//!
//! Usage: `keylight-dump [config.json]`
//!
//! ```text
//! $ printf 'b0 40 7f\n90 3c 64\n80 3c 00\nb0 40 00\n' | keylight-dump
//! ```

use std::cell::RefCell;
use std::env;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use keylight::prelude::*;

fn parse_hex_line(line: &str) -> Option<Vec<u8>> {
    line.split_whitespace()
        .map(|token| u8::from_str_radix(token.trim_start_matches("0x"), 16).ok())
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let config = match env::args().nth(1) {
        Some(path) => PedalChainConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => PedalChainConfig::default(),
    };
    tracing::info!(?config, "keylight-dump starting");

    let mut chain = PedalChainBuilder::from_config(config).build()?;

    let emitted = Rc::new(RefCell::new(Vec::new()));
    for kind in EventKind::ALL {
        let emitted = Rc::clone(&emitted);
        chain.on(kind, move |event| emitted.borrow_mut().push(event.clone()))?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(bytes) = parse_hex_line(&line) else {
            tracing::warn!(%line, "skipping line that is not hex bytes");
            continue;
        };

        chain.process_bytes(&bytes)?;
        for event in emitted.borrow_mut().drain(..) {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
        }
    }

    Ok(())
}
