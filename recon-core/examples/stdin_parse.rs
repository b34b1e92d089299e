//! Parse Recon from stdin in 4 KiB chunks and print the canonical form.
//!
//!     echo 'a: 1, b: @foo' | cargo run --example stdin_parse

use std::io::Read;

use recon_core::input::StringInput;
use recon_core::parser::{DocumentParser, ParseStep, Parser};

fn main() {
    let mut stdin = std::io::stdin().lock();
    let mut input = StringInput::streaming();
    let mut parser = DocumentParser::new();
    let mut buf = [0u8; 4096];
    let mut pending = Vec::new();

    let value = loop {
        let n = stdin.read(&mut buf).unwrap();
        if n == 0 {
            input.push_str(&String::from_utf8_lossy(&pending));
            input.finish();
        } else {
            pending.extend_from_slice(&buf[..n]);
            let valid = match std::str::from_utf8(&pending) {
                Ok(text) => text.len(),
                Err(err) => err.valid_up_to(),
            };
            input.push_str(std::str::from_utf8(&pending[..valid]).unwrap());
            pending.drain(..valid);
        }
        match parser.feed(&mut input) {
            ParseStep::Cont(next) if n > 0 => parser = next,
            ParseStep::Cont(_) => unreachable!("parser suspended on a finished input"),
            ParseStep::Done(value) => break value,
            ParseStep::Error(err) => {
                eprintln!("error: {}", err);
                std::process::exit(1);
            }
        }
        input.compact();
    };

    match recon_core::to_string(&value) {
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("error: {}", err),
    }
}
