// -*- coding: utf-8 -*-

#![forbid(unsafe_code)]

mod event;
mod serial;

use crate::{
    event::{Event, HoldTracker},
    serial::{DEFAULT_BAUD, DEFAULT_PORT, LineReader},
};
use anyhow::{self as ah, Context as _};
use clap::{Parser, Subcommand};
use std::{io::Write as _, thread, time::Duration};

/// Read timeouts tolerated while waiting for the console reply.
const CONSOLE_REPLY_TIMEOUTS: usize = 10;

#[derive(Parser, Debug)]
struct Opts {
    /// Serial port device.
    #[arg(short, long, default_value = DEFAULT_PORT)]
    port: String,

    /// Baud rate.
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print button events and hold times. Reconnects on errors.
    Monitor,

    /// Send one line to the console firmware and check the reversed reply.
    Console { text: String },
}

fn monitor(opts: &Opts) -> ah::Result<()> {
    let mut reader = LineReader::new(serial::open(&opts.port, opts.baud)?);
    let mut holds = HoldTracker::new();
    loop {
        let Some(line) = reader.read_line()? else {
            continue;
        };
        match Event::parse(&line) {
            Some(event) => match holds.update(&event) {
                Some(hold) => println!("{event}  (held {hold} ms)"),
                None => println!("{event}"),
            },
            None if line.is_empty() => (),
            None => println!("> {line}"),
        }
    }
}

fn console(opts: &Opts, text: &str) -> ah::Result<()> {
    if text.bytes().any(|b| b == b'\r' || b == b'\n') {
        ah::bail!("The console text must be a single line.");
    }
    // The firmware reverses bytes, not characters.
    if !text.is_ascii() {
        ah::bail!("The console text must be ASCII.");
    }

    let mut reader = LineReader::new(serial::open(&opts.port, opts.baud)?);
    let mut request = text.as_bytes().to_vec();
    request.push(b'\r');
    reader
        .serial()
        .write_all(&request)
        .context("Serial port write")?;

    let mut replies = Vec::with_capacity(2);
    let mut timeouts = 0;
    while replies.len() < 2 {
        match reader.read_line()? {
            Some(line) => replies.push(line),
            None => {
                timeouts += 1;
                if timeouts >= CONSOLE_REPLY_TIMEOUTS {
                    ah::bail!("No reply from the console. Got: {replies:?}");
                }
            }
        }
    }

    println!("echo:     {}", replies[0]);
    println!("reversed: {}", replies[1]);

    let stored = check_reply(text, &replies[0], &replies[1])?;
    if stored < text.len() {
        eprintln!("Line was truncated to {stored} bytes.");
    }
    Ok(())
}

/// Verify the echo and the reversed reply for `text`.
///
/// Returns the number of bytes the firmware stored.
fn check_reply(text: &str, echo: &str, reversed: &str) -> ah::Result<usize> {
    let text = text.as_bytes();
    let echo = echo.as_bytes();
    if !text.starts_with(echo) {
        ah::bail!("Echo mismatch: sent {text:?}, got {echo:?}");
    }
    // The firmware truncates long lines. The reply reverses the stored part.
    let expected: Vec<u8> = echo.iter().rev().copied().collect();
    if reversed.as_bytes() != expected.as_slice() {
        ah::bail!("Reversal mismatch: expected {expected:?}, got {:?}", reversed.as_bytes());
    }
    Ok(echo.len())
}

fn main() -> ah::Result<()> {
    let opts = Opts::parse();

    match &opts.command {
        Command::Monitor => loop {
            if let Err(e) = monitor(&opts) {
                eprintln!("Serial error: {e:?}");
            }
            thread::sleep(Duration::from_millis(5000));
        },
        Command::Console { text } => console(&opts, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reply() {
        assert_eq!(check_reply("hello", "hello", "olleh").unwrap(), 5);
        assert_eq!(check_reply("", "", "").unwrap(), 0);
        assert!(check_reply("hello", "hello", "hello").is_err());
        assert!(check_reply("hello", "help", "pleh").is_err());
    }

    #[test]
    fn test_check_reply_truncated() {
        let text = "abcdefghijklmnopqrstuvwxyz0123456789";
        let stored = &text[..32];
        let reversed: String = stored.bytes().rev().map(char::from).collect();
        assert_eq!(check_reply(text, stored, &reversed).unwrap(), 32);
    }

    #[test]
    fn test_check_reply_bytewise() {
        // "a\u{e9}" is 61 C3 A9. Its byte reversal is not valid UTF-8.
        let reversed = String::from_utf8_lossy(&[0xA9, 0xC3, b'a']).into_owned();
        assert!(check_reply("a\u{e9}", "a\u{e9}", &reversed).is_err());
        assert_eq!(check_reply("ab", "ab", "ba").unwrap(), 2);
    }
}

// vim: ts=4 sw=4 expandtab
