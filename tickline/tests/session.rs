// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Main context and interrupt context running concurrently.
//!
//! The interrupt handler runs on a second thread, always inside of the
//! global critical section, just like a real ISR runs with interrupts disabled.

use std::{
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    thread,
};
use tickline::{
    Console, IrqCtx, IrqHandler, LineEnd, MainCtx, Millis, RelMillis, RxPolicy, SerialConfig,
    SerialPort, TickPeriod, TickSource, TimeBase, Transport,
};

#[derive(Default)]
struct WirePort {
    tx: Mutex<Vec<u8>>,
    rx: Mutex<Option<u8>>,
}

impl SerialPort for WirePort {
    fn configure(&self, _config: SerialConfig) {}

    fn tx_ready(&self) -> bool {
        true
    }

    fn write_tx(&self, byte: u8) {
        self.tx.lock().unwrap().push(byte);
    }

    fn rx_full(&self) -> bool {
        self.rx.lock().unwrap().is_some()
    }

    fn read_rx(&self) -> u8 {
        self.rx.lock().unwrap().take().unwrap_or(0)
    }
}

/// UART that stays busy for a few polls after every write
/// and counts writes into a busy transmitter.
#[derive(Default)]
struct BusyPort {
    tx: Mutex<Vec<u8>>,
    rx: Mutex<Option<u8>>,
    busy_left: AtomicU32,
    overruns: AtomicU32,
}

impl BusyPort {
    const BUSY_POLLS: u32 = 3;
}

impl SerialPort for BusyPort {
    fn configure(&self, _config: SerialConfig) {}

    fn tx_ready(&self) -> bool {
        let left = self.busy_left.load(Ordering::SeqCst);
        if left > 0 {
            self.busy_left.store(left - 1, Ordering::SeqCst);
            false
        } else {
            true
        }
    }

    fn write_tx(&self, byte: u8) {
        if self.busy_left.load(Ordering::SeqCst) != 0 {
            self.overruns.fetch_add(1, Ordering::SeqCst);
        }
        self.tx.lock().unwrap().push(byte);
        self.busy_left.store(Self::BUSY_POLLS, Ordering::SeqCst);
    }

    fn rx_full(&self) -> bool {
        self.rx.lock().unwrap().is_some()
    }

    fn read_rx(&self) -> u8 {
        self.rx.lock().unwrap().take().unwrap_or(0)
    }
}

#[derive(Default)]
struct WireTimer {
    pending: AtomicBool,
}

impl TickSource for WireTimer {
    fn configure(&self, _period: TickPeriod) {}

    fn overflowed(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    fn rearm(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }
}

/// Run `f` as interrupt handler.
fn irq<R>(f: impl FnOnce(&IrqCtx<'_>) -> R) -> R {
    critical_section::with(|_| {
        // SAFETY: The global critical section excludes every main context
        //         cell access for the duration of `f`.
        let c = unsafe { IrqCtx::new() };
        f(&c)
    })
}

fn main_ctx<'cs>() -> MainCtx<'cs> {
    // SAFETY: Every test uses exactly one thread as main context.
    //         The feeder thread only uses it for the mailbox peek, which
    //         takes a real critical section.
    unsafe { MainCtx::new() }
}

/// Deliver `script` one receive interrupt per byte.
/// The next byte only arrives after the previous one was consumed.
fn feed(link: &Transport<WirePort>, script: &[u8]) {
    let m = main_ctx();
    for &byte in script {
        while link.rx_pending(&m) {
            thread::yield_now();
        }
        irq(|c| {
            *link.port().rx.lock().unwrap() = Some(byte);
            assert!(link.handle_irq(c));
        });
    }
}

fn fire_ticks<const DIV: u8>(tb: &TimeBase<WireTimer, DIV>, count: u32) {
    for _ in 0..count {
        tb.source().pending.store(true, Ordering::SeqCst);
        assert!(irq(|c| tb.handle_irq(c)));
    }
}

fn session<const N: usize>(script: &[u8], lines: usize) -> (Vec<(LineEnd, Vec<u8>)>, Vec<u8>) {
    let link = Transport::new(WirePort::default(), RxPolicy::Buffered);
    let console = Console::new();

    let got = thread::scope(|s| {
        s.spawn(|| feed(&link, script));

        let m = main_ctx();
        link.init(&m, SerialConfig::new(9600, true));
        let mut line = heapless::Vec::<u8, N>::new();
        (0..lines)
            .map(|_| {
                let end = console.serve_line(&m, &link, &mut line);
                (end, line.to_vec())
            })
            .collect()
    });
    let tx = link.port().tx.lock().unwrap().clone();
    (got, tx)
}

#[test]
fn test_console_reverses_line() {
    let (got, tx) = session::<32>(b"hello\r", 1);
    assert_eq!(got, [(LineEnd::Complete, b"olleh".to_vec())]);
    assert_eq!(tx, b"hello\r\nolleh\r\n");
}

#[test]
fn test_console_empty_line() {
    let (got, tx) = session::<32>(b"\n", 1);
    assert_eq!(got, [(LineEnd::Complete, vec![])]);
    assert_eq!(tx, b"\r\n\r\n");
}

#[test]
fn test_console_crlf_and_backspace() {
    let (got, tx) = session::<32>(b"ab\x08c\r\nxy\n", 2);
    assert_eq!(
        got,
        [
            (LineEnd::Complete, b"ca".to_vec()),
            (LineEnd::Complete, b"yx".to_vec()),
        ]
    );
    assert_eq!(tx, b"ab\x08 \x08c\r\nca\r\nxy\r\nyx\r\n");
}

#[test]
fn test_console_truncates_long_line() {
    let (got, tx) = session::<4>(b"abcdefg\r", 1);
    assert_eq!(got, [(LineEnd::Truncated, b"dcba".to_vec())]);
    assert_eq!(tx, b"abcd\r\ndcba\r\n");
}

#[test]
fn test_receive_blocking_liveness() {
    let link = Transport::new(WirePort::default(), RxPolicy::Buffered);
    let script: Vec<u8> = (0..=255).collect();

    let got: Vec<u8> = thread::scope(|s| {
        s.spawn(|| feed(&link, &script));
        let m = main_ctx();
        (0..script.len()).map(|_| link.receive_blocking(&m)).collect()
    });
    assert_eq!(got, script);
}

#[test]
fn test_echo_interrupt_and_mainline_share_transmitter() {
    let link = Transport::new(BusyPort::default(), RxPolicy::Echo);
    let echoed: Vec<u8> = (0..200).map(|i| b'a' + (i % 26) as u8).collect();
    let lines: Vec<Vec<u8>> = (0..50_u32)
        .map(|i| format!("{}: DOWN->UP", i * 1000).into_bytes())
        .collect();

    thread::scope(|s| {
        s.spawn(|| {
            for &byte in &echoed {
                irq(|c| {
                    *link.port().rx.lock().unwrap() = Some(byte);
                    assert!(link.handle_irq(c));
                });
                thread::yield_now();
            }
        });

        for line in &lines {
            link.send_line(line);
        }
    });

    let tx = link.port().tx.lock().unwrap().clone();
    assert_eq!(link.port().overruns.load(Ordering::SeqCst), 0);

    // Lower case letters only come from the echo, everything else from the lines.
    let got_echo: Vec<u8> = tx.iter().copied().filter(u8::is_ascii_lowercase).collect();
    let got_lines: Vec<u8> = tx.iter().copied().filter(|b| !b.is_ascii_lowercase()).collect();
    let want_lines: Vec<u8> = lines
        .iter()
        .flat_map(|l| l.iter().copied().chain(*b"\r\n"))
        .collect();
    assert_eq!(got_echo, echoed);
    assert_eq!(got_lines, want_lines);
}

#[test]
fn test_clock_reads_while_ticking() {
    const START: u32 = u32::MAX - 5000;
    const TICKS: u32 = 10_000;
    let tb: TimeBase<WireTimer, 1> = TimeBase::starting_at(WireTimer::default(), Millis(START));
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            fire_ticks(&tb, TICKS);
            done.store(true, Ordering::SeqCst);
        });

        let m = main_ctx();
        let mut prev = tb.now(&m);
        while !done.load(Ordering::SeqCst) {
            let now = tb.now(&m);
            assert!(now >= prev);
            prev = now;
        }
    });

    let m = main_ctx();
    assert_eq!(tb.now(&m), Millis(START.wrapping_add(TICKS)));
}

#[test]
fn test_delay_with_divider() {
    let tb: TimeBase<WireTimer, 32> = TimeBase::new(WireTimer::default());
    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            while !stop.load(Ordering::SeqCst) {
                fire_ticks(&tb, 1);
                thread::yield_now();
            }
        });

        let m = main_ctx();
        let start = tb.now(&m);
        tb.delay(&m, RelMillis::from_millis(20));
        assert!(tb.now(&m) - start >= RelMillis(20));
        stop.store(true, Ordering::SeqCst);
    });
}

// vim: ts=4 sw=4 expandtab
