// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tickline::{Polarity, SerialConfig, TickPeriod};

#[cfg(not(any(feature = "events", feature = "echo", feature = "console")))]
compile_error!("Enable one of the deployment variant features: events, echo, console");

#[cfg(any(
    all(feature = "events", feature = "echo"),
    all(feature = "events", feature = "console"),
    all(feature = "echo", feature = "console"),
))]
compile_error!("The deployment variant features events, echo and console are mutually exclusive");

/// CPU clock (external crystal).
pub const FCPU: u32 = 16_000_000;

/// 9600 baud 8N1 with the double speed divisor.
pub const SERIAL: SerialConfig = SerialConfig::new(9_600, true);

/// Hardware tick period.
pub const TICK_PERIOD: TickPeriod = TickPeriod::from_millis(1);

/// Hardware ticks per system clock millisecond.
pub const TICK_DIV: u8 = 1;

/// The push button pulls the input high when pressed.
#[allow(dead_code)]
pub const BUTTON_POLARITY: Polarity = Polarity::ActiveHigh;

/// Maximum console line length. Longer lines are truncated.
#[allow(dead_code)]
pub const LINE_MAX: usize = 32;

pub const BANNER: &[u8] = b"tickline: system start";

#[allow(dead_code)]
pub const BUTTON_BIT: usize = 0; // PB0
#[allow(dead_code)]
pub const LED_BIT: usize = 5; // PB5
#[allow(dead_code)]
pub const DEBUG_BIT: usize = 2; // PD2

const _: () = assert!(crate::timer::tc0_setup(FCPU, TICK_PERIOD).is_some());
const _: () = assert!(TICK_PERIOD.as_micros() * TICK_DIV as u32 == 1000);

// vim: ts=4 sw=4 expandtab
