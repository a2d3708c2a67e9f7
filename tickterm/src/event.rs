// -*- coding: utf-8 -*-

//! Event reporter lines as sent by the firmware.
//!
//! `<ms>: UP->DOWN #<presses>` and `<ms>: DOWN->UP`

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Pressed { at: u32, presses: u16 },
    Released { at: u32 },
}

impl Event {
    /// Parse one line. Lines that are not events give `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let (at, rest) = line.trim().split_once(": ")?;
        let at = at.parse().ok()?;
        if rest == "DOWN->UP" {
            return Some(Event::Released { at });
        }
        let presses = rest.strip_prefix("UP->DOWN #")?.parse().ok()?;
        Some(Event::Pressed { at, presses })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Pressed { at, presses } => write!(f, "{at:>10} ms  press #{presses}"),
            Event::Released { at } => write!(f, "{at:>10} ms  release"),
        }
    }
}

/// Pairs presses with releases.
#[derive(Default, Debug)]
pub struct HoldTracker {
    pressed_at: Option<u32>,
}

impl HoldTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next event.
    /// Returns the hold time in milliseconds when `event` ends a press.
    ///
    /// The device clock wraps, so the difference wraps too.
    pub fn update(&mut self, event: &Event) -> Option<u32> {
        match *event {
            Event::Pressed { at, .. } => {
                self.pressed_at = Some(at);
                None
            }
            Event::Released { at } => self.pressed_at.take().map(|p| at.wrapping_sub(p)),
        }
    }
}


// vim: ts=4 sw=4 expandtab
