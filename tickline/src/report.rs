// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    edge::Edge,
    transport::{SerialPort, Transport},
};
use heapless::String;
use ufmt::uwrite;

/// Longest event line: "4294967295: UP->DOWN #65535".
pub const EVENT_LINE_MAX: usize = 32;

pub type EventLine = String<EVENT_LINE_MAX>;

/// Render an event as one log line (without line terminator).
pub fn format_event(edge: &Edge) -> EventLine {
    let mut line = EventLine::new();
    // Cannot overflow. EVENT_LINE_MAX covers the longest possible line.
    let _ = match edge {
        Edge::Pressed { at, presses } => uwrite!(&mut line, "{}: UP->DOWN #{}", *at, *presses),
        Edge::Released { at } => uwrite!(&mut line, "{}: DOWN->UP", *at),
    };
    line
}

/// Emit one event line. Blocks until the line has been handed to the UART.
pub fn report_event<P: SerialPort>(link: &Transport<P>, edge: &Edge) {
    link.send_line(format_event(edge).as_bytes());
}


// vim: ts=4 sw=4 expandtab
