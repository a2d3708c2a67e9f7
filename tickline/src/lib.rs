// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interrupt driven runtime core for small single-core microcontrollers.
//!
//! One interrupt vector services two independent sources, the serial
//! receiver and a periodic timer. The cooperative main loop polls the state
//! these sources leave behind and does all blocking transmission.
//!
//! The hardware is reached through the [SerialPort] and [TickSource] traits
//! and the `embedded-hal` digital pin traits, so everything in here can be
//! exercised on the host.

#![cfg_attr(not(test), no_std)]

pub mod console;
pub mod context;
pub mod edge;
pub mod irq;
pub mod report;
pub mod time;
pub mod transport;

pub use crate::{
    console::{Console, LineEnd},
    context::{IrqCtx, LazyMainInit, MainCtx, MainInitCtx},
    edge::{ButtonState, Edge, EdgeDetector, Polarity},
    irq::{IrqHandler, dispatch},
    report::report_event,
    time::{Millis, RelMillis, TickPeriod, TickSource, TimeBase},
    transport::{RxPolicy, SerialConfig, SerialPort, Transport},
};

// vim: ts=4 sw=4 expandtab
