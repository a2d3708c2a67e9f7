// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use tickline::IrqCtx;

/// Toggle the debug pin once per interrupt entry.
#[cfg(feature = "debug")]
#[inline(always)]
pub fn isr_mark(_c: &IrqCtx<'_>) {
    use crate::{config::DEBUG_BIT, hw::mcu};

    // SAFETY: Writing a one to PINx toggles the PORTx bit.
    //         This write does not alter the other lines of the port.
    //         We are in interrupt context, so no other access can interleave.
    unsafe {
        (*mcu::PORTD::ptr()).pind().write(|w| w.bits(1 << DEBUG_BIT));
    }
}

#[cfg(not(feature = "debug"))]
#[inline(always)]
pub fn isr_mark(_c: &IrqCtx<'_>) {}

// vim: ts=4 sw=4 expandtab
