// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::{config::FCPU, hw::mcu};
use core::cell::Cell;
use critical_section::Mutex;
use tickline::{IrqCtx, TickPeriod, TickSource};

const PRESCALERS: [u32; 5] = [1, 8, 64, 256, 1024];

/// Find the smallest TC0 prescaler that hits `period` exactly in CTC mode.
///
/// Returns (prescaler, OCR0A).
pub const fn tc0_setup(fcpu: u32, period: TickPeriod) -> Option<(u32, u8)> {
    let cycles = fcpu as u64 * period.as_micros() as u64;
    let mut i = 0;
    while i < PRESCALERS.len() {
        let div = PRESCALERS[i] as u64 * 1_000_000;
        if cycles % div == 0 {
            let counts = cycles / div;
            if counts >= 1 && counts <= 256 {
                return Some((PRESCALERS[i], (counts - 1) as u8));
            }
        }
        i += 1;
    }
    None
}

const _: () = assert!(matches!(
    tc0_setup(16_000_000, TickPeriod::from_millis(1)),
    Some((64, 249))
));

/// Compare match seen by the vector.
///
/// Entering TIMER0_COMPA clears OCF0A in hardware.
/// The vector records the event here, so the shared handler can still see it.
static TICK_FIRED: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// Record the compare match. Call at the entry of the TIMER0_COMPA vector.
pub fn latch_vector(c: &IrqCtx<'_>) {
    TICK_FIRED.borrow(c.cs()).set(true);
}

/// Timer/Counter 0 in CTC mode as the system tick source.
pub struct Timer0(());

impl Timer0 {
    pub const fn new() -> Self {
        Self(())
    }

    #[inline(always)]
    fn regs(&self) -> &mcu::tc0::RegisterBlock {
        // SAFETY: The TC0 registers are only accessed through this handle.
        //         There is exactly one handle, owned by the static TimeBase.
        unsafe { &*mcu::TC0::ptr() }
    }
}

// `overflowed` and `rearm` only run from the interrupt handler.
// The trait passes no IrqCtx, so the latch is reached through
// `critical_section::with`. With interrupts already disabled it only
// saves and restores SREG.
impl TickSource for Timer0 {
    #[rustfmt::skip]
    fn configure(&self, period: TickPeriod) {
        let Some((prescaler, top)) = tc0_setup(FCPU, period) else {
            crate::hw::halt();
        };
        let r = self.regs();
        r.tccr0b().write(|w| w.cs0().no_clock());
        r.tcnt0().write(|w| w);
        // SAFETY: Any TOP value is valid.
        r.ocr0a().write(|w| unsafe { w.bits(top) });
        r.tccr0a().write(|w| w.wgm0().ctc());
        r.tifr0().write(|w| w.ocf0a().set_bit());
        r.timsk0().write(|w| w.ocie0a().set_bit());
        r.tccr0b().write(|w| match prescaler {
            1 => w.cs0().direct(),
            8 => w.cs0().prescale_8(),
            64 => w.cs0().prescale_64(),
            256 => w.cs0().prescale_256(),
            _ => w.cs0().prescale_1024(),
        });
    }

    #[inline(always)]
    fn overflowed(&self) -> bool {
        let latched = critical_section::with(|cs| TICK_FIRED.borrow(cs).get());
        latched || self.regs().tifr0().read().ocf0a().bit_is_set()
    }

    #[inline(always)]
    fn rearm(&self) {
        critical_section::with(|cs| TICK_FIRED.borrow(cs).set(false));
        // Flag bits are cleared by writing one.
        self.regs().tifr0().write(|w| w.ocf0a().set_bit());
    }
}

// vim: ts=4 sw=4 expandtab
