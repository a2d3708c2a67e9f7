// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    context::{IrqCtx, IrqCtxCell, IrqSharedCell, MainCtx},
    irq::IrqHandler,
};
use derive_more::{From, Into};

/// Hardware tick period in microseconds.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct TickPeriod(pub u32);

impl TickPeriod {
    #[inline]
    pub const fn from_micros(us: u32) -> Self {
        Self(us)
    }

    #[inline]
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms * 1000)
    }

    #[inline]
    pub const fn as_micros(self) -> u32 {
        self.0
    }
}

/// Periodic hardware interrupt source.
pub trait TickSource {
    /// Program the source to fire once per `period` and enable its interrupt.
    fn configure(&self, period: TickPeriod);

    /// The source has fired since the last [TickSource::rearm].
    fn overflowed(&self) -> bool;

    /// Acknowledge the current firing and arm the source for the next period.
    fn rearm(&self);
}

/// Absolute system time in milliseconds.
///
/// The counter wraps after about 49.7 days.
/// Comparisons treat the value space as a circle, so two stamps
/// compare correctly as long as they are less than half the range apart.
#[derive(PartialEq, Eq, Copy, Clone, Debug, From, Into)]
pub struct Millis(pub u32);

/// Signed distance between two [Millis].
#[derive(PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Debug, From, Into)]
pub struct RelMillis(pub i32);

impl Millis {
    pub const MAX: Millis = Millis(u32::MAX);

    #[inline]
    pub const fn new() -> Self {
        Millis(0)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl Default for Millis {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Ord for Millis {
    #[inline]
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        if self.0 == other.0 {
            core::cmp::Ordering::Equal
        } else if self.0.wrapping_sub(other.0) & (1 << (u32::BITS - 1)) == 0 {
            core::cmp::Ordering::Greater
        } else {
            core::cmp::Ordering::Less
        }
    }
}

impl PartialOrd for Millis {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl core::ops::Add<RelMillis> for Millis {
    type Output = Self;

    #[inline]
    fn add(self, other: RelMillis) -> Self::Output {
        Millis(self.0.wrapping_add(other.0 as u32))
    }
}

impl core::ops::Sub for Millis {
    type Output = RelMillis;

    #[inline]
    fn sub(self, other: Self) -> Self::Output {
        RelMillis(self.0.wrapping_sub(other.0) as i32)
    }
}

impl ufmt::uDisplay for Millis {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uDisplay::fmt(&self.0, f)
    }
}

impl RelMillis {
    #[inline]
    pub const fn from_millis(ms: i32) -> Self {
        RelMillis(ms)
    }
}

/// Interrupt driven millisecond clock.
///
/// `DIV` hardware ticks make up one [Millis] step.
pub struct TimeBase<S, const DIV: u8> {
    source: S,
    divider: IrqCtxCell<u8>,
    clock: IrqSharedCell<Millis>,
}

impl<S: TickSource, const DIV: u8> TimeBase<S, DIV> {
    pub const fn new(source: S) -> Self {
        Self::starting_at(source, Millis::new())
    }

    /// Create a time base whose clock starts at `start` instead of zero.
    pub const fn starting_at(source: S, start: Millis) -> Self {
        assert!(DIV > 0);
        Self {
            source,
            divider: IrqCtxCell::new(0),
            clock: IrqSharedCell::new(start),
        }
    }

    /// Configure the hardware source and enable its interrupt.
    pub fn init(&self, _m: &MainCtx<'_>, period: TickPeriod) {
        self.source.configure(period);
    }

    /// Current system time.
    #[inline]
    pub fn now(&self, m: &MainCtx<'_>) -> Millis {
        self.clock.get(m)
    }

    /// Busy wait for at least `duration`.
    pub fn delay(&self, m: &MainCtx<'_>, duration: RelMillis) {
        let end = self.now(m) + duration;
        while self.now(m) < end {
            core::hint::spin_loop();
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn tick(&self, c: &IrqCtx<'_>) {
        let count = self.divider.get(c).wrapping_add(1);
        if count >= DIV {
            let now = self.clock.get_irq(c);
            self.clock.set_irq(c, Millis(now.0.wrapping_add(1)));
            self.divider.set(c, 0);
        } else {
            self.divider.set(c, count);
        }
    }
}

impl<S: TickSource, const DIV: u8> IrqHandler for TimeBase<S, DIV> {
    fn handle_irq(&self, c: &IrqCtx<'_>) -> bool {
        if !self.source.overflowed() {
            return false;
        }
        self.tick(c);
        // Re-arm on every firing, not only on divider match.
        // Otherwise the clock stalls.
        self.source.rearm();
        true
    }
}


// vim: ts=4 sw=4 expandtab
