// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::context::IrqCtx;

/// One flag-guarded sub-handler of the shared interrupt vector.
pub trait IrqHandler {
    /// Service the event, if its flag is pending.
    ///
    /// Returns `true` if the event was pending and has been serviced.
    fn handle_irq(&self, c: &IrqCtx<'_>) -> bool;
}

impl<T: IrqHandler + ?Sized> IrqHandler for &T {
    #[inline(always)]
    fn handle_irq(&self, c: &IrqCtx<'_>) -> bool {
        (**self).handle_irq(c)
    }
}

impl IrqHandler for () {
    #[inline(always)]
    fn handle_irq(&self, _c: &IrqCtx<'_>) -> bool {
        false
    }
}

impl<A: IrqHandler, B: IrqHandler> IrqHandler for (A, B) {
    #[inline(always)]
    fn handle_irq(&self, c: &IrqCtx<'_>) -> bool {
        // No short circuit. Both sources are serviced in the same invocation.
        let a = self.0.handle_irq(c);
        let b = self.1.handle_irq(c);
        a | b
    }
}

/// Interrupt vector entry point.
///
/// Runs all sub-handlers once. Returns whether anything was pending.
#[inline(always)]
pub fn dispatch<H: IrqHandler>(c: &IrqCtx<'_>, handlers: &H) -> bool {
    handlers.handle_irq(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::MainCtx,
        time::{Millis, TimeBase, tests::FakeTimer},
        transport::{RxPolicy, Transport, tests::FakePort},
    };

    #[test]
    fn test_both_sources_one_invocation() {
        let link = Transport::new(FakePort::default(), RxPolicy::Buffered);
        let tb: TimeBase<FakeTimer, 1> = TimeBase::new(FakeTimer::default());
        // SAFETY: Single threaded test.
        let m = unsafe { MainCtx::new() };
        // SAFETY: Single threaded test. Emulated interrupt context.
        let c = unsafe { IrqCtx::new() };

        link.port().arrive(b'x');
        tb.source().fire();
        assert!(dispatch(&c, &(&link, &tb)));

        assert_eq!(link.try_receive(&m), Some(b'x'));
        assert_eq!(tb.now(&m), Millis(1));
        assert!(!dispatch(&c, &(&link, &tb)));
    }

    #[test]
    fn test_sub_handlers_independent() {
        let link = Transport::new(FakePort::default(), RxPolicy::Buffered);
        let tb: TimeBase<FakeTimer, 1> = TimeBase::new(FakeTimer::default());
        // SAFETY: Single threaded test.
        let m = unsafe { MainCtx::new() };
        // SAFETY: Single threaded test. Emulated interrupt context.
        let c = unsafe { IrqCtx::new() };

        tb.source().fire();
        assert!(dispatch(&c, &(&link, &tb)));
        assert_eq!(link.try_receive(&m), None);
        assert_eq!(tb.now(&m), Millis(1));

        link.port().arrive(b'y');
        assert!(dispatch(&c, &(&link, &tb)));
        assert_eq!(tb.now(&m), Millis(1));
        assert_eq!(link.try_receive(&m), Some(b'y'));

        assert!(!dispatch(&c, &()));
    }
}

// vim: ts=4 sw=4 expandtab
