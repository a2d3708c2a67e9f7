// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    config::{BANNER, SERIAL, TICK_DIV, TICK_PERIOD},
    debug::isr_mark,
    hw::Vector,
    timer::{Timer0, latch_vector},
    usart::Usart0,
};
use tickline::{IrqCtx, MainCtx, RxPolicy, TimeBase, Transport, dispatch};

#[cfg(feature = "events")]
const RX_POLICY: RxPolicy = RxPolicy::Echo;
#[cfg(not(feature = "events"))]
const RX_POLICY: RxPolicy = RxPolicy::Buffered;

static LINK: Transport<Usart0> = Transport::new(Usart0::new(), RX_POLICY);
static TIME: TimeBase<Timer0, TICK_DIV> = TimeBase::new(Timer0::new());

/// Common body of both interrupt vectors.
///
/// Every sub-handler checks its own flag, so the vector that fired
/// does not matter beyond latching the timer event.
pub fn irq_entry(c: &IrqCtx<'_>, vector: Vector) {
    if vector == Vector::Timer0CompA {
        latch_vector(c);
        isr_mark(c);
    }
    dispatch(c, &(&LINK, &TIME));
}

#[cfg(feature = "events")]
mod variant {
    use super::{LINK, TIME};
    use crate::{
        config::{BUTTON_BIT, BUTTON_POLARITY, LED_BIT},
        hw::unwrap_result,
        ports::PORTB,
    };
    use tickline::{EdgeDetector, MainCtx, report_event};

    pub struct Variant {
        button: EdgeDetector,
    }

    impl Variant {
        pub const fn new() -> Self {
            Self {
                button: EdgeDetector::new(BUTTON_POLARITY),
            }
        }

        pub fn init(&self, m: &MainCtx<'_>) {
            let portb = PORTB.deref(m);
            unwrap_result(self.button.init(m, &mut portb.pin(LED_BIT)));
        }

        pub fn run(&self, m: &MainCtx<'_>) {
            let portb = PORTB.deref(m);
            let now = TIME.now(m);
            let edge = self
                .button
                .poll(m, now, &mut portb.pin(BUTTON_BIT), &mut portb.pin(LED_BIT));
            if let Some(edge) = unwrap_result(edge) {
                report_event(&LINK, &edge);
            }
        }
    }
}

#[cfg(feature = "echo")]
mod variant {
    use super::LINK;
    use tickline::{Console, MainCtx};

    pub struct Variant {
        console: Console,
    }

    impl Variant {
        pub const fn new() -> Self {
            Self {
                console: Console::new(),
            }
        }

        pub fn init(&self, _m: &MainCtx<'_>) {}

        pub fn run(&self, m: &MainCtx<'_>) {
            self.console.echo_once(m, &LINK);
        }
    }
}

#[cfg(feature = "console")]
mod variant {
    use super::LINK;
    use crate::config::LINE_MAX;
    use tickline::{Console, MainCtx};

    pub struct Variant {
        console: Console,
    }

    impl Variant {
        pub const fn new() -> Self {
            Self {
                console: Console::new(),
            }
        }

        pub fn init(&self, _m: &MainCtx<'_>) {}

        pub fn run(&self, m: &MainCtx<'_>) {
            let mut line = heapless::Vec::<u8, LINE_MAX>::new();
            self.console.serve_line(m, &LINK, &mut line);
        }
    }
}

pub struct System {
    variant: variant::Variant,
}

impl System {
    pub const fn new() -> Self {
        Self {
            variant: variant::Variant::new(),
        }
    }

    /// Bring up the peripherals. Interrupts are still disabled.
    pub fn init(&self, m: &MainCtx<'_>) {
        LINK.init(m, SERIAL);
        TIME.init(m, TICK_PERIOD);
        self.variant.init(m);
    }

    /// Announce the system. Interrupts are enabled.
    pub fn start(&self, _m: &MainCtx<'_>) {
        LINK.send_line(BANNER);
    }

    /// One main loop iteration.
    pub fn run(&self, m: &MainCtx<'_>) {
        self.variant.run(m);
    }
}

// vim: ts=4 sw=4 expandtab
