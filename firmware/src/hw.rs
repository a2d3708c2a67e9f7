pub use avr_device::atmega328p as mcu;
pub use avr_device::interrupt;
pub use mcu::Peripherals;

use tickline::IrqCtx;

#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Vector {
    UsartRx,
    Timer0CompA,
}

macro_rules! define_isr {
    ($name:ident, $vector:expr) => {
        #[avr_device::interrupt(atmega328p)]
        fn $name() {
            // SAFETY: We are inside of an interrupt handler.
            // Therefore, it is safe to construct an `IrqCtx`.
            let c = unsafe { IrqCtx::new() };
            crate::system::irq_entry(&c, $vector);
        }
    };
}

define_isr!(USART_RX, Vector::UsartRx);
define_isr!(TIMER0_COMPA, Vector::Timer0CompA);

/// Cheaper Option::unwrap() alternative.
///
/// This is cheaper, because it doesn't call into the panic unwind path.
/// Therefore, it does not impose caller-saves overhead onto the calling function.
#[inline(always)]
pub fn unwrap_option<T>(value: Option<T>) -> T {
    match value {
        Some(value) => value,
        None => halt(),
    }
}

/// Cheaper Result::unwrap() alternative.
///
/// This is cheaper, because it doesn't call into the panic unwind path.
/// Therefore, it does not impose caller-saves overhead onto the calling function.
#[inline(always)]
pub fn unwrap_result<T, E>(value: Result<T, E>) -> T {
    match value {
        Ok(value) => value,
        Err(_) => halt(),
    }
}

/// Stop the system.
///
/// The watchdog is not running. Interrupts stay enabled,
/// so the clock keeps ticking and the receive echo keeps working.
#[inline(always)]
#[allow(clippy::empty_loop)]
pub fn halt() -> ! {
    loop {}
}

// vim: ts=4 sw=4 expandtab
