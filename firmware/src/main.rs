#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

mod config;
mod debug;
mod hw;
mod ports;
mod system;
mod timer;
mod usart;

use crate::{
    hw::{Peripherals, interrupt, unwrap_option},
    ports::{PORTB, PORTD, PortB, PortD},
    system::System,
};
use panic_halt as _;
use tickline::{MainCtx, MainInitCtx};

static SYSTEM: System = System::new();

#[avr_device::entry]
fn main() -> ! {
    let dp = unwrap_option(Peripherals::take());

    let portb = PortB { PORTB: dp.PORTB };
    let portd = PortD { PORTD: dp.PORTD };

    let init_static_vars = |ctx: &MainInitCtx| {
        portb.setup(ctx);
        portd.setup(ctx);
        PORTB.init(ctx, portb);
        PORTD.init(ctx, portd);
    };

    // SAFETY:
    // This is the context handle for the main() function.
    // Holding a reference to this object proves that the holder
    // is running in main() context.
    // Interrupts are still disabled after reset.
    let m = unsafe { MainCtx::new_with_init(init_static_vars) };

    SYSTEM.init(&m);

    // SAFETY: This must be after construction of MainCtx
    //         and after initialization of static MainInit variables.
    unsafe { interrupt::enable() };

    SYSTEM.start(&m);
    loop {
        SYSTEM.run(&m);
    }
}

// vim: ts=4 sw=4 expandtab
