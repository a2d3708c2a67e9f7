// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::{config::FCPU, hw::mcu};
use core::cell::Cell;
use critical_section::Mutex;
use tickline::{SerialConfig, SerialPort};

/// UBRR value for `baud` at `fcpu`, rounded to the nearest divisor.
pub const fn ubrr(fcpu: u32, baud: u32, double_speed: bool) -> u16 {
    let div = if double_speed { 8 } else { 16 } * baud;
    ((fcpu + div / 2) / div - 1) as u16
}

const _: () = assert!(ubrr(16_000_000, 9_600, true) == 207);
const _: () = assert!(ubrr(16_000_000, 9_600, false) == 103);

/// Hardware USART0.
///
/// Both contexts use it through [tickline::Transport],
/// which serializes the transmitter access.
pub struct Usart0 {
    /// At least one byte was written since reset.
    /// TXC0 reads zero after reset, although the shift register is empty.
    written: Mutex<Cell<bool>>,
}

impl Usart0 {
    pub const fn new() -> Self {
        Self {
            written: Mutex::new(Cell::new(false)),
        }
    }

    #[inline(always)]
    fn regs(&self) -> &mcu::usart0::RegisterBlock {
        // SAFETY: The USART0 registers are only accessed through this handle.
        //         There is exactly one handle, owned by the static Transport.
        unsafe { &*mcu::USART0::ptr() }
    }
}

impl SerialPort for Usart0 {
    #[rustfmt::skip]
    fn configure(&self, config: SerialConfig) {
        let r = self.regs();
        r.ucsr0b().write(|w| w);
        // SAFETY: Any 12 bit divisor value is valid.
        r.ubrr0().write(|w| unsafe { w.bits(ubrr(FCPU, config.baud, config.double_speed)) });
        r.ucsr0a().write(|w| w.u2x0().bit(config.double_speed));
        r.ucsr0c().write(|w| {
            w.umsel0().usart_async()
             .upm0().disabled()
             .usbs0().stop1()
             .ucsz0().chr8()
        });
        r.ucsr0b().write(|w| {
            w.rxen0().set_bit()
             .txen0().set_bit()
             .rxcie0().set_bit()
        });
    }

    /// The previous byte has completely left the shift register.
    #[inline(always)]
    fn tx_ready(&self) -> bool {
        let written = critical_section::with(|cs| self.written.borrow(cs).get());
        !written || self.regs().ucsr0a().read().txc0().bit_is_set()
    }

    #[inline(always)]
    fn write_tx(&self, byte: u8) {
        let r = self.regs();
        critical_section::with(|cs| self.written.borrow(cs).set(true));
        // TXC0 is cleared by writing one. Keep U2X0, the other bits must be written as zero.
        let u2x = r.ucsr0a().read().u2x0().bit();
        r.ucsr0a().write(|w| w.txc0().set_bit().u2x0().bit(u2x));
        // SAFETY: Any byte is valid data.
        r.udr0().write(|w| unsafe { w.bits(byte) });
    }

    #[inline(always)]
    fn rx_full(&self) -> bool {
        self.regs().ucsr0a().read().rxc0().bit_is_set()
    }

    #[inline(always)]
    fn read_rx(&self) -> u8 {
        self.regs().udr0().read().bits()
    }
}

// vim: ts=4 sw=4 expandtab
