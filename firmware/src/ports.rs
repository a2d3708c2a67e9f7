// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::hw::mcu;
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use tickline::{LazyMainInit, MainInitCtx};

#[rustfmt::skip]
macro_rules! impl_port {
    (
        $struct:ident,
        $pinstruct:ident,
        $name:ident,
        $port:ident,
        $pin:ident,
        $bit0:ident,
        $bit1:ident,
        $bit2:ident,
        $bit3:ident,
        $bit4:ident,
        $bit5:ident,
        $bit6:ident,
        $bit7:ident
    ) => {
        #[allow(non_snake_case)]
        pub struct $struct {
            pub $name: mcu::$name,
        }

        // SAFETY: Is initialized when constructing the MainCtx.
        pub static $name: LazyMainInit<$struct> = unsafe { LazyMainInit::uninit() };

        impl $struct {
            #[inline(always)]
            #[allow(dead_code)]
            pub fn get(&self, bit: usize) -> bool {
                match bit {
                    0 => self.$name.$pin().read().$bit0().bit(),
                    1 => self.$name.$pin().read().$bit1().bit(),
                    2 => self.$name.$pin().read().$bit2().bit(),
                    3 => self.$name.$pin().read().$bit3().bit(),
                    4 => self.$name.$pin().read().$bit4().bit(),
                    5 => self.$name.$pin().read().$bit5().bit(),
                    6 => self.$name.$pin().read().$bit6().bit(),
                    7 => self.$name.$pin().read().$bit7().bit(),
                    _ => false,
                }
            }

            #[inline(always)]
            #[allow(dead_code)]
            pub fn set(&self, bit: usize, value: bool) {
                match bit {
                    0 => self.$name.$port().modify(|_, w| w.$bit0().bit(value)),
                    1 => self.$name.$port().modify(|_, w| w.$bit1().bit(value)),
                    2 => self.$name.$port().modify(|_, w| w.$bit2().bit(value)),
                    3 => self.$name.$port().modify(|_, w| w.$bit3().bit(value)),
                    4 => self.$name.$port().modify(|_, w| w.$bit4().bit(value)),
                    5 => self.$name.$port().modify(|_, w| w.$bit5().bit(value)),
                    6 => self.$name.$port().modify(|_, w| w.$bit6().bit(value)),
                    7 => self.$name.$port().modify(|_, w| w.$bit7().bit(value)),
                    _ => (),
                };
            }

            /// Borrow one line as embedded-hal pin.
            #[inline(always)]
            #[allow(dead_code)]
            pub fn pin(&self, bit: usize) -> $pinstruct<'_> {
                $pinstruct { port: self, bit }
            }
        }

        #[allow(dead_code)]
        pub struct $pinstruct<'a> {
            port: &'a $struct,
            bit: usize,
        }

        impl ErrorType for $pinstruct<'_> {
            type Error = Infallible;
        }

        impl InputPin for $pinstruct<'_> {
            #[inline(always)]
            fn is_high(&mut self) -> Result<bool, Self::Error> {
                Ok(self.port.get(self.bit))
            }

            #[inline(always)]
            fn is_low(&mut self) -> Result<bool, Self::Error> {
                Ok(!self.port.get(self.bit))
            }
        }

        impl OutputPin for $pinstruct<'_> {
            #[inline(always)]
            fn set_low(&mut self) -> Result<(), Self::Error> {
                self.port.set(self.bit, false);
                Ok(())
            }

            #[inline(always)]
            fn set_high(&mut self) -> Result<(), Self::Error> {
                self.port.set(self.bit, true);
                Ok(())
            }
        }
    };
}

impl_port!(
    PortB, PinB, PORTB, portb, pinb, pb0, pb1, pb2, pb3, pb4, pb5, pb6, pb7
);
impl_port!(
    PortD, PinD, PORTD, portd, pind, pd0, pd1, pd2, pd3, pd4, pd5, pd6, pd7
);

fn pin_input(_bit: usize) -> u8 {
    0
}
fn pin_output(bit: usize) -> u8 {
    1 << bit
}
fn pin_low(_bit: usize) -> u8 {
    0
}
fn pin_floating(_bit: usize) -> u8 {
    0
}
fn pin_pullup(bit: usize) -> u8 {
    1 << bit
}

impl PortB {
    pub fn setup(&self, _: &MainInitCtx) {
        // SAFETY: Called with interrupts disabled. Ensured by &MainInitCtx.
        unsafe {
            self.PORTB.portb().write(|w| {
                w.bits(
                    pin_floating(0) | // button, external pull-down
                    pin_pullup(1) | // NC
                    pin_pullup(2) | // NC
                    pin_pullup(3) | // ISP MOSI
                    pin_pullup(4) | // ISP MISO
                    pin_low(5) | // LED, button state
                    pin_floating(6) | // XTAL1
                    pin_floating(7), // XTAL2
                )
            });
            self.PORTB.ddrb().write(|w| {
                w.bits(
                    pin_input(0) | // button, external pull-down
                    pin_input(1) | // NC
                    pin_input(2) | // NC
                    pin_input(3) | // ISP MOSI
                    pin_input(4) | // ISP MISO
                    pin_output(5) | // LED, button state
                    pin_input(6) | // XTAL1
                    pin_input(7), // XTAL2
                )
            });
        }
    }
}

impl PortD {
    pub fn setup(&self, _: &MainInitCtx) {
        // SAFETY: Called with interrupts disabled. Ensured by &MainInitCtx.
        unsafe {
            self.PORTD.portd().write(|w| {
                w.bits(
                    pin_pullup(0) | // UART RXD
                    pin_pullup(1) | // UART TXD
                    pin_low(2) | // Debug, ISR marker
                    pin_pullup(3) | // NC
                    pin_pullup(4) | // NC
                    pin_pullup(5) | // NC
                    pin_pullup(6) | // NC
                    pin_pullup(7), // NC
                )
            });
            self.PORTD.ddrd().write(|w| {
                w.bits(
                    pin_input(0) | // UART RXD
                    pin_input(1) | // UART TXD
                    pin_output(2) | // Debug, ISR marker
                    pin_input(3) | // NC
                    pin_input(4) | // NC
                    pin_input(5) | // NC
                    pin_input(6) | // NC
                    pin_input(7), // NC
                )
            });
        }
    }
}

// vim: ts=4 sw=4 expandtab
