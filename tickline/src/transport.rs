// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serial byte transport.
//!
//! Transmission is a blocking busy-wait on the transmitter ready flag.
//! Reception is interrupt fed into a single byte mailbox.
//! A byte arriving before the previous one has been consumed
//! overwrites it. There is no queue and the loss is not reported.

use crate::{
    context::{IrqCtx, IrqSharedCell, MainCtx},
    irq::IrqHandler,
};

/// Serial link parameters. Frames are always 8N1.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct SerialConfig {
    pub baud: u32,
    /// Double speed (high baud rate) divisor mode.
    pub double_speed: bool,
}

impl SerialConfig {
    pub const fn new(baud: u32, double_speed: bool) -> Self {
        Self { baud, double_speed }
    }
}

/// UART peripheral.
pub trait SerialPort {
    /// Program frame format and baud rate, enable TX, RX and the RX interrupt.
    fn configure(&self, config: SerialConfig);

    /// The previously written byte has been fully shifted out.
    ///
    /// Also true after reset, before the first write.
    fn tx_ready(&self) -> bool;

    /// Write a byte to the transmitter. Only call if [SerialPort::tx_ready].
    fn write_tx(&self, byte: u8);

    /// The receive register holds a byte.
    fn rx_full(&self) -> bool;

    /// Read the receive register. This acknowledges the receive flag.
    fn read_rx(&self) -> u8;
}

/// What the receive interrupt does with a received byte.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum RxPolicy {
    /// Transmit the byte back right from the interrupt handler.
    /// The mailbox stays empty.
    Echo,
    /// Store the byte in the mailbox for the main context.
    Buffered,
}

pub struct Transport<P> {
    port: P,
    policy: RxPolicy,
    slot: IrqSharedCell<Option<u8>>,
}

impl<P: SerialPort> Transport<P> {
    pub const fn new(port: P, policy: RxPolicy) -> Self {
        Self {
            port,
            policy,
            slot: IrqSharedCell::new(None),
        }
    }

    pub fn init(&self, _m: &MainCtx<'_>, config: SerialConfig) {
        self.port.configure(config);
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Transmit one byte.
    ///
    /// Spins until the previous byte has left the shift register.
    /// There is no timeout. On return the new byte may still be shifting out.
    ///
    /// Callable from both contexts. With [RxPolicy::Echo] the receive
    /// interrupt transmits, too. Therefore the ready check and the write
    /// form one critical section. Interrupts are enabled between polls.
    #[inline(never)]
    pub fn send(&self, byte: u8) {
        loop {
            let written = critical_section::with(|_| {
                if self.port.tx_ready() {
                    self.port.write_tx(byte);
                    true
                } else {
                    false
                }
            });
            if written {
                break;
            }
            core::hint::spin_loop();
        }
    }

    pub fn send_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.send(byte);
        }
    }

    /// Transmit `bytes` followed by CR LF.
    ///
    /// The terminator is always appended, whatever `bytes` ends with.
    pub fn send_line(&self, bytes: &[u8]) {
        self.send_bytes(bytes);
        self.send(b'\r');
        self.send(b'\n');
    }

    /// Take the mailbox byte, if there is one.
    #[inline]
    pub fn try_receive(&self, m: &MainCtx<'_>) -> Option<u8> {
        self.slot.replace(m, None)
    }

    /// The mailbox holds a byte that has not been consumed yet.
    #[inline]
    pub fn rx_pending(&self, m: &MainCtx<'_>) -> bool {
        self.slot.get(m).is_some()
    }

    /// Wait for the next received byte.
    ///
    /// Spins until the receive interrupt fills the mailbox.
    /// This never returns, if interrupts are disabled.
    pub fn receive_blocking(&self, m: &MainCtx<'_>) -> u8 {
        loop {
            if let Some(byte) = self.try_receive(m) {
                return byte;
            }
            core::hint::spin_loop();
        }
    }
}

impl<P: SerialPort> IrqHandler for Transport<P> {
    fn handle_irq(&self, c: &IrqCtx<'_>) -> bool {
        if !self.port.rx_full() {
            return false;
        }
        let byte = self.port.read_rx();
        match self.policy {
            RxPolicy::Echo => self.send(byte),
            RxPolicy::Buffered => self.slot.set_irq(c, Some(byte)),
        }
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::cell::{Cell, RefCell};

    /// UART that records transmitted bytes.
    #[derive(Default)]
    pub struct FakePort {
        pub config: Cell<Option<SerialConfig>>,
        pub tx: RefCell<Vec<u8>>,
        pub rx: Cell<Option<u8>>,
        /// Number of `tx_ready` polls that report busy after each write,
        /// while the byte is shifting out.
        pub busy_polls: Cell<u32>,
        busy_left: Cell<u32>,
        pub polls: Cell<u32>,
    }

    impl FakePort {
        pub fn arrive(&self, byte: u8) {
            self.rx.set(Some(byte));
        }

        pub fn take_tx(&self) -> Vec<u8> {
            self.tx.take()
        }
    }

    impl SerialPort for FakePort {
        fn configure(&self, config: SerialConfig) {
            self.config.set(Some(config));
        }

        fn tx_ready(&self) -> bool {
            self.polls.set(self.polls.get() + 1);
            let left = self.busy_left.get();
            if left > 0 {
                self.busy_left.set(left - 1);
                false
            } else {
                true
            }
        }

        fn write_tx(&self, byte: u8) {
            assert_eq!(self.busy_left.get(), 0, "write while busy");
            self.tx.borrow_mut().push(byte);
            self.busy_left.set(self.busy_polls.get());
        }

        fn rx_full(&self) -> bool {
            self.rx.get().is_some()
        }

        fn read_rx(&self) -> u8 {
            self.rx.take().unwrap_or(0)
        }
    }

    fn irq<R>(f: impl FnOnce(&IrqCtx<'_>) -> R) -> R {
        // SAFETY: Single threaded test. Emulated interrupt context.
        let c = unsafe { IrqCtx::new() };
        f(&c)
    }

    #[test]
    fn test_send_line_termination() {
        let link = Transport::new(FakePort::default(), RxPolicy::Buffered);

        link.send_line(b"");
        assert_eq!(link.port().take_tx(), b"\r\n");
        link.send_line(b"abc");
        assert_eq!(link.port().take_tx(), b"abc\r\n");
        link.send_line(b"abc\n");
        assert_eq!(link.port().take_tx(), b"abc\n\r\n");
        link.send_line(b"abc\r\n");
        assert_eq!(link.port().take_tx(), b"abc\r\n\r\n");
        link.send_line(b"abc\r");
        assert_eq!(link.port().take_tx(), b"abc\r\r\n");
    }

    #[test]
    fn test_send_waits_for_ready() {
        let port = FakePort::default();
        port.busy_polls.set(3);
        let link = Transport::new(port, RxPolicy::Buffered);
        // SAFETY: Single threaded test.
        let m = unsafe { MainCtx::new() };

        link.init(&m, SerialConfig::new(9600, true));
        assert_eq!(link.port().config.get(), Some(SerialConfig::new(9600, true)));

        // Idle after reset. The first byte goes out on the first poll.
        link.send(b'o');
        assert_eq!(link.port().polls.get(), 1);
        // The next byte waits until the previous one has been shifted out.
        link.send(b'k');
        assert_eq!(link.port().polls.get(), 5);
        assert_eq!(link.port().take_tx(), b"ok");
    }

    #[test]
    fn test_loopback_in_order() {
        let link = Transport::new(FakePort::default(), RxPolicy::Buffered);
        // SAFETY: Single threaded test.
        let m = unsafe { MainCtx::new() };

        let data = b"The quick brown fox\x00\xFF\r\n";
        let mut got = Vec::new();
        for &byte in data {
            link.send(byte);
            let sent = *link.port().tx.borrow().last().unwrap();
            link.port().arrive(sent);
            assert!(irq(|c| link.handle_irq(c)));
            got.push(link.receive_blocking(&m));
        }
        assert_eq!(got, data);
        assert_eq!(link.try_receive(&m), None);
    }

    #[test]
    fn test_mailbox_overwrites() {
        let link = Transport::new(FakePort::default(), RxPolicy::Buffered);
        // SAFETY: Single threaded test.
        let m = unsafe { MainCtx::new() };

        assert_eq!(link.try_receive(&m), None);
        assert!(!link.rx_pending(&m));
        link.port().arrive(b'1');
        irq(|c| link.handle_irq(c));
        link.port().arrive(b'2');
        irq(|c| link.handle_irq(c));

        // Only the latest byte survives.
        assert!(link.rx_pending(&m));
        assert_eq!(link.try_receive(&m), Some(b'2'));
        assert_eq!(link.try_receive(&m), None);
    }

    #[test]
    fn test_echo_policy() {
        let link = Transport::new(FakePort::default(), RxPolicy::Echo);
        // SAFETY: Single threaded test.
        let m = unsafe { MainCtx::new() };

        for &byte in b"hi\n" {
            link.port().arrive(byte);
            assert!(irq(|c| link.handle_irq(c)));
        }
        assert_eq!(link.port().take_tx(), b"hi\n");
        assert_eq!(link.try_receive(&m), None);
        assert!(!irq(|c| link.handle_irq(c)));
    }
}

// vim: ts=4 sw=4 expandtab
