// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interactive serial console on top of the buffered receive mailbox.

use crate::{
    context::{MainCtx, MainCtxCell},
    transport::{SerialPort, Transport},
};
use heapless::Vec;

const BS: u8 = 0x08;
const DEL: u8 = 0x7F;

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LineEnd {
    /// The whole line fit into the buffer.
    Complete,
    /// Bytes beyond the buffer capacity were dropped.
    Truncated,
}

pub struct Console {
    /// The previous line was terminated by CR.
    after_cr: MainCtxCell<bool>,
}

impl Console {
    pub const fn new() -> Self {
        Self {
            after_cr: MainCtxCell::new(false),
        }
    }

    /// Receive one byte and echo it. LF is echoed as CR LF.
    pub fn echo_once<P: SerialPort>(&self, m: &MainCtx<'_>, link: &Transport<P>) -> u8 {
        let byte = link.receive_blocking(m);
        if byte == b'\n' {
            link.send(b'\r');
        }
        link.send(byte);
        byte
    }

    /// Read one line with echo and simple editing.
    ///
    /// CR or LF terminates the line. An LF right after a CR terminated line is ignored.
    /// The terminator is not stored.
    pub fn read_line<P: SerialPort, const N: usize>(
        &self,
        m: &MainCtx<'_>,
        link: &Transport<P>,
        line: &mut Vec<u8, N>,
    ) -> LineEnd {
        line.clear();
        let mut end = LineEnd::Complete;
        loop {
            let byte = link.receive_blocking(m);
            let after_cr = self.after_cr.replace(m, false);
            match byte {
                b'\n' if after_cr && line.is_empty() => (),
                b'\r' | b'\n' => {
                    self.after_cr.set(m, byte == b'\r');
                    link.send_bytes(b"\r\n");
                    return end;
                }
                BS | DEL => {
                    if line.pop().is_some() {
                        link.send_bytes(&[BS, b' ', BS]);
                    }
                }
                _ => {
                    if line.push(byte).is_ok() {
                        link.send(byte);
                    } else {
                        end = LineEnd::Truncated;
                    }
                }
            }
        }
    }

    /// Read a line and answer with its reversal.
    pub fn serve_line<P: SerialPort, const N: usize>(
        &self,
        m: &MainCtx<'_>,
        link: &Transport<P>,
        line: &mut Vec<u8, N>,
    ) -> LineEnd {
        let end = self.read_line(m, link, line);
        reverse(line);
        link.send_line(line);
        end
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse a byte string in place.
pub fn reverse(bytes: &mut [u8]) {
    bytes.reverse();
}


// vim: ts=4 sw=4 expandtab
