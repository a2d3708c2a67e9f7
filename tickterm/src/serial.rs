// -*- coding: utf-8 -*-

use anyhow::{self as ah, Context as _};
use serialport::SerialPort;
use std::{io::ErrorKind, time::Duration};

pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD: u32 = 9_600;

/// Open the port with the firmware's 8N1 framing.
pub fn open(port: &str, baud: u32) -> ah::Result<Box<dyn SerialPort>> {
    serialport::new(port, baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .flow_control(serialport::FlowControl::None)
        .stop_bits(serialport::StopBits::One)
        .timeout(Duration::from_millis(500))
        .open()
        .with_context(|| format!("Open serial port {port}"))
}

/// Splits the received byte stream into CR LF terminated lines.
pub struct LineReader {
    serial: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl LineReader {
    pub fn new(serial: Box<dyn SerialPort>) -> Self {
        Self {
            serial,
            pending: Vec::new(),
        }
    }

    pub fn serial(&mut self) -> &mut dyn SerialPort {
        self.serial.as_mut()
    }

    /// Get the next complete line without terminator.
    ///
    /// Returns `None`, if the read timed out before a line was complete.
    /// A partial line is kept for the next call.
    pub fn read_line(&mut self) -> ah::Result<Option<String>> {
        let mut buf = [0_u8; 64];
        loop {
            if let Some(line) = take_line(&mut self.pending) {
                return Ok(Some(line));
            }
            match self.serial.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(count) => self.pending.extend_from_slice(&buf[..count]),
                Err(e) if e.kind() == ErrorKind::TimedOut => return Ok(None),
                Err(e) => return Err(e).context("Serial port read"),
            }
        }
    }
}

/// Remove the first LF terminated line from `pending`.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = pending.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = pending.drain(..=end).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(String::from_utf8_lossy(&line).into_owned())
}


// vim: ts=4 sw=4 expandtab
