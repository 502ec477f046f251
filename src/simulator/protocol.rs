//! TraCI wire format: big-endian scalars, length-prefixed strings, and
//! commands framed by a one-byte length (or a zero byte followed by a
//! four-byte length when the command does not fit in 255 bytes).

use crate::error::{Result, TrafficError};

pub const CMD_GETVERSION: u8 = 0x00;
pub const CMD_LOAD: u8 = 0x01;
pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_CLOSE: u8 = 0x7F;

pub const CMD_GET_LANE_VARIABLE: u8 = 0xA3;
pub const RESPONSE_GET_LANE_VARIABLE: u8 = 0xB3;
pub const CMD_SET_TL_VARIABLE: u8 = 0xC2;

pub const LAST_STEP_VEHICLE_HALTING_NUMBER: u8 = 0x14;
pub const VAR_WAITING_TIME: u8 = 0x7A;
pub const TL_PHASE_INDEX: u8 = 0x22;

pub const TYPE_INTEGER: u8 = 0x09;
pub const TYPE_DOUBLE: u8 = 0x0B;
pub const TYPE_STRING: u8 = 0x0C;
pub const TYPE_STRINGLIST: u8 = 0x0E;

pub const RTYPE_OK: u8 = 0x00;
pub const RTYPE_NOTIMPLEMENTED: u8 = 0x01;
pub const RTYPE_ERR: u8 = 0xFF;

/// Accumulates the body of one command.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Writer::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn f64(&mut self, value: f64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn string(&mut self, value: &str) -> &mut Self {
        self.i32(value.len() as i32);
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    pub fn string_list(&mut self, values: &[String]) -> &mut Self {
        self.u8(TYPE_STRINGLIST).i32(values.len() as i32);
        for value in values {
            self.string(value);
        }
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Frame one command: length, command id, body.
pub fn frame_command(command: u8, body: &[u8]) -> Vec<u8> {
    let short_len = 1 + 1 + body.len();
    let mut out = Vec::with_capacity(short_len + 4);
    if short_len <= u8::MAX as usize {
        out.push(short_len as u8);
    } else {
        out.push(0);
        out.extend_from_slice(&((short_len + 4) as u32).to_be_bytes());
    }
    out.push(command);
    out.extend_from_slice(body);
    out
}

/// Wrap framed commands into a message with its four-byte total length.
pub fn frame_message(commands: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(commands.len() + 4);
    out.extend_from_slice(&((commands.len() + 4) as u32).to_be_bytes());
    out.extend_from_slice(commands);
    out
}

/// Cursor over a received message body.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(TrafficError::SimulatorError(format!(
                "truncated TraCI response: wanted {} bytes, {} left",
                n,
                self.remaining()
            )));
        }
        let buf = self.buf;
        let slice = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn i32(&mut self) -> Result<i32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(i32::from_be_bytes(bytes))
    }

    pub fn f64(&mut self) -> Result<f64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(f64::from_be_bytes(bytes))
    }

    pub fn string(&mut self) -> Result<String> {
        let len = self.i32()?;
        if len < 0 {
            return Err(TrafficError::SimulatorError(format!(
                "negative string length {} in TraCI response",
                len
            )));
        }
        let bytes = self.take(len as usize)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a command header and return `(command id, body length)`.
    pub fn command_header(&mut self) -> Result<(u8, usize)> {
        let short_len = self.u8()? as usize;
        let body_len = if short_len == 0 {
            let len = self.i32()?;
            (len as usize)
                .checked_sub(1 + 4 + 1)
                .ok_or_else(|| TrafficError::SimulatorError(format!("bad extended command length {}", len)))?
        } else {
            short_len
                .checked_sub(1 + 1)
                .ok_or_else(|| TrafficError::SimulatorError(format!("bad command length {}", short_len)))?
        };
        let command = self.u8()?;
        Ok((command, body_len))
    }

    /// Read the status block every command is answered with, failing when the
    /// simulator reports an error.
    pub fn status(&mut self, expected_command: u8) -> Result<()> {
        let (command, _) = self.command_header()?;
        let result = self.u8()?;
        let description = self.string()?;

        if command != expected_command {
            return Err(TrafficError::SimulatorError(format!(
                "status for command {:#04x} while waiting for {:#04x}",
                command, expected_command
            )));
        }
        match result {
            RTYPE_OK => Ok(()),
            RTYPE_NOTIMPLEMENTED => Err(TrafficError::SimulatorError(format!(
                "command {:#04x} not implemented: {}",
                command, description
            ))),
            _ => Err(TrafficError::SimulatorError(format!(
                "command {:#04x} failed: {}",
                command, description
            ))),
        }
    }

    /// Read a typed integer value.
    pub fn typed_i32(&mut self) -> Result<i32> {
        self.expect_type(TYPE_INTEGER)?;
        self.i32()
    }

    /// Read a typed double value.
    pub fn typed_f64(&mut self) -> Result<f64> {
        self.expect_type(TYPE_DOUBLE)?;
        self.f64()
    }

    fn expect_type(&mut self, expected: u8) -> Result<()> {
        let found = self.u8()?;
        if found != expected {
            return Err(TrafficError::SimulatorError(format!(
                "expected value type {:#04x}, got {:#04x}",
                expected, found
            )));
        }
        Ok(())
    }
}
