use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::trace;

use super::protocol::{self, Reader, Writer};
use super::SimulatorSession;
use crate::error::{Result, TrafficError};

/// A TraCI connection to a running simulator.
///
/// Requests are strictly call-and-return; each method writes one message and
/// blocks for its answer. On a `TcpStream` the wait is bounded by the read
/// and write timeouts set in [`TraciClient::connect`].
pub struct TraciClient<S: Read + Write = TcpStream> {
    stream: S,
    closed: bool,
}

impl TraciClient<TcpStream> {
    /// Connect once to `addr`, bounding every later round trip by `timeout`.
    pub fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| TrafficError::SimulatorError(format!("cannot connect to TraCI server: {}", e)))?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(TraciClient::new(stream))
    }
}

impl<S: Read + Write> TraciClient<S> {
    pub fn new(stream: S) -> Self {
        TraciClient { stream, closed: false }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Ask the server for `(api_version, description)`.
    pub fn version(&mut self) -> Result<(i32, String)> {
        let response = self.request(protocol::CMD_GETVERSION, &[])?;
        let mut reader = Reader::new(&response);
        reader.status(protocol::CMD_GETVERSION)?;
        let (command, _) = reader.command_header()?;
        if command != protocol::CMD_GETVERSION {
            return Err(TrafficError::SimulatorError(format!(
                "unexpected version response {:#04x}",
                command
            )));
        }
        let api = reader.i32()?;
        let description = reader.string()?;
        Ok((api, description))
    }

    fn request(&mut self, command: u8, body: &[u8]) -> Result<Vec<u8>> {
        if self.closed {
            return Err(TrafficError::SimulatorError(
                "TraCI connection already closed".to_string(),
            ));
        }

        let message = protocol::frame_message(&protocol::frame_command(command, body));
        trace!(command, bytes = message.len(), "traci request");
        self.stream.write_all(&message).map_err(io_failure)?;
        self.stream.flush().map_err(io_failure)?;

        let mut header = [0u8; 4];
        self.stream.read_exact(&mut header).map_err(io_failure)?;
        let total = u32::from_be_bytes(header) as usize;
        let body_len = total.checked_sub(4).ok_or_else(|| {
            TrafficError::SimulatorError(format!("bad TraCI message length {}", total))
        })?;

        let mut response = vec![0u8; body_len];
        self.stream.read_exact(&mut response).map_err(io_failure)?;
        Ok(response)
    }

    fn status_only(&mut self, command: u8, body: &[u8]) -> Result<()> {
        let response = self.request(command, body)?;
        Reader::new(&response).status(command)
    }

    fn get_lane_variable(&mut self, variable: u8, lane: &str) -> Result<Vec<u8>> {
        let mut body = Writer::new();
        body.u8(variable).string(lane);
        self.request(protocol::CMD_GET_LANE_VARIABLE, body.as_bytes())
    }

    /// Skip the status block and header of a lane variable answer, leaving the
    /// reader at the typed value.
    fn lane_value<'a>(response: &'a [u8], variable: u8, lane: &str) -> Result<Reader<'a>> {
        let mut reader = Reader::new(response);
        reader.status(protocol::CMD_GET_LANE_VARIABLE)?;
        let (command, _) = reader.command_header()?;
        let answered_variable = reader.u8()?;
        let answered_lane = reader.string()?;
        if command != protocol::RESPONSE_GET_LANE_VARIABLE
            || answered_variable != variable
            || answered_lane != lane
        {
            return Err(TrafficError::SimulatorError(format!(
                "mismatched lane response {:#04x}/{:#04x} for '{}'",
                command, answered_variable, answered_lane
            )));
        }
        Ok(reader)
    }
}

impl<S: Read + Write> SimulatorSession for TraciClient<S> {
    fn load(&mut self, args: &[String]) -> Result<()> {
        let mut body = Writer::new();
        body.string_list(args);
        self.status_only(protocol::CMD_LOAD, body.as_bytes())
    }

    fn simulation_step(&mut self) -> Result<()> {
        let mut body = Writer::new();
        // target time 0 advances exactly one step
        body.f64(0.0);
        let response = self.request(protocol::CMD_SIMSTEP, body.as_bytes())?;
        let mut reader = Reader::new(&response);
        reader.status(protocol::CMD_SIMSTEP)?;
        // No subscriptions are made, so the trailing subscription count is ignored.
        Ok(())
    }

    fn lane_halting_number(&mut self, lane: &str) -> Result<u32> {
        let variable = protocol::LAST_STEP_VEHICLE_HALTING_NUMBER;
        let response = self.get_lane_variable(variable, lane)?;
        let value = Self::lane_value(&response, variable, lane)?.typed_i32()?;
        u32::try_from(value).map_err(|_| {
            TrafficError::SimulatorError(format!("negative halting count {} on '{}'", value, lane))
        })
    }

    fn lane_waiting_time(&mut self, lane: &str) -> Result<f64> {
        let variable = protocol::VAR_WAITING_TIME;
        let response = self.get_lane_variable(variable, lane)?;
        Self::lane_value(&response, variable, lane)?.typed_f64()
    }

    fn set_phase(&mut self, tls_id: &str, index: u32) -> Result<()> {
        let index = i32::try_from(index).map_err(|_| {
            TrafficError::invalid_parameter("phase index".to_string(), format!("{} out of range", index))
        })?;
        let mut body = Writer::new();
        body.u8(protocol::TL_PHASE_INDEX)
            .string(tls_id)
            .u8(protocol::TYPE_INTEGER)
            .i32(index);
        self.status_only(protocol::CMD_SET_TL_VARIABLE, body.as_bytes())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.status_only(protocol::CMD_CLOSE, &[]);
        self.closed = true;
        result
    }
}

fn io_failure(err: io::Error) -> TrafficError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            TrafficError::SimulatorTimeout(format!("no answer from simulator: {}", err))
        }
        _ => TrafficError::SimulatorError(format!("simulator connection failed: {}", err)),
    }
}
