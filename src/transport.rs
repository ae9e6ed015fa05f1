//! Message transport between the twin and the physical device.
//!
//! The sync engine only needs two operations; everything about the actual
//! line (serial, console, ...) lives behind this trait. `receive` returns an
//! empty string on timeout rather than blocking indefinitely, and the sync
//! engine treats that like any other unusable response.

use std::io::{self, BufRead, Write};

use crate::error::TwinError;

pub trait Transport {
    /// Sends one text message.
    fn send(&mut self, message: &str) -> Result<(), TwinError>;

    /// Receives one text message. Empty string on timeout.
    fn receive(&mut self) -> Result<String, TwinError>;
}

/// Stdio transport: messages go out on stdout, responses are read line by
/// line from stdin. Used by the demo binary; a serial line implements the
/// same trait on real hardware.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for ConsoleTransport {
    fn send(&mut self, message: &str) -> Result<(), TwinError> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{message}")
            .and_then(|_| stdout.flush())
            .map_err(|e| TwinError::transport(format!("stdout write failed: {e}")))
    }

    fn receive(&mut self) -> Result<String, TwinError> {
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| TwinError::transport(format!("stdin read failed: {e}")))?;
        if read == 0 {
            // EOF behaves like a timeout.
            return Ok(String::new());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
