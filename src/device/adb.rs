//! ADB server client over TCP.
//!
//! Speaks the server's "smart socket" protocol: each request is framed as a
//! 4-hex-digit length followed by the request body, answered with an
//! `OKAY`/`FAIL` status. Device services open a fresh connection, select a
//! transport with `host:transport-any`, then stream the service output
//! until EOF.

use anyhow::{anyhow, Result};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::AdbConfig;
use crate::logging::Logger;
use super::DeviceChannel;

const IO_TIMEOUT: Duration = Duration::from_secs(9);

pub struct AdbChannel {
    host: String,
    port: u16,
    connected: bool,
    logger: Logger,
}

impl AdbChannel {
    pub fn new(config: &AdbConfig, logger: Logger) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            connected: false,
            logger,
        }
    }

    fn open_stream(&self) -> Result<TcpStream> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow!("cannot resolve {}:{}", self.host, self.port))?;
        let stream = TcpStream::connect_timeout(&addr, IO_TIMEOUT)?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        Ok(stream)
    }

    /// Opens a service stream on the device behind the server, returning
    /// it positioned at the start of the service output.
    fn open_device_service(&self, service: &str) -> Result<TcpStream> {
        let mut stream = self.open_stream()?;
        send_request(&mut stream, "host:transport-any")?;
        send_request(&mut stream, service)?;
        Ok(stream)
    }

    /// Runs a device service to EOF and returns the raw output bytes.
    fn run_service(&mut self, service: &str) -> Result<Vec<u8>> {
        if !self.connected {
            return Err(anyhow!("device channel is not connected"));
        }
        let mut stream = self.open_device_service(service)?;
        let mut output = Vec::new();
        stream.read_to_end(&mut output)?;
        Ok(output)
    }
}

impl DeviceChannel for AdbChannel {
    fn connect(&mut self) -> Result<()> {
        let mut stream = self.open_stream()?;
        stream.write_all(&frame_request("host:version"))?;
        read_status(&mut stream)?;
        let version = read_hex_payload(&mut stream)?;
        self.connected = true;
        self.logger.info(&format!(
            "Connected to adb server at {}:{} (version {})",
            self.host, self.port, version
        ));
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            self.logger.info("ADB connection closed");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn shell(&mut self, cmd: &str) -> Result<String> {
        let output = self
            .run_service(&format!("shell:{}", cmd))
            .map_err(|e| anyhow!("shell '{}' failed: {}", cmd, e))?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    fn capture_frame(&mut self) -> Result<Vec<u8>> {
        // exec: delivers raw stdout; shell: would mangle LF into CRLF
        // inside the PNG stream on older devices.
        let output = self.run_service("exec:screencap -p")?;
        if output.is_empty() {
            return Err(anyhow!("screencap returned an empty payload"));
        }
        Ok(output)
    }
}

/// Frames a smart-socket request: 4 hex digits of length, then the body.
fn frame_request(request: &str) -> Vec<u8> {
    format!("{:04x}{}", request.len(), request).into_bytes()
}

fn send_request(stream: &mut TcpStream, request: &str) -> Result<()> {
    stream.write_all(&frame_request(request))?;
    read_status(stream)
}

fn read_status<R: Read>(reader: &mut R) -> Result<()> {
    let mut status = [0u8; 4];
    reader.read_exact(&mut status)?;
    match &status {
        b"OKAY" => Ok(()),
        b"FAIL" => {
            let reason = read_hex_payload(reader).unwrap_or_default();
            Err(anyhow!("adb server refused request: {}", reason))
        }
        other => Err(anyhow!(
            "unexpected adb status {:?}",
            String::from_utf8_lossy(other)
        )),
    }
}

/// Reads a 4-hex-digit length prefix followed by that many payload bytes.
fn read_hex_payload<R: Read>(reader: &mut R) -> Result<String> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = usize::from_str_radix(std::str::from_utf8(&len_buf)?, 16)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(String::from_utf8_lossy(&payload).into_owned())
}
