//! Session operations abstraction
//!
//! This module provides the session operations pattern that allows
//! transparent switching between plain TCP and TLS connections.
//!
//! Gemini itself always runs over TLS; the plain TCP implementation exists so
//! the request/response exchange can be driven without a handshake.

use super::{ConnectionError, Error, Result};
use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::os::fd::AsRawFd;
use std::time::Duration;

/// Size of each read from the transport
const READ_CHUNK: usize = 4096;

/// Session operations trait
///
/// This trait defines the operations that can be performed on a session,
/// abstracting over plain TCP and TLS connections.
pub trait SessionOps {
    /// Poll the session for events
    ///
    /// Returns true if the session is ready for the requested operation
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> Result<bool>;

    /// Read data from the session; 0 means the peer closed the connection
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write data to the session
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Close the session
    fn close(&mut self) -> Result<()>;
}

/// Poll events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvents {
    Read,
    Write,
    Both,
}

/// Poll a raw file descriptor; `None` waits indefinitely
pub(crate) fn poll_fd(fd: i32, events: PollEvents, timeout: Option<Duration>) -> Result<bool> {
    use libc::{poll, pollfd, POLLIN, POLLOUT};

    let mut pfd = pollfd {
        fd,
        events: match events {
            PollEvents::Read => POLLIN,
            PollEvents::Write => POLLOUT,
            PollEvents::Both => POLLIN | POLLOUT,
        },
        revents: 0,
    };

    let timeout_ms = timeout
        .map(|d| d.as_millis().min(i32::MAX as u128) as i32)
        .unwrap_or(-1); // -1 = infinite

    let result = unsafe { poll(&mut pfd as *mut pollfd, 1, timeout_ms) };

    if result < 0 {
        return Err(Error::from(io::Error::last_os_error()));
    }

    Ok(result > 0)
}

/// Gemini session wrapping a transport with session operations
///
/// The transport is closed exactly once: either by [`GeminiSession::close`]
/// or, on any early return, when the session is dropped.
pub struct GeminiSession<S: SessionOps> {
    session: S,
    timeout: Option<Duration>,
    closed: bool,
}

impl<S: SessionOps> GeminiSession<S> {
    /// Create a new session without a timeout
    pub fn new(session: S) -> Self {
        GeminiSession {
            session,
            timeout: None,
            closed: false,
        }
    }

    /// Set the timeout for each read and write
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn wait(&self, events: PollEvents) -> Result<()> {
        if self.timeout.is_some() && !self.session.poll(events, self.timeout)? {
            return Err(ConnectionError::Timeout.into());
        }
        Ok(())
    }

    /// Read data with timeout
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.wait(PollEvents::Read)?;
        self.session.read(buf)
    }

    /// Write data with timeout
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.wait(PollEvents::Write)?;
        self.session.write(buf)
    }

    /// Write the whole buffer and flush it
    pub fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut written = 0;

        while written < buf.len() {
            let n = self.write(&buf[written..])?;
            if n == 0 {
                return Err(Error::from(io::Error::from(io::ErrorKind::WriteZero)));
            }
            written += n;
        }

        self.session.flush()
    }

    /// Read until the peer closes the connection
    pub fn read_to_end(&mut self) -> Result<Bytes> {
        let mut buffer = BytesMut::with_capacity(READ_CHUNK);
        let mut temp = [0u8; READ_CHUNK];

        loop {
            let n = self.read(&mut temp)?;
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&temp[..n]);
        }

        Ok(buffer.freeze())
    }

    /// Close the session
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.session.close()
    }
}

impl<S: SessionOps> Drop for GeminiSession<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::debug!("error closing session: {}", e);
        }
    }
}

/// Plain file descriptor session operations
pub struct FdSessionOps {
    stream: TcpStream,
}

impl FdSessionOps {
    /// Create a new FD session operations from a TCP stream
    pub fn new(stream: TcpStream) -> Self {
        FdSessionOps { stream }
    }
}

impl SessionOps for FdSessionOps {
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> Result<bool> {
        poll_fd(self.stream.as_raw_fd(), events, timeout)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(Error::from)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf).map_err(Error::from)
    }

    fn flush(&mut self) -> Result<()> {
        self.stream.flush().map_err(Error::from)
    }

    fn close(&mut self) -> Result<()> {
        use std::net::Shutdown;
        match self.stream.shutdown(Shutdown::Both) {
            // Peer may already have torn the connection down
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other.map_err(Error::from),
        }
    }
}
