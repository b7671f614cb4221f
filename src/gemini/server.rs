//! Gemini test capsule
//!
//! A minimal blocking responder: read one request line, write one response,
//! close. Used to exercise the client end-to-end over real TLS.

use super::session::{GeminiSession, SessionOps};
use super::{Error, Response, Result, Status, MAX_URL_LEN};
use crate::charset::latin1_to_string;

/// Gemini server side of one connection
pub struct GeminiServer<S: SessionOps> {
    session: GeminiSession<S>,
    buffer: Vec<u8>,
}

impl<S: SessionOps> GeminiServer<S> {
    /// Create a new server with a session
    pub fn new(session: S) -> Self {
        GeminiServer {
            session: GeminiSession::new(session),
            buffer: Vec::with_capacity(MAX_URL_LEN + 2),
        }
    }

    /// Set the timeout for operations
    pub fn set_timeout(&mut self, timeout: std::time::Duration) {
        self.session.set_timeout(Some(timeout));
    }

    /// Receive the request line and return the URL without CRLF
    pub fn receive_request(&mut self) -> Result<String> {
        self.buffer.clear();
        let mut temp = [0u8; 512];

        loop {
            if let Some(end) = self.buffer.windows(2).position(|w| w == b"\r\n") {
                let url = latin1_to_string(&self.buffer[..end]);
                log::trace!("capsule received request {:?}", url);
                return Ok(url);
            }

            if self.buffer.len() > MAX_URL_LEN + 2 {
                return Err(Error::MalformedRequest(format!(
                    "request line longer than {} bytes",
                    MAX_URL_LEN
                )));
            }

            let n = self.session.read(&mut temp)?;
            if n == 0 {
                return Err(Error::MalformedRequest(
                    "connection closed before end of request line".to_string(),
                ));
            }
            self.buffer.extend_from_slice(&temp[..n]);
        }
    }

    /// Send a response
    pub fn send_response(&mut self, response: &Response) -> Result<()> {
        self.session.write_all(&response.to_wire())
    }

    /// Send a status line and, for status 20, a body
    pub fn send(&mut self, status: Status, meta: &str, body: &[u8]) -> Result<()> {
        self.send_response(&Response::new(status, meta, body.to_vec()))
    }

    /// Send raw bytes, bypassing response framing
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.session.write_all(bytes)
    }

    /// Close the connection, which ends the response body
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::session::FdSessionOps;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    #[test]
    fn test_receive_request() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            // Split across writes
            stream.write_all(b"gemini://localhost/").unwrap();
            thread::sleep(std::time::Duration::from_millis(20));
            stream.write_all(b"page.gmi\r\n").unwrap();
        });

        let (stream, _) = listener.accept().unwrap();
        let mut server = GeminiServer::new(FdSessionOps::new(stream));
        let url = server.receive_request().unwrap();
        assert_eq!(url, "gemini://localhost/page.gmi");

        handle.join().unwrap();
    }

    #[test]
    fn test_send_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).unwrap();
            received
        });

        let (stream, _) = listener.accept().unwrap();
        let mut server = GeminiServer::new(FdSessionOps::new(stream));
        server.send(Status::SUCCESS, "text/plain", b"Hi").unwrap();
        server.close().unwrap();

        assert_eq!(handle.join().unwrap(), b"20 text/plain\r\nHi");
    }

    #[test]
    fn test_request_without_terminator() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"gemini://localhost/").unwrap();
        });

        let (stream, _) = listener.accept().unwrap();
        let mut server = GeminiServer::new(FdSessionOps::new(stream));
        assert!(server.receive_request().is_err());

        handle.join().unwrap();
    }
}
