//! Test capsule shared by the integration tests

use gemlite::gemini::tls::{TlsConfig, TlsSessionOps};
use gemlite::gemini::{ClientConfig, GeminiClient, GeminiServer, Status};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

/// One canned reply
pub struct Reply {
    pub status: u8,
    pub meta: String,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: u8, meta: &str, body: &[u8]) -> Self {
        Reply {
            status,
            meta: meta.to_string(),
            body: body.to_vec(),
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Spawn a TLS capsule on 127.0.0.1 that answers every request with `route(url)`
///
/// Returns the port. The capsule thread runs until the test process exits.
pub fn spawn_capsule<F>(route: F) -> u16
where
    F: Fn(&str) -> Reply + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let tls_config = TlsConfig::server().unwrap().build().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(tcp_stream) = stream else { continue };

            // Clients that reject the certificate abort here
            let tls_session: TlsSessionOps = match tls_config.accept(tcp_stream) {
                Ok(session) => session,
                Err(_) => continue,
            };

            let mut server = GeminiServer::new(tls_session);
            server.set_timeout(Duration::from_secs(5));
            let Ok(url) = server.receive_request() else { continue };

            let reply = route(&url);
            let status = Status::new(reply.status).unwrap();
            let _ = server.send(status, &reply.meta, &reply.body);
            let _ = server.close();
        }
    });

    port
}

/// Client talking to a local capsule with the default trust-all policy
pub fn client_for(port: u16) -> GeminiClient {
    let config = ClientConfig::builder()
        .port(port)
        .timeout(Duration::from_secs(5))
        .build();
    GeminiClient::new(config).unwrap()
}
