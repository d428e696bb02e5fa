//! Server addresses and the trivial resolver.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ServerResolver, SessionError};

/// Where a server's WebSocket endpoint lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
    /// Request path, starting with `/`.
    pub path: String,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
        }
    }

    /// An address whose path is a fresh SockJS-style session path,
    /// `/showdown/{NNN}/{xxxxxxxx}/websocket`.
    pub fn sockjs(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, sockjs_path())
    }

    /// The `ws://` URL to dial.
    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Generates a random SockJS session path.
fn sockjs_path() -> String {
    let mut rng = rand::rng();
    let server: u16 = rng.random_range(0..1000);
    let session: String = (0..8)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
        .collect();
    format!("/showdown/{server:03}/{session}/websocket")
}

/// A [`ServerResolver`] that always answers with the same address.
#[derive(Debug, Clone)]
pub struct StaticResolver(pub ServerAddress);

impl ServerResolver for StaticResolver {
    fn resolve<'a>(
        &'a self,
        server_id: &'a str,
    ) -> BoxFuture<'a, Result<ServerAddress, SessionError>> {
        tracing::debug!(server_id, url = %self.0.websocket_url(), "using static server address");
        let address = self.0.clone();
        async move { Ok(address) }.boxed()
    }
}
