//! Listener and connection loop.

use crate::server::router::route_request;
use crate::state::ConfigStore;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// The mock chat-completion server
pub struct MockLlmServer {
    addr: SocketAddr,
    store: Arc<ConfigStore>,
}

impl MockLlmServer {
    pub fn new(addr: SocketAddr, store: Arc<ConfigStore>) -> Self {
        Self { addr, store }
    }

    /// Bind and serve until the process exits
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("mock-llm listening on http://{}", listener.local_addr()?);
        serve(listener, self.store).await
    }
}

/// Serve connections from an already-bound listener, one task per connection.
pub async fn serve(listener: TcpListener, store: Arc<ConfigStore>) -> Result<(), anyhow::Error> {
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let store = Arc::clone(&store);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let store = Arc::clone(&store);
                async move { route_request(req, store).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection error: {}", e);
            }
        });
    }
}
