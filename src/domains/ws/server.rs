use anyhow::{Context, Result};
use tokio::net::TcpListener;

use super::connection::handle_connection;
use super::hub::HubHandle;

// =====================================================
// WebSocket 서버
// =====================================================
// TCP accept 루프. 연결마다 핸들러 태스크를 띄웁니다.
// =====================================================

pub struct WebSocketServer {
    hub: HubHandle,
}

impl WebSocketServer {
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }

    pub async fn run(&self, bind_addr: &str) -> Result<()> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind WebSocket server to {}", bind_addr))?;

        println!("[WebSocket Server] Listening on ws://{}", bind_addr);

        loop {
            let (stream, peer) = listener
                .accept()
                .await
                .context("Failed to accept connection")?;

            println!("[WebSocket Server] New connection from {}", peer);

            let hub = self.hub.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, hub).await {
                    eprintln!("[WebSocket Server] Connection error from {}: {}", peer, e);
                }
            });
        }
    }
}
