use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use super::hub::{HubHandle, Topic};
use super::messages::{ClientMessage, WsEnvelope};

// =====================================================
// WebSocket 연결 핸들러
// =====================================================
// 연결당 송신/수신 태스크 분리:
// - 송신 태스크: 허브가 채운 outbound 채널을 소켓으로 배출
// - 수신 태스크: 클라이언트 메시지 파싱 → 허브 커맨드 변환
// 어느 쪽이든 끝나면 select!로 상대편을 정리합니다.
// =====================================================

pub async fn handle_connection(stream: TcpStream, hub: HubHandle) -> Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .context("WebSocket handshake failed")?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let connection_id = hub.register(out_tx.clone()).await?;

    // 환영 메시지
    let _ = out_tx.send(WsEnvelope::connected(connection_id).to_json());

    // 송신 태스크: outbound 채널 → 소켓
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // 수신 태스크: 소켓 → 허브 커맨드
    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = ws_receiver.next().await {
            let message = match message {
                Ok(m) => m,
                Err(_) => break,
            };

            // 어떤 프레임이든 활동으로 간주 (유휴 정리 방지)
            recv_hub.activity(connection_id);

            match message {
                Message::Text(text) => match ClientMessage::parse(&text) {
                    Ok(ClientMessage::Subscribe { order_id }) => match Topic::parse(&order_id) {
                        Some(topic) => recv_hub.subscribe(connection_id, topic),
                        None => {
                            let _ = out_tx.send(
                                WsEnvelope::error(&format!("Invalid order id: {}", order_id))
                                    .to_json(),
                            );
                        }
                    },
                    Ok(ClientMessage::Unsubscribe { order_id }) => {
                        match Topic::parse(&order_id) {
                            Some(topic) => recv_hub.unsubscribe(connection_id, topic),
                            None => {
                                let _ = out_tx.send(
                                    WsEnvelope::error(&format!(
                                        "Invalid order id: {}",
                                        order_id
                                    ))
                                    .to_json(),
                                );
                            }
                        }
                    }
                    Ok(ClientMessage::Ping) => {
                        let _ = out_tx.send(WsEnvelope::pong().to_json());
                    }
                    Ok(ClientMessage::Pong) => {}
                    Err(_) => {
                        let _ = out_tx.send(
                            WsEnvelope::error("Unrecognized message format").to_json(),
                        );
                    }
                },
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // 한쪽이 끝나면 나머지도 정리
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.disconnect(connection_id);
    Ok(())
}
