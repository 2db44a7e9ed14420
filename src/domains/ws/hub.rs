use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::messages::{WsEnvelope, WILDCARD_TOPIC};
use crate::domains::swap::models::{serialize_u64_as_string, OrderStatus};
use crate::shared::utils::id_generator::ConnectionIdGenerator;

// =====================================================
// 브로드캐스트 허브 (Broadcast Hub)
// =====================================================
// 역할: 연결/구독 레지스트리와 주문 업데이트 팬아웃
//
// 상태는 허브 태스크 하나가 소유하고, 나머지 세계는
// HubHandle을 통해 커맨드 채널로만 접근합니다. 락 없이
// 순차 처리되므로 레지스트리 경합이 없습니다.
// =====================================================

/// 구독 토픽: 특정 주문 또는 전체
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Order(u64),
    All,
}

impl Topic {
    /// 와이어 문자열 파싱 ("42" 또는 "*")
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == WILDCARD_TOPIC {
            return Some(Topic::All);
        }
        raw.parse::<u64>().ok().map(Topic::Order)
    }

    pub fn as_wire(&self) -> String {
        match self {
            Topic::Order(id) => id.to_string(),
            Topic::All => WILDCARD_TOPIC.to_string(),
        }
    }
}

/// 구독자에게 전달되는 주문 상태 업데이트
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[serde(serialize_with = "serialize_u64_as_string")]
    pub order_id: u64,

    pub status: OrderStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    pub timestamp: DateTime<Utc>,
}

/// 허브 커맨드 (HubHandle → 허브 태스크)
enum HubCommand {
    Register {
        outbound: mpsc::UnboundedSender<String>,
        reply: oneshot::Sender<u64>,
    },
    Subscribe {
        connection_id: u64,
        topic: Topic,
    },
    Unsubscribe {
        connection_id: u64,
        topic: Topic,
    },
    Publish {
        update: OrderUpdate,
    },
    Activity {
        connection_id: u64,
    },
    Disconnect {
        connection_id: u64,
    },
    ConnectionCount {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// 유휴 연결 정리 주기
    pub sweep_interval: Duration,

    /// 이 시간 동안 활동 없는 연결은 정리
    pub connection_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(120),
        }
    }
}

struct ConnectionEntry {
    outbound: mpsc::UnboundedSender<String>,
    topics: HashSet<Topic>,
    last_seen: Instant,
}

/// 허브 태스크 소유 상태
struct HubState {
    connections: HashMap<u64, ConnectionEntry>,
    subscribers: HashMap<Topic, HashSet<u64>>,
}

pub struct BroadcastHub;

impl BroadcastHub {
    /// 허브 태스크를 띄우고 핸들 반환
    pub fn spawn(config: HubConfig) -> HubHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<HubCommand>();

        tokio::spawn(async move {
            let mut state = HubState {
                connections: HashMap::new(),
                subscribers: HashMap::new(),
            };
            let mut sweep = tokio::time::interval(config.sweep_interval);
            sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    command = rx.recv() => {
                        match command {
                            Some(HubCommand::Shutdown) | None => break,
                            Some(command) => handle_command(&mut state, command),
                        }
                    }
                    _ = sweep.tick() => {
                        sweep_stale(&mut state, config.connection_timeout);
                        ping_connections(&mut state);
                    }
                }
            }

            println!("[Broadcast Hub] Stopped ({} connections dropped)", state.connections.len());
        });

        HubHandle { tx }
    }
}

fn handle_command(state: &mut HubState, command: HubCommand) {
    match command {
        HubCommand::Register { outbound, reply } => {
            let connection_id = ConnectionIdGenerator::next();
            state.connections.insert(
                connection_id,
                ConnectionEntry {
                    outbound,
                    topics: HashSet::new(),
                    last_seen: Instant::now(),
                },
            );
            println!(
                "[Broadcast Hub] Connection {} registered ({} total)",
                connection_id,
                state.connections.len()
            );
            let _ = reply.send(connection_id);
        }
        HubCommand::Subscribe {
            connection_id,
            topic,
        } => {
            if let Some(entry) = state.connections.get_mut(&connection_id) {
                entry.topics.insert(topic);
                entry.last_seen = Instant::now();
                state
                    .subscribers
                    .entry(topic)
                    .or_default()
                    .insert(connection_id);

                let env = WsEnvelope::subscribed(&topic.as_wire());
                let _ = entry.outbound.send(env.to_json());
            }
        }
        HubCommand::Unsubscribe {
            connection_id,
            topic,
        } => {
            if let Some(entry) = state.connections.get_mut(&connection_id) {
                entry.topics.remove(&topic);
                entry.last_seen = Instant::now();
            }
            remove_subscriber(state, topic, connection_id);
        }
        HubCommand::Publish { update } => {
            publish(state, &update);
        }
        HubCommand::Activity { connection_id } => {
            if let Some(entry) = state.connections.get_mut(&connection_id) {
                entry.last_seen = Instant::now();
            }
        }
        HubCommand::Disconnect { connection_id } => {
            deregister(state, connection_id, "client disconnected");
        }
        HubCommand::ConnectionCount { reply } => {
            let _ = reply.send(state.connections.len());
        }
        // Shutdown은 루프에서 처리됨
        HubCommand::Shutdown => {}
    }
}

/// 주문 토픽 구독자 + 와일드카드 구독자에게 팬아웃 (중복 제거)
fn publish(state: &mut HubState, update: &OrderUpdate) {
    let mut targets: HashSet<u64> = HashSet::new();
    if let Some(connections) = state.subscribers.get(&Topic::Order(update.order_id)) {
        targets.extend(connections);
    }
    if let Some(connections) = state.subscribers.get(&Topic::All) {
        targets.extend(connections);
    }

    if targets.is_empty() {
        return;
    }

    let payload = match serde_json::to_value(update) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("[Broadcast Hub] Failed to serialize update: {}", e);
            return;
        }
    };
    let text = WsEnvelope::order_update(payload).to_json();

    let mut dead = Vec::new();
    for connection_id in targets {
        if let Some(entry) = state.connections.get(&connection_id) {
            if entry.outbound.send(text.clone()).is_err() {
                dead.push(connection_id);
            }
        }
    }

    for connection_id in dead {
        deregister(state, connection_id, "send failed");
    }
}

fn remove_subscriber(state: &mut HubState, topic: Topic, connection_id: u64) {
    if let Some(group) = state.subscribers.get_mut(&topic) {
        group.remove(&connection_id);
        if group.is_empty() {
            state.subscribers.remove(&topic);
        }
    }
}

fn deregister(state: &mut HubState, connection_id: u64, reason: &str) {
    if let Some(entry) = state.connections.remove(&connection_id) {
        for topic in entry.topics {
            remove_subscriber(state, topic, connection_id);
        }
        println!(
            "[Broadcast Hub] Connection {} removed: {} ({} remaining)",
            connection_id,
            reason,
            state.connections.len()
        );
    }
}

/// 타임아웃 동안 활동이 없었던 연결 제거
fn sweep_stale(state: &mut HubState, timeout: Duration) {
    let now = Instant::now();
    let stale: Vec<u64> = state
        .connections
        .iter()
        .filter(|(_, entry)| now.duration_since(entry.last_seen) > timeout)
        .map(|(id, _)| *id)
        .collect();

    for connection_id in stale {
        deregister(state, connection_id, "idle timeout");
    }
}

/// 살아있는 연결에 ping 전송. 클라이언트의 pong이 활동으로 기록되어
/// 트래픽 없는 연결도 타임아웃되지 않음
fn ping_connections(state: &mut HubState) {
    let dead: Vec<u64> = state
        .connections
        .iter()
        .filter(|(_, entry)| entry.outbound.send(WsEnvelope::ping().to_json()).is_err())
        .map(|(id, _)| *id)
        .collect();

    for connection_id in dead {
        deregister(state, connection_id, "send failed");
    }
}

/// 허브 핸들 (어디서나 Clone해서 사용)
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// 새 연결 등록, 연결 ID 반환
    pub async fn register(&self, outbound: mpsc::UnboundedSender<String>) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::Register { outbound, reply })
            .map_err(|_| anyhow!("Broadcast hub is not running"))?;
        rx.await.map_err(|_| anyhow!("Broadcast hub dropped registration"))
    }

    pub fn subscribe(&self, connection_id: u64, topic: Topic) {
        let _ = self.tx.send(HubCommand::Subscribe {
            connection_id,
            topic,
        });
    }

    pub fn unsubscribe(&self, connection_id: u64, topic: Topic) {
        let _ = self.tx.send(HubCommand::Unsubscribe {
            connection_id,
            topic,
        });
    }

    /// 연결 활동 갱신 (유휴 정리 방지)
    pub fn activity(&self, connection_id: u64) {
        let _ = self.tx.send(HubCommand::Activity { connection_id });
    }

    pub fn disconnect(&self, connection_id: u64) {
        let _ = self.tx.send(HubCommand::Disconnect { connection_id });
    }

    /// 주문 업데이트 팬아웃 (fire-and-forget)
    pub fn publish(&self, update: OrderUpdate) {
        let _ = self.tx.send(HubCommand::Publish { update });
    }

    pub async fn connection_count(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::ConnectionCount { reply })
            .map_err(|_| anyhow!("Broadcast hub is not running"))?;
        rx.await.map_err(|_| anyhow!("Broadcast hub dropped query"))
    }

    /// 허브 종료 (여러 번 호출해도 안전)
    pub fn shutdown(&self) {
        let _ = self.tx.send(HubCommand::Shutdown);
    }
}
