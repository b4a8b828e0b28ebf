use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{error, warn};

use tether_core::{ClientId, ServerMessage};

/// Outbound frame fan-out. Holds the write half of every live connection;
/// sends are non-blocking pushes onto per-client channels and failures are
/// logged and swallowed. A broken sink means the peer is on its way out and
/// its own disconnect path will clean up.
#[derive(Default)]
pub struct Outbox {
    sinks: DashMap<ClientId, mpsc::UnboundedSender<Message>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self {
            sinks: DashMap::new(),
        }
    }

    pub fn attach(&self, client_id: ClientId, tx: mpsc::UnboundedSender<Message>) {
        self.sinks.insert(client_id, tx);
    }

    pub fn detach(&self, client_id: &ClientId) {
        self.sinks.remove(client_id);
    }

    pub fn is_attached(&self, client_id: &ClientId) -> bool {
        self.sinks.contains_key(client_id)
    }

    pub fn send(&self, client_id: ClientId, message: &ServerMessage) {
        let Some(sink) = self.sinks.get(&client_id) else {
            warn!(%client_id, "attempted to send to a disconnected client");
            return;
        };
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Err(e) = sink.send(Message::Text(json.into())) {
                    error!(%client_id, "failed to queue outbound frame: {e}");
                }
            }
            Err(e) => error!("failed to serialize outbound message: {e}"),
        }
    }
}
