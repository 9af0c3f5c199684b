//! Discord channel — REST API for sending, Gateway WebSocket for receiving.
//!
//! Command replies go to the originating channel; reminder notifications
//! resolve the attendee's DM channel first and send there.

use async_trait::async_trait;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};

use huddle_core::config::DiscordChannelConfig;
use huddle_core::error::{HuddleError, Result};
use huddle_core::traits::Channel;
use huddle_core::types::{IncomingMessage, OutgoingMessage, ThreadType};

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord Bot channel.
pub struct DiscordChannel {
    config: DiscordChannelConfig,
    client: reqwest::Client,
    connected: bool,
}

impl DiscordChannel {
    pub fn new(config: DiscordChannelConfig) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(auth) = format!("Bot {}", config.bot_token).parse() {
            headers.insert(reqwest::header::AUTHORIZATION, auth);
        }
        if let Ok(agent) = "Huddlebot/0.3".parse() {
            headers.insert(reqwest::header::USER_AGENT, agent);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self {
            config,
            client,
            connected: false,
        }
    }

    /// Send a message to a channel.
    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<()> {
        let url = format!("{API_BASE}/channels/{channel_id}/messages");
        let body = serde_json::json!({ "content": content });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| HuddleError::Channel(format!("Discord send failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(HuddleError::Channel(format!("Discord {status}: {text}")));
        }
        Ok(())
    }

    /// Resolve a user's DM channel id.
    pub async fn create_dm(&self, user_id: &str) -> Result<String> {
        let body = serde_json::json!({ "recipient_id": user_id });
        let response = self
            .client
            .post(format!("{API_BASE}/users/@me/channels"))
            .json(&body)
            .send()
            .await
            .map_err(|e| HuddleError::Channel(format!("Discord DM open failed: {e}")))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HuddleError::Channel(format!("Invalid DM response: {e}")))?;

        payload["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| HuddleError::Channel(format!("No DM channel for user {user_id}")))
    }

    /// Get current bot info.
    pub async fn get_me(&self) -> Result<DiscordUser> {
        let response = self
            .client
            .get(format!("{API_BASE}/users/@me"))
            .send()
            .await
            .map_err(|e| HuddleError::Channel(format!("getMe failed: {e}")))?;
        response
            .json()
            .await
            .map_err(|e| HuddleError::Channel(format!("Invalid response: {e}")))
    }

    /// Get Gateway WebSocket URL.
    async fn get_gateway_url(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{API_BASE}/gateway/bot"))
            .send()
            .await
            .map_err(|e| HuddleError::Channel(format!("Gateway request failed: {e}")))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HuddleError::Channel(format!("Invalid gateway response: {e}")))?;

        body["url"]
            .as_str()
            .map(|s| format!("{s}/?v=10&encoding=json"))
            .ok_or_else(|| HuddleError::Channel("No gateway URL".into()))
    }
}

/// Convert a MESSAGE_CREATE payload to an IncomingMessage. Bot-authored
/// messages are dropped.
fn incoming_from_event(d: &serde_json::Value) -> Option<IncomingMessage> {
    if d["author"]["bot"].as_bool().unwrap_or(false) {
        return None;
    }
    let content = d["content"].as_str()?;
    let sender_id = d["author"]["id"].as_str()?;

    Some(IncomingMessage {
        channel: "discord".into(),
        thread_id: d["channel_id"].as_str().unwrap_or("").into(),
        sender_id: sender_id.into(),
        sender_name: d["author"]["username"].as_str().map(String::from),
        content: content.into(),
        thread_type: if d["guild_id"].is_null() {
            ThreadType::Direct
        } else {
            ThreadType::Group
        },
        timestamp: chrono::Utc::now(),
    })
}

/// Gateway WebSocket loop. Heartbeats, identifies, forwards MESSAGE_CREATE
/// events, and reconnects with exponential backoff on disconnect.
async fn run_gateway(
    channel: DiscordChannel,
    tx: tokio::sync::mpsc::UnboundedSender<IncomingMessage>,
) {
    let mut backoff_secs: u64 = 5;

    loop {
        tracing::info!("Discord Gateway connecting...");

        let gateway_url = match channel.get_gateway_url().await {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Failed to get gateway URL: {e}, retrying in {backoff_secs}s...");
                tokio::time::sleep(tokio::time::Duration::from_secs(backoff_secs)).await;
                backoff_secs = (backoff_secs * 2).min(60);
                continue;
            }
        };

        let (mut ws, _) = match tokio_tungstenite::connect_async(&gateway_url).await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Gateway WebSocket failed: {e}, retrying in {backoff_secs}s...");
                tokio::time::sleep(tokio::time::Duration::from_secs(backoff_secs)).await;
                backoff_secs = (backoff_secs * 2).min(60);
                continue;
            }
        };

        backoff_secs = 5;
        tracing::info!("Discord Gateway connected");

        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::tungstenite::Message as WsMsg;

        let mut heartbeat_interval_ms: u64 = 41250;
        let mut seq: Option<u64> = None;
        let mut identified = false;

        loop {
            tokio::select! {
                msg = ws.next() => {
                    match msg {
                        Some(Ok(WsMsg::Text(text))) => {
                            let payload: serde_json::Value = match serde_json::from_str(&text) {
                                Ok(v) => v,
                                Err(_) => continue,
                            };

                            let op = payload["op"].as_u64().unwrap_or(0);
                            if let Some(s) = payload["s"].as_u64() {
                                seq = Some(s);
                            }

                            match op {
                                10 => {
                                    heartbeat_interval_ms = payload["d"]["heartbeat_interval"]
                                        .as_u64()
                                        .unwrap_or(41250);
                                    tracing::debug!(
                                        "Gateway Hello: heartbeat={}ms",
                                        heartbeat_interval_ms
                                    );

                                    if !identified {
                                        let identify = serde_json::json!({
                                            "op": 2,
                                            "d": {
                                                "token": channel.config.bot_token,
                                                "intents": channel.config.intents,
                                                "properties": {
                                                    "os": std::env::consts::OS,
                                                    "browser": "huddlebot",
                                                    "device": "huddlebot"
                                                }
                                            }
                                        });
                                        let _ = ws.send(WsMsg::Text(identify.to_string())).await;
                                        identified = true;
                                    }
                                }
                                11 => {
                                    tracing::trace!("Heartbeat ACK");
                                }
                                0 => {
                                    match payload["t"].as_str().unwrap_or("") {
                                        "READY" => {
                                            let user = payload["d"]["user"]["username"]
                                                .as_str()
                                                .unwrap_or("unknown");
                                            tracing::info!("Discord Gateway READY as {user}");
                                        }
                                        "MESSAGE_CREATE" => {
                                            if let Some(incoming) =
                                                incoming_from_event(&payload["d"])
                                                && tx.send(incoming).is_err()
                                            {
                                                tracing::info!(
                                                    "Discord stream closed (receiver dropped)"
                                                );
                                                return;
                                            }
                                        }
                                        other => {
                                            tracing::trace!("Ignoring event: {other}");
                                        }
                                    }
                                }
                                7 => {
                                    tracing::warn!("Gateway requesting reconnect");
                                    break;
                                }
                                9 => {
                                    tracing::warn!("Invalid session, re-identifying");
                                    identified = false;
                                }
                                _ => {}
                            }
                        }
                        Some(Ok(WsMsg::Close(_))) => {
                            tracing::warn!("Discord Gateway closed by server");
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::error!("Gateway error: {e}");
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_millis(heartbeat_interval_ms)) => {
                    let heartbeat = serde_json::json!({ "op": 1, "d": seq });
                    if ws.send(WsMsg::Text(heartbeat.to_string())).await.is_err() {
                        tracing::error!("Heartbeat send failed");
                        break;
                    }
                    tracing::trace!("Heartbeat sent (seq={:?})", seq);
                }
            }
        }

        tracing::info!("Discord Gateway disconnected, reconnecting in {backoff_secs}s...");
        tokio::time::sleep(tokio::time::Duration::from_secs(backoff_secs)).await;
        backoff_secs = (backoff_secs * 2).min(60);
    }
}

/// Stream of incoming Discord messages from the Gateway.
pub struct DiscordGatewayStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<IncomingMessage>,
}

impl Stream for DiscordGatewayStream {
    type Item = IncomingMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for DiscordGatewayStream {}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn connect(&mut self) -> Result<()> {
        let me = self.get_me().await?;
        tracing::info!("Discord bot: {} ({})", me.username, me.id);
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        self.send_message(&message.thread_id, &message.content).await
    }

    async fn send_direct(&self, user_id: &str, text: &str) -> Result<()> {
        let dm_channel = self.create_dm(user_id).await?;
        self.send_message(&dm_channel, text).await
    }

    async fn listen(&self) -> Result<Box<dyn Stream<Item = IncomingMessage> + Send + Unpin>> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let gateway = Self {
            config: self.config.clone(),
            client: self.client.clone(),
            connected: self.connected,
        };
        tokio::spawn(run_gateway(gateway, tx));
        Ok(Box::new(DiscordGatewayStream { rx }))
    }
}

// --- Discord API Types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub bot: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_guild_message() {
        let d = serde_json::json!({
            "channel_id": "111",
            "guild_id": "999",
            "content": "!events today",
            "author": {"id": "42", "username": "lena", "bot": false}
        });
        let msg = incoming_from_event(&d).unwrap();
        assert_eq!(msg.thread_id, "111");
        assert_eq!(msg.sender_id, "42");
        assert_eq!(msg.sender_name, Some("lena".into()));
        assert_eq!(msg.content, "!events today");
        assert_eq!(msg.thread_type, ThreadType::Group);
    }

    #[test]
    fn test_parse_dm_message() {
        let d = serde_json::json!({
            "channel_id": "222",
            "guild_id": null,
            "content": "!list-commands",
            "author": {"id": "42", "username": "lena"}
        });
        let msg = incoming_from_event(&d).unwrap();
        assert_eq!(msg.thread_type, ThreadType::Direct);
    }

    #[test]
    fn test_bot_messages_are_skipped() {
        let d = serde_json::json!({
            "channel_id": "111",
            "content": "Event successfully deleted.",
            "author": {"id": "1", "username": "huddlebot", "bot": true}
        });
        assert!(incoming_from_event(&d).is_none());
    }

    #[test]
    fn test_missing_content_is_skipped() {
        let d = serde_json::json!({
            "channel_id": "111",
            "author": {"id": "42", "username": "lena"}
        });
        assert!(incoming_from_event(&d).is_none());
    }
}
