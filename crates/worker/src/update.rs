//! The update channel.
//!
//! A waiting worker version is promoted by exactly one inbound message,
//! `{"type":"SKIP_WAITING"}`, sent by the page. Nothing else advances the
//! lifecycle; the worker never promotes itself and never reloads pages. The
//! page observes the effect indirectly through the controller-change
//! broadcast and decides on its own whether to reload.
//!
//! `{"type":"GET_VERSION"}` is also recognized as a read-only query for the
//! current cache name.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use shelter_core::Error;

/// Recognized inbound message shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(rename = "GET_VERSION")]
    GetVersion,
}

impl WorkerMessage {
    /// Parse a raw message. Unknown or malformed messages are ignored.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value.clone()) {
            Ok(msg) => Some(msg),
            Err(err) => {
                tracing::debug!(%err, "ignoring unrecognized worker message");
                None
            }
        }
    }
}

/// Commands delivered to the worker host task.
#[derive(Debug)]
pub(crate) enum Command {
    SkipWaiting,
    GetVersion(oneshot::Sender<String>),
}

/// Sender half of the update channel, handed to pages.
#[derive(Clone)]
pub struct UpdateChannel {
    pub(crate) tx: mpsc::Sender<Command>,
}

impl UpdateChannel {
    /// Ask the waiting version, if any, to take effect now.
    pub async fn skip_waiting(&self) -> Result<(), Error> {
        self.tx.send(Command::SkipWaiting).await.map_err(|_| Error::ChannelClosed)
    }

    /// Query the currently active cache name.
    pub async fn version(&self) -> Result<String, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::GetVersion(reply_tx))
            .await
            .map_err(|_| Error::ChannelClosed)?;
        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Accept a raw JSON message as it arrives from the page.
    ///
    /// Unknown messages are dropped; a raw GET_VERSION has no reply port
    /// and is dropped as well.
    pub async fn send_raw(&self, value: &serde_json::Value) -> Result<(), Error> {
        match WorkerMessage::parse(value) {
            Some(WorkerMessage::SkipWaiting) => self.skip_waiting().await,
            Some(WorkerMessage::GetVersion) => {
                tracing::debug!("GET_VERSION without a reply port, dropping");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skip_waiting_wire_shape() {
        let msg = WorkerMessage::parse(&json!({"type": "SKIP_WAITING"}));
        assert_eq!(msg, Some(WorkerMessage::SkipWaiting));

        let encoded = serde_json::to_value(WorkerMessage::SkipWaiting).unwrap();
        assert_eq!(encoded, json!({"type": "SKIP_WAITING"}));
    }

    #[test]
    fn test_get_version_wire_shape() {
        let msg = WorkerMessage::parse(&json!({"type": "GET_VERSION"}));
        assert_eq!(msg, Some(WorkerMessage::GetVersion));
    }

    #[test]
    fn test_unknown_messages_ignored() {
        assert_eq!(WorkerMessage::parse(&json!({"type": "PRICE_SYNC"})), None);
        assert_eq!(WorkerMessage::parse(&json!({"kind": "SKIP_WAITING"})), None);
        assert_eq!(WorkerMessage::parse(&json!("SKIP_WAITING")), None);
    }

    #[tokio::test]
    async fn test_channel_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let channel = UpdateChannel { tx };
        assert!(matches!(channel.skip_waiting().await, Err(Error::ChannelClosed)));
    }
}
