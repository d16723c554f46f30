//! Delivery adapter — turns a relay outcome into channel sends.
//!
//! Owns temp-file cleanup: a generated attachment is removed from disk after
//! the send attempt, whether or not the send succeeded, so a failed send
//! never leaks the file.

use mordomo_core::channel::{Channel, ChatId, PresenceAction};
use mordomo_core::conversation::RelayOutcome;
use mordomo_core::error::ChannelError;
use tracing::{debug, warn};

/// Deliver a relay outcome to a chat.
pub async fn deliver(
    channel: &dyn Channel,
    chat_id: ChatId,
    outcome: &RelayOutcome,
) -> Result<(), ChannelError> {
    let Some(path) = &outcome.attachment else {
        return channel.send_text(chat_id, &outcome.reply).await;
    };

    // Presence is best effort.
    if let Err(e) = channel
        .send_presence(chat_id, PresenceAction::UploadingDocument)
        .await
    {
        debug!(chat_id = %chat_id, error = %e, "Presence action failed");
    }

    let caption = if outcome.reply.trim().is_empty() {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("documento");
        format!("Aqui está o seu arquivo: {file_name}")
    } else {
        outcome.reply.clone()
    };

    let sent = channel.send_document(chat_id, path, Some(&caption)).await;

    // The file is removed regardless of the send result.
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "Failed to remove temp file");
    } else {
        debug!(path = %path.display(), "Temp file removed");
    }

    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mordomo_core::channel::IncomingMessage;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Text(String),
        Document { file: PathBuf, caption: Option<String> },
        Presence(PresenceAction),
    }

    struct FakeChannel {
        sent: Mutex<Vec<Sent>>,
        fail_document: bool,
    }

    impl FakeChannel {
        fn new(fail_document: bool) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_document,
            }
        }

        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Channel for FakeChannel {
        fn name(&self) -> &str {
            "fake"
        }

        async fn start(
            &self,
        ) -> Result<mpsc::Receiver<Result<IncomingMessage, ChannelError>>, ChannelError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn send_text(&self, _chat_id: ChatId, text: &str) -> Result<(), ChannelError> {
            self.sent.lock().unwrap().push(Sent::Text(text.into()));
            Ok(())
        }

        async fn send_document(
            &self,
            chat_id: ChatId,
            path: &Path,
            caption: Option<&str>,
        ) -> Result<(), ChannelError> {
            self.sent.lock().unwrap().push(Sent::Document {
                file: path.to_path_buf(),
                caption: caption.map(String::from),
            });
            if self.fail_document {
                return Err(ChannelError::DeliveryFailed {
                    chat_id: chat_id.0,
                    reason: "file too big".into(),
                });
            }
            Ok(())
        }

        async fn send_presence(
            &self,
            _chat_id: ChatId,
            action: PresenceAction,
        ) -> Result<(), ChannelError> {
            self.sent.lock().unwrap().push(Sent::Presence(action));
            Ok(())
        }

        fn is_allowed(&self, _sender_id: &str) -> bool {
            true
        }
    }

    fn temp_attachment() -> PathBuf {
        static SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let n = SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "mordomo-delivery-{}-{n}.pdf",
            std::process::id()
        ));
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();
        path
    }

    #[tokio::test]
    async fn text_outcome_sends_text() {
        let channel = FakeChannel::new(false);
        let outcome = RelayOutcome::text("A capital da França é Paris.");

        deliver(&channel, ChatId(1), &outcome).await.unwrap();

        assert_eq!(
            channel.sent(),
            vec![Sent::Text("A capital da França é Paris.".into())]
        );
    }

    #[tokio::test]
    async fn attachment_is_sent_with_reply_as_caption_and_removed() {
        let channel = FakeChannel::new(false);
        let path = temp_attachment();
        let outcome = RelayOutcome {
            reply: "Aqui está o documento, Senhor.".into(),
            attachment: Some(path.clone()),
        };

        deliver(&channel, ChatId(1), &outcome).await.unwrap();

        let sent = channel.sent();
        assert_eq!(sent[0], Sent::Presence(PresenceAction::UploadingDocument));
        assert_eq!(
            sent[1],
            Sent::Document {
                file: path.clone(),
                caption: Some("Aqui está o documento, Senhor.".into()),
            }
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn empty_reply_gets_a_generic_caption() {
        let channel = FakeChannel::new(false);
        let path = temp_attachment();
        let outcome = RelayOutcome {
            reply: String::new(),
            attachment: Some(path.clone()),
        };

        deliver(&channel, ChatId(1), &outcome).await.unwrap();

        match &channel.sent()[1] {
            Sent::Document { caption, .. } => {
                let caption = caption.as_deref().unwrap();
                assert!(caption.contains("Aqui está o seu arquivo"));
                assert!(caption.contains(".pdf"));
            }
            other => panic!("expected document, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn file_is_removed_even_when_send_fails() {
        let channel = FakeChannel::new(true);
        let path = temp_attachment();
        let outcome = RelayOutcome {
            reply: "caption".into(),
            attachment: Some(path.clone()),
        };

        let err = deliver(&channel, ChatId(1), &outcome).await.unwrap_err();

        assert!(matches!(err, ChannelError::DeliveryFailed { .. }));
        assert!(!path.exists());
    }
}
