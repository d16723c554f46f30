//! Per-chat session map.
//!
//! Each chat gets one `Mutex<Conversation>`. Updates for different chats run
//! in parallel; turns within one chat are serialized by the lock, so the
//! relay loop is the sole mutator of any conversation at a time.

use mordomo_core::channel::ChatId;
use mordomo_core::conversation::Conversation;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Default)]
pub struct SessionMap {
    sessions: RwLock<HashMap<i64, Arc<Mutex<Conversation>>>>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The conversation for a chat, created on first access.
    pub async fn get(&self, chat_id: ChatId) -> Arc<Mutex<Conversation>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(conv) = sessions.get(&chat_id.0) {
                return conv.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(chat_id.0)
            .or_insert_with(|| {
                debug!(chat_id = %chat_id, "New conversation session");
                Arc::new(Mutex::new(Conversation::new(chat_id)))
            })
            .clone()
    }

    /// Clear a chat's history (the `/start` command).
    pub async fn reset(&self, chat_id: ChatId) {
        let conv = self.get(chat_id).await;
        conv.lock().await.reset();
        debug!(chat_id = %chat_id, "Conversation reset");
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mordomo_core::conversation::Turn;

    #[tokio::test]
    async fn same_chat_returns_same_conversation() {
        let sessions = SessionMap::new();

        let a = sessions.get(ChatId(7)).await;
        a.lock().await.push(Turn::user("oi"));

        let b = sessions.get(ChatId(7)).await;
        assert_eq!(b.lock().await.turns.len(), 1);
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn different_chats_are_isolated() {
        let sessions = SessionMap::new();

        sessions.get(ChatId(1)).await.lock().await.push(Turn::user("a"));
        let other = sessions.get(ChatId(2)).await;

        assert!(other.lock().await.turns.is_empty());
        assert_eq!(sessions.len().await, 2);
    }

    #[tokio::test]
    async fn reset_clears_history_but_keeps_the_session() {
        let sessions = SessionMap::new();

        sessions.get(ChatId(7)).await.lock().await.push(Turn::user("oi"));
        sessions.reset(ChatId(7)).await;

        let conv = sessions.get(ChatId(7)).await;
        assert!(conv.lock().await.turns.is_empty());
        assert_eq!(sessions.len().await, 1);
    }
}
