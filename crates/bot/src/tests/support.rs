use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use panels::{MessageTransport, PanelRegistry};
use shared::{
    domain::{ChannelId, MessageId, Semester, Tier, UserId},
    protocol::{CommandInvocation, Control, ControlEvent, Embed, MessageHandle},
};
use storage::{Storage, StoredSubject};
use tokio::sync::Mutex;

use crate::app_state::AppState;

pub const CHANNEL: ChannelId = ChannelId(10);
pub const ALICE: UserId = UserId(1);
pub const BOB: UserId = UserId(2);
pub const ADMIN: UserId = UserId(99);

/// Keeps every outgoing platform call in memory.
#[derive(Default)]
pub struct StubTransport {
    pub sent: Mutex<Vec<(Embed, Vec<Control>)>>,
    pub edited: Mutex<Vec<MessageHandle>>,
    pub texts: Mutex<Vec<String>>,
    pub private: Mutex<Vec<String>>,
    next_message: AtomicI64,
}

impl StubTransport {
    pub fn last_message(&self) -> MessageId {
        MessageId(self.next_message.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl MessageTransport for StubTransport {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        page: &Embed,
        controls: &[Control],
    ) -> Result<MessageHandle> {
        self.sent.lock().await.push((page.clone(), controls.to_vec()));
        let message_id = MessageId(self.next_message.fetch_add(1, Ordering::SeqCst) + 1);
        Ok(MessageHandle {
            channel_id,
            message_id,
        })
    }

    async fn edit_message(
        &self,
        message: &MessageHandle,
        _page: Option<&Embed>,
        _controls: Option<&[Control]>,
    ) -> Result<()> {
        self.edited.lock().await.push(*message);
        Ok(())
    }

    async fn detach_controls(&self, _message: &MessageHandle) -> Result<()> {
        Ok(())
    }

    async fn reply_private(&self, _event: &ControlEvent, text: &str) -> Result<()> {
        self.private.lock().await.push(text.to_string());
        Ok(())
    }

    async fn send_text(&self, _channel_id: ChannelId, text: &str) -> Result<()> {
        self.texts.lock().await.push(text.to_string());
        Ok(())
    }
}

pub async fn test_state() -> (AppState, Arc<StubTransport>) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .upsert_subject(&StoredSubject {
            shortcut: "ipp".to_string(),
            name: "Principles of Programming Languages".to_string(),
            kind: "P".to_string(),
            semester: Semester::Summer,
            degree: Some("BIT".to_string()),
            year: Some("2BIT".to_string()),
        })
        .await
        .expect("subject");
    let transport = Arc::new(StubTransport::default());
    let state = AppState {
        storage,
        transport: transport.clone(),
        panels: PanelRegistry::new(),
        panel_timeout: Some(Duration::from_secs(300)),
        admins: vec![ADMIN],
    };
    (state, transport)
}

pub async fn seed_review(state: &AppState, author: UserId, text: &str) {
    state
        .storage
        .add_review(author, "alice", "ipp", Tier::B, false, text)
        .await
        .expect("review")
        .expect("known subject");
}

pub fn command(name: &str, subcommand: Option<&str>, options: &[(&str, &str)]) -> CommandInvocation {
    CommandInvocation {
        interaction_id: "ia".to_string(),
        token: "token".to_string(),
        channel_id: CHANNEL,
        actor: ALICE,
        actor_name: Some("alice".to_string()),
        name: name.to_string(),
        subcommand: subcommand.map(str::to_string),
        options: options
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>(),
    }
}
