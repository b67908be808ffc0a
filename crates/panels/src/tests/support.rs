use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicI64, Ordering},
        Arc,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::{
    domain::{ChannelId, MessageId, ReviewId, Tier, UserId},
    protocol::{Control, ControlEvent, Embed, MessageHandle},
};
use storage::StoredReview;
use tokio::sync::Mutex;

use crate::{review::ReviewRepository, transport::MessageTransport};

pub const OWNER: UserId = UserId(1);
pub const OTHER: UserId = UserId(2);
pub const CHANNEL: ChannelId = ChannelId(10);

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        page: Embed,
        controls: Vec<Control>,
    },
    Edit {
        message_id: MessageId,
        page: Option<Embed>,
        controls: Option<Vec<Control>>,
    },
    Detach {
        message_id: MessageId,
    },
    Private {
        actor: UserId,
        text: String,
    },
    Text {
        text: String,
    },
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_message: AtomicI64,
    fail_edits: AtomicBool,
    fail_private: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_message: AtomicI64::new(100),
            ..Self::default()
        })
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn fail_private(&self) {
        self.fail_private.store(true, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn edits(&self) -> Vec<Call> {
        self.calls()
            .await
            .into_iter()
            .filter(|call| matches!(call, Call::Edit { .. }))
            .collect()
    }

    pub async fn private_replies(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                Call::Private { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        page: &Embed,
        controls: &[Control],
    ) -> Result<MessageHandle> {
        self.calls.lock().await.push(Call::Send {
            page: page.clone(),
            controls: controls.to_vec(),
        });
        Ok(MessageHandle {
            channel_id,
            message_id: MessageId(self.next_message.fetch_add(1, Ordering::SeqCst)),
        })
    }

    async fn edit_message(
        &self,
        message: &MessageHandle,
        page: Option<&Embed>,
        controls: Option<&[Control]>,
    ) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(anyhow!("message {} is gone", message.message_id));
        }
        self.calls.lock().await.push(Call::Edit {
            message_id: message.message_id,
            page: page.cloned(),
            controls: controls.map(<[Control]>::to_vec),
        });
        Ok(())
    }

    async fn detach_controls(&self, message: &MessageHandle) -> Result<()> {
        self.calls.lock().await.push(Call::Detach {
            message_id: message.message_id,
        });
        Ok(())
    }

    async fn reply_private(&self, event: &ControlEvent, text: &str) -> Result<()> {
        if self.fail_private.load(Ordering::SeqCst) {
            return Err(anyhow!("interaction {} expired", event.interaction_id));
        }
        self.calls.lock().await.push(Call::Private {
            actor: event.actor,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_text(&self, _channel_id: ChannelId, text: &str) -> Result<()> {
        self.calls.lock().await.push(Call::Text {
            text: text.to_string(),
        });
        Ok(())
    }
}

pub fn event(message_id: MessageId, control_id: &str, actor: UserId) -> ControlEvent {
    ControlEvent {
        interaction_id: format!("ia-{control_id}"),
        token: "token".to_string(),
        channel_id: CHANNEL,
        message_id,
        control_id: control_id.to_string(),
        actor,
        metadata: serde_json::Value::Null,
    }
}

pub fn pages(count: usize) -> Vec<Embed> {
    (1..=count)
        .map(|idx| Embed::new(format!("page {idx}")))
        .collect()
}

pub fn review(id: i64, author: UserId, text: &str) -> StoredReview {
    StoredReview {
        review_id: ReviewId(id),
        member_id: author,
        author_name: format!("user{}", author.0),
        subject: "ipp".to_string(),
        tier: Tier::B,
        anonymous: false,
        text: text.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        likes: 0,
        dislikes: 0,
    }
}

/// Reviews and votes held in memory; vote counts are derived on read like the store does.
#[derive(Default)]
pub struct MemoryReviews {
    reviews: Mutex<Vec<StoredReview>>,
    votes: Mutex<HashMap<(ReviewId, UserId), bool>>,
    fail: AtomicBool,
}

impl MemoryReviews {
    pub fn with_reviews(reviews: Vec<StoredReview>) -> Arc<Self> {
        Arc::new(Self {
            reviews: Mutex::new(reviews),
            ..Self::default()
        })
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub async fn vote(&self, review_id: ReviewId, member_id: UserId) -> Option<bool> {
        self.votes.lock().await.get(&(review_id, member_id)).copied()
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        Ok(())
    }

    async fn with_counts(&self, mut review: StoredReview) -> StoredReview {
        let votes = self.votes.lock().await;
        let of_review = votes
            .iter()
            .filter(|((id, _), _)| *id == review.review_id)
            .map(|(_, value)| *value);
        let (likes, dislikes) = of_review.fold((0, 0), |(likes, dislikes), value| {
            if value {
                (likes + 1, dislikes)
            } else {
                (likes, dislikes + 1)
            }
        });
        review.likes = likes;
        review.dislikes = dislikes;
        review
    }
}

#[async_trait]
impl ReviewRepository for MemoryReviews {
    async fn review(&self, review_id: ReviewId) -> Result<Option<StoredReview>> {
        self.check()?;
        let found = self
            .reviews
            .lock()
            .await
            .iter()
            .find(|review| review.review_id == review_id)
            .cloned();
        match found {
            Some(review) => Ok(Some(self.with_counts(review).await)),
            None => Ok(None),
        }
    }

    async fn reviews_for_subject(&self, subject: &str) -> Result<Vec<StoredReview>> {
        self.check()?;
        let matching: Vec<StoredReview> = self
            .reviews
            .lock()
            .await
            .iter()
            .filter(|review| review.subject == subject)
            .cloned()
            .collect();
        let mut out = Vec::with_capacity(matching.len());
        for review in matching {
            out.push(self.with_counts(review).await);
        }
        Ok(out)
    }

    async fn vote_of(&self, review_id: ReviewId, member_id: UserId) -> Result<Option<bool>> {
        self.check()?;
        Ok(self.vote(review_id, member_id).await)
    }

    async fn add_vote(&self, review_id: ReviewId, value: bool, member_id: UserId) -> Result<()> {
        self.check()?;
        self.votes
            .lock()
            .await
            .insert((review_id, member_id), value);
        Ok(())
    }

    async fn remove_vote(&self, review_id: ReviewId, member_id: UserId) -> Result<bool> {
        self.check()?;
        Ok(self
            .votes
            .lock()
            .await
            .remove(&(review_id, member_id))
            .is_some())
    }
}
