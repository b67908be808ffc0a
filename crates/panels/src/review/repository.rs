use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{ReviewId, UserId};
use storage::{Storage, StoredReview};

/// Review lookups and vote mutations the review panel performs per event.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn review(&self, review_id: ReviewId) -> Result<Option<StoredReview>>;

    async fn reviews_for_subject(&self, subject: &str) -> Result<Vec<StoredReview>>;

    async fn vote_of(&self, review_id: ReviewId, member_id: UserId) -> Result<Option<bool>>;

    /// Records `value` for the member, replacing an earlier vote.
    async fn add_vote(&self, review_id: ReviewId, value: bool, member_id: UserId) -> Result<()>;

    /// Returns whether a vote existed.
    async fn remove_vote(&self, review_id: ReviewId, member_id: UserId) -> Result<bool>;
}

#[async_trait]
impl ReviewRepository for Storage {
    async fn review(&self, review_id: ReviewId) -> Result<Option<StoredReview>> {
        self.review_by_id(review_id).await
    }

    async fn reviews_for_subject(&self, subject: &str) -> Result<Vec<StoredReview>> {
        Storage::reviews_for_subject(self, subject).await
    }

    async fn vote_of(&self, review_id: ReviewId, member_id: UserId) -> Result<Option<bool>> {
        Storage::vote_of(self, review_id, member_id).await
    }

    async fn add_vote(&self, review_id: ReviewId, value: bool, member_id: UserId) -> Result<()> {
        self.set_vote(review_id, member_id, value).await
    }

    async fn remove_vote(&self, review_id: ReviewId, member_id: UserId) -> Result<bool> {
        Storage::remove_vote(self, review_id, member_id).await
    }
}
