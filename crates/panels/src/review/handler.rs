use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{ControlStyle, ReviewId},
    protocol::{Control, ControlEvent},
};
use storage::StoredReview;
use tracing::debug;

use super::{
    render::{review_embed, review_id, text_page},
    repository::ReviewRepository,
    DISLIKE_ID, HELP_ID, HELP_TEXT, LIKE_ID, NEXT_TEXT_ID, PREV_TEXT_ID, TEXT_ROW, VOTE_REMOVE_ID,
};
use crate::{
    error::{PanelError, PanelResult},
    handler::{Flow, PanelHandler},
    pagination::{next_page, NavAction},
    session::{PanelSession, Redraw},
};

/// Votes, inner text scrolling and help for review panels. Sits in front of the lock and
/// navigation handlers.
pub struct ReviewHandler {
    repo: Arc<dyn ReviewRepository>,
}

impl ReviewHandler {
    pub fn new(repo: Arc<dyn ReviewRepository>) -> Self {
        Self { repo }
    }

    async fn load(&self, review_id: ReviewId) -> PanelResult<Option<StoredReview>> {
        self.repo.review(review_id).await.map_err(PanelError::Source)
    }

    async fn vote(
        &self,
        session: &mut PanelSession,
        event: &ControlEvent,
        value: Option<bool>,
    ) -> PanelResult<Flow> {
        let Some(id) = review_id(session.page()) else {
            return Ok(Flow::Done(Redraw::Nothing));
        };
        let Some(review) = self.load(id).await? else {
            debug!(review_id = %id, "voted review no longer exists");
            return Ok(Flow::Done(Redraw::Nothing));
        };
        if review.member_id == event.actor {
            return Err(PanelError::VoteOwn);
        }

        match value {
            Some(value) => {
                let prior = self
                    .repo
                    .vote_of(id, event.actor)
                    .await
                    .map_err(PanelError::Source)?;
                if prior == Some(value) {
                    return Err(PanelError::AlreadyVoted);
                }
                self.repo
                    .add_vote(id, value, event.actor)
                    .await
                    .map_err(PanelError::Source)?;
            }
            None => {
                let removed = self
                    .repo
                    .remove_vote(id, event.actor)
                    .await
                    .map_err(PanelError::Source)?;
                if !removed {
                    return Err(PanelError::NoVote);
                }
            }
        }
        debug!(review_id = %id, actor = %event.actor, ?value, "review vote recorded");

        let Some(review) = self.load(id).await? else {
            return Ok(Flow::Done(Redraw::Nothing));
        };
        let shown = text_page(session.page()).map_or(1, |(current, _)| current);
        session.replace_page(review_embed(&review, shown));
        Ok(Flow::Done(Redraw::Content))
    }

    async fn scroll(&self, session: &mut PanelSession, event: &ControlEvent) -> PanelResult<Flow> {
        let Some((current, max)) = text_page(session.page()) else {
            return Ok(Flow::Done(Redraw::Nothing));
        };
        let Some(action) = NavAction::from_control_id(&event.control_id) else {
            return Ok(Flow::Continue);
        };
        let target = next_page(action, current, max, session.options().roll_around);
        if target == current {
            return Ok(Flow::Done(Redraw::Nothing));
        }
        let Some(id) = review_id(session.page()) else {
            return Ok(Flow::Done(Redraw::Nothing));
        };
        let Some(review) = self.load(id).await? else {
            return Ok(Flow::Done(Redraw::Nothing));
        };
        session.replace_page(review_embed(&review, target));
        Ok(Flow::Done(Redraw::Content))
    }
}

/// Shows the inner scroll controls exactly when the current page carries a text page field.
pub fn sync_text_controls(session: &mut PanelSession) -> PanelResult<()> {
    if text_page(session.page()).is_some() {
        let grid = session.grid_mut();
        grid.place(Control::new(NEXT_TEXT_ID, "🔽", ControlStyle::Primary, TEXT_ROW))?;
        grid.place(Control::new(PREV_TEXT_ID, "🔼", ControlStyle::Primary, TEXT_ROW))?;
    } else {
        session
            .grid_mut()
            .remove_where(|control| control.id == NEXT_TEXT_ID || control.id == PREV_TEXT_ID);
    }
    Ok(())
}

#[async_trait]
impl PanelHandler for ReviewHandler {
    async fn on_control(
        &self,
        session: &mut PanelSession,
        event: &ControlEvent,
    ) -> PanelResult<Flow> {
        match event.control_id.as_str() {
            LIKE_ID => self.vote(session, event, Some(true)).await,
            DISLIKE_ID => self.vote(session, event, Some(false)).await,
            VOTE_REMOVE_ID => self.vote(session, event, None).await,
            NEXT_TEXT_ID | PREV_TEXT_ID => self.scroll(session, event).await,
            HELP_ID => {
                session.notify(event, HELP_TEXT).await;
                Ok(Flow::Done(Redraw::Nothing))
            }
            _ => Ok(Flow::Continue),
        }
    }

    async fn on_page_changed(&self, session: &mut PanelSession) -> PanelResult<()> {
        sync_text_controls(session)
    }
}
