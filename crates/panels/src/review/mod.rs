//! Review panels: one page per review, a second pagination axis over long review texts,
//! and vote controls that rewrite the shown page in place.

mod handler;
mod render;
mod repository;
mod tierboard;

use std::{sync::Arc, time::Duration};

use shared::{
    domain::{ControlStyle, UserId},
    protocol::Control,
};
use tracing::debug;

pub use handler::{sync_text_controls, ReviewHandler};
pub use render::{
    no_reviews_embed, review_embed, review_id, review_pages, text_page, DISLIKES_FIELD,
    LIKES_FIELD, TEXT_FIELD, TEXT_PAGE_FIELD, TEXT_PAGE_LEN,
};
pub use repository::ReviewRepository;
pub use tierboard::{tierboard_panel, TierboardSource, TIERBOARD_PAGE_LEN};

use crate::{
    error::{PanelError, PanelResult},
    handler::Panel,
    page_source::Pages,
    session::{PanelOptions, PanelSession},
    transport::MessageTransport,
};

pub const LIKE_ID: &str = "review:like";
pub const VOTE_REMOVE_ID: &str = "review:vote_remove";
pub const DISLIKE_ID: &str = "review:dislike";
pub const HELP_ID: &str = "review:help";
pub const NEXT_TEXT_ID: &str = "review:next_text";
pub const PREV_TEXT_ID: &str = "review:prev_text";

pub const VOTE_ROW: u8 = 0;
pub const TEXT_ROW: u8 = 2;

pub const HELP_TEXT: &str = "👍 marks the review as helpful, 👎 as unhelpful, 🛑 takes your vote back. \
🔼 and 🔽 scroll through a long review text. ◀ and ▶ move between reviews.";

pub fn review_options(timeout: Option<Duration>) -> PanelOptions {
    PanelOptions {
        row: TEXT_ROW,
        show_end_control: false,
        timeout,
        ..PanelOptions::default()
    }
}

fn place_vote_controls(session: &mut PanelSession) -> PanelResult<()> {
    let grid = session.grid_mut();
    grid.place(Control::new(LIKE_ID, "👍", ControlStyle::Success, VOTE_ROW))?;
    grid.place(Control::new(VOTE_REMOVE_ID, "🛑", ControlStyle::Secondary, VOTE_ROW))?;
    grid.place(Control::new(DISLIKE_ID, "👎", ControlStyle::Danger, VOTE_ROW))?;
    grid.place(Control::new(HELP_ID, "❔", ControlStyle::Primary, VOTE_ROW))?;
    Ok(())
}

/// Builds the review panel for `subject`. A subject without reviews gets a single static page
/// and no controls.
pub async fn review_panel(
    transport: Arc<dyn MessageTransport>,
    repo: Arc<dyn ReviewRepository>,
    owner: UserId,
    subject: &str,
    timeout: Option<Duration>,
) -> PanelResult<Panel> {
    let reviews = repo
        .reviews_for_subject(subject)
        .await
        .map_err(PanelError::Source)?;
    let pages = Pages::from_embeds(review_pages(subject, &reviews));
    let mut session = PanelSession::new(transport, owner, pages, review_options(timeout)).await?;

    if session.page().fields.is_empty() {
        session.grid_mut().clear();
        debug!(subject, "review panel without reviews");
        return Ok(Panel::new(session));
    }
    place_vote_controls(&mut session)?;
    sync_text_controls(&mut session)?;
    Ok(Panel::new(session).with_handler(ReviewHandler::new(repo)))
}

#[cfg(test)]
#[path = "../tests/review_tests.rs"]
mod tests;
