use std::{sync::Arc, time::Duration};

use shared::{
    domain::{ChannelId, ControlStyle, UserId},
    protocol::{Control, ControlEvent, Embed, MessageHandle},
};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::{PanelError, PanelResult},
    grid::ControlGrid,
    lock::PanelLock,
    page_source::Pages,
    pagination::{NavAction, Pagination},
    transport::MessageTransport,
};

pub const START_ID: &str = "embed:start_page";
pub const PREV_ID: &str = "embed:prev_page";
pub const NEXT_ID: &str = "embed:next_page";
pub const END_ID: &str = "embed:end_page";
pub const LOCK_ID: &str = "embed:lock";
pub const NAVIGATION_IDS: [&str; 4] = [START_ID, PREV_ID, NEXT_ID, END_ID];

pub const LOCK_ROW: u8 = 0;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelOptions {
    /// Row holding the navigation controls.
    pub row: u8,
    /// Only the owner may navigate, and no lock control is offered.
    pub perma_lock: bool,
    pub roll_around: bool,
    pub show_end_control: bool,
    /// Appends `Page i/n` to every page footer.
    pub show_page_numbers: bool,
    /// Inactivity window after which controls are detached; `None` keeps the panel alive.
    pub timeout: Option<Duration>,
    pub start_page: usize,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            row: 0,
            perma_lock: false,
            roll_around: true,
            show_end_control: true,
            show_page_numbers: false,
            timeout: Some(DEFAULT_TIMEOUT),
            start_page: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Built but not yet bound to a message.
    Pending,
    Active,
    /// Timed out; controls were detached.
    Expired,
    /// The bound message could not be updated.
    Dead,
}

/// What an event changed and therefore what has to be pushed to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    Nothing,
    Controls,
    /// Same page index, new content.
    Content,
    /// Outer page index moved; content and controls are both resent.
    Page,
}

pub fn page_label(page: usize, max: usize) -> String {
    format!("Page {page}/{max}")
}

/// Live pagination state bound to one platform message.
pub struct PanelSession {
    id: Uuid,
    transport: Arc<dyn MessageTransport>,
    lock: PanelLock,
    pagination: Pagination,
    grid: ControlGrid,
    pages: Pages,
    page: Embed,
    options: PanelOptions,
    message: Option<MessageHandle>,
    state: SessionState,
    last_activity: Instant,
}

impl PanelSession {
    pub async fn new(
        transport: Arc<dyn MessageTransport>,
        owner: UserId,
        mut pages: Pages,
        options: PanelOptions,
    ) -> PanelResult<Self> {
        let max = pages.len();
        if max == 0 {
            return Err(PanelError::NoPages);
        }
        if options.show_page_numbers {
            pages.for_each_static(|idx, embed| embed.append_footer(&page_label(idx + 1, max)));
        }

        let mut session = Self {
            id: Uuid::new_v4(),
            transport,
            lock: PanelLock::new(owner, options.perma_lock),
            pagination: Pagination::new(options.start_page, max, options.roll_around),
            grid: ControlGrid::new(),
            pages,
            page: Embed::default(),
            options,
            message: None,
            state: SessionState::Pending,
            last_activity: Instant::now(),
        };
        if session.pagination.is_paginated() {
            session.place_navigation()?;
        }
        session.page = session.render_current().await?;
        debug!(panel = %session.id, %owner, pages = max, "panel built");
        Ok(session)
    }

    fn place_navigation(&mut self) -> PanelResult<()> {
        let row = self.options.row;
        self.grid
            .place(Control::new(START_ID, "⏪", ControlStyle::Primary, row))?;
        self.grid
            .place(Control::new(PREV_ID, "◀", ControlStyle::Primary, row))?;
        self.grid
            .place(Control::new(NEXT_ID, "▶", ControlStyle::Primary, row))?;
        // a lazy source has no cheap last page to jump to
        if self.options.show_end_control && !self.pages.is_lazy() {
            self.grid
                .place(Control::new(END_ID, "⏩", ControlStyle::Primary, row))?;
        }
        if !self.lock.is_perma_locked() {
            let (emoji, style) = self.lock.appearance();
            self.grid
                .place(Control::new(LOCK_ID, emoji, style, LOCK_ROW))?;
        }
        Ok(())
    }

    async fn render_current(&self) -> PanelResult<Embed> {
        let current = self.pagination.current();
        let rendered = self
            .pages
            .render(current - 1)
            .await
            .map_err(PanelError::Source)?;
        let mut page = match rendered {
            Some(page) => page,
            None => {
                warn!(panel = %self.id, page = current, "page source returned no page");
                Embed::default().with_description("Nothing to show on this page.")
            }
        };
        if self.options.show_page_numbers && self.pages.is_lazy() {
            page.append_footer(&page_label(current, self.pagination.max()));
        }
        Ok(page)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> UserId {
        self.lock.owner()
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current()
    }

    pub fn max_page(&self) -> usize {
        self.pagination.max()
    }

    /// The page as currently displayed.
    pub fn page(&self) -> &Embed {
        &self.page
    }

    pub fn grid(&self) -> &ControlGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut ControlGrid {
        &mut self.grid
    }

    pub fn lock(&self) -> &PanelLock {
        &self.lock
    }

    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    pub fn message(&self) -> Option<MessageHandle> {
        self.message
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Sends the first page with its controls and binds the session to the new message.
    pub async fn send(&mut self, channel_id: ChannelId) -> PanelResult<MessageHandle> {
        let handle = self
            .transport
            .send_message(channel_id, &self.page, self.grid.controls())
            .await
            .map_err(PanelError::Transport)?;
        self.message = Some(handle);
        self.state = SessionState::Active;
        self.last_activity = Instant::now();
        info!(
            panel = %self.id,
            message_id = %handle.message_id,
            pages = self.pagination.max(),
            "panel opened"
        );
        Ok(handle)
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// When the inactivity window closes, if the panel is live and has one.
    pub fn deadline(&self) -> Option<Instant> {
        if !self.is_active() {
            return None;
        }
        self.options
            .timeout
            .map(|timeout| self.last_activity + timeout)
    }

    pub fn toggle_lock(&mut self, actor: UserId) -> PanelResult<bool> {
        let locked = self.lock.toggle(actor)?;
        let (emoji, style) = self.lock.appearance();
        self.grid.restyle(LOCK_ID, emoji, style);
        debug!(panel = %self.id, locked, "panel lock toggled");
        Ok(locked)
    }

    pub fn may_navigate(&self, actor: UserId) -> bool {
        self.lock.may_navigate(actor)
    }

    pub async fn navigate(&mut self, action: NavAction) -> PanelResult<usize> {
        let page = self.pagination.apply(action);
        self.page = self.render_current().await?;
        Ok(page)
    }

    /// Replaces the content of the current page without moving the page index.
    pub fn replace_page(&mut self, page: Embed) {
        self.pages.store(self.pagination.current() - 1, page.clone());
        self.page = page;
    }

    pub async fn redraw(&mut self, redraw: Redraw) -> PanelResult<()> {
        let (page, controls) = match redraw {
            Redraw::Nothing => return Ok(()),
            Redraw::Controls => (None, Some(self.grid.controls())),
            Redraw::Content => (Some(&self.page), None),
            Redraw::Page => (Some(&self.page), Some(self.grid.controls())),
        };
        let message = self.message.ok_or(PanelError::NotSent)?;
        let result = self.transport.edit_message(&message, page, controls).await;
        if let Err(err) = result {
            warn!(panel = %self.id, message_id = %message.message_id, error = %err, "panel message edit failed");
            self.state = SessionState::Dead;
            return Err(PanelError::Transport(err));
        }
        Ok(())
    }

    /// Private notice to the clicking user. Delivery failures are logged, not propagated.
    pub async fn notify(&self, event: &ControlEvent, text: &str) {
        if let Err(err) = self.transport.reply_private(event, text).await {
            warn!(panel = %self.id, actor = %event.actor, error = %err, "private reply failed");
        }
    }

    /// Detaches all controls. Terminal: later events are ignored.
    pub async fn expire(&mut self) -> PanelResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        self.state = SessionState::Expired;
        self.grid.disable_all();
        let message = self.message.ok_or(PanelError::NotSent)?;
        info!(panel = %self.id, message_id = %message.message_id, "panel timed out");
        if let Err(err) = self.transport.detach_controls(&message).await {
            self.state = SessionState::Dead;
            return Err(PanelError::Transport(err));
        }
        Ok(())
    }

    pub(crate) fn mark_dead(&mut self) {
        self.state = SessionState::Dead;
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
