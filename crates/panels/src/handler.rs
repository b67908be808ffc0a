use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::ChannelId,
    protocol::{ControlEvent, MessageHandle},
};
use tracing::{debug, error, info};

use crate::{
    error::{PanelError, PanelResult},
    pagination::NavAction,
    session::{PanelSession, Redraw, LOCK_ID, NAVIGATION_IDS},
};

/// Result of offering an event to one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Not this handler's control; try the next one.
    Continue,
    Done(Redraw),
}

/// One link of a panel's dispatch chain.
#[async_trait]
pub trait PanelHandler: Send + Sync {
    async fn on_control(
        &self,
        session: &mut PanelSession,
        event: &ControlEvent,
    ) -> PanelResult<Flow>;

    /// Runs after the outer page index moved, before the message is edited.
    async fn on_page_changed(&self, _session: &mut PanelSession) -> PanelResult<()> {
        Ok(())
    }
}

pub struct LockHandler;

#[async_trait]
impl PanelHandler for LockHandler {
    async fn on_control(
        &self,
        session: &mut PanelSession,
        event: &ControlEvent,
    ) -> PanelResult<Flow> {
        if event.control_id != LOCK_ID {
            return Ok(Flow::Continue);
        }
        session.toggle_lock(event.actor)?;
        Ok(Flow::Done(Redraw::Controls))
    }
}

pub struct NavigationHandler;

#[async_trait]
impl PanelHandler for NavigationHandler {
    async fn on_control(
        &self,
        session: &mut PanelSession,
        event: &ControlEvent,
    ) -> PanelResult<Flow> {
        if !NAVIGATION_IDS.contains(&event.control_id.as_str()) || session.max_page() <= 1 {
            return Ok(Flow::Continue);
        }
        let Some(action) = NavAction::from_control_id(&event.control_id) else {
            return Ok(Flow::Continue);
        };
        if !session.may_navigate(event.actor) {
            return Err(PanelError::NotAuthor);
        }
        let page = session.navigate(action).await?;
        debug!(panel = %session.id(), page, ?action, "panel navigated");
        Ok(Flow::Done(Redraw::Page))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Handled(Redraw),
    /// Refused with a private notice; nothing changed.
    Rejected,
    /// No handler owns the control.
    Unhandled,
    /// The panel is not live or the event targets another message.
    Ignored,
}

/// A session plus its ordered handler chain.
pub struct Panel {
    session: PanelSession,
    handlers: Vec<Arc<dyn PanelHandler>>,
}

impl Panel {
    pub fn new(session: PanelSession) -> Self {
        Self {
            session,
            handlers: vec![Arc::new(LockHandler), Arc::new(NavigationHandler)],
        }
    }

    /// Puts `handler` in front of every handler installed so far.
    pub fn with_handler(mut self, handler: impl PanelHandler + 'static) -> Self {
        self.handlers.insert(0, Arc::new(handler));
        self
    }

    pub fn session(&self) -> &PanelSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PanelSession {
        &mut self.session
    }

    pub async fn send(&mut self, channel_id: ChannelId) -> PanelResult<MessageHandle> {
        self.session.send(channel_id).await
    }

    pub async fn expire(&mut self) -> PanelResult<()> {
        self.session.expire().await
    }

    pub async fn handle_event(&mut self, event: &ControlEvent) -> PanelResult<EventOutcome> {
        let bound = self.session.message().map(|handle| handle.message_id);
        if !self.session.is_active() || bound != Some(event.message_id) {
            debug!(
                panel = %self.session.id(),
                state = ?self.session.state(),
                control_id = %event.control_id,
                "event ignored"
            );
            return Ok(EventOutcome::Ignored);
        }
        self.session.touch();

        let handlers = self.handlers.clone();
        for handler in &handlers {
            let flow = handler.on_control(&mut self.session, event).await;
            match flow {
                Ok(Flow::Continue) => continue,
                Ok(Flow::Done(redraw)) => {
                    return self.finish(redraw).await.map(|_| EventOutcome::Handled(redraw));
                }
                Err(err) if err.is_user_facing() => {
                    info!(
                        panel = %self.session.id(),
                        actor = %event.actor,
                        control_id = %event.control_id,
                        reason = %err,
                        "panel event rejected"
                    );
                    self.session.notify(event, &err.to_string()).await;
                    return Ok(EventOutcome::Rejected);
                }
                Err(err) => {
                    if err.is_fatal() {
                        self.session.mark_dead();
                    }
                    error!(
                        panel = %self.session.id(),
                        control_id = %event.control_id,
                        error = %err,
                        "panel event failed"
                    );
                    return Err(err);
                }
            }
        }
        Ok(EventOutcome::Unhandled)
    }

    async fn finish(&mut self, redraw: Redraw) -> PanelResult<()> {
        if redraw == Redraw::Page {
            for handler in &self.handlers {
                handler.on_page_changed(&mut self.session).await?;
            }
        }
        self.session.redraw(redraw).await
    }
}

#[cfg(test)]
#[path = "tests/handler_tests.rs"]
mod tests;
