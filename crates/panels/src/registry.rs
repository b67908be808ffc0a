use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use futures::future::join_all;
use shared::{
    domain::{ChannelId, MessageId},
    protocol::{ControlEvent, MessageHandle},
};
use tokio::{
    sync::{Mutex, RwLock},
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    error::PanelResult,
    handler::{EventOutcome, Panel},
};

type SharedPanel = Arc<Mutex<Panel>>;

/// Live panels keyed by the message they drive. Each panel sits behind its own mutex so
/// events on one message are handled one at a time.
#[derive(Default)]
pub struct PanelRegistry {
    panels: RwLock<HashMap<MessageId, SharedPanel>>,
    /// Held shared by every `open` from send until insert. A lookup miss waits for it
    /// exclusively, so a click on a message that is still being registered finds its panel.
    opening: RwLock<()>,
}

impl PanelRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sends the panel's first page and starts routing events for the new message to it.
    pub async fn open(
        self: &Arc<Self>,
        mut panel: Panel,
        channel_id: ChannelId,
    ) -> PanelResult<MessageHandle> {
        let opening = self.opening.read().await;
        let handle = panel.send(channel_id).await?;
        let with_timeout = panel.session().deadline().is_some();
        let shared = Arc::new(Mutex::new(panel));
        self.panels
            .write()
            .await
            .insert(handle.message_id, shared.clone());
        drop(opening);
        if with_timeout {
            self.spawn_timeout(handle.message_id, shared);
        }
        Ok(handle)
    }

    pub async fn dispatch(&self, event: &ControlEvent) -> PanelResult<EventOutcome> {
        let panel = match self.lookup(event.message_id).await {
            Some(panel) => Some(panel),
            None => {
                let _settled = self.opening.write().await;
                self.lookup(event.message_id).await
            }
        };
        let Some(panel) = panel else {
            debug!(message_id = %event.message_id, control_id = %event.control_id, "no panel for message");
            return Ok(EventOutcome::Unhandled);
        };

        let mut guard = panel.lock().await;
        let outcome = guard.handle_event(event).await;
        let live = guard.session().is_active();
        drop(guard);

        if !live {
            self.remove(event.message_id).await;
        }
        outcome
    }

    async fn lookup(&self, message_id: MessageId) -> Option<SharedPanel> {
        self.panels.read().await.get(&message_id).cloned()
    }

    pub async fn contains(&self, message_id: MessageId) -> bool {
        self.panels.read().await.contains_key(&message_id)
    }

    pub async fn len(&self) -> usize {
        self.panels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn remove(&self, message_id: MessageId) {
        if self.panels.write().await.remove(&message_id).is_some() {
            debug!(%message_id, "panel unregistered");
        }
    }

    /// Detaches the controls of every live panel.
    pub async fn shutdown(&self) {
        let panels: Vec<(MessageId, SharedPanel)> = self.panels.write().await.drain().collect();
        info!(panels = panels.len(), "closing live panels");
        let closing = panels.into_iter().map(|(message_id, panel)| async move {
            if let Err(err) = panel.lock().await.expire().await {
                warn!(%message_id, error = %err, "failed to close panel");
            }
        });
        join_all(closing).await;
    }

    fn spawn_timeout(self: &Arc<Self>, message_id: MessageId, panel: SharedPanel) {
        let registry: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let deadline = panel.lock().await.session().deadline();
                let Some(deadline) = deadline else {
                    break;
                };
                sleep_until(deadline).await;

                let mut guard = panel.lock().await;
                match guard.session().deadline() {
                    // an event arrived while sleeping
                    Some(current) if current > Instant::now() => continue,
                    Some(_) => {
                        if let Err(err) = guard.expire().await {
                            warn!(%message_id, error = %err, "failed to detach controls on timeout");
                        }
                        break;
                    }
                    None => break,
                }
            }
            if let Some(registry) = registry.upgrade() {
                registry.remove(message_id).await;
            }
        });
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
