use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::ChannelId,
    protocol::{Control, ControlEvent, Embed, MessageHandle},
};

/// Message operations the panel engine needs from the chat platform.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        page: &Embed,
        controls: &[Control],
    ) -> Result<MessageHandle>;

    /// Replaces the page, the controls, or both. `None` leaves that part as it is.
    async fn edit_message(
        &self,
        message: &MessageHandle,
        page: Option<&Embed>,
        controls: Option<&[Control]>,
    ) -> Result<()>;

    /// Strips every control from the message, leaving it static.
    async fn detach_controls(&self, message: &MessageHandle) -> Result<()>;

    /// Answers a click with a notice only the clicking user sees.
    async fn reply_private(&self, event: &ControlEvent, text: &str) -> Result<()>;

    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<()>;
}

pub struct MissingTransport;

#[async_trait]
impl MessageTransport for MissingTransport {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        _page: &Embed,
        _controls: &[Control],
    ) -> Result<MessageHandle> {
        Err(anyhow!("message transport unavailable for channel {channel_id}"))
    }

    async fn edit_message(
        &self,
        message: &MessageHandle,
        _page: Option<&Embed>,
        _controls: Option<&[Control]>,
    ) -> Result<()> {
        Err(anyhow!(
            "message transport unavailable for message {}",
            message.message_id
        ))
    }

    async fn detach_controls(&self, message: &MessageHandle) -> Result<()> {
        Err(anyhow!(
            "message transport unavailable for message {}",
            message.message_id
        ))
    }

    async fn reply_private(&self, event: &ControlEvent, _text: &str) -> Result<()> {
        Err(anyhow!(
            "message transport unavailable for interaction {}",
            event.interaction_id
        ))
    }

    async fn send_text(&self, channel_id: ChannelId, _text: &str) -> Result<()> {
        Err(anyhow!("message transport unavailable for channel {channel_id}"))
    }
}
