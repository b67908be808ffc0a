use anyhow::{Context, Result};
use async_trait::async_trait;
use panels::{group_rows, MessageTransport};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{
    domain::{ChannelId, ControlStyle, MessageId},
    protocol::{Control, ControlEvent, Embed, MessageHandle},
};
use tracing::debug;
use url::Url;

const PRIVATE_FLAG: u64 = 1 << 6;
const ACTION_ROW: u64 = 1;
const BUTTON: u64 = 2;
const CHANNEL_MESSAGE: u64 = 4;

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: i64,
}

/// Talks to the chat platform's REST API.
pub struct HttpTransport {
    http: Client,
    api_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let parsed = Url::parse(api_url)
            .with_context(|| format!("invalid platform api url '{api_url}'"))?;
        Ok(Self {
            http: Client::new(),
            api_url: parsed.as_str().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.api_url));
        match &self.token {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, format!("Bot {token}")),
            None => builder,
        }
    }
}

fn style_code(style: ControlStyle) -> u64 {
    match style {
        ControlStyle::Primary => 1,
        ControlStyle::Secondary => 2,
        ControlStyle::Success => 3,
        ControlStyle::Danger => 4,
    }
}

/// The page in the platform's embed shape: footer as an object, timestamp as RFC 3339.
pub(crate) fn embed_json(page: &Embed) -> Value {
    let mut embed = serde_json::Map::new();
    if let Some(title) = &page.title {
        embed.insert("title".into(), json!(title));
    }
    if let Some(description) = &page.description {
        embed.insert("description".into(), json!(description));
    }
    if let Some(color) = page.color {
        embed.insert("color".into(), json!(color));
    }
    if !page.fields.is_empty() {
        let fields: Vec<Value> = page
            .fields
            .iter()
            .map(|field| json!({ "name": field.name, "value": field.value, "inline": field.inline }))
            .collect();
        embed.insert("fields".into(), Value::Array(fields));
    }
    if let Some(footer) = &page.footer {
        embed.insert("footer".into(), json!({ "text": footer }));
    }
    if let Some(timestamp) = page.timestamp {
        embed.insert("timestamp".into(), json!(timestamp.to_rfc3339()));
    }
    Value::Object(embed)
}

/// Buttons grouped into action rows in row order; empty rows are left out.
pub(crate) fn components_json(controls: &[Control]) -> Value {
    let rows: Vec<Value> = group_rows(controls)
        .into_iter()
        .map(|row| {
            let buttons: Vec<Value> = row
                .into_iter()
                .map(|control| {
                    json!({
                        "type": BUTTON,
                        "custom_id": control.id,
                        "emoji": { "name": control.emoji },
                        "style": style_code(control.style),
                        "disabled": !control.enabled,
                    })
                })
                .collect();
            json!({ "type": ACTION_ROW, "components": buttons })
        })
        .collect();
    Value::Array(rows)
}

#[async_trait]
impl MessageTransport for HttpTransport {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        page: &Embed,
        controls: &[Control],
    ) -> Result<MessageHandle> {
        let created: CreatedMessage = self
            .request(reqwest::Method::POST, &format!("/channels/{channel_id}/messages"))
            .json(&json!({
                "embeds": [embed_json(page)],
                "components": components_json(controls),
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(%channel_id, message_id = created.id, "panel message sent");
        Ok(MessageHandle {
            channel_id,
            message_id: MessageId(created.id),
        })
    }

    async fn edit_message(
        &self,
        message: &MessageHandle,
        page: Option<&Embed>,
        controls: Option<&[Control]>,
    ) -> Result<()> {
        let mut body = serde_json::Map::new();
        if let Some(page) = page {
            body.insert("embeds".into(), json!([embed_json(page)]));
        }
        if let Some(controls) = controls {
            body.insert("components".into(), components_json(controls));
        }
        self.request(
            reqwest::Method::PATCH,
            &format!(
                "/channels/{}/messages/{}",
                message.channel_id, message.message_id
            ),
        )
        .json(&Value::Object(body))
        .send()
        .await?
        .error_for_status()
        .with_context(|| format!("failed to edit message {}", message.message_id))?;
        Ok(())
    }

    async fn detach_controls(&self, message: &MessageHandle) -> Result<()> {
        let none: &[Control] = &[];
        self.edit_message(message, None, Some(none)).await
    }

    async fn reply_private(&self, event: &ControlEvent, text: &str) -> Result<()> {
        self.request(
            reqwest::Method::POST,
            &format!("/interactions/{}/{}/callback", event.interaction_id, event.token),
        )
        .json(&json!({
            "type": CHANNEL_MESSAGE,
            "data": { "content": text, "flags": PRIVATE_FLAG },
        }))
        .send()
        .await?
        .error_for_status()?;
        Ok(())
    }

    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<()> {
        self.request(reqwest::Method::POST, &format!("/channels/{channel_id}/messages"))
            .json(&json!({ "content": text }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
