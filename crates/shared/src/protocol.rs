use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, ControlStyle, MessageId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Rich message body. One embed is one page of a panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
    }

    pub fn field(&self, name: &str) -> Option<&EmbedField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Appends `segment` to the footer, separated by ` | `.
    pub fn append_footer(&mut self, segment: &str) {
        self.footer = Some(match self.footer.take() {
            Some(existing) if !existing.is_empty() => format!("{existing} | {segment}"),
            _ => segment.to_string(),
        });
    }

    /// Footer segments split on `|`, trimmed.
    pub fn footer_segments(&self) -> Vec<&str> {
        self.footer
            .as_deref()
            .map(|footer| footer.split('|').map(str::trim).collect())
            .unwrap_or_default()
    }
}

/// One button attached to a message. `id` is the identity the platform echoes back on click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    pub emoji: String,
    #[serde(default)]
    pub style: ControlStyle,
    pub row: u8,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl Control {
    pub fn new(id: impl Into<String>, emoji: impl Into<String>, style: ControlStyle, row: u8) -> Self {
        Self {
            id: id.into(),
            emoji: emoji.into(),
            style,
            row,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// A click on a control, as delivered by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlEvent {
    pub interaction_id: String,
    pub token: String,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub control_id: String,
    pub actor: UserId,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInvocation {
    pub interaction_id: String,
    pub token: String,
    pub channel_id: ChannelId,
    pub actor: UserId,
    #[serde(default)]
    pub actor_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub subcommand: Option<String>,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl CommandInvocation {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Interaction {
    Command(CommandInvocation),
    Component(ControlEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionResponse {
    pub handled: bool,
}
