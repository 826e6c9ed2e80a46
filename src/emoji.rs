//! Emoji resolution for presence updates.
//!
//! A frame references its emoji either by explicit custom-emoji id, by a
//! `<a?:name:id>` custom token, or by a literal unicode emoji. Resolution
//! never fails; a frame with nothing resolvable simply publishes without an
//! emoji.

use crate::animation::Frame;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Base URL for custom-emoji images.
const EMOJI_CDN_BASE: &str = "https://cdn.discordapp.com/emojis";

/// A custom emoji known to the emoji catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEmoji {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub animated: bool,
}

impl CustomEmoji {
    /// CDN image URL: gif for animated emojis, png otherwise.
    pub fn image_url(&self) -> String {
        let ext = if self.animated { "gif" } else { "png" };
        format!("{}/{}.{}", EMOJI_CDN_BASE, self.id, ext)
    }

    pub fn presentation(&self) -> EmojiPresentation {
        EmojiPresentation {
            name: self.name.clone(),
            id: Some(self.id.clone()),
            animated: self.animated,
        }
    }
}

/// Emoji data in the shape the presence payload carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmojiPresentation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub animated: bool,
}

impl EmojiPresentation {
    /// A literal unicode emoji; the token itself is the name.
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            animated: false,
        }
    }

    pub fn custom(name: impl Into<String>, id: impl Into<String>, animated: bool) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
            animated,
        }
    }
}

/// Read access to the live custom-emoji catalog of the chat session.
#[async_trait]
pub trait EmojiCatalog: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Option<CustomEmoji>;

    /// All known custom emojis, sorted by name.
    async fn list(&self) -> Vec<CustomEmoji>;
}

/// Fixed in-memory catalog.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    emojis: HashMap<String, CustomEmoji>,
}

impl StaticCatalog {
    pub fn new(emojis: impl IntoIterator<Item = CustomEmoji>) -> Self {
        Self {
            emojis: emojis.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }
}

#[async_trait]
impl EmojiCatalog for StaticCatalog {
    async fn find_by_id(&self, id: &str) -> Option<CustomEmoji> {
        self.emojis.get(id).cloned()
    }

    async fn list(&self) -> Vec<CustomEmoji> {
        let mut all: Vec<CustomEmoji> = self.emojis.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

/// Maps a frame's emoji reference to presentation data.
#[derive(Clone)]
pub struct EmojiResolver {
    token_pattern: Regex,
    catalog: Arc<dyn EmojiCatalog>,
}

impl EmojiResolver {
    pub fn new(catalog: Arc<dyn EmojiCatalog>) -> Self {
        Self {
            token_pattern: Regex::new(r"^<(a)?:(\w+):(\d+)>$").unwrap(),
            catalog,
        }
    }

    /// Resolve a frame's emoji reference, in priority order:
    ///
    /// 1. An explicit `emoji_id` is looked up in the catalog; when set it is
    ///    authoritative, so a miss yields no emoji rather than falling back
    ///    to the token.
    /// 2. A `<a?:name:id>` token is parsed directly, no catalog lookup.
    /// 3. Any other non-empty token is a literal unicode emoji.
    pub async fn resolve(&self, frame: &Frame) -> Option<EmojiPresentation> {
        if let Some(id) = frame.emoji_id.as_deref() {
            return self
                .catalog
                .find_by_id(id)
                .await
                .map(|e| e.presentation());
        }

        let token = frame.emoji_token.as_deref()?.trim();
        if token.is_empty() {
            return None;
        }

        if let Some(caps) = self.token_pattern.captures(token) {
            return Some(EmojiPresentation::custom(
                &caps[2],
                &caps[3],
                caps.get(1).is_some(),
            ));
        }

        Some(EmojiPresentation::unicode(token))
    }
}
