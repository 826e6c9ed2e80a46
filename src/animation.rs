//! Frame and animation data model.
//!
//! An animation is a named, ordered sequence of frames plus the interval at
//! which the rotation engine steps through them. Animations with zero frames
//! may exist in the store but cannot be started.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Floor for the rotation interval, in milliseconds. Presence updates faster
/// than this trip the chat service's rate limiter.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 2900;

/// Interval used when a definition does not specify one.
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

/// One step of an animation: display text plus an optional emoji reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Static display text; also the fallback when dynamic evaluation fails
    pub text: String,

    /// Raw emoji reference: a unicode emoji or a `<a?:name:id>` custom token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji_token: Option<String>,

    /// Explicit custom-emoji id; takes precedence over the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji_id: Option<String>,

    /// When true, `expression` is evaluated in place of `text`
    #[serde(default)]
    pub is_dynamic: bool,

    /// Expression that must evaluate to a string; only meaningful together
    /// with `is_dynamic`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Frame {
    /// A plain static frame with no emoji.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emoji_token: None,
            emoji_id: None,
            is_dynamic: false,
            expression: None,
        }
    }

    pub fn with_emoji_token(mut self, token: impl Into<String>) -> Self {
        self.emoji_token = Some(token.into());
        self
    }

    pub fn with_emoji_id(mut self, id: impl Into<String>) -> Self {
        self.emoji_id = Some(id.into());
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.is_dynamic = true;
        self.expression = Some(expression.into());
        self
    }

    /// The expression to evaluate for this frame, if any.
    ///
    /// A frame flagged dynamic but carrying an empty or absent expression
    /// degrades to its static text.
    pub fn dynamic_expression(&self) -> Option<&str> {
        if !self.is_dynamic {
            return None;
        }
        self.expression
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// A named, ordered sequence of frames plus its rotation interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animation {
    pub id: String,
    /// Unique across the store, case-sensitive
    pub name: String,
    pub frames: Vec<Frame>,
    pub interval_ms: u64,
    /// True for at most one animation across the whole store; maintained by
    /// the rotation engine through the store's active-flag operations
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Animation {
    /// Create a fresh animation with a generated id and now-timestamps.
    /// The interval is clamped up to `min_interval_ms`.
    pub fn new(
        name: impl Into<String>,
        frames: Vec<Frame>,
        interval_ms: u64,
        min_interval_ms: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            frames,
            interval_ms: interval_ms.max(min_interval_ms),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Refresh `updated_at`; call on every mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_clamped_to_floor() {
        let anim = Animation::new("fast", vec![Frame::text("a")], 1000, DEFAULT_MIN_INTERVAL_MS);
        assert_eq!(anim.interval_ms, DEFAULT_MIN_INTERVAL_MS);

        let anim = Animation::new("slow", vec![Frame::text("a")], 60_000, DEFAULT_MIN_INTERVAL_MS);
        assert_eq!(anim.interval_ms, 60_000);
    }

    #[test]
    fn test_dynamic_expression_requires_flag_and_content() {
        let static_frame = Frame::text("hello");
        assert_eq!(static_frame.dynamic_expression(), None);

        let dynamic = Frame::text("fallback").with_expression("%H:%M");
        assert_eq!(dynamic.dynamic_expression(), Some("%H:%M"));

        // Flagged dynamic but empty expression degrades to static.
        let mut degraded = Frame::text("fallback");
        degraded.is_dynamic = true;
        degraded.expression = Some("   ".to_string());
        assert_eq!(degraded.dynamic_expression(), None);

        let mut absent = Frame::text("fallback");
        absent.is_dynamic = true;
        assert_eq!(absent.dynamic_expression(), None);
    }

    #[test]
    fn test_touch_refreshes_updated_at() {
        let mut anim = Animation::new("a", vec![Frame::text("x")], 5000, DEFAULT_MIN_INTERVAL_MS);
        let before = anim.updated_at;
        anim.touch();
        assert!(anim.updated_at >= before);
    }

    #[test]
    fn test_frame_deserializes_with_defaults() {
        let frame: Frame = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(frame.text, "hi");
        assert!(!frame.is_dynamic);
        assert!(frame.emoji_token.is_none());
        assert!(frame.emoji_id.is_none());
    }
}
