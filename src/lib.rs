//! Statuscycle - animated chat status rotator
//!
//! Cycles a chat client's visible status through a named sequence of frames
//! (text + optional emoji), one frame per tick, on a fixed interval:
//! - Rotation engine owning the single active animation, its frame pointer
//!   and the repeating timer
//! - Per-frame dynamic text evaluation with a guaranteed static fallback
//! - Custom/unicode emoji resolution against an emoji catalog
//! - Best-effort presence publishing to the chat service

pub mod animation;
pub mod emoji;
pub mod evaluator;
pub mod logfmt;
pub mod publisher;
pub mod rotator;
pub mod store;

pub use animation::{Animation, Frame};
pub use emoji::{CustomEmoji, EmojiCatalog, EmojiPresentation, EmojiResolver, StaticCatalog};
pub use evaluator::{ExpressionEvaluator, StrftimeEvaluator};
pub use logfmt::LogMode;
pub use publisher::{DryRunPublisher, HttpPresencePublisher, PresencePublisher};
pub use rotator::{RotationEngine, RotationStatus, StartedRotation};
pub use store::{AnimationDraft, AnimationStore, MemoryStore};

use std::time::Duration;

/// Configuration for the rotation engine
#[derive(Debug, Clone)]
pub struct RotatorConfig {
    /// Floor for the per-frame interval, in milliseconds; presence updates
    /// below this rate trip the chat service's rate limiter
    pub min_interval_ms: u64,

    /// Upper bound on a single dynamic-expression evaluation
    pub eval_timeout: Duration,

    /// Initial verbosity of the per-frame display output
    pub log_mode: LogMode,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: animation::DEFAULT_MIN_INTERVAL_MS,
            eval_timeout: Duration::from_millis(250),
            log_mode: LogMode::Minimal,
        }
    }
}

impl RotatorConfig {
    pub fn with_min_interval_ms(mut self, floor: u64) -> Self {
        self.min_interval_ms = floor;
        self
    }

    pub fn with_eval_timeout(mut self, timeout: Duration) -> Self {
        self.eval_timeout = timeout;
        self
    }

    pub fn with_log_mode(mut self, mode: LogMode) -> Self {
        self.log_mode = mode;
        self
    }
}

/// Result type for statuscycle operations
pub type Result<T> = std::result::Result<T, StatusCycleError>;

/// Errors that can occur in statuscycle
#[derive(Debug, thiserror::Error)]
pub enum StatusCycleError {
    #[error("Animation not found: {0}")]
    NotFound(String),

    #[error("Animation has no frames: {0}")]
    EmptyAnimation(String),

    #[error("Animation name already taken: {0}")]
    DuplicateName(String),

    #[error("Invalid log mode: {0} (expected none, minimal or detailed)")]
    InvalidMode(String),

    #[error("Expression evaluation failed: {0}")]
    Evaluation(String),

    #[error("Presence publish failed: {0}")]
    Publish(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
