//! Log-mode contract for the per-frame display output.
//!
//! This is the user-facing channel showing what the rotator is doing, written
//! to stdout, distinct from tracing diagnostics:
//! - `none`: fully silent, start/stop lines included
//! - `minimal`: a single line per tick, rewritten in place
//! - `detailed`: a bordered multi-line block per tick

use crate::StatusCycleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

/// Preview length for the minimal one-liner.
pub const MINIMAL_PREVIEW_LEN: usize = 50;
/// Preview length for the detailed block.
pub const DETAILED_PREVIEW_LEN: usize = 80;

const DETAILED_BORDER: &str = "═══════════════════════════════════════";

/// Verbosity of the per-frame display output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    None,
    #[default]
    Minimal,
    Detailed,
}

impl FromStr for LogMode {
    type Err = StatusCycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(LogMode::None),
            "minimal" => Ok(LogMode::Minimal),
            "detailed" => Ok(LogMode::Detailed),
            other => Err(StatusCycleError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogMode::None => "none",
            LogMode::Minimal => "minimal",
            LogMode::Detailed => "detailed",
        };
        write!(f, "{}", s)
    }
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// One-line frame summary: `[index+1/count]`, a 50-char preview, emoji token.
pub fn format_minimal_line(
    index: usize,
    count: usize,
    text: &str,
    emoji_token: Option<&str>,
) -> String {
    let emoji_display = emoji_token
        .map(|e| format!(" {}", e))
        .unwrap_or_default();
    format!(
        "🔄 [{}/{}] {}{}",
        index + 1,
        count,
        preview(text, MINIMAL_PREVIEW_LEN),
        emoji_display
    )
}

/// Multi-line frame block: index/count, 80-char preview, emoji, interval.
pub fn format_detailed_block(
    index: usize,
    count: usize,
    text: &str,
    emoji_token: Option<&str>,
    interval_ms: u64,
) -> String {
    let mut block = String::new();
    block.push_str(DETAILED_BORDER);
    block.push('\n');
    block.push_str(&format!("🔄 Frame: [{}/{}]\n", index + 1, count));
    block.push_str(&format!("📝 \"{}\"\n", preview(text, DETAILED_PREVIEW_LEN)));
    if let Some(emoji) = emoji_token {
        block.push_str(&format!("🎨 Emoji: {}\n", emoji));
    }
    block.push_str(&format!("⏱️  Next: {}ms\n", interval_ms));
    block.push_str(DETAILED_BORDER);
    block
}

/// Write the per-tick line/block for `mode`.
pub fn log_frame(
    mode: LogMode,
    index: usize,
    count: usize,
    text: &str,
    emoji_token: Option<&str>,
    interval_ms: u64,
) {
    match mode {
        LogMode::None => {}
        LogMode::Minimal => {
            // Rewrite the same line in place, padded to clear leftovers from
            // a longer previous frame.
            let line = format_minimal_line(index, count, text, emoji_token);
            print!("\r{:<100}", line);
            let _ = io::stdout().flush();
        }
        LogMode::Detailed => {
            println!(
                "{}\n",
                format_detailed_block(index, count, text, emoji_token, interval_ms)
            );
        }
    }
}

/// Write the rotation-started line.
pub fn log_started(mode: LogMode, name: &str, frame_count: usize, interval_ms: u64) {
    if mode == LogMode::None {
        return;
    }
    println!(
        "\n✅ Started animation: \"{}\" ({} frames, {}ms interval)\n",
        name, frame_count, interval_ms
    );
}

/// Write the rotation-stopped line.
pub fn log_stopped(mode: LogMode) {
    if mode == LogMode::None {
        return;
    }
    // Leading newlines step off the minimal mode's in-place line.
    println!("\n\n⏹️  Animation stopped\n");
}
