//! Dynamic frame text evaluation.
//!
//! Dynamic content is a capability, not a control-flow requirement: the
//! engine talks to a pluggable [`ExpressionEvaluator`] and guards every call
//! with a timeout. A failing or slow expression falls back to the frame's
//! static text, so one bad frame can never stall or stop rotation.

use crate::animation::Frame;
use crate::{Result, StatusCycleError};
use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use std::time::Duration;
use tracing::warn;

/// Turns a frame expression into display text.
#[async_trait]
pub trait ExpressionEvaluator: Send + Sync {
    async fn evaluate(&self, expression: &str) -> Result<String>;
}

/// Built-in evaluator for live-clock frames: the expression is a strftime
/// format string rendered against the current local time, e.g. `"%H:%M"`
/// or `"online since %A"`. Text without `%` specifiers passes through as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrftimeEvaluator;

#[async_trait]
impl ExpressionEvaluator for StrftimeEvaluator {
    async fn evaluate(&self, expression: &str) -> Result<String> {
        let items: Vec<Item> = StrftimeItems::new(expression).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(StatusCycleError::Evaluation(format!(
                "invalid time format: {}",
                expression
            )));
        }
        Ok(Local::now().format_with_items(items.into_iter()).to_string())
    }
}

/// Compute the display text for a frame.
///
/// Total: never fails. Static frames (and dynamic frames with an empty
/// expression) return their text verbatim; evaluation errors and timeouts
/// are logged and fall back to the static text.
pub async fn evaluate_frame(
    frame: &Frame,
    evaluator: &dyn ExpressionEvaluator,
    timeout: Duration,
) -> String {
    let Some(expression) = frame.dynamic_expression() else {
        return frame.text.clone();
    };

    match tokio::time::timeout(timeout, evaluator.evaluate(expression)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Expression evaluation failed, using static text: {}", e);
            frame.text.clone()
        }
        Err(_) => {
            warn!(
                "Expression evaluation timed out after {:?}, using static text",
                timeout
            );
            frame.text.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVAL_TIMEOUT: Duration = Duration::from_millis(250);

    struct ThrowingEvaluator;

    #[async_trait]
    impl ExpressionEvaluator for ThrowingEvaluator {
        async fn evaluate(&self, _expression: &str) -> Result<String> {
            Err(StatusCycleError::Evaluation("boom".to_string()))
        }
    }

    struct StallingEvaluator;

    #[async_trait]
    impl ExpressionEvaluator for StallingEvaluator {
        async fn evaluate(&self, _expression: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn test_static_frame_returns_text_verbatim() {
        let frame = Frame::text("playing chess");
        let text = evaluate_frame(&frame, &StrftimeEvaluator, EVAL_TIMEOUT).await;
        assert_eq!(text, "playing chess");
    }

    #[tokio::test]
    async fn test_dynamic_frame_without_expression_uses_text() {
        let mut frame = Frame::text("fallback");
        frame.is_dynamic = true;
        let text = evaluate_frame(&frame, &StrftimeEvaluator, EVAL_TIMEOUT).await;
        assert_eq!(text, "fallback");
    }

    #[tokio::test]
    async fn test_strftime_literal_passthrough() {
        let text = StrftimeEvaluator.evaluate("online").await.unwrap();
        assert_eq!(text, "online");
    }

    #[tokio::test]
    async fn test_strftime_renders_digits() {
        let text = StrftimeEvaluator.evaluate("%H:%M").await.unwrap();
        assert_eq!(text.len(), 5);
        assert!(text.chars().nth(2) == Some(':'));
    }

    #[tokio::test]
    async fn test_strftime_rejects_unknown_specifier() {
        let err = StrftimeEvaluator.evaluate("%Q").await.unwrap_err();
        assert!(matches!(err, StatusCycleError::Evaluation(_)));
    }

    #[tokio::test]
    async fn test_failing_expression_falls_back_to_text() {
        let frame = Frame::text("static text").with_expression("whatever");
        let text = evaluate_frame(&frame, &ThrowingEvaluator, EVAL_TIMEOUT).await;
        assert_eq!(text, "static text");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalling_expression_times_out_to_text() {
        let frame = Frame::text("static text").with_expression("whatever");
        let text = evaluate_frame(&frame, &StallingEvaluator, EVAL_TIMEOUT).await;
        assert_eq!(text, "static text");
    }
}
