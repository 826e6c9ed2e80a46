//! Rotation engine: owns the single active animation, its frame pointer and
//! the repeating timer that drives presence updates.
//!
//! Timer policy: ticks are scheduled at a fixed rate from the moment the
//! rotation starts, not chained off tick completion; a missed tick is
//! skipped, not replayed. Tick execution is serialized through the session
//! write lock. `stop()` acquires the same lock and bumps the session
//! generation before returning, so an in-flight tick finishes first and no
//! tick from a cancelled rotation can ever publish afterwards.

use crate::animation::Animation;
use crate::emoji::{EmojiCatalog, EmojiResolver};
use crate::evaluator::{self, ExpressionEvaluator};
use crate::logfmt::{self, LogMode};
use crate::publisher::PresencePublisher;
use crate::store::AnimationStore;
use crate::{Result, RotatorConfig, StatusCycleError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Success payload returned by [`RotationEngine::start`].
#[derive(Debug, Clone, Serialize)]
pub struct StartedRotation {
    pub name: String,
    pub frame_count: usize,
    pub interval_ms: u64,
}

/// Read model polled by outer layers (API, UI).
#[derive(Debug, Clone, Serialize)]
pub struct RotationStatus {
    pub is_running: bool,
    pub current_animation: Option<ActiveAnimation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveAnimation {
    pub id: String,
    pub name: String,
    pub frame_count: usize,
    pub interval_ms: u64,
    pub current_frame_index: usize,
}

/// Live, process-owned rotation state. Exclusively owned by the engine; all
/// mutation happens under the engine's write lock.
struct RotationSession {
    running: bool,
    /// Snapshot of the animation being rotated, loaded once at start
    animation: Option<Animation>,
    current_frame_index: usize,
    /// The single armed repeating timer
    timer: Option<JoinHandle<()>>,
    /// Bumped on every cancellation; ticks from older generations are inert
    generation: u64,
    log_mode: LogMode,
}

impl RotationSession {
    fn new(log_mode: LogMode) -> Self {
        Self {
            running: false,
            animation: None,
            current_frame_index: 0,
            timer: None,
            generation: 0,
            log_mode,
        }
    }
}

/// The rotation engine. Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct RotationEngine {
    session: Arc<RwLock<RotationSession>>,
    store: Arc<dyn AnimationStore>,
    publisher: Arc<dyn PresencePublisher>,
    resolver: EmojiResolver,
    evaluator: Arc<dyn ExpressionEvaluator>,
    config: RotatorConfig,
}

impl RotationEngine {
    pub fn new(
        store: Arc<dyn AnimationStore>,
        publisher: Arc<dyn PresencePublisher>,
        catalog: Arc<dyn EmojiCatalog>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        config: RotatorConfig,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(RotationSession::new(config.log_mode))),
            store,
            publisher,
            resolver: EmojiResolver::new(catalog),
            evaluator,
            config,
        }
    }

    // ─── Start / stop ────────────────────────────────────────────────

    /// Start rotating `animation_id`.
    ///
    /// A running rotation is stopped first; its timer is fully cancelled
    /// before the new one is armed, so ticks never interleave across two
    /// rotations. The first frame is published before this returns, then
    /// the repeating timer fires every `interval_ms`.
    pub async fn start(&self, animation_id: &str) -> Result<StartedRotation> {
        let mut session = self.session.write().await;
        self.stop_locked(&mut session);

        let animation = self
            .store
            .find_by_id(animation_id)
            .await
            .ok_or_else(|| StatusCycleError::NotFound(animation_id.to_string()))?;
        if animation.frames.is_empty() {
            return Err(StatusCycleError::EmptyAnimation(animation.name));
        }

        // Persist the exclusive active flag: cleared everywhere, set here.
        self.store.set_active(&animation.id).await?;

        let started = StartedRotation {
            name: animation.name.clone(),
            frame_count: animation.frames.len(),
            interval_ms: animation.interval_ms,
        };
        let period = Duration::from_millis(animation.interval_ms);

        session.running = true;
        session.current_frame_index = 0;
        session.animation = Some(animation);
        let generation = session.generation;

        logfmt::log_started(
            session.log_mode,
            &started.name,
            started.frame_count,
            started.interval_ms,
        );
        info!(
            "Starting rotation \"{}\" ({} frames, {}ms)",
            started.name, started.frame_count, started.interval_ms
        );

        // First frame fires before start() returns.
        self.run_tick(&mut session).await;

        // Arm the repeating timer, first fire one full period out.
        let engine = self.clone();
        session.timer = Some(tokio::spawn(async move {
            let mut timer = time::interval_at(time::Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                if !engine.tick(generation).await {
                    break;
                }
            }
        }));

        Ok(started)
    }

    /// Stop the rotation. Idempotent: stopping a stopped engine is a no-op.
    ///
    /// Returns whether a running rotation was actually cancelled. Once this
    /// returns, no further tick fires. The persisted active flag is left for
    /// the caller to clear via the store.
    pub async fn stop(&self) -> bool {
        let mut session = self.session.write().await;
        self.stop_locked(&mut session)
    }

    /// Cancel the timer and reset session state under an already-held lock.
    fn stop_locked(&self, session: &mut RotationSession) -> bool {
        let was_running = session.running;
        if let Some(timer) = session.timer.take() {
            timer.abort();
        }
        session.generation = session.generation.wrapping_add(1);
        session.running = false;
        session.current_frame_index = 0;
        session.animation = None;

        if was_running {
            logfmt::log_stopped(session.log_mode);
            info!("Rotation stopped");
        }
        was_running
    }

    /// Delete an animation through the store, stopping rotation first when it
    /// is the one being rotated.
    pub async fn delete_animation(&self, id: &str) -> Result<Animation> {
        let mut session = self.session.write().await;
        let is_current = session
            .animation
            .as_ref()
            .is_some_and(|a| a.id == id);
        if session.running && is_current {
            self.stop_locked(&mut session);
        }
        drop(session);
        self.store.remove(id).await
    }

    // ─── Tick ────────────────────────────────────────────────────────

    /// Timer entry point. Returns false when this rotation generation has
    /// been cancelled and the timer task should exit.
    async fn tick(&self, generation: u64) -> bool {
        let mut session = self.session.write().await;
        if !session.running || session.generation != generation {
            return false;
        }
        self.run_tick(&mut session).await;
        // run_tick may have self-healed into a stop.
        session.running
    }

    /// Publish the current frame and advance the pointer. Requires exclusive
    /// session access; every failure is absorbed here so the rotation only
    /// ever stops through `stop()` or a vanished animation.
    async fn run_tick(&self, session: &mut RotationSession) {
        let (frame, frame_count, interval_ms) = match &session.animation {
            Some(animation) if !animation.frames.is_empty() => (
                animation.frames[session.current_frame_index].clone(),
                animation.frames.len(),
                animation.interval_ms,
            ),
            _ => {
                // The animation vanished under us; self-heal into a stop.
                warn!("Active animation missing or empty, stopping rotation");
                self.stop_locked(session);
                return;
            }
        };

        let text =
            evaluator::evaluate_frame(&frame, self.evaluator.as_ref(), self.config.eval_timeout)
                .await;
        let emoji = self.resolver.resolve(&frame).await;

        if let Err(e) = self.publisher.publish(&text, emoji.as_ref()).await {
            warn!("Presence publish failed (rotation continues): {}", e);
        }

        logfmt::log_frame(
            session.log_mode,
            session.current_frame_index,
            frame_count,
            &text,
            frame.emoji_token.as_deref(),
            interval_ms,
        );
        debug!(
            "Tick: frame {}/{} published",
            session.current_frame_index + 1,
            frame_count
        );

        // Advance unconditionally, wrapping, even when publishing failed.
        session.current_frame_index = (session.current_frame_index + 1) % frame_count;
    }

    // ─── Introspection ───────────────────────────────────────────────

    /// Consistent snapshot of the session state. No side effects.
    pub async fn status(&self) -> RotationStatus {
        let session = self.session.read().await;
        RotationStatus {
            is_running: session.running,
            current_animation: session.animation.as_ref().map(|a| ActiveAnimation {
                id: a.id.clone(),
                name: a.name.clone(),
                frame_count: a.frames.len(),
                interval_ms: a.interval_ms,
                current_frame_index: session.current_frame_index,
            }),
        }
    }

    /// Update the log mode. Takes effect on subsequent ticks; an unknown
    /// mode string is rejected and leaves the current mode in place.
    pub async fn set_log_mode(&self, mode: &str) -> Result<()> {
        let mode: LogMode = mode.parse()?;
        self.session.write().await.log_mode = mode;
        info!("Log mode set to: {}", mode);
        Ok(())
    }

    pub async fn log_mode(&self) -> LogMode {
        self.session.read().await.log_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emoji::StaticCatalog;
    use crate::evaluator::StrftimeEvaluator;
    use crate::publisher::DryRunPublisher;
    use crate::store::MemoryStore;

    fn quiet_engine(store: Arc<MemoryStore>) -> RotationEngine {
        RotationEngine::new(
            store,
            Arc::new(DryRunPublisher),
            Arc::new(StaticCatalog::default()),
            Arc::new(StrftimeEvaluator),
            RotatorConfig::default().with_log_mode(LogMode::None),
        )
    }

    #[tokio::test]
    async fn test_status_before_any_start() {
        let engine = quiet_engine(Arc::new(MemoryStore::new()));
        let status = engine.status().await;
        assert!(!status.is_running);
        assert!(status.current_animation.is_none());
    }

    #[tokio::test]
    async fn test_stop_on_stopped_engine_is_noop() {
        let engine = quiet_engine(Arc::new(MemoryStore::new()));
        assert!(!engine.stop().await);
        assert!(!engine.stop().await);
    }

    #[tokio::test]
    async fn test_set_log_mode_validates() {
        let engine = quiet_engine(Arc::new(MemoryStore::new()));
        engine.set_log_mode("detailed").await.unwrap();
        assert_eq!(engine.log_mode().await, LogMode::Detailed);

        let err = engine.set_log_mode("bogus").await.unwrap_err();
        assert!(matches!(err, StatusCycleError::InvalidMode(_)));
        // Rejected input leaves the previous mode active.
        assert_eq!(engine.log_mode().await, LogMode::Detailed);
    }
}
