// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender debounced dispatch.
//!
//! Every sender has one [`DispatchState`] behind its own mutex. The first
//! event of a burst moves the sender from `Idle` to `Scheduled` and spawns a
//! driver task; that task owns the sender until it returns to `Idle`:
//!
//! ```text
//! Idle -> Scheduled -> Processing -> Idle
//!                          ^     \
//!                          |      v
//!                          +--- Restarting
//! ```
//!
//! The driver sleeps for the batch window (measured from the first event,
//! never extended), runs reconciliation and generation outside the lock,
//! persists whatever was generated, then re-checks under the lock whether
//! any event arrived meanwhile. Fresh output is delivered; stale output stays
//! persisted but is not delivered and the cycle reruns after a short delay.
//! Events arriving while the driver exists are absorbed into its next look
//! at the history. The sender only returns to `Idle` once delivery has
//! finished; events that arrived during delivery get a fresh cycle after
//! another batch window.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use parley_config::model::DispatchConfig;
use parley_core::ParleyError;
use parley_core::traits::{ConversationStore, MessagingPlatform, ResponseGenerator};
use parley_core::types::{ConversationMessage, Role, SenderKey};

use crate::reconcile::HistoryReconciler;

/// Lifecycle phase of one sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    /// No driver; the next event schedules a cycle.
    Idle,
    /// Waiting out the batch window.
    Scheduled,
    /// Reconciling, generating, persisting and delivering.
    Processing,
    /// Output went stale; waiting to rerun.
    Restarting,
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPhase::Idle => write!(f, "idle"),
            DispatchPhase::Scheduled => write!(f, "scheduled"),
            DispatchPhase::Processing => write!(f, "processing"),
            DispatchPhase::Restarting => write!(f, "restarting"),
        }
    }
}

/// When the most recent event for a sender was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    /// Per-sender counter; two arrivals never share a value.
    pub seq: u64,
    pub at: DateTime<Utc>,
}

/// Mutable per-sender state, only touched under its mutex.
#[derive(Debug)]
pub struct DispatchState {
    phase: DispatchPhase,
    last_arrival: Option<Arrival>,
    next_seq: u64,
}

impl DispatchState {
    fn new() -> Self {
        Self {
            phase: DispatchPhase::Idle,
            last_arrival: None,
            next_seq: 1,
        }
    }

    fn record_arrival(&mut self) -> Arrival {
        let arrival = Arrival {
            seq: self.next_seq,
            at: Utc::now(),
        };
        self.next_seq += 1;
        self.last_arrival = Some(arrival);
        arrival
    }
}

/// Outcome of [`DispatchEngine::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The sender was idle; a new cycle was scheduled.
    Scheduled,
    /// A cycle already exists; the event joins it.
    Absorbed(DispatchPhase),
}

/// Timing knobs for the engine.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub batch_window: Duration,
    pub restart_delay: Duration,
    pub short_history_threshold: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatchSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            batch_window: config.batch_window(),
            restart_delay: config.restart_delay(),
            short_history_threshold: config.short_history_threshold,
        }
    }
}

/// Snapshot taken when a cycle starts.
struct Cycle {
    baseline: Option<Arrival>,
}

struct EngineInner {
    store: Arc<dyn ConversationStore>,
    platform: Arc<dyn MessagingPlatform>,
    generator: Arc<dyn ResponseGenerator>,
    reconciler: HistoryReconciler,
    settings: DispatchSettings,
    states: DashMap<SenderKey, Arc<Mutex<DispatchState>>>,
    drivers: TaskTracker,
}

/// Turns bursts of inbound messages into one generation per sender at a time.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct DispatchEngine {
    inner: Arc<EngineInner>,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        platform: Arc<dyn MessagingPlatform>,
        generator: Arc<dyn ResponseGenerator>,
        settings: DispatchSettings,
    ) -> Self {
        let reconciler = HistoryReconciler::new(
            store.clone(),
            platform.clone(),
            settings.short_history_threshold,
        );
        Self {
            inner: Arc::new(EngineInner {
                store,
                platform,
                generator,
                reconciler,
                settings,
                states: DashMap::new(),
                drivers: TaskTracker::new(),
            }),
        }
    }

    /// Persists an inbound user message and schedules or joins the sender's cycle.
    ///
    /// The message is stored before the arrival is recorded, so every
    /// arrival a cycle compares against is already in the history.
    pub async fn submit(
        &self,
        key: &SenderKey,
        message: ConversationMessage,
    ) -> Result<Submission, ParleyError> {
        self.inner.store.append(key, &[message]).await?;

        let state = self.inner.state_for(key);
        let mut guard = state.lock().await;
        let arrival = guard.record_arrival();

        if guard.phase != DispatchPhase::Idle {
            debug!(
                owner_id = %key.owner_id,
                sender_id = %key.sender_id,
                seq = arrival.seq,
                phase = %guard.phase,
                "event absorbed into pending cycle"
            );
            return Ok(Submission::Absorbed(guard.phase));
        }

        guard.phase = DispatchPhase::Scheduled;
        drop(guard);

        debug!(
            owner_id = %key.owner_id,
            sender_id = %key.sender_id,
            seq = arrival.seq,
            window_ms = self.inner.settings.batch_window.as_millis() as u64,
            "cycle scheduled"
        );
        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        self.inner
            .drivers
            .spawn(async move { inner.drive(key, state).await });
        Ok(Submission::Scheduled)
    }

    /// Current phase of a sender, `None` if it was never seen.
    pub async fn phase(&self, key: &SenderKey) -> Option<DispatchPhase> {
        let state = self.inner.states.get(key).map(|s| Arc::clone(s.value()))?;
        let phase = state.lock().await.phase;
        Some(phase)
    }

    /// Number of senders with a live driver.
    pub fn active_cycles(&self) -> usize {
        self.inner.drivers.len()
    }

    /// Waits up to `timeout` for every driver to return to `Idle`.
    ///
    /// Returns `true` when all drivers finished in time.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.inner.drivers.close();
        let active = self.inner.drivers.len();
        if active == 0 {
            info!("no in-flight dispatch cycles to drain");
            return true;
        }
        info!(count = active, "waiting for in-flight dispatch cycles");
        match tokio::time::timeout(timeout, self.inner.drivers.wait()).await {
            Ok(()) => {
                info!("all dispatch cycles drained");
                true
            }
            Err(_) => {
                warn!(
                    remaining = self.inner.drivers.len(),
                    "drain timeout reached, abandoning in-flight cycles"
                );
                false
            }
        }
    }
}

impl EngineInner {
    fn state_for(&self, key: &SenderKey) -> Arc<Mutex<DispatchState>> {
        // The shard guard is released at the end of this statement.
        Arc::clone(
            self.states
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(DispatchState::new())))
                .value(),
        )
    }

    /// Driver loop: the only task allowed to move a sender out of `Scheduled`.
    async fn drive(&self, key: SenderKey, state: Arc<Mutex<DispatchState>>) {
        tokio::time::sleep(self.settings.batch_window).await;

        let mut attempt = 1u32;
        loop {
            let Some(cycle) = self.begin_cycle(&key, &state).await else {
                return;
            };

            let generated = self.run_cycle(&key, attempt).await;

            let mut guard = state.lock().await;
            if guard.last_arrival != cycle.baseline {
                guard.phase = DispatchPhase::Restarting;
                drop(guard);
                info!(
                    owner_id = %key.owner_id,
                    sender_id = %key.sender_id,
                    attempt,
                    discarded = generated.len(),
                    "new messages arrived during generation, restarting cycle"
                );
                tokio::time::sleep(self.settings.restart_delay).await;
                attempt += 1;
                continue;
            }
            drop(guard);

            // Still Processing while sending, so no second driver can start.
            self.deliver(&key, &generated).await;

            let mut guard = state.lock().await;
            if guard.last_arrival == cycle.baseline {
                guard.phase = DispatchPhase::Idle;
                return;
            }
            guard.phase = DispatchPhase::Restarting;
            drop(guard);
            info!(
                owner_id = %key.owner_id,
                sender_id = %key.sender_id,
                "new messages arrived during delivery, scheduling another cycle"
            );
            tokio::time::sleep(self.settings.batch_window).await;
            attempt = 1;
        }
    }

    /// Enters `Processing` and captures the staleness baseline.
    async fn begin_cycle(&self, key: &SenderKey, state: &Mutex<DispatchState>) -> Option<Cycle> {
        let mut guard = state.lock().await;
        if guard.phase == DispatchPhase::Processing {
            warn!(
                owner_id = %key.owner_id,
                sender_id = %key.sender_id,
                "cycle already processing, skipping"
            );
            return None;
        }
        guard.phase = DispatchPhase::Processing;
        Some(Cycle {
            baseline: guard.last_arrival,
        })
    }

    /// Reconcile, generate, persist. Never fails: errors mean no output.
    async fn run_cycle(&self, key: &SenderKey, attempt: u32) -> Vec<ConversationMessage> {
        let history = match self.reconciler.reconcile(key).await {
            Ok(history) => history,
            Err(e) => {
                error!(
                    owner_id = %key.owner_id,
                    sender_id = %key.sender_id,
                    error = %e,
                    "failed to read history, skipping generation"
                );
                return Vec::new();
            }
        };

        debug!(
            sender_id = %key.sender_id,
            attempt,
            history_len = history.len(),
            "generating response"
        );
        let generated = match self.generator.generate(key, &history).await {
            Ok(messages) => messages
                .into_iter()
                .filter(|m| !m.is_empty())
                .collect::<Vec<_>>(),
            Err(e) => {
                error!(
                    owner_id = %key.owner_id,
                    sender_id = %key.sender_id,
                    attempt,
                    error = %e,
                    "response generation failed"
                );
                return Vec::new();
            }
        };

        if !generated.is_empty() {
            if let Err(e) = self.store.append(key, &generated).await {
                error!(
                    owner_id = %key.owner_id,
                    sender_id = %key.sender_id,
                    count = generated.len(),
                    error = %e,
                    "failed to persist generated messages"
                );
            }
        }
        generated
    }

    async fn deliver(&self, key: &SenderKey, generated: &[ConversationMessage]) {
        for text in deliverable_texts(generated) {
            if let Err(e) = self.platform.send_text(key, &text).await {
                error!(
                    owner_id = %key.owner_id,
                    sender_id = %key.sender_id,
                    error = %e,
                    "failed to deliver response"
                );
                return;
            }
        }
    }
}

/// Texts to send for a batch of generated messages.
///
/// One unit per assistant message with non-empty text, in order. Tool calls,
/// tool results and images are not delivered.
pub fn deliverable_texts(generated: &[ConversationMessage]) -> Vec<String> {
    generated
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .map(ConversationMessage::text)
        .filter(|text| !text.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::ContentBlock;
    use parley_test_utils::fixtures::alternating_remote;
    use parley_test_utils::mock_generator::MockReply;
    use parley_test_utils::{MemoryStore, MockGenerator, MockPlatform};

    const WINDOW: Duration = Duration::from_secs(5);
    const GENERATION: Duration = Duration::from_secs(3);

    struct Fixture {
        store: MemoryStore,
        platform: MockPlatform,
        generator: MockGenerator,
        engine: DispatchEngine,
    }

    fn fixture(generation_time: Duration) -> Fixture {
        fixture_with(MockPlatform::new(), generation_time)
    }

    fn fixture_with(platform: MockPlatform, generation_time: Duration) -> Fixture {
        let store = MemoryStore::new();
        let generator = MockGenerator::new().with_delay(generation_time);
        let engine = DispatchEngine::new(
            Arc::new(store.clone()),
            Arc::new(platform.clone()),
            Arc::new(generator.clone()),
            DispatchSettings {
                batch_window: WINDOW,
                restart_delay: Duration::from_millis(100),
                short_history_threshold: 4,
            },
        );
        Fixture {
            store,
            platform,
            generator,
            engine,
        }
    }

    fn key() -> SenderKey {
        SenderKey::new("biz", "user")
    }

    async fn sleep_secs(secs: f64) {
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }

    fn user_texts(history: &[ConversationMessage]) -> Vec<String> {
        history
            .iter()
            .filter(|m| m.role == Role::User)
            .map(ConversationMessage::text)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_is_coalesced_into_one_cycle() {
        let f = fixture(GENERATION);
        f.generator.push_text("X costs $40").await;

        let first = f
            .engine
            .submit(&key(), ConversationMessage::user_text("hi"))
            .await
            .unwrap();
        assert_eq!(first, Submission::Scheduled);
        sleep_secs(1.0).await;
        let second = f
            .engine
            .submit(&key(), ConversationMessage::user_text("how much is X"))
            .await
            .unwrap();
        assert_eq!(second, Submission::Absorbed(DispatchPhase::Scheduled));

        sleep_secs(10.0).await;

        let calls = f.generator.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(user_texts(&calls[0].1), vec!["hi", "how much is X"]);
        assert_eq!(f.platform.sent_to(&key()).await, vec!["X costs $40"]);
        assert_eq!(f.engine.phase(&key()).await, Some(DispatchPhase::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn window_is_not_extended_by_later_events() {
        let f = fixture(Duration::ZERO);
        f.engine
            .submit(&key(), ConversationMessage::user_text("a"))
            .await
            .unwrap();
        sleep_secs(4.5).await;
        f.engine
            .submit(&key(), ConversationMessage::user_text("b"))
            .await
            .unwrap();
        sleep_secs(0.6).await;

        assert_eq!(f.generator.call_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_output_is_discarded_and_cycle_restarts() {
        let f = fixture(GENERATION);
        f.generator.push_text("Hello! How can I help?").await;
        f.generator.push_text("No problem, talk soon").await;

        f.engine
            .submit(&key(), ConversationMessage::user_text("hi"))
            .await
            .unwrap();
        // Generation runs from t=5s to t=8s.
        sleep_secs(6.0).await;
        assert_eq!(
            f.engine.phase(&key()).await,
            Some(DispatchPhase::Processing)
        );
        let absorbed = f
            .engine
            .submit(&key(), ConversationMessage::user_text("actually nevermind"))
            .await
            .unwrap();
        assert_eq!(absorbed, Submission::Absorbed(DispatchPhase::Processing));

        sleep_secs(10.0).await;

        let calls = f.generator.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(
            user_texts(&calls[1].1),
            vec!["hi", "actually nevermind"]
        );
        assert_eq!(
            f.platform.sent_to(&key()).await,
            vec!["No problem, talk soon"]
        );
        // The stale reply is still part of the stored conversation.
        let stored: Vec<_> = f
            .store
            .history(&key())
            .await
            .iter()
            .map(ConversationMessage::text)
            .collect();
        assert!(stored.contains(&"Hello! How can I help?".to_string()));
        assert_eq!(f.generator.max_in_flight(&key()).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_skips_a_new_batch_window() {
        let f = fixture(GENERATION);
        f.engine
            .submit(&key(), ConversationMessage::user_text("a"))
            .await
            .unwrap();
        sleep_secs(6.0).await;
        f.engine
            .submit(&key(), ConversationMessage::user_text("b"))
            .await
            .unwrap();
        // First generation ends at 8s, restart at 8.1s, second ends at 11.1s.
        sleep_secs(5.2).await;
        assert_eq!(f.generator.call_count().await, 2);
        assert_eq!(f.platform.sent_to(&key()).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn at_most_one_generation_in_flight_per_sender() {
        let f = fixture(Duration::from_secs(4));
        for i in 0..12 {
            f.engine
                .submit(&key(), ConversationMessage::user_text(format!("m{i}")))
                .await
                .unwrap();
            sleep_secs(1.5).await;
        }
        sleep_secs(30.0).await;

        assert_eq!(f.generator.max_in_flight(&key()).await, 1);
        assert_eq!(f.engine.phase(&key()).await, Some(DispatchPhase::Idle));
        // Only the final, fresh cycle delivers.
        assert_eq!(f.platform.sent_to(&key()).await.len(), 1);
        let last_call = f.generator.calls().await.pop().unwrap();
        assert_eq!(user_texts(&last_call.1).len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_submissions_schedule_one_cycle() {
        const N: usize = 16;
        let f = fixture(GENERATION);
        f.generator.push_text("Got all of them").await;

        let mut submissions = tokio::task::JoinSet::new();
        for i in 0..N {
            let engine = f.engine.clone();
            submissions.spawn(async move {
                engine
                    .submit(&key(), ConversationMessage::user_text(format!("m{i}")))
                    .await
            });
        }
        let mut outcomes = Vec::new();
        while let Some(joined) = submissions.join_next().await {
            outcomes.push(joined.unwrap().unwrap());
        }

        let scheduled = outcomes
            .iter()
            .filter(|o| **o == Submission::Scheduled)
            .count();
        assert_eq!(scheduled, 1);
        assert_eq!(f.engine.active_cycles(), 1);

        sleep_secs(10.0).await;

        let calls = f.generator.calls().await;
        assert_eq!(calls.len(), 1);
        let mut seen = user_texts(&calls[0].1);
        seen.sort();
        let mut expected: Vec<String> = (0..N).map(|i| format!("m{i}")).collect();
        expected.sort();
        assert_eq!(seen, expected);
        assert_eq!(f.generator.max_in_flight(&key()).await, 1);
        assert_eq!(f.platform.sent_to(&key()).await, vec!["Got all of them"]);
    }

    #[tokio::test(start_paused = true)]
    async fn event_during_delivery_waits_for_delivery_to_finish() {
        let platform = MockPlatform::new().with_send_delay(Duration::from_secs(2));
        let f = fixture_with(platform, Duration::ZERO);
        f.generator
            .push(MockReply::Messages(vec![
                ConversationMessage::assistant_text("Hello!"),
                ConversationMessage::assistant_text("How can I help?"),
            ]))
            .await;
        f.generator.push_text("You're welcome").await;

        f.engine
            .submit(&key(), ConversationMessage::user_text("hi"))
            .await
            .unwrap();
        // Delivery runs from t=5s to t=9s.
        sleep_secs(6.0).await;
        assert_eq!(
            f.engine.phase(&key()).await,
            Some(DispatchPhase::Processing)
        );
        let during = f
            .engine
            .submit(&key(), ConversationMessage::user_text("thanks"))
            .await
            .unwrap();
        assert_eq!(during, Submission::Absorbed(DispatchPhase::Processing));
        assert_eq!(f.engine.active_cycles(), 1);

        sleep_secs(15.0).await;

        assert_eq!(
            f.platform.sent_to(&key()).await,
            vec!["Hello!", "How can I help?", "You're welcome"]
        );
        let calls = f.generator.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(user_texts(&calls[1].1), vec!["hi", "thanks"]);
        assert_eq!(f.engine.phase(&key()).await, Some(DispatchPhase::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn blank_generated_messages_are_dropped() {
        let f = fixture(Duration::ZERO);
        f.generator
            .push(MockReply::Messages(vec![
                ConversationMessage::assistant_text("  "),
                ConversationMessage::assistant_text("Here you go"),
            ]))
            .await;

        f.engine
            .submit(&key(), ConversationMessage::user_text("hi"))
            .await
            .unwrap();
        sleep_secs(6.0).await;

        let stored: Vec<_> = f
            .store
            .history(&key())
            .await
            .iter()
            .map(ConversationMessage::text)
            .collect();
        assert_eq!(stored, vec!["hi", "Here you go"]);
    }

    #[tokio::test(start_paused = true)]
    async fn senders_are_processed_in_parallel() {
        let f = fixture(GENERATION);
        let other = SenderKey::new("biz", "other");
        f.engine
            .submit(&key(), ConversationMessage::user_text("a"))
            .await
            .unwrap();
        f.engine
            .submit(&other, ConversationMessage::user_text("b"))
            .await
            .unwrap();
        sleep_secs(8.5).await;

        assert_eq!(f.platform.sent_to(&key()).await.len(), 1);
        assert_eq!(f.platform.sent_to(&other).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn generation_failure_delivers_nothing_and_sender_stays_eligible() {
        let f = fixture(Duration::ZERO);
        f.generator.push_error("model overloaded").await;
        f.generator.push_text("second try").await;

        f.engine
            .submit(&key(), ConversationMessage::user_text("hi"))
            .await
            .unwrap();
        sleep_secs(6.0).await;
        assert!(f.platform.sent().await.is_empty());
        assert_eq!(f.engine.phase(&key()).await, Some(DispatchPhase::Idle));

        let next = f
            .engine
            .submit(&key(), ConversationMessage::user_text("hello?"))
            .await
            .unwrap();
        assert_eq!(next, Submission::Scheduled);
        sleep_secs(6.0).await;
        assert_eq!(f.platform.sent_to(&key()).await, vec!["second try"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_failure_keeps_generated_messages() {
        let f = fixture(Duration::ZERO);
        f.platform.fail_send(true);
        f.generator.push_text("unsent").await;

        f.engine
            .submit(&key(), ConversationMessage::user_text("hi"))
            .await
            .unwrap();
        sleep_secs(6.0).await;

        let history = f.store.history(&key()).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].text(), "unsent");
        assert_eq!(f.engine.phase(&key()).await, Some(DispatchPhase::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn short_history_is_reconciled_before_generation() {
        let f = fixture(Duration::ZERO);
        f.platform
            .set_remote_history(&key(), alternating_remote("biz", "user", 5))
            .await;

        f.engine
            .submit(&key(), ConversationMessage::user_text("remote message 4"))
            .await
            .unwrap();
        sleep_secs(6.0).await;

        let calls = f.generator.calls().await;
        assert_eq!(calls[0].1.len(), 5);
        assert_eq!(f.store.overwrite_count(), 1);
        // Remote 5 plus the generated reply.
        assert_eq!(f.store.history(&key()).await.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn tool_messages_are_stored_but_not_delivered() {
        let f = fixture(Duration::ZERO);
        f.generator
            .push(MockReply::Messages(vec![
                ConversationMessage::new(
                    Role::Assistant,
                    vec![ContentBlock::ToolCall {
                        name: "get_information".into(),
                        args: serde_json::json!({"info": "services"}),
                    }],
                ),
                ConversationMessage::new(
                    Role::Tool,
                    vec![ContentBlock::ToolResult {
                        name: "get_information".into(),
                        content: "We offer lash lifts".into(),
                    }],
                ),
                ConversationMessage::assistant_text("We offer lash lifts!"),
                ConversationMessage::assistant_text("Want to book?"),
            ]))
            .await;

        f.engine
            .submit(&key(), ConversationMessage::user_text("services?"))
            .await
            .unwrap();
        sleep_secs(6.0).await;

        assert_eq!(
            f.platform.sent_to(&key()).await,
            vec!["We offer lash lifts!", "Want to book?"]
        );
        assert_eq!(f.store.history(&key()).await.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_persist_rejects_submission() {
        let f = fixture(Duration::ZERO);
        f.store.fail_writes(true);
        let result = f
            .engine
            .submit(&key(), ConversationMessage::user_text("hi"))
            .await;
        assert!(result.is_err());
        assert_eq!(f.engine.phase(&key()).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_in_flight_cycles() {
        let f = fixture(GENERATION);
        f.engine
            .submit(&key(), ConversationMessage::user_text("hi"))
            .await
            .unwrap();
        assert_eq!(f.engine.active_cycles(), 1);
        assert!(f.engine.drain(Duration::from_secs(30)).await);
        assert_eq!(f.engine.active_cycles(), 0);
        assert_eq!(f.platform.sent_to(&key()).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_times_out() {
        let f = fixture(Duration::from_secs(60));
        f.engine
            .submit(&key(), ConversationMessage::user_text("hi"))
            .await
            .unwrap();
        assert!(!f.engine.drain(Duration::from_secs(10)).await);
    }

    #[test]
    fn deliverable_texts_keep_assistant_text_only() {
        let generated = vec![
            ConversationMessage::user_text("echo"),
            ConversationMessage::assistant_text("one"),
            ConversationMessage::assistant_text("   "),
            ConversationMessage::new(
                Role::Assistant,
                vec![ContentBlock::text("two "), ContentBlock::text("parts")],
            ),
        ];
        assert_eq!(deliverable_texts(&generated), vec!["one", "two parts"]);
    }

    #[test]
    fn phase_display_is_lowercase() {
        assert_eq!(DispatchPhase::Restarting.to_string(), "restarting");
    }
}
