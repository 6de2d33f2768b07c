//! Alert pipeline: one generation at a time, delivered to every notifier

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::monitor::detector::{Finding, Thresholds};
use crate::types::vitals::VitalsReading;

use super::generator::{ChatCompletionsGenerator, TextGenerator};
use super::notifier::{LogNotifier, Notifier, WebhookNotifier};
use super::{compose_prompt, AlertConfig, AlertError, Language};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertTrigger {
    /// First critical reading of a session
    Automatic,
    /// Requested by the user
    Manual,
}

/// A generated emergency message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub id: Uuid,
    pub trigger: AlertTrigger,
    pub text: String,
    pub reading: VitalsReading,
    pub findings: Vec<Finding>,
    pub created_at: DateTime<Utc>,
}

/// Releases the in-flight flag when generation ends, including when the
/// generating task is cancelled.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Turns a reading into an emergency message, at most one at a time.
///
/// Two flags guard it:
/// - `in_flight` rejects a request while another generation is running
/// - `sent` records that the current session already has its alert; it is
///   set by [`AlertGenerator::claim_auto`] or [`AlertGenerator::mark_sent`]
///   and cleared by [`AlertGenerator::reset`]. The owner of the session
///   sets it, since only the owner knows whether a finished generation
///   still belongs to the current session.
pub struct AlertGenerator {
    generator: Arc<dyn TextGenerator>,
    notifiers: Vec<Arc<dyn Notifier>>,
    language: Language,
    thresholds: Thresholds,
    in_flight: AtomicBool,
    sent: AtomicBool,
}

impl AlertGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, language: Language) -> Self {
        Self {
            generator,
            notifiers: Vec::new(),
            language,
            thresholds: Thresholds::default(),
            in_flight: AtomicBool::new(false),
            sent: AtomicBool::new(false),
        }
    }

    /// Build the HTTP generator and notifiers described by the config
    pub fn from_config(config: &AlertConfig, thresholds: Thresholds) -> Result<Self, AlertError> {
        let generator = ChatCompletionsGenerator::new(config)?;
        let mut alerts = Self::new(Arc::new(generator), config.language).with_thresholds(thresholds);

        if config.notifications {
            alerts = alerts.with_notifier(LogNotifier);
        }
        if let Some(url) = &config.webhook_url {
            let webhook = WebhookNotifier::new(url.clone(), Duration::from_millis(config.timeout_ms))?;
            alerts = alerts.with_notifier(webhook);
        }
        Ok(alerts)
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifiers.push(Arc::new(notifier));
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_sent(&self) -> bool {
        self.sent.load(Ordering::Acquire)
    }

    /// Claim the automatic alert of the current session.
    /// Returns false if it was already claimed.
    pub fn claim_auto(&self) -> bool {
        !self.sent.swap(true, Ordering::AcqRel)
    }

    /// Record that the current session has an alert
    pub fn mark_sent(&self) {
        self.sent.store(true, Ordering::Release);
    }

    /// Forget the automatic alert so the next session can raise its own
    pub fn reset(&self) {
        self.sent.store(false, Ordering::Release);
    }

    /// Generate an alert for the reading and deliver it to every notifier.
    ///
    /// Fails with [`AlertError::InFlight`] while another generation runs.
    /// Nothing is retried; map failures for display with
    /// [`AlertGenerator::failure_text`].
    pub async fn generate(
        &self,
        trigger: AlertTrigger,
        reading: VitalsReading,
    ) -> Result<AlertMessage, AlertError> {
        if reading.is_placeholder() {
            return Err(AlertError::NoReading);
        }
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(AlertError::InFlight)?;

        let findings = self.thresholds.findings(&reading);
        let prompt = compose_prompt(&reading, &findings, self.language);
        let text = self.generator.generate(&prompt).await?;

        let message = AlertMessage {
            id: Uuid::new_v4(),
            trigger,
            text,
            reading,
            findings,
            created_at: Utc::now(),
        };
        info!(
            "{:?} alert {} generated by {}",
            trigger,
            message.id,
            self.generator.name()
        );

        let title = self.language.notification_title();
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(title, &message).await {
                warn!("Failed to deliver alert {}: {}", message.id, e);
            }
        }

        Ok(message)
    }

    /// Static localized text to show in place of a failed alert
    pub fn failure_text(&self, error: &AlertError) -> &'static str {
        match error {
            AlertError::InFlight => self.language.alert_in_progress(),
            AlertError::NoReading => self.language.no_reading(),
            _ => self.language.generation_failed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct FixedGenerator {
        reply: Result<&'static str, ()>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedGenerator {
        fn ok(text: &'static str) -> Self {
            Self { reply: Ok(text), calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { reply: Err(()), calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, AlertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .map(str::to_string)
                .map_err(|_| AlertError::Transport("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct GatedGenerator {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl TextGenerator for GatedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, AlertError> {
            self.gate.notified().await;
            Ok("done".to_string())
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    struct RecordingNotifier {
        titles: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, title: &str, _alert: &AlertMessage) -> Result<(), AlertError> {
            self.titles.lock().unwrap().push(title.to_string());
            Ok(())
        }
    }

    struct BrokenNotifier;

    #[async_trait]
    impl Notifier for BrokenNotifier {
        async fn notify(&self, _title: &str, _alert: &AlertMessage) -> Result<(), AlertError> {
            Err(AlertError::Notification("no display".to_string()))
        }
    }

    fn critical() -> VitalsReading {
        VitalsReading::new(145, 120, 80, 97)
    }

    #[tokio::test]
    async fn generates_message_and_notifies() {
        let generator = Arc::new(FixedGenerator::ok("Call for help."));
        let titles = Arc::new(Mutex::new(Vec::new()));
        let alerts = AlertGenerator::new(generator.clone(), Language::Fr)
            .with_notifier(BrokenNotifier)
            .with_notifier(RecordingNotifier { titles: titles.clone() });

        let message = alerts.generate(AlertTrigger::Automatic, critical()).await.unwrap();

        assert_eq!(message.text, "Call for help.");
        assert_eq!(message.findings, vec![Finding::HighHeartRate(145)]);
        assert_eq!(message.trigger, AlertTrigger::Automatic);
        // Left to the session
        assert!(!alerts.is_sent());
        assert!(!alerts.is_in_flight());
        // A failing notifier does not stop the others
        assert_eq!(*titles.lock().unwrap(), vec![Language::Fr.notification_title().to_string()]);
        assert!(generator.prompts.lock().unwrap()[0].contains("Answer in French"));
    }

    #[tokio::test]
    async fn failure_maps_to_localized_text_without_retry() {
        let generator = Arc::new(FixedGenerator::failing());
        let alerts = AlertGenerator::new(generator.clone(), Language::Es);

        let err = alerts.generate(AlertTrigger::Manual, critical()).await.unwrap_err();

        assert!(matches!(err, AlertError::Transport(_)));
        assert_eq!(alerts.failure_text(&err), Language::Es.generation_failed());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert!(!alerts.is_in_flight());
        assert!(!alerts.is_sent());
    }

    #[tokio::test]
    async fn concurrent_generation_is_rejected() {
        let gate = Arc::new(Notify::new());
        let alerts = Arc::new(AlertGenerator::new(
            Arc::new(GatedGenerator { gate: gate.clone() }),
            Language::En,
        ));

        let first = {
            let alerts = alerts.clone();
            tokio::spawn(async move { alerts.generate(AlertTrigger::Manual, critical()).await })
        };
        while !alerts.is_in_flight() {
            tokio::task::yield_now().await;
        }

        let second = alerts.generate(AlertTrigger::Manual, critical()).await;
        let err = second.unwrap_err();
        assert!(matches!(err, AlertError::InFlight));
        assert_eq!(alerts.failure_text(&err), Language::En.alert_in_progress());

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap().text, "done");
        assert!(!alerts.is_in_flight());
    }

    #[tokio::test]
    async fn cancelled_generation_releases_flag() {
        let alerts = Arc::new(AlertGenerator::new(
            Arc::new(GatedGenerator { gate: Arc::new(Notify::new()) }),
            Language::En,
        ));

        let task = {
            let alerts = alerts.clone();
            tokio::spawn(async move { alerts.generate(AlertTrigger::Manual, critical()).await })
        };
        while !alerts.is_in_flight() {
            tokio::task::yield_now().await;
        }

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!alerts.is_in_flight());
    }

    #[tokio::test]
    async fn placeholder_reading_is_refused() {
        let generator = Arc::new(FixedGenerator::ok("unused"));
        let alerts = AlertGenerator::new(generator.clone(), Language::De);

        let err = alerts
            .generate(AlertTrigger::Manual, VitalsReading::placeholder())
            .await
            .unwrap_err();
        assert!(matches!(err, AlertError::NoReading));
        assert_eq!(alerts.failure_text(&err), Language::De.no_reading());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn auto_claim_is_one_shot_until_reset() {
        let alerts = AlertGenerator::new(Arc::new(FixedGenerator::ok("x")), Language::En);
        assert!(alerts.claim_auto());
        assert!(!alerts.claim_auto());
        alerts.reset();
        assert!(alerts.claim_auto());
    }

    #[test]
    fn marked_alert_blocks_auto_claim() {
        let alerts = AlertGenerator::new(Arc::new(FixedGenerator::ok("x")), Language::En);
        alerts.mark_sent();
        assert!(alerts.is_sent());
        assert!(!alerts.claim_auto());
        alerts.reset();
        assert!(!alerts.is_sent());
    }
}
