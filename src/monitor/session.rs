//! Monitoring session: the tick loop, its state, and alert wiring
//!
//! All session state sits behind one mutex. A tick publishes its reading
//! and events while holding it, so nothing from a tick can land after
//! `disconnect` has reset the session. Alert results are checked against
//! the session that requested them before they are stored or announced.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::alert::{AlertError, AlertGenerator, AlertMessage, AlertTrigger};
use crate::config::MonitorConfig;
use crate::storage::StorageBackend;
use crate::types::vitals::{VitalsChannel, VitalsReading, VitalsSample};

use super::detector::{Finding, Thresholds};
use super::history::VitalsHistory;
use super::report::SessionReport;
use super::simulator::TelemetrySimulator;

/// Everything observers can learn about a session
#[derive(Clone, Debug)]
pub enum MonitorEvent {
    Connected { session_id: Uuid },
    Reading(VitalsSample),
    CriticalDetected { sample: VitalsSample, findings: Vec<Finding> },
    AlertReady(AlertMessage),
    AlertFailed {
        trigger: AlertTrigger,
        /// Underlying error, for logs
        error: String,
        /// Static localized text for display
        message: String,
    },
    Disconnected { session_id: Uuid },
}

struct SessionState {
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    history: VitalsHistory,
    alert: Option<AlertMessage>,
    ticker: Option<JoinHandle<()>>,
    alert_task: Option<JoinHandle<()>>,
}

struct SessionInner {
    tick_interval: Duration,
    thresholds: Thresholds,
    simulator: Mutex<TelemetrySimulator>,
    state: Mutex<SessionState>,
    readings: VitalsChannel,
    alerts: AlertGenerator,
    events: broadcast::Sender<MonitorEvent>,
    storage: Option<Arc<dyn StorageBackend + Send + Sync>>,
}

/// A simulated vitals monitor.
///
/// Cheap to clone; clones share the same session. `connect` and
/// `trigger_alert` must run inside a tokio runtime.
#[derive(Clone)]
pub struct MonitorSession {
    inner: Arc<SessionInner>,
}

impl MonitorSession {
    pub fn new(
        config: &MonitorConfig,
        alerts: AlertGenerator,
        storage: Option<Arc<dyn StorageBackend + Send + Sync>>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let inner = SessionInner {
            tick_interval: config.tick_interval(),
            thresholds: config.thresholds,
            simulator: Mutex::new(TelemetrySimulator::new(&config.simulator)),
            state: Mutex::new(SessionState {
                session_id: None,
                started_at: None,
                history: VitalsHistory::new(config.history_capacity),
                alert: None,
                ticker: None,
                alert_task: None,
            }),
            readings: VitalsChannel::new(VitalsReading::placeholder()),
            alerts: alerts.with_thresholds(config.thresholds),
            events,
            storage,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Start producing readings. Returns the session id; a no-op when
    /// already connected.
    pub fn connect(&self) -> Uuid {
        let mut state = self.inner.state();
        if let Some(id) = state.session_id {
            return id;
        }

        let session_id = Uuid::new_v4();
        state.session_id = Some(session_id);
        state.started_at = Some(Utc::now());

        let weak = Arc::downgrade(&self.inner);
        state.ticker = Some(tokio::spawn(run_ticker(weak, self.inner.tick_interval, session_id)));

        info!(
            "Monitoring session {} connected, tick every {:?}",
            session_id, self.inner.tick_interval
        );
        self.inner.emit(MonitorEvent::Connected { session_id });
        session_id
    }

    /// Stop the timer and reset all session state.
    ///
    /// Returns the report of the session that ended, or None when not
    /// connected. The report is exported when a storage backend is set.
    pub fn disconnect(&self) -> Option<SessionReport> {
        let inner = &self.inner;
        let report = {
            let mut state = inner.state();
            let session_id = state.session_id.take()?;
            let report = SessionReport {
                session_id,
                started_at: state.started_at.take().unwrap_or_else(Utc::now),
                ended_at: Utc::now(),
                samples: state.history.snapshot(),
                alert: state.alert.take(),
            };
            state.history.clear();
            inner.alerts.reset();
            for task in [state.ticker.take(), state.alert_task.take()].into_iter().flatten() {
                task.abort();
            }
            inner.readings.update(VitalsReading::placeholder());

            info!(
                "Monitoring session {} disconnected after {} samples",
                session_id,
                report.samples.len()
            );
            inner.emit(MonitorEvent::Disconnected { session_id });
            report
        };

        if let Some(storage) = &inner.storage {
            match report.export(storage.as_ref()) {
                Ok(()) => info!("Exported report for session {}", report.session_id),
                Err(e) => warn!("Failed to export session {}: {}", report.session_id, e),
            }
        }
        Some(report)
    }

    /// Generate an alert for the latest reading on demand.
    ///
    /// Honours the in-flight guard but not the once-per-session limit. A
    /// result that arrives after the session ended is returned to the
    /// caller but neither stored nor announced.
    pub async fn trigger_alert(&self) -> Result<AlertMessage, AlertError> {
        let reading = self.current_reading();
        self.inner.run_alert(AlertTrigger::Manual, reading).await
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state().session_id.is_some()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.inner.state().session_id
    }

    /// Latest reading, or the placeholder before the first tick
    pub fn current_reading(&self) -> VitalsReading {
        self.inner.readings.get_value()
    }

    /// Samples of the current session, oldest first
    pub fn history(&self) -> Vec<VitalsSample> {
        self.inner.state().history.snapshot()
    }

    pub fn history_capacity(&self) -> usize {
        self.inner.state().history.capacity()
    }

    /// The alert generated during this session, if any
    pub fn alert_message(&self) -> Option<AlertMessage> {
        self.inner.state().alert.clone()
    }

    pub fn is_alert_in_flight(&self) -> bool {
        self.inner.alerts.is_in_flight()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.inner.thresholds
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.events.subscribe()
    }

    /// Channel holding the latest reading
    pub fn readings(&self) -> &VitalsChannel {
        &self.inner.readings
    }
}

async fn run_ticker(session: Weak<SessionInner>, period: Duration, session_id: Uuid) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match session.upgrade() {
            Some(inner) => inner.tick(session_id),
            None => break,
        }
    }
}

impl SessionInner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: MonitorEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn tick(self: &Arc<Self>, session_id: Uuid) {
        let sample = self
            .simulator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_sample();
        let findings = self.thresholds.findings(&sample.reading);
        let reading = sample.reading;

        let claimed = {
            let mut state = self.state();
            if state.session_id != Some(session_id) {
                return;
            }
            state.history.push(sample.clone());
            self.readings.update(reading);
            self.emit(MonitorEvent::Reading(sample.clone()));

            if findings.is_empty() {
                return;
            }
            let claimed = self.alerts.claim_auto();
            self.emit(MonitorEvent::CriticalDetected { sample, findings });
            claimed
        };

        if !claimed {
            debug!("Critical vitals in session {}: {}", session_id, reading);
            return;
        }
        warn!("Critical vitals in session {}: {}", session_id, reading);

        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            let _ = inner.run_alert(AlertTrigger::Automatic, reading).await;
        });
        let mut state = self.state();
        if state.session_id == Some(session_id) {
            state.alert_task = Some(task);
        } else {
            task.abort();
        }
    }

    async fn run_alert(
        &self,
        trigger: AlertTrigger,
        reading: VitalsReading,
    ) -> Result<AlertMessage, AlertError> {
        let session_id = self.state().session_id;
        let result = self.alerts.generate(trigger, reading).await;

        let mut state = self.state();
        let current = session_id.is_some() && state.session_id == session_id;
        match &result {
            Ok(message) if current => {
                state.alert = Some(message.clone());
                self.alerts.mark_sent();
                self.emit(MonitorEvent::AlertReady(message.clone()));
            }
            Ok(message) => {
                debug!("Discarding {:?} alert {} from an ended session", trigger, message.id);
            }
            Err(error) => {
                warn!("{:?} alert failed: {}", trigger, error);
                if current {
                    self.emit(MonitorEvent::AlertFailed {
                        trigger,
                        error: error.to_string(),
                        message: self.alerts.failure_text(error).to_string(),
                    });
                }
            }
        }
        result
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in [state.ticker.take(), state.alert_task.take()].into_iter().flatten() {
            task.abort();
        }
    }
}
