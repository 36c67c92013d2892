use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pt_breaker::CircuitBreaker;
use pt_compliance::{ComplianceMatrix, Config, EnsembleMethod};
use pt_detect::{EnsembleVoter, Strategy};
use pt_dispatch::{DetectionEvent, StateDispatcher};
use pt_eventbus::EventBus;
use pt_persist::{BreakerAdapter, InMemoryAdapter, PersistenceAdapter};
use pt_recognise::PotRecogniser;
use pt_recorder::{HandHistory, HandRecorder};
use pt_telemetry::Telemetry;

/// Everything the frame loop needs for one table, built once at startup
/// from [`Config`].
pub struct App {
    pub config: Config,
    pub site: String,
    pub compliance: ComplianceMatrix,
    pub bus: Arc<EventBus<DetectionEvent>>,
    pub dispatcher: StateDispatcher,
    pub recorder: HandRecorder,
    pub voter: Arc<EnsembleVoter>,
    pub pot_recogniser: PotRecogniser,
    pub strategies: Vec<Arc<dyn Strategy>>,
    pub telemetry: Arc<Telemetry>,
    pub persistence: Arc<dyn PersistenceAdapter>,
    pub shutdown: Arc<AtomicBool>,
}

impl App {
    pub fn new(site: String, table: String, config: Config, strategies: Vec<Arc<dyn Strategy>>) -> Self {
        let bus = Arc::new(EventBus::new());
        let compliance = ComplianceMatrix::new(config.compliance.clone());
        let dispatcher = StateDispatcher::new(site.clone(), table.clone(), bus.clone())
            .with_stale_seconds(config.dispatcher.stale_ms as f64 / 1000.0);
        let recorder = HandRecorder::new(site.clone(), table);
        let voter = Arc::new(EnsembleVoter::new(config.ensemble.learning_rate));
        let breaker = CircuitBreaker::new(config.breaker.failure_threshold, Duration::from_secs(config.breaker.timeout_s), 1);
        let persistence: Arc<dyn PersistenceAdapter> = Arc::new(BreakerAdapter::with_breaker(InMemoryAdapter::new(), breaker));
        let profile_dir = config.telemetry.profile_dir.clone().map(PathBuf::from);
        let telemetry = Arc::new(Telemetry::new(Duration::from_millis(config.telemetry.slow_op_ms), profile_dir));

        Self {
            config,
            site,
            compliance,
            bus,
            dispatcher,
            recorder,
            voter,
            pot_recogniser: PotRecogniser::new(),
            strategies,
            telemetry,
            persistence,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the recorder may run at all for this table. Checked before `recorder.observe`
    /// runs, not just before the finished hand is persisted.
    pub fn recording_enabled(&self) -> bool {
        self.config.recorder.enabled && self.compliance.recording_allowed(&self.site)
    }

    pub fn ensemble_method(&self) -> pt_detect::ResolutionMethod {
        match self.config.ensemble.method {
            EnsembleMethod::WeightedVote => pt_detect::ResolutionMethod::WeightedVote,
            EnsembleMethod::HighestConfidence => pt_detect::ResolutionMethod::HighestConfidence,
            EnsembleMethod::Majority => pt_detect::ResolutionMethod::Majority,
            EnsembleMethod::Average => pt_detect::ResolutionMethod::WeightedAverage,
        }
    }

    /// Installs a ctrl-c handler that sets the shutdown flag rather than
    /// exiting immediately, so the frame loop can honour its grace window
    /// before forcible termination").
    pub fn install_shutdown_handler(&self) {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("shutdown requested, draining in-flight work");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    /// Hands a completed hand off to persistence on a background
    /// single-writer task so `save_hand` never blocks the frame loop.
    pub fn persist_hand(&self, history: HandHistory) {
        let persistence = self.persistence.clone();
        tokio::spawn(async move {
            if !persistence.save_hand(&history).await {
                log::error!("failed to persist hand {}", history.hand_id);
            }
        });
    }
}
