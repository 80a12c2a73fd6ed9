//! Application composition and the public runner surface.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use abyssrun_domain::{BotSettings, DomainError, GameState};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ports::{
    keys, ActuatorPort, MouseButton, ScreenCapturePort, TelemetryPort, VisionPort, WindowError,
    WindowPort,
};
use crate::infrastructure::replay::{
    Cassette, LoggingActuator, ReplayCapture, ReplayError, ReplaySession, ReplayTelemetry,
    ReplayVision, ReplayWindow,
};
use crate::infrastructure::sensing::SensingWorker;
use crate::infrastructure::snapshot_bus::SnapshotBus;
use crate::use_cases::{
    CurrentState, DecisionProbe, InputDriver, LoopControl, Navigator, Orchestrator, StateContext,
    StateDecider, Waiter,
};

const SENSING_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Invalid settings: {0}")]
    Settings(#[from] DomainError),
    #[error("Game window unavailable: {0}")]
    Window(#[from] WindowError),
    #[error("Replay unavailable: {0}")]
    Replay(#[from] ReplayError),
    #[error("No game adapters configured (set ABYSSRUN_REPLAY to replay a recording)")]
    NoAdapters,
    #[error("Runner is already running")]
    AlreadyRunning,
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// The external collaborators the bot drives.
#[derive(Clone)]
pub struct Ports {
    pub capture: Arc<dyn ScreenCapturePort>,
    pub vision: Arc<dyn VisionPort>,
    pub telemetry: Arc<dyn TelemetryPort>,
    pub actuator: Arc<dyn ActuatorPort>,
    pub window: Arc<dyn WindowPort>,
}

impl Ports {
    /// Adapters that play back `cassette` and only log synthetic input.
    pub fn replay(cassette: Cassette) -> Self {
        let session = ReplaySession::new(cassette);
        Self {
            window: Arc::new(ReplayWindow::new(&session)),
            capture: Arc::new(ReplayCapture::new(session.clone())),
            vision: Arc::new(ReplayVision::new(session.clone())),
            telemetry: Arc::new(ReplayTelemetry::new(session)),
            actuator: Arc::new(LoggingActuator),
        }
    }
}

/// Runs the bot: a sensing worker feeding the snapshot bus and the control
/// loop driving state handlers.
///
/// Every method takes `&self`; `stop`, `current_state` and
/// `force_exit_abyss` are safe to call from any thread while `run` is
/// blocking another.
pub struct AbyssRunner {
    settings: Arc<BotSettings>,
    replay_path: Option<PathBuf>,
    ports: OnceLock<Ports>,
    bus: SnapshotBus,
    state: CurrentState,
    control: LoopControl,
    shutdown: CancellationToken,
    sensing: Mutex<Option<JoinHandle<()>>>,
    running: Mutex<bool>,
}

impl AbyssRunner {
    /// A runner whose adapters are built by [`AbyssRunner::initialize`]
    /// from the configuration.
    pub fn new(config: AppConfig) -> Self {
        Self::build(config.settings, config.replay_path, OnceLock::new())
    }

    /// A runner driving the given adapters.
    pub fn with_ports(settings: BotSettings, ports: Ports) -> Self {
        Self::build(settings, None, OnceLock::from(ports))
    }

    fn build(settings: BotSettings, replay_path: Option<PathBuf>, ports: OnceLock<Ports>) -> Self {
        Self {
            settings: Arc::new(settings),
            replay_path,
            ports,
            bus: SnapshotBus::new(),
            state: CurrentState::new(GameState::MainMenu),
            control: LoopControl::default(),
            shutdown: CancellationToken::new(),
            sensing: Mutex::new(None),
            running: Mutex::new(false),
        }
    }

    /// Validate settings, build adapters and check the game window.
    ///
    /// The only fallible step of a run. Calling it again is a no-op once it
    /// has succeeded.
    pub fn initialize(&self) -> Result<(), RunnerError> {
        self.settings.validate()?;

        if self.ports.get().is_none() {
            let path = self.replay_path.as_ref().ok_or(RunnerError::NoAdapters)?;
            tracing::info!(path = %path.display(), "Loading replay cassette");
            let cassette = Cassette::load(path)?;
            tracing::info!(frames = cassette.frame_count(), "Replay cassette loaded");
            // A concurrent initialize may have won; either set of ports is fine.
            let _ = self.ports.set(Ports::replay(cassette));
        }
        let ports = self.ports()?;

        let size = ports.window.client_size()?;
        tracing::info!(width = size.width, height = size.height, "Game window found");
        if let Err(e) = ports.telemetry.player_position() {
            tracing::warn!(error = %e, "Telemetry not available yet");
        }
        Ok(())
    }

    /// Build a runtime and block on [`AbyssRunner::run_async`].
    pub fn run(&self) -> Result<(), RunnerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(RunnerError::Runtime)?;
        runtime.block_on(self.run_async())
    }

    /// Run until [`AbyssRunner::stop`] is called.
    pub async fn run_async(&self) -> Result<(), RunnerError> {
        {
            let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
            if *running {
                return Err(RunnerError::AlreadyRunning);
            }
            *running = true;
        }
        let result = self.run_inner().await;
        *self.running.lock().unwrap_or_else(PoisonError::into_inner) = false;
        result
    }

    async fn run_inner(&self) -> Result<(), RunnerError> {
        self.initialize()?;
        let ports = self.ports()?.clone();

        let worker = SensingWorker::new(
            ports.capture.clone(),
            ports.vision.clone(),
            self.bus.clone(),
            self.settings.vision.clone(),
        );
        *self.sensing.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(worker.spawn(self.shutdown.child_token()));

        let orchestrator = self.orchestrator(&ports);
        tracing::info!("Abyss runner started");
        orchestrator.run(self.shutdown.clone()).await;

        self.join_sensing().await;
        release_inputs(&ports);
        tracing::info!(state = %self.state.get(), "Abyss runner stopped");
        Ok(())
    }

    fn orchestrator(&self, ports: &Ports) -> Orchestrator {
        let input = InputDriver::new(ports.actuator.clone());
        let probe = DecisionProbe::new(
            StateDecider::new(&self.settings.battle),
            ports.telemetry.clone(),
            ports.window.clone(),
        );
        let ctx = StateContext {
            waiter: Waiter::new(self.bus.clone(), probe.clone(), self.state.clone(), input.clone()),
            navigator: Navigator::new(
                ports.telemetry.clone(),
                input.clone(),
                ports.window.clone(),
                self.settings.movement.clone(),
            ),
            input,
            telemetry: ports.telemetry.clone(),
            window: ports.window.clone(),
            settings: Arc::clone(&self.settings),
        };
        Orchestrator::new(ctx, self.bus.clone(), probe, self.state.clone(), self.control.clone())
    }

    async fn join_sensing(&self) {
        let handle = self.sensing.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(handle) = handle else {
            return;
        };
        match tokio::time::timeout(SENSING_JOIN_TIMEOUT, handle).await {
            Ok(Ok(())) => tracing::debug!("Sensing worker joined"),
            Ok(Err(e)) => tracing::error!(error = %e, "Sensing worker panicked"),
            Err(_) => tracing::warn!(
                timeout_secs = SENSING_JOIN_TIMEOUT.as_secs(),
                "Sensing worker did not stop in time"
            ),
        }
    }

    /// Request shutdown. Idempotent.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!("Stop requested");
            self.shutdown.cancel();
        }
    }

    pub fn current_state(&self) -> GameState {
        self.state.get()
    }

    /// Abandon the current run and leave the abyss.
    pub fn force_exit_abyss(&self) {
        tracing::info!(state = %self.state.get(), "Force exit requested");
        self.control.request_force_exit();
    }

    fn ports(&self) -> Result<&Ports, RunnerError> {
        self.ports.get().ok_or(RunnerError::NoAdapters)
    }
}

fn release_inputs(ports: &Ports) {
    let input = InputDriver::new(ports.actuator.clone());
    input.key_up(keys::FORWARD);
    input.key_up(keys::SPRINT);
    input.mouse_up(
        ports.window.client_size().unwrap_or_default().center(),
        MouseButton::Right,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{CapturedFrame, MockScreenCapturePort, MockVisionPort};
    use crate::test_fixtures::SimGame;
    use abyssrun_domain::{ScreenPoint, TextRegion, Vector3, VisionSnapshot};

    fn ports(game: &Arc<SimGame>, texts: Vec<(&'static str, i32, i32)>) -> Ports {
        let mut capture = MockScreenCapturePort::new();
        capture
            .expect_capture()
            .returning(|| Ok(Some(CapturedFrame::new(1, 1, Arc::from(vec![0u8; 4]), 0))));
        let mut vision = MockVisionPort::new();
        vision.expect_recognize().returning(move |_| {
            Ok(texts
                .iter()
                .map(|(t, x, y)| TextRegion::new(*t, 0.9, ScreenPoint::new(*x, *y)))
                .collect::<VisionSnapshot>())
        });
        Ports {
            capture: Arc::new(capture),
            vision: Arc::new(vision),
            telemetry: game.clone(),
            actuator: game.clone(),
            window: game.clone(),
        }
    }

    #[test]
    fn initialize_without_adapters_fails_closed() {
        let runner = AbyssRunner::new(AppConfig {
            settings: BotSettings::default(),
            config_path: PathBuf::from("config.json"),
            replay_path: None,
        });
        assert!(matches!(runner.initialize(), Err(RunnerError::NoAdapters)));
    }

    #[test]
    fn initialize_with_missing_cassette_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = AbyssRunner::new(AppConfig {
            settings: BotSettings::default(),
            config_path: PathBuf::from("config.json"),
            replay_path: Some(dir.path().join("missing.json")),
        });
        assert!(matches!(runner.initialize(), Err(RunnerError::Replay(_))));
    }

    #[test]
    fn initialize_rejects_invalid_settings() {
        let game = Arc::new(SimGame::at(Vector3::ZERO));
        let mut settings = BotSettings::default();
        settings.movement.mouse_sensitivity = 0.0;
        let runner = AbyssRunner::with_ports(settings, ports(&game, vec![]));
        assert!(matches!(runner.initialize(), Err(RunnerError::Settings(_))));
    }

    #[test]
    fn initialize_loads_a_replay_cassette() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            serde_json::json!({
                "version": "1.0",
                "client_size": { "width": 1280, "height": 720 },
                "frames": [ { "regions": [] } ]
            })
            .to_string(),
        )
        .expect("write cassette");

        let runner = AbyssRunner::new(AppConfig {
            settings: BotSettings::default(),
            config_path: PathBuf::from("config.json"),
            replay_path: Some(path),
        });
        runner.initialize().expect("initialize");
        runner.initialize().expect("initialize twice");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn runs_until_stopped() {
        let game = Arc::new(SimGame::at(Vector3::ZERO));
        let runner = Arc::new(AbyssRunner::with_ports(
            BotSettings::default(),
            ports(&game, vec![("乐土之国", 960, 540)]),
        ));

        let handle = {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { runner.run_async().await })
        };
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(matches!(runner.run_async().await, Err(RunnerError::AlreadyRunning)));

        runner.stop();
        runner.stop();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("runner stops")
            .expect("join");

        assert!(result.is_ok());
        assert_eq!(runner.current_state(), GameState::MainMenu);
        assert!(runner.bus.publish_count() > 0);
        assert!(game.recorder().activations() > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn force_exit_switches_state_on_next_iteration() {
        let game = Arc::new(SimGame::at(Vector3::ZERO));
        let runner = Arc::new(AbyssRunner::with_ports(
            BotSettings::default(),
            ports(&game, vec![]),
        ));

        let handle = {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { runner.run_async().await })
        };
        tokio::time::sleep(Duration::from_millis(300)).await;
        runner.force_exit_abyss();
        tokio::time::sleep(Duration::from_millis(500)).await;
        let state = runner.current_state();
        runner.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("runner stops")
            .expect("join")
            .expect("run");

        assert_eq!(state, GameState::ForceExiting);
        assert!(game.recorder().taps().contains(&"ESCAPE".to_string()));
    }
}
