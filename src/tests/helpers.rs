use crate::animation::AnimationController;
use crate::config::{AnimatorConfig, WaveformStyle};
use crate::display::{CommandResponse, DisplayCommand, RemoteLink};
use crate::error::LinkError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Mock display ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockMode {
    /// Confirms only the configured parameters and groups.
    Confirming,
    /// Acknowledges everything without a success flag.
    BareAck,
    /// Every connect and send fails.
    Offline,
}

/// Recording stand-in for Hime Display.
pub struct MockDisplay {
    mode: MockMode,
    parameters: HashSet<String>,
    groups: HashSet<String>,
    sent: Mutex<Vec<DisplayCommand>>,
    fail_next: AtomicUsize,
    pub connects: AtomicUsize,
    connected: AtomicBool,
    offline: AtomicBool,
}

impl MockDisplay {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            parameters: HashSet::new(),
            groups: HashSet::new(),
            sent: Mutex::new(Vec::new()),
            fail_next: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
            offline: AtomicBool::new(mode == MockMode::Offline),
        }
    }

    pub fn confirming(parameters: &[&str], groups: &[&str]) -> Self {
        let mut mock = Self::new(MockMode::Confirming);
        mock.parameters = parameters.iter().map(|p| p.to_string()).collect();
        mock.groups = groups.iter().map(|g| g.to_string()).collect();
        mock
    }

    /// Start unreachable; `set_online(true)` brings the display up.
    pub fn starting_offline(self) -> Self {
        self.offline.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// Fail the next `n` sends with a transport error.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<DisplayCommand> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn count(&self, action: &str) -> usize {
        self.sent().iter().filter(|c| c.action() == action).count()
    }

    fn answer(&self, command: &DisplayCommand) -> CommandResponse {
        if self.mode == MockMode::BareAck {
            return CommandResponse::bare_ack();
        }
        let supported = match command {
            DisplayCommand::SetParameter(p) => self.parameters.contains(&p.parameter_id),
            DisplayCommand::PlayRandomMotion { group } => self.groups.contains(group),
            _ => true,
        };
        if supported {
            CommandResponse::ok()
        } else {
            CommandResponse::failed("not found")
        }
    }
}

#[async_trait]
impl RemoteLink for MockDisplay {
    async fn connect(&self) -> Result<(), LinkError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(LinkError::Connect {
                url: "ws://mock".to_string(),
                reason: "offline".to_string(),
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, command: DisplayCommand) -> Result<CommandResponse, LinkError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LinkError::Connect {
                url: "ws://mock".to_string(),
                reason: "offline".to_string(),
            });
        }
        let pending = self.fail_next.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next.store(pending - 1, Ordering::SeqCst);
            self.connected.store(false, Ordering::SeqCst);
            return Err(LinkError::Send("connection reset".to_string()));
        }
        let response = self.answer(&command);
        self.sent.lock().unwrap().push(command);
        Ok(response)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), LinkError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ── Controller setup ────────────────────────────────────────

/// Deterministic config: seeded RNG, bounce waveform.
pub fn test_config() -> AnimatorConfig {
    let mut config = AnimatorConfig::default();
    config.idle.seed = Some(42);
    config.speech.waveform = WaveformStyle::Bounce;
    config
}

/// Controller over `mock`, probed already.
pub async fn probed_controller(mock: &Arc<MockDisplay>) -> AnimationController {
    let controller = AnimationController::new(mock.clone(), test_config());
    controller.probe_capabilities().await;
    mock.clear();
    controller
}

pub const ALL_FACE: &[&str] = &[
    "ParamAngleX",
    "ParamAngleY",
    "ParamEyeLOpen",
    "ParamEyeROpen",
    "ParamEyeBallX",
    "ParamEyeBallY",
    "ParamMouthOpenY",
    "ParamMouthForm",
    "ParamBrowLY",
    "ParamBrowRY",
];
