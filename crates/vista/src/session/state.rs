use serde::Serialize;

/// Lifecycle state of the stream session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Playing,
    Stopping,
}

impl SessionState {
    /// Whether a session exists or is being established.
    pub fn is_live(self) -> bool {
        matches!(self, SessionState::Starting | SessionState::Playing)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Playing => "playing",
            SessionState::Stopping => "stopping",
        };
        f.write_str(s)
    }
}
