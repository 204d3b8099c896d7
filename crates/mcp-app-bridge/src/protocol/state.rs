//! Handshake state machine: `Uninitialized → Initializing → Ready → Closed`.

/// Connection state of a Bridge Engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No `ui/initialize` seen yet.
    Uninitialized,
    /// `ui/initialize` answered, waiting for `initialized`.
    Initializing,
    /// Handshake complete.
    Ready,
    /// Terminal.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Uninitialized => "uninitialized",
            ConnectionState::Initializing => "initializing",
            ConnectionState::Ready => "ready",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Tracks the handshake and makes the ready transition fire exactly once.
#[derive(Debug)]
pub struct Handshake {
    state: ConnectionState,
    ready_fired: bool,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Uninitialized,
            ready_fired: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// `ui/initialize` was answered.
    pub fn on_initialize(&mut self) {
        match self.state {
            ConnectionState::Uninitialized => self.state = ConnectionState::Initializing,
            ConnectionState::Closed => {}
            other => tracing::warn!("ui/initialize received again while {other}"),
        }
    }

    /// `ui/notifications/initialized` arrived. Returns true only on the
    /// transition into `Ready`, so the ready callback fires once.
    pub fn on_initialized(&mut self) -> bool {
        match self.state {
            ConnectionState::Closed => false,
            ConnectionState::Ready => {
                tracing::debug!("Duplicate initialized notification ignored");
                false
            }
            previous => {
                if previous == ConnectionState::Uninitialized {
                    tracing::warn!("initialized received before ui/initialize");
                }
                self.state = ConnectionState::Ready;
                if self.ready_fired {
                    return false;
                }
                self.ready_fired = true;
                tracing::info!("Bridge handshake complete");
                true
            }
        }
    }

    /// Any state → `Closed`.
    pub fn close(&mut self) {
        if self.state != ConnectionState::Closed {
            tracing::info!("Bridge closed (was {})", self.state);
            self.state = ConnectionState::Closed;
        }
    }
}
