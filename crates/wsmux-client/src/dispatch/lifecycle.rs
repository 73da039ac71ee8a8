//! Connection lifecycle: `Connecting -> Open -> Closed`.
//!
//! `Closed` is terminal; there is no reconnect. Connect listeners registered
//! after the connection opened run immediately, inside the registration call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Connect / disconnect listener.
pub type ConnectFn = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

struct Inner {
    state: ConnectionState,
    on_connect: Vec<ConnectFn>,
    on_disconnect: Vec<ConnectFn>,
}

pub struct Lifecycle {
    inner: Mutex<Inner>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ConnectionState::Connecting,
                on_connect: Vec::new(),
                on_disconnect: Vec::new(),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Store `f`; if already open, also run it now.
    ///
    /// The state check and the push share one critical section with
    /// [`Lifecycle::open`], so `f` runs exactly once either way.
    pub fn on_connect(&self, f: ConnectFn) {
        let already_open = {
            let mut g = self.lock();
            g.on_connect.push(Arc::clone(&f));
            g.state == ConnectionState::Open
        };
        if already_open {
            f();
        }
    }

    pub fn on_disconnect(&self, f: ConnectFn) {
        self.lock().on_disconnect.push(f);
    }

    /// `Connecting -> Open`. Returns `false` (and fires nothing) from any other state.
    pub fn open(&self) -> bool {
        let listeners = {
            let mut g = self.lock();
            if g.state != ConnectionState::Connecting {
                return false;
            }
            g.state = ConnectionState::Open;
            g.on_connect.clone()
        };
        for f in &listeners {
            f();
        }
        true
    }

    /// Any state -> `Closed`, firing disconnect listeners the first time only.
    pub fn close(&self) -> bool {
        let listeners = {
            let mut g = self.lock();
            if g.state == ConnectionState::Closed {
                return false;
            }
            g.state = ConnectionState::Closed;
            g.on_disconnect.clone()
        };
        for f in &listeners {
            f();
        }
        true
    }

    // Listeners never run under this lock, so a poisoned guard still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
