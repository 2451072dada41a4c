//! Per-actor pending interaction mode.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use restock_world::ActorId;

/// What the next strike on a container does for an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActorMode {
    /// Strikes restock registered containers.
    #[default]
    Idle,
    /// The next strike registers the container.
    Registering,
    /// The next strike sets the container's interval to the given seconds.
    SettingInterval(u32),
}

/// Pending modes keyed by actor. Not persisted.
#[derive(Debug, Default)]
pub struct ActorModes {
    modes: Mutex<HashMap<ActorId, ActorMode>>,
}

impl ActorModes {
    /// Empty table; every actor starts idle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode of `actor`.
    pub fn mode(&self, actor: ActorId) -> ActorMode {
        self.lock().get(&actor).copied().unwrap_or_default()
    }

    /// Enter registration mode. Returns false if already in it.
    pub fn begin_registration(&self, actor: ActorId) -> bool {
        let mut modes = self.lock();
        if modes.get(&actor) == Some(&ActorMode::Registering) {
            return false;
        }
        modes.insert(actor, ActorMode::Registering);
        true
    }

    /// Arm an interval change, replacing any other pending mode.
    pub fn begin_interval(&self, actor: ActorId, seconds: u32) {
        self.lock().insert(actor, ActorMode::SettingInterval(seconds));
    }

    /// Consume the pending mode, leaving the actor idle.
    pub fn take(&self, actor: ActorId) -> ActorMode {
        self.lock().remove(&actor).unwrap_or_default()
    }

    /// Forget every pending mode.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ActorId, ActorMode>> {
        self.modes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
