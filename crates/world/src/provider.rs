use std::fmt;

use restock_core::LocationKey;
use serde::{Deserialize, Serialize};

use crate::Container;

/// Identity of an online actor (a player or other interacting agent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Host-world surface the restock core depends on.
///
/// Implementations resolve location keys against the live world. The registry
/// never treats the world as authoritative for membership; it only asks the
/// provider for the slot array to overwrite.
pub trait ContainerProvider {
    /// Live container at `key`, if the block there is container-capable.
    fn container_mut(&mut self, key: &LocationKey) -> Option<&mut dyn Container>;

    /// Whether a container-capable block exists at `key`.
    fn is_container(&self, key: &LocationKey) -> bool;

    /// Online actors in the same world within `radius` blocks of `key`.
    fn actors_near(&self, key: &LocationKey, radius: f64) -> Vec<ActorId>;

    /// Deliver a passive text notification to an actor.
    fn notify(&mut self, actor: ActorId, message: &str);
}
