#![warn(missing_docs)]
//! Restockable container registry, its persistence, and the restock scheduler.

mod container;
mod error;
mod executor;
mod memory;
mod persist;
mod provider;
mod registry;
mod scheduler;

pub use container::*;
pub use error::*;
pub use executor::*;
pub use memory::*;
pub use persist::*;
pub use provider::*;
pub use registry::*;
pub use scheduler::*;
