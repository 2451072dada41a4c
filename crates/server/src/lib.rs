#![warn(missing_docs)]
//! Restock host: wires the registry, settings, pending actor modes and the
//! background scheduler to the command and interaction surfaces.

pub mod commands;
pub mod config;
pub mod modes;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use restock_core::LocationKey;
use restock_world::{
    manual_restock, ActorId, ContainerProvider, ContainerRegistry, RestockError,
    RestockScheduler, RestockStore, SchedulerHandle, SweepReport, SWEEP_PERIOD,
};
use tracing::{info, warn};

pub use commands::{help_lines, parse_command, CommandError, CommandOutput, RestockCommand};
pub use config::{ConfigError, ConfigStore, GlobalConfig};
pub use modes::{ActorMode, ActorModes};

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSender {
    /// Server console; cannot use strike-driven subcommands.
    Console,
    /// An in-world actor.
    Actor(ActorId),
}

/// What a strike on a block did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeOutcome {
    /// Not a container, or an idle strike on an unregistered one.
    Ignored,
    /// The container was registered.
    Registered {
        /// Non-empty slots captured.
        captured: usize,
    },
    /// The container was restocked by hand.
    Restocked {
        /// Slots filled from the template.
        filled: usize,
    },
    /// The container's interval was changed.
    IntervalSet {
        /// New interval.
        seconds: u32,
    },
    /// Registration is disabled for this actor.
    Denied,
    /// The action failed; the actor was told why.
    Failed,
}

const MSG_REGISTERED: &str =
    "Container registered for restocking! Punch without sneaking to restock.";
const MSG_REGISTRATION_DISABLED: &str = "Container registration is disabled for players.";
const MSG_NOT_REGISTERED: &str = "This container is not registered for restocking.";
const MSG_REGISTER_UNAVAILABLE: &str = "Cannot register container: Inventory not accessible.";
const MSG_RESTOCK_UNAVAILABLE: &str = "Cannot restock container: Inventory not accessible.";
const MSG_ALREADY_REGISTERING: &str =
    "You are already in container registration mode. Punch a container to register it.";
const MSG_PLAYERS_ONLY: &str = "Only players can use this command.";

/// Restock host over a world provider `P`.
pub struct RestockService<P> {
    registry: Arc<ContainerRegistry>,
    config: Mutex<ConfigStore>,
    announce: Arc<AtomicBool>,
    modes: ActorModes,
    world: Arc<Mutex<P>>,
    scheduler: Mutex<Option<SchedulerHandle>>,
}

impl<P> RestockService<P>
where
    P: ContainerProvider + Send + 'static,
{
    /// Load settings and registry state from `data_dir`.
    pub fn open<D: AsRef<Path>>(data_dir: D, world: Arc<Mutex<P>>) -> Self {
        let data_dir = data_dir.as_ref();
        let config = ConfigStore::load_from_dir(data_dir);
        let settings = config.config();
        let registry = ContainerRegistry::load(
            RestockStore::in_dir(data_dir),
            settings.default_restock_seconds,
        );
        info!(
            data_dir = %data_dir.display(),
            containers = registry.len(),
            default_restock_seconds = settings.default_restock_seconds,
            "Restock service ready"
        );
        Self {
            registry: Arc::new(registry),
            config: Mutex::new(config),
            announce: Arc::new(AtomicBool::new(settings.announce_on_restock)),
            modes: ActorModes::new(),
            world,
            scheduler: Mutex::new(None),
        }
    }

    /// Shared registry.
    pub fn registry(&self) -> &Arc<ContainerRegistry> {
        &self.registry
    }

    /// Shared world handle.
    pub fn world(&self) -> &Arc<Mutex<P>> {
        &self.world
    }

    /// Current settings.
    pub fn config(&self) -> GlobalConfig {
        self.config_store().config()
    }

    /// Scheduler bound to this service's registry and announcement setting.
    pub fn scheduler(&self) -> RestockScheduler {
        RestockScheduler::with_announce_flag(Arc::clone(&self.registry), Arc::clone(&self.announce))
    }

    /// Run one sweep on the calling thread.
    pub fn sweep(&self) -> SweepReport {
        let mut world = self.lock_world();
        self.scheduler().sweep(&mut *world)
    }

    /// Start background sweeps every `period`. A running scheduler is replaced.
    pub fn start(&self, period: Duration) -> std::io::Result<()> {
        let handle = self.scheduler().spawn(Arc::clone(&self.world), period)?;
        let previous = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.shutdown();
        }
        Ok(())
    }

    /// Start background sweeps at [`SWEEP_PERIOD`].
    pub fn start_default(&self) -> std::io::Result<()> {
        self.start(SWEEP_PERIOD)
    }

    /// Stop background sweeps and write the registry to disk.
    pub fn shutdown(&self) -> Result<(), RestockError> {
        let handle = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.shutdown();
        }
        self.modes.clear();
        self.registry.flush()?;
        info!(containers = self.registry.len(), "Restock service stopped");
        Ok(())
    }

    /// Parse and run a command line, turning parse errors into output.
    pub fn handle_command(&self, sender: CommandSender, input: &str) -> CommandOutput {
        match parse_command(input) {
            Ok(command) => self.execute(sender, command),
            Err(err) => CommandOutput::line(err.to_string()),
        }
    }

    /// Run a parsed command.
    pub fn execute(&self, sender: CommandSender, command: RestockCommand) -> CommandOutput {
        match command {
            RestockCommand::Help => CommandOutput {
                lines: help_lines(),
            },
            RestockCommand::Create => {
                let CommandSender::Actor(actor) = sender else {
                    return CommandOutput::line(MSG_PLAYERS_ONLY);
                };
                if self.modes.begin_registration(actor) {
                    CommandOutput::line("Punch a container to register it for restocking.")
                } else {
                    CommandOutput::line(MSG_ALREADY_REGISTERING)
                }
            }
            RestockCommand::List => {
                let mut out = CommandOutput::line(format!(
                    "Registered containers: {}",
                    self.registry.len()
                ));
                out.lines.extend(
                    self.registry
                        .list()
                        .map(|(key, timer)| format!("{key} (restocks in {timer}s)")),
                );
                out
            }
            RestockCommand::Clear => {
                self.registry.clear_all();
                CommandOutput::line("All registered containers cleared!")
            }
            RestockCommand::Time { seconds } => {
                match self
                    .config_store()
                    .set_default_restock_seconds(i64::from(seconds))
                {
                    Ok(seconds) => CommandOutput::line(format!(
                        "Default restock time set to {seconds} seconds!"
                    )),
                    Err(err) => CommandOutput::line(err.to_string()),
                }
            }
            RestockCommand::ContainerTime { seconds } => {
                let CommandSender::Actor(actor) = sender else {
                    return CommandOutput::line(MSG_PLAYERS_ONLY);
                };
                self.modes.begin_interval(actor, seconds);
                CommandOutput::line(format!(
                    "Punch a registered container to set its restock time to {seconds} seconds."
                ))
            }
            RestockCommand::Reload => {
                let settings = self.config_store().reload();
                self.announce
                    .store(settings.announce_on_restock, Ordering::Relaxed);
                info!(?settings, "Config reloaded");
                CommandOutput::line("Config reloaded!")
            }
        }
    }

    /// Handle `actor` striking the block at `key`.
    ///
    /// `privileged` actors may register containers even when self-registration
    /// is disabled. Replies are delivered through the world provider.
    pub fn strike(&self, actor: ActorId, key: &LocationKey, privileged: bool) -> StrikeOutcome {
        let settings = self.config();
        let mut world = self.lock_world();
        if !world.is_container(key) {
            return StrikeOutcome::Ignored;
        }

        match self.modes.take(actor) {
            ActorMode::Registering => {
                if !settings.allow_self_registration && !privileged {
                    world.notify(actor, MSG_REGISTRATION_DISABLED);
                    return StrikeOutcome::Denied;
                }
                let Some(container) = world.container_mut(key) else {
                    warn!(%key, "Failed to get inventory for container");
                    world.notify(actor, MSG_REGISTER_UNAVAILABLE);
                    return StrikeOutcome::Failed;
                };
                let live = container.contents();
                let captured =
                    self.registry
                        .register(key.clone(), &live, settings.default_restock_seconds);
                world.notify(actor, MSG_REGISTERED);
                StrikeOutcome::Registered { captured }
            }
            ActorMode::SettingInterval(seconds) => {
                match self.registry.set_interval(key, i64::from(seconds)) {
                    Ok(()) => {
                        world.notify(
                            actor,
                            &format!("Restock time for this container set to {seconds} seconds."),
                        );
                        StrikeOutcome::IntervalSet { seconds }
                    }
                    Err(err) => {
                        world.notify(actor, failure_message(&err));
                        StrikeOutcome::Failed
                    }
                }
            }
            ActorMode::Idle => {
                if !self.registry.contains(key) {
                    return StrikeOutcome::Ignored;
                }
                match manual_restock(&self.registry, &mut *world, key, actor) {
                    Ok(filled) => StrikeOutcome::Restocked { filled },
                    Err(err) => {
                        world.notify(actor, failure_message(&err));
                        StrikeOutcome::Failed
                    }
                }
            }
        }
    }

    fn config_store(&self) -> MutexGuard<'_, ConfigStore> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_world(&self) -> MutexGuard<'_, P> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn failure_message(err: &RestockError) -> &'static str {
    match err {
        RestockError::NotRegistered(_) => MSG_NOT_REGISTERED,
        RestockError::ContainerUnavailable(_) => MSG_RESTOCK_UNAVAILABLE,
        _ => "Restock failed; see server log.",
    }
}
