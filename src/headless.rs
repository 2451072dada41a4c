use crate::command_script::{CommandScriptPlayer, CommandScriptStep, ScriptCommand};
use anyhow::{Context, Result};
use restock_core::{ItemStack, LocationKey, SimTick};
use restock_server::{CommandSender, RestockService, StrikeOutcome};
use restock_testkit::{EventRecord, JsonlSink, RestockEventKind};
use restock_world::{ActorId, Container, MemoryWorld, SWEEP_PERIOD_TICKS};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Where newly named actors appear.
const SPAWN_WORLD: &str = "world";
const SPAWN_POSITION: [f64; 3] = [0.0, 64.0, 0.0];

pub struct HeadlessConfig {
    pub data_dir: PathBuf,
    pub script: Option<PathBuf>,
    pub max_ticks: Option<u64>,
    pub event_log: Option<PathBuf>,
}

/// What a headless run did.
#[derive(Debug, Default)]
pub struct HeadlessSummary {
    pub ticks: u64,
    pub events: Vec<(SimTick, RestockEventKind, LocationKey)>,
    /// Command replies and actor notifications, in order.
    pub transcript: Vec<String>,
}

pub fn run(cfg: HeadlessConfig) -> Result<HeadlessSummary> {
    let script = cfg
        .script
        .as_deref()
        .map(CommandScriptPlayer::from_path)
        .transpose()?;
    let event_log = cfg
        .event_log
        .as_deref()
        .map(JsonlSink::create)
        .transpose()?;

    let mut driver = HeadlessDriver::new(&cfg.data_dir, script, event_log);
    let max_ticks = cfg.max_ticks.unwrap_or_else(|| driver.default_ticks());
    info!(
        data_dir = %cfg.data_dir.display(),
        max_ticks,
        "Starting headless restock run"
    );

    let result = driver.run_until(SimTick(max_ticks));
    let shutdown = driver
        .service
        .shutdown()
        .context("Failed to persist restock state at shutdown");
    let flushed = match driver.event_log.as_mut() {
        Some(sink) => sink.flush(),
        None => Ok(()),
    };

    result?;
    shutdown?;
    flushed?;
    info!(
        ticks = driver.summary.ticks,
        events = driver.summary.events.len(),
        "Headless restock run finished"
    );
    Ok(driver.summary)
}

struct HeadlessDriver {
    service: RestockService<MemoryWorld>,
    script: Option<CommandScriptPlayer>,
    event_log: Option<JsonlSink>,
    actors: BTreeMap<String, ActorId>,
    summary: HeadlessSummary,
}

impl HeadlessDriver {
    fn new(
        data_dir: &std::path::Path,
        script: Option<CommandScriptPlayer>,
        event_log: Option<JsonlSink>,
    ) -> Self {
        let world = Arc::new(Mutex::new(MemoryWorld::new()));
        Self {
            service: RestockService::open(data_dir, world),
            script,
            event_log,
            actors: BTreeMap::new(),
            summary: HeadlessSummary::default(),
        }
    }

    /// Run through the last scripted step plus one sweep period, or a single
    /// period when there is no script.
    fn default_ticks(&self) -> u64 {
        let last = self
            .script
            .as_ref()
            .and_then(CommandScriptPlayer::last_tick)
            .map_or(0, |tick| tick.0);
        last + SWEEP_PERIOD_TICKS
    }

    fn run_until(&mut self, end: SimTick) -> Result<()> {
        let mut tick = SimTick::ZERO;
        while tick <= end {
            let steps = self
                .script
                .as_mut()
                .map(|script| script.drain_ready(tick))
                .unwrap_or_default();
            for step in steps {
                self.apply(tick, step)?;
            }

            if tick.0 > 0 && tick.0 % SWEEP_PERIOD_TICKS == 0 {
                self.sweep(tick)?;
            }
            self.summary.ticks = tick.0;
            tick = tick.advance(1);
        }
        if self.script.as_ref().is_some_and(|script| !script.is_finished()) {
            warn!(ticks = end.0, "Script steps remain past the last tick");
        }
        Ok(())
    }

    fn sweep(&mut self, tick: SimTick) -> Result<()> {
        let report = self.service.sweep();
        debug!(
            tick = tick.0,
            counted = report.counted,
            restocked = report.restocked.len(),
            removed = report.removed.len(),
            "Sweep"
        );
        for key in report.restocked {
            self.record(tick, RestockEventKind::AutoRestocked, key)?;
        }
        for key in report.removed {
            self.record(tick, RestockEventKind::Removed, key)?;
        }
        self.collect_notifications();
        Ok(())
    }

    fn apply(&mut self, tick: SimTick, step: CommandScriptStep) -> Result<()> {
        let actor = step.actor.as_deref().map(|name| self.actor(name));
        match step.command {
            ScriptCommand::Restock(line) => {
                let sender = actor.map_or(CommandSender::Console, CommandSender::Actor);
                let output = self.service.handle_command(sender, &line);
                for reply in output.lines {
                    info!(tick = tick.0, %line, %reply, "Command reply");
                    self.summary.transcript.push(reply);
                }
            }
            ScriptCommand::Strike(key) => {
                let Some(actor) = actor else {
                    anyhow::bail!("strike at {key} has no actor");
                };
                match self.service.strike(actor, &key, step.privileged) {
                    StrikeOutcome::Registered { .. } => {
                        self.record(tick, RestockEventKind::Registered, key)?
                    }
                    StrikeOutcome::Restocked { .. } => {
                        self.record(tick, RestockEventKind::ManualRestocked, key)?
                    }
                    outcome => debug!(tick = tick.0, %key, ?outcome, "Strike"),
                }
            }
            ScriptCommand::Place(kind, key) => {
                self.world().place_container(key, kind);
            }
            ScriptCommand::Put {
                key,
                slot,
                item_type,
                amount,
                variant,
            } => {
                let mut world = self.world();
                match world.container_at_mut(&key) {
                    Some(container) => container.set_item(
                        slot,
                        Some(ItemStack::new(item_type, amount).with_damage(variant)),
                    ),
                    None => warn!(tick = tick.0, %key, "No container to put items into"),
                }
            }
            ScriptCommand::Break(key) => {
                if self.world().break_block(&key).is_none() {
                    warn!(tick = tick.0, %key, "Nothing to break");
                }
            }
            ScriptCommand::Move(key) => {
                if let Some(actor) = actor {
                    let position = [f64::from(key.x), f64::from(key.y), f64::from(key.z)];
                    self.world().move_actor(actor, key.world, position);
                }
            }
        }
        self.collect_notifications();
        Ok(())
    }

    fn actor(&mut self, name: &str) -> ActorId {
        if let Some(id) = self.actors.get(name) {
            return *id;
        }
        let id = ActorId(self.actors.len() as u64 + 1);
        self.world()
            .spawn_actor(id, name, SPAWN_WORLD, SPAWN_POSITION);
        self.actors.insert(name.to_string(), id);
        id
    }

    fn collect_notifications(&mut self) {
        let mut world = self
            .service
            .world()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (name, id) in &self.actors {
            for message in world.take_inbox(*id) {
                debug!(actor = %name, %message, "Notification");
                self.summary.transcript.push(format!("[{name}] {message}"));
            }
        }
    }

    fn record(&mut self, tick: SimTick, kind: RestockEventKind, key: LocationKey) -> Result<()> {
        if let Some(sink) = self.event_log.as_mut() {
            sink.write(&EventRecord {
                tick,
                kind,
                location: &key.to_string(),
            })?;
        }
        self.summary.events.push((tick, kind, key));
        Ok(())
    }

    fn world(&self) -> MutexGuard<'_, MemoryWorld> {
        self.service
            .world()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("restockd_headless_{name}_{timestamp}"))
    }

    #[test]
    fn scripted_run_registers_and_restocks() {
        let dir = temp_dir("scripted");
        fs::create_dir_all(&dir).unwrap();
        let script = dir.join("script.json");
        fs::write(
            &script,
            r#"{
                "steps": [
                    {"tick": 0, "command": "place chest world:4:64:4"},
                    {"tick": 0, "command": "put world:4:64:4 0 bread 3"},
                    {"tick": 0, "actor": "alex", "command": "/restock create"},
                    {"tick": 1, "actor": "alex", "command": "strike world:4:64:4"},
                    {"tick": 2, "actor": "alex", "command": "/restock ctime 2"},
                    {"tick": 3, "actor": "alex", "command": "strike world:4:64:4"},
                    {"tick": 50, "actor": "alex", "command": "strike world:4:64:4"},
                    {"tick": 85, "command": "break world:4:64:4"}
                ]
            }"#,
        )
        .unwrap();
        let log = dir.join("events.jsonl");

        let summary = run(HeadlessConfig {
            data_dir: dir.join("data"),
            script: Some(script),
            max_ticks: Some(120),
            event_log: Some(log.clone()),
        })
        .expect("headless run");

        let kinds: Vec<_> = summary
            .events
            .iter()
            .map(|(tick, kind, _)| (tick.0, *kind))
            .collect();
        assert_eq!(
            kinds,
            [
                (1, RestockEventKind::Registered),
                (40, RestockEventKind::AutoRestocked),
                (50, RestockEventKind::ManualRestocked),
                (80, RestockEventKind::AutoRestocked),
                (120, RestockEventKind::Removed),
            ]
        );
        assert!(summary
            .transcript
            .iter()
            .any(|line| line == "[alex] Container restocked!"));

        let lines = fs::read_to_string(&log).unwrap();
        assert_eq!(lines.lines().count(), 5);
        assert!(lines.lines().next().unwrap().contains("\"registered\""));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn run_without_script_persists_empty_state() {
        let dir = temp_dir("empty");
        let summary = run(HeadlessConfig {
            data_dir: dir.clone(),
            script: None,
            max_ticks: None,
            event_log: None,
        })
        .expect("headless run");
        assert_eq!(summary.ticks, SWEEP_PERIOD_TICKS);
        assert!(summary.events.is_empty());
        assert!(dir.join(restock_world::STATE_FILE_NAME).exists());
        fs::remove_dir_all(&dir).ok();
    }
}
