use anyhow::{Context, Result};
use restock_core::{LocationKey, SimTick};
use restock_world::ContainerKind;
use serde::Deserialize;
use std::{collections::VecDeque, fs, path::Path};

#[derive(Debug, Deserialize)]
struct CommandScriptFile {
    steps: Vec<CommandScriptStepDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct CommandScriptStepDef {
    tick: u64,
    #[serde(default)]
    actor: Option<String>,
    #[serde(default)]
    privileged: bool,
    command: String,
}

/// One action a script step performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    /// A `/restock ...` line, passed through to the command surface.
    Restock(String),
    /// Strike the block at a location.
    Strike(LocationKey),
    /// Place an empty container.
    Place(ContainerKind, LocationKey),
    /// Put an item stack into a container slot.
    Put {
        /// Target container.
        key: LocationKey,
        /// Slot index.
        slot: usize,
        /// Item type id.
        item_type: String,
        /// Stack size.
        amount: u32,
        /// Durability/variant value.
        variant: u16,
    },
    /// Remove whatever block sits at a location.
    Break(LocationKey),
    /// Move the step's actor next to a location.
    Move(LocationKey),
}

impl ScriptCommand {
    /// Parse one script command line.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.starts_with('/') || line.split_whitespace().next() == Some("restock") {
            return Ok(ScriptCommand::Restock(line.to_string()));
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["strike", key] => Ok(ScriptCommand::Strike(parse_key(key)?)),
            ["break", key] => Ok(ScriptCommand::Break(parse_key(key)?)),
            ["move", key] => Ok(ScriptCommand::Move(parse_key(key)?)),
            ["place", kind, key] => {
                let kind = ContainerKind::from_name(kind)
                    .with_context(|| format!("unknown container kind '{kind}'"))?;
                Ok(ScriptCommand::Place(kind, parse_key(key)?))
            }
            ["put", key, slot, item_type, amount, rest @ ..] if rest.len() <= 1 => {
                let variant = match rest.first() {
                    Some(raw) => raw
                        .parse()
                        .with_context(|| format!("invalid variant '{raw}'"))?,
                    None => 0,
                };
                Ok(ScriptCommand::Put {
                    key: parse_key(key)?,
                    slot: slot
                        .parse()
                        .with_context(|| format!("invalid slot '{slot}'"))?,
                    item_type: (*item_type).to_string(),
                    amount: amount
                        .parse()
                        .with_context(|| format!("invalid amount '{amount}'"))?,
                    variant,
                })
            }
            _ => anyhow::bail!("unrecognised script command '{line}'"),
        }
    }
}

fn parse_key(raw: &str) -> Result<LocationKey> {
    Ok(LocationKey::parse(raw)?)
}

/// A scheduled script step, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandScriptStep {
    /// Tick at which the step runs.
    pub tick: SimTick,
    /// Acting actor name; `None` runs as the console.
    pub actor: Option<String>,
    /// Whether the actor bypasses the self-registration setting.
    pub privileged: bool,
    /// What to do.
    pub command: ScriptCommand,
}

/// Deterministic command script runner.
///
/// Scripts are a list of `{tick, actor, command}` steps, executed in file order.
#[derive(Debug)]
pub struct CommandScriptPlayer {
    pending: VecDeque<CommandScriptStep>,
}

impl CommandScriptPlayer {
    /// Load a command script from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read command script {}", path.display()))?;
        Self::from_str(&contents)
    }

    /// Load a command script from an in-memory JSON string.
    pub fn from_str(contents: &str) -> Result<Self> {
        let file: CommandScriptFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("command script contains no steps");
        }

        let mut pending = VecDeque::with_capacity(file.steps.len());
        let mut last_tick: Option<u64> = None;
        for (index, step) in file.steps.into_iter().enumerate() {
            let line = step.command.trim();
            if line.is_empty() {
                anyhow::bail!("command script contains an empty command");
            }

            if let Some(prev) = last_tick {
                if step.tick < prev {
                    anyhow::bail!("command script steps must be sorted by tick");
                }
            }
            last_tick = Some(step.tick);

            let command = ScriptCommand::parse(line)
                .with_context(|| format!("command script step {index}"))?;
            let needs_actor = matches!(command, ScriptCommand::Strike(_) | ScriptCommand::Move(_));
            if needs_actor && step.actor.is_none() {
                anyhow::bail!("command script step {index}: '{line}' needs an actor");
            }

            pending.push_back(CommandScriptStep {
                tick: SimTick(step.tick),
                actor: step.actor,
                privileged: step.privileged,
                command,
            });
        }

        Ok(Self { pending })
    }

    /// Drain and return all steps scheduled for ticks `<= tick`.
    pub fn drain_ready(&mut self, tick: SimTick) -> Vec<CommandScriptStep> {
        let mut ready = Vec::new();
        while self.pending.front().is_some_and(|step| step.tick <= tick) {
            ready.extend(self.pending.pop_front());
        }
        ready
    }

    /// Tick of the last scheduled step, if any remain.
    pub fn last_tick(&self) -> Option<SimTick> {
        self.pending.back().map(|step| step.tick)
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}
