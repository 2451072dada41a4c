//! `/restock` command parsing.

use thiserror::Error;

/// Parse failure, carrying the text shown to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    /// Create an error with a user-facing message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One parsed `/restock` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestockCommand {
    /// Print the subcommand list.
    Help,
    /// Enter registration mode.
    Create,
    /// List registered containers with their timers.
    List,
    /// Forget every registered container.
    Clear,
    /// Set the default interval for new registrations.
    Time {
        /// Seconds, at least 1.
        seconds: u32,
    },
    /// Arm an interval change for the next struck container.
    ContainerTime {
        /// Seconds, at least 0.
        seconds: u32,
    },
    /// Reload the settings document.
    Reload,
}

/// Text produced by a command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Lines in display order.
    pub lines: Vec<String>,
}

impl CommandOutput {
    /// Output with a single line.
    pub fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
        }
    }
}

/// Subcommand summary shown by `/restock` with no arguments.
pub fn help_lines() -> Vec<String> {
    [
        "Restock commands:",
        "/restock create - Register a container by punching it",
        "/restock list - List all registered containers",
        "/restock clear - Clear all registered containers",
        "/restock time <seconds> - Set default restock time",
        "/restock ctime <seconds> - Set container restock time",
        "/restock reload - Reload config",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Parse a `/restock ...` line. The leading slash and `restock` are optional.
pub fn parse_command(input: &str) -> Result<RestockCommand, CommandError> {
    let input = input.trim();
    let input = input.strip_prefix('/').unwrap_or(input);

    let mut parts = input.split_whitespace().peekable();
    if parts
        .peek()
        .is_some_and(|word| word.eq_ignore_ascii_case("restock"))
    {
        parts.next();
    }

    let Some(sub) = parts.next() else {
        return Ok(RestockCommand::Help);
    };
    let args: Vec<&str> = parts.collect();

    match sub.to_ascii_lowercase().as_str() {
        "create" => Ok(RestockCommand::Create),
        "list" => Ok(RestockCommand::List),
        "clear" => Ok(RestockCommand::Clear),
        "reload" => Ok(RestockCommand::Reload),
        "time" => {
            let Some(raw) = args.first() else {
                return Err(CommandError::new("Usage: /restock time <seconds>"));
            };
            let seconds = raw
                .parse::<i64>()
                .map_err(|_| CommandError::new("Invalid number!"))?;
            if seconds < 1 {
                return Err(CommandError::new("Time must be at least 1 second!"));
            }
            let seconds =
                u32::try_from(seconds).map_err(|_| CommandError::new("Invalid number!"))?;
            Ok(RestockCommand::Time { seconds })
        }
        "ctime" => {
            if args.len() != 1 {
                return Err(CommandError::new("Usage: /restock ctime <seconds>"));
            }
            let seconds = args[0].parse::<u32>().map_err(|_| {
                CommandError::new("Invalid time. Must be a non-negative number.")
            })?;
            Ok(RestockCommand::ContainerTime { seconds })
        }
        other => Err(CommandError::new(format!(
            "Unknown subcommand: {other}. Try /restock"
        ))),
    }
}
