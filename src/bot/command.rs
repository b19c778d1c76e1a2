//! Chat commands.

use crate::notify::telegram::BotCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Add,
    List,
    Scan,
    Cancel,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Help,
        Command::Add,
        Command::List,
        Command::Scan,
        Command::Cancel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Add => "add",
            Self::List => "list",
            Self::Scan => "scan",
            Self::Cancel => "cancel",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Help => "Show available commands",
            Self::Add => "Track the price of a new item",
            Self::List => "List tracked items",
            Self::Scan => "Check prices and availability now",
            Self::Cancel => "Cancel adding an item",
        }
    }

    /// Menu entries for `setMyCommands`.
    pub fn menu() -> Vec<BotCommand> {
        Self::ALL
            .iter()
            .map(|c| BotCommand {
                command: c.name().to_string(),
                description: c.description().to_string(),
            })
            .collect()
    }

    /// `/help` reply.
    pub fn help_text() -> String {
        Self::ALL
            .iter()
            .map(|c| format!("/{} - {}", c.name(), c.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What a line of chat text is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed<'a> {
    Command(Command),
    /// Starts with `/` but names no known command
    Unknown(&'a str),
    Text(&'a str),
}

/// Classify chat text. Accepts the `/cmd@botname` form and ignores
/// anything after the command word.
pub fn parse(text: &str) -> Parsed<'_> {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Parsed::Text(trimmed);
    };

    let word = rest.split_whitespace().next().unwrap_or_default();
    let name = word.split('@').next().unwrap_or_default();

    Command::ALL
        .iter()
        .find(|c| c.name().eq_ignore_ascii_case(name))
        .map(|c| Parsed::Command(*c))
        .unwrap_or(Parsed::Unknown(word))
}
