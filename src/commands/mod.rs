use crate::cli::Commands;
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::output::Output;
use crate::session::Session;
use std::collections::HashMap;

pub mod check;
pub mod clear;
pub mod delete;
pub mod evict;
pub mod expire;
pub mod get;
pub mod items;
pub mod set;
pub mod set_from_dict;
pub mod startswith;
pub mod volume;

/// Every handler has the same shape: it reads the session and the parsed command and
/// returns what to show. Destructive handlers ask through `Confirm` first.
pub type Handler = fn(&Session, &Commands, &mut dyn Confirm) -> Result<Output, KvError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Volume,
    Check,
    Evict,
    Expire,
    Get,
    Items,
    GetStartswith,
    Set,
    SetFromDict,
    Delete,
    Clear,
}

impl CommandKind {
    pub const ALL: [CommandKind; 11] = [
        CommandKind::Volume,
        CommandKind::Check,
        CommandKind::Evict,
        CommandKind::Expire,
        CommandKind::Get,
        CommandKind::Items,
        CommandKind::GetStartswith,
        CommandKind::Set,
        CommandKind::SetFromDict,
        CommandKind::Delete,
        CommandKind::Clear,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Volume => "volume",
            CommandKind::Check => "check",
            CommandKind::Evict => "evict",
            CommandKind::Expire => "expire",
            CommandKind::Get => "get",
            CommandKind::Items => "items",
            CommandKind::GetStartswith => "get_startswith",
            CommandKind::Set => "set",
            CommandKind::SetFromDict => "set_from_dict",
            CommandKind::Delete => "delete",
            CommandKind::Clear => "clear",
        }
    }
}

impl Commands {
    pub fn kind(&self) -> CommandKind {
        match self {
            Commands::Volume => CommandKind::Volume,
            Commands::Check(_) => CommandKind::Check,
            Commands::Evict(_) => CommandKind::Evict,
            Commands::Expire => CommandKind::Expire,
            Commands::Get(_) => CommandKind::Get,
            Commands::Items(_) => CommandKind::Items,
            Commands::GetStartswith(_) => CommandKind::GetStartswith,
            Commands::Set(_) => CommandKind::Set,
            Commands::SetFromDict(_) => CommandKind::SetFromDict,
            Commands::Delete(_) => CommandKind::Delete,
            Commands::Clear(_) => CommandKind::Clear,
        }
    }
}

const HANDLERS: [(CommandKind, Handler); 11] = [
    (CommandKind::Volume, volume::handle),
    (CommandKind::Check, check::handle),
    (CommandKind::Evict, evict::handle),
    (CommandKind::Expire, expire::handle),
    (CommandKind::Get, get::handle),
    (CommandKind::Items, items::handle),
    (CommandKind::GetStartswith, startswith::handle),
    (CommandKind::Set, set::handle),
    (CommandKind::SetFromDict, set_from_dict::handle),
    (CommandKind::Delete, delete::handle),
    (CommandKind::Clear, clear::handle),
];

/// Pull the typed arguments out of a command, or bail out if the registry routed the
/// wrong variant here.
macro_rules! command_args {
    ($command:expr, $variant:ident) => {
        match $command {
            $crate::cli::Commands::$variant(args) => args,
            other => {
                return Err($crate::error::KvError::UnhandledCommand(
                    other.kind().name().to_string(),
                ))
            }
        }
    };
}
pub(crate) use command_args;

pub struct Dispatcher {
    handlers: HashMap<CommandKind, Handler>,
}

impl Dispatcher {
    /// Build the registry, refusing to start if any subcommand lacks a handler.
    pub fn new() -> Result<Self, KvError> {
        Self::from_table(&HANDLERS)
    }

    fn from_table(table: &[(CommandKind, Handler)]) -> Result<Self, KvError> {
        let handlers: HashMap<CommandKind, Handler> = table.iter().copied().collect();
        if let Some(missing) = CommandKind::ALL.iter().find(|kind| !handlers.contains_key(*kind)) {
            return Err(KvError::UnhandledCommand(missing.name().to_string()));
        }
        Ok(Self { handlers })
    }

    pub fn dispatch(
        &self,
        session: &Session,
        command: &Commands,
        confirm: &mut dyn Confirm,
    ) -> Result<Output, KvError> {
        let kind = command.kind();
        let handler = self
            .handlers
            .get(&kind)
            .ok_or_else(|| KvError::UnhandledCommand(kind.name().to_string()))?;
        tracing::debug!(command = kind.name(), "dispatching");
        handler(session, command, confirm)
    }
}
