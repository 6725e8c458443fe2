use crate::cli::{Cli, Commands};
use crate::commands::Dispatcher;
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::output::Output;
use crate::session::Session;

pub const EXIT_FAILURE: i32 = 1;

pub const USAGE_HINT: &str =
    "give --cache <PATH> with a subcommand, or --repl for an interactive session";

/// How a process invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A subcommand without `--repl`: run it and exit.
    OneShot,
    /// A subcommand with `--repl`: run it, then keep the session going.
    OneShotThenInteractive,
    /// `--repl`, or `--cache` with no subcommand.
    Interactive,
    /// Nothing to do: no subcommand, no store and no `--repl`.
    Usage,
}

impl Mode {
    pub fn enters_loop(self) -> bool {
        matches!(self, Mode::Interactive | Mode::OneShotThenInteractive)
    }
}

pub fn mode(cli: &Cli) -> Mode {
    match (&cli.command, cli.globals.repl) {
        (Some(_), false) => Mode::OneShot,
        (Some(_), true) => Mode::OneShotThenInteractive,
        (None, true) => Mode::Interactive,
        (None, false) if cli.globals.cache.is_some() => Mode::Interactive,
        (None, false) => Mode::Usage,
    }
}

/// Open the session's store and run a single command.
pub fn run_once(
    session: &mut Session,
    dispatcher: &Dispatcher,
    command: &Commands,
    confirm: &mut dyn Confirm,
) -> Result<Output, KvError> {
    session.open()?;
    dispatcher.dispatch(session, command, confirm)
}

/// Open the store before the first prompt when one was named, so a bad path fails
/// right away. With only `--repl` the store is chosen by a later line.
pub fn start_interactive(session: &mut Session) -> Result<(), KvError> {
    if session.options().cache.is_some() {
        session.open()?;
    }
    Ok(())
}

pub fn exit_status<T, E>(result: &Result<T, E>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => EXIT_FAILURE,
    }
}
