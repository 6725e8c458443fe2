use super::command_args;
use crate::cli::{CheckArgs, Commands};
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::output::Output;
use crate::session::Session;

pub fn handle(session: &Session, command: &Commands, _confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let args = command_args!(command, Check);
    execute(session, args)
}

pub fn execute(session: &Session, args: &CheckArgs) -> Result<Output, KvError> {
    let warnings = session.store()?.check(args.fix)?;

    if warnings.is_empty() {
        return Ok(Output::status("no problems found"));
    }
    Ok(Output::Lines(warnings))
}
