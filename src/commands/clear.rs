use super::command_args;
use crate::cli::{ClearArgs, Commands};
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::keys;
use crate::output::Output;
use crate::session::Session;

pub fn handle(session: &Session, command: &Commands, confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let args = command_args!(command, Clear);
    execute(session, args, confirm)
}

/// Without key elements the whole store is wiped; with them only keys under that
/// (whole-element) prefix. Each scope has its own prompt.
pub fn execute(session: &Session, args: &ClearArgs, confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let store = session.store()?;

    if args.keys.is_empty() {
        let prompt = format!("Clear ALL entries in '{}'? [y/N] ", store.root().display());
        if !confirm.confirm(&prompt)? {
            return Ok(Output::Aborted);
        }
        let removed = store.clear()?;
        return Ok(Output::status(format!("cleared {} entries", removed)));
    }

    let options = session.options();
    let prefix = keys::compose_prefix(options.name(), &options.delim, &args.keys, true)?;
    let prompt = format!("Clear all keys starting with '{}'? [y/N] ", prefix);
    if !confirm.confirm(&prompt)? {
        return Ok(Output::Aborted);
    }
    let removed = store.clear_keys(&prefix)?;
    Ok(Output::status(format!("cleared {} entries under '{}'", removed, prefix)))
}
