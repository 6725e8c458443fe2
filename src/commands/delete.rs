use super::command_args;
use crate::cli::{Commands, DeleteArgs};
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::keys;
use crate::output::Output;
use crate::session::Session;

pub fn handle(session: &Session, command: &Commands, confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let args = command_args!(command, Delete);
    execute(session, args, confirm)
}

pub fn execute(session: &Session, args: &DeleteArgs, confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let options = session.options();
    let key = keys::compose(options.name(), &options.delim, &args.keys)?;

    let store = session.store()?;
    if !store.contains(&key)? {
        return Err(KvError::KeyNotFound(key));
    }

    if !confirm.confirm(&format!("Delete key '{}'? [y/N] ", key))? {
        return Ok(Output::Aborted);
    }

    store.delete(&key)?;
    Ok(Output::status(format!("deleted {}", key)))
}
