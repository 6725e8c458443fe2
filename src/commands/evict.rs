use super::command_args;
use crate::cli::{Commands, EvictArgs};
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::output::Output;
use crate::session::Session;

pub fn handle(session: &Session, command: &Commands, _confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let args = command_args!(command, Evict);
    execute(session, args)
}

pub fn execute(session: &Session, args: &EvictArgs) -> Result<Output, KvError> {
    let removed = session.store()?.evict(&args.tag)?;
    tracing::debug!(tag = %args.tag, removed, "evicted entries");
    Ok(Output::Data(removed.into()))
}
