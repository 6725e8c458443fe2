use crate::cli::Commands;
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::output::Output;
use crate::session::Session;

pub fn handle(session: &Session, _command: &Commands, _confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    execute(session)
}

pub fn execute(session: &Session) -> Result<Output, KvError> {
    let removed = session.store()?.expire()?;
    tracing::debug!(removed, "expired entries");
    Ok(Output::Data(removed.into()))
}
