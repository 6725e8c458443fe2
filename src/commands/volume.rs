use crate::cli::Commands;
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::output::{format_size, Output};
use crate::session::Session;

pub fn handle(session: &Session, _command: &Commands, _confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    execute(session)
}

pub fn execute(session: &Session) -> Result<Output, KvError> {
    let store = session.store()?;
    let bytes = store.volume()?;
    Ok(Output::Lines(vec![format!(
        "{} bytes ({}) in {} shards",
        bytes,
        format_size(bytes),
        store.shard_count()
    )]))
}
