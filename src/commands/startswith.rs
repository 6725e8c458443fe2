use super::command_args;
use super::items::shape;
use crate::cli::{Commands, StartswithArgs};
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::keys;
use crate::output::Output;
use crate::session::Session;
use serde_json::Value;

pub fn handle(session: &Session, command: &Commands, _confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let args = command_args!(command, GetStartswith);
    execute(session, args)
}

/// Entries under a key prefix.
///
/// By default the last element must match whole (`job` matches `job:1`, not `jobs:1`);
/// `--match-part` drops that requirement. `--suffix-keys` reports keys with the
/// matched prefix removed, `--keys-only` drops the values and wins over `--as-dict`.
pub fn execute(session: &Session, args: &StartswithArgs) -> Result<Output, KvError> {
    let options = session.options();
    let prefix = keys::compose_prefix(options.name(), &options.delim, &args.keys, !args.match_part)?;

    let entries = session.store()?.starting_with(&prefix)?;
    tracing::debug!(prefix = %prefix, matches = entries.len(), "prefix query");

    let rekey = |key: String| -> String {
        if args.suffix_keys {
            keys::strip_prefix(&key, &prefix).to_string()
        } else {
            key
        }
    };

    if args.keys_only {
        let matched = entries
            .into_iter()
            .map(|entry| Value::String(rekey(entry.key)))
            .collect();
        return Ok(Output::Data(Value::Array(matched)));
    }

    let pairs = entries.into_iter().map(|entry| (rekey(entry.key), entry.value));
    Ok(Output::Data(shape(pairs, args.as_dict)))
}
