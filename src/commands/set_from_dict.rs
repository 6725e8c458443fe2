use super::command_args;
use crate::cli::{Commands, SetFromDictArgs};
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::keys;
use crate::output::Output;
use crate::session::Session;
use serde_json::Value;
use std::fs;

pub fn handle(session: &Session, command: &Commands, _confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let args = command_args!(command, SetFromDict);
    execute(session, args)
}

/// Write one entry per top-level field of a JSON object file. The file is read and
/// validated in full before anything is written; nested values are stored as-is.
pub fn execute(session: &Session, args: &SetFromDictArgs) -> Result<Output, KvError> {
    let text = fs::read_to_string(&args.path).map_err(|source| KvError::InputFile {
        path: args.path.clone(),
        source,
    })?;
    let document: Value = serde_json::from_str(&text)?;
    let fields = match document {
        Value::Object(fields) => fields,
        other => {
            return Err(KvError::NotAnObject {
                path: args.path.clone(),
                found: json_kind(&other),
            })
        }
    };

    let options = session.options();
    let pairs = fields
        .into_iter()
        .map(|(field, value)| -> Result<(String, Value), KvError> {
            let key = keys::compose(options.name(), &options.delim, &[field])?;
            Ok((key, value))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let result = session.store()?.set_from_dict(&pairs, args.add)?;

    let mut message = format!("wrote {} keys from {}", result.written, args.path.display());
    if result.skipped > 0 {
        message.push_str(&format!(" ({} existing skipped)", result.skipped));
    }
    Ok(Output::status(message))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
