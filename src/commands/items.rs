use super::command_args;
use crate::cli::{Commands, ItemsArgs};
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::output::Output;
use crate::session::Session;
use serde_json::{Map, Value};

pub fn handle(session: &Session, command: &Commands, _confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let args = command_args!(command, Items);
    execute(session, args)
}

pub fn execute(session: &Session, args: &ItemsArgs) -> Result<Output, KvError> {
    let store = session.store()?;

    if args.count {
        return Ok(Output::Data(store.len()?.into()));
    }

    let entries = store.items()?;
    let pairs = entries.into_iter().map(|entry| (entry.key, entry.value));
    Ok(Output::Data(shape(pairs, args.as_dict)))
}

/// Key/value pairs as a JSON object, or as an array of `[key, value]` pairs.
pub(crate) fn shape(pairs: impl Iterator<Item = (String, Value)>, as_dict: bool) -> Value {
    if as_dict {
        Value::Object(pairs.collect::<Map<String, Value>>())
    } else {
        Value::Array(
            pairs
                .map(|(key, value)| Value::Array(vec![Value::String(key), value]))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::open_session;
    use crate::db::WriteOptions;
    use serde_json::json;

    fn seeded() -> (tempfile::TempDir, Session) {
        let (tmp, session) = open_session(None);
        let store = session.store().unwrap();
        store.set("b", &json!(2), &WriteOptions::default()).unwrap();
        store.set("a", &json!("one"), &WriteOptions::default()).unwrap();
        (tmp, session)
    }

    #[test]
    fn test_items_as_pairs() {
        let (_tmp, session) = seeded();
        let output = execute(&session, &ItemsArgs { as_dict: false, count: false }).unwrap();
        assert_eq!(output, Output::Data(json!([["a", "one"], ["b", 2]])));
    }

    #[test]
    fn test_items_as_dict() {
        let (_tmp, session) = seeded();
        let output = execute(&session, &ItemsArgs { as_dict: true, count: false }).unwrap();
        assert_eq!(output, Output::Data(json!({"a": "one", "b": 2})));
    }

    #[test]
    fn test_items_count() {
        let (_tmp, session) = seeded();
        let output = execute(&session, &ItemsArgs { as_dict: true, count: true }).unwrap();
        assert_eq!(output, Output::Data(json!(2)));
    }
}
