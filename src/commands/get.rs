use super::command_args;
use crate::cli::{Commands, GetArgs};
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::keys;
use crate::output::Output;
use crate::session::Session;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct Annotated {
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire_time: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<Option<String>>,
}

pub fn handle(session: &Session, command: &Commands, _confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let args = command_args!(command, Get);
    execute(session, args)
}

pub fn execute(session: &Session, args: &GetArgs) -> Result<Output, KvError> {
    let options = session.options();
    let key = keys::compose(options.name(), &options.delim, &args.keys)?;

    let entry = session.store()?.get(&key)?;
    let (value, expire_time, tag) = match entry {
        Some(entry) => (entry.value, entry.expire_time.map(|dt| dt.to_rfc3339()), entry.tag),
        None => {
            let fallback = args.default.clone().map(Value::String).unwrap_or(Value::Null);
            (fallback, None, None)
        }
    };

    if !args.expire_time && !args.tag {
        return Ok(Output::Data(value));
    }

    let annotated = Annotated {
        value,
        expire_time: args.expire_time.then_some(expire_time),
        tag: args.tag.then_some(tag),
    };
    Ok(Output::Data(serde_json::to_value(annotated)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::open_session;
    use crate::db::WriteOptions;
    use serde_json::json;

    fn get_args(keys: &[&str]) -> GetArgs {
        GetArgs {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            default: None,
            expire_time: false,
            tag: false,
        }
    }

    #[test]
    fn test_get_composes_key_with_name() {
        let (_tmp, session) = open_session(Some("cfg"));
        let store = session.store().unwrap();
        store.set("cfg:job:7", &json!({"retries": 3}), &WriteOptions::default()).unwrap();

        let output = execute(&session, &get_args(&["job", "7"])).unwrap();
        assert_eq!(output, Output::Data(json!({"retries": 3})));
    }

    #[test]
    fn test_get_missing_returns_default() {
        let (_tmp, session) = open_session(None);
        let mut args = get_args(&["nope"]);
        assert_eq!(execute(&session, &args).unwrap(), Output::Data(Value::Null));

        args.default = Some("fallback".into());
        assert_eq!(execute(&session, &args).unwrap(), Output::Data(json!("fallback")));
    }

    #[test]
    fn test_get_with_tag_and_expire_time() {
        let (_tmp, session) = open_session(None);
        let store = session.store().unwrap();
        let options = WriteOptions { expire: Some(3600.0), tag: Some("t1".into()) };
        store.set("k", &json!("v"), &options).unwrap();

        let mut args = get_args(&["k"]);
        args.tag = true;
        assert_eq!(
            execute(&session, &args).unwrap(),
            Output::Data(json!({"value": "v", "tag": "t1"}))
        );

        args.expire_time = true;
        match execute(&session, &args).unwrap() {
            Output::Data(value) => {
                assert_eq!(value["value"], json!("v"));
                assert!(value["expire_time"].is_string());
                assert_eq!(value["tag"], json!("t1"));
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_get_annotations_for_missing_key_are_null() {
        let (_tmp, session) = open_session(None);
        let mut args = get_args(&["nope"]);
        args.expire_time = true;
        assert_eq!(
            execute(&session, &args).unwrap(),
            Output::Data(json!({"value": null, "expire_time": null}))
        );
    }
}
