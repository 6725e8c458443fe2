use super::command_args;
use crate::cli::{Commands, SetArgs};
use crate::confirm::Confirm;
use crate::db::WriteOptions;
use crate::error::KvError;
use crate::keys;
use crate::output::Output;
use crate::session::Session;
use serde_json::Value;

pub fn handle(session: &Session, command: &Commands, _confirm: &mut dyn Confirm) -> Result<Output, KvError> {
    let args = command_args!(command, Set);
    execute(session, args)
}

pub fn execute(session: &Session, args: &SetArgs) -> Result<Output, KvError> {
    // Resolve everything from the arguments before the store sees any of it.
    let value = parse_value(args)?;
    let options = session.options();
    let key = keys::compose(options.name(), &options.delim, &args.keys)?;
    let write = WriteOptions {
        expire: args.expire,
        tag: args.tag.clone(),
    };

    let store = session.store()?;
    if args.add {
        store.add(&key, &value, &write)?;
        Ok(Output::status(format!("added {}{}", key, describe(&write))))
    } else {
        store.set(&key, &value, &write)?;
        Ok(Output::status(format!("set {}{}", key, describe(&write))))
    }
}

fn parse_value(args: &SetArgs) -> Result<Value, KvError> {
    match (&args.value, &args.json_value) {
        (Some(literal), _) => Ok(Value::String(literal.clone())),
        (None, Some(json)) => Ok(serde_json::from_str(json)?),
        (None, None) => Err(KvError::MissingValue),
    }
}

fn describe(write: &WriteOptions) -> String {
    let mut extra = String::new();
    if let Some(tag) = &write.tag {
        extra.push_str(&format!(" tag {}", tag));
    }
    if let Some(secs) = write.expire {
        extra.push_str(&format!(" expires in {}s", secs));
    }
    extra
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::open_session;
    use crate::session::SessionOptions;
    use serde_json::json;

    fn set_args(keys: &[&str]) -> SetArgs {
        SetArgs {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            value: None,
            json_value: None,
            add: false,
            expire: None,
            tag: None,
        }
    }

    #[test]
    fn test_set_literal_value() {
        let (_tmp, session) = open_session(Some("n"));
        let mut args = set_args(&["a", "b"]);
        args.value = Some("42".into());
        assert_eq!(execute(&session, &args).unwrap(), Output::status("set n:a:b"));
        let entry = session.store().unwrap().get("n:a:b").unwrap().unwrap();
        assert_eq!(entry.value, json!("42"));
    }

    #[test]
    fn test_set_json_value() {
        let (_tmp, session) = open_session(None);
        let mut args = set_args(&["k"]);
        args.json_value = Some(r#"{"a": [1, 2]}"#.into());
        args.tag = Some("t".into());
        execute(&session, &args).unwrap();
        let entry = session.store().unwrap().get("k").unwrap().unwrap();
        assert_eq!(entry.value, json!({"a": [1, 2]}));
        assert_eq!(entry.tag.as_deref(), Some("t"));
    }

    #[test]
    fn test_set_without_value_fails_before_store() {
        // no store is open: the argument check has to come first
        let session = Session::new(SessionOptions::default());
        let err = execute(&session, &set_args(&["k"])).unwrap_err();
        assert!(matches!(err, KvError::MissingValue));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_set_invalid_json() {
        let (_tmp, session) = open_session(None);
        let mut args = set_args(&["k"]);
        args.json_value = Some("{not json".into());
        assert!(matches!(execute(&session, &args), Err(KvError::InvalidJson(_))));
        assert!(session.store().unwrap().is_empty().unwrap());
    }

    #[test]
    fn test_add_does_not_overwrite() {
        let (_tmp, session) = open_session(None);
        let mut args = set_args(&["k"]);
        args.value = Some("first".into());
        args.add = true;
        assert_eq!(execute(&session, &args).unwrap(), Output::status("added k"));

        args.value = Some("second".into());
        assert!(matches!(execute(&session, &args), Err(KvError::KeyExists(_))));
        let entry = session.store().unwrap().get("k").unwrap().unwrap();
        assert_eq!(entry.value, json!("first"));
    }

    #[test]
    fn test_set_with_expire() {
        let (_tmp, session) = open_session(None);
        let mut args = set_args(&["k"]);
        args.value = Some("v".into());
        args.expire = Some(30.0);
        assert_eq!(
            execute(&session, &args).unwrap(),
            Output::status("set k expires in 30s")
        );
        let entry = session.store().unwrap().get("k").unwrap().unwrap();
        assert!(entry.expire_time.is_some());
    }
}
