use crate::cli::{Cli, Commands, BIN_NAME};
use crate::commands::Dispatcher;
use crate::confirm::Confirm;
use crate::error::KvError;
use crate::output;
use crate::session::Session;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::io;
use std::path::PathBuf;

pub const PROMPT: &str = "shardkv> ";
pub const FAREWELL: &str = "bye";
pub const QUIT_TOKENS: [&str; 4] = ["quit", "exit", "q", "\\q"];
pub const HISTORY_ENV: &str = "SHARDKV_HISTORY";

#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    Line(String),
    Interrupted,
    Eof,
}

/// Where interactive lines come from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<LineEvent, KvError>;

    fn add_history(&mut self, _line: &str) {}

    /// Called once when the loop ends, however it ends.
    fn close(&mut self) {}
}

/// Line editor with history recall, persisted between runs.
pub struct Editor {
    editor: DefaultEditor,
    history: Option<PathBuf>,
}

impl Editor {
    pub fn new(history: Option<PathBuf>) -> rustyline::Result<Self> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &history {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            // first run: nothing to load yet
            if editor.load_history(path).is_err() {
                tracing::debug!(path = %path.display(), "no history loaded");
            }
        }
        Ok(Self { editor, history })
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<LineEvent, KvError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(LineEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(LineEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(LineEvent::Eof),
            Err(ReadlineError::Io(err)) => Err(KvError::Io(err)),
            Err(err) => Err(KvError::Io(io::Error::other(err.to_string()))),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn close(&mut self) {
        if let Some(path) = &self.history {
            if let Err(err) = self.editor.save_history(path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to save history");
            }
        }
    }
}

/// `$SHARDKV_HISTORY`, else `<config dir>/shardkv/history.txt`.
pub fn history_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(HISTORY_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(BIN_NAME).join("history.txt"))
}

/// What the loop does after a line.
#[derive(Debug)]
pub enum Step {
    Continue,
    Quit,
    Fatal(KvError),
}

/// Handle one interactive line: quit, skip, or parse it with the one-shot grammar,
/// fold its session options into `session`, open the store and dispatch.
pub fn handle_line(
    line: &str,
    session: &mut Session,
    dispatcher: &Dispatcher,
    confirm: &mut dyn Confirm,
) -> Step {
    let line = line.trim();
    if QUIT_TOKENS.contains(&line) {
        return Step::Quit;
    }

    let Some(tokens) = shlex::split(line) else {
        return fail(KvError::InvalidInput("unbalanced quotes".into()));
    };
    if tokens.is_empty() {
        return Step::Continue;
    }

    let cli = match Cli::try_parse_from(std::iter::once(BIN_NAME.to_string()).chain(tokens)) {
        Ok(cli) => cli,
        Err(err) => {
            // help, version and usage errors all end up here; none of them end the session
            let _ = err.print();
            return Step::Continue;
        }
    };

    session.with_overrides(&cli.globals);
    execute(session, cli.command.as_ref(), dispatcher, confirm)
}

fn execute(
    session: &mut Session,
    command: Option<&Commands>,
    dispatcher: &Dispatcher,
    confirm: &mut dyn Confirm,
) -> Step {
    if let Err(err) = session.open() {
        return fail(err);
    }
    let Some(command) = command else {
        return Step::Continue;
    };

    let result = dispatcher
        .dispatch(session, command, confirm)
        .and_then(|out| output::render(&out).map_err(KvError::from));
    match result {
        Ok(()) => Step::Continue,
        Err(err) => fail(err),
    }
}

fn fail(err: KvError) -> Step {
    if err.is_fatal() {
        return Step::Fatal(err);
    }
    eprintln!("error: {}", err);
    Step::Continue
}

/// Run the interactive loop until a quit token, an interrupt or end of input.
/// A store failure ends the loop with that error.
pub fn run(
    source: &mut dyn LineSource,
    session: &mut Session,
    dispatcher: &Dispatcher,
    confirm: &mut dyn Confirm,
) -> Result<(), KvError> {
    let result = run_lines(source, session, dispatcher, confirm);
    source.close();
    if result.is_ok() {
        println!("{}", FAREWELL);
    }
    result
}

fn run_lines(
    source: &mut dyn LineSource,
    session: &mut Session,
    dispatcher: &Dispatcher,
    confirm: &mut dyn Confirm,
) -> Result<(), KvError> {
    loop {
        let line = match source.read_line(PROMPT)? {
            LineEvent::Line(line) => line,
            LineEvent::Interrupted | LineEvent::Eof => return Ok(()),
        };
        if !line.trim().is_empty() {
            source.add_history(&line);
        }

        match handle_line(&line, session, dispatcher, confirm) {
            Step::Continue => {}
            Step::Quit => return Ok(()),
            Step::Fatal(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GlobalArgs;
    use crate::confirm::ScriptedConfirm;
    use crate::session::SessionOptions;
    use serde_json::json;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    struct ScriptedLines {
        events: VecDeque<LineEvent>,
        history: Vec<String>,
        closed: bool,
    }

    impl ScriptedLines {
        fn new(lines: &[&str]) -> Self {
            Self {
                events: lines.iter().map(|l| LineEvent::Line(l.to_string())).collect(),
                history: Vec::new(),
                closed: false,
            }
        }
    }

    impl LineSource for ScriptedLines {
        fn read_line(&mut self, _prompt: &str) -> Result<LineEvent, KvError> {
            Ok(self.events.pop_front().unwrap_or(LineEvent::Eof))
        }

        fn add_history(&mut self, line: &str) {
            self.history.push(line.to_string());
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn fresh() -> (Session, Dispatcher, ScriptedConfirm) {
        (
            Session::new(SessionOptions::default()),
            Dispatcher::new().unwrap(),
            ScriptedConfirm::default(),
        )
    }

    #[test]
    fn test_empty_line_is_idle() {
        let (mut session, dispatcher, mut confirm) = fresh();
        let before = session.options().clone();
        for line in ["", "   ", "\t"] {
            assert!(matches!(
                handle_line(line, &mut session, &dispatcher, &mut confirm),
                Step::Continue
            ));
        }
        assert_eq!(session.options(), &before);
        assert!(!session.is_open());
    }

    #[test]
    fn test_quit_tokens() {
        let (mut session, dispatcher, mut confirm) = fresh();
        for token in QUIT_TOKENS {
            assert!(matches!(
                handle_line(token, &mut session, &dispatcher, &mut confirm),
                Step::Quit
            ));
        }
        assert!(matches!(
            handle_line("  quit  ", &mut session, &dispatcher, &mut confirm),
            Step::Quit
        ));
    }

    #[test]
    fn test_help_does_not_end_session() {
        let (mut session, dispatcher, mut confirm) = fresh();
        for line in ["--help", "get --help", "nonsense", "get"] {
            assert!(matches!(
                handle_line(line, &mut session, &dispatcher, &mut confirm),
                Step::Continue
            ));
        }
        assert!(!session.is_open());
    }

    #[test]
    fn test_unbalanced_quotes_continue() {
        let (mut session, dispatcher, mut confirm) = fresh();
        assert!(matches!(
            handle_line("get \"open", &mut session, &dispatcher, &mut confirm),
            Step::Continue
        ));
    }

    #[test]
    fn test_command_without_store_is_not_fatal() {
        let (mut session, dispatcher, mut confirm) = fresh();
        assert!(matches!(
            handle_line("volume", &mut session, &dispatcher, &mut confirm),
            Step::Continue
        ));
    }

    #[test]
    fn test_store_path_is_inherited() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        let (mut session, dispatcher, mut confirm) = fresh();

        let line = format!("--cache '{}' set a --json-value 1", root.display());
        assert!(matches!(
            handle_line(&line, &mut session, &dispatcher, &mut confirm),
            Step::Continue
        ));
        assert!(matches!(
            handle_line("set b --value two", &mut session, &dispatcher, &mut confirm),
            Step::Continue
        ));

        assert_eq!(session.options().cache.as_deref(), Some(root.as_path()));
        let store = session.store().unwrap();
        assert_eq!(store.root(), root.as_path());
        assert_eq!(store.get("a").unwrap().unwrap().value, json!(1));
        assert_eq!(store.get("b").unwrap().unwrap().value, json!("two"));
    }

    #[test]
    fn test_option_overrides_apply_to_later_lines() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        let mut session = Session::from_args(&GlobalArgs {
            cache: Some(root),
            ..GlobalArgs::default()
        });
        let dispatcher = Dispatcher::new().unwrap();
        let mut confirm = ScriptedConfirm::default();

        handle_line("--name app --delim /", &mut session, &dispatcher, &mut confirm);
        handle_line("set x y --value z", &mut session, &dispatcher, &mut confirm);
        handle_line("--shards 3 set w --value v", &mut session, &dispatcher, &mut confirm);

        let store = session.store().unwrap();
        assert!(store.get("app/x/y").unwrap().is_some());
        assert!(store.get("app/w").unwrap().is_some());
        assert_eq!(store.shard_count(), 8);
    }

    #[test]
    fn test_store_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let (mut session, dispatcher, mut confirm) = fresh();

        let line = format!("--cache '{}' volume", blocker.display());
        assert!(matches!(
            handle_line(&line, &mut session, &dispatcher, &mut confirm),
            Step::Fatal(_)
        ));
    }

    #[test]
    fn test_run_until_quit() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        let (mut session, dispatcher, mut confirm) = fresh();
        let first = format!("--cache '{}' set k --value v", root.display());
        let mut lines = ScriptedLines::new(&[first.as_str(), "", "quit", "set never --value x"]);

        run(&mut lines, &mut session, &dispatcher, &mut confirm).unwrap();

        assert!(lines.closed);
        assert_eq!(lines.history, vec![first, "quit".to_string()]);
        let store = session.store().unwrap();
        assert!(store.get("k").unwrap().is_some());
        assert!(store.get("never").unwrap().is_none());
    }

    #[test]
    fn test_run_interrupt_ends_cleanly() {
        let (mut session, dispatcher, mut confirm) = fresh();
        let mut lines = ScriptedLines {
            events: VecDeque::from([LineEvent::Interrupted, LineEvent::Line("volume".into())]),
            history: Vec::new(),
            closed: false,
        };
        assert!(run(&mut lines, &mut session, &dispatcher, &mut confirm).is_ok());
        assert_eq!(lines.events.len(), 1);
    }

    #[test]
    fn test_run_stops_on_fatal() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let (mut session, dispatcher, mut confirm) = fresh();
        let line = format!("--cache '{}' items", blocker.display());
        let mut lines = ScriptedLines::new(&[line.as_str(), "quit"]);

        let result = run(&mut lines, &mut session, &dispatcher, &mut confirm);
        assert!(result.unwrap_err().is_fatal());
        assert!(lines.closed);
    }
}
