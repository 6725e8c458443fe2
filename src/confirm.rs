use crate::error::KvError;
use std::io::{self, BufRead, Write};

/// Asks the operator before a destructive operation runs.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool, KvError>;
}

/// Prompts on stderr and reads the answer from stdin.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool, KvError> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }
}

/// Answers queued up front, for tests and scripted use. Runs out as "no".
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: std::collections::VecDeque<String>,
    pub prompts: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool, KvError> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front().map(|a| is_affirmative(&a)).unwrap_or(false))
    }
}

/// `y` or `yes`, any case, surrounding whitespace ignored.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
