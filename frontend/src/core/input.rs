use std::fmt::Display;
use std::io;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("Parse failure: {0}")]
    Parse(String),
}

/// Where prompted lines come from. Swapped for a scripted source in tests.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<String, InputError>;
}

/// Typed prompts on top of a [`LineSource`]. All answers are trimmed.
pub struct Prompt<L: LineSource> {
    source: L,
}

impl<L: LineSource> Prompt<L> {
    pub fn new(source: L) -> Self {
        Self { source }
    }

    pub fn text(&mut self, prompt: &str) -> Result<String, InputError> {
        self.source.read_line(prompt).map(|s| s.trim().to_string())
    }

    pub fn number<T>(&mut self, prompt: &str) -> Result<T, InputError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let s = self.text(prompt)?;
        s.parse::<T>().map_err(|e| InputError::Parse(format!("'{s}': {e}")))
    }

    /// 1-based menu pick; `None` for 0 or anything outside `1..=len`.
    pub fn choice(&mut self, prompt: &str, len: usize) -> Option<usize> {
        match self.number::<usize>(prompt) {
            Ok(v) if v >= 1 && v <= len => Some(v - 1),
            _ => None,
        }
    }
}
