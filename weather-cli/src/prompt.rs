use inquire::{InquireError, Text};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    /// Ctrl-C, Esc, or input that can no longer be read.
    #[error("input interrupted")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Source of answers to interactive questions.
pub trait Prompter {
    /// Ask `message` and return the raw answer (untrimmed).
    fn ask(&mut self, message: &str) -> Result<String, PromptError>;
}

/// Terminal prompts backed by `inquire`.
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn ask(&mut self, message: &str) -> Result<String, PromptError> {
        // inquire draws its own prompt line, so blank lines before it go out separately.
        let leading = message.len() - message.trim_start_matches('\n').len();
        if leading > 0 {
            let mut stdout = io::stdout();
            write!(stdout, "{}", "\n".repeat(leading)).map_err(anyhow::Error::from)?;
            stdout.flush().map_err(anyhow::Error::from)?;
        }

        Text::new(message.trim()).prompt().map_err(|err| match err {
            InquireError::OperationInterrupted
            | InquireError::OperationCanceled
            | InquireError::NotTTY
            | InquireError::IO(_) => PromptError::Interrupted,
            other => PromptError::Other(other.into()),
        })
    }
}
