//! Terminal implementation of the conflict prompt.

use console::Term;
use dialoguer::Select;

use scriptsync_core::conflict::{Answer, Prompt};
use scriptsync_core::errors::PromptError;

/// Asks questions on the terminal with an arrow-key menu.
///
/// Pressing Esc or `q` dismisses the question.
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    /// Fails if stderr is not attached to a terminal.
    pub fn new() -> Result<Self, PromptError> {
        let term = Term::stderr();
        if !term.is_term() {
            return Err(PromptError::Unavailable(
                "stderr is not a terminal; pass --all to upload without asking".into(),
            ));
        }
        Ok(Self { term })
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&mut self, question: &str, options: &[Answer]) -> Result<Option<Answer>, PromptError> {
        let labels: Vec<&str> = options.iter().map(|a| a.label()).collect();
        let choice = Select::new()
            .with_prompt(question)
            .items(&labels)
            .default(0)
            .interact_on_opt(&self.term)
            .map_err(|e| {
                PromptError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?;

        Ok(choice.and_then(|idx| options.get(idx).copied()))
    }
}

/// A prompt for non-interactive runs: any question is an error.
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn ask(&mut self, question: &str, _options: &[Answer]) -> Result<Option<Answer>, PromptError> {
        Err(PromptError::Unavailable(format!(
            "cannot ask \"{question}\" without a terminal"
        )))
    }
}

/// Use the terminal when there is one, otherwise refuse to ask.
pub fn terminal_or_none() -> Box<dyn Prompt> {
    match TerminalPrompt::new() {
        Ok(prompt) => Box::new(prompt),
        Err(e) => {
            tracing::debug!(error = %e, "no terminal; questions will fail");
            Box::new(NoPrompt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_prompt_refuses() {
        let result = NoPrompt.ask("Upload?", &[Answer::Yes, Answer::No]);
        assert!(matches!(result, Err(PromptError::Unavailable(_))));
    }
}
