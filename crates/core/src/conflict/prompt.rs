//! The interactive prompt contract.
//!
//! The resolver only needs one capability from its host: show a question
//! with an ordered list of options and report which option the operator
//! picked, or `None` if the question was dismissed.

use std::fmt;

use crate::errors::PromptError;

/// An option offered to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Answer {
    Yes,
    No,
    /// Approve this script and every remaining script of the batch.
    All,
    /// Reject this script and every remaining script of the batch.
    SkipAll,
    /// Approve now and remember the choice.
    Always,
    /// Reject now and remember the choice.
    Never,
}

impl Answer {
    /// The label shown to the operator.
    pub fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::All => "All",
            Self::SkipAll => "None",
            Self::Always => "Always",
            Self::Never => "Never",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Options for a plain yes/no question.
pub const YES_NO: &[Answer] = &[Answer::Yes, Answer::No];

/// Options for a question that can short-circuit the rest of a batch.
pub const YES_NO_ALL_NONE: &[Answer] = &[Answer::Yes, Answer::No, Answer::All, Answer::SkipAll];

/// Options for the upload-on-save question.
pub const YES_NO_ALWAYS_NEVER: &[Answer] =
    &[Answer::Yes, Answer::No, Answer::Always, Answer::Never];

/// A host capable of asking the operator a question.
///
/// Implementations block until the operator answers. Returning `Ok(None)`
/// means the question was dismissed; an `Err` means the channel itself is
/// broken and is propagated to the caller unchanged.
pub trait Prompt {
    fn ask(&mut self, question: &str, options: &[Answer]) -> Result<Option<Answer>, PromptError>;
}

impl<P: Prompt + ?Sized> Prompt for &mut P {
    fn ask(&mut self, question: &str, options: &[Answer]) -> Result<Option<Answer>, PromptError> {
        (**self).ask(question, options)
    }
}

impl<P: Prompt + ?Sized> Prompt for Box<P> {
    fn ask(&mut self, question: &str, options: &[Answer]) -> Result<Option<Answer>, PromptError> {
        (**self).ask(question, options)
    }
}

/// Ask through `prompt`, rejecting answers that were not offered.
pub(crate) fn ask_checked<P: Prompt + ?Sized>(
    prompt: &mut P,
    question: &str,
    options: &[Answer],
) -> Result<Option<Answer>, PromptError> {
    match prompt.ask(question, options)? {
        Some(a) if !options.contains(&a) => Err(PromptError::UnexpectedAnswer {
            question: question.to_string(),
            answer: a.label().to_string(),
        }),
        other => Ok(other),
    }
}
