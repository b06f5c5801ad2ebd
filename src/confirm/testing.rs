//! Deterministic prompter for tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::Prompter;
use crate::error::Result;

/// Answers questions from a queue, falling back to a fixed default
#[derive(Debug)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<bool>>,
    default_answer: bool,
    countdown_elapses: bool,
    questions: RefCell<Vec<String>>,
    countdowns: Cell<usize>,
}

impl ScriptedPrompter {
    fn with_default(default_answer: bool) -> Self {
        Self {
            answers: RefCell::new(VecDeque::new()),
            default_answer,
            countdown_elapses: true,
            questions: RefCell::new(Vec::new()),
            countdowns: Cell::new(0),
        }
    }

    pub fn always_yes() -> Self {
        Self::with_default(true)
    }

    pub fn always_no() -> Self {
        Self::with_default(false)
    }

    /// Answer the next questions in order before using the default
    pub fn answers(self, answers: &[bool]) -> Self {
        self.answers.borrow_mut().extend(answers.iter().copied());
        self
    }

    /// Operator presses Enter during every countdown
    pub fn cancel_countdown(mut self) -> Self {
        self.countdown_elapses = false;
        self
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }

    pub fn countdowns(&self) -> usize {
        self.countdowns.get()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, question: &str) -> Result<bool> {
        self.questions.borrow_mut().push(question.to_string());
        Ok(self
            .answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.default_answer))
    }

    fn countdown(&self, _seconds: u64, _message: &str) -> Result<bool> {
        self.countdowns.set(self.countdowns.get() + 1);
        Ok(self.countdown_elapses)
    }
}
