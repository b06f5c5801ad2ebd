//! Confirmation gate
//!
//! Decides whether an action may proceed. Routine actions are answered
//! automatically in auto-confirm mode. Sensitive actions (service restarts,
//! reboots) always ask the operator, whatever the mode, and a reboot
//! additionally runs a visible countdown that the operator can cancel.
//!
//! Prompting goes through the [`Prompter`] trait so the orchestrator can be
//! driven by deterministic answers in tests and dry runs.

use std::io::BufRead;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use inquire::Confirm;

use crate::config::RunConfiguration;
use crate::error::Result;
use crate::ui;

#[cfg(test)]
pub mod testing;

/// Seconds the operator has to cancel a confirmed reboot
pub const REBOOT_COUNTDOWN_SECS: u64 = 10;

/// How much an action can disrupt the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Package updates and cleanups; auto-confirmed unless interactive
    Routine,
    /// Service restarts and reboots; always asked
    Sensitive,
}

/// Source of operator answers
pub trait Prompter {
    /// Ask a yes/no question whose default answer is "no"
    fn ask(&self, question: &str) -> Result<bool>;

    /// Count down `seconds`, returning `false` if the operator cancelled
    fn countdown(&self, seconds: u64, message: &str) -> Result<bool>;
}

/// Prompts on the terminal with inquire
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn ask(&self, question: &str) -> Result<bool> {
        Ok(Confirm::new(question)
            .with_default(false)
            .with_help_message("Press 'y' to confirm, Enter to decline")
            .prompt()?)
    }

    fn countdown(&self, seconds: u64, message: &str) -> Result<bool> {
        let (tx, rx) = mpsc::channel();
        // The reader stays blocked on stdin after an elapsed countdown; the
        // reboot that follows is the last step of every plan.
        thread::spawn(move || {
            let mut line = String::new();
            if let Ok(n) = std::io::stdin().lock().read_line(&mut line) {
                if n > 0 {
                    let _ = tx.send(());
                }
            }
        });

        let bar = ui::countdown_bar(seconds);
        for remaining in (1..=seconds).rev() {
            bar.set_message(format!("{message} in {remaining}s - press Enter to cancel"));
            match rx.recv_timeout(Duration::from_secs(1)) {
                Ok(()) => {
                    bar.abandon_with_message("Cancelled");
                    return Ok(false);
                }
                Err(RecvTimeoutError::Timeout) => bar.inc(1),
                Err(RecvTimeoutError::Disconnected) => {
                    thread::sleep(Duration::from_secs(1));
                    bar.inc(1);
                }
            }
        }
        bar.finish_with_message(format!("{message} now"));
        Ok(true)
    }
}

/// Prompter for `--dry-run`: shows the question and answers yes
///
/// Nothing executes in a dry run, so affirmative answers only reveal the
/// commands that would follow.
#[derive(Debug, Default)]
pub struct DryRunPrompter;

impl Prompter for DryRunPrompter {
    fn ask(&self, question: &str) -> Result<bool> {
        println!("[DRY RUN] would ask: {question}");
        Ok(true)
    }

    fn countdown(&self, seconds: u64, message: &str) -> Result<bool> {
        println!("[DRY RUN] would count down {seconds}s: {message}");
        Ok(true)
    }
}

/// Applies the confirmation policy on top of a [`Prompter`]
pub struct ConfirmationGate<'a> {
    prompter: &'a dyn Prompter,
}

impl<'a> ConfirmationGate<'a> {
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        Self { prompter }
    }

    /// Whether an action of `kind` may proceed
    pub fn should_proceed(
        &self,
        kind: ActionKind,
        question: &str,
        config: &RunConfiguration,
    ) -> Result<bool> {
        match kind {
            ActionKind::Routine if config.auto_confirm => {
                tracing::debug!(question, "routine action auto-confirmed");
                Ok(true)
            }
            ActionKind::Routine | ActionKind::Sensitive => self.prompter.ask(question),
        }
    }

    /// Sensitive reboot prompt followed by the cancellable countdown
    pub fn confirm_reboot(&self, question: &str, config: &RunConfiguration) -> Result<bool> {
        if !self.should_proceed(ActionKind::Sensitive, question, config)? {
            return Ok(false);
        }
        self.prompter
            .countdown(REBOOT_COUNTDOWN_SECS, "Rebooting")
    }
}
