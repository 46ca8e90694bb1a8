//! Terminal implementations of the executor callbacks.

use anyhow::{Context, Result};
use colored::Colorize;
use reconcile::{Action, ApplyResult, ConfirmCallback, ProgressCallback};

use crate::ui;

/// Prints one line per plan entry as it runs
#[derive(Default)]
pub struct TerminalProgress {
    total: usize,
    current: usize,
}

impl ProgressCallback for TerminalProgress {
    fn on_start(&mut self, count: usize) {
        self.total = count;
        self.current = 0;
        println!();
    }

    fn on_change_start(&mut self, address: &str, action: &Action) {
        self.current += 1;
        let verb = match action {
            Action::Create => "Creating",
            Action::Update => "Updating",
            Action::Replace { .. } => "Replacing",
            Action::Delete => "Destroying",
            Action::NoChange => "Checking",
        };
        ui::step(self.current, self.total, &format!("{verb} {address}"));
    }

    fn on_change_complete(&mut self, address: &str, result: &ApplyResult) {
        match result {
            ApplyResult::Failed { error } => {
                println!("    {} {}: {}", "✗".red(), address, error);
            }
            ApplyResult::Skipped { reason } => {
                println!("    {} {}", "-".dimmed(), reason.dimmed());
            }
            ApplyResult::NoChange => {}
            _ => println!("    {} done", "✓".green()),
        }
    }

    fn on_finish(&mut self) {}
}

/// Asks through dialoguer
pub struct TerminalConfirm;

impl ConfirmCallback for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        println!();
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Failed to read confirmation")
    }
}
