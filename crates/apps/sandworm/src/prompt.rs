//! Terminal prompter for setup

use claude::{Prompter, SelectableItem};
use dialoguer::{Input, Select};

/// Prompts on the controlling terminal
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn session_key(&mut self, help: &str) -> anyhow::Result<String> {
        println!("\n{}\n", help);
        let key: String = Input::new()
            .with_prompt("Enter your session key")
            .interact_text()?;
        Ok(key)
    }

    fn select(&mut self, prompt: &str, items: &[SelectableItem<'_>]) -> anyhow::Result<usize> {
        let names: Vec<&str> = items.iter().map(|item| item.display_name()).collect();
        println!();
        let selection = Select::new()
            .with_prompt(prompt)
            .items(&names)
            .default(0)
            .interact()?;
        Ok(selection)
    }

    fn notify(&mut self, message: &str) {
        println!("\n{}", message);
    }
}
