use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use rfp_eval::models::message::Message;

use super::{Input, InputType, Prompt};

const PROMPT: &str = "User > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Theme {
    Light,
    Dark,
}

impl Theme {
    fn bat_theme(&self) -> &'static str {
        match self {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }
}

pub struct RustylinePrompt {
    spinner: cliclack::ProgressBar,
    theme: Theme,
}

impl RustylinePrompt {
    pub fn new() -> Self {
        RustylinePrompt {
            spinner: spinner(),
            theme: Theme::Dark,
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Light => {
                println!("Switching to Dark theme");
                Theme::Dark
            }
            Theme::Dark => {
                println!("Switching to Light theme");
                Theme::Light
            }
        };
    }
}

/// Map a line typed by the user to what the session should do with it
pub fn parse_input(line: &str) -> Input {
    let text = line.trim();
    if text.is_empty() {
        Input::of(InputType::AskAgain)
    } else if text.eq_ignore_ascii_case("exit") {
        Input::of(InputType::Exit)
    } else if text.eq_ignore_ascii_case("reset") {
        Input::of(InputType::Reset)
    } else {
        Input::message(text)
    }
}

pub fn print_markdown(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if let Err(e) = printed {
        tracing::debug!("Falling back to plain output: {}", e);
        println!("{}", content);
    }
}

impl Prompt for RustylinePrompt {
    fn render(&mut self, message: &Message) {
        println!();
        println!("{}", style(format!("# {}:", message.author().to_uppercase())).bold());
        print_markdown(message.text(), self.theme.bat_theme());
        println!();
        let _ = io::stdout().flush();
    }

    fn notify(&mut self, text: &str) {
        println!("{}", style(text).dim());
    }

    fn get_input(&mut self) -> Result<Input> {
        let mut editor = rustyline::DefaultEditor::new()?;
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(e) => {
                match e {
                    rustyline::error::ReadlineError::Interrupted
                    | rustyline::error::ReadlineError::Eof => (),
                    _ => eprintln!("Input error: {}", e),
                }
                return Ok(Input::of(InputType::Exit));
            }
        };

        let text = line.trim();
        if text.eq_ignore_ascii_case("/t") {
            self.toggle_theme();
            return Ok(Input::of(InputType::AskAgain));
        }
        if text.eq_ignore_ascii_case("/?") || text.eq_ignore_ascii_case("/help") {
            println!("Commands:");
            println!("exit - Exit the session");
            println!("reset - Start the conversation over");
            println!("/t - Toggle Light/Dark theme");
            println!("/? | /help - Display this help message");
            println!("Ctrl+C - Interrupt the agents (keeps the replies received so far)");
            return Ok(Input::of(InputType::AskAgain));
        }
        Ok(parse_input(text))
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start("Agents are evaluating...");
    }

    fn hide_busy(&self) {
        self.spinner.stop("");
    }

    fn close(&self) {
        // No cleanup required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("   ").input_type, InputType::AskAgain);
        assert_eq!(parse_input("exit").input_type, InputType::Exit);
        assert_eq!(parse_input(" EXIT ").input_type, InputType::Exit);
        assert_eq!(parse_input("reset").input_type, InputType::Reset);
        assert_eq!(
            parse_input("  Any compliance issues? "),
            Input::message("Any compliance issues?")
        );
        // only the bare commands are commands
        assert_eq!(parse_input("exit strategy?").input_type, InputType::Message);
    }
}
