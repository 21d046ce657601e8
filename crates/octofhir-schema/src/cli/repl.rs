//! REPL implementation

use super::filter::describe;
use super::output;
use crate::ast::AllowSigns;
use crate::{parse_field_path, parse_filter};
use anyhow::Result;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// REPL state
#[derive(Debug, Default)]
pub struct ReplState {
    /// Print the JSON AST instead of canonical text
    pub json: bool,
}

/// What the REPL should do after a line
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Print(String),
    Error(String),
    Quit,
}

impl ReplState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one trimmed, non-empty input line
    pub fn handle(&mut self, line: &str) -> Reply {
        if line.starts_with(':') {
            return self.command(line);
        }
        match parse_filter(line) {
            Ok(expr) if self.json => match serde_json::to_string_pretty(&describe(&expr)) {
                Ok(text) => Reply::Print(text),
                Err(e) => Reply::Error(e.to_string()),
            },
            Ok(expr) => Reply::Print(expr.to_string()),
            Err(err) => Reply::Error(err.render()),
        }
    }

    fn command(&mut self, line: &str) -> Reply {
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match command {
            ":help" | ":h" => Reply::Print(HELP.to_string()),
            ":quit" | ":q" | ":exit" => Reply::Quit,
            ":json" => {
                self.json = !self.json;
                Reply::Print(format!("JSON output {}", if self.json { "on" } else { "off" }))
            }
            ":path" => {
                let (allow, text) = match rest.trim().split_once(char::is_whitespace) {
                    Some(("first", text)) => (AllowSigns::First, text),
                    Some(("each", text)) => (AllowSigns::Each, text),
                    Some(("never", text)) => (AllowSigns::Never, text),
                    _ => (AllowSigns::Never, rest),
                };
                match parse_field_path(text.trim(), allow) {
                    Ok(path) => Reply::Print(path.to_string()),
                    Err(err) => Reply::Error(err.render()),
                }
            }
            other => Reply::Error(format!("Unknown command: {other} (try :help)")),
        }
    }
}

const HELP: &str = "\
Enter a filter expression to parse it, e.g. name = 'Ann' and age >= 18

Commands:
  :path [never|first|each] <path>   parse a sortable field path
  :json                             toggle JSON AST output
  :help                             show this help
  :quit                             exit";

/// Run the interactive REPL
pub fn run() -> Result<()> {
    println!("{}", "Schema filter REPL".cyan().bold());
    println!("Type {} for help, {} to quit", ":help".green(), ":quit".green());
    println!();

    let mut state = ReplState::new();
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                match state.handle(line) {
                    Reply::Print(text) => println!("{}", text.green()),
                    Reply::Error(text) => eprintln!("{}", output::format_error(&anyhow::anyhow!(text))),
                    Reply::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("a=1 OR b=2", Reply::Print("a = 1 or b = 2".into()))]
    #[case(":path first -createdAt", Reply::Print("-createdAt".into()))]
    #[case(":path each +a.-b", Reply::Print("+a.-b".into()))]
    #[case(":q", Reply::Quit)]
    fn test_handle(#[case] line: &str, #[case] expected: Reply) {
        assert_eq!(ReplState::new().handle(line), expected);
    }

    #[test]
    fn test_errors_and_json_toggle() {
        let mut state = ReplState::new();
        assert!(matches!(state.handle("a ="), Reply::Error(_)));
        assert!(matches!(state.handle(":path -a"), Reply::Error(_)));
        assert!(matches!(state.handle(":nope"), Reply::Error(_)));

        state.handle(":json");
        let Reply::Print(text) = state.handle("a = 1") else {
            panic!("expected output");
        };
        assert!(text.contains("\"fields\""));
    }
}
