//! Colored terminal output for the interactive session

use commander_agent::{Command, ExecutionResult, Reporter};
use console::style;

/// Lines of command output shown after each run
const PREVIEW_LINES: usize = 10;

pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn status(&self, message: &str) {
        println!("{}", style(message).cyan());
    }

    fn warn(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), style(message).yellow());
    }

    fn command(&self, command: &Command) {
        println!("{} {}", style("$").green().bold(), style(command).bold());
    }

    fn executed(&self, _command: &Command, result: &ExecutionResult) {
        let header = if result.succeeded {
            style("ok".to_string()).green()
        } else {
            match (&result.spawn_error, result.exit_code) {
                (Some(err), _) => style(format!("could not start: {}", err)).red(),
                (None, Some(code)) => style(format!("exit status {}", code)).red(),
                (None, None) => style("terminated".to_string()).red(),
            }
        };
        println!("  {}", header);
        for line in preview(&result.combined_output) {
            println!("  {}", style(line).dim());
        }
    }
}

/// First lines of `output`, with a marker when lines were left out
fn preview(output: &str) -> Vec<String> {
    let total = output.lines().count();
    let mut lines: Vec<String> = output
        .lines()
        .take(PREVIEW_LINES)
        .map(str::to_string)
        .collect();
    if total > PREVIEW_LINES {
        lines.push(format!("... ({} more lines)", total - PREVIEW_LINES));
    }
    lines
}

pub fn answer(text: &str, rounds: usize) {
    println!();
    println!("{} {}", style("Commander:").green().bold(), text);
    let noun = if rounds == 1 { "round" } else { "rounds" };
    println!("{}", style(format!("({} {})", rounds, noun)).dim());
}

pub fn fatal(message: &str) {
    eprintln!("{} {}", style("error:").red().bold(), message);
}
