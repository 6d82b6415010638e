mod calc_engine;
mod format;
mod keypad;
mod logging;

#[cfg(feature = "line")]
mod line_mode;
#[cfg(feature = "tui")]
mod render_help;
#[cfg(feature = "tui")]
mod tui_mode;

use anyhow::Result;
use calc_engine::{evaluate, evaluate_traced, EvaluationTrace};
use clap::{Parser, Subcommand};
use format::format_result;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "keypadcalc", version, about = "Keypad-style terminal calculator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Show each operator application after a calculation
    #[arg(long, global = true)]
    details: bool,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Full-screen keypad
    #[cfg(feature = "tui")]
    Tui,
    /// Line-by-line keypad in the current terminal
    #[cfg(feature = "line")]
    Line,
    /// Evaluate one expression and print the result
    Eval { expression: String },
}

fn main() -> Result<ExitCode> {
    let Cli { command, details, log_file } = Cli::parse();

    match command {
        Some(Command::Eval { expression }) => {
            logging::init_stderr();
            Ok(run_eval(&expression, details))
        }
        #[cfg(feature = "tui")]
        Some(Command::Tui) => {
            logging::init_file(log_file.as_deref())?;
            tui_mode::run_tui(details)?;
            Ok(ExitCode::SUCCESS)
        }
        #[cfg(feature = "line")]
        Some(Command::Line) => {
            logging::init_file(log_file.as_deref())?;
            line_mode::run_line(details)?;
            Ok(ExitCode::SUCCESS)
        }
        None => run_default(details, log_file.as_deref()),
    }
}

#[cfg(feature = "tui")]
fn run_default(details: bool, log_file: Option<&Path>) -> Result<ExitCode> {
    logging::init_file(log_file)?;
    tui_mode::run_tui(details)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(all(feature = "line", not(feature = "tui")))]
fn run_default(details: bool, log_file: Option<&Path>) -> Result<ExitCode> {
    logging::init_file(log_file)?;
    line_mode::run_line(details)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(any(feature = "tui", feature = "line")))]
fn run_default(_details: bool, _log_file: Option<&Path>) -> Result<ExitCode> {
    anyhow::bail!("no interactive front-end compiled in; use `keypadcalc eval <EXPR>`")
}

fn run_eval(expression: &str, details: bool) -> ExitCode {
    let (output, success) = eval_report(expression, details);
    println!("{}", output);
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Text printed by `eval` and whether the expression produced a finite value.
fn eval_report(expression: &str, details: bool) -> (String, bool) {
    let mut trace = EvaluationTrace::new(details);
    let result = if details {
        evaluate_traced(expression, &mut trace)
    } else {
        evaluate(expression)
    };

    match result {
        Ok(value) if value.is_finite() => {
            let mut output = format_result(value);
            for (i, step) in trace.steps.iter().enumerate() {
                output.push_str(&format!(
                    "\n  Step {}: {} = {}",
                    i + 1,
                    step.operation,
                    format_result(step.result)
                ));
            }
            (output, true)
        }
        _ => ("Error".to_string(), false),
    }
}
