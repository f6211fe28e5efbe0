//! tally - command-line calculation notepad
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log filter (default: warn); logs go to stderr

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tallypad::prelude::*;
use tallypad::{DateFormat, Variable};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about = "Calculation notepad: numbers with units, money, dates and variables")]
struct Cli {
    #[command(flatten)]
    display: DisplayArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a notepad file and print every line with its result
    Eval {
        /// Notepad file, one expression or assignment per line
        input: PathBuf,
    },

    /// Evaluate a single expression
    Expr {
        /// Expression text, e.g. "20% of $150"
        expression: String,
    },

    /// Read lines from stdin and print each result
    ///
    /// `:vars` lists the variables, `:del <name>` deletes one, `:quit` exits.
    Repl,
}

#[derive(Args)]
struct DisplayArgs {
    /// Decimal places shown
    #[arg(long, global = true)]
    precision: Option<usize>,

    /// Number notation
    #[arg(long, global = true, value_enum)]
    notation: Option<NotationArg>,

    /// Show quantities in SI base units
    #[arg(long, global = true)]
    prefer_base_unit: bool,

    /// Date rendering
    #[arg(long, global = true, value_enum)]
    date_format: Option<DateFormatArg>,

    /// Longest list a range may produce
    #[arg(long, global = true)]
    max_range: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum NotationArg {
    Standard,
    Scientific,
    Engineering,
}

#[derive(Clone, Copy, ValueEnum)]
enum DateFormatArg {
    Iso,
    Locale,
}

impl DisplayArgs {
    fn engine_options(&self) -> EngineOptions {
        let mut options = EngineOptions::default();
        if let Some(precision) = self.precision {
            options.display.precision = precision;
        }
        if let Some(notation) = self.notation {
            options.display.notation = match notation {
                NotationArg::Standard => Notation::Standard,
                NotationArg::Scientific => Notation::Scientific,
                NotationArg::Engineering => Notation::Engineering,
            };
        }
        if let Some(format) = self.date_format {
            options.display.date_format = match format {
                DateFormatArg::Iso => DateFormat::Iso,
                DateFormatArg::Locale => DateFormat::Locale,
            };
        }
        options.display.prefer_base_unit = self.prefer_base_unit;
        if let Some(max) = self.max_range {
            options.max_range_elements = max;
        }
        options
    }
}

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let options = cli.display.engine_options();
    debug!(?options, "engine options");

    match cli.command {
        Commands::Eval { input } => eval_file(&input, options),
        Commands::Expr { expression } => eval_expression(&expression, options),
        Commands::Repl => repl(options),
    }
}

fn render(outcome: &LineOutcome, options: &EngineOptions) -> Option<String> {
    outcome
        .value
        .as_ref()
        .map(|value| value.to_display(&options.display))
}

fn eval_file(input: &PathBuf, options: EngineOptions) -> Result<()> {
    let doc = Document::open(input, options.clone())
        .with_context(|| format!("Failed to open '{}'", input.display()))?;
    info!(path = %input.display(), lines = doc.lines().len(), "evaluated");

    let width = doc
        .outcomes()
        .iter()
        .filter(|o| o.value.is_some())
        .map(|o| o.text.trim_end().chars().count())
        .max()
        .unwrap_or(0);

    let mut out = io::stdout().lock();
    for outcome in doc.outcomes() {
        let text = outcome.text.trim_end();
        let written = match render(outcome, &options) {
            Some(result) => writeln!(out, "{:<width$}  = {}", text, result, width = width),
            None => writeln!(out, "{}", text),
        };
        written.context("Failed to write to stdout")?;
    }
    Ok(())
}

fn eval_expression(expression: &str, options: EngineOptions) -> Result<()> {
    let store = VariableStore::with_options(options.clone());
    let value = store.evaluate(expression);
    if let Value::Error(e) = &value {
        bail!("{}", e.describe());
    }
    println!("{}", value.to_display(&options.display));
    Ok(())
}

fn print_variables(out: &mut impl Write, variables: &[Variable], options: &EngineOptions) -> io::Result<()> {
    if variables.is_empty() {
        return writeln!(out, "(no variables)");
    }
    for var in variables {
        writeln!(
            out,
            "{} = {}  ({})",
            var.name,
            var.value.to_display(&options.display),
            var.raw
        )?;
    }
    Ok(())
}

fn repl(options: EngineOptions) -> Result<()> {
    let mut doc = Document::with_options(options.clone());
    let stdin = io::stdin();
    let mut out = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let command = line.trim();

        if command == ":quit" || command == ":q" {
            break;
        }
        if command == ":vars" {
            print_variables(&mut out, &doc.store().get_all_variables(), &options)?;
            continue;
        }
        if let Some(name) = command.strip_prefix(":del") {
            let name = name.trim();
            if name.is_empty() {
                writeln!(out, "usage: :del <name>")?;
            } else if doc.remove_assignments(name) > 0 {
                writeln!(out, "deleted {}", name)?;
            } else {
                writeln!(out, "no variable named {}", name)?;
            }
            continue;
        }
        if command.starts_with(':') {
            writeln!(out, "unknown command {}", command)?;
            continue;
        }

        let outcome = doc.push_line(&line);
        if let Some(result) = render(outcome, &options) {
            writeln!(out, "= {}", result)?;
        }
    }

    debug!(lines = doc.lines().len(), "repl closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_onto_options() {
        let cli = Cli::parse_from([
            "tally",
            "--precision",
            "2",
            "--notation",
            "scientific",
            "--max-range",
            "50",
            "expr",
            "1 + 1",
        ]);
        let options = cli.display.engine_options();
        assert_eq!(options.display.precision, 2);
        assert_eq!(options.display.notation, Notation::Scientific);
        assert_eq!(options.max_range_elements, 50);
        assert!(!options.display.prefer_base_unit);
    }

    #[test]
    fn test_flags_after_subcommand() {
        let cli = Cli::parse_from(["tally", "expr", "1", "--prefer-base-unit", "--date-format", "locale"]);
        let options = cli.display.engine_options();
        assert!(options.display.prefer_base_unit);
        assert_eq!(options.display.date_format, DateFormat::Locale);
    }

    #[test]
    fn test_rejects_unknown_notation() {
        assert!(Cli::try_parse_from(["tally", "--notation", "roman", "repl"]).is_err());
    }
}
