//! CLI surface (SPEC_FULL §6), adapted from the teacher's `Cli`/`Commands`/
//! `OutputFormat` `clap::Parser`/`Subcommand`/`ValueEnum` pattern and
//! trimmed to the single subcommand spec.md §6 actually calls for.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Static analyzer for MiniC: CFG construction and lattice-based dataflow analysis.
#[derive(Parser, Debug, Clone)]
#[command(name = "minic-analyze")]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Analyze a single MiniC source file and report diagnostics.
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Path to the MiniC source file to analyze.
    pub path: PathBuf,

    /// Output format for the diagnostic report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output: OutputFormat,
}

/// Output format options (spec.md §6: `--output human|json`).
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output, one diagnostic per line.
    Human,
    /// Diagnostics as a JSON array, stable-sorted per spec.md §6.
    Json,
}

pub mod cmds {
    use super::AnalyzeArgs;
    use crate::output;
    use crate::pipeline;
    use anyhow::{Context, Result};

    /// Runs the `analyze` subcommand and returns the process exit code
    /// spec.md §6 assigns: 0 (clean, warnings allowed), 1 (some error-level
    /// diagnostic), or 2 (invocation error — the file couldn't be read, or
    /// the front end hit something that stopped it before producing an AST).
    pub fn analyze(args: &AnalyzeArgs) -> Result<i32> {
        let source = std::fs::read_to_string(&args.path)
            .with_context(|| format!("failed to read '{}'", args.path.display()))?;
        let file = args.path.display().to_string();
        let report = pipeline::analyze(&source);

        if let Some(err) = &report.internal_error {
            output::render_internal_error(&file, err, args.output);
            return Ok(output::EXIT_INVOCATION_ERROR);
        }

        output::render(&file, &report.diagnostics, args.output);
        Ok(if report.has_errors() { output::EXIT_WITH_ERRORS } else { output::EXIT_OK })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyze_with_default_output() {
        let cli = Cli::parse_from(["minic-analyze", "analyze", "prog.minic"]);
        let Commands::Analyze(args) = cli.command;
        assert_eq!(args.path, PathBuf::from("prog.minic"));
        assert_eq!(args.output, OutputFormat::Human);
    }

    #[test]
    fn parses_json_output_flag() {
        let cli = Cli::parse_from(["minic-analyze", "analyze", "prog.minic", "--output", "json"]);
        let Commands::Analyze(args) = cli.command;
        assert_eq!(args.output, OutputFormat::Json);
    }

    #[test]
    fn rejects_missing_path() {
        assert!(Cli::try_parse_from(["minic-analyze", "analyze"]).is_err());
    }
}
