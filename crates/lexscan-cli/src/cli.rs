//! CLI argument definitions for `lexscan`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use lexscan_model::{ConfidenceThresholds, DocumentTypeId, Language};

#[derive(Parser)]
#[command(
    name = "lexscan",
    version,
    about = "Extract, map and review scanned legal documents",
    long_about = "Turn recognized text of scanned legal documents into structured records.\n\n\
                  Identifies the document type, extracts entities, maps them onto the\n\
                  type's form and queues the result for review and approval."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Load the catalog from a directory instead of the embedded default.
    #[arg(long = "catalog-dir", value_name = "DIR", global = true)]
    pub catalog_dir: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow document text in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the document types of the catalog.
    Templates,

    /// Load the catalog and print its version, digest and counts.
    Catalog,

    /// Extract entities and document structure from one document.
    Extract(DocumentArgs),

    /// Extract and map one document, then validate the mapping.
    Map(MapArgs),

    /// Process documents into the review queue, optionally auto-approving.
    Process(ProcessArgs),
}

#[derive(Args)]
pub struct DocumentArgs {
    /// OCR output (`.json`) or plain text file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub hints: HintArgs,
}

#[derive(Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Confidence bands used to grade mapped fields.
    #[arg(long = "bands", value_enum, default_value = "default")]
    pub bands: BandsArg,
}

#[derive(Args)]
pub struct HintArgs {
    /// Skip type detection and use this document type.
    #[arg(long = "type", value_name = "ID")]
    pub document_type: Option<DocumentTypeId>,

    /// Skip language detection.
    #[arg(long = "language", value_name = "LANG")]
    pub language: Option<Language>,
}

#[derive(Args)]
pub struct ProcessArgs {
    /// OCR outputs (`.json`) or plain text files.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub hints: HintArgs,

    /// Approve items whose overall confidence reaches this value (0.0 to 1.0).
    #[arg(long = "auto-approve", value_name = "THRESHOLD")]
    pub auto_approve: Option<f32>,

    /// Reviewer recorded on automatic approvals.
    #[arg(long = "reviewer", default_value = "lexscan")]
    pub reviewer: String,

    /// Append approved records to this JSON Lines file.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write items still awaiting review to this JSON file.
    #[arg(long = "queue", value_name = "PATH")]
    pub queue: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BandsArg {
    /// High 0.95, medium 0.80, low 0.60.
    Default,
    /// High 0.98, medium 0.90, low 0.75.
    Strict,
    /// High 0.90, medium 0.70, low 0.50.
    Relaxed,
}

impl BandsArg {
    pub fn thresholds(self) -> ConfidenceThresholds {
        match self {
            Self::Default => ConfidenceThresholds::default(),
            Self::Strict => ConfidenceThresholds::strict(),
            Self::Relaxed => ConfidenceThresholds::relaxed(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn process_accepts_hints_and_outputs() {
        let cli = Cli::try_parse_from([
            "lexscan",
            "process",
            "a.json",
            "b.txt",
            "--type",
            "executive_decree",
            "--auto-approve",
            "0.9",
            "--output",
            "approved.jsonl",
            "--log-data",
        ])
        .unwrap();
        assert!(cli.log_data);
        let Command::Process(args) = cli.command else {
            panic!("expected process");
        };
        assert_eq!(args.files.len(), 2);
        assert_eq!(
            args.hints.document_type.as_ref().map(DocumentTypeId::as_str),
            Some("executive_decree")
        );
        assert_eq!(args.auto_approve, Some(0.9));
        assert_eq!(args.reviewer, "lexscan");
    }

    #[test]
    fn map_selects_confidence_bands() {
        let cli = Cli::try_parse_from(["lexscan", "map", "a.txt", "--bands", "strict"]).unwrap();
        let Command::Map(args) = cli.command else {
            panic!("expected map");
        };
        assert_eq!(args.bands, BandsArg::Strict);
        assert_eq!(args.bands.thresholds().low, 0.75);

        let cli = Cli::try_parse_from(["lexscan", "map", "a.txt"]).unwrap();
        let Command::Map(args) = cli.command else {
            panic!("expected map");
        };
        assert_eq!(args.bands, BandsArg::Default);
    }

    #[test]
    fn malformed_type_hint_is_rejected() {
        assert!(Cli::try_parse_from(["lexscan", "map", "a.txt", "--type", "bad id"]).is_err());
    }
}
