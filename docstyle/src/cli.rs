//! Command-line interface definitions for docstyle

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Auto-polish level selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolishArg {
    /// Never restructure
    Off,
    /// Only very text-heavy manuscripts, light changes
    Weak,
    /// Default thresholds
    Normal,
    /// Restructure aggressively
    Strong,
}

impl PolishArg {
    /// Name as understood by `auto_polish_level`
    pub fn as_setting(self) -> &'static str {
        match self {
            PolishArg::Off => "off",
            PolishArg::Weak => "weak",
            PolishArg::Normal => "normal",
            PolishArg::Strong => "strong",
        }
    }
}

/// Margin profile selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MarginArg {
    /// Theme-driven margins
    Default,
    /// 1.5 inch on every side
    Wide,
    /// 0.75 inch on every side
    Narrow,
}

impl MarginArg {
    pub fn as_setting(self) -> &'static str {
        match self {
            MarginArg::Default => "default",
            MarginArg::Wide => "wide",
            MarginArg::Narrow => "narrow",
        }
    }
}

/// CLI structure for the docstyle application
#[derive(Parser)]
#[command(name = "docstyle")]
#[command(version)]
#[command(about = "Manuscript to styled Word document builder", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for docstyle
#[derive(Subcommand)]
pub enum Commands {
    /// Build a manuscript (.json, .md or .docx) into a .docx document
    Build {
        /// Manuscript file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output .docx (or .dotx) path
        #[arg(short, long, default_value = "output.docx")]
        output: PathBuf,

        /// Template id (e.g. 01, 25)
        #[arg(short, long)]
        template: Option<String>,

        /// Tool configuration file (defaults to ./docstyle.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Style preset (template, classic, modern, report, magazine)
        #[arg(long)]
        preset: Option<String>,

        /// Auto-polish level
        #[arg(long, value_enum)]
        polish_level: Option<PolishArg>,

        /// Disable auto-polish
        #[arg(long)]
        no_polish: bool,

        /// Margin profile
        #[arg(long, value_enum)]
        margins: Option<MarginArg>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show how auto-polish classifies a manuscript at every level
    Analyze {
        /// Manuscript file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Also show the element sequence this level would produce
        #[arg(long, value_enum)]
        polish_level: Option<PolishArg>,
    },

    /// Write the auto-polished element sequence as manuscript JSON
    Polish {
        /// Manuscript file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output JSON path
        #[arg(short, long, default_value = "polished.json")]
        output: PathBuf,

        /// Auto-polish level (defaults to the manuscript's setting)
        #[arg(long, value_enum)]
        polish_level: Option<PolishArg>,
    },

    /// Convert a structured Markdown manuscript to JSON
    ConvertMd {
        /// Markdown manuscript
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output JSON path
        #[arg(short, long, default_value = "manuscript.json")]
        output: PathBuf,
    },

    /// Write a starter docstyle.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        path: Option<PathBuf>,

        /// Template id recorded as the default
        #[arg(short, long)]
        template: Option<String>,

        /// Overwrite an existing docstyle.toml
        #[arg(short, long)]
        force: bool,
    },

    /// List available templates
    ListTemplates {
        /// Tool configuration file (its themes_path replaces the bundled themes)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
