// maskward/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use maskward_core::domain::AuditMode;

#[derive(Parser)]
#[command(name = "maskward")]
#[command(about = "Column masking policies from a rule sheet, with an audit trail", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: maskward.yaml in --project-dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding maskward.yaml; relative local paths resolve against it
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Fail when a rule names a column the table does not have
    #[arg(long, global = true)]
    pub strict_columns: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Scheduled run: ingest, load, reset, apply (one audit insert per rule)
    Run,

    /// 📨 Request-style run: batched audit with a batch id, prints status + message
    Trigger,

    /// 🌐 Serves POST /run (request-style run) and GET /health
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// 📥 Fetches the rule sheet from the bucket and stages it locally
    Ingest,

    /// 📦 Overwrites the rule table with the staged sheet
    Load,

    /// 🧹 Removes every policy tag in the dataset and every taxonomy at the location
    Reset,

    /// 🔒 Applies the rule table: tags, column bindings, access, audit rows
    Apply {
        #[arg(long, value_enum, default_value = "per-rule")]
        audit: AuditArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuditArg {
    PerRule,
    Batched,
}

impl From<AuditArg> for AuditMode {
    fn from(arg: AuditArg) -> Self {
        match arg {
            AuditArg::PerRule => AuditMode::PerRule,
            AuditArg::Batched => AuditMode::Batched,
        }
    }
}
