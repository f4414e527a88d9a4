use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use code_model::LspLanguage;
use code_repo::ReservedField;

#[derive(Parser)]
#[command(
    name = "codectl",
    about = "Manage tracked code repositories and their worker status",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON snapshot holding the document store.
    #[arg(long, global = true, default_value = ".code-repos.json")]
    pub store: PathBuf,

    /// TOML client configuration.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register, inspect, or remove repositories
    Repo(RepoArgs),
    /// Show every worker status recorded for a repository
    Status(StatusArgs),
    /// Record worker progress for a repository
    Progress(ProgressArgs),
}

#[derive(Args)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub action: RepoAction,
}

#[derive(Subcommand)]
pub enum RepoAction {
    /// Register a repository from its clone URL
    Add { url: String },
    /// Show repository metadata
    Show { uri: String },
    /// List all registered repositories
    List,
    /// Remove repository metadata
    Remove { uri: String },
    /// Change the clone URL of a repository
    SetUrl { uri: String, url: String },
    /// Switch a language server on or off for a repository
    Lsp {
        uri: String,
        language: LanguageArg,
        #[arg(long)]
        enable: bool,
    },
}

#[derive(Args)]
pub struct StatusArgs {
    pub uri: String,
}

#[derive(Args)]
pub struct ProgressArgs {
    pub uri: String,
    pub worker: WorkerKind,
    /// Percentage in 0..=100, or -100 (error) / -200 (timeout)
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
    #[arg(long)]
    pub error: Option<String>,
    #[arg(long)]
    pub revision: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WorkerKind {
    Git,
    Lsp,
    Delete,
    Index,
}

impl WorkerKind {
    pub fn field(self) -> ReservedField {
        match self {
            Self::Git => ReservedField::GitStatus,
            Self::Lsp => ReservedField::LspIndexStatus,
            Self::Delete => ReservedField::DeleteStatus,
            Self::Index => ReservedField::IndexStatus,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LanguageArg {
    Go,
    Java,
    Typescript,
}

impl From<LanguageArg> for LspLanguage {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Go => LspLanguage::Go,
            LanguageArg::Java => LspLanguage::Java,
            LanguageArg::Typescript => LspLanguage::Typescript,
        }
    }
}
