use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use repolens_core::analysis::AnalysisKind;

#[derive(Debug, Parser)]
#[command(name = "repolens")]
#[command(bin_name = "repolens")]
#[command(version)]
#[command(about = "Browse hosted repositories and run AI analyses on their files")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Write a diagnostics log under ~/.config/repolens/diagnostics"
    )]
    pub diagnostics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Print the file tree of a repository")]
    Tree {
        #[arg(value_name = "URL")]
        url: String,
    },
    #[command(about = "Print one file of a repository")]
    Show {
        #[arg(value_name = "URL")]
        url: String,
        #[arg(value_name = "PATH")]
        path: String,
    },
    #[command(about = "Run an analysis on one file of a repository")]
    Analyze(AnalyzeArgs),
    #[command(about = "Explain a snippet taken from one file of a repository")]
    Explain {
        #[arg(value_name = "URL")]
        url: String,
        #[arg(value_name = "PATH")]
        path: String,
        #[arg(value_name = "SNIPPET")]
        snippet: String,
    },
    #[command(about = "Open the interactive repository browser")]
    Browse {
        #[arg(value_name = "URL")]
        url: Option<String>,
    },
    #[command(about = "Run configuration checks")]
    Doctor,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(value_name = "URL")]
    pub url: String,
    #[arg(value_name = "PATH")]
    pub path: String,
    #[arg(long, value_enum)]
    pub kind: KindArg,
    #[arg(long, help = "Question to answer (explanation only)")]
    pub question: Option<String>,
    #[arg(
        long,
        value_name = "LOCAL_FILE",
        help = "Analyse this local text instead of the fetched file"
    )]
    pub input: Option<PathBuf>,
    #[arg(
        long,
        value_name = "FILE",
        help = "Write the result to FILE (a directory keeps the original file name)"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Explanation,
    Mindmap,
    Quality,
    Comment,
    Tests,
}

impl From<KindArg> for AnalysisKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Explanation => Self::Explanation,
            KindArg::Mindmap => Self::MindMap,
            KindArg::Quality => Self::Quality,
            KindArg::Comment => Self::Comment,
            KindArg::Tests => Self::Tests,
        }
    }
}
