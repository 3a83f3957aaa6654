use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use repolens_app::{App, Session};
use repolens_core::analysis::AnalysisKind;
use repolens_core::doctor::run_doctor;
use tokio::runtime::Runtime;

use crate::cli::{AnalyzeArgs, Cli, Command};
use crate::render;

pub fn run_with_deps(cli: Cli, runtime: &Runtime) -> Result<()> {
    match cli.command {
        Command::Doctor => run_doctor_command(),
        Command::Browse { url } => {
            let app = App::from_env()?;
            repolens_tui::run_browser(&app, runtime.handle().clone(), url)
        }
        Command::Tree { url } => {
            let mut session = open_session(runtime)?;
            runtime.block_on(run_tree(&mut session, &url))
        }
        Command::Show { url, path } => {
            let mut session = open_session(runtime)?;
            runtime.block_on(run_show(&mut session, &url, &path))
        }
        Command::Analyze(args) => {
            let mut session = open_session(runtime)?;
            runtime.block_on(run_analyze(&mut session, args))
        }
        Command::Explain { url, path, snippet } => {
            let mut session = open_session(runtime)?;
            runtime.block_on(run_explain(&mut session, &url, &path, &snippet))
        }
    }
}

fn run_doctor_command() -> Result<()> {
    let report = run_doctor();
    println!("{}", render::doctor_table(&report));
    Ok(())
}

fn open_session(runtime: &Runtime) -> Result<Session> {
    let app = App::from_env()?;
    app.session(runtime.handle().clone())
}

async fn run_tree(session: &mut Session, url: &str) -> Result<()> {
    let tree = session.open_repo(url).await?;
    println!("{}", render::tree_listing(tree));
    Ok(())
}

async fn run_show(session: &mut Session, url: &str, path: &str) -> Result<()> {
    session.open_repo(url).await?;
    let content = session.open_file(path).await?;
    print_block(&content.original);
    Ok(())
}

async fn run_explain(session: &mut Session, url: &str, path: &str, snippet: &str) -> Result<()> {
    session.open_repo(url).await?;
    session.open_file(path).await?;
    let explanation = session.explain(snippet).await?;
    print_block(&explanation.explanation);
    Ok(())
}

async fn run_analyze(session: &mut Session, args: AnalyzeArgs) -> Result<()> {
    session.open_repo(&args.url).await?;
    session.open_file(&args.path).await?;

    if let Some(input) = &args.input {
        let text = fs::read_to_string(input)
            .with_context(|| format!("failed to read input file {}", input.display()))?;
        session.edit_content(text)?;
    }

    let kind = AnalysisKind::from(args.kind);
    let state = session.analyze(kind, args.question.as_deref()).await?;
    let rendered = render::analysis_result(kind, state).unwrap_or_default();

    match &args.output {
        Some(output) => {
            let file_name = match kind {
                AnalysisKind::Comment => session.download().map(|download| download.file_name),
                _ => None,
            }
            .unwrap_or_else(|| format!("{kind}.txt"));
            let target = output_target(output, &file_name);
            fs::write(&target, ensure_trailing_newline(&rendered))
                .with_context(|| format!("failed to write {}", target.display()))?;
            eprintln!("Wrote {kind} result to {}", target.display());
        }
        None => print_block(&rendered),
    }
    Ok(())
}

/// A directory target keeps the repository file's own name.
fn output_target(output: &Path, file_name: &str) -> PathBuf {
    if output.is_dir() {
        output.join(file_name)
    } else {
        output.to_path_buf()
    }
}

fn ensure_trailing_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

fn print_block(text: &str) {
    print!("{}", ensure_trailing_newline(text));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_output_keeps_file_name() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert_eq!(
            output_target(dir.path(), "lib.rs"),
            dir.path().join("lib.rs")
        );
        assert_eq!(
            output_target(&dir.path().join("out.rs"), "lib.rs"),
            dir.path().join("out.rs")
        );
    }

    #[test]
    fn trailing_newline_is_added_once() {
        assert_eq!(ensure_trailing_newline("a"), "a\n");
        assert_eq!(ensure_trailing_newline("a\n"), "a\n");
    }
}
