//! Command dispatch

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::render;
use crate::config::{global_config_path, local_config_path, OutputFormat, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, try 'flowtable --help'".to_string(),
        ));
    };

    // completions need no settings
    if let Commands::Completion { shell } = command {
        return cmd_completion(*shell);
    }

    let project_dir = resolve_project_dir(cli.project_dir.as_deref())?;
    let settings = Settings::load(Some(&project_dir))?;
    if !settings.color {
        colored::control::set_override(false);
    }
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Show {
            snapshot,
            format,
            indent,
            no_status,
        } => cmd_show(&container, snapshot, *format, *indent, *no_status),
        Commands::Heads { snapshot } => cmd_heads(&container, snapshot),
        Commands::Check { snapshot } => cmd_check(&container, snapshot),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(&container),
            ConfigCommands::Path => cmd_config_path(&project_dir),
        },
        Commands::Completion { shell } => cmd_completion(*shell),
    }
}

fn resolve_project_dir(project_dir: Option<&Path>) -> CliResult<PathBuf> {
    match project_dir {
        Some(dir) if dir.is_dir() => Ok(dir.to_path_buf()),
        Some(dir) => Err(CliError::InvalidArgs(format!(
            "project directory does not exist: {}",
            dir.display()
        ))),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e).into()),
    }
}

fn write_stdout(text: &str) -> CliResult<()> {
    let mut out = io::stdout().lock();
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| InfraError::io("write output", e))?;
    Ok(())
}

#[instrument(skip(container))]
fn cmd_show(
    container: &ServiceContainer,
    snapshot: &Path,
    format: Option<OutputFormat>,
    indent: Option<usize>,
    no_status: bool,
) -> CliResult<()> {
    let mut settings = (*container.settings).clone();
    if let Some(format) = format {
        settings.format = format;
    }
    if let Some(indent) = indent {
        settings.indent = indent;
    }
    if no_status {
        settings.show_status = false;
    }
    debug!("cmd_show: effective settings {:?}", settings);

    let graph = container.table.load(snapshot)?;
    let rows = container.table.build(&graph)?;
    let lines = container.table.lines(&graph, &rows);

    let title = snapshot
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| snapshot.display().to_string());
    write_stdout(&render::render(&lines, &settings, &title))
}

#[instrument(skip(container))]
fn cmd_heads(container: &ServiceContainer, snapshot: &Path) -> CliResult<()> {
    let graph = container.table.load(snapshot)?;
    let mut text = String::new();
    for head in graph.heads() {
        text.push_str(&format!("{}\t{}\n", head, graph.label(head)));
    }
    write_stdout(&text)
}

#[instrument(skip(container))]
fn cmd_check(container: &ServiceContainer, snapshot: &Path) -> CliResult<()> {
    let graph = container.table.load(snapshot)?;
    let rows = container.table.build(&graph)?;
    let summary = container.table.summary(&graph, &rows);

    output::success(&format!("{} is valid", snapshot.display()));
    output::detail(&format!("nodes:        {}", summary.nodes));
    output::detail(&format!("heads:        {}", summary.heads));
    output::detail(&format!(
        "rows:         {} ({} distinct)",
        summary.rows, summary.distinct_rows
    ));
    output::detail(&format!("folded ends:  {}", summary.folded_ends));
    output::detail(&format!("max depth:    {}", summary.max_depth));
    if summary.unreachable > 0 {
        output::warning(&format!(
            "{} node(s) not reachable from any head",
            summary.unreachable
        ));
    }
    Ok(())
}

fn cmd_config_show(container: &ServiceContainer) -> CliResult<()> {
    let toml = container.settings.to_toml()?;
    write_stdout(&toml)
}

fn cmd_config_path(project_dir: &Path) -> CliResult<()> {
    output::header("Config paths");
    match global_config_path() {
        Some(path) => output::detail(&format!(
            "global: {} {}",
            path.display(),
            exists_marker(&path)
        )),
        None => output::detail("global: (no home directory)"),
    }
    let local = local_config_path(project_dir);
    output::detail(&format!(
        "local:  {} {}",
        local.display(),
        exists_marker(&local)
    ));
    Ok(())
}

fn exists_marker(path: &Path) -> &'static str {
    if path.exists() {
        "(exists)"
    } else {
        "(not found)"
    }
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
