//! Command handlers

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::Generation;
use crate::cli::args::{
    CategoryCommands, Cli, Commands, ConfigCommands, ForestCommands, OutputFormat,
};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings, StoreBackend};
use crate::domain::{ForestRender, NodeView};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute the CLI command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Generate {
            file,
            formulas,
            format,
        }) => cmd_generate(cli, file.as_deref(), formulas, *format),
        Some(Commands::Category { command }) => match command {
            CategoryCommands::List => cmd_category_list(cli),
            CategoryCommands::Show { tree_type, kpi } => cmd_category_show(cli, tree_type, kpi),
            CategoryCommands::Generate {
                tree_type,
                kpi,
                format,
            } => cmd_category_generate(cli, tree_type, kpi, *format),
        },
        Some(Commands::Forest { command }) => match command {
            ForestCommands::Nodes => cmd_forest_nodes(cli),
        },
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cmd_config_show(),
            ConfigCommands::Init { global } => cmd_config_init(*global),
            ConfigCommands::Path => cmd_config_path(),
        },
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        None => {
            output::info("kpitree: use --help for available commands");
            Ok(())
        }
    }
}

/// Load settings and apply `--memory` / `--store` overrides.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?;
    let mut settings = Settings::load(Some(cwd.as_path()))?;
    if cli.memory {
        settings.store.backend = StoreBackend::Memory;
    }
    if let Some(path) = &cli.store {
        settings.store.backend = StoreBackend::File;
        settings.store.path = path.clone();
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn create_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = load_settings(cli)?;
    Ok(ServiceContainer::new(settings)?)
}

/// One formula per line; blank lines and `#` comments are skipped.
fn read_formula_file(container: &ServiceContainer, path: &Path) -> CliResult<Vec<String>> {
    let content = container
        .fs
        .read_to_string(path)
        .map_err(|e| InfraError::io(format!("read formulas {}", path.display()), e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn print_generation(generation: &Generation, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Tree => {
            for tree in generation.forest.to_tree_strings() {
                print!("{tree}");
            }
            output::success(format!(
                "{} nodes created, {} reused, {} laid out",
                generation.nodes_created, generation.nodes_adopted, generation.nodes_laid_out
            ));
        }
        OutputFormat::Json => {
            let views = generation.views()?;
            let json = serde_json::to_string_pretty(&views)
                .map_err(|e| CliError::Usage(format!("serialize result: {e}")))?;
            output::info(&json);
        }
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_generate(
    cli: &Cli,
    file: Option<&Path>,
    inline: &[String],
    format: OutputFormat,
) -> CliResult<()> {
    let container = create_container(cli)?;

    let mut formulas = match file {
        Some(path) => read_formula_file(&container, path)?,
        None => Vec::new(),
    };
    formulas.extend(inline.iter().cloned());
    if formulas.is_empty() {
        return Err(CliError::InvalidArgs(
            "no formulas given (pass a file or -e FORMULA)".to_string(),
        ));
    }

    let generation = container.generation_service().generate(&formulas)?;
    print_generation(&generation, format)
}

fn cmd_category_list(cli: &Cli) -> CliResult<()> {
    let container = create_container(cli)?;
    for (industry_class, industries) in container.catalog.get_categories() {
        output::header(&industry_class);
        for (industry, tree_types) in industries {
            output::detail(format!("{industry}: {}", tree_types.iter().join(", ")));
        }
    }
    Ok(())
}

fn cmd_category_show(cli: &Cli, tree_type: &str, kpi: &str) -> CliResult<()> {
    let container = create_container(cli)?;
    let formulas = container.catalog.get_formulas(tree_type, kpi)?;
    output::header(format!("{tree_type} / {kpi}"));
    for formula in formulas {
        output::detail(&formula);
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_category_generate(
    cli: &Cli,
    tree_type: &str,
    kpi: &str,
    format: OutputFormat,
) -> CliResult<()> {
    let container = create_container(cli)?;
    let generation = container.generation_service().generate_for_category(
        container.catalog.as_ref(),
        tree_type,
        kpi,
    )?;
    print_generation(&generation, format)
}

fn cmd_forest_nodes(cli: &Cli) -> CliResult<()> {
    let container = create_container(cli)?;
    let state = container.store.snapshot().map_err(InfraError::from)?;
    if state.nodes.is_empty() {
        output::info("no nodes stored");
        return Ok(());
    }

    let views = state
        .nodes
        .iter()
        .map(NodeView::from)
        .sorted_by_key(|v| (v.y.is_none(), v.y, v.label.clone()));
    for view in views {
        match (view.x, view.y) {
            (Some(x), Some(y)) => output::detail(format!("{:<24} ({x}, {y})", view.label)),
            _ => output::detail(format!("{:<24} -", view.label)),
        }
    }
    output::info(format!(
        "{} nodes, {} decompositions",
        state.nodes.len(),
        state.decompositions.len()
    ));
    Ok(())
}

fn cmd_config_show() -> CliResult<()> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?;
    let settings = Settings::load(Some(cwd.as_path()))?;
    output::info(&settings.to_toml()?);
    Ok(())
}

fn cmd_config_init(global: bool) -> CliResult<()> {
    let path = if global {
        global_config_path()
            .ok_or_else(|| CliError::Usage("cannot determine global config directory".into()))?
    } else {
        let cwd = std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?;
        local_config_path(&cwd)
    };

    if path.exists() {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
    }
    std::fs::write(&path, Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;

    output::action("Created", path.display());
    Ok(())
}

fn cmd_config_path() -> CliResult<()> {
    match global_config_path() {
        Some(path) => output::detail(format!("global: {}", path.display())),
        None => output::detail("global: (unavailable)"),
    }
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?;
    output::detail(format!("local:  {}", local_config_path(&cwd).display()));
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
