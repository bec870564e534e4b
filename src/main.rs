//! Outliner - browse a markdown file as a virtualized outline.
//!
//! # Usage
//!
//! ```bash
//! outliner NOTES.md
//! outliner --watch --breadcrumb follow NOTES.md
//! outliner --block-size 100 --min-level 2 NOTES.md
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use outliner::app::App;
use outliner::breadcrumb::BreadcrumbMode;
use outliner::config::{
    BreadcrumbChoice, ConfigFlags, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use outliner::geometry::{GeometryConfig, TextDirection};
use outliner::outline::OutlineConfig;
use outliner::perf;

/// Browse a markdown file as a virtualized outline
#[derive(Parser, Debug)]
#[command(name = "outliner", version, about, long_about = None)]
struct Cli {
    /// Markdown file to outline
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Watch file for changes and auto-reload
    #[arg(short, long)]
    watch: bool,

    /// Breadcrumb mode: ancestors of the top row, or of the selection
    #[arg(long, value_enum)]
    breadcrumb: Option<BreadcrumbChoice>,

    /// Keep the point of interest in the breadcrumb while selecting its ancestors
    #[arg(long)]
    extended: bool,

    /// Lay rows out right to left
    #[arg(long)]
    rtl: bool,

    /// Rows per rendered block
    #[arg(long, value_name = "ROWS")]
    block_size: Option<usize>,

    /// Levels below the root that are always shown
    #[arg(long, value_name = "LEVELS")]
    min_level: Option<usize>,

    /// View state file (default: .FILE.outline.json next to FILE)
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Print timing of the render pipeline to stderr
    #[arg(long)]
    perf: bool,

    /// Write detailed render pipeline events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn outline_config(flags: &ConfigFlags) -> OutlineConfig {
    let defaults = OutlineConfig::default();
    OutlineConfig {
        block_size: flags.block_size.filter(|size| *size > 0).unwrap_or(defaults.block_size),
        min_outline_level: flags.min_level.unwrap_or(defaults.min_outline_level),
        breadcrumb_mode: flags
            .breadcrumb
            .map_or(defaults.breadcrumb_mode, BreadcrumbMode::from),
        extended_breadcrumb: flags.extended,
        ..defaults
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("OUTLINER_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize render debug log {}: {}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let direction = if effective.rtl {
        TextDirection::RightToLeft
    } else {
        TextDirection::LeftToRight
    };
    let mut app = App::new(cli.file)
        .with_watch(effective.watch)
        .with_outline_config(outline_config(&effective))
        .with_geometry(GeometryConfig::terminal().with_text_direction(direction))
        .with_state_path(effective.state.clone())
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );

    app.run().context("Application error")
}
