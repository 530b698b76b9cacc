//! hv - render Handlebars views from the command line

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result, bail};
use serde_json::Value;
use tracing::{debug, info};

use hbsview::cli::{Cli, Command, parse_object};
use hbsview::markers;
use hbsview::{Engine, FsLoader, TemplateLoader, ViewConfig, ViewContext};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hbsview")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("hbsview.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ViewConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    if let Some(view_path) = cli.view_path {
        config.view_path = view_path;
    }
    if cli.no_cache {
        config.disable_cache = true;
    }

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Render {
            name,
            locals,
            state,
            request,
            theme,
        } => {
            let locals = parse_object(locals.as_deref(), "locals")?;
            let state = parse_object(state.as_deref(), "state")?;
            let request = match request {
                Some(raw) => serde_json::from_str(&raw).context("Failed to parse --request as JSON")?,
                None => Value::Null,
            };
            cmd_render(config, &name, locals, state, request, theme).await
        }
        Command::Partials => cmd_partials(&config).await,
        Command::Layout { name } => cmd_layout(config, &name).await,
    }
}

async fn cmd_render(
    config: ViewConfig,
    name: &str,
    locals: serde_json::Map<String, Value>,
    state: serde_json::Map<String, Value>,
    request: Value,
    theme: Option<String>,
) -> Result<()> {
    debug!(%name, "cmd_render: called");
    let engine = Arc::new(Engine::new(config)?);

    let mut ctx = ViewContext::new(request).with_state(state);
    if let Some(theme) = theme {
        ctx.set_theme(theme);
    }

    let ctx = engine
        .middleware()
        .handle(ctx, |mut ctx| async move {
            ctx.render(name, locals).await?;
            Ok(ctx)
        })
        .await
        .context(format!("Failed to render {}", name))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(ctx.body.unwrap_or_default().as_bytes())?;
    stdout.flush()?;
    Ok(())
}

async fn cmd_partials(config: &ViewConfig) -> Result<()> {
    debug!(root = ?config.partials_path, "cmd_partials: called");
    if !config.partials_enabled() {
        bail!("No partials-path configured");
    }

    let files = FsLoader.list(&config.partials_path, &config.extname).await?;
    for rel in files {
        let rel = rel.to_string_lossy().replace('\\', "/");
        println!("{}", rel.strip_suffix(config.extname.as_str()).unwrap_or(&rel));
    }
    Ok(())
}

async fn cmd_layout(config: ViewConfig, name: &str) -> Result<()> {
    debug!(%name, "cmd_layout: called");
    let engine = Engine::new(config)?;
    let Some(path) = engine.resolver().resolve(name).await else {
        bail!("Template not found: {}", engine.resolver().template_path(name).display());
    };

    let raw = FsLoader.read(&path).await?;
    match markers::layout_name(&raw) {
        Some(layout) => println!("{} -> {}", layout, engine.resolver().layout_path(layout).display()),
        None => match engine.config().default_layout.as_deref().filter(|l| !l.is_empty()) {
            Some(layout) => println!("{} (default) -> {}", layout, engine.resolver().layout_path(layout).display()),
            None => println!("(none)"),
        },
    }
    Ok(())
}
