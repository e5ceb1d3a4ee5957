//! script-console: headless driver for the developer console.
//!
//! Reads one command per line from stdin, runs it in a persistent Rhai scope
//! and prints whatever each command added to the transcript. Application
//! log events (anything logged through `tracing`, including `log_info` and
//! friends from scripts) are mirrored into the transcript while the console
//! listens to the log.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rhai::{EvalAltResult, Module};
use tracing::info;

use script_console::config::{ConsoleConfig, default_config_path};
use script_console::engine::{SceneObject, SelectionSource};
use script_console::log_buffer::strip_markup;
use script_console::log_source::LogHub;
use script_console::rhai_engine::RhaiEngine;
use script_console::{Console, logging};

/// Developer script console
#[derive(Parser, Debug)]
#[command(name = "script-console", version, about = "Headless developer script console")]
struct Args {
    /// Config file (defaults to ~/.config/script-console/console.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Strip rich-text markup from the printed transcript
    #[arg(long)]
    plain: bool,

    /// Start with the panel shown regardless of the config
    #[arg(long)]
    show: bool,
}

/// Stand-in for an editor selection. Scripts change it with
/// `console.select(app::object(id, name))`.
struct DemoSelection {
    current: Option<SceneObject>,
}

impl SelectionSource for DemoSelection {
    fn selected(&self) -> Option<SceneObject> {
        self.current.clone()
    }

    fn select(&mut self, object: Option<SceneObject>) {
        self.current = object;
    }
}

fn demo_module() -> Module {
    let mut module = Module::new();
    module.set_native_fn("version", || Ok(env!("CARGO_PKG_VERSION").to_string()));
    module.set_native_fn("object", |id: i64, name: &str| -> Result<SceneObject, Box<EvalAltResult>> {
        let id = u64::try_from(id).map_err(|_| format!("object id {id} must not be negative"))?;
        Ok(SceneObject::new(id, name))
    });
    module
}

fn main() -> Result<()> {
    let args = Args::parse();

    let hub = LogHub::new();
    let _log_guard = logging::init(Some(hub.clone()));

    let config_path = args.config.unwrap_or_else(default_config_path);
    let mut config = ConsoleConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if args.show {
        config.visible_by_default = true;
    }

    let mut engine = RhaiEngine::new();
    engine.register_module("app", demo_module());
    let symbols = engine.module_names();

    let mut console = Console::new(engine, config)
        .context("Failed to build console")?
        .with_log_source(Arc::new(hub))
        .with_symbols(symbols)
        .with_selection(DemoSelection {
            current: Some(SceneObject::new(1, "Main Camera")),
        });
    console.start();
    info!(visible = console.is_visible(), "script-console v{} ready", env!("CARGO_PKG_VERSION"));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut printed = console.transcript_text();
    let mut last_tick = Instant::now();

    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        console.submit(&line);

        let now = Instant::now();
        console.tick(now.duration_since(last_tick).as_secs_f32());
        last_tick = now;

        let text = console.transcript_text();
        // A cleared transcript starts over.
        let added = text.strip_prefix(printed.as_str()).unwrap_or(&text);
        if !added.is_empty() {
            let shown = if args.plain { strip_markup(added) } else { added.to_string() };
            writeln!(out, "{}", shown.trim_start_matches('\n')).context("Failed to write stdout")?;
            out.flush().context("Failed to flush stdout")?;
        }
        printed = text;
    }

    Ok(())
}
