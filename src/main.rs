use anyhow::Context;
use clap::{Parser, Subcommand};
use eframe::egui;
use std::num::NonZeroU32;
use std::path::PathBuf;
use step_clicker::app::AppState;
use step_clicker::error::StoreError;
use step_clicker::logging;
use step_clicker::session::{Backend, PlaybackSession, RunOptions};
use step_clicker::settings::{Settings, SETTINGS_FILE};
use step_clicker::store::ConfigStore;

#[derive(Parser)]
#[command(name = "step_clicker", version, about = "Replay named click sequences against a window")]
struct Cli {
    /// Settings file.
    #[arg(long, default_value = SETTINGS_FILE)]
    settings: PathBuf,
    /// Config store, overriding the path from the settings file.
    #[arg(long)]
    store: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the editor window (default).
    Gui,
    /// Print every config and its steps.
    List,
    /// Print the titles of windows that can be targeted.
    Windows,
    /// Play a config without the GUI and wait for it to finish.
    Run {
        #[arg(long)]
        config: String,
        /// Title (or part of it) of the target window.
        #[arg(long)]
        window: String,
        #[arg(long, default_value = "1")]
        repeat: NonZeroU32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.settings)
        .with_context(|| format!("failed to read settings from {}", cli.settings.display()))?;
    logging::init(cli.debug || settings.debug_logging);

    let store_path = cli.store.clone().unwrap_or_else(|| PathBuf::from(&settings.store_path));
    let session = PlaybackSession::new(Backend::platform(&settings), RunOptions::from(&settings));

    match cli.command.unwrap_or(Command::Gui) {
        Command::Gui => run_gui(store_path, session),
        Command::List => {
            let store = ConfigStore::load(&store_path)?;
            for config in store.configs() {
                println!("{}", config.name);
                for (i, step) in config.steps.iter().enumerate() {
                    println!("  {}", step.summary(i));
                }
            }
            Ok(())
        }
        Command::Windows => {
            for title in session.windows().titles() {
                println!("{title}");
            }
            Ok(())
        }
        Command::Run { config, window, repeat } => {
            let store = ConfigStore::load(&store_path)?;
            let config = store
                .get(&config)
                .with_context(|| format!("no config named '{config}' in {}", store_path.display()))?;
            let mut session = session;
            let handle = session.start_by_title(config, repeat, &window)?;
            println!(
                "Playing '{}' on '{}' x{} (press {} to stop)",
                config.name,
                handle.title,
                repeat,
                session.options().stop_key
            );
            if let Some(report) = session.wait().transpose()? {
                println!(
                    "{} clicks, {} skipped, {} repeats{}",
                    report.clicks,
                    report.skipped,
                    report.repeats_completed,
                    if report.cancelled { " (stopped)" } else { "" }
                );
            }
            Ok(())
        }
    }
}

fn run_gui(store_path: PathBuf, session: PlaybackSession) -> anyhow::Result<()> {
    let (store, load_warning) = match ConfigStore::load(&store_path) {
        Ok(store) => (store, None),
        Err(e @ StoreError::Corrupt { .. }) => {
            // Saving on exit overwrites the store, so keep the unreadable copy.
            let backup = store_path.with_extension("json.bak");
            let kept = match std::fs::copy(&store_path, &backup) {
                Ok(_) => format!(" The old file was copied to {}.", backup.display()),
                Err(copy_err) => {
                    tracing::error!(error = %copy_err, "failed to back up corrupt store");
                    String::new()
                }
            };
            tracing::error!(error = %e, "starting with an empty config list");
            (ConfigStore::new(), Some(format!("{e}. Starting with an empty config list.{kept}")))
        }
        Err(e) => return Err(e.into()),
    };

    let mut opts = eframe::NativeOptions::default();
    opts.viewport.inner_size = Some(egui::vec2(560.0, 620.0));
    opts.viewport.resizable = Some(true);
    opts.follow_system_theme = true;

    eframe::run_native(
        "Step Clicker",
        opts,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            let mut app = AppState::new(store, store_path, session);
            if let Some(msg) = load_warning {
                app.warn(msg);
            }
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to start GUI: {e}"))
}
