use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use viveka::cli::{Console, ConsoleRenderer};
use viveka::config::AppConfig;
use viveka::llm::{AgentGateway, GeminiGateway, ScriptedGateway};
use viveka::logging;
use viveka::persona::{Locale, VIVEKA_SYSTEM_PROMPT};
use viveka::session::ChatController;
use viveka::shell::{normalize_display_name, App};
use viveka::store::FileStore;

/// ViVeka - a reflective wellness companion in the terminal
#[derive(Parser, Debug)]
#[command(name = "viveka")]
#[command(version)]
#[command(about = "Chat with ViVeka, an empathetic psychology companion.", long_about = None)]
struct Cli {
    /// Display name (skips the login prompt)
    #[arg(short, long)]
    name: Option<String>,

    /// Chat with a scripted local agent instead of Gemini
    #[arg(long)]
    offline: bool,

    /// Directory for the saved conversation and logs
    #[arg(long, env = "VIVEKA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Gemini model to use
    #[arg(long)]
    model: Option<String>,
}

fn read_display_name(console: &Console) -> anyhow::Result<Option<String>> {
    let stdin = io::stdin();
    loop {
        print!("Nama kamu: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match normalize_display_name(&line) {
            Some(name) => return Ok(Some(name)),
            None => console.print_system("Nama tidak boleh kosong."),
        }
    }
}

fn build_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn AgentGateway>> {
    if config.offline {
        tracing::info!("Offline mode, using the scripted gateway");
        let gateway = ScriptedGateway::new().with_fragment_delay(Duration::from_millis(60));
        return Ok(Arc::new(gateway));
    }

    let gateway = GeminiGateway::from_config(&config.gemini)?
        .with_system_instruction(VIVEKA_SYSTEM_PROMPT);
    Ok(Arc::new(gateway))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()
        .context("Invalid configuration")?
        .with_offline(cli.offline);
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(name) = cli.name.as_deref().and_then(normalize_display_name) {
        config = config.with_display_name(name);
    }
    config.validate()?;

    let _log_guard = logging::init_logging(&config.log)?;
    tracing::info!("=== ViVeka Starting ===");

    let console = Arc::new(Console::new());

    let display_name = match config.display_name.clone() {
        Some(name) => name,
        None => match read_display_name(&console)? {
            Some(name) => name,
            None => return Ok(()),
        },
    };

    let gateway = build_gateway(&config)?;
    tracing::info!("Gateway: {} ({})", gateway.provider_name(), gateway.model());

    let store = FileStore::with_dir(&config.data_dir);
    store.ensure_dir()?;

    let chat = ChatController::new(gateway, Arc::new(store), Locale::default(), display_name);
    let app = App::new(chat).with_notifier(console.clone());

    ConsoleRenderer::new(app, console).run().await?;

    tracing::info!("=== ViVeka Shutting Down ===");
    Ok(())
}
