use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use bartender_bot::channels::{LineMessenger, Messenger, WebhookState, webhook_routes};
use bartender_bot::config::BotConfig;
use bartender_bot::dialogue::DialogueController;
use bartender_bot::llm::create_provider;
use bartender_bot::questionnaire::QuestionSequencer;
use bartender_bot::questionnaire::catalog::cocktail_questions;
use bartender_bot::recommend::RecommendationGenerator;
use bartender_bot::session::{self, InMemorySessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export CHANNEL_ACCESS_TOKEN=... CHANNEL_SECRET=... OPENAI_API_KEY=...");
            std::process::exit(1);
        }
    };

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_tracing(&config)?;

    eprintln!("🍸 Bartender Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Questions: {}", config.variant.len());
    eprintln!("   Answer policy: {:?}", config.dialogue.policy);
    eprintln!(
        "   Free-text chat: {}",
        if config.dialogue.free_text_chat {
            "enabled"
        } else {
            "disabled"
        }
    );
    eprintln!("   Webhook: http://{}/callback", config.server.bind_addr());

    // ── LLM ─────────────────────────────────────────────────────────────
    let llm = create_provider(&config.llm)?;
    let generator = Arc::new(RecommendationGenerator::new(llm, config.generator.clone()));

    // ── Sessions ────────────────────────────────────────────────────────
    let store = InMemorySessionStore::new();
    let _expiry_handle = session::spawn_expiry_task(
        store.clone(),
        config.session.ttl_chrono(),
        config.session.sweep_interval,
    );

    // ── Dialogue ────────────────────────────────────────────────────────
    let sequencer = QuestionSequencer::new(cocktail_questions(config.variant))?;
    let controller = Arc::new(DialogueController::new(
        store,
        Arc::new(sequencer),
        generator,
        config.dialogue.clone(),
    ));

    // ── Webhook server ──────────────────────────────────────────────────
    let messenger: Arc<dyn Messenger> = Arc::new(LineMessenger::new(&config.line));
    let app = webhook_routes(WebhookState {
        channel_secret: config.line.channel_secret.clone(),
        controller,
        messenger,
    });

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "Webhook server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Webhook server failed")?;

    tracing::info!("Shut down");
    Ok(())
}

/// Stderr logging, plus a daily rolling file when a log dir is configured.
fn init_tracing(
    config: &BotConfig,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "bartender-bot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
