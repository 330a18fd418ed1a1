//! SecurityBot-WA - Entry Point
//!
//! Runs the WhatsApp webhook server.

use securitybot_wa::{
    AppState, BotDeps, Config, DeepSeekClient, ImageArchive, MessageDedup, SecurityBot,
    TesseractOcr, UserLocks, UserStore, WhatsAppChannel,
};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("SecurityBot-WA v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: securitybot-wa");
        println!();
        println!("Environment variables:");
        println!("  VERIFY_TOKEN              Webhook verification token");
        println!("  ACCESS_TOKEN              WhatsApp Cloud API token");
        println!("  PHONE_NUMBER_ID           WhatsApp sender phone number id");
        println!("  DEEPSEEK_API_KEY          DeepSeek API key");
        println!("  SECURITYBOT_DB_PATH       SQLite database (default: usuarios_bot.db)");
        println!("  SECURITYBOT_IMAGES_DIR    Image archive (default: imagenes_recibidas)");
        println!("  TESSERACT_CMD_PATH        Tesseract binary (default: tesseract)");
        println!("  SECURITYBOT_BIND          Listen address (default: 0.0.0.0:8000)");
        println!("  LOG_FORMAT                'json' for JSON logs on stderr");
        return Ok(());
    }

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_ansi(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    info!("SecurityBot-WA v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    config.warn_missing();

    let store = Arc::new(UserStore::open(&config.db_path)?);
    let ai = DeepSeekClient::from_config(&config)?;
    if !ai.is_available() {
        info!("DeepSeek: UNAVAILABLE (every AI step will ask the user to retry)");
    }
    let whatsapp = Arc::new(WhatsAppChannel::from_config(&config)?);

    info!("User database: {:?}", config.db_path);
    info!("Image archive: {:?}", config.images_dir);

    let bot = SecurityBot::new(BotDeps {
        store,
        ai: Arc::new(ai),
        sender: whatsapp.clone(),
        media: whatsapp,
        ocr: Arc::new(TesseractOcr::new(&config.tesseract_cmd)),
        archive: Arc::new(ImageArchive::new(&config.images_dir)),
        dedup: Arc::new(MessageDedup::default()),
        locks: Arc::new(UserLocks::new()),
    });

    let state = AppState {
        bot,
        verify_token: config.verify_token.clone(),
    };
    securitybot_wa::server::serve(state, config.bind_addr).await?;

    Ok(())
}
