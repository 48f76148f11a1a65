use clap::Parser;
use soldier_lookup::core::DataAccess;
use soldier_lookup::utils::error::{ErrorSeverity, LookupError};
use soldier_lookup::utils::{logger, validation::Validate};
use soldier_lookup::{
    render, CliConfig, FixtureStore, HttpDocumentStore, LookupFacade, LookupScreen, VisitSampler,
};

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 2,      // 輸入或查無資料
        ErrorSeverity::Medium => 3,   // 連線問題，可重試
        ErrorSeverity::High => 1,     // 設定或資料錯誤
        ErrorSeverity::Critical => 4, // 系統錯誤
    }
}

fn fail(e: &LookupError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e.severity()));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 先讀設定檔，日誌格式可能由它決定
    let file = match config.load_toml() {
        Ok(file) => file,
        Err(e) => {
            eprintln!("❌ Failed to load config file: {}", e);
            std::process::exit(exit_code(e.severity()));
        }
    };

    let level = file.as_ref().and_then(|f| f.logging.level.as_deref());
    if config.json_logs(file.as_ref()) {
        logger::init_json_logger(config.verbose, level);
    } else {
        logger::init_cli_logger(config.verbose, level);
    }

    tracing::info!("🚀 Starting soldier-lookup");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        fail(&e);
    }
    if let Some(file) = &file {
        if let Err(e) = file.validate() {
            fail(&e);
        }
    }

    let sampler = VisitSampler::from_seed(config.seed(file.as_ref()));

    match &config.fixture {
        Some(path) => {
            tracing::info!("📁 Using fixture: {}", path);
            let store = FixtureStore::from_file(path).unwrap_or_else(|e| fail(&e));
            run(&config, store, sampler).await
        }
        None => {
            let store_config = config
                .store_config(file.as_ref())
                .unwrap_or_else(|e| fail(&e));
            tracing::info!("🌐 Using record store: {}", store_config.base_url);
            let store = HttpDocumentStore::new(&store_config).unwrap_or_else(|e| fail(&e));
            run(&config, store, sampler).await
        }
    }
}

async fn run<D: DataAccess + 'static>(
    config: &CliConfig,
    store: D,
    sampler: VisitSampler,
) -> anyhow::Result<()> {
    let screen = LookupScreen::new(LookupFacade::new(store, sampler));

    let task = match (&config.handle, &config.identifier) {
        (Some(handle), _) => screen.load_by_handle(handle.clone()),
        (None, identifier) => {
            screen.set_query_text(identifier.clone().unwrap_or_default());
            screen.load_by_id()
        }
    };
    task.await?;

    let state = screen.snapshot();
    if let Some(message) = state.error {
        let severity = state.error_severity.unwrap_or(ErrorSeverity::Low);
        tracing::warn!(
            "Lookup for '{}' failed: {} (Severity: {:?})",
            state.query_text,
            message,
            severity
        );
        eprintln!("❌ {}", message);
        std::process::exit(exit_code(severity));
    }

    println!("{}", render(&state.bundle, config.format)?);
    tracing::info!("✅ Lookup for {} completed", state.query_text);
    Ok(())
}
