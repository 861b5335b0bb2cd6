use std::sync::Arc;

use lead_assist::chat::{EngineDeps, assist_routes};
use lead_assist::config::Config;
use lead_assist::handoff::LogSink;
use lead_assist::interpreter::HttpInterpreter;
use lead_assist::store::LibSqlStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export INTERPRETER_URL=http://localhost:9090");
        std::process::exit(1);
    });

    eprintln!("💼 Lead Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Interpreter: {}", config.interpreter.base_url);
    eprintln!("   Qualify API: http://{}/api/assist/qualify", config.bind_addr);
    eprintln!(
        "   Requirement API: http://{}/api/assist/requirement",
        config.bind_addr
    );

    // ── Session store ────────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let store = Arc::new(LibSqlStore::new_local(db_path).await.unwrap_or_else(|e| {
        eprintln!("Error: Failed to open database at {}: {}", config.db_path, e);
        std::process::exit(1);
    }));
    eprintln!("   Database: {}", config.db_path);

    // ── Interpretation service client ────────────────────────────────────
    let interpreter = Arc::new(HttpInterpreter::new(&config.interpreter).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }));

    let deps = EngineDeps {
        interpreter,
        store,
        sink: Arc::new(LogSink),
    };

    let app = assist_routes(deps);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Assistant API started");
    axum::serve(listener, app).await?;

    Ok(())
}
