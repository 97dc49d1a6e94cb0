// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! PnW dashboard credential server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pnw_server::{create_router, AppState};
use pnw_server_audit::{AuditService, AuditSink, SqliteAuditSink, TracingAuditSink};
use pnw_server_config::{LogFormat, LoggingConfig, ServerConfig};
use pnw_server_credentials::{CredentialCipher, CredentialService, SqliteCredentialStore};
use pnw_server_db::RateLimitRepository;
use pnw_server_game_api::{GameApiValidator, ReqwestTransport};
use sqlx::SqlitePool;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const AUDIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// pnw-server - links Politics & War API keys to dashboard accounts.
#[derive(Parser, Debug)]
#[command(name = "pnw-server", about = "Politics & War credential server", version)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/pnw/server.toml)
	#[arg(long, env = "PNW_SERVER_CONFIG")]
	config: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);
	match logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

fn build_audit(config: &ServerConfig, pool: &SqlitePool) -> Option<AuditService> {
	if !config.audit.enabled {
		tracing::info!("audit logging disabled");
		return None;
	}

	let mut sinks: Vec<Arc<dyn AuditSink>> = vec![Arc::new(TracingAuditSink::new())];
	if config.audit.sqlite_sink {
		sinks.push(Arc::new(SqliteAuditSink::new(pool.clone())));
	}
	Some(AuditService::new(
		config.audit.queue_capacity,
		config.audit.queue_overflow_policy,
		sinks,
	))
}

fn build_cipher(config: &ServerConfig) -> CredentialCipher {
	match config.credentials.master_key.clone() {
		Some(master_key) => {
			CredentialCipher::new(master_key, config.credentials.pbkdf2_iterations)
		}
		None => CredentialCipher::unconfigured(),
	}
}

/// Drop rate-limit windows that can no longer affect an estimate.
fn spawn_rate_limit_pruner(pool: SqlitePool, window_secs: u64) {
	let repo = RateLimitRepository::new(pool);
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(Duration::from_secs(window_secs.max(1)));
		loop {
			interval.tick().await;
			match repo.prune_expired(chrono::Utc::now(), window_secs).await {
				Ok(0) => {}
				Ok(pruned) => tracing::debug!(pruned, "pruned rate limit windows"),
				Err(e) => tracing::warn!(error = %e, "failed to prune rate limit windows"),
			}
		}
	});
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => pnw_server_config::load_config_with_file(path)?,
		None => pnw_server_config::load_config()?,
	};

	init_tracing(&config.logging);

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		game_api = %config.game_api.url,
		"starting pnw-server"
	);

	let pool = pnw_server_db::create_pool(&config.database.url).await?;
	pnw_server_db::run_migrations(&pool).await?;

	let transport = ReqwestTransport::new(config.game_api.url.clone())?;
	let validator = GameApiValidator::new(transport)
		.with_timeouts(config.game_api.validation_timeout, config.game_api.usage_timeout);

	let mut credentials = CredentialService::new(
		Arc::new(SqliteCredentialStore::new(pool.clone())),
		Arc::new(validator),
		Arc::new(build_cipher(&config)),
	);
	let audit = build_audit(&config, &pool);
	if let Some(audit) = &audit {
		credentials = credentials.with_audit(audit.clone());
	}

	if config.rate_limit.enabled {
		spawn_rate_limit_pruner(pool.clone(), config.rate_limit.window_secs);
	}

	let state = AppState::new(pool, credentials, config.rate_limit.clone());

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	if let Some(audit) = audit {
		tracing::info!("Draining audit queue...");
		if let Err(e) = audit.shutdown(AUDIT_DRAIN_TIMEOUT).await {
			tracing::warn!(error = %e, "audit queue not fully drained");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
