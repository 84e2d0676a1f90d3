//! class_planner_server: REST back-end for the class planner.
//!
//! Usage:
//!   class_planner_server --migrate
//!   class_planner_server --grant-admin someone@example.com
//!   class_planner_server --in-memory
//!
//! Configuration comes from the environment (see `class_planner::config`).

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use class_planner::api::{build_router, cors_layer, AppState};
use class_planner::config::ServerConfig;
use class_planner::database::{mask_database_url, DatabaseConfig, DatabaseManager};
use class_planner::models::NewPerson;
use class_planner::slack::SlackClient;
use class_planner::store::{InMemoryStore, PlannerStore};
use class_planner::TokenIssuer;

const DEV_JWT_SECRET: &str = "class-planner-dev-secret";

#[derive(Parser)]
#[command(name = "class_planner_server")]
#[command(about = "Class planner REST back-end")]
struct Cli {
    /// Listen address, overrides PORT / BIND_ADDR
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Serve demo data from memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,

    /// Apply pending migrations before serving
    #[arg(long)]
    migrate: bool,

    /// Grant admin rights to the person with this email, then exit
    #[arg(long, value_name = "EMAIL")]
    grant_admin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,class_planner=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::from_env()?;
    let bind_addr = cli.bind.clone().unwrap_or_else(|| config.bind_addr.clone());

    let (store, tokens) = if cli.in_memory {
        in_memory_state(&config).await?
    } else {
        let tokens = TokenIssuer::from_secret(
            config.require_jwt_secret()?.as_bytes(),
            chrono::Duration::hours(config.jwt_ttl_hours),
        );
        let store = connect_database(&config, &cli).await?;
        match store {
            Some(store) => (store, tokens),
            // --grant-admin done
            None => return Ok(()),
        }
    };

    let mut state = AppState::new(store, tokens);
    match config.slack.clone() {
        Some(slack) => {
            info!("Slack sign-in enabled (api base {})", slack.api_base);
            state = state.with_slack(SlackClient::new(slack)?);
        }
        None => warn!("SLACK_CLIENT_ID / SLACK_CLIENT_SECRET not set; Slack sign-in disabled"),
    }

    let app = build_router(state, cors_layer(config.cors_allow_origin.as_deref()));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;
    info!("class_planner_server listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

/// Connect, migrate and handle `--grant-admin`. Returns `None` when the
/// process should exit instead of serving.
async fn connect_database(
    config: &ServerConfig,
    cli: &Cli,
) -> Result<Option<Arc<dyn PlannerStore>>> {
    let database_url = config.require_database_url()?;
    let db_config = DatabaseConfig {
        database_url: database_url.to_string(),
        max_connections: config.database_pool_size,
        ..DatabaseConfig::default()
    };
    let db = DatabaseManager::new(db_config)
        .await
        .with_context(|| format!("failed to connect to {}", mask_database_url(database_url)))?;
    db.test_connection()
        .await
        .context("database is not answering queries")?;

    if cli.migrate {
        db.run_migrations().await.context("migrations failed")?;
        info!("Migrations applied");
    }

    let store = db.store();

    if let Some(email) = &cli.grant_admin {
        let person = store
            .find_person_by_email(email)
            .await?
            .with_context(|| format!("no person with email {email}"))?;
        store.people.set_admin(person.id, true).await?;
        info!(person_id = person.id, "granted admin to {}", person.display_name());
        db.close().await;
        return Ok(None);
    }

    info!("{}", db.connection_stats());
    let store: Arc<dyn PlannerStore> = Arc::new(store);
    Ok(Some(store))
}

/// Demo store plus an admin account whose token is logged for local use.
async fn in_memory_state(config: &ServerConfig) -> Result<(Arc<dyn PlannerStore>, TokenIssuer)> {
    let secret = match config.jwt_secret.as_deref() {
        Some(secret) => secret.to_string(),
        None => {
            warn!("JWT_SECRET not set; using the development secret");
            DEV_JWT_SECRET.to_string()
        }
    };
    let tokens = TokenIssuer::from_secret(
        secret.as_bytes(),
        chrono::Duration::hours(config.jwt_ttl_hours),
    );

    let store = InMemoryStore::with_demo_data().await?;
    let admin = store
        .create_person(&NewPerson {
            slack_id: None,
            slack_photo_link: None,
            slack_firstname: "Demo".into(),
            slack_lastname: "Admin".into(),
            slack_title: "Coordinator".into(),
            slack_email: "admin@example.com".into(),
        })
        .await?;
    store.set_admin(admin.id, true).await?;
    let admin = store
        .get_person(admin.id)
        .await?
        .context("demo admin vanished")?;

    let issued = tokens.issue(&admin)?;
    info!("In-memory mode: demo admin token (expires {}): {}", issued.expires_at, issued.token);

    let store: Arc<dyn PlannerStore> = Arc::new(store);
    Ok((store, tokens))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
