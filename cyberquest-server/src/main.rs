mod shutdown;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, filter::filter_fn, layer::SubscriberExt, util::SubscriberInitExt,
};

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use cyberquest_core::{
    CredentialService, Data, XpPolicy,
    config::{AdminBootstrap, Config},
    error::expose_internal_details,
};
use cyberquest_database::{
    Database, MIGRATOR,
    impls::{levels::seed_default_levels, users::upsert_admin},
};
use cyberquest_llm::QuestionGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        !(metadata.target().starts_with("sqlx::query") && *metadata.level() > tracing::Level::WARN)
    }));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    let config = Config::load()?;
    expose_internal_details(config.development);

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!("PostgreSQL connection established.");

    let db = Database::new(db_pool);

    if config.auto_run_migrations {
        MIGRATOR.run(db.pool()).await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    let seeded = seed_default_levels(&db).await?;
    if seeded > 0 {
        info!(seeded, "Seeded default levels.");
    }

    let credentials = CredentialService::new(&config.jwt_secret, config.token_ttl_hours);

    if let Some(admin) = &config.admin {
        bootstrap_admin(&db, &credentials, admin).await?;
    }

    let policy = match &config.xp_policy_path {
        Some(path) => {
            let policy = XpPolicy::from_json_file(path)?;
            info!(path = %path.display(), "Loaded XP policy override.");
            policy
        }
        None => XpPolicy::default(),
    };

    let generator = QuestionGenerator::from_env_optional()?;
    match &generator {
        Some(generator) => info!(model = generator.model(), "Question generator enabled."),
        None => info!(
            "Question generator disabled (missing/empty OLLAMA_* vars or OLLAMA_ENABLED=false)."
        ),
    }

    let data = Data {
        db,
        generator,
        credentials,
        policy: Arc::new(policy),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "CyberQuest is listening.");

    axum::serve(listener, cyberquest_api::router(data))
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

    info!("Server shut down.");
    Ok(())
}

async fn bootstrap_admin(
    db: &Database,
    credentials: &CredentialService,
    admin: &AdminBootstrap,
) -> anyhow::Result<()> {
    if admin.password.chars().count() < 6 {
        warn!(
            username = %admin.username,
            "ADMIN_PASSWORD is shorter than 6 characters; skipping admin bootstrap"
        );
        return Ok(());
    }

    let password_hash = credentials.hash_password(&admin.password)?;
    let account = upsert_admin(db, &admin.username, &admin.email, &password_hash).await?;
    info!(user_id = account.id, username = %account.username, "Admin account ready.");
    Ok(())
}
