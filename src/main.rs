use anyhow::Context;
use biblioteca_app::modules;
use biblioteca_db::Database;
use biblioteca_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load biblioteca settings")?;

    biblioteca_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "biblioteca-app bootstrap starting"
    );

    let db = Database::connect(&settings.database)
        .await
        .context("failed to open the database pool")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &db);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("biblioteca-app bootstrap complete");

    let served = biblioteca_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    db.close().await;

    served
}
