use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use btec_api::config::Config;
use btec_api::{db, router, AuthContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::from_env().context("Could not load configuration")?;
    if config.admin.is_none() {
        log::warn!("ADMIN_USER/ADMIN_PASS not set, admin login is disabled");
    }

    let pg = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await
        .context("Could not connect to the database")?;
    db::prepare_schema(&pg).await?;

    let auth = AuthContext::from_config(&config)?;
    let app = router(pg, auth);

    log::info!("Starting BTEC API HTTP Server on http://{}", config.bind_addr);
    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
