//! One-shot portfolio reconciliation against ImageKit.

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use db::DBService;
use secrecy::ExposeSecret;
use services::services::{
    config::Config,
    imagekit::{ImageKitClient, MediaLibrary},
    portfolio_store::{PgPortfolioStore, PortfolioStore},
    portfolio_sync::PortfolioSync,
};
use tracing::info;
use utils::logging::init_tracing;

#[derive(Debug, Parser)]
#[command(about = "Reconcile the portfolio tables with the ImageKit folder tree")]
struct Args {
    /// Print the planned actions without writing anything.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let config = Config::from_env()?;
    let db = DBService::connect(config.database_url.expose_secret())
        .await
        .context("connecting to the database")?;

    let store: Arc<dyn PortfolioStore> = Arc::new(PgPortfolioStore::new(db.pool.clone()));
    let library: Arc<dyn MediaLibrary> = Arc::new(ImageKitClient::from_config(&config.imagekit)?);
    let sync = PortfolioSync::new(
        store,
        library,
        &config.imagekit.portfolio_root,
        &config.imagekit.public_url,
    );

    if args.dry_run {
        let preview = sync.preview().await?;
        info!(actions = preview.actions.len(), "Dry run, nothing written");
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let report = sync.run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_clean() {
        bail!("portfolio sync finished with {} errors", report.errors.len());
    }
    Ok(())
}
