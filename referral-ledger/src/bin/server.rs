//! Ledger server binary

use referral_ledger::{snapshot::LedgerSnapshot, spawn_ledger_actor, Config, Custody, Ledger};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Referral Ledger Server");

    // Load configuration
    let config = match std::env::var("REFERRAL_CONFIG") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::from_env()?,
    };

    // Open ledger; the in-memory wallet book starts empty, so seed the
    // custody account with the restored custody total.
    let custody = Arc::new(Custody::new());
    let ledger = match config.snapshot.path.clone().filter(|p| p.exists()) {
        Some(path) => {
            let snapshot = LedgerSnapshot::read_from(&path)?;
            custody.fund(&config.asset.custody_id(), snapshot.treasury.custody);
            Ledger::restore(config, custody, snapshot)?
        }
        None => Ledger::new(config, custody)?,
    };
    tracing::info!(
        participants = ledger.participant_count(),
        custody = %ledger.custody(),
        "Ledger opened successfully"
    );

    let (handle, task) = spawn_ledger_actor(ledger);

    // TODO: Expose the handle over gRPC; until then the actor only runs
    // until interrupted.
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down ledger server");
    handle.shutdown().await?;
    task.await?;
    Ok(())
}
