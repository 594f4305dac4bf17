// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Composition root: the one place in this workspace that constructs every
//! service and wires them together. Splits argument parsing from the async
//! body and does not daemonize itself (`dexd` doesn't fork to the
//! background; an operator wanting that wraps it the usual way, e.g.
//! `systemd` or `nohup`).

mod adapters;
mod cli;
mod config;

use adapters::{ClosedMasternodeRegistry, FileWallet, LoopbackTransport, StandaloneChain};
use clap::Parser;
use cli::{Cli, Command, SettingsAction, SyncAction};
use config::DexConfig;
use dex_crypto::Signer;
use dex_manager::{DraftInput, OfferManager};
use dex_periodic::PeriodicTasks;
use dex_pool::UnconfirmedPool;
use dex_rpc::{EditOfferRequest, RpcHandler};
use dex_store::{CatalogStore, OfferFilter};
use dex_sync::SyncEngine;
use dex_types::{ChainView, MasternodeRegistry, OfferHash, Transport, TransactionSource, Wallet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

/// Every service handle the composition root builds, threaded into
/// whichever command the caller asked for: one struct of `Arc`-shared
/// collaborators, built once per process.
struct Services {
    rpc: RpcHandler,
    sync: Arc<SyncEngine>,
    periodic: PeriodicTasks,
}

fn build_services(config: &DexConfig) -> anyhow::Result<Services> {
    let catalog = Arc::new(CatalogStore::open(&config.store_path, config.max_pool_size)?);
    let pool_new = Arc::new(UnconfirmedPool::new("new"));

    let wallet: Arc<dyn Wallet> = Arc::new(FileWallet::open(&config.keystore_path)?);
    let transport: Arc<dyn Transport> = Arc::new(LoopbackTransport);
    let chain = Arc::new(StandaloneChain::new(config.network.is_testnet()));
    let chain_view: Arc<dyn ChainView> = chain.clone();
    let tx_source: Arc<dyn TransactionSource> = chain;
    let registry: Arc<dyn MasternodeRegistry> = Arc::new(ClosedMasternodeRegistry);

    let signer = Arc::new(Signer::new(wallet.clone()));
    let manager = Arc::new(OfferManager::new(
        catalog.clone(),
        pool_new.clone(),
        signer,
        wallet.clone(),
        transport.clone(),
        tx_source.clone(),
    ));
    let sync = Arc::new(SyncEngine::new(
        catalog.clone(),
        pool_new.clone(),
        transport,
        registry,
        chain_view,
        tx_source.clone(),
        wallet,
        true,
    ));
    let periodic = PeriodicTasks::new(
        config.periodic.clone().into(),
        catalog.clone(),
        pool_new.clone(),
        manager.clone(),
        sync.clone(),
        tx_source,
    );
    let rpc = RpcHandler::new(catalog, pool_new, manager.clone(), sync.clone());

    Ok(Services { rpc, sync, periodic })
}

async fn run_daemon(services: Services) -> anyhow::Result<()> {
    log::info!("dexd: starting periodic tasks");
    let mut join_set = services.periodic.spawn();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("dexd: received interrupt, shutting down");
        }
        res = join_set.join_next() => {
            if let Some(Err(e)) = res {
                log::error!("dexd: a periodic task panicked: {e}");
            }
        }
    }
    join_set.abort_all();
    while join_set.join_next().await.is_some() {}
    Ok(())
}

fn parse_hash(s: &str) -> anyhow::Result<OfferHash> {
    OfferHash::from_str(s).map_err(|e| anyhow::anyhow!("invalid offer hash `{s}`: {e}"))
}

async fn run_command(services: &Services, command: Command) -> anyhow::Result<()> {
    let now = now_secs();
    match command {
        Command::Daemon => unreachable!("handled by caller"),
        Command::ListOffers {
            offer_type,
            country,
            currency,
            method,
            limit,
            offset,
        } => {
            let filter = OfferFilter {
                country_iso: country,
                currency_iso: currency,
                payment_method: method,
            };
            let offers = services.rpc.list_offers(offer_type.into(), filter, limit, offset)?;
            println!("{}", serde_json::to_string_pretty(&offers)?);
        }
        Command::ListMyOffers { status } => {
            let status_filter = status
                .map(|s| serde_json::from_value(serde_json::Value::String(s)))
                .transpose()?;
            let offers = services.rpc.list_my_offers(status_filter)?;
            println!("{}", serde_json::to_string_pretty(&offers)?);
        }
        Command::AddOffer { json } => {
            let input: DraftInput = serde_json::from_str(&json)?;
            let record = services.rpc.add_offer(input, now).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::EditOffer { hash, json } => {
            let hash = parse_hash(&hash)?;
            let edit: EditOfferRequest = serde_json::from_str(&json)?;
            let record = services.rpc.edit_offer(hash, edit, now).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::SendOffer { hash } => {
            let hash = parse_hash(&hash)?;
            let record = services.rpc.send_offer(hash, now).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::DeleteOffer { hash } => {
            let hash = parse_hash(&hash)?;
            let removed = services.rpc.delete_offer(hash, now).await?;
            println!("{}", serde_json::to_string(&removed)?);
        }
        Command::GetOffer { hash } => {
            let hash = parse_hash(&hash)?;
            let offer = services.rpc.get_offer(hash)?;
            println!("{}", serde_json::to_string_pretty(&offer)?);
        }
        Command::Sync { action } => match action {
            SyncAction::Status => {
                let snapshot = services.rpc.sync_status();
                println!("{snapshot:#?}");
            }
            SyncAction::Reset => {
                let started = services.rpc.sync_reset().await?;
                println!("{{\"restarted\": {started}}}");
            }
            SyncAction::ForceSynced => {
                services.rpc.sync_force_synced();
                println!("{{\"forced\": true}}");
            }
        },
        Command::Settings { action } => match action {
            SettingsAction::Maxoutput { n } => {
                services.rpc.settings_maxoutput(n);
                println!("{{\"max_output\": {n}}}");
            }
        },
        Command::Info => {
            let info = services.rpc.info()?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = DexConfig::load(&cli.config)?;
    let services = build_services(&config)?;

    if matches!(cli.command, Command::Daemon) {
        // Attempt one immediate sync round so a freshly started daemon
        // doesn't wait a full kickoff interval before reconciling.
        if let Err(e) = services.sync.start().await {
            log::warn!("dexd: initial sync start failed: {e}");
        }
        run_daemon(services).await
    } else {
        run_command(&services, cli.command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_services_opens_an_in_memory_style_store_on_a_temp_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DexConfig::default();
        config.store_path = dir.path().join("catalog.sqlite3");
        config.keystore_path = dir.path().join("keystore.json");
        let services = build_services(&config).unwrap();
        let info = services.rpc.info().unwrap();
        assert_eq!(info.buy, 0);
        assert_eq!(info.sell, 0);
    }
}
