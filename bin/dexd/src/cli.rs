// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Command-line surface, built with `clap`'s derive macros.
//! Subcommands mirror the RPC surface one-to-one; the
//! actual command behavior lives in `dex_rpc::RpcHandler` and
//! `dex_manager::OfferManager`, this module only parses arguments and
//! shapes output.

use clap::{Parser, Subcommand};
use dex_types::OfferType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dexd", author, version, about = "Offer mesh gossip and synchronization daemon")]
pub struct Cli {
    /// Path to a TOML config file. Missing is not an error: defaults apply.
    #[arg(long, default_value = "dexd.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Runs the sync engine and periodic tasks forever, until interrupted.
    Daemon,
    /// `list_offers(type, country?, currency?, method?, limit?, offset?)`.
    ListOffers {
        #[arg(value_enum)]
        offer_type: CliOfferType,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        method: Option<u32>,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// `list_my_offers(...)` with an extra status filter.
    ListMyOffers {
        #[arg(long)]
        status: Option<String>,
    },
    /// `add_offer(json)`: draft insert, generates and stores a fresh keypair.
    AddOffer {
        /// JSON-encoded `DraftInput`.
        json: String,
    },
    /// `edit_offer(hash, json)`.
    EditOffer {
        hash: String,
        /// JSON-encoded `EditOfferRequest`.
        json: String,
    },
    /// `send_offer(hash)`: promotes a draft by paying the fee and broadcasting.
    SendOffer { hash: String },
    /// `delete_offer(hash)`.
    DeleteOffer { hash: String },
    /// `get_offer(hash)`: read-through CatalogStore then UnconfirmedPool.
    GetOffer { hash: String },
    /// `sync(status|reset|force-synced)`.
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
    /// `settings maxoutput N`.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// `info`: counts of buy / sell / my / unconfirmed.
    Info,
}

#[derive(Subcommand)]
pub enum SyncAction {
    Status,
    Reset,
    ForceSynced,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    Maxoutput { n: u64 },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum CliOfferType {
    Buy,
    Sell,
}

impl From<CliOfferType> for OfferType {
    fn from(v: CliOfferType) -> Self {
        match v {
            CliOfferType::Buy => OfferType::Buy,
            CliOfferType::Sell => OfferType::Sell,
        }
    }
}
