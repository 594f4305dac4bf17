// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Schema migration. Applied with `CREATE TABLE IF NOT EXISTS` on every
//! open.

use rusqlite::Connection;

const OFFER_COLUMNS: &str = "
    hash TEXT PRIMARY KEY,
    id_transaction TEXT,
    country_iso TEXT NOT NULL,
    currency_iso TEXT NOT NULL,
    payment_method INTEGER NOT NULL,
    price INTEGER NOT NULL,
    min_amount INTEGER NOT NULL,
    short_info TEXT NOT NULL,
    details TEXT NOT NULL,
    pub_key BLOB NOT NULL,
    time_create INTEGER NOT NULL,
    time_expiration INTEGER NOT NULL,
    editing_version INTEGER NOT NULL,
    edit_hash TEXT NOT NULL,
    edit_sign BLOB,
    time_modification INTEGER NOT NULL
";

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS offers_buy ({cols});
        CREATE INDEX IF NOT EXISTS idx_offers_buy_mod ON offers_buy(time_modification);
        CREATE INDEX IF NOT EXISTS idx_offers_buy_exp ON offers_buy(time_expiration);

        CREATE TABLE IF NOT EXISTS offers_sell ({cols});
        CREATE INDEX IF NOT EXISTS idx_offers_sell_mod ON offers_sell(time_modification);
        CREATE INDEX IF NOT EXISTS idx_offers_sell_exp ON offers_sell(time_expiration);

        CREATE TABLE IF NOT EXISTS my_offers (
            {cols},
            offer_type TEXT NOT NULL,
            status TEXT NOT NULL,
            fee_tx_hash TEXT,
            is_broadcast INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_my_offers_status ON my_offers(status);

        CREATE TABLE IF NOT EXISTS countries (
            iso TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS currencies (
            iso TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS payment_methods (
            code INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS filter_presets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            filter_json TEXT NOT NULL
        );
        ",
        cols = OFFER_COLUMNS
    ))
}
