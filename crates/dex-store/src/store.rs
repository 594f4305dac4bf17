// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! [`CatalogStore`]: the durable relational catalog of confirmed offers.
//! Pooled connections are shared for reads (WAL mode allows concurrent
//! readers); writes are serialized through [`CatalogStore::write_lock`]
//! before checking out a connection, so at most one writer is ever active,
//! matching the single-writer discipline described for this subsystem.

use crate::errors::Error;
use crate::reference::{self, FilterPreset, ReferenceEntry};
use crate::schema;
use dex_types::{MyOfferRecord, MyOfferStatus, OfferHash, OfferRecord, OfferType, PaymentMethod};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// The time-window selector for [`CatalogStore::hashes_and_versions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    Before(u64),
    After(u64),
    YoungTimeMod(u64),
}

/// AND-combined filter set for [`CatalogStore::list`]/[`CatalogStore::count`].
/// Every field is optional; an absent field imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferFilter {
    pub country_iso: Option<String>,
    pub currency_iso: Option<String>,
    pub payment_method: Option<u32>,
}

impl OfferFilter {
    fn where_clause(&self) -> (String, Vec<rusqlite::types::Value>) {
        let mut clauses = Vec::new();
        let mut params: Vec<rusqlite::types::Value> = Vec::new();
        if let Some(c) = &self.country_iso {
            clauses.push(format!("country_iso = ?{}", params.len() + 1));
            params.push(c.clone().into());
        }
        if let Some(c) = &self.currency_iso {
            clauses.push(format!("currency_iso = ?{}", params.len() + 1));
            params.push(c.clone().into());
        }
        if let Some(m) = self.payment_method {
            clauses.push(format!("payment_method = ?{}", params.len() + 1));
            params.push((m as i64).into());
        }
        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Ok,
    Failed,
}

/// Emitted on `subscribe()`'s channel after every mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: &'static str,
    pub operation: Operation,
    pub status: MutationStatus,
}

const CHANGE_CHANNEL_CAPACITY: usize = 256;

pub struct CatalogStore {
    pool: Pool<SqliteConnectionManager>,
    write_lock: Mutex<()>,
    changes: broadcast::Sender<ChangeEvent>,
    // Kept alive for the lifetime of an in-memory store: SQLite drops a
    // shared-cache memory database once its last connection closes.
    _memory_keepalive: Option<Connection>,
}

fn offer_table(offer_type: OfferType) -> &'static str {
    match offer_type {
        OfferType::Buy => "offers_buy",
        OfferType::Sell => "offers_sell",
    }
}

fn row_to_offer(row: &Row) -> rusqlite::Result<OfferRecord> {
    let hash: String = row.get("hash")?;
    let edit_hash: String = row.get("edit_hash")?;
    let offer_type_col: Option<String> = row.get("offer_type").optional_or_none();
    let offer_type = match offer_type_col {
        Some(s) if s == "sell" => OfferType::Sell,
        _ => OfferType::Buy,
    };
    Ok(OfferRecord {
        hash: OfferHash::from_str(&hash).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                "invalid hash hex".into(),
            )
        })?,
        id_transaction: row.get("id_transaction")?,
        offer_type,
        country_iso: row.get("country_iso")?,
        currency_iso: row.get("currency_iso")?,
        payment_method: PaymentMethod(row.get::<_, i64>("payment_method")? as u32),
        price: row.get::<_, i64>("price")? as u64,
        min_amount: row.get::<_, i64>("min_amount")? as u64,
        short_info: row.get("short_info")?,
        details: row.get("details")?,
        pub_key: row.get("pub_key")?,
        time_create: row.get::<_, i64>("time_create")? as u64,
        time_expiration: row.get::<_, i64>("time_expiration")? as u64,
        editing_version: row.get::<_, i64>("editing_version")? as u32,
        edit_hash: OfferHash::from_str(&edit_hash).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                "invalid edit_hash hex".into(),
            )
        })?,
        edit_sign: row.get("edit_sign")?,
    })
}

// rusqlite's `Row::get` on a column absent from a `SELECT *` against a
// table without `offer_type` (the buy/sell tables) errors rather than
// returning `None`; this small helper downgrades that specific case so
// `row_to_offer` works against all three offer tables uniformly.
trait OptionalColumn {
    fn optional_or_none(self) -> Option<String>;
}
impl OptionalColumn for rusqlite::Result<String> {
    fn optional_or_none(self) -> Option<String> {
        self.ok()
    }
}

impl CatalogStore {
    /// Opens (creating if absent) a catalog store backed by the SQLite file
    /// at `path`, with a read pool of up to `max_pool_size` connections.
    pub fn open(path: impl AsRef<Path>, max_pool_size: u32) -> Result<Self, Error> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder().max_size(max_pool_size).build(manager)?;
        let conn = pool.get()?;
        schema::migrate(&conn)?;
        reference::seed(&conn)?;
        drop(conn);
        let (tx, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(CatalogStore {
            pool,
            write_lock: Mutex::new(()),
            changes: tx,
            _memory_keepalive: None,
        })
    }

    /// Opens an in-memory catalog store, for tests and ephemeral nodes.
    /// Uses a shared-cache URI so the read pool and the write path observe
    /// the same database.
    pub fn open_in_memory() -> Result<Self, Error> {
        const URI: &str = "file:dex_store_mem?mode=memory&cache=shared";
        let keepalive = Connection::open(URI)?;
        schema::migrate(&keepalive)?;
        reference::seed(&keepalive)?;

        let manager = SqliteConnectionManager::file(URI);
        let pool = Pool::builder().max_size(4).build(manager)?;
        let (tx, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(CatalogStore {
            pool,
            write_lock: Mutex::new(()),
            changes: tx,
            _memory_keepalive: Some(keepalive),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    fn notify(&self, table: &'static str, operation: Operation, status: MutationStatus) {
        let _ = self.changes.send(ChangeEvent {
            table,
            operation,
            status,
        });
    }

    fn upsert(
        &self,
        offer_type: OfferType,
        offer: &OfferRecord,
        explicit_mod_time: Option<u64>,
        now: u64,
    ) -> Result<(), Error> {
        let table = offer_table(offer_type);
        let time_modification = explicit_mod_time.unwrap_or(now) as i64;
        let _guard = self.write_lock.lock().unwrap();
        let conn = self.pool.get()?;
        let sql = format!(
            "INSERT INTO {table}
                (hash, id_transaction, country_iso, currency_iso, payment_method, price,
                 min_amount, short_info, details, pub_key, time_create,
                 time_expiration, editing_version, edit_hash, edit_sign, time_modification)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)
             ON CONFLICT(hash) DO UPDATE SET
                id_transaction=excluded.id_transaction,
                country_iso=excluded.country_iso,
                currency_iso=excluded.currency_iso,
                payment_method=excluded.payment_method,
                price=excluded.price,
                min_amount=excluded.min_amount,
                short_info=excluded.short_info,
                details=excluded.details,
                pub_key=excluded.pub_key,
                time_create=excluded.time_create,
                time_expiration=excluded.time_expiration,
                editing_version=excluded.editing_version,
                edit_hash=excluded.edit_hash,
                edit_sign=excluded.edit_sign,
                time_modification=excluded.time_modification"
        );
        let result = conn.execute(
            &sql,
            params![
                offer.hash.to_string(),
                offer.id_transaction,
                offer.country_iso,
                offer.currency_iso,
                offer.payment_method.0 as i64,
                offer.price as i64,
                offer.min_amount as i64,
                offer.short_info,
                offer.details,
                offer.pub_key,
                offer.time_create as i64,
                offer.time_expiration as i64,
                offer.editing_version as i64,
                offer.edit_hash.to_string(),
                offer.edit_sign,
                time_modification,
            ],
        );
        match result {
            Ok(_) => {
                self.notify(table, Operation::Insert, MutationStatus::Ok);
                Ok(())
            }
            Err(e) => {
                self.notify(table, Operation::Insert, MutationStatus::Failed);
                Err(e.into())
            }
        }
    }

    pub fn upsert_buy(
        &self,
        offer: &OfferRecord,
        explicit_mod_time: Option<u64>,
        now: u64,
    ) -> Result<(), Error> {
        self.upsert(OfferType::Buy, offer, explicit_mod_time, now)
    }

    pub fn upsert_sell(
        &self,
        offer: &OfferRecord,
        explicit_mod_time: Option<u64>,
        now: u64,
    ) -> Result<(), Error> {
        self.upsert(OfferType::Sell, offer, explicit_mod_time, now)
    }

    pub fn get_by_hash(
        &self,
        offer_type: OfferType,
        hash: &OfferHash,
    ) -> Result<Option<OfferRecord>, Error> {
        let table = offer_table(offer_type);
        let conn = self.pool.get()?;
        let sql = format!("SELECT * FROM {table} WHERE hash = ?1");
        conn.query_row(&sql, params![hash.to_string()], row_to_offer)
            .optional()
            .map_err(Error::from)
    }

    pub fn exists_by_hash(&self, offer_type: OfferType, hash: &OfferHash) -> Result<bool, Error> {
        Ok(self.get_by_hash(offer_type, hash)?.is_some())
    }

    pub fn delete_by_hash(&self, offer_type: OfferType, hash: &OfferHash) -> Result<bool, Error> {
        let table = offer_table(offer_type);
        let _guard = self.write_lock.lock().unwrap();
        let conn = self.pool.get()?;
        let sql = format!("DELETE FROM {table} WHERE hash = ?1");
        let deleted = conn.execute(&sql, params![hash.to_string()])? > 0;
        self.notify(
            table,
            Operation::Delete,
            if deleted {
                MutationStatus::Ok
            } else {
                MutationStatus::Failed
            },
        );
        Ok(deleted)
    }

    /// Lists offers matching `filter`, ordered by `time_create` descending
    /// with `hash` as a tiebreak for a stable order across pages.
    pub fn list(
        &self,
        offer_type: OfferType,
        filter: &OfferFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<OfferRecord>, Error> {
        let table = offer_table(offer_type);
        let conn = self.pool.get()?;
        let (where_clause, mut params) = filter.where_clause();
        let limit_idx = params.len() + 1;
        let offset_idx = params.len() + 2;
        let sql = format!(
            "SELECT * FROM {table} {where_clause}
             ORDER BY time_create DESC, hash DESC
             LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        );
        params.push((limit as i64).into());
        params.push((offset as i64).into());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), row_to_offer)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count(&self, offer_type: OfferType, filter: &OfferFilter) -> Result<u64, Error> {
        let table = offer_table(offer_type);
        let conn = self.pool.get()?;
        let (where_clause, params) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM {table} {where_clause}");
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params), |r| {
            r.get::<_, i64>(0)
        })? as u64)
    }

    pub fn last_modification_buy(&self) -> Result<u64, Error> {
        self.last_modification(OfferType::Buy)
    }

    pub fn last_modification_sell(&self) -> Result<u64, Error> {
        self.last_modification(OfferType::Sell)
    }

    fn last_modification(&self, offer_type: OfferType) -> Result<u64, Error> {
        let table = offer_table(offer_type);
        let conn = self.pool.get()?;
        let sql = format!("SELECT COALESCE(MAX(time_modification), 0) FROM {table}");
        Ok(conn.query_row(&sql, [], |r| r.get::<_, i64>(0))? as u64)
    }

    /// Enumerates `(hash, editing_version)` pairs filtered by `period`,
    /// relative to `pivot_time`, matching Phase 1 of the sync protocol.
    pub fn hashes_and_versions(
        &self,
        offer_type: OfferType,
        period: Period,
    ) -> Result<Vec<(OfferHash, u32)>, Error> {
        let table = offer_table(offer_type);
        let conn = self.pool.get()?;
        let (where_clause, pivot): (&str, Option<i64>) = match period {
            Period::All => ("", None),
            Period::Before(t) => ("WHERE time_modification < ?1", Some(t as i64)),
            Period::After(t) => ("WHERE time_modification > ?1", Some(t as i64)),
            Period::YoungTimeMod(t) => ("WHERE time_modification > ?1", Some(t as i64)),
        };
        let sql = format!("SELECT hash, editing_version FROM {table} {where_clause}");
        let mut stmt = conn.prepare(&sql)?;
        let map_row = |row: &Row| -> rusqlite::Result<(OfferHash, u32)> {
            let hash: String = row.get(0)?;
            let version: i64 = row.get(1)?;
            let hash = OfferHash::from_str(&hash).map_err(|_| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    "invalid hash hex".into(),
                )
            })?;
            Ok((hash, version as u32))
        };
        let rows = match pivot {
            Some(p) => stmt.query_map(params![p], map_row)?.collect::<Result<Vec<_>, _>>()?,
            None => stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?,
        };
        Ok(rows)
    }

    /// Removes rows whose `time_expiration` has passed. Returns the number
    /// of rows removed across both offer tables.
    pub fn sweep_expired(&self, now: u64) -> Result<usize, Error> {
        let _guard = self.write_lock.lock().unwrap();
        let conn = self.pool.get()?;
        let mut total = 0usize;
        for table in ["offers_buy", "offers_sell"] {
            let sql = format!("DELETE FROM {table} WHERE time_expiration < ?1");
            total += conn.execute(&sql, params![now as i64])?;
        }
        self.notify("offers_buy", Operation::Delete, MutationStatus::Ok);
        self.notify("offers_sell", Operation::Delete, MutationStatus::Ok);
        Ok(total)
    }

    /// Moves every `my_offers` row whose `time_expiration` has passed from
    /// `Active` to `Expired`. Returns the hashes transitioned, so the
    /// caller (`dex-periodic`) can
    /// log or react to them without a second query.
    pub fn expire_my_offers(&self, now: u64) -> Result<Vec<OfferHash>, Error> {
        let _guard = self.write_lock.lock().unwrap();
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT hash FROM my_offers WHERE status = 'active' AND time_expiration < ?1",
        )?;
        let hashes: Vec<OfferHash> = stmt
            .query_map(params![now as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|s| OfferHash::from_str(&s).ok())
            .collect();
        drop(stmt);
        if !hashes.is_empty() {
            conn.execute(
                "UPDATE my_offers SET status = 'expired' WHERE status = 'active' AND time_expiration < ?1",
                params![now as i64],
            )?;
            self.notify("my_offers", Operation::Update, MutationStatus::Ok);
        }
        Ok(hashes)
    }

    /// Deletes `my_offers` rows that have sat in a terminal status
    /// (`Expired`, `Cancelled`) for longer than `retention_secs`, bounding
    /// the table's growth. Returns the number of rows removed.
    pub fn gc_my_offers(&self, now: u64, retention_secs: u64) -> Result<usize, Error> {
        let _guard = self.write_lock.lock().unwrap();
        let conn = self.pool.get()?;
        let cutoff = (now as i64).saturating_sub(retention_secs as i64);
        let removed = conn.execute(
            "DELETE FROM my_offers WHERE status IN ('expired', 'cancelled') AND time_modification < ?1",
            params![cutoff],
        )?;
        if removed > 0 {
            self.notify("my_offers", Operation::Delete, MutationStatus::Ok);
        }
        Ok(removed)
    }

    // -- my_offers -----------------------------------------------------

    pub fn upsert_my_offer(&self, record: &MyOfferRecord, now: u64) -> Result<(), Error> {
        let offer = &record.offer;
        let type_str = match offer.offer_type {
            OfferType::Buy => "buy",
            OfferType::Sell => "sell",
        };
        let status_str = status_to_str(record.status);
        let _guard = self.write_lock.lock().unwrap();
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO my_offers
                (hash, id_transaction, country_iso, currency_iso, payment_method, price,
                 min_amount, short_info, details, pub_key, time_create,
                 time_expiration, editing_version, edit_hash, edit_sign, time_modification,
                 offer_type, status, fee_tx_hash, is_broadcast)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20)
             ON CONFLICT(hash) DO UPDATE SET
                id_transaction=excluded.id_transaction,
                country_iso=excluded.country_iso, currency_iso=excluded.currency_iso,
                payment_method=excluded.payment_method, price=excluded.price,
                min_amount=excluded.min_amount,
                short_info=excluded.short_info, details=excluded.details,
                pub_key=excluded.pub_key, time_create=excluded.time_create,
                time_expiration=excluded.time_expiration, editing_version=excluded.editing_version,
                edit_hash=excluded.edit_hash, edit_sign=excluded.edit_sign,
                time_modification=excluded.time_modification,
                offer_type=excluded.offer_type, status=excluded.status,
                fee_tx_hash=excluded.fee_tx_hash, is_broadcast=excluded.is_broadcast",
            params![
                offer.hash.to_string(),
                offer.id_transaction,
                offer.country_iso,
                offer.currency_iso,
                offer.payment_method.0 as i64,
                offer.price as i64,
                offer.min_amount as i64,
                offer.short_info,
                offer.details,
                offer.pub_key,
                offer.time_create as i64,
                offer.time_expiration as i64,
                offer.editing_version as i64,
                offer.edit_hash.to_string(),
                offer.edit_sign,
                now as i64,
                type_str,
                status_str,
                record.fee_tx_hash,
                record.is_broadcast as i64,
            ],
        )?;
        self.notify("my_offers", Operation::Insert, MutationStatus::Ok);
        Ok(())
    }

    pub fn get_my_offer(&self, hash: &OfferHash) -> Result<Option<MyOfferRecord>, Error> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT * FROM my_offers WHERE hash = ?1",
            params![hash.to_string()],
            row_to_my_offer,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn list_my_offers(
        &self,
        status_filter: Option<MyOfferStatus>,
    ) -> Result<Vec<MyOfferRecord>, Error> {
        let conn = self.pool.get()?;
        match status_filter {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM my_offers WHERE status = ?1 ORDER BY time_modification DESC",
                )?;
                let rows = stmt.query_map(params![status_to_str(status)], row_to_my_offer)?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM my_offers ORDER BY time_modification DESC")?;
                let rows = stmt.query_map([], row_to_my_offer)?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
        }
    }

    pub fn delete_my_offer(&self, hash: &OfferHash) -> Result<bool, Error> {
        let _guard = self.write_lock.lock().unwrap();
        let conn = self.pool.get()?;
        let deleted =
            conn.execute("DELETE FROM my_offers WHERE hash = ?1", params![hash.to_string()])? > 0;
        self.notify(
            "my_offers",
            Operation::Delete,
            if deleted {
                MutationStatus::Ok
            } else {
                MutationStatus::Failed
            },
        );
        Ok(deleted)
    }

    pub fn set_my_offer_status(
        &self,
        hash: &OfferHash,
        status: MyOfferStatus,
    ) -> Result<bool, Error> {
        let _guard = self.write_lock.lock().unwrap();
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE my_offers SET status = ?1 WHERE hash = ?2",
            params![status_to_str(status), hash.to_string()],
        )? > 0;
        self.notify(
            "my_offers",
            Operation::Update,
            if updated {
                MutationStatus::Ok
            } else {
                MutationStatus::Failed
            },
        );
        Ok(updated)
    }

    // -- reference tables ------------------------------------------------

    pub fn list_countries(&self) -> Result<Vec<ReferenceEntry>, Error> {
        reference::list_table(&self.pool.get()?, "countries", "iso")
    }

    pub fn get_country(&self, iso: &str) -> Result<Option<ReferenceEntry>, Error> {
        reference::get_entry(&self.pool.get()?, "countries", "iso", iso)
    }

    pub fn replace_countries(&self, entries: &[ReferenceEntry]) -> Result<(), Error> {
        let _guard = self.write_lock.lock().unwrap();
        let mut conn = self.pool.get()?;
        reference::replace_table(&mut conn, "countries", "iso", entries)
    }

    pub fn delete_country(&self, iso: &str) -> Result<bool, Error> {
        let _guard = self.write_lock.lock().unwrap();
        reference::delete_entry(&self.pool.get()?, "countries", "iso", iso)
    }

    pub fn list_currencies(&self) -> Result<Vec<ReferenceEntry>, Error> {
        reference::list_table(&self.pool.get()?, "currencies", "iso")
    }

    pub fn get_currency(&self, iso: &str) -> Result<Option<ReferenceEntry>, Error> {
        reference::get_entry(&self.pool.get()?, "currencies", "iso", iso)
    }

    pub fn replace_currencies(&self, entries: &[ReferenceEntry]) -> Result<(), Error> {
        let _guard = self.write_lock.lock().unwrap();
        let mut conn = self.pool.get()?;
        reference::replace_table(&mut conn, "currencies", "iso", entries)
    }

    pub fn delete_currency(&self, iso: &str) -> Result<bool, Error> {
        let _guard = self.write_lock.lock().unwrap();
        reference::delete_entry(&self.pool.get()?, "currencies", "iso", iso)
    }

    pub fn list_payment_methods(&self) -> Result<Vec<(u32, String)>, Error> {
        reference::list_payment_methods(&self.pool.get()?)
    }

    pub fn list_filter_presets(&self) -> Result<Vec<FilterPreset>, Error> {
        reference::list_filter_presets(&self.pool.get()?)
    }

    pub fn save_filter_preset(&self, name: &str, filter_json: &str) -> Result<i64, Error> {
        let _guard = self.write_lock.lock().unwrap();
        reference::save_filter_preset(&self.pool.get()?, name, filter_json)
    }

    pub fn delete_filter_preset(&self, id: i64) -> Result<bool, Error> {
        let _guard = self.write_lock.lock().unwrap();
        reference::delete_filter_preset(&self.pool.get()?, id)
    }
}

fn status_to_str(status: MyOfferStatus) -> &'static str {
    match status {
        MyOfferStatus::Indefined => "indefined",
        MyOfferStatus::Active => "active",
        MyOfferStatus::Draft => "draft",
        MyOfferStatus::Expired => "expired",
        MyOfferStatus::Cancelled => "cancelled",
        MyOfferStatus::Suspended => "suspended",
        MyOfferStatus::Unconfirmed => "unconfirmed",
    }
}

fn status_from_str(s: &str) -> MyOfferStatus {
    match s {
        "active" => MyOfferStatus::Active,
        "draft" => MyOfferStatus::Draft,
        "expired" => MyOfferStatus::Expired,
        "cancelled" => MyOfferStatus::Cancelled,
        "suspended" => MyOfferStatus::Suspended,
        "unconfirmed" => MyOfferStatus::Unconfirmed,
        _ => MyOfferStatus::Indefined,
    }
}

fn row_to_my_offer(row: &Row) -> rusqlite::Result<MyOfferRecord> {
    let offer = row_to_offer(row)?;
    let status: String = row.get("status")?;
    let fee_tx_hash: Option<String> = row.get("fee_tx_hash")?;
    let is_broadcast: i64 = row.get("is_broadcast")?;
    Ok(MyOfferRecord {
        offer,
        status: status_from_str(&status),
        fee_tx_hash,
        is_broadcast: is_broadcast != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_types::{OfferType, PaymentMethod};

    fn sample(price: u64) -> OfferRecord {
        let mut o = OfferRecord {
            hash: OfferHash::zero(),
            id_transaction: None,
            offer_type: OfferType::Sell,
            country_iso: "US".into(),
            currency_iso: "USD".into(),
            payment_method: PaymentMethod::CASH,
            price,
            min_amount: 10,
            short_info: "cash".into(),
            details: "details".into(),
            pub_key: vec![1, 2, 3],
            time_create: 1_000,
            time_expiration: 1_000 + 86_400,
            editing_version: 0,
            edit_hash: OfferHash::zero(),
            edit_sign: None,
        };
        o.hash = o.compute_hash();
        o.edit_hash = o.compute_edit_hash();
        o
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let store = CatalogStore::open_in_memory().unwrap();
        let offer = sample(100);
        store.upsert_sell(&offer, None, 500).unwrap();
        let fetched = store.get_by_hash(OfferType::Sell, &offer.hash).unwrap().unwrap();
        assert_eq!(fetched.price, 100);
    }

    #[test]
    fn upsert_is_idempotent_on_modification_time() {
        let store = CatalogStore::open_in_memory().unwrap();
        let offer = sample(100);
        store.upsert_sell(&offer, Some(42), 500).unwrap();
        store.upsert_sell(&offer, Some(42), 999).unwrap();
        assert_eq!(store.count(OfferType::Sell, &OfferFilter::default()).unwrap(), 1);
        assert_eq!(store.last_modification_sell().unwrap(), 42);
    }

    #[test]
    fn sweep_expired_removes_past_offers() {
        let store = CatalogStore::open_in_memory().unwrap();
        let offer = sample(100);
        store.upsert_sell(&offer, None, 500).unwrap();
        let removed = store.sweep_expired(offer.time_expiration + 1).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count(OfferType::Sell, &OfferFilter::default()).unwrap(), 0);
    }

    #[test]
    fn expire_my_offers_moves_active_past_expiration_to_expired() {
        let store = CatalogStore::open_in_memory().unwrap();
        let offer = sample(100);
        let record = MyOfferRecord {
            offer: offer.clone(),
            status: MyOfferStatus::Active,
            fee_tx_hash: Some("tx".into()),
            is_broadcast: true,
        };
        store.upsert_my_offer(&record, 500).unwrap();

        let expired = store.expire_my_offers(offer.time_expiration + 1).unwrap();
        assert_eq!(expired, vec![offer.hash]);
        assert_eq!(
            store.get_my_offer(&offer.hash).unwrap().unwrap().status,
            MyOfferStatus::Expired
        );
    }

    #[test]
    fn gc_my_offers_removes_old_terminal_rows_only() {
        let store = CatalogStore::open_in_memory().unwrap();
        let offer = sample(100);
        let record = MyOfferRecord {
            offer: offer.clone(),
            status: MyOfferStatus::Expired,
            fee_tx_hash: Some("tx".into()),
            is_broadcast: true,
        };
        store.upsert_my_offer(&record, 1_000).unwrap();

        assert_eq!(store.gc_my_offers(1_000 + 50, 100).unwrap(), 0);
        assert_eq!(store.gc_my_offers(1_000 + 200, 100).unwrap(), 1);
        assert!(store.get_my_offer(&offer.hash).unwrap().is_none());
    }

    #[test]
    fn hashes_and_versions_young_time_mod_filters_correctly() {
        let store = CatalogStore::open_in_memory().unwrap();
        let a = sample(100);
        let mut b = sample(200);
        b.min_amount = 20;
        b.hash = b.compute_hash();
        store.upsert_sell(&a, Some(10), 10).unwrap();
        store.upsert_sell(&b, Some(20), 20).unwrap();
        let young = store
            .hashes_and_versions(OfferType::Sell, Period::YoungTimeMod(15))
            .unwrap();
        assert_eq!(young.len(), 1);
        assert_eq!(young[0].0, b.hash);
    }

    #[test]
    fn delete_by_hash_reports_whether_a_row_was_removed() {
        let store = CatalogStore::open_in_memory().unwrap();
        let offer = sample(100);
        assert!(!store.delete_by_hash(OfferType::Sell, &offer.hash).unwrap());
        store.upsert_sell(&offer, None, 500).unwrap();
        assert!(store.delete_by_hash(OfferType::Sell, &offer.hash).unwrap());
    }

    #[test]
    fn reference_tables_seed_on_open() {
        let store = CatalogStore::open_in_memory().unwrap();
        assert!(!store.list_countries().unwrap().is_empty());
        assert!(!store.list_currencies().unwrap().is_empty());
        assert_eq!(store.list_payment_methods().unwrap().len(), 2);
    }

    #[test]
    fn subscribe_observes_mutation_events() {
        let store = CatalogStore::open_in_memory().unwrap();
        let mut rx = store.subscribe();
        let offer = sample(100);
        store.upsert_sell(&offer, None, 500).unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.table, "offers_sell");
        assert_eq!(event.operation, Operation::Insert);
    }
}
