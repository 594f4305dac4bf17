// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Reference tables: countries, currencies and payment methods an offer may
//! cite, plus saved filter presets for RPC clients. These are small,
//! infrequently-written tables that ship with a seed set and can be
//! replaced wholesale by an operator (e.g. to track an updated ISO list).

use crate::errors::Error;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub iso: String,
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub id: i64,
    pub name: String,
    pub filter_json: String,
}

/// A representative seed set of ISO 3166-1 country codes. An operator
/// replaces this with the full list via [`super::CatalogStore::replace_countries`].
pub(crate) const SEED_COUNTRIES: &[(&str, &str)] = &[
    ("US", "United States"),
    ("CA", "Canada"),
    ("GB", "United Kingdom"),
    ("DE", "Germany"),
    ("FR", "France"),
    ("RU", "Russia"),
    ("UA", "Ukraine"),
    ("BY", "Belarus"),
    ("KZ", "Kazakhstan"),
    ("PL", "Poland"),
    ("NL", "Netherlands"),
    ("ES", "Spain"),
    ("IT", "Italy"),
    ("BR", "Brazil"),
    ("IN", "India"),
    ("CN", "China"),
    ("JP", "Japan"),
    ("AU", "Australia"),
    ("TR", "Turkey"),
    ("AE", "United Arab Emirates"),
];

/// A representative seed set of ISO 4217 currency codes.
pub(crate) const SEED_CURRENCIES: &[(&str, &str)] = &[
    ("USD", "US Dollar"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("RUB", "Russian Ruble"),
    ("UAH", "Ukrainian Hryvnia"),
    ("BYN", "Belarusian Ruble"),
    ("KZT", "Kazakhstani Tenge"),
    ("PLN", "Polish Zloty"),
    ("CNY", "Chinese Yuan"),
    ("JPY", "Japanese Yen"),
    ("INR", "Indian Rupee"),
    ("BRL", "Brazilian Real"),
    ("TRY", "Turkish Lira"),
    ("AED", "UAE Dirham"),
];

pub(crate) const SEED_PAYMENT_METHODS: &[(u32, &str)] = &[(1, "Cash"), (128, "Online")];

pub(crate) fn seed(conn: &Connection) -> rusqlite::Result<()> {
    for (iso, name) in SEED_COUNTRIES {
        conn.execute(
            "INSERT OR IGNORE INTO countries (iso, name, enabled) VALUES (?1, ?2, 1)",
            params![iso, name],
        )?;
    }
    for (iso, name) in SEED_CURRENCIES {
        conn.execute(
            "INSERT OR IGNORE INTO currencies (iso, name, enabled) VALUES (?1, ?2, 1)",
            params![iso, name],
        )?;
    }
    for (code, name) in SEED_PAYMENT_METHODS {
        conn.execute(
            "INSERT OR IGNORE INTO payment_methods (code, name) VALUES (?1, ?2)",
            params![code, name],
        )?;
    }
    Ok(())
}

pub(crate) fn list_table(
    conn: &Connection,
    table: &str,
    code_col: &str,
) -> Result<Vec<ReferenceEntry>, Error> {
    let sql = format!("SELECT {code_col}, name, enabled FROM {table} ORDER BY {code_col}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(ReferenceEntry {
            iso: row.get::<_, String>(0)?,
            name: row.get(1)?,
            enabled: row.get::<_, i64>(2)? != 0,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn get_entry(
    conn: &Connection,
    table: &str,
    code_col: &str,
    code: &str,
) -> Result<Option<ReferenceEntry>, Error> {
    let sql = format!("SELECT {code_col}, name, enabled FROM {table} WHERE {code_col} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![code])?;
    if let Some(row) = rows.next()? {
        Ok(Some(ReferenceEntry {
            iso: row.get::<_, String>(0)?,
            name: row.get(1)?,
            enabled: row.get::<_, i64>(2)? != 0,
        }))
    } else {
        Ok(None)
    }
}

pub(crate) fn replace_table(
    conn: &mut Connection,
    table: &str,
    code_col: &str,
    entries: &[ReferenceEntry],
) -> Result<(), Error> {
    let tx = conn.transaction()?;
    tx.execute(&format!("DELETE FROM {table}"), [])?;
    {
        let sql = format!(
            "INSERT INTO {table} ({code_col}, name, enabled) VALUES (?1, ?2, ?3)"
        );
        let mut stmt = tx.prepare(&sql)?;
        for e in entries {
            stmt.execute(params![e.iso, e.name, e.enabled as i64])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub(crate) fn delete_entry(
    conn: &Connection,
    table: &str,
    code_col: &str,
    code: &str,
) -> Result<bool, Error> {
    let sql = format!("DELETE FROM {table} WHERE {code_col} = ?1");
    Ok(conn.execute(&sql, params![code])? > 0)
}

pub(crate) fn list_payment_methods(
    conn: &Connection,
) -> Result<Vec<(u32, String)>, Error> {
    let mut stmt = conn.prepare("SELECT code, name FROM payment_methods ORDER BY code")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)? as u32, row.get(1)?)))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn list_filter_presets(conn: &Connection) -> Result<Vec<FilterPreset>, Error> {
    let mut stmt = conn.prepare("SELECT id, name, filter_json FROM filter_presets ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(FilterPreset {
            id: row.get(0)?,
            name: row.get(1)?,
            filter_json: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn save_filter_preset(
    conn: &Connection,
    name: &str,
    filter_json: &str,
) -> Result<i64, Error> {
    conn.execute(
        "INSERT INTO filter_presets (name, filter_json) VALUES (?1, ?2)",
        params![name, filter_json],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn delete_filter_preset(conn: &Connection, id: i64) -> Result<bool, Error> {
    Ok(conn.execute("DELETE FROM filter_presets WHERE id = ?1", params![id])? > 0)
}
