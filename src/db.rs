use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS addresses (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            address    TEXT UNIQUE NOT NULL,
            added_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressRecord {
    pub id: i64,
    pub address: String,
    pub added_at: String,
}

/// Insert-or-ignore; returns how many were new.
pub fn insert_addresses(conn: &Connection, addresses: &[String]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO addresses (address) VALUES (?1)")?;
        for address in addresses {
            count += stmt.execute(rusqlite::params![address])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_addresses(conn: &Connection) -> Result<Vec<AddressRecord>> {
    let mut stmt = conn.prepare("SELECT id, address, added_at FROM addresses ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AddressRecord {
                id: row.get(0)?,
                address: row.get(1)?,
                added_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn clear_addresses(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM addresses", [])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn insert_ignores_known_addresses() {
        let conn = memory();
        assert_eq!(insert_addresses(&conn, &owned(&["1 Elm Rd", "2 Elm Rd"])).unwrap(), 2);
        assert_eq!(
            insert_addresses(&conn, &owned(&["2 Elm Rd", "3 Elm Rd", "3 Elm Rd"])).unwrap(),
            1
        );
        let stored: Vec<String> = fetch_addresses(&conn)
            .unwrap()
            .into_iter()
            .map(|r| r.address)
            .collect();
        assert_eq!(stored, owned(&["1 Elm Rd", "2 Elm Rd", "3 Elm Rd"]));
    }

    #[test]
    fn clear_reports_removed_rows() {
        let conn = memory();
        insert_addresses(&conn, &owned(&["1 Elm Rd", "2 Elm Rd"])).unwrap();
        assert_eq!(clear_addresses(&conn).unwrap(), 2);
        assert!(fetch_addresses(&conn).unwrap().is_empty());
        assert_eq!(clear_addresses(&conn).unwrap(), 0);
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = memory();
        init_schema(&conn).unwrap();
        assert!(fetch_addresses(&conn).unwrap().is_empty());
    }
}
