use std::path::Path;

use anyhow::Result;
use tokio_rusqlite::Connection;

pub mod descriptors;
pub mod outcomes;

pub async fn init(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).await?;

    conn.call(|conn| {
        let schema = include_str!("schema.sql");
        conn.execute_batch(schema)?;

        // Enable foreign keys (SQLite disables them by default!)
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        Ok::<(), tokio_rusqlite::rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}

#[cfg(test)]
pub async fn init_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().await?;

    conn.call(|conn| {
        let schema = include_str!("schema.sql");
        conn.execute_batch(schema)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        Ok::<(), tokio_rusqlite::rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}
