// sink/src/postgres/partitions.rs

//! Height-range partition creation for the core tables. The hash-partitioned
//! `core.events` table is pre-deployed with a fixed modulus by the (out of
//! scope) DDL bootstrap and never needs a new child table at ingest time;
//! only the range-partitioned tables grow a new child per 1,000,000-height
//! span as ingestion advances.

use sqlx::{Postgres, Transaction};

use crate::SinkError;

const PARTITION_SPAN: u64 = 1_000_000;

/// Fixed key for `pg_advisory_xact_lock`, serializing concurrent partition
/// DDL across any number of indexer processes sharing one database.
const PARTITION_LOCK_KEY: i64 = 7_424_001;

const RANGE_PARTITIONED_TABLES: &[&str] = &["core.blocks", "core.transactions", "core.messages"];

/// Ensure a range partition exists for every 1,000,000-aligned boundary
/// covered by `[min_height, max_height]`, on each of the range-partitioned
/// tables. Idempotent: `CREATE TABLE IF NOT EXISTS` under an advisory lock.
pub async fn ensure_range_partitions(
    tx: &mut Transaction<'_, Postgres>,
    min_height: u64,
    max_height: u64,
) -> Result<(), SinkError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(PARTITION_LOCK_KEY)
        .execute(&mut **tx)
        .await?;

    let first_base = (min_height / PARTITION_SPAN) * PARTITION_SPAN;
    let last_base = (max_height / PARTITION_SPAN) * PARTITION_SPAN;

    let mut base = first_base;
    while base <= last_base {
        let upper = base + PARTITION_SPAN;
        for table in RANGE_PARTITIONED_TABLES {
            let child = child_table_name(table, base);
            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {child} PARTITION OF {table} FOR VALUES FROM ({base}) TO ({upper})"
            );
            sqlx::query(&sql).execute(&mut **tx).await?;
        }
        base += PARTITION_SPAN;
    }
    Ok(())
}

fn child_table_name(table: &str, base: u64) -> String {
    let (schema, name) = table.split_once('.').unwrap_or(("public", table));
    format!("{schema}.{name}_{base}")
}
