//! PostgreSQL entry store
//!
//! Implements the domain's storage port on a single `ledger_entries`
//! table. Each commit transaction first takes a transaction-scoped
//! advisory lock on the owner key, so writers on the same owner are
//! serialized across connections and processes, then re-reads the head
//! and compares it against the caller's expectation; a stale expectation
//! surfaces `CommitConflict` and the append path retries. Reversal runs
//! as one transaction: flag the original, insert the compensation,
//! commit - both or neither.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{Amount, EntryId, OwnerRef};
use domain_ledger::{
    EntryStore, HeadSnapshot, HistoryPage, LedgerEntry, Metadata, PageRequest, PageToken,
    StoreError, TimeRange,
};

use crate::error::to_store_error;

const SELECT_COLUMNS: &str = "id, owner_kind, owner_id, amount, scale, running_balance, \
     entry_type, description, metadata, created_at, reversed_at, reversal_of";

/// PostgreSQL-backed `EntryStore`
#[derive(Debug, Clone)]
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    /// Creates a new store over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row for a ledger entry
#[derive(Debug, Clone, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    owner_kind: String,
    owner_id: String,
    amount: Decimal,
    scale: i32,
    running_balance: Decimal,
    entry_type: String,
    description: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    reversed_at: Option<DateTime<Utc>>,
    reversal_of: Option<Uuid>,
}

impl EntryRow {
    fn into_entry(self) -> Result<LedgerEntry, StoreError> {
        let scale = u32::try_from(self.scale)
            .map_err(|_| StoreError::corrupt(format!("negative scale on entry {}", self.id)))?;
        let amount = Amount::new(self.amount, scale)
            .map_err(|e| StoreError::corrupt(format!("amount on entry {}: {e}", self.id)))?;
        let running_balance = Amount::new(self.running_balance, scale)
            .map_err(|e| StoreError::corrupt(format!("balance on entry {}: {e}", self.id)))?;
        let entry_type = self
            .entry_type
            .parse()
            .map_err(|e| StoreError::corrupt(format!("entry {}: {e}", self.id)))?;
        let metadata = match self.metadata {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => Metadata::new(),
            other => {
                return Err(StoreError::corrupt(format!(
                    "metadata on entry {} is not an object: {other}",
                    self.id
                )))
            }
        };

        Ok(LedgerEntry {
            id: EntryId::from_uuid(self.id),
            owner: OwnerRef::new(self.owner_kind, self.owner_id),
            amount,
            running_balance,
            entry_type,
            description: self.description,
            metadata,
            created_at: self.created_at,
            reversed_at: self.reversed_at,
            reversal_of: self.reversal_of.map(EntryId::from_uuid),
        })
    }
}

fn select_one(where_clause: &str) -> String {
    format!("SELECT {SELECT_COLUMNS} FROM ledger_entries WHERE {where_clause}")
}

async fn insert_entry<'e, E>(executor: E, entry: &LedgerEntry) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO ledger_entries (
            id, owner_kind, owner_id, amount, scale, running_balance,
            entry_type, description, metadata, created_at, reversed_at, reversal_of
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(&entry.owner.kind)
    .bind(&entry.owner.id)
    .bind(entry.amount.value())
    .bind(entry.amount.scale() as i32)
    .bind(entry.running_balance.value())
    .bind(entry.entry_type.as_str())
    .bind(&entry.description)
    .bind(serde_json::Value::Object(entry.metadata.clone()))
    .bind(entry.created_at)
    .bind(entry.reversed_at)
    .bind(entry.reversal_of.map(|id| *id.as_uuid()))
    .execute(executor)
    .await
    .map(|_| ())
}

/// Advisory-lock key for an owner's section of the ledger
fn owner_lock_key(owner: &OwnerRef) -> String {
    format!("ledger_entries:{}/{}", owner.kind, owner.id)
}

/// Serializes writers on one owner across connections within `tx`
///
/// A head-row lock alone cannot do this: an owner with no entries has
/// no row to lock, and under READ COMMITTED a writer that blocked on a
/// competitor re-reads from a snapshot taken before the competitor's
/// insert. The transaction-scoped advisory lock closes both gaps; the
/// head re-read below it always sees the latest committed entry.
async fn lock_owner_section(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner: &OwnerRef,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(owner_lock_key(owner))
        .execute(&mut **tx)
        .await
        .map(|_| ())
}

/// Returns the owner's current head id within `tx`
async fn current_head_id(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner: &OwnerRef,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT id FROM ledger_entries
        WHERE owner_kind = $1 AND owner_id = $2
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(&owner.kind)
    .bind(&owner.id)
    .fetch_optional(&mut **tx)
    .await
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn head(&self, owner: &OwnerRef) -> Result<Option<HeadSnapshot>, StoreError> {
        let row: Option<EntryRow> = sqlx::query_as(&format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT 1",
            select_one("owner_kind = $1 AND owner_id = $2")
        ))
        .bind(&owner.kind)
        .bind(&owner.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| to_store_error(&owner.to_string(), e))?;

        match row {
            Some(row) => {
                let entry = row.into_entry()?;
                Ok(Some(HeadSnapshot {
                    entry_id: entry.id,
                    running_balance: entry.running_balance,
                    created_at: entry.created_at,
                }))
            }
            None => Ok(None),
        }
    }

    async fn commit(
        &self,
        entry: &LedgerEntry,
        expected_head: Option<EntryId>,
    ) -> Result<(), StoreError> {
        let owner = entry.owner.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| to_store_error(&owner, e))?;

        lock_owner_section(&mut tx, &entry.owner)
            .await
            .map_err(|e| to_store_error(&owner, e))?;

        let head = current_head_id(&mut tx, &entry.owner)
            .await
            .map_err(|e| to_store_error(&owner, e))?;
        if head != expected_head.map(|id| *id.as_uuid()) {
            return Err(StoreError::CommitConflict { owner });
        }

        insert_entry(&mut *tx, entry)
            .await
            .map_err(|e| to_store_error(&owner, e))?;

        tx.commit().await.map_err(|e| to_store_error(&owner, e))
    }

    async fn commit_reversal(
        &self,
        compensation: &LedgerEntry,
        original: EntryId,
        reversed_at: DateTime<Utc>,
        expected_head: Option<EntryId>,
    ) -> Result<(), StoreError> {
        let owner = compensation.owner.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| to_store_error(&owner, e))?;

        lock_owner_section(&mut tx, &compensation.owner)
            .await
            .map_err(|e| to_store_error(&owner, e))?;

        let head = current_head_id(&mut tx, &compensation.owner)
            .await
            .map_err(|e| to_store_error(&owner, e))?;
        if head != expected_head.map(|id| *id.as_uuid()) {
            return Err(StoreError::CommitConflict { owner });
        }

        let flagged = sqlx::query(
            "UPDATE ledger_entries SET reversed_at = $2 WHERE id = $1 AND reversed_at IS NULL",
        )
        .bind(original.as_uuid())
        .bind(reversed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| to_store_error(&owner, e))?;

        if flagged.rows_affected() == 0 {
            // Either the entry vanished (impossible: entries are never
            // deleted) or another writer already flagged it.
            return Err(StoreError::CommitConflict { owner });
        }

        insert_entry(&mut *tx, compensation)
            .await
            .map_err(|e| to_store_error(&owner, e))?;

        tx.commit().await.map_err(|e| to_store_error(&owner, e))
    }

    async fn get(&self, id: EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        let row: Option<EntryRow> = sqlx::query_as(&select_one("id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| to_store_error(&id.to_string(), e))?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn find_compensation(
        &self,
        original: EntryId,
    ) -> Result<Option<LedgerEntry>, StoreError> {
        let row: Option<EntryRow> = sqlx::query_as(&select_one("reversal_of = $1"))
            .bind(original.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| to_store_error(&original.to_string(), e))?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn latest_unvoided(&self, owner: &OwnerRef) -> Result<Option<LedgerEntry>, StoreError> {
        let row: Option<EntryRow> = sqlx::query_as(&format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT 1",
            select_one("owner_kind = $1 AND owner_id = $2 AND reversed_at IS NULL")
        ))
        .bind(&owner.kind)
        .bind(&owner.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| to_store_error(&owner.to_string(), e))?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn latest_unvoided_as_of(
        &self,
        owner: &OwnerRef,
        at: DateTime<Utc>,
    ) -> Result<Option<LedgerEntry>, StoreError> {
        let row: Option<EntryRow> = sqlx::query_as(&format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT 1",
            select_one(
                "owner_kind = $1 AND owner_id = $2 AND created_at <= $3 \
                 AND (reversed_at IS NULL OR reversed_at > $3)"
            )
        ))
        .bind(&owner.kind)
        .bind(&owner.id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| to_store_error(&owner.to_string(), e))?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn history(
        &self,
        owner: &OwnerRef,
        range: &TimeRange,
        page: &PageRequest,
    ) -> Result<HistoryPage, StoreError> {
        // Fetch one row past the page to know whether a next page exists.
        let fetch = (page.limit as i64).saturating_add(1);

        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "{} ORDER BY created_at ASC, id ASC LIMIT $7",
            select_one(
                "owner_kind = $1 AND owner_id = $2 \
                 AND ($3::timestamptz IS NULL OR created_at >= $3) \
                 AND ($4::timestamptz IS NULL OR created_at <= $4) \
                 AND ($5::timestamptz IS NULL OR (created_at, id) > ($5, $6::uuid))"
            )
        ))
        .bind(&owner.kind)
        .bind(&owner.id)
        .bind(range.from)
        .bind(range.to)
        .bind(page.token.map(|t| t.created_at))
        .bind(page.token.map(|t| *t.id.as_uuid()))
        .bind(fetch)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| to_store_error(&owner.to_string(), e))?;

        let has_more = rows.len() as i64 >= fetch;
        let mut entries = rows
            .into_iter()
            .map(EntryRow::into_entry)
            .collect::<Result<Vec<_>, _>>()?;
        if has_more {
            entries.truncate(page.limit);
        }

        let next_token = if has_more {
            entries.last().map(PageToken::after)
        } else {
            None
        };

        Ok(HistoryPage {
            entries,
            next_token,
        })
    }

    async fn audit_trail(&self, owner: &OwnerRef) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "{} ORDER BY created_at ASC, id ASC",
            select_one("owner_kind = $1 AND owner_id = $2")
        ))
        .bind(&owner.kind)
        .bind(&owner.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| to_store_error(&owner.to_string(), e))?;

        rows.into_iter().map(EntryRow::into_entry).collect()
    }
}
