use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::AccompanyBatch, traits::AccompanyApiError};

/// Batches older than this are invisible to the reconciler, so abandoned add-on transactions age out.
const BATCH_RETENTION_DAYS: i64 = 7;

pub async fn save_batch(batch: AccompanyBatch, conn: &mut SqliteConnection) -> Result<(), AccompanyApiError> {
    sqlx::query(
        r#"
            INSERT INTO accompany_batches (transaction_id, registration_id, persons, created_at)
            VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(&batch.transaction_id)
    .bind(&batch.registration_id)
    .bind(&batch.persons)
    .bind(batch.created_at)
    .execute(conn)
    .await?;
    debug!("🗃️ Accompany batch [{}] saved for registration [{}]", batch.transaction_id, batch.registration_id);
    Ok(())
}

pub async fn fetch_batch(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<AccompanyBatch>, AccompanyApiError> {
    let batch = sqlx::query_as(
        r#"
            SELECT * FROM accompany_batches
            WHERE transaction_id = $1
              AND created_at >= datetime('now', $2)
        "#,
    )
    .bind(transaction_id)
    .bind(format!("-{BATCH_RETENTION_DAYS} days"))
    .fetch_optional(conn)
    .await?;
    Ok(batch)
}

pub async fn delete_batch(transaction_id: &str, conn: &mut SqliteConnection) -> Result<(), AccompanyApiError> {
    sqlx::query("DELETE FROM accompany_batches WHERE transaction_id = $1").bind(transaction_id).execute(conn).await?;
    Ok(())
}
