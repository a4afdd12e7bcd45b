use chrono::Utc;
use tokio_rusqlite::{Connection, params, rusqlite};
use tokio_rusqlite::rusqlite::OptionalExtension;

use crate::core::{JobParams, TransferError, TransferRequest};

/// Durable record of the requests submitted under one job id.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub job_id: String,
    pub requests: Vec<TransferRequest>,
    pub job_params: JobParams,
    pub created_at: String,
}

/// Persist one descriptor in a single transaction. Serialization happens
/// before any write, so a malformed request never leaves a partial
/// descriptor behind.
pub async fn put(
    conn: &Connection,
    job_id: String,
    requests: &[TransferRequest],
    job_params: &JobParams,
) -> Result<(), TransferError> {
    let requests_json = serde_json::to_string(requests)?;
    let params_json = serde_json::to_string(job_params)?;
    let created_at = Utc::now().to_rfc3339();

    conn.call(move |c| {
        let tx = c.transaction()?;

        tx.execute(
            "INSERT INTO job_descriptors (id, requests, job_params, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![&job_id, &requests_json, &params_json, &created_at],
        )?;

        tx.commit()?;
        Ok::<(), rusqlite::Error>(())
    })
    .await?;

    Ok(())
}

/// Load the descriptor for `job_id`, or `None` when the id is unknown.
/// Callers translate `None` into the unknown-job failure; a store error
/// here is a different condition and stays a store error.
pub async fn get(
    conn: &Connection,
    job_id: String,
) -> Result<Option<JobDescriptor>, TransferError> {
    let row = conn
        .call(move |c| {
            let mut stmt = c.prepare(
                "SELECT id, requests, job_params, created_at
                 FROM job_descriptors
                 WHERE id = ?1",
            )?;

            stmt.query_row(params![job_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()
        })
        .await?;

    match row {
        Some((job_id, requests_json, params_json, created_at)) => {
            let requests: Vec<TransferRequest> = serde_json::from_str(&requests_json)?;
            let job_params: JobParams = serde_json::from_str(&params_json)?;
            Ok(Some(JobDescriptor {
                job_id,
                requests,
                job_params,
                created_at,
            }))
        }
        None => Ok(None),
    }
}
