use chrono::{Days, Utc};
use tokio_rusqlite::{Connection, params, rusqlite};
use tokio_rusqlite::rusqlite::OptionalExtension;

use crate::core::{JobOutcome, RequestDetail, TransferError};

/// Cache the terminal outcome for `job_id`. The first writer wins; a
/// second write for the same job is ignored so concurrent queries can
/// never flip an already-terminal outcome.
pub async fn put(
    conn: &Connection,
    job_id: String,
    details: &[RequestDetail],
) -> Result<(), TransferError> {
    let outcome = JobOutcome::Details {
        requests: details.to_vec(),
    };
    let state = outcome.state().to_string();
    let details_json = serde_json::to_string(details)?;
    let finished_at = Utc::now().to_rfc3339();

    conn.call(move |c| {
        c.execute(
            "INSERT INTO job_outcomes (job_id, state, details, finished_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(job_id) DO NOTHING",
            params![&job_id, &state, &details_json, &finished_at],
        )?;
        Ok::<(), rusqlite::Error>(())
    })
    .await?;

    Ok(())
}

/// Load the cached terminal outcome for `job_id`, if the job has already
/// executed.
pub async fn get(
    conn: &Connection,
    job_id: String,
) -> Result<Option<JobOutcome>, TransferError> {
    let row = conn
        .call(move |c| {
            let mut stmt =
                c.prepare("SELECT details FROM job_outcomes WHERE job_id = ?1")?;
            stmt.query_row(params![job_id], |row| row.get::<_, String>(0))
                .optional()
        })
        .await?;

    match row {
        Some(details_json) => {
            let requests: Vec<RequestDetail> = serde_json::from_str(&details_json)?;
            Ok(Some(JobOutcome::Details { requests }))
        }
        None => Ok(None),
    }
}

/// Delete terminal jobs older than `retention_days`, descriptors
/// included. Returns the number of jobs removed.
pub async fn prune(conn: &Connection, retention_days: u32) -> Result<usize, TransferError> {
    let cutoff = Utc::now()
        .checked_sub_days(Days::new(retention_days as u64))
        .unwrap_or_else(Utc::now)
        .to_rfc3339();

    let removed = conn
        .call(move |c| {
            let tx = c.transaction()?;

            // RFC 3339 strings in UTC sort chronologically.
            let removed = tx.execute(
                "DELETE FROM job_descriptors
                 WHERE id IN (SELECT job_id FROM job_outcomes WHERE finished_at < ?1)",
                params![&cutoff],
            )?;

            tx.commit()?;
            Ok::<usize, rusqlite::Error>(removed)
        })
        .await?;

    Ok(removed)
}
