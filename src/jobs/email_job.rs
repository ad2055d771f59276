//! Email background job.
//!
//! Password reset messages are queued in PostgreSQL (apalis) and delivered
//! by the `jobs work` process through the configured mailer.

use std::sync::Arc;

use apalis::prelude::*;
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::{postgres::PgPoolOptions, PgPool};
use async_trait::async_trait;

use crate::errors::{AppError, AppResult};
use crate::infra::{Mailer, OutgoingEmail};

#[cfg(test)]
use mockall::automock;

/// Email job payload
pub type EmailJob = OutgoingEmail;

/// Queue for emails sent outside the request cycle.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmailQueue: Send + Sync {
    async fn enqueue(&self, job: EmailJob) -> AppResult<()>;
}

/// apalis PostgreSQL-backed queue
#[derive(Clone)]
pub struct PostgresEmailQueue {
    storage: PostgresStorage<EmailJob>,
}

impl PostgresEmailQueue {
    /// Connect and make sure the job tables exist.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let pool = connect_pool(database_url).await?;
        Ok(Self {
            storage: PostgresStorage::new(pool),
        })
    }
}

#[async_trait]
impl EmailQueue for PostgresEmailQueue {
    async fn enqueue(&self, job: EmailJob) -> AppResult<()> {
        let mut storage = self.storage.clone();
        storage
            .push(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to queue email: {}", e)))?;
        Ok(())
    }
}

/// Pool for the job tables, running apalis' own migrations.
pub async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    Ok(pool)
}

/// Email job handler - delivers one queued message
pub async fn email_job_handler(
    job: EmailJob,
    mailer: Data<Arc<dyn Mailer>>,
) -> Result<(), AppError> {
    tracing::info!(to = %job.to, subject = %job.subject, "Processing email job");
    mailer.send(job).await
}
