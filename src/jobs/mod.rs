//! Background jobs (apalis).

mod email_job;

pub use email_job::{connect_pool, email_job_handler, EmailJob, EmailQueue, PostgresEmailQueue};

#[cfg(test)]
pub use email_job::MockEmailQueue;
