use sqlx::query_as;
use time::OffsetDateTime;

use crate::application::repos::{NewServiceCheck, RepoError, ServiceChecksRepo};
use crate::domain::entities::ServiceCheckRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct ServiceCheckRow {
    id: i64,
    service_name: String,
    success: bool,
    http_status_code: Option<i32>,
    response_time_ms: Option<i64>,
    checked_at: OffsetDateTime,
    error: Option<String>,
}

impl From<ServiceCheckRow> for ServiceCheckRecord {
    fn from(row: ServiceCheckRow) -> Self {
        Self {
            id: row.id,
            service_name: row.service_name,
            success: row.success,
            http_status_code: row.http_status_code,
            response_time_ms: row.response_time_ms,
            checked_at: row.checked_at,
            error: row.error,
        }
    }
}

#[async_trait::async_trait]
impl ServiceChecksRepo for PostgresRepositories {
    async fn record_check(&self, check: NewServiceCheck) -> Result<ServiceCheckRecord, RepoError> {
        let row: ServiceCheckRow = query_as(
            r#"
            INSERT INTO service_checks
                (service_name, success, http_status_code, response_time_ms, checked_at, error)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, service_name, success, http_status_code, response_time_ms, checked_at, error
            "#,
        )
        .bind(check.service_name)
        .bind(check.success)
        .bind(check.http_status_code)
        .bind(check.response_time_ms)
        .bind(check.checked_at)
        .bind(check.error)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
