use crate::model::employee::Employee;
use crate::store::mysql::{EMPLOYEE_COLUMNS, EmployeeRow};
use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

/// document number -> employee, for the check-in/check-out hot path.
/// Only positive lookups are cached; writes to an employee must call `invalidate`.
#[derive(Clone)]
pub struct DocumentCache {
    inner: Cache<u64, Employee>,
}

impl DocumentCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(50_000) // tune based on headcount
                .time_to_live(Duration::from_secs(ttl_secs))
                .build(),
        }
    }

    pub async fn get(&self, document_id: u64) -> Option<Employee> {
        self.inner.get(&document_id).await
    }

    pub async fn insert(&self, employee: Employee) {
        self.inner.insert(employee.document_id, employee).await;
    }

    pub async fn invalidate(&self, document_id: u64) {
        self.inner.invalidate(&document_id).await;
    }

    /// Batch insert
    async fn batch_insert(&self, employees: Vec<Employee>) {
        let futures: Vec<_> = employees
            .into_iter()
            .map(|e| self.inner.insert(e.document_id, e))
            .collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }

    /// Load active employees into the cache (batched)
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE state = 'active' ORDER BY id"
        );
        let mut stream = sqlx::query_as::<_, EmployeeRow>(&sql).fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            batch.push(Employee::try_from(row?)?);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_insert(std::mem::take(&mut batch)).await;
            }
        }

        // Insert any remaining employees
        if !batch.is_empty() {
            self.batch_insert(batch).await;
        }

        log::info!("Document cache warmup complete: {} active employees", total_count);

        Ok(())
    }
}
