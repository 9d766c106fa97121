//! Per-period mutual exclusion.
//!
//! [`PeriodLocks`] serializes work inside one process. Writers in other
//! processes (a CLI recalculation next to a running server) are kept apart by
//! [`lock_period_in_db`], taken at the start of every write transaction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sea_orm::{ConnectionTrait, DbBackend, Statement};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

use crate::error::Result;
use crate::period::Period;

/// First key of the two-key Postgres advisory lock, shared by every period.
const ADVISORY_LOCK_CLASS: i32 = 0x4652;

/// One async mutex per period. Calculation and manual saves of the same
/// period are serialized; different periods never wait on each other.
#[derive(Debug, Clone, Default)]
pub struct PeriodLocks {
    locks: Arc<Mutex<HashMap<Period, Arc<AsyncMutex<()>>>>>,
}

impl PeriodLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `period`. The guard releases on drop.
    pub async fn acquire(&self, period: Period) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(period).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of periods that have been locked at least once.
    pub fn tracked_periods(&self) -> usize {
        self.locks
            .lock()
            .map(|locks| locks.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

/// Second key of the advisory lock: `YYYYMM`.
pub fn advisory_key(period: Period) -> i32 {
    period.year() * 100 + period.db_month()
}

/// Takes the database-level lock of `period` for the rest of the current
/// transaction; `conn` must be a transaction.
///
/// Postgres gets a transaction-scoped advisory lock keyed by the period.
/// SQLite has a single writer per database file, so an empty write takes
/// that lock up front instead of on the first real write.
pub async fn lock_period_in_db<C>(conn: &C, period: Period) -> Result<()>
where
    C: ConnectionTrait,
{
    match conn.get_database_backend() {
        DbBackend::Postgres => {
            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_advisory_xact_lock($1, $2)",
                [ADVISORY_LOCK_CLASS.into(), advisory_key(period).into()],
            ))
            .await?;
        }
        DbBackend::Sqlite => {
            conn.execute_unprepared("UPDATE monthly_values SET value = value WHERE 0")
                .await?;
        }
        backend => {
            trace!("No database-level period lock for {:?}", backend);
            return Ok(());
        }
    }
    trace!("Database lock held for {}", period);
    Ok(())
}
