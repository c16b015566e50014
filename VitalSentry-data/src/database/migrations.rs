//! SQLite schema migrations
//!
//! All statements are `IF NOT EXISTS` so running them on every startup is
//! harmless. Column order here is the schema contract the repositories
//! write against; see `repository::storage`.

use tracing::info;

use super::connection::DatabasePool;
use super::DatabaseError;

/// Run all migrations against the given pool
pub fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    let conn = pool.get()
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    info!("Running database migrations");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS health_vitals (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            heart_rate REAL NOT NULL,
            spo2 REAL NOT NULL,
            temperature REAL NOT NULL,
            ppg REAL NOT NULL,
            estimated_systolic REAL NOT NULL,
            estimated_diastolic REAL NOT NULL,
            estimated_glucose REAL NOT NULL,
            confidence REAL NOT NULL,
            reasoning TEXT NOT NULL,
            alert_triggered INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_health_vitals_patient_timestamp
        ON health_vitals (patient_id, timestamp);

        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            heart_rate REAL NOT NULL,
            spo2 REAL NOT NULL,
            temperature REAL NOT NULL,
            estimated_systolic REAL NOT NULL,
            estimated_glucose REAL NOT NULL,
            message TEXT NOT NULL,
            severity TEXT NOT NULL,
            acknowledged INTEGER NOT NULL DEFAULT 0,
            acknowledged_at TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_alerts_patient_created
        ON alerts (patient_id, created_at);

        CREATE TABLE IF NOT EXISTS patient_profiles (
            patient_id TEXT PRIMARY KEY,
            device_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            gender TEXT NOT NULL,
            has_diabetes INTEGER NOT NULL DEFAULT 0,
            has_hypertension INTEGER NOT NULL DEFAULT 0,
            has_heart_condition INTEGER NOT NULL DEFAULT 0,
            baseline_heart_rate REAL,
            baseline_spo2 REAL,
            max_heart_rate REAL,
            min_heart_rate REAL,
            min_spo2 REAL,
            max_systolic REAL,
            max_glucose REAL
        );",
    )
    .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    info!("Database migrations completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn in_memory_pool() -> DatabasePool {
        let manager = r2d2_sqlite::SqliteConnectionManager::memory();
        Arc::new(r2d2::Pool::builder().max_size(1).build(manager).unwrap())
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let pool = in_memory_pool();
        run_migrations(&pool).unwrap();
        // Second run must not fail
        run_migrations(&pool).unwrap();
    }

    #[test]
    fn test_tables_exist_after_migration() {
        let pool = in_memory_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table'
                 AND name IN ('health_vitals', 'alerts', 'patient_profiles')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}
