use rusqlite::named_params;
use tracing::debug;

use crate::models::profile::PatientProfile;
use crate::models::vitals::{AlertRecord, HealthVitalRecord};
use crate::database::DatabasePool;
use super::errors::RepositoryError;

/// Database storage operations for vital records, alerts and profiles.
///
/// Every INSERT names its columns and binds named parameters, so the
/// mapping between struct fields and table columns is explicit at the
/// write site. Reordering a struct cannot silently shift values into the
/// wrong columns.
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Store a health vital record in the database
    pub fn insert_vital(pool: &DatabasePool, record: &HealthVitalRecord) -> Result<(), RepositoryError> {
        debug!("Storing health vital record in database: id={}", record.id);

        let conn = pool.get().map_err(RepositoryError::Pool)?;

        conn.execute(
            "INSERT INTO health_vitals
             (id, patient_id, device_id, timestamp, heart_rate, spo2, temperature, ppg,
              estimated_systolic, estimated_diastolic, estimated_glucose, confidence,
              reasoning, alert_triggered, created_at)
             VALUES (:id, :patient_id, :device_id, :timestamp, :heart_rate, :spo2,
                     :temperature, :ppg, :estimated_systolic, :estimated_diastolic,
                     :estimated_glucose, :confidence, :reasoning, :alert_triggered,
                     :created_at)",
            named_params! {
                ":id": record.id,
                ":patient_id": record.patient_id,
                ":device_id": record.device_id,
                ":timestamp": record.timestamp,
                ":heart_rate": record.heart_rate,
                ":spo2": record.spo2,
                ":temperature": record.temperature,
                ":ppg": record.ppg,
                ":estimated_systolic": record.estimated_systolic,
                ":estimated_diastolic": record.estimated_diastolic,
                ":estimated_glucose": record.estimated_glucose,
                ":confidence": record.confidence,
                ":reasoning": record.reasoning,
                ":alert_triggered": record.alert_triggered,
                ":created_at": record.created_at,
            },
        )?;

        Ok(())
    }

    /// Store an alert record in the database
    pub fn insert_alert(pool: &DatabasePool, record: &AlertRecord) -> Result<(), RepositoryError> {
        debug!("Storing alert record in database: id={}", record.id);

        let conn = pool.get().map_err(RepositoryError::Pool)?;

        conn.execute(
            "INSERT INTO alerts
             (id, patient_id, device_id, timestamp, heart_rate, spo2, temperature,
              estimated_systolic, estimated_glucose, message, severity,
              acknowledged, acknowledged_at, created_at)
             VALUES (:id, :patient_id, :device_id, :timestamp, :heart_rate, :spo2,
                     :temperature, :estimated_systolic, :estimated_glucose, :message,
                     :severity, :acknowledged, :acknowledged_at, :created_at)",
            named_params! {
                ":id": record.id,
                ":patient_id": record.patient_id,
                ":device_id": record.device_id,
                ":timestamp": record.timestamp,
                ":heart_rate": record.heart_rate,
                ":spo2": record.spo2,
                ":temperature": record.temperature,
                ":estimated_systolic": record.estimated_systolic,
                ":estimated_glucose": record.estimated_glucose,
                ":message": record.message,
                ":severity": record.severity,
                ":acknowledged": record.acknowledged,
                ":acknowledged_at": record.acknowledged_at,
                ":created_at": record.created_at,
            },
        )?;

        Ok(())
    }

    /// Get the most recent vital records for a patient, newest first
    pub fn get_recent_for_patient(
        pool: &DatabasePool,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<HealthVitalRecord>, RepositoryError> {
        debug!("Getting recent vitals from database: patient_id={}", patient_id);

        let conn = pool.get().map_err(RepositoryError::Pool)?;

        let mut stmt = conn.prepare(
            "SELECT id, patient_id, device_id, timestamp, heart_rate, spo2, temperature,
                    ppg, estimated_systolic, estimated_diastolic, estimated_glucose,
                    confidence, reasoning, alert_triggered, created_at
             FROM health_vitals
             WHERE patient_id = :patient_id
             ORDER BY timestamp DESC
             LIMIT :limit",
        )?;

        let rows = stmt.query_map(
            named_params! { ":patient_id": patient_id, ":limit": limit as i64 },
            Self::vital_from_row,
        )?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }

        Ok(result)
    }

    /// Get vital records for a patient within a timestamp range, oldest first
    pub fn get_for_patient_in_range(
        pool: &DatabasePool,
        patient_id: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<HealthVitalRecord>, RepositoryError> {
        debug!("Getting vitals in range from database: patient_id={}", patient_id);

        let conn = pool.get().map_err(RepositoryError::Pool)?;

        let mut stmt = conn.prepare(
            "SELECT id, patient_id, device_id, timestamp, heart_rate, spo2, temperature,
                    ppg, estimated_systolic, estimated_diastolic, estimated_glucose,
                    confidence, reasoning, alert_triggered, created_at
             FROM health_vitals
             WHERE patient_id = :patient_id
             AND (:start IS NULL OR timestamp >= :start)
             AND (:end IS NULL OR timestamp <= :end)
             ORDER BY timestamp ASC",
        )?;

        let rows = stmt.query_map(
            named_params! { ":patient_id": patient_id, ":start": start, ":end": end },
            Self::vital_from_row,
        )?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }

        Ok(result)
    }

    /// Get all alerts for a patient, newest first
    pub fn get_alerts_for_patient(
        pool: &DatabasePool,
        patient_id: &str,
    ) -> Result<Vec<AlertRecord>, RepositoryError> {
        debug!("Getting alerts from database: patient_id={}", patient_id);

        let conn = pool.get().map_err(RepositoryError::Pool)?;

        let mut stmt = conn.prepare(
            "SELECT id, patient_id, device_id, timestamp, heart_rate, spo2, temperature,
                    estimated_systolic, estimated_glucose, message, severity,
                    acknowledged, acknowledged_at, created_at
             FROM alerts
             WHERE patient_id = :patient_id
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(
            named_params! { ":patient_id": patient_id },
            Self::alert_from_row,
        )?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }

        Ok(result)
    }

    /// Get a patient profile by its registered device id
    pub fn get_profile_by_device(
        pool: &DatabasePool,
        device_id: &str,
    ) -> Result<Option<PatientProfile>, RepositoryError> {
        debug!("Getting patient profile from database: device_id={}", device_id);

        let conn = pool.get().map_err(RepositoryError::Pool)?;

        let mut stmt = conn.prepare(
            "SELECT patient_id, device_id, name, age, gender, has_diabetes,
                    has_hypertension, has_heart_condition, baseline_heart_rate,
                    baseline_spo2, max_heart_rate, min_heart_rate, min_spo2,
                    max_systolic, max_glucose
             FROM patient_profiles
             WHERE device_id = :device_id",
        )?;

        let mut rows = stmt.query_map(
            named_params! { ":device_id": device_id },
            Self::profile_from_row,
        )?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Get a patient profile by patient id
    pub fn get_profile_by_patient(
        pool: &DatabasePool,
        patient_id: &str,
    ) -> Result<Option<PatientProfile>, RepositoryError> {
        debug!("Getting patient profile from database: patient_id={}", patient_id);

        let conn = pool.get().map_err(RepositoryError::Pool)?;

        let mut stmt = conn.prepare(
            "SELECT patient_id, device_id, name, age, gender, has_diabetes,
                    has_hypertension, has_heart_condition, baseline_heart_rate,
                    baseline_spo2, max_heart_rate, min_heart_rate, min_spo2,
                    max_systolic, max_glucose
             FROM patient_profiles
             WHERE patient_id = :patient_id",
        )?;

        let mut rows = stmt.query_map(
            named_params! { ":patient_id": patient_id },
            Self::profile_from_row,
        )?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a patient profile
    pub fn upsert_profile(pool: &DatabasePool, profile: &PatientProfile) -> Result<(), RepositoryError> {
        debug!("Upserting patient profile: patient_id={}", profile.patient_id);

        let conn = pool.get().map_err(RepositoryError::Pool)?;

        conn.execute(
            "INSERT OR REPLACE INTO patient_profiles
             (patient_id, device_id, name, age, gender, has_diabetes, has_hypertension,
              has_heart_condition, baseline_heart_rate, baseline_spo2, max_heart_rate,
              min_heart_rate, min_spo2, max_systolic, max_glucose)
             VALUES (:patient_id, :device_id, :name, :age, :gender, :has_diabetes,
                     :has_hypertension, :has_heart_condition, :baseline_heart_rate,
                     :baseline_spo2, :max_heart_rate, :min_heart_rate, :min_spo2,
                     :max_systolic, :max_glucose)",
            named_params! {
                ":patient_id": profile.patient_id,
                ":device_id": profile.device_id,
                ":name": profile.name,
                ":age": profile.age,
                ":gender": profile.gender,
                ":has_diabetes": profile.has_diabetes,
                ":has_hypertension": profile.has_hypertension,
                ":has_heart_condition": profile.has_heart_condition,
                ":baseline_heart_rate": profile.baseline_heart_rate,
                ":baseline_spo2": profile.baseline_spo2,
                ":max_heart_rate": profile.max_heart_rate,
                ":min_heart_rate": profile.min_heart_rate,
                ":min_spo2": profile.min_spo2,
                ":max_systolic": profile.max_systolic,
                ":max_glucose": profile.max_glucose,
            },
        )?;

        Ok(())
    }

    /// Map a health_vitals row to its storage model
    fn vital_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HealthVitalRecord> {
        Ok(HealthVitalRecord {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            device_id: row.get(2)?,
            timestamp: row.get(3)?,
            heart_rate: row.get(4)?,
            spo2: row.get(5)?,
            temperature: row.get(6)?,
            ppg: row.get(7)?,
            estimated_systolic: row.get(8)?,
            estimated_diastolic: row.get(9)?,
            estimated_glucose: row.get(10)?,
            confidence: row.get(11)?,
            reasoning: row.get(12)?,
            alert_triggered: row.get(13)?,
            created_at: row.get(14)?,
        })
    }

    /// Map an alerts row to its storage model
    fn alert_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AlertRecord> {
        Ok(AlertRecord {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            device_id: row.get(2)?,
            timestamp: row.get(3)?,
            heart_rate: row.get(4)?,
            spo2: row.get(5)?,
            temperature: row.get(6)?,
            estimated_systolic: row.get(7)?,
            estimated_glucose: row.get(8)?,
            message: row.get(9)?,
            severity: row.get(10)?,
            acknowledged: row.get(11)?,
            acknowledged_at: row.get(12)?,
            created_at: row.get(13)?,
        })
    }

    /// Map a patient_profiles row to its storage model
    fn profile_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientProfile> {
        Ok(PatientProfile {
            patient_id: row.get(0)?,
            device_id: row.get(1)?,
            name: row.get(2)?,
            age: row.get(3)?,
            gender: row.get(4)?,
            has_diabetes: row.get(5)?,
            has_hypertension: row.get(6)?,
            has_heart_condition: row.get(7)?,
            baseline_heart_rate: row.get(8)?,
            baseline_spo2: row.get(9)?,
            max_heart_rate: row.get(10)?,
            min_heart_rate: row.get(11)?,
            min_spo2: row.get(12)?,
            max_systolic: row.get(13)?,
            max_glucose: row.get(14)?,
        })
    }
}
