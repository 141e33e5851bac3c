use std::str::FromStr;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str =
    "id, first_name, last_name, dob, ward, is_critical, notes, added_by";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, first_name, last_name, dob, ward, is_critical, notes, added_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.dob,
            patient.ward,
            patient.is_critical.as_str(),
            patient.notes,
            patient.added_by,
        ],
    )?;
    Ok(())
}

/// Store a new patient authored by `creator` and return its id.
pub fn add_patient(
    conn: &Connection,
    fields: PatientFields,
    creator: &str,
) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    insert_patient(conn, &fields.into_patient(id, creator))?;
    Ok(id)
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![id.to_string()],
            patient_row_from_rusqlite,
        )
        .optional()?;
    row.map(patient_from_row).transpose()
}

/// Overwrite every editable field of an existing patient.
///
/// `added_by` becomes `updater`; the original author is not kept.
pub fn replace_patient(
    conn: &Connection,
    id: &Uuid,
    fields: PatientFields,
    updater: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET first_name = ?2, last_name = ?3, dob = ?4, ward = ?5,
         is_critical = ?6, notes = ?7, added_by = ?8
         WHERE id = ?1",
        params![
            id.to_string(),
            fields.first_name,
            fields.last_name,
            fields.dob,
            fields.ward,
            fields.is_critical.as_str(),
            fields.notes,
            updater,
        ],
    )?;
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let removed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if removed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Patients matching `filter`, in insertion order.
pub fn list_patients(
    conn: &Connection,
    filter: &PatientFilter,
) -> Result<Vec<Patient>, DatabaseError> {
    let (clause, arg): (&str, Option<&str>) = match filter {
        PatientFilter::All => ("", None),
        PatientFilter::Ward(ward) => (" WHERE ward = ?1", Some(ward.as_str())),
        PatientFilter::Critical => (" WHERE is_critical = ?1", Some(Criticality::Critical.as_str())),
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients{clause} ORDER BY rowid"
    ))?;

    let rows = stmt.query_map(params_from_iter(arg), |row| Ok(patient_row_from_rusqlite(row)))?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row??)?);
    }
    Ok(patients)
}

pub fn list_all_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    list_patients(conn, &PatientFilter::All)
}

/// Patients in `ward`, matched the way stored wards are normalised
/// (trimmed and lowercased).
pub fn list_patients_by_ward(conn: &Connection, ward: &str) -> Result<Vec<Patient>, DatabaseError> {
    list_patients(conn, &PatientFilter::Ward(ward.trim().to_lowercase()))
}

pub fn list_critical_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    list_patients(conn, &PatientFilter::Critical)
}

/// Number of patients matching `filter`.
pub fn count_patients(conn: &Connection, filter: &PatientFilter) -> Result<u32, DatabaseError> {
    let count: u32 = match filter {
        PatientFilter::All => {
            conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?
        }
        PatientFilter::Ward(ward) => conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE ward = ?1",
            params![ward],
            |row| row.get(0),
        )?,
        PatientFilter::Critical => conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE is_critical = ?1",
            params![Criticality::Critical.as_str()],
            |row| row.get(0),
        )?,
    };
    Ok(count)
}

fn not_found(id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "Patient".into(),
        id: id.to_string(),
    }
}

// Internal row type: raw column values before enum/uuid parsing.
struct PatientRow {
    id: String,
    first_name: String,
    last_name: String,
    dob: String,
    ward: String,
    is_critical: String,
    notes: String,
    added_by: String,
}

fn patient_row_from_rusqlite(row: &Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        dob: row.get(3)?,
        ward: row.get(4)?,
        is_critical: row.get(5)?,
        notes: row.get(6)?,
        added_by: row.get(7)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    let id = Uuid::parse_str(&row.id).map_err(|_| DatabaseError::InvalidEnum {
        field: "patient.id".into(),
        value: row.id.clone(),
    })?;
    Ok(Patient {
        id,
        first_name: row.first_name,
        last_name: row.last_name,
        dob: row.dob,
        ward: row.ward,
        is_critical: Criticality::from_str(&row.is_critical)?,
        notes: row.notes,
        added_by: row.added_by,
    })
}
