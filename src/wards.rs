//! Ward occupancy summary.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{self, DatabaseError};
use crate::models::{Patient, PatientFilter};

/// Wards shown on the overview. Patients may carry other ward labels;
/// they count towards the total but get no row of their own.
pub const SUMMARY_WARDS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WardCount {
    pub ward: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WardSummary {
    pub total: u32,
    pub wards: Vec<WardCount>,
    pub total_critical: u32,
}

impl WardSummary {
    pub fn ward_count(&self, ward: &str) -> Option<u32> {
        self.wards.iter().find(|w| w.ward == ward).map(|w| w.count)
    }
}

/// Counts plus the full patient list, read from one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub summary: WardSummary,
    pub patients: Vec<Patient>,
}

/// The summary and the patient list in one transaction, so the counts
/// and the listed rows describe the same snapshot of the table.
pub fn overview(conn: &Connection) -> Result<Overview, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let summary = summary(&tx)?;
    let patients = db::list_all_patients(&tx)?;
    tx.commit()?;
    Ok(Overview { summary, patients })
}

/// Count patients overall, per summary ward, and critical.
///
/// Opens no transaction of its own; `overview` runs it inside one.
pub fn summary(conn: &Connection) -> Result<WardSummary, DatabaseError> {
    let total = db::count_patients(conn, &PatientFilter::All)?;
    let mut wards = Vec::with_capacity(SUMMARY_WARDS.len());
    for ward in SUMMARY_WARDS {
        let count = db::count_patients(conn, &PatientFilter::Ward(ward.to_string()))?;
        wards.push(WardCount {
            ward: ward.to_string(),
            count,
        });
    }
    let total_critical = db::count_patients(conn, &PatientFilter::Critical)?;

    Ok(WardSummary {
        total,
        wards,
        total_critical,
    })
}
