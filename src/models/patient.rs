use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Criticality;

/// A patient record as stored in the `patients` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub ward: String,
    pub is_critical: Criticality,
    pub notes: String,
    pub added_by: String,
}

/// The editable part of a patient record.
///
/// Add and edit both write a complete `PatientFields`; there is no
/// partial update, so a field left out of a form is stored empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatientFields {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub ward: String,
    pub is_critical: Criticality,
    pub notes: String,
}

impl PatientFields {
    /// Build fields from raw form input. Names and ward are trimmed and
    /// lowercased; dob and notes are kept as typed.
    pub fn normalized(
        first_name: Option<&str>,
        last_name: Option<&str>,
        dob: Option<&str>,
        ward: Option<&str>,
        is_critical: Criticality,
        notes: Option<&str>,
    ) -> Self {
        Self {
            first_name: lower(first_name),
            last_name: lower(last_name),
            dob: dob.unwrap_or_default().to_string(),
            ward: lower(ward),
            is_critical,
            notes: notes.unwrap_or_default().to_string(),
        }
    }

    /// Attach an identity and author, producing a storable record.
    pub fn into_patient(self, id: Uuid, author: &str) -> Patient {
        Patient {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            dob: self.dob,
            ward: self.ward,
            is_critical: self.is_critical,
            notes: self.notes,
            added_by: author.to_string(),
        }
    }
}

fn lower(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_lowercases_names_and_ward() {
        let fields = PatientFields::normalized(
            Some(" Ada "),
            Some("LOVELACE"),
            Some("1815-12-10"),
            Some("B"),
            Criticality::Critical,
            Some("Keep Warm"),
        );
        assert_eq!(fields.first_name, "ada");
        assert_eq!(fields.last_name, "lovelace");
        assert_eq!(fields.ward, "b");
        assert_eq!(fields.dob, "1815-12-10");
        assert_eq!(fields.notes, "Keep Warm");
    }

    #[test]
    fn missing_fields_become_empty() {
        let fields = PatientFields::normalized(None, None, None, None, Criticality::Stable, None);
        assert_eq!(fields, PatientFields::default());
    }

    #[test]
    fn into_patient_sets_author() {
        let id = Uuid::new_v4();
        let patient = PatientFields::default().into_patient(id, "nurse");
        assert_eq!(patient.id, id);
        assert_eq!(patient.added_by, "nurse");
    }
}
