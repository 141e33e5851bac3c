//! Patient list and the add / edit / delete forms.
//!
//! Unknown and malformed ids both render the 404 page.

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Extension, Form};
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::models::{Criticality, Patient, PatientFields};
use crate::wards::SUMMARY_WARDS;
use crate::web::endpoints::blocking;
use crate::web::error::WebError;
use crate::web::types::{AppContext, SessionContext, SessionUser};
use crate::web::views::{Page, Redirect};

pub const PATIENT_ADDED: &str = "Patient Successfully Added";
pub const PATIENT_UPDATED: &str = "Patient Successfully Updated";
pub const PATIENT_DELETED: &str = "Patient Successfully Deleted";

/// Add/edit form body. Every field may be missing; an unticked
/// checkbox is simply absent.
#[derive(Debug, Default, Deserialize)]
pub struct PatientForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub ward: Option<String>,
    pub is_critical: Option<String>,
    pub notes: Option<String>,
}

impl PatientForm {
    pub fn into_fields(self) -> PatientFields {
        PatientFields::normalized(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.dob.as_deref(),
            self.ward.as_deref(),
            Criticality::from_checkbox(self.is_critical.as_deref()),
            self.notes.as_deref(),
        )
    }
}

fn parse_id(raw: &str) -> Result<Uuid, WebError> {
    Uuid::parse_str(raw).map_err(|_| WebError::NotFound(format!("patient {raw}")))
}

/// Ward choices for the form, keeping a patient's off-list ward selectable.
fn ward_choices(current: Option<&Patient>) -> Vec<String> {
    let mut wards: Vec<String> = SUMMARY_WARDS.iter().map(|w| w.to_string()).collect();
    if let Some(patient) = current {
        if !patient.ward.is_empty() && !wards.contains(&patient.ward) {
            wards.push(patient.ward.clone());
        }
    }
    wards
}

/// `GET /patients`
pub async fn list(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, WebError> {
    let patients = blocking(&ctx.core, |core| {
        let conn = core.open_db()?;
        Ok(db::list_all_patients(&conn)?)
    })
    .await?;

    Page::new("patients.html", &session)
        .insert("patients", &patients)
        .render(&ctx.templates)
}

/// `GET /add_patient`
pub async fn add_form(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, WebError> {
    Page::new("add_patient.html", &session)
        .insert("patient", &Option::<Patient>::None)
        .insert("wards", &ward_choices(None))
        .render(&ctx.templates)
}

/// `POST /add_patient`
pub async fn add(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    Extension(user): Extension<SessionUser>,
    form: Result<Form<PatientForm>, FormRejection>,
) -> Result<Response, WebError> {
    let Form(form) = form?;
    let fields = form.into_fields();
    let creator = user.username.clone();
    let id = blocking(&ctx.core, move |core| {
        let conn = core.open_db()?;
        Ok(db::add_patient(&conn, fields, &creator)?)
    })
    .await?;
    tracing::info!(patient_id = %id, user = %user.username, "Patient added");

    Ok(Redirect::to("/patients", &session)
        .flash(PATIENT_ADDED)
        .finish(ctx.core.signer()))
}

/// `GET /edit_patient/:id`: form pre-filled with the current record.
pub async fn edit_form(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    let patient = blocking(&ctx.core, move |core| {
        let conn = core.open_db()?;
        Ok(db::get_patient(&conn, &id)?)
    })
    .await?
    .ok_or_else(|| WebError::NotFound(format!("patient {id}")))?;

    Page::new("edit_patient.html", &session)
        .insert("wards", &ward_choices(Some(&patient)))
        .insert("patient", &patient)
        .render(&ctx.templates)
}

/// `POST /edit_patient/:id`: full replacement; the editor becomes
/// `added_by`.
pub async fn edit(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    Extension(user): Extension<SessionUser>,
    Path(raw_id): Path<String>,
    form: Result<Form<PatientForm>, FormRejection>,
) -> Result<Response, WebError> {
    let Form(form) = form?;
    let id = parse_id(&raw_id)?;
    let fields = form.into_fields();
    let updater = user.username.clone();
    blocking(&ctx.core, move |core| {
        let conn = core.open_db()?;
        Ok(db::replace_patient(&conn, &id, fields, &updater)?)
    })
    .await?;
    tracing::info!(patient_id = %id, user = %user.username, "Patient updated");

    Ok(Redirect::to("/patients", &session)
        .flash(PATIENT_UPDATED)
        .finish(ctx.core.signer()))
}

/// `GET /delete_patient/:id`
pub async fn delete(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    Extension(user): Extension<SessionUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    blocking(&ctx.core, move |core| {
        let conn = core.open_db()?;
        Ok(db::delete_patient(&conn, &id)?)
    })
    .await?;
    tracing::info!(patient_id = %id, user = %user.username, "Patient deleted");

    Ok(Redirect::to("/patients", &session)
        .flash(PATIENT_DELETED)
        .finish(ctx.core.signer()))
}
