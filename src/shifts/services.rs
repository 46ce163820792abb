use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    error::{AppError, AppResult},
    shifts::{
        dto::{CreateShiftRequest, ShiftQuery},
        repo_types::{
            parse_clock, parse_date, NewShift, Shift, ShiftFilter, ShiftPosition,
            DEFAULT_CONTACT_METHOD,
        },
    },
    state::AppState,
};

fn non_empty(field: &str, value: String) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn new_shift(owner: &User, req: CreateShiftRequest) -> AppResult<NewShift> {
    let shift_date = parse_date(&req.shift_date)
        .map_err(|_| AppError::bad_request("shift_date must be YYYY-MM-DD"))?;
    let start_time = parse_clock(&req.start_time)
        .map_err(|_| AppError::bad_request("start_time must be HH:MM"))?;
    let end_time = parse_clock(&req.end_time)
        .map_err(|_| AppError::bad_request("end_time must be HH:MM"))?;
    if !req.compensation.is_finite() || req.compensation < 0.0 {
        return Err(AppError::bad_request("compensation must be a non-negative number"));
    }

    Ok(NewShift {
        doctor_id: owner.id,
        doctor_name: owner.full_name(),
        position: req.position,
        shift_date,
        start_time,
        end_time,
        hospital_name: non_empty("hospital_name", req.hospital_name)?,
        location: non_empty("location", req.location)?,
        compensation: req.compensation,
        description: optional_text(req.description),
        requirements: optional_text(req.requirements),
        contact_method: optional_text(req.contact_method)
            .unwrap_or_else(|| DEFAULT_CONTACT_METHOD.to_string()),
    })
}

pub(crate) fn filter_from_query(q: ShiftQuery) -> AppResult<ShiftFilter> {
    let position = optional_text(q.position)
        .map(|p| p.parse::<ShiftPosition>())
        .transpose()
        .map_err(|e| AppError::bad_request(format!("Invalid position: {}", e)))?;
    let date_from = optional_text(q.date_from)
        .map(|d| parse_date(&d))
        .transpose()
        .map_err(|_| AppError::bad_request("date_from must be YYYY-MM-DD"))?;
    let date_to = optional_text(q.date_to)
        .map(|d| parse_date(&d))
        .transpose()
        .map_err(|_| AppError::bad_request("date_to must be YYYY-MM-DD"))?;

    Ok(ShiftFilter {
        position,
        location: optional_text(q.location),
        date_from,
        date_to,
    })
}

pub async fn create_shift(state: &AppState, owner: &User, req: CreateShiftRequest) -> AppResult<Shift> {
    let shift = state.shifts.create(new_shift(owner, req)?).await?;
    info!(shift_id = %shift.id, doctor_id = %owner.id, position = shift.position.slug(), "shift created");
    Ok(shift)
}

pub async fn delete_shift(state: &AppState, owner: &User, raw_id: &str) -> AppResult<()> {
    let not_found = || AppError::not_found("Shift not found or not authorized");
    let shift_id = Uuid::parse_str(raw_id).map_err(|_| not_found())?;

    if !state.shifts.deactivate(shift_id, owner.id).await? {
        warn!(%shift_id, doctor_id = %owner.id, "delete of missing or foreign shift");
        return Err(not_found());
    }
    info!(%shift_id, doctor_id = %owner.id, "shift deactivated");
    Ok(())
}
