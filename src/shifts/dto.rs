use serde::Deserialize;

use crate::shifts::repo_types::ShiftPosition;

/// Body of `POST /shifts`. Dates and times arrive as `YYYY-MM-DD` / `HH:MM`
/// strings and are parsed by the service so format errors become 400s.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShiftRequest {
    pub position: ShiftPosition,
    pub shift_date: String,
    pub start_time: String,
    pub end_time: String,
    pub hospital_name: String,
    pub location: String,
    pub compensation: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub contact_method: Option<String>,
}

/// Query string of `GET /shifts`.
#[derive(Debug, Default, Deserialize)]
pub struct ShiftQuery {
    pub position: Option<String>,
    pub location: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}
