use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");
time::serde::format_description!(clock_format, Time, "[hour]:[minute]");

pub fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s.trim(), time::macros::format_description!("[year]-[month]-[day]"))
}

pub fn parse_clock(s: &str) -> Result<Time, time::error::Parse> {
    Time::parse(s.trim(), time::macros::format_description!("[hour]:[minute]"))
}

pub const DEFAULT_CONTACT_METHOD: &str = "แชทในแพลตฟอร์ม";

/// Medical specialty a shift is posted for. Serialized as the Thai label
/// the web client displays; stored as the snake_case variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum ShiftPosition {
    #[serde(rename = "แพทย์ทั่วไป")]
    GeneralPractitioner,
    #[serde(rename = "แพทย์อายุรกรรม")]
    InternalMedicine,
    #[serde(rename = "แพทย์ศัลยกรรม")]
    Surgery,
    #[serde(rename = "แพทย์กุมารเวชศาสตร์")]
    Pediatrics,
    #[serde(rename = "แพทย์สูติ-นรีเวชกรรม")]
    ObstetricsGynecology,
    #[serde(rename = "แพทย์ฉุกเฉิน")]
    EmergencyMedicine,
    #[serde(rename = "แพทย์วิสัญญีวิทยา")]
    Anesthesiology,
    #[serde(rename = "แพทย์รังสีวิทยา")]
    Radiology,
    #[serde(rename = "แพทย์พยาธิวิทยา")]
    Pathology,
    #[serde(rename = "แพทย์จิตเวชศาสตร์")]
    Psychiatry,
}

impl ShiftPosition {
    pub const ALL: [ShiftPosition; 10] = [
        ShiftPosition::GeneralPractitioner,
        ShiftPosition::InternalMedicine,
        ShiftPosition::Surgery,
        ShiftPosition::Pediatrics,
        ShiftPosition::ObstetricsGynecology,
        ShiftPosition::EmergencyMedicine,
        ShiftPosition::Anesthesiology,
        ShiftPosition::Radiology,
        ShiftPosition::Pathology,
        ShiftPosition::Psychiatry,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShiftPosition::GeneralPractitioner => "แพทย์ทั่วไป",
            ShiftPosition::InternalMedicine => "แพทย์อายุรกรรม",
            ShiftPosition::Surgery => "แพทย์ศัลยกรรม",
            ShiftPosition::Pediatrics => "แพทย์กุมารเวชศาสตร์",
            ShiftPosition::ObstetricsGynecology => "แพทย์สูติ-นรีเวชกรรม",
            ShiftPosition::EmergencyMedicine => "แพทย์ฉุกเฉิน",
            ShiftPosition::Anesthesiology => "แพทย์วิสัญญีวิทยา",
            ShiftPosition::Radiology => "แพทย์รังสีวิทยา",
            ShiftPosition::Pathology => "แพทย์พยาธิวิทยา",
            ShiftPosition::Psychiatry => "แพทย์จิตเวชศาสตร์",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ShiftPosition::GeneralPractitioner => "general_practitioner",
            ShiftPosition::InternalMedicine => "internal_medicine",
            ShiftPosition::Surgery => "surgery",
            ShiftPosition::Pediatrics => "pediatrics",
            ShiftPosition::ObstetricsGynecology => "obstetrics_gynecology",
            ShiftPosition::EmergencyMedicine => "emergency_medicine",
            ShiftPosition::Anesthesiology => "anesthesiology",
            ShiftPosition::Radiology => "radiology",
            ShiftPosition::Pathology => "pathology",
            ShiftPosition::Psychiatry => "psychiatry",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown position {0:?}")]
pub struct UnknownPosition(pub String);

impl FromStr for ShiftPosition {
    type Err = UnknownPosition;

    /// Accepts either the Thai label or the slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ShiftPosition::ALL
            .into_iter()
            .find(|p| p.label() == s || p.slug() == s)
            .ok_or_else(|| UnknownPosition(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Shift {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub position: ShiftPosition,
    #[serde(with = "date_format")]
    pub shift_date: Date,
    #[serde(with = "clock_format")]
    pub start_time: Time,
    #[serde(with = "clock_format")]
    pub end_time: Time,
    pub hospital_name: String,
    pub location: String,
    pub compensation: f64,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub contact_method: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewShift {
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub position: ShiftPosition,
    pub shift_date: Date,
    pub start_time: Time,
    pub end_time: Time,
    pub hospital_name: String,
    pub location: String,
    pub compensation: f64,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub contact_method: String,
}

#[cfg(test)]
impl NewShift {
    pub fn into_shift(self, id: Uuid, created_at: OffsetDateTime) -> Shift {
        Shift {
            id,
            doctor_id: self.doctor_id,
            doctor_name: self.doctor_name,
            position: self.position,
            shift_date: self.shift_date,
            start_time: self.start_time,
            end_time: self.end_time,
            hospital_name: self.hospital_name,
            location: self.location,
            compensation: self.compensation,
            description: self.description,
            requirements: self.requirements,
            contact_method: self.contact_method,
            created_at,
            is_active: true,
        }
    }
}

/// Criteria for browsing active shifts; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ShiftFilter {
    pub position: Option<ShiftPosition>,
    /// Case-insensitive substring of `location`.
    pub location: Option<String>,
    /// Inclusive.
    pub date_from: Option<Date>,
    /// Inclusive.
    pub date_to: Option<Date>,
}

// Mirrors the WHERE clause built in `shifts::repo` for the in-memory store.
#[cfg(test)]
impl ShiftFilter {
    pub fn matches(&self, shift: &Shift) -> bool {
        shift.is_active
            && self.position.map_or(true, |p| shift.position == p)
            && self.location.as_deref().map_or(true, |loc| {
                shift.location.to_lowercase().contains(&loc.to_lowercase())
            })
            && self.date_from.map_or(true, |d| shift.shift_date >= d)
            && self.date_to.map_or(true, |d| shift.shift_date <= d)
    }
}
