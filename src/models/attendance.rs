use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("Unknown meal status: {0}")]
pub struct StatusParseError(pub String);

/// Attendance state of one user for one meal on one day.
///
/// `Late` is accepted when reading stored data but never written by the
/// check-in path and never counted in reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MealStatus {
    Present,
    Absent,
    Packed,
    Late,
}

impl MealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealStatus::Present => "present",
            MealStatus::Absent => "absent",
            MealStatus::Packed => "packed",
            MealStatus::Late => "late",
        }
    }

    /// Whether the check-in UI is allowed to store this status.
    pub fn is_writable(&self) -> bool {
        !matches!(self, MealStatus::Late)
    }
}

impl std::fmt::Display for MealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MealStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(MealStatus::Present),
            "absent" => Ok(MealStatus::Absent),
            "packed" => Ok(MealStatus::Packed),
            "late" => Ok(MealStatus::Late),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
}

impl Meal {
    pub const ALL: [Meal; 3] = [Meal::Breakfast, Meal::Lunch, Meal::Dinner];

    /// Column name in `meal_attendance`. Static, safe to splice into SQL.
    pub fn column(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
        }
    }
}

/// The three meal cells of one day. A missing day reads as all `None`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayStatus {
    #[serde(default)]
    pub breakfast: Option<MealStatus>,
    #[serde(default)]
    pub lunch: Option<MealStatus>,
    #[serde(default)]
    pub dinner: Option<MealStatus>,
}

impl DayStatus {
    pub fn get(&self, meal: Meal) -> Option<MealStatus> {
        match meal {
            Meal::Breakfast => self.breakfast,
            Meal::Lunch => self.lunch,
            Meal::Dinner => self.dinner,
        }
    }

    pub fn set(&mut self, meal: Meal, status: Option<MealStatus>) {
        match meal {
            Meal::Breakfast => self.breakfast = status,
            Meal::Lunch => self.lunch = status,
            Meal::Dinner => self.dinner = status,
        }
    }

    /// Build from the raw TEXT columns of a `meal_attendance` row.
    /// Unknown values read as `None`.
    pub fn from_columns(
        breakfast: Option<&str>,
        lunch: Option<&str>,
        dinner: Option<&str>,
    ) -> Self {
        let parse = |v: Option<&str>| v.and_then(|s| s.parse().ok());
        Self {
            breakfast: parse(breakfast),
            lunch: parse(lunch),
            dinner: parse(dinner),
        }
    }

    pub fn writable(&self) -> bool {
        Meal::ALL
            .iter()
            .filter_map(|m| self.get(*m))
            .all(|s| s.is_writable())
    }
}

pub type AttendanceMap = BTreeMap<NaiveDate, DayStatus>;

/// Raw `meal_attendance` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRow {
    pub date: NaiveDate,
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
}

impl AttendanceRow {
    pub fn day_status(&self) -> DayStatus {
        DayStatus::from_columns(
            self.breakfast.as_deref(),
            self.lunch.as_deref(),
            self.dinner.as_deref(),
        )
    }
}

/// Body for PUT /attendance (whole-map overwrite).
#[derive(Debug, Deserialize)]
pub struct ReplaceAttendanceRequest {
    pub meal_attendance: AttendanceMap,
}

/// Body for PATCH /attendance/{date}.
#[derive(Debug, Deserialize)]
pub struct SetMealStatusRequest {
    pub meal: Meal,
    pub status: Option<MealStatus>,
}

/// Query params for GET /attendance/week.
#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    /// First day of the desired week (ISO 8601 date).
    pub week_start: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!("packed".parse::<MealStatus>(), Ok(MealStatus::Packed));
        assert_eq!("late".parse::<MealStatus>(), Ok(MealStatus::Late));
        assert!("PRESENT".parse::<MealStatus>().is_err());
    }

    #[test]
    fn day_status_from_columns_ignores_garbage() {
        let day = DayStatus::from_columns(Some("present"), Some("???"), None);
        assert_eq!(day.breakfast, Some(MealStatus::Present));
        assert_eq!(day.lunch, None);
        assert_eq!(day.dinner, None);
    }

    #[test]
    fn late_is_not_writable() {
        let mut day = DayStatus::default();
        assert!(day.writable());
        day.set(Meal::Dinner, Some(MealStatus::Late));
        assert!(!day.writable());
    }

    #[test]
    fn day_status_deserializes_missing_meals_as_null() {
        let day: DayStatus = serde_json::from_str(r#"{"lunch":"absent"}"#).unwrap();
        assert_eq!(day.lunch, Some(MealStatus::Absent));
        assert_eq!(day.breakfast, None);
        assert_eq!(day.dinner, None);
    }
}
