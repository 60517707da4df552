use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{attendance::AttendanceMap, birthday::BirthdayInput};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Staff,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "staff" => Ok(UserRole::Staff),
            _ => Err(anyhow::anyhow!("Unknown role: {s}")),
        }
    }
}

/// DB row struct for `users`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub username: String,
    pub name: String,
    pub diet: Option<String>,
    pub centre_id: String,
    /// Stored as TEXT; see `UserRole` for the accepted values.
    pub role: String,
    pub birthday: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> UserRole {
        self.role.parse().unwrap_or(UserRole::Staff)
    }
}

/// A user together with their whole attendance map.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub username: String,
    pub name: String,
    pub diet: Option<String>,
    pub centre: String,
    pub role: UserRole,
    pub birthday: Option<NaiveDate>,
    pub meal_attendance: AttendanceMap,
}

impl UserRecord {
    pub fn new(user: User, meal_attendance: AttendanceMap) -> Self {
        Self {
            role: user.role(),
            username: user.username,
            name: user.name,
            diet: user.diet,
            centre: user.centre_id,
            birthday: user.birthday,
            meal_attendance,
        }
    }
}

/// Roster entry shown in the sign-in picker and the settings page.
#[derive(Debug, Clone, Serialize)]
pub struct CentreUser {
    pub username: String,
    pub name: String,
    pub role: UserRole,
    pub diet: Option<String>,
    pub birthday: Option<NaiveDate>,
}

impl From<User> for CentreUser {
    fn from(u: User) -> Self {
        Self {
            role: u.role(),
            username: u.username,
            name: u.name,
            diet: u.diet,
            birthday: u.birthday,
        }
    }
}

/// What the client keeps in local storage after signing in.
#[derive(Debug, Clone, Serialize)]
pub struct SessionProfile {
    pub centre: String,
    pub username: String,
    pub name: String,
    pub diet: Option<String>,
    pub role: UserRole,
}

impl From<User> for SessionProfile {
    fn from(u: User) -> Self {
        Self {
            role: u.role(),
            centre: u.centre_id,
            username: u.username,
            name: u.name,
            diet: u.diet,
        }
    }
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub centre: String,
    pub code: String,
    pub username: String,
    pub name: Option<String>,
    pub diet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub diet: Option<String>,
    pub birthday: Option<BirthdayInput>,
}

/// Absent fields are left alone; `"diet": null` and `"birthday": null` clear.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "present")]
    pub diet: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub birthday: Option<Option<BirthdayInput>>,
}

/// Distinguish an explicit `null` (`Some(None)`) from a missing field (`None`).
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ImportUsersRequest {
    pub users: Vec<CreateUserRequest>,
}

#[derive(Debug, Serialize)]
pub struct ImportUsersResponse {
    pub imported: usize,
    pub birthdays_dropped: Vec<String>,
    /// Usernames already registered at another centre.
    pub skipped: Vec<String>,
}
