use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{
    models::{
        centre::{Centre, CentreSummary},
        user::{CentreUser, CreateUserRequest, User, UserRole},
    },
    services::attendance::USER_COLS,
};

/// A roster entry whose birthday has already been normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub role: UserRole,
    pub diet: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Fields to change on an existing user; `None` keeps the stored value and
/// `Some(None)` clears a nullable column.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub diet: Option<Option<String>>,
    pub birthday: Option<Option<NaiveDate>>,
}

pub struct CentreService;

impl CentreService {
    pub async fn list(pool: &PgPool) -> anyhow::Result<Vec<CentreSummary>> {
        let centres = sqlx::query_as::<_, CentreSummary>(
            "SELECT id, name FROM centres ORDER BY name",
        )
        .fetch_all(pool)
        .await?;
        Ok(centres)
    }

    pub async fn find(pool: &PgPool, id: &str) -> anyhow::Result<Option<Centre>> {
        let centre = sqlx::query_as::<_, Centre>(
            "SELECT id, name, code, created_at FROM centres WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(centre)
    }

    pub async fn list_users(pool: &PgPool, centre: &str) -> anyhow::Result<Vec<CentreUser>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE centre_id = $1 ORDER BY name, username"
        ))
        .bind(centre)
        .fetch_all(pool)
        .await?;
        Ok(users.into_iter().map(CentreUser::from).collect())
    }

    /// Insert a user with an all-null initial week. `None` if the username
    /// is already taken.
    pub async fn create_user(
        pool: &PgPool,
        centre: &str,
        user: &NewUser,
        initial_week: &[NaiveDate],
    ) -> anyhow::Result<Option<User>> {
        let mut tx = pool.begin().await?;

        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, name, role, diet, birthday, centre_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (username) DO NOTHING
             RETURNING {USER_COLS}"
        ))
        .bind(&user.username)
        .bind(&user.name)
        .bind(user.role.to_string())
        .bind(&user.diet)
        .bind(user.birthday)
        .bind(centre)
        .fetch_optional(&mut *tx)
        .await?;

        if created.is_some() {
            sqlx::query(
                "INSERT INTO meal_attendance (username, date)
                 SELECT $1, d FROM UNNEST($2::date[]) AS d
                 ON CONFLICT (username, date) DO NOTHING",
            )
            .bind(&user.username)
            .bind(initial_week)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Per-field update: only the provided fields change.
    pub async fn update_user(
        pool: &PgPool,
        centre: &str,
        username: &str,
        patch: &UserPatch,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET name     = COALESCE($3, name),
                 role     = COALESCE($4, role),
                 diet     = CASE WHEN $5 THEN $6 ELSE diet END,
                 birthday = CASE WHEN $7 THEN $8 ELSE birthday END,
                 updated_at = NOW()
             WHERE username = $1 AND centre_id = $2
             RETURNING {USER_COLS}"
        ))
        .bind(username)
        .bind(centre)
        .bind(&patch.name)
        .bind(patch.role.map(|r| r.to_string()))
        .bind(patch.diet.is_some())
        .bind(patch.diet.clone().flatten())
        .bind(patch.birthday.is_some())
        .bind(patch.birthday.flatten())
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Upsert a whole roster in one transaction. Existing users keep their
    /// attendance and, when the import has none, their birthday. Usernames
    /// owned by another centre are left alone and reported as skipped; new
    /// users get an all-null `initial_week`.
    pub async fn import_users(
        pool: &PgPool,
        centre: &str,
        users: &[NewUser],
        initial_week: &[NaiveDate],
    ) -> anyhow::Result<ImportOutcome> {
        let mut tx = pool.begin().await?;
        let mut outcome = ImportOutcome::default();

        for user in users {
            // xmax = 0 only on a freshly inserted row.
            let inserted: Option<bool> = sqlx::query_scalar(
                "INSERT INTO users (username, name, role, diet, birthday, centre_id)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (username) DO UPDATE SET
                     name = EXCLUDED.name,
                     role = EXCLUDED.role,
                     diet = EXCLUDED.diet,
                     birthday = COALESCE(EXCLUDED.birthday, users.birthday),
                     updated_at = NOW()
                 WHERE users.centre_id = EXCLUDED.centre_id
                 RETURNING (xmax = 0)",
            )
            .bind(&user.username)
            .bind(&user.name)
            .bind(user.role.to_string())
            .bind(&user.diet)
            .bind(user.birthday)
            .bind(centre)
            .fetch_optional(&mut *tx)
            .await?;

            match inserted {
                None => {
                    tracing::warn!(username = %user.username, centre, "skipping user owned by another centre");
                    outcome.skipped.push(user.username.clone());
                }
                Some(fresh) => {
                    if fresh {
                        sqlx::query(
                            "INSERT INTO meal_attendance (username, date)
                             SELECT $1, d FROM UNNEST($2::date[]) AS d
                             ON CONFLICT (username, date) DO NOTHING",
                        )
                        .bind(&user.username)
                        .bind(initial_week)
                        .execute(&mut *tx)
                        .await?;
                    }
                    outcome.imported += 1;
                }
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

/// Result of a roster import.
#[derive(Debug, Default, PartialEq)]
pub struct ImportOutcome {
    pub imported: usize,
    /// Usernames that already belong to another centre.
    pub skipped: Vec<String>,
}

/// Normalise an imported roster. Unparseable birthdays are dropped (the user
/// is kept without one); their usernames are returned alongside.
pub fn prepare_import(requests: Vec<CreateUserRequest>) -> (Vec<NewUser>, Vec<String>) {
    let mut dropped = Vec::new();
    let users = requests
        .into_iter()
        .filter(|r| !r.username.trim().is_empty())
        .map(|r| {
            let birthday = match r.birthday.as_ref().map(|b| b.normalize()) {
                Some(Ok(date)) => Some(date),
                Some(Err(e)) => {
                    tracing::warn!(username = %r.username, "dropping birthday: {e}");
                    dropped.push(r.username.clone());
                    None
                }
                None => None,
            };
            NewUser {
                name: r
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| r.username.clone()),
                role: r.role.unwrap_or(UserRole::Staff),
                diet: r.diet.filter(|d| !d.is_empty()),
                username: r.username,
                birthday,
            }
        })
        .collect();
    (users, dropped)
}
