use chrono::{Datelike, Duration, NaiveDate};
use sqlx::PgPool;

use crate::models::{
    attendance::{AttendanceMap, AttendanceRow, DayStatus, Meal, MealStatus},
    user::{User, UserRecord},
};

/// Explicit column list for `users`.
pub const USER_COLS: &str =
    "username, name, diet, centre_id, role, birthday, created_at, updated_at";

pub struct AttendanceService;

impl AttendanceService {
    /// Create the user with an all-null initial week, or, if the username is
    /// already taken, patch its static fields and leave attendance untouched.
    /// `diet` is always written; a missing `name` keeps the stored one.
    /// Returns the stored user and whether it was created.
    pub async fn create_if_absent(
        pool: &PgPool,
        username: &str,
        initial_week: &[NaiveDate],
        diet: Option<&str>,
        centre: &str,
        name: Option<&str>,
    ) -> anyhow::Result<(User, bool)> {
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, name, diet, centre_id)
             VALUES ($1, COALESCE($2, $1), $3, $4)
             ON CONFLICT (username) DO NOTHING
             RETURNING {USER_COLS}"
        ))
        .bind(username)
        .bind(name)
        .bind(diet)
        .bind(centre)
        .fetch_optional(&mut *tx)
        .await?;

        let result = match inserted {
            Some(user) => {
                sqlx::query(
                    "INSERT INTO meal_attendance (username, date)
                     SELECT $1, d FROM UNNEST($2::date[]) AS d
                     ON CONFLICT (username, date) DO NOTHING",
                )
                .bind(username)
                .bind(initial_week)
                .execute(&mut *tx)
                .await?;
                (user, true)
            }
            None => {
                let user = sqlx::query_as::<_, User>(&format!(
                    "UPDATE users
                     SET diet = $2,
                         centre_id = $3,
                         name = COALESCE($4, name),
                         updated_at = NOW()
                     WHERE username = $1
                     RETURNING {USER_COLS}"
                ))
                .bind(username)
                .bind(diet)
                .bind(centre)
                .bind(name)
                .fetch_one(&mut *tx)
                .await?;
                (user, false)
            }
        };

        tx.commit().await?;
        Ok(result)
    }

    pub async fn find_user(pool: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// The user record with its full attendance map, or `None`.
    pub async fn read(pool: &PgPool, username: &str) -> anyhow::Result<Option<UserRecord>> {
        let Some(user) = Self::find_user(pool, username).await? else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, AttendanceRow>(
            "SELECT date, breakfast, lunch, dinner
             FROM meal_attendance WHERE username = $1 ORDER BY date",
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        let map = rows.iter().map(|r| (r.date, r.day_status())).collect();
        Ok(Some(UserRecord::new(user, map)))
    }

    /// Overwrite the whole attendance map. Returns `false` if the user does
    /// not exist.
    pub async fn replace_attendance(
        pool: &PgPool,
        username: &str,
        map: &AttendanceMap,
    ) -> anyhow::Result<bool> {
        let mut tx = pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Ok(false);
        }

        sqlx::query("DELETE FROM meal_attendance WHERE username = $1")
            .bind(username)
            .execute(&mut *tx)
            .await?;

        let column = |meal: Meal| -> Vec<Option<String>> {
            map.values()
                .map(|d| d.get(meal).map(|s| s.as_str().to_string()))
                .collect()
        };
        let dates: Vec<NaiveDate> = map.keys().copied().collect();

        sqlx::query(
            "INSERT INTO meal_attendance (username, date, breakfast, lunch, dinner)
             SELECT $1, d.date, d.breakfast, d.lunch, d.dinner
             FROM UNNEST($2::date[], $3::varchar[], $4::varchar[], $5::varchar[])
                  AS d(date, breakfast, lunch, dinner)",
        )
        .bind(username)
        .bind(&dates)
        .bind(column(Meal::Breakfast))
        .bind(column(Meal::Lunch))
        .bind(column(Meal::Dinner))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(username, days = dates.len(), "attendance map replaced");
        Ok(true)
    }

    /// Set one meal of one day, leaving every other cell as stored.
    pub async fn set_meal_status(
        pool: &PgPool,
        username: &str,
        date: NaiveDate,
        meal: Meal,
        status: Option<MealStatus>,
    ) -> anyhow::Result<DayStatus> {
        let col = meal.column();
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            "INSERT INTO meal_attendance (username, date, {col})
             VALUES ($1, $2, $3)
             ON CONFLICT (username, date) DO UPDATE SET
                 {col} = EXCLUDED.{col},
                 updated_at = NOW()
             RETURNING date, breakfast, lunch, dinner"
        ))
        .bind(username)
        .bind(date)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(pool)
        .await?;
        Ok(row.day_status())
    }

    /// Seven days starting at `week_start`; days without a row read as null.
    pub async fn week(
        pool: &PgPool,
        username: &str,
        week_start: NaiveDate,
    ) -> anyhow::Result<AttendanceMap> {
        let week_end = week_start + Duration::days(6);
        let rows = sqlx::query_as::<_, AttendanceRow>(
            "SELECT date, breakfast, lunch, dinner
             FROM meal_attendance
             WHERE username = $1 AND date BETWEEN $2 AND $3",
        )
        .bind(username)
        .bind(week_start)
        .bind(week_end)
        .fetch_all(pool)
        .await?;
        Ok(fill_week(week_start, &rows))
    }
}

/// Monday..Sunday of the week containing `today`.
pub fn current_week(today: NaiveDate) -> Vec<NaiveDate> {
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    (0..7).map(|i| monday + Duration::days(i)).collect()
}

fn fill_week(week_start: NaiveDate, rows: &[AttendanceRow]) -> AttendanceMap {
    let mut map: AttendanceMap = (0..7)
        .map(|i| (week_start + Duration::days(i), DayStatus::default()))
        .collect();
    for row in rows {
        if let Some(day) = map.get_mut(&row.date) {
            *day = row.day_status();
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn current_week_starts_on_monday() {
        // 2024-07-10 is a Wednesday
        let week = current_week(d(2024, 7, 10));
        assert_eq!(week.len(), 7);
        assert_eq!(week[0], d(2024, 7, 8));
        assert_eq!(week[6], d(2024, 7, 14));
    }

    #[test]
    fn current_week_on_sunday_stays_in_same_week() {
        let week = current_week(d(2024, 7, 14));
        assert_eq!(week[0], d(2024, 7, 8));
    }

    #[test]
    fn fill_week_defaults_missing_days_to_null() {
        let rows = vec![
            AttendanceRow {
                date: d(2024, 7, 9),
                breakfast: Some("present".into()),
                lunch: None,
                dinner: Some("packed".into()),
            },
            // outside the window, ignored
            AttendanceRow {
                date: d(2024, 7, 20),
                breakfast: Some("absent".into()),
                lunch: None,
                dinner: None,
            },
        ];
        let map = fill_week(d(2024, 7, 8), &rows);
        assert_eq!(map.len(), 7);
        assert_eq!(map[&d(2024, 7, 8)], DayStatus::default());
        assert_eq!(map[&d(2024, 7, 9)].breakfast, Some(MealStatus::Present));
        assert_eq!(map[&d(2024, 7, 9)].dinner, Some(MealStatus::Packed));
        assert!(!map.contains_key(&d(2024, 7, 20)));
    }
}
