use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use sqlx::PgPool;

use crate::models::{
    attendance::{DayStatus, Meal, MealStatus},
    report::{DailySummary, MealBuckets, MealCounts, ReportResult, UserDayRow},
};

/// Longest range accepted by [`ReportService::summary`], in days.
pub const MAX_SUMMARY_DAYS: i64 = 62;

pub struct ReportService;

impl ReportService {
    /// Present/packed counts for `date`, grouped by meal and by diet.
    pub async fn aggregate(
        pool: &PgPool,
        date: NaiveDate,
        centre: &str,
    ) -> anyhow::Result<ReportResult> {
        let rows = Self::centre_day_rows(pool, date, centre).await?;
        let report = fold_report(
            date,
            rows.iter()
                .map(|r| (r.username.as_str(), r.diet.as_deref(), r.day_status())),
        );
        tracing::debug!(
            centre,
            %date,
            users = rows.len(),
            "daily report aggregated"
        );
        Ok(report)
    }

    /// Username → that day's status triple, for every user of the centre.
    pub async fn user_attendance_for_date(
        pool: &PgPool,
        date: NaiveDate,
        centre: &str,
    ) -> anyhow::Result<BTreeMap<String, DayStatus>> {
        let rows = Self::centre_day_rows(pool, date, centre).await?;
        Ok(rows
            .into_iter()
            .map(|r| {
                let status = r.day_status();
                (r.username, status)
            })
            .collect())
    }

    /// Per-day totals over an inclusive date range.
    pub async fn summary(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
        centre: &str,
    ) -> anyhow::Result<Vec<DailySummary>> {
        let rows = sqlx::query_as::<_, UserDayRow>(
            "SELECT u.username, u.diet, a.date, a.breakfast, a.lunch, a.dinner
             FROM users u
             JOIN meal_attendance a ON a.username = u.username
             WHERE u.centre_id = $1 AND a.date BETWEEN $2 AND $3
             ORDER BY a.date, u.username",
        )
        .bind(centre)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(summarize(from, to, &rows))
    }

    async fn centre_day_rows(
        pool: &PgPool,
        date: NaiveDate,
        centre: &str,
    ) -> anyhow::Result<Vec<UserDayRow>> {
        let rows = sqlx::query_as::<_, UserDayRow>(
            "SELECT u.username, u.diet, a.date, a.breakfast, a.lunch, a.dinner
             FROM users u
             LEFT JOIN meal_attendance a ON a.username = u.username AND a.date = $2
             WHERE u.centre_id = $1
             ORDER BY u.username",
        )
        .bind(centre)
        .bind(date)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

/// Fold each user's day into the report buckets.
///
/// Only `present` and `packed` are counted. Users with a diet are also
/// counted under that diet. Bucket order follows input order.
pub fn fold_report<'a>(
    date: NaiveDate,
    users: impl IntoIterator<Item = (&'a str, Option<&'a str>, DayStatus)>,
) -> ReportResult {
    let mut report = ReportResult::empty(date);

    for (username, diet, day) in users {
        for meal in Meal::ALL {
            let (global, by_diet) = match day.get(meal) {
                Some(MealStatus::Present) => (
                    &mut report.attendance_present,
                    &mut report.diet_counts_present,
                ),
                Some(MealStatus::Packed) => (
                    &mut report.attendance_packed,
                    &mut report.diet_counts_packed,
                ),
                _ => continue,
            };

            global.bucket_mut(meal).users.push(username.to_string());
            if let Some(diet) = diet {
                by_diet
                    .entry(diet.to_string())
                    .or_default()
                    .bucket_mut(meal)
                    .users
                    .push(username.to_string());
            }
        }
    }

    report.attendance_present.seal();
    report.attendance_packed.seal();
    report
        .diet_counts_present
        .values_mut()
        .chain(report.diet_counts_packed.values_mut())
        .for_each(MealBuckets::seal);

    report
}

fn summarize(from: NaiveDate, to: NaiveDate, rows: &[UserDayRow]) -> Vec<DailySummary> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&UserDayRow>> = BTreeMap::new();
    for row in rows {
        if let Some(date) = row.date {
            by_date.entry(date).or_default().push(row);
        }
    }

    let days = (to - from).num_days();
    (0..=days)
        .map(|i| {
            let date = from + Duration::days(i);
            let day_rows = by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let report = fold_report(
                date,
                day_rows
                    .iter()
                    .map(|r| (r.username.as_str(), r.diet.as_deref(), r.day_status())),
            );
            DailySummary {
                date,
                present: MealCounts::from(&report.attendance_present),
                packed: MealCounts::from(&report.attendance_packed),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::Bucket;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn day(b: Option<MealStatus>, l: Option<MealStatus>, di: Option<MealStatus>) -> DayStatus {
        DayStatus {
            breakfast: b,
            lunch: l,
            dinner: di,
        }
    }

    fn bucket(users: &[&str]) -> Bucket {
        Bucket {
            count: users.len(),
            users: users.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn veg_and_null_diet_example() {
        let users = vec![
            ("A", Some("veg"), day(Some(MealStatus::Present), None, None)),
            ("B", None, day(Some(MealStatus::Packed), None, None)),
        ];
        let r = fold_report(d(2024, 7, 10), users);

        assert_eq!(r.attendance_present.breakfast, bucket(&["A"]));
        assert_eq!(r.attendance_packed.breakfast, bucket(&["B"]));
        assert_eq!(r.diet_counts_present["veg"].breakfast, bucket(&["A"]));
        assert!(r.diet_counts_packed.is_empty());
        assert_eq!(r.attendance_present.lunch, Bucket::default());
    }

    #[test]
    fn missing_day_contributes_nothing() {
        let r = fold_report(
            d(2024, 7, 10),
            vec![("A", Some("veg"), DayStatus::default())],
        );
        assert_eq!(r, ReportResult::empty(d(2024, 7, 10)));
    }

    #[test]
    fn absent_and_late_are_not_counted() {
        let r = fold_report(
            d(2024, 7, 10),
            vec![(
                "A",
                Some("halal"),
                day(
                    Some(MealStatus::Absent),
                    Some(MealStatus::Late),
                    Some(MealStatus::Present),
                ),
            )],
        );
        assert_eq!(r.attendance_present.breakfast.count, 0);
        assert_eq!(r.attendance_present.lunch.count, 0);
        assert_eq!(r.attendance_packed.lunch.count, 0);
        assert_eq!(r.attendance_present.dinner, bucket(&["A"]));
        let halal = &r.diet_counts_present["halal"];
        assert_eq!(halal.breakfast.count, 0);
        assert_eq!(halal.dinner, bucket(&["A"]));
    }

    #[test]
    fn counts_always_match_user_lists() {
        let statuses = [
            None,
            Some(MealStatus::Present),
            Some(MealStatus::Packed),
            Some(MealStatus::Absent),
        ];
        let diets = [None, Some("veg"), Some("gf")];
        let names: Vec<String> = (0..24).map(|i| format!("u{i}")).collect();
        let users: Vec<(&str, Option<&str>, DayStatus)> = names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                (
                    n.as_str(),
                    diets[i % 3],
                    day(statuses[i % 4], statuses[(i / 2) % 4], statuses[(i + 1) % 4]),
                )
            })
            .collect();
        let lookup: BTreeMap<&str, DayStatus> = users.iter().map(|(n, _, d)| (*n, *d)).collect();

        let r = fold_report(d(2024, 1, 1), users.clone());

        let check = |buckets: &MealBuckets, status: MealStatus| {
            for meal in Meal::ALL {
                let b = buckets.bucket(meal);
                assert_eq!(b.count, b.users.len());
                for u in &b.users {
                    assert_eq!(lookup[u.as_str()].get(meal), Some(status));
                }
            }
        };
        check(&r.attendance_present, MealStatus::Present);
        check(&r.attendance_packed, MealStatus::Packed);
        r.diet_counts_present
            .values()
            .for_each(|b| check(b, MealStatus::Present));
        r.diet_counts_packed
            .values()
            .for_each(|b| check(b, MealStatus::Packed));

        // Diet buckets partition the users that have a diet.
        for meal in Meal::ALL {
            let with_diet = users
                .iter()
                .filter(|(_, diet, d)| diet.is_some() && d.get(meal) == Some(MealStatus::Present))
                .count();
            let diet_total: usize = r
                .diet_counts_present
                .values()
                .map(|b| b.bucket(meal).count)
                .sum();
            assert_eq!(with_diet, diet_total);
        }
    }

    #[test]
    fn bucket_order_follows_input_order() {
        let users = vec![
            ("zoe", None, day(Some(MealStatus::Present), None, None)),
            ("amy", None, day(Some(MealStatus::Present), None, None)),
        ];
        let r = fold_report(d(2024, 7, 10), users);
        assert_eq!(r.attendance_present.breakfast.users, vec!["zoe", "amy"]);
    }

    #[test]
    fn summary_covers_every_day_in_range() {
        let row = |user: &str, date: NaiveDate, lunch: &str| UserDayRow {
            username: user.into(),
            diet: None,
            date: Some(date),
            breakfast: None,
            lunch: Some(lunch.into()),
            dinner: None,
        };
        let rows = vec![
            row("a", d(2024, 7, 8), "present"),
            row("b", d(2024, 7, 8), "packed"),
            row("a", d(2024, 7, 10), "present"),
        ];
        let s = summarize(d(2024, 7, 8), d(2024, 7, 10), &rows);
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].present.lunch, 1);
        assert_eq!(s[0].packed.lunch, 1);
        assert_eq!(s[1].present, MealCounts::default());
        assert_eq!(s[2].present.lunch, 1);
    }
}
