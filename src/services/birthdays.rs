use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::birthday::BirthdayEntry;

pub struct BirthdayService;

impl BirthdayService {
    /// Birthdays of everyone in the centre, in calendar order.
    pub async fn birthdays_for_centre(
        pool: &PgPool,
        centre: &str,
    ) -> anyhow::Result<Vec<BirthdayEntry>> {
        let rows: Vec<(String, NaiveDate)> = sqlx::query_as(
            "SELECT name, birthday FROM users
             WHERE centre_id = $1 AND birthday IS NOT NULL
             ORDER BY name",
        )
        .bind(centre)
        .fetch_all(pool)
        .await?;

        Ok(list_birthdays(rows.iter().map(|(n, b)| (n.as_str(), *b))))
    }
}

pub fn list_birthdays<'a>(
    people: impl IntoIterator<Item = (&'a str, NaiveDate)>,
) -> Vec<BirthdayEntry> {
    let mut entries: Vec<BirthdayEntry> = people
        .into_iter()
        .filter_map(|(name, birthday)| {
            let initials = initials(name)?;
            Some(BirthdayEntry {
                initials,
                formatted_birthday: birthday.format("%b %-d").to_string(),
                sort_key: birthday.format("%m-%d").to_string(),
            })
        })
        .collect();
    entries.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    entries
}

/// First letter of the first and last word, or the first two letters of a
/// single-word name. `None` for a blank name.
pub fn initials(name: &str) -> Option<String> {
    let words: Vec<&str> = name.split_whitespace().collect();
    let letters: String = match words.as_slice() {
        [] => return None,
        [only] => only.chars().take(2).collect(),
        [first, .., last] => first.chars().take(1).chain(last.chars().take(1)).collect(),
    };
    Some(letters.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn initials_rules() {
        assert_eq!(initials("Ana Maria Lopez").as_deref(), Some("AL"));
        assert_eq!(initials("ben").as_deref(), Some("BE"));
        assert_eq!(initials("  Chloé   Durand ").as_deref(), Some("CD"));
        assert_eq!(initials("X").as_deref(), Some("X"));
        assert_eq!(initials("   "), None);
    }

    #[test]
    fn sorted_by_month_and_day_ignoring_year() {
        let list = list_birthdays(vec![
            ("Zed Last", d(1980, 12, 1)),
            ("Amy First", d(2001, 3, 9)),
            ("Bob Mid", d(1975, 3, 10)),
            ("", d(1990, 1, 1)),
        ]);
        let keys: Vec<&str> = list.iter().map(|e| e.sort_key.as_str()).collect();
        assert_eq!(keys, vec!["03-09", "03-10", "12-01"]);
        assert_eq!(list[0].initials, "AF");
        assert_eq!(list[0].formatted_birthday, "Mar 9");
        assert_eq!(list[2].formatted_birthday, "Dec 1");
    }
}
