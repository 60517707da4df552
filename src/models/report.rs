use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::attendance::{DayStatus, Meal};

/// Count plus the usernames behind it.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Bucket {
    pub count: usize,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MealBuckets {
    pub breakfast: Bucket,
    pub lunch: Bucket,
    pub dinner: Bucket,
}

impl MealBuckets {
    pub fn bucket(&self, meal: Meal) -> &Bucket {
        match meal {
            Meal::Breakfast => &self.breakfast,
            Meal::Lunch => &self.lunch,
            Meal::Dinner => &self.dinner,
        }
    }

    pub fn bucket_mut(&mut self, meal: Meal) -> &mut Bucket {
        match meal {
            Meal::Breakfast => &mut self.breakfast,
            Meal::Lunch => &mut self.lunch,
            Meal::Dinner => &mut self.dinner,
        }
    }

    pub(crate) fn seal(&mut self) {
        for meal in Meal::ALL {
            let b = self.bucket_mut(meal);
            b.count = b.users.len();
        }
    }
}

/// Daily report for one centre.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportResult {
    pub date: NaiveDate,
    pub attendance_present: MealBuckets,
    pub attendance_packed: MealBuckets,
    pub diet_counts_present: BTreeMap<String, MealBuckets>,
    pub diet_counts_packed: BTreeMap<String, MealBuckets>,
}

impl ReportResult {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            attendance_present: MealBuckets::default(),
            attendance_packed: MealBuckets::default(),
            diet_counts_present: BTreeMap::new(),
            diet_counts_packed: BTreeMap::new(),
        }
    }
}

/// One user's contribution to a day: who, which diet, what they marked.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDayRow {
    pub username: String,
    pub diet: Option<String>,
    pub date: Option<NaiveDate>,
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
}

impl UserDayRow {
    pub fn day_status(&self) -> DayStatus {
        DayStatus::from_columns(
            self.breakfast.as_deref(),
            self.lunch.as_deref(),
            self.dinner.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct MealCounts {
    pub breakfast: usize,
    pub lunch: usize,
    pub dinner: usize,
}

impl From<&MealBuckets> for MealCounts {
    fn from(b: &MealBuckets) -> Self {
        Self {
            breakfast: b.breakfast.count,
            lunch: b.lunch.count,
            dinner: b.dinner.count,
        }
    }
}

/// Per-date totals for the summary view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub present: MealCounts,
    pub packed: MealCounts,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}
