//! Demo centre seed script
//!
//! Seeds a centre with diets, an admin, a few staff members and the current
//! week of attendance so reports have something to show.
//!
//! Usage:
//!   DATABASE_URL=... ./seed-demo [--centre demo] [--code 1234]

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::env;

use mealtrack_api::{
    db,
    models::{
        attendance::{Meal, MealStatus},
        user::UserRole,
    },
    services::{
        attendance::{current_week, AttendanceService},
        centres::{CentreService, NewUser},
    },
};

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed a demo centre for the meal attendance API")]
struct Args {
    /// Centre id to create or reset
    #[arg(long, default_value = "demo")]
    centre: String,

    /// Plaintext access code for the centre
    #[arg(long, default_value = "1234")]
    code: String,
}

const DIETS: &[(&str, &str, &str)] = &[
    ("veg", "Vegetarian", "No meat or fish"),
    ("halal", "Halal", "Halal meat only"),
    ("gf", "Gluten free", "No wheat, barley or rye"),
];

const PEOPLE: &[(&str, &str, UserRole, Option<&str>, Option<(i32, u32, u32)>)] = &[
    ("admin", "Claire Martin", UserRole::Admin, None, Some((1982, 4, 12))),
    ("lucas", "Lucas Bernard", UserRole::Staff, Some("veg"), Some((1995, 7, 10))),
    ("emma", "Emma", UserRole::Staff, None, Some((1990, 1, 23))),
    ("noah", "Noah Petit Durand", UserRole::Staff, Some("halal"), None),
    ("lea", "Léa Moreau", UserRole::Staff, Some("gf"), Some((1988, 11, 2))),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL required")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool).await?;

    tracing::info!("Seeding centre {}", args.centre);

    sqlx::query(
        "INSERT INTO centres (id, name, code) VALUES ($1, $2, $3)
         ON CONFLICT (id) DO UPDATE SET code = EXCLUDED.code",
    )
    .bind(&args.centre)
    .bind(format!("Centre {}", args.centre))
    .bind(&args.code)
    .execute(&pool)
    .await?;

    for (id, name, description) in DIETS {
        sqlx::query(
            "INSERT INTO diets (id, name, description) VALUES ($1, $2, $3)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .execute(&pool)
        .await?;
    }

    let week = current_week(Utc::now().date_naive());
    let roster: Vec<NewUser> = PEOPLE
        .iter()
        .map(|(username, name, role, diet, birthday)| NewUser {
            username: username.to_string(),
            name: name.to_string(),
            role: *role,
            diet: diet.map(str::to_string),
            birthday: birthday.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        })
        .collect();
    let outcome = CentreService::import_users(&pool, &args.centre, &roster, &week).await?;
    if !outcome.skipped.is_empty() {
        tracing::warn!("Users owned by another centre were left alone: {:?}", outcome.skipped);
    }

    // Deterministic pattern so every bucket gets someone.
    let cycle = [
        Some(MealStatus::Present),
        Some(MealStatus::Packed),
        Some(MealStatus::Absent),
        None,
    ];
    let seeded = roster
        .iter()
        .filter(|u| !outcome.skipped.contains(&u.username));
    for (i, user) in seeded.enumerate() {
        for (j, date) in week.iter().enumerate() {
            for (k, meal) in Meal::ALL.iter().enumerate() {
                let status = cycle[(i + j + k) % cycle.len()];
                AttendanceService::set_meal_status(&pool, &user.username, *date, *meal, status)
                    .await?;
            }
        }
    }

    tracing::info!(
        "Seeded {} users and {} days of attendance for {}",
        outcome.imported,
        week.len(),
        args.centre
    );
    Ok(())
}
