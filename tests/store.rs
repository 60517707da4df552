//! Store behaviour that lives in SQL: upserts, centre guards and cascades.
//! Each test gets a fresh database from `DATABASE_URL` with migrations applied.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;

use mealtrack_api::{
    models::{
        attendance::{DayStatus, Meal, MealStatus},
        user::UserRole,
    },
    services::{
        attendance::{current_week, AttendanceService},
        centres::{CentreService, NewUser, UserPatch},
        chat::ChatService,
    },
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

async fn add_centre(pool: &PgPool, id: &str) -> Result<()> {
    sqlx::query("INSERT INTO centres (id, name, code) VALUES ($1, $1, '1234')")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

fn staff(username: &str, diet: Option<&str>) -> NewUser {
    NewUser {
        username: username.into(),
        name: username.into(),
        role: UserRole::Staff,
        diet: diet.map(str::to_string),
        birthday: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn second_sign_in_patches_profile_but_keeps_attendance(pool: PgPool) -> Result<()> {
    add_centre(&pool, "north").await?;
    let first_week = current_week(d(2024, 7, 10));

    let (_, created) =
        AttendanceService::create_if_absent(&pool, "ana", &first_week, Some("veg"), "north", Some("Ana"))
            .await?;
    assert!(created);

    AttendanceService::set_meal_status(&pool, "ana", d(2024, 7, 10), Meal::Lunch, Some(MealStatus::Packed))
        .await?;

    let (user, created) = AttendanceService::create_if_absent(
        &pool,
        "ana",
        &current_week(d(2024, 7, 17)),
        Some("halal"),
        "north",
        Some("Ana Lopez"),
    )
    .await?;
    assert!(!created);
    assert_eq!(user.diet.as_deref(), Some("halal"));
    assert_eq!(user.name, "Ana Lopez");

    let record = AttendanceService::read(&pool, "ana").await?.unwrap();
    assert_eq!(record.meal_attendance.len(), 7);
    assert_eq!(record.meal_attendance[&d(2024, 7, 10)].lunch, Some(MealStatus::Packed));
    assert!(!record.meal_attendance.contains_key(&d(2024, 7, 17)));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_message_removes_its_replies(pool: PgPool) -> Result<()> {
    add_centre(&pool, "north").await?;

    let kept = ChatService::send(&pool, "north", "ana", "Ana", "Lunch is late today").await?;
    let gone = ChatService::send(&pool, "north", "ben", "Ben", "Who has the van keys?").await?;
    ChatService::reply(&pool, gone.id, "ana", "Ana", "Office drawer").await?;
    ChatService::reply(&pool, gone.id, "ben", "Ben", "Thanks").await?;

    assert!(ChatService::delete(&pool, "north", gone.id).await?);
    assert!(!ChatService::delete(&pool, "north", gone.id).await?);

    let messages = ChatService::list(&pool, "north", "admin", true, 50).await?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, kept.id);

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_replies WHERE chat_id = $1")
        .bind(gone.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(orphans, 0);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn import_leaves_other_centres_users_alone(pool: PgPool) -> Result<()> {
    add_centre(&pool, "north").await?;
    add_centre(&pool, "south").await?;
    let week = current_week(d(2024, 7, 10));

    CentreService::import_users(&pool, "south", &[staff("bob", Some("veg"))], &week).await?;

    let mut intruder = staff("bob", None);
    intruder.role = UserRole::Admin;
    let outcome =
        CentreService::import_users(&pool, "north", &[intruder, staff("cara", None)], &week).await?;
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped, vec!["bob".to_string()]);

    let bob = AttendanceService::find_user(&pool, "bob").await?.unwrap();
    assert_eq!(bob.centre_id, "south");
    assert_eq!(bob.role(), UserRole::Staff);
    assert_eq!(bob.diet.as_deref(), Some("veg"));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn import_gives_new_users_a_week_and_keeps_existing_attendance(pool: PgPool) -> Result<()> {
    add_centre(&pool, "north").await?;
    let week = current_week(d(2024, 7, 10));

    CentreService::import_users(&pool, "north", &[staff("dan", None)], &week).await?;
    let record = AttendanceService::read(&pool, "dan").await?.unwrap();
    assert_eq!(record.meal_attendance.len(), 7);
    assert!(record.meal_attendance.values().all(|day| *day == DayStatus::default()));

    AttendanceService::set_meal_status(&pool, "dan", d(2024, 7, 11), Meal::Dinner, Some(MealStatus::Present))
        .await?;
    let outcome = CentreService::import_users(
        &pool,
        "north",
        &[staff("dan", Some("gf"))],
        &current_week(d(2024, 7, 17)),
    )
    .await?;
    assert_eq!(outcome.imported, 1);

    let record = AttendanceService::read(&pool, "dan").await?.unwrap();
    assert_eq!(record.diet.as_deref(), Some("gf"));
    assert_eq!(record.meal_attendance.len(), 7);
    assert_eq!(record.meal_attendance[&d(2024, 7, 11)].dinner, Some(MealStatus::Present));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn update_can_clear_diet_and_birthday(pool: PgPool) -> Result<()> {
    add_centre(&pool, "north").await?;
    let mut eve = staff("eve", Some("veg"));
    eve.birthday = Some(d(1991, 3, 4));
    CentreService::import_users(&pool, "north", &[eve], &[]).await?;

    let renamed = CentreService::update_user(
        &pool,
        "north",
        "eve",
        &UserPatch {
            name: Some("Eve Martin".into()),
            ..Default::default()
        },
    )
    .await?
    .unwrap();
    assert_eq!(renamed.name, "Eve Martin");
    assert_eq!(renamed.diet.as_deref(), Some("veg"));
    assert_eq!(renamed.birthday, Some(d(1991, 3, 4)));

    let cleared = CentreService::update_user(
        &pool,
        "north",
        "eve",
        &UserPatch {
            diet: Some(None),
            birthday: Some(None),
            ..Default::default()
        },
    )
    .await?
    .unwrap();
    assert_eq!(cleared.name, "Eve Martin");
    assert_eq!(cleared.diet, None);
    assert_eq!(cleared.birthday, None);

    let elsewhere = CentreService::update_user(&pool, "south", "eve", &UserPatch::default()).await?;
    assert!(elsewhere.is_none());
    Ok(())
}
