pub mod attendance;
pub mod birthdays;
pub mod centres;
pub mod chat;
pub mod diets;
pub mod metrics;
pub mod notifications;
pub mod reports;
