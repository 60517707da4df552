pub mod attendance;
pub mod birthday;
pub mod centre;
pub mod chat;
pub mod report;
pub mod user;
