use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::{config::Config, services::notifications::NotificationService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: redis::aio::MultiplexedConnection,
    pub redis_client: RedisClient,
    pub config: Arc<Config>,
    pub notifications: Arc<NotificationService>,
}
