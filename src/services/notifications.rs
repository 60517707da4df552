use reqwest::Client;
use serde_json::{json, Value};
use sqlx::PgPool;

pub struct NotificationService {
    pub client: Client,
    pub push_service_url: Option<String>,
}

impl NotificationService {
    pub fn new(push_service_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            push_service_url,
        }
    }

    /// Store a browser push subscription and hand it to the push relay.
    pub async fn register_subscription(
        &self,
        pool: &PgPool,
        centre: &str,
        username: &str,
        subscription: &Value,
    ) -> anyhow::Result<()> {
        let endpoint = subscription_endpoint(subscription)
            .ok_or_else(|| anyhow::anyhow!("Subscription has no endpoint"))?;

        sqlx::query(
            "INSERT INTO push_subscriptions (username, centre_id, endpoint, subscription)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (username, endpoint) DO UPDATE SET
                 subscription = EXCLUDED.subscription,
                 centre_id = EXCLUDED.centre_id",
        )
        .bind(username)
        .bind(centre)
        .bind(endpoint)
        .bind(subscription)
        .execute(pool)
        .await?;

        if let Err(e) = self.relay(centre, username, subscription).await {
            tracing::warn!("push relay failed for {username}: {e}");
        }
        Ok(())
    }

    async fn relay(&self, centre: &str, username: &str, subscription: &Value) -> anyhow::Result<()> {
        let url = match &self.push_service_url {
            Some(u) => u,
            None => {
                tracing::debug!("Push relay not configured, skipping");
                return Ok(());
            }
        };

        let response = self
            .client
            .post(url)
            .json(&json!({
                "user_id": username,
                "centre": centre,
                "subscription": subscription,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("Push relay error {}: {}", status, text);
        }
        Ok(())
    }
}

fn subscription_endpoint(subscription: &Value) -> Option<&str> {
    subscription
        .get("endpoint")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
}
