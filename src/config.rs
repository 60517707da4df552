use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    /// Relay that receives browser push subscriptions (optional).
    pub push_service_url: Option<String>,
    /// Public key handed to browsers for push subscription.
    pub push_public_key: Option<String>,
    /// How many recent top-level messages admins see.
    pub chat_history_limit: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.into());
        let optional = |key: &str| get(key).filter(|s| !s.is_empty());

        Ok(Self {
            database_url: get("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("Missing required env var: DATABASE_URL"))?,
            redis_url: or("REDIS_URL", "redis://127.0.0.1:6379"),
            host: or("HOST", "0.0.0.0"),
            port: or("PORT", "8080").parse()?,
            app_base_url: or("APP_BASE_URL", "http://localhost"),
            push_service_url: optional("PUSH_SERVICE_URL"),
            push_public_key: optional("PUSH_PUBLIC_KEY"),
            chat_history_limit: or("CHAT_HISTORY_LIMIT", "50").parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.chat_history_limit, 50);
        assert_eq!(cfg.redis_url, "redis://127.0.0.1:6379");
        assert!(cfg.push_service_url.is_none());
    }

    #[test]
    fn database_url_is_required() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn empty_push_url_counts_as_unset() {
        let cfg = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("PUSH_SERVICE_URL", ""),
            ("CHAT_HISTORY_LIMIT", "20"),
        ]))
        .unwrap();
        assert!(cfg.push_service_url.is_none());
        assert_eq!(cfg.chat_history_limit, 20);
    }
}
