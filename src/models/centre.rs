use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Centre {
    pub id: String,
    pub name: String,
    /// Plaintext access code compared at sign-in.
    #[serde(skip_serializing)]
    pub code: String,
    pub created_at: DateTime<Utc>,
}

/// Public entry for the sign-in centre picker.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CentreSummary {
    pub id: String,
    pub name: String,
}

/// Diet reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct DietRow {
    pub id: String,
    pub name: Option<String>,
    pub description: String,
}

impl From<DietRow> for DietInfo {
    fn from(r: DietRow) -> Self {
        Self {
            name: r.name.filter(|n| !n.is_empty()).unwrap_or_else(|| r.id.clone()),
            id: r.id,
            description: r.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PushSubscribeRequest {
    /// Browser PushSubscription JSON (`endpoint`, `keys`, ...).
    pub subscription: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diet_name_defaults_to_id() {
        let info: DietInfo = DietRow {
            id: "veg".into(),
            name: None,
            description: String::new(),
        }
        .into();
        assert_eq!(info.name, "veg");

        let info: DietInfo = DietRow {
            id: "gf".into(),
            name: Some("Gluten free".into()),
            description: "No wheat".into(),
        }
        .into();
        assert_eq!(info.name, "Gluten free");
    }

    #[test]
    fn centre_code_is_never_serialized() {
        let c = Centre {
            id: "c1".into(),
            name: "North".into(),
            code: "1234".into(),
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(c).unwrap();
        assert!(v.get("code").is_none());
    }
}
