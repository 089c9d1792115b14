use serde::{Deserialize, Serialize};

/// Settings for a [`NexiaHome`](crate::NexiaHome), loadable from a host
/// application's config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Restrict merges to this house. When unset, the thermostats of every
    /// house in the document are merged, in document order.
    pub house_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_defaults() {
        let config: HomeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HomeConfig::default());
    }

    #[test]
    fn house_id_from_json() {
        let config: HomeConfig = serde_json::from_str(r#"{"house_id": 123456}"#).unwrap();
        assert_eq!(config.house_id, Some(123456));
    }
}
