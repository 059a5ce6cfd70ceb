use serde::Deserialize;
use utoipa::IntoParams;

const DEFAULT_PAGE_SIZE: usize = 20;

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    /// Number of newest entries to skip
    #[serde(default)]
    pub(crate) offset: usize,
    /// Page size, capped at the configured maximum
    #[serde(default = "default_limit")]
    pub(crate) limit: usize,
}

impl IndexParams {
    pub(crate) fn capped_limit(&self, max: usize) -> usize {
        self.limit.min(max)
    }
}

/// Query parameters of the feed counter WebSocket upgrade request.
#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct ConnectParams {
    pub(crate) user_id: i64,
    /// Id of the newest feed entry this user has already seen
    #[serde(default)]
    pub(crate) last_feed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_index_params_defaults() {
        let params: IndexParams = serde_json::from_value(json!({})).unwrap();

        assert_eq!(params.offset, 0);
        assert_eq!(params.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(params.capped_limit(5), 5);
    }

    #[test]
    fn test_connect_params_last_feed_defaults_to_zero() {
        let params: ConnectParams = serde_json::from_value(json!({"user_id": 7})).unwrap();

        assert_eq!(params.user_id, 7);
        assert_eq!(params.last_feed, 0);
    }
}
