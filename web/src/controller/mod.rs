use serde::Serialize;
pub(crate) mod feed_controller;
pub(crate) mod health_check_controller;

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T) -> Self {
        Self {
            status_code,
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_serialize_api_response_with_data() {
        let response = ApiResponse::new(StatusCode::CREATED.into(), vec![1, 2]);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value, json!({"data": [1, 2], "status_code": 201}));
    }

    #[test]
    fn test_serialize_api_response_without_data() {
        let response: ApiResponse<()> = ApiResponse {
            status_code: StatusCode::NO_CONTENT.into(),
            data: None,
        };
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value, json!({"status_code": 204}));
    }
}
