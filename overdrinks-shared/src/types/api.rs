use serde::{Deserialize, Serialize};

/// Error body returned to clients. Validation failures carry a per-field
/// error list alongside the top-level message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Plain acknowledgement body, used where the contract returns `{message}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthResponse {
    pub fn healthy(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            service: service.into(),
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_omits_empty_error_list() {
        let body = ApiErrorResponse::new("E0003", "resource not found");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "E0003");
        assert_eq!(json["message"], "resource not found");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn validation_body_carries_field_errors() {
        let body = ApiErrorResponse::new("E0002", "invalid request")
            .with_errors(vec![FieldError::new("venueId", "venueId is required")]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["errors"][0]["path"], "venueId");
        assert_eq!(json["errors"][0]["message"], "venueId is required");
    }
}
