//! Response types for the Tibia API.

use serde::Serialize;

use crate::scraper::scalars::format_timestamp;

/// Version of the response format
pub const API_VERSION: u8 = 1;

/// Every successful response: the record plus request information
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    pub information: Information,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            information: Information::new(Status::ok()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Information {
    pub api: ApiInfo,
    /// When the response was generated, RFC 3339 UTC
    pub timestamp: String,
    pub status: Status,
}

impl Information {
    pub fn new(status: Status) -> Self {
        Self {
            api: ApiInfo {
                version: API_VERSION,
                release: env!("CARGO_PKG_VERSION").to_string(),
            },
            timestamp: format_timestamp(&chrono::Utc::now()),
            status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub version: u8,
    pub release: String,
}

#[derive(Debug, Serialize)]
pub struct Status {
    pub http_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            http_code: 200,
            error: None,
            message: None,
        }
    }
}

/// Error response: the information block only
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub information: Information,
}

impl ErrorResponse {
    pub fn new(http_code: u16, error: &str, message: String) -> Self {
        Self {
            information: Information::new(Status {
                http_code,
                error: Some(error.to_string()),
                message: Some(message),
            }),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// "available" or "unavailable"
    pub reference_data: String,
    pub houses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(Envelope::new(vec!["Antica"])).unwrap();
        assert_eq!(json["data"][0], "Antica");
        assert_eq!(json["information"]["api"]["version"], 1);
        assert_eq!(json["information"]["status"]["http_code"], 200);
        assert!(json["information"]["status"].get("error").is_none());
        assert!(json["information"]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_error_shape() {
        let json = serde_json::to_value(ErrorResponse::new(404, "not_found", "character Foo not found".into())).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["information"]["status"]["http_code"], 404);
        assert_eq!(json["information"]["status"]["error"], "not_found");
        assert_eq!(json["information"]["status"]["message"], "character Foo not found");
    }
}
