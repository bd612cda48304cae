use price_pipeline_core::contract::ErrorPayload;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

pub fn success_response(status_code: u16, payload: impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(&payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: json_headers(),
            body,
        },
        Err(error) => error_response(500, &format!("failed to serialize response: {error}")),
    }
}

pub fn error_response(status_code: u16, message: &str) -> ApiGatewayResponse {
    let payload = ErrorPayload {
        error: message.to_string(),
    };
    ApiGatewayResponse {
        status_code,
        headers: json_headers(),
        body: json!(payload).to_string(),
    }
}

fn json_headers() -> Value {
    json!({"Content-Type": "application/json"})
}

#[cfg(test)]
impl ApiGatewayResponse {
    pub(crate) fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_wraps_message() {
        let response = error_response(500, "boom");

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body_json().expect("json body"), json!({"error": "boom"}));
    }

    #[test]
    fn serializes_with_api_gateway_field_names() {
        let response = success_response(200, json!({"ok": true}));
        let encoded = serde_json::to_value(&response).expect("response serializes");

        assert_eq!(encoded["statusCode"], json!(200));
        assert_eq!(encoded["headers"]["Content-Type"], json!("application/json"));
        assert_eq!(encoded["body"], json!("{\"ok\":true}"));
    }
}
