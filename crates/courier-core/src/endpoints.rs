//! Typed wrappers for the backend endpoints.

use crate::error::Result;
use crate::orchestrator::HttpOrchestrator;
use crate::request::ApiRequest;
use serde_json::Value;

pub const WEATHER_PATH: &str = "/api/weather";

/// Build the weather lookup request; `params` go into the query string.
pub fn weather_request<K, V>(params: impl IntoIterator<Item = (K, V)>) -> ApiRequest
where
    K: Into<String>,
    V: Into<String>,
{
    ApiRequest::get(WEATHER_PATH).query_pairs(params)
}

/// `GET /api/weather` with the given query parameters.
pub async fn get_weather<K, V>(
    orchestrator: &HttpOrchestrator,
    params: impl IntoIterator<Item = (K, V)>,
) -> Result<Value>
where
    K: Into<String>,
    V: Into<String>,
{
    orchestrator.send(weather_request(params)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn test_weather_request_shape() {
        let request = weather_request([("city", "Hangzhou")]);
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.url(), "/api/weather");
        assert_eq!(
            request.query_params().get("city").map(String::as_str),
            Some("Hangzhou")
        );
        assert!(request.body().is_none());
    }
}
