//! HTTP submission collaborator.

use crate::error::Result;

/// Default APRS-IS HTTP submission endpoint.
pub const DEFAULT_HTTP_URL: &str = "http://srvr.aprs-is.net:8080";

/// Headers APRS-IS expects on HTTP submissions.
pub fn default_http_headers() -> Vec<(String, String)> {
    vec![
        (
            "Content-Type".to_string(),
            "application/octet-stream".to_string(),
        ),
        ("Accept-Type".to_string(), "text/plain".to_string()),
    ]
}

/// Posts a body and reports the response status code.
pub trait HttpPost: Send + Sync {
    fn post(&self, url: &str, body: &[u8], headers: &[(String, String)]) -> Result<u16>;
}

/// Blocking `reqwest` implementation of [`HttpPost`].
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct ReqwestPost {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl ReqwestPost {
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::AprsIsError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl HttpPost for ReqwestPost {
    fn post(&self, url: &str, body: &[u8], headers: &[(String, String)]) -> Result<u16> {
        let mut request = self.client.post(url).body(body.to_vec());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request
            .send()
            .map_err(|e| crate::AprsIsError::Http(format!("request failed: {e}")))?;
        Ok(response.status().as_u16())
    }
}
