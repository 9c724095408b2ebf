use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::redirect::Policy;
use reqwest::header::ACCEPT;
use std::time::Duration;

use super::{ ChatTransport, TransportError };
use crate::models::wire::{ ChatRequest, ChatResponse };

const CHAT_ROUTE: &str = "/api/chat";

pub struct HttpTransport {
    http: HttpClient,
    base_url: String,
}

impl HttpTransport {
    /// `timeout` of `None` leaves requests unbounded. Redirects are not
    /// followed; any 3xx is a failed request.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = HttpClient::builder().redirect(Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CHAT_ROUTE)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post_chat(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        let resp = self.http
            .post(self.endpoint())
            .header(ACCEPT, "application/json")
            .json(request)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_route() {
        let transport = HttpTransport::new("http://localhost:8000/", None).unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:8000/api/chat");
    }
}
