//! PowerDNS HTTP request methods

use reqwest::{Method, RequestBuilder};
use serde::Serialize;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::log_sanitizer::truncate_for_log;

use super::PowerDnsProvider;
use super::types::ErrorResponse;

impl PowerDnsProvider {
    /// Map a non-2xx response onto `ProviderError`.
    fn handle_response_error(&self, status: u16, body: &str, ctx: ErrorContext) -> Result<()> {
        if (200..300).contains(&status) {
            return Ok(());
        }

        let message = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_else(|| format!("HTTP {status}: {}", truncate_for_log(body)));

        log::warn!("[powerdns] API error (HTTP {status}): {message}");
        Err(self.map_error(RawApiError::new(status, message), ctx))
    }

    /// Send a prepared request with auth and retries, returning the body of a 2xx.
    async fn dispatch(
        &self,
        method: &Method,
        url: &str,
        request: RequestBuilder,
        ctx: ErrorContext,
    ) -> Result<String> {
        let request = request.header("X-API-Key", &self.config.api_key);
        let (status, body) = HttpUtils::execute_request_with_retry(
            request,
            self.provider_name(),
            method.as_str(),
            url,
            self.config.max_retries,
        )
        .await?;

        self.handle_response_error(status, &body, ctx)?;
        Ok(body)
    }

    /// Request without a body (GET/DELETE).
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        ctx: ErrorContext,
    ) -> Result<String> {
        let request = self.client.request(method.clone(), url);
        self.dispatch(&method, url, request, ctx).await
    }

    /// Request with a JSON body (POST/PATCH).
    pub(crate) async fn request_with_body<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<String> {
        let payload =
            serde_json::to_string(body).map_err(|e| ProviderError::SerializationError {
                provider: self.provider_name().to_string(),
                detail: e.to_string(),
            })?;
        log::debug!("[powerdns] Request Body: {}", truncate_for_log(&payload));

        let request = self
            .client
            .request(method.clone(), url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        self.dispatch(&method, url, request, ctx).await
    }
}
