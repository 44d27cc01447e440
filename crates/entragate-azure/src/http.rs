use std::time::Duration;

use tracing::debug;

/// Bound on every outbound call. The remote side is left in an indeterminate
/// state on timeout; callers treat timeout and non-2xx uniformly as failed.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const RETRY_DELAY: Duration = Duration::from_secs(1);

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("HTTP client initialization")
}

/// Send a request, retrying once on a transient failure (connect error,
/// timeout, or 5xx response). Anything else is returned as-is.
pub(crate) async fn send_with_retry(
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, reqwest::Error> {
    let retry = request.try_clone();
    let first = request.send().await;

    let retryable = match &first {
        Ok(resp) => resp.status().is_server_error(),
        Err(e) => e.is_timeout() || e.is_connect(),
    };
    let (true, Some(retry)) = (retryable, retry) else {
        return first;
    };

    debug!("transient failure, retrying once");
    tokio::time::sleep(RETRY_DELAY).await;
    retry.send().await
}
