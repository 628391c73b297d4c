//! Anonymous HTTP probe for S3-style buckets
//!
//! Issues one unsigned `GET` per configured endpoint template. A `200` means
//! the bucket lists publicly. Any other response is a completed, negative
//! probe, except `5xx`, which is retried and recorded as rejected once the
//! retries run out. Transport failures are retried with backoff and then
//! reported as rejected or timed out.

use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::{ConnectionState, Probe, ProbeError, ProbeOutcome, ProbeResult};
use crate::config::{ProbeConfig, BUCKET_PLACEHOLDER};

/// Response header S3 uses to report a bucket's home region
const REGION_HEADER: &str = "x-amz-bucket-region";

/// HTTP-based bucket probe
#[derive(Debug)]
pub struct HttpProbe {
    client: reqwest::Client,
    config: ProbeConfig,
    /// Consecutive candidates for which no attempt completed
    unreachable_streak: AtomicU32,
}

/// What a single request produced
enum Attempt {
    Response {
        status: u16,
        region: Option<String>,
        body: Option<String>,
    },
    Failed {
        state: ConnectionState,
        error: String,
        retryable: bool,
    },
}

impl HttpProbe {
    /// Create a probe from configuration
    ///
    /// Fails if the configuration is unusable or the HTTP client cannot be built.
    pub fn new(config: ProbeConfig) -> ProbeResult<Self> {
        validate(&config)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            unreachable_streak: AtomicU32::new(0),
        })
    }

    /// Delay before retry number `retry` (1-based), with up to 25% jitter
    fn retry_delay(&self, retry: u32) -> Duration {
        let base = self.config.retry_delay_ms;
        let millis = if self.config.exponential_backoff {
            base.saturating_mul(2_u64.saturating_pow(retry.saturating_sub(1)))
        } else {
            base
        };

        let jitter = if millis >= 4 {
            rand::rng().random_range(0..=millis / 4)
        } else {
            0
        };
        Duration::from_millis(millis.saturating_add(jitter))
    }

    async fn send_once(&self, url: &str) -> Attempt {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let region = response
                    .headers()
                    .get(REGION_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                // Only a public listing's body is kept
                let body = if status == 200 {
                    self.read_listing(response).await
                } else {
                    None
                };
                Attempt::Response {
                    status,
                    region,
                    body,
                }
            }
            Err(e) => Attempt::Failed {
                state: if e.is_timeout() {
                    ConnectionState::TimedOut
                } else {
                    ConnectionState::Rejected
                },
                error: e.to_string(),
                retryable: !e.is_builder(),
            },
        }
    }

    /// Read at most `max_listing_bytes` of a response body
    async fn read_listing(&self, mut response: reqwest::Response) -> Option<String> {
        let limit = self.config.max_listing_bytes;
        let mut body = Vec::new();

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = limit - body.len();
                    if chunk.len() > room {
                        body.extend_from_slice(&chunk[..room]);
                        tracing::debug!(limit, "Listing truncated");
                        break;
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to read listing body");
                    return None;
                }
            }
        }

        Some(String::from_utf8_lossy(&body).into_owned())
    }

    async fn probe_endpoint(&self, bucket: &str, template: &str) -> ProbeOutcome {
        let url = render_endpoint(template, bucket);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let result = self.send_once(&url).await;

            let may_retry = attempt <= self.config.retry_attempts;
            let should_retry = match &result {
                Attempt::Response { status, .. } => is_server_error(*status) && may_retry,
                Attempt::Failed { retryable, .. } => *retryable && may_retry,
            };
            if should_retry {
                let delay = self.retry_delay(attempt);
                tracing::debug!(url = %url, attempt, ?delay, "Transient probe failure, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            let outcome = match result {
                Attempt::Response {
                    status,
                    region,
                    body,
                } => {
                    let mut outcome = if status == 200 {
                        let mut open = ProbeOutcome::open(bucket);
                        open.raw_response = body;
                        open
                    } else if is_server_error(status) {
                        ProbeOutcome::unreachable(bucket, ConnectionState::Rejected)
                    } else {
                        ProbeOutcome::closed(bucket)
                    };
                    outcome = outcome.with_detail("http_status", status);
                    if let Some(region) = region {
                        outcome = outcome.with_detail("region", region);
                    }
                    outcome
                }
                Attempt::Failed { state, error, .. } => {
                    ProbeOutcome::unreachable(bucket, state).with_detail("error", error)
                }
            };

            return outcome
                .with_detail("endpoint", template)
                .with_detail("url", url.as_str())
                .with_detail("attempts", attempt);
        }
    }

    /// Track candidates where nothing got through
    fn observe(&self, outcomes: &[ProbeOutcome]) {
        if outcomes.is_empty() {
            return;
        }

        if outcomes.iter().any(|o| o.connection_state.is_fulfilled()) {
            self.unreachable_streak.store(0, Ordering::Relaxed);
        } else {
            self.unreachable_streak.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Refuse further attempts once the streak reaches the threshold
    ///
    /// Checked before a candidate rather than after, so the outcomes of the
    /// candidate that completed the streak are still handed back and recorded.
    fn ensure_network_up(&self) -> ProbeResult<()> {
        let threshold = self.config.unreachable_threshold;
        let streak = self.unreachable_streak.load(Ordering::Relaxed);
        if threshold > 0 && streak >= threshold {
            return Err(ProbeError::Engine(format!(
                "{} consecutive candidates unreachable on every endpoint; network appears down",
                streak
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, candidate: &str) -> ProbeResult<Vec<ProbeOutcome>> {
        let bucket = candidate.to_ascii_lowercase();
        if self.config.skip_invalid_names && !is_valid_bucket_name(&bucket) {
            tracing::trace!(candidate, "Not a valid bucket name, no attempt made");
            return Ok(Vec::new());
        }
        self.ensure_network_up()?;

        let mut outcomes = Vec::with_capacity(self.config.endpoints.len());
        for template in &self.config.endpoints {
            outcomes.push(self.probe_endpoint(&bucket, template).await);
        }

        self.observe(&outcomes);
        Ok(outcomes)
    }
}

fn is_server_error(status: u16) -> bool {
    (500..600).contains(&status)
}

/// Substitute the bucket name into an endpoint template
pub fn render_endpoint(template: &str, bucket: &str) -> String {
    template.replace(BUCKET_PLACEHOLDER, bucket)
}

fn validate(config: &ProbeConfig) -> ProbeResult<()> {
    if config.endpoints.is_empty() {
        return Err(ProbeError::InvalidConfig(
            "at least one endpoint template is required".to_string(),
        ));
    }

    for endpoint in &config.endpoints {
        if !endpoint.contains(BUCKET_PLACEHOLDER) {
            return Err(ProbeError::InvalidConfig(format!(
                "endpoint '{}' has no {} placeholder",
                endpoint, BUCKET_PLACEHOLDER
            )));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ProbeError::InvalidConfig(format!(
                "endpoint '{}' must use http:// or https://",
                endpoint
            )));
        }
    }

    if config.timeout_secs == 0 {
        return Err(ProbeError::InvalidConfig(
            "timeout_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Validate S3 bucket name according to AWS rules
pub fn is_valid_bucket_name(name: &str) -> bool {
    // Length check: 3-63 characters
    if !(3..=63).contains(&name.len()) {
        return false;
    }

    // Must start and end with lowercase letter or number
    let (Some(first), Some(last)) = (name.chars().next(), name.chars().last()) else {
        return false;
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }
    if !last.is_ascii_lowercase() && !last.is_ascii_digit() {
        return false;
    }

    // Only lowercase letters, numbers, hyphens, and periods
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return false;
    }

    if name.contains("..") {
        return false;
    }

    // Cannot be formatted as IP address
    if name.split('.').count() == 4 && name.split('.').all(|s| s.parse::<u8>().is_ok()) {
        return false;
    }

    // Reserved prefix and suffix
    if name.starts_with("xn--") || name.ends_with("-s3alias") {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bucket_names() {
        assert!(is_valid_bucket_name("my-bucket"));
        assert!(is_valid_bucket_name("my.bucket"));
        assert!(is_valid_bucket_name("my-bucket-123"));
        assert!(is_valid_bucket_name("abc"));
        assert!(is_valid_bucket_name("a".repeat(63).as_str()));
    }

    #[test]
    fn test_invalid_bucket_names() {
        assert!(!is_valid_bucket_name(""));
        assert!(!is_valid_bucket_name("ab"));
        assert!(!is_valid_bucket_name(&"a".repeat(64)));
        assert!(!is_valid_bucket_name("My-Bucket"));
        assert!(!is_valid_bucket_name("my_bucket"));
        assert!(!is_valid_bucket_name("my..bucket"));
        assert!(!is_valid_bucket_name("192.168.1.1"));
        assert!(!is_valid_bucket_name("xn--bucket"));
        assert!(!is_valid_bucket_name("bucket-s3alias"));
        assert!(!is_valid_bucket_name("-bucket"));
        assert!(!is_valid_bucket_name("bucket-"));
    }

    #[test]
    fn test_render_endpoint() {
        assert_eq!(
            render_endpoint("https://{bucket}.s3.amazonaws.com/", "mybucket"),
            "https://mybucket.s3.amazonaws.com/"
        );
        assert_eq!(
            render_endpoint("http://127.0.0.1:9000/{bucket}", "mybucket"),
            "http://127.0.0.1:9000/mybucket"
        );
    }

    #[test]
    fn test_endpoint_without_placeholder_rejected() {
        let config = ProbeConfig {
            endpoints: vec!["https://s3.amazonaws.com/".to_string()],
            ..Default::default()
        };
        let err = HttpProbe::new(config).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_endpoints_rejected() {
        let config = ProbeConfig {
            endpoints: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            HttpProbe::new(config),
            Err(ProbeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let config = ProbeConfig {
            endpoints: vec!["ftp://{bucket}.example.com".to_string()],
            ..Default::default()
        };
        assert!(HttpProbe::new(config).is_err());
    }

    #[test]
    fn test_retry_delay_growth() {
        let probe = HttpProbe::new(ProbeConfig {
            retry_delay_ms: 100,
            exponential_backoff: true,
            ..Default::default()
        })
        .unwrap();

        let first = probe.retry_delay(1);
        let third = probe.retry_delay(3);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(500));
    }

    #[test]
    fn test_fixed_retry_delay() {
        let probe = HttpProbe::new(ProbeConfig {
            retry_delay_ms: 2,
            exponential_backoff: false,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(probe.retry_delay(5), Duration::from_millis(2));
    }

    #[test]
    fn test_unreachable_streak_trips() {
        let probe = HttpProbe::new(ProbeConfig {
            unreachable_threshold: 2,
            ..Default::default()
        })
        .unwrap();

        let down = vec![ProbeOutcome::unreachable("a1b", ConnectionState::Rejected)];
        let up = vec![ProbeOutcome::closed("a1b")];

        probe.observe(&down);
        probe.observe(&up);
        probe.observe(&down);
        probe.observe(&[]);
        assert!(probe.ensure_network_up().is_ok());

        probe.observe(&down);
        assert!(matches!(
            probe.ensure_network_up(),
            Err(ProbeError::Engine(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_name_makes_no_attempt() {
        let probe = HttpProbe::new(ProbeConfig::default()).unwrap();
        let outcomes = probe.probe("not a bucket!").await.unwrap();
        assert!(outcomes.is_empty());
    }
}
