use crate::metrics::ServerMetrics;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Configuration for retry logic with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Amount of jitter to add (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    #[allow(dead_code)]
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }

    pub fn storage() -> Self {
        Self {
            max_attempts: 7,
            initial_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(1000),
            backoff_multiplier: 1.8,
            jitter_factor: 0.15,
        }
    }
}

/// Error types that can be retried
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum RetryableError {
    /// Constraint violation (race condition)
    ConstraintViolation(String),
    /// Connection error
    ConnectionError(String),
    /// Room code collision on creation (extremely rare with a random code space)
    RoomCodeCollision,
    /// Temporary resource unavailable
    ResourceUnavailable(String),
    /// Generic retryable error
    Generic(String),
}

impl std::fmt::Display for RetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConstraintViolation(msg) => write!(f, "Constraint violation: {msg}"),
            Self::ConnectionError(msg) => write!(f, "Connection error: {msg}"),
            Self::RoomCodeCollision => write!(f, "Room code collision"),
            Self::ResourceUnavailable(msg) => write!(f, "Resource unavailable: {msg}"),
            Self::Generic(msg) => write!(f, "Generic error: {msg}"),
        }
    }
}

impl std::error::Error for RetryableError {}

/// Retry executor with exponential backoff and jitter
pub struct RetryExecutor {
    config: RetryConfig,
    metrics: Option<Arc<ServerMetrics>>,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(config: RetryConfig, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            config,
            metrics: Some(metrics),
        }
    }

    /// Execute an operation with retry logic
    pub async fn execute<T, F, Fut, E>(&self, operation_name: &str, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: From<RetryableError> + std::fmt::Debug,
    {
        let mut attempt = 1;
        let mut delay = self.config.initial_delay;

        loop {
            if let Some(metrics) = &self.metrics {
                metrics.increment_retry_attempts();
            }

            debug!(
                operation = operation_name,
                attempt = attempt,
                max_attempts = self.config.max_attempts,
                "Executing operation attempt"
            );

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(
                            operation = operation_name,
                            attempt = attempt,
                            "Operation succeeded after retry"
                        );
                        if let Some(metrics) = &self.metrics {
                            metrics.increment_retry_successes();
                        }
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if attempt >= self.config.max_attempts {
                        error!(
                            operation = operation_name,
                            attempt = attempt,
                            error = ?error,
                            "Operation failed after all retry attempts"
                        );
                        return Err(error);
                    }

                    // Check if error is retryable
                    if !Self::is_retryable_error(&error) {
                        debug!(
                            operation = operation_name,
                            error = ?error,
                            "Error is not retryable, failing immediately"
                        );
                        return Err(error);
                    }

                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        max_attempts = self.config.max_attempts,
                        error = ?error,
                        delay_ms = delay.as_millis(),
                        "Operation failed, retrying after delay"
                    );

                    sleep(delay).await;

                    // Calculate next delay with exponential backoff and jitter
                    let next_delay = Duration::from_millis(
                        (delay.as_millis() as f64 * self.config.backoff_multiplier) as u64,
                    );

                    delay = std::cmp::min(next_delay, self.config.max_delay);

                    // Add jitter
                    if self.config.jitter_factor > 0.0 {
                        let jitter = (delay.as_millis() as f64 * self.config.jitter_factor) as u64;
                        let jitter_amount = rand::rng().random_range(0..=jitter);
                        delay = Duration::from_millis(delay.as_millis() as u64 + jitter_amount);
                    }

                    attempt += 1;
                }
            }
        }
    }

    /// Execute operation with custom retry condition
    #[allow(dead_code)]
    pub async fn execute_with_condition<T, F, Fut, E, R>(
        &self,
        operation_name: &str,
        operation: F,
        retry_condition: R,
    ) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Debug,
    {
        let mut attempt = 1;
        let mut delay = self.config.initial_delay;

        loop {
            if let Some(metrics) = &self.metrics {
                metrics.increment_retry_attempts();
            }

            debug!(
                operation = operation_name,
                attempt = attempt,
                max_attempts = self.config.max_attempts,
                "Executing operation attempt with custom condition"
            );

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(
                            operation = operation_name,
                            attempt = attempt,
                            "Operation succeeded after retry"
                        );
                        if let Some(metrics) = &self.metrics {
                            metrics.increment_retry_successes();
                        }
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if attempt >= self.config.max_attempts {
                        error!(
                            operation = operation_name,
                            attempt = attempt,
                            error = ?error,
                            "Operation failed after all retry attempts"
                        );
                        return Err(error);
                    }

                    // Check custom retry condition
                    if !retry_condition(&error) {
                        debug!(
                            operation = operation_name,
                            error = ?error,
                            "Custom retry condition failed, not retrying"
                        );
                        return Err(error);
                    }

                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        max_attempts = self.config.max_attempts,
                        error = ?error,
                        delay_ms = delay.as_millis(),
                        "Operation failed, retrying after delay (custom condition)"
                    );

                    sleep(delay).await;

                    // Calculate next delay
                    let next_delay = Duration::from_millis(
                        (delay.as_millis() as f64 * self.config.backoff_multiplier) as u64,
                    );
                    delay = std::cmp::min(next_delay, self.config.max_delay);

                    // Add jitter
                    if self.config.jitter_factor > 0.0 {
                        let jitter = (delay.as_millis() as f64 * self.config.jitter_factor) as u64;
                        let jitter_amount = rand::rng().random_range(0..=jitter);
                        delay = Duration::from_millis(delay.as_millis() as u64 + jitter_amount);
                    }

                    attempt += 1;
                }
            }
        }
    }

    fn is_retryable_error<E>(error: &E) -> bool
    where
        E: std::fmt::Debug,
    {
        // Check if the error message contains known retryable patterns
        let error_str = format!("{error:?}").to_lowercase();

        // Storage-related retryable errors
        if error_str.contains("unique_violation")
            || error_str.contains("foreign_key_violation")
            || error_str.contains("connection")
            || error_str.contains("timeout")
            || error_str.contains("capacity")
            || error_str.contains("collision")
            || error_str.contains("conflict")
            || error_str.contains("deadlock")
            || error_str.contains("serialization_failure")
            || error_str.contains("could not serialize")
            || error_str.contains("room at capacity")
        {
            return true;
        }

        // Network-related retryable errors
        if error_str.contains("io error")
            || error_str.contains("broken pipe")
            || error_str.contains("connection reset")
            || error_str.contains("connection refused")
        {
            return true;
        }

        false
    }
}

/// Convenience functions for common retry scenarios
pub async fn retry_storage_operation<T, F, Fut>(
    operation_name: &str,
    operation: F,
    metrics: Option<Arc<ServerMetrics>>,
) -> Result<T, anyhow::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let executor = if let Some(metrics) = metrics {
        RetryExecutor::with_metrics(RetryConfig::storage(), metrics)
    } else {
        RetryExecutor::new(RetryConfig::storage())
    };

    executor.execute(operation_name, operation).await
}

/// Utility to determine if an error is a temporary connection issue
#[allow(dead_code)]
pub fn is_temporary_connection_error(error: &anyhow::Error) -> bool {
    let error_str = format!("{error}").to_lowercase();

    error_str.contains("connection")
        || error_str.contains("timeout")
        || error_str.contains("io error")
        || error_str.contains("broken pipe")
        || error_str.contains("connection reset")
}
