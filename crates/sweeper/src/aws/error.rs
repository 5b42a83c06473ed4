//! AWS error classification
//!
//! Typed errors for the registry, container service and Beanstalk APIs,
//! classified from the service error code rather than the Debug output.

use aws_sdk_ecr::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories used when reporting deletion failures
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource is already gone
    #[error("Resource not found: {message}")]
    NotFound { code: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Credentials lack the required permission
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Remote side rejected the request for this resource
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Error code as returned by AWS, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::NotFound { code, .. } | AwsError::Rejected { code, .. } => Some(code),
            AwsError::Sdk { code, .. } => code.as_deref(),
            AwsError::Throttled | AwsError::AccessDenied { .. } => None,
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            AwsError::AccessDenied { .. } => Some(
                "Grant the sweeper role the list, describe and delete permissions for this service.",
            ),
            AwsError::Throttled => {
                Some("AWS API rate limit hit. The next scheduled run will pick up the remainder.")
            }
            _ => None,
        }
    }
}

/// Codes meaning the resource no longer exists
const NOT_FOUND_CODES: &[&str] = &[
    "ImageNotFoundException",
    "RepositoryNotFoundException",
    "ApplicationNotFoundException",
];

/// Codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "TooManyRequestsException"];

/// Codes for missing permissions
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "InsufficientPrivilegesException",
    "UnauthorizedOperation",
];

/// Codes for per-resource refusals
const REJECTED_CODES: &[&str] = &[
    "ClientException",
    "InvalidParameterException",
    "InvalidParameterValue",
    "ImageTagDoesNotMatchDigest",
    "OperationInProgressFailure",
    "SourceBundleDeletionFailure",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        Some(c) if REJECTED_CODES.contains(&c) => AwsError::Rejected {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK error that carries service error metadata.
///
/// All three service SDKs re-export the same `ProvideErrorMetadata` trait,
/// so this works for `SdkError<E>` of any of them. Errors without a service
/// message (dispatch or credential failures) keep their full display chain.
pub fn classify_sdk_error<E>(error: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error.message() {
        Some(message) => classify_aws_error(error.code(), Some(message)),
        None => {
            let message = DisplayErrorContext(error).to_string();
            classify_aws_error(error.code(), Some(&message))
        }
    }
}

/// Classify an error from an anyhow::Error by walking its chain for
/// [`AwsError`] values produced by [`classify_sdk_error`].
pub fn classify_anyhow_error(error: &anyhow::Error) -> Option<&AwsError> {
    error.chain().find_map(|cause| cause.downcast_ref::<AwsError>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
            assert_eq!(err.code(), Some(*code));
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(
                matches!(err, AwsError::Throttled),
                "Expected Throttled for code: {code}"
            );
        }
    }

    #[test]
    fn access_denied_codes() {
        for code in ACCESS_DENIED_CODES {
            let err = classify_aws_error(Some(code), Some("not authorized"));
            assert!(matches!(err, AwsError::AccessDenied { .. }));
            assert!(err.suggestion().is_some());
        }
    }

    #[test]
    fn rejected_message_keeps_code() {
        let err = classify_aws_error(
            Some("ClientException"),
            Some("The specified task definition is still in use"),
        );
        assert_eq!(
            err.to_string(),
            "ClientException: The specified task definition is still in use"
        );
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));
        assert_eq!(err.code(), Some("SomeNewError"));

        let err2 = classify_aws_error(None, None);
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
        assert_eq!(err2.to_string(), "AWS error: Unknown error");
    }

    #[test]
    fn classify_anyhow_finds_wrapped_error() {
        let err = anyhow::Error::new(AwsError::Throttled).context("Failed to list repositories");
        assert!(matches!(
            classify_anyhow_error(&err),
            Some(AwsError::Throttled)
        ));

        let plain = anyhow::anyhow!("connection refused");
        assert!(classify_anyhow_error(&plain).is_none());
    }

    #[test]
    fn listing_failure_keeps_hint_through_sweep_chain() {
        use anyhow::Context;
        use aws_sdk_ecr::error::ErrorMetadata;
        use aws_sdk_ecr::operation::describe_repositories::DescribeRepositoriesError;
        use sweeper_core::{ResourceFamily, SweepError};

        let sdk_err = DescribeRepositoriesError::generic(
            ErrorMetadata::builder()
                .code("AccessDeniedException")
                .message("not authorized to perform: ecr:DescribeRepositories")
                .build(),
        );
        let listing = Err::<(), _>(sdk_err)
            .map_err(|e| classify_sdk_error(&e))
            .context("Failed to list repositories");
        let sweep = SweepError::list_groups(
            ResourceFamily::EcrTaggedImages,
            listing.expect_err("listing should fail"),
        );
        let top = anyhow::Error::new(sweep).context("Sweep of ecr_tagged_images failed");

        let found = classify_anyhow_error(&top).expect("AwsError should be in the chain");
        assert!(matches!(found, AwsError::AccessDenied { .. }));
        assert!(found.suggestion().is_some());
    }
}
