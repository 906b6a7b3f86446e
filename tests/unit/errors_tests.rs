/*!
 * Tests for error types and conversions
 */

use std::time::Duration;
use subvtt::errors::{AppError, ProviderError, SubtitleError, TranslationError};

/// Test that IO errors become file errors
#[test]
fn test_appError_fromIoError_shouldBeFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: AppError = io_error.into();

    assert!(matches!(error, AppError::File(_)));
    assert!(error.to_string().contains("denied"));
}

/// Test that anyhow errors are preserved as text
#[test]
fn test_appError_fromAnyhow_shouldKeepMessage() {
    let error: AppError = anyhow::anyhow!("something broke").into();

    assert_eq!(error.to_string(), "Unknown error: something broke");
}

/// Test the retry classification used by the translation client
#[test]
fn test_providerError_isRetryable_shouldClassifyFailures() {
    assert!(ProviderError::Timeout(Duration::from_secs(60)).is_retryable());
    assert!(ProviderError::ConnectionError("refused".into()).is_retryable());
    assert!(ProviderError::ApiError { status_code: 503, message: String::new() }.is_retryable());
    assert!(ProviderError::ApiError { status_code: 429, message: String::new() }.is_retryable());
    assert!(!ProviderError::ApiError { status_code: 404, message: String::new() }.is_retryable());
    assert!(!ProviderError::ParseError("bad json".into()).is_retryable());
}

/// Test error messages carry their details
#[test]
fn test_errorDisplay_shouldIncludeDetails() {
    let mismatch = SubtitleError::TranslationCountMismatch {
        language: "vi".to_string(),
        expected: 3,
        actual: 2,
    };
    assert!(mismatch.to_string().contains("vi"));

    let exhausted = TranslationError::RetriesExhausted {
        attempts: 4,
        source: ProviderError::ConnectionError("refused".into()),
    };
    let message = exhausted.to_string();
    assert!(message.contains('4'), "{}", message);

    let wrapped: AppError = exhausted.into();
    assert!(matches!(wrapped, AppError::Translation(_)));
}
