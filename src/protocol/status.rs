//! HTTP projections of errors and version preconditions.

use crate::error::{ScimError, ScimResult};
use std::future::Future;

/// HTTP status for `err`, accounting for conditional requests: a missing
/// resource under `If-Match` is a failed precondition, not a 404.
pub fn status_for(err: &ScimError, had_if_match: bool) -> u16 {
    match err {
        ScimError::ResourceNotFound { .. } if had_if_match => 412,
        other => other.http_status(),
    }
}

/// Weak-comparison match of an `If-Match` / `If-None-Match` header value
/// against a resource version. `*` matches any existing version.
pub fn version_matches(header: &str, version: Option<&str>) -> bool {
    let Some(version) = version else {
        return false;
    };
    header
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || strip_weak(candidate) == strip_weak(version))
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// Run a request handler on the runtime, converting a panic into an
/// internal error instead of tearing the connection down.
pub async fn recovered<T, F>(handler: F) -> ScimResult<T>
where
    F: Future<Output = ScimResult<T>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(handler).await {
        Ok(result) => result,
        Err(join_err) if join_err.is_panic() => {
            log::error!("request handler panicked");
            Err(ScimError::internal("request handler panicked"))
        }
        Err(_) => Err(ScimError::internal("request handler cancelled")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn if_match_turns_missing_resource_into_412() {
        let err = ScimError::ResourceNotFound { id: "x".into() };
        assert_eq!(status_for(&err, false), 404);
        assert_eq!(status_for(&err, true), 412);
        assert_eq!(status_for(&ScimError::invalid_path("p"), true), 400);
    }

    #[test]
    fn version_matching_is_weak() {
        assert!(version_matches("W/\"abc\"", Some("W/\"abc\"")));
        assert!(version_matches("\"abc\"", Some("W/\"abc\"")));
        assert!(version_matches("*", Some("W/\"abc\"")));
        assert!(!version_matches("W/\"abc\"", Some("W/\"def\"")));
        assert!(!version_matches("*", None));
        assert!(version_matches("W/\"a\", W/\"b\"", Some("W/\"b\"")));
    }

    #[tokio::test]
    async fn panics_become_internal_errors() {
        let result: ScimResult<()> = recovered(async { panic!("boom") }).await;
        assert!(matches!(result, Err(ScimError::Internal { .. })));

        let ok: ScimResult<u8> = recovered(async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }
}
