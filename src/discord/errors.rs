//! Converts serenity errors into [`DispatchError`]s.

use serenity::http::HttpError;
use tracing::debug;

use crate::error::DispatchError;

/// Discord JSON error code: the bot can't see the channel.
const MISSING_ACCESS: isize = 50001;
/// Discord JSON error code: the bot can see the channel but can't post.
const MISSING_PERMISSIONS: isize = 50013;

/// Classify a serenity `Error`.
pub fn classify(err: &serenity::Error) -> DispatchError {
    match err {
        serenity::Error::Http(http_err) => classify_http(http_err),
        _ => {
            debug!("Non-HTTP serenity error: {}", err);
            DispatchError::Transport(err.to_string())
        }
    }
}

fn classify_http(http_err: &HttpError) -> DispatchError {
    match http_err {
        HttpError::UnsuccessfulRequest(resp) => classify_response(
            resp.status_code.as_u16(),
            resp.error.code as isize,
            &resp.error.message,
        ),
        // Network / request-level failures (not Discord API errors)
        _ => DispatchError::Transport(http_err.to_string()),
    }
}

/// Maps an unsuccessful Discord API response to a dispatch failure class.
pub fn classify_response(status: u16, code: isize, message: &str) -> DispatchError {
    if status == 403 || code == MISSING_ACCESS || code == MISSING_PERMISSIONS {
        DispatchError::PermissionDenied(message.to_string())
    } else {
        DispatchError::Http {
            status,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // serenity's HTTP errors can't be built without a live response, so the
    // response mapping is tested directly.

    #[test]
    fn forbidden_status_is_permission_denied() {
        let err = classify_response(403, 0, "Forbidden");
        assert_eq!(err, DispatchError::PermissionDenied("Forbidden".into()));
        assert!(!err.is_reportable());
    }

    #[test]
    fn permission_codes_are_permission_denied() {
        assert!(matches!(
            classify_response(400, 50013, "Missing Permissions"),
            DispatchError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify_response(404, 50001, "Missing Access"),
            DispatchError::PermissionDenied(_)
        ));
    }

    #[test]
    fn other_responses_are_http_failures() {
        let err = classify_response(400, 50035, "Invalid Form Body");
        assert_eq!(
            err,
            DispatchError::Http {
                status: 400,
                message: "Invalid Form Body".into()
            }
        );
        assert!(err.is_reportable());
    }

    #[test]
    fn non_http_errors_are_transport_failures() {
        let err = classify(&serenity::Error::Other("socket closed"));
        assert_eq!(err, DispatchError::Transport("socket closed".into()));
    }
}
