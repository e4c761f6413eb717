use thiserror::Error;
use tracing::{debug, warn};
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::{
    CONFIGURE_WINDOW_REQUEST, COPY_AREA_REQUEST, GRAB_BUTTON_REQUEST, GRAB_KEY_REQUEST,
    KILL_CLIENT_REQUEST, POLY_FILL_RECTANGLE_REQUEST, POLY_SEGMENT_REQUEST, POLY_TEXT8_REQUEST,
    SET_INPUT_FOCUS_REQUEST,
};
use x11rb::protocol::ErrorKind;

/// Error types for the window manager
#[derive(Error, Debug)]
pub enum WmError {
    #[error("Cannot open display: {0}")]
    Connect(#[from] ConnectError),

    #[error("X connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X request failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("X request or id allocation failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),

    #[error("another window manager is already running")]
    AnotherWmRunning,

    #[error("fatal error: request code={major_opcode}, error {kind:?}")]
    Protocol { major_opcode: u8, kind: ErrorKind },
}

pub type WmResult<T> = Result<T, WmError>;

/// Errors that routinely follow from racing a client that is going away.
pub fn is_benign(major_opcode: u8, kind: ErrorKind) -> bool {
    match kind {
        ErrorKind::Window => true,
        ErrorKind::Match => matches!(major_opcode, SET_INPUT_FOCUS_REQUEST | CONFIGURE_WINDOW_REQUEST),
        ErrorKind::Drawable => matches!(
            major_opcode,
            POLY_TEXT8_REQUEST | POLY_FILL_RECTANGLE_REQUEST | POLY_SEGMENT_REQUEST | COPY_AREA_REQUEST
        ),
        ErrorKind::Access => matches!(major_opcode, GRAB_BUTTON_REQUEST | GRAB_KEY_REQUEST),
        // The client may be gone before KillClient arrives
        ErrorKind::Value => major_opcode == KILL_CLIENT_REQUEST,
        _ => false,
    }
}

/// Log and ignore X11 errors (for cleanup operations)
pub fn log_and_ignore<T, E: std::fmt::Display>(result: Result<T, E>, operation: &str) {
    if let Err(e) = result {
        debug!("Ignoring error in {}: {}", operation, e);
    }
}

/// Log warning for non-critical errors
pub fn log_warn<T, E: std::fmt::Display>(result: Result<T, E>, operation: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Warning in {}: {}", operation, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x11rb::protocol::xproto::{MAP_WINDOW_REQUEST, SET_SELECTION_OWNER_REQUEST};

    #[test]
    fn test_bad_window_is_always_benign() {
        assert!(is_benign(MAP_WINDOW_REQUEST, ErrorKind::Window));
        assert!(is_benign(CONFIGURE_WINDOW_REQUEST, ErrorKind::Window));
    }

    #[test]
    fn test_request_specific_cases() {
        assert!(is_benign(SET_INPUT_FOCUS_REQUEST, ErrorKind::Match));
        assert!(is_benign(CONFIGURE_WINDOW_REQUEST, ErrorKind::Match));
        assert!(is_benign(COPY_AREA_REQUEST, ErrorKind::Drawable));
        assert!(is_benign(GRAB_KEY_REQUEST, ErrorKind::Access));
        assert!(!is_benign(MAP_WINDOW_REQUEST, ErrorKind::Match));
        assert!(!is_benign(SET_SELECTION_OWNER_REQUEST, ErrorKind::Access));
        assert!(!is_benign(CONFIGURE_WINDOW_REQUEST, ErrorKind::Value));
    }

    #[test]
    fn test_kill_of_vanished_client_is_benign() {
        assert!(is_benign(KILL_CLIENT_REQUEST, ErrorKind::Value));
        assert!(!is_benign(MAP_WINDOW_REQUEST, ErrorKind::Value));
    }

    #[test]
    fn test_log_helpers() {
        let ok: Result<u8, String> = Ok(3);
        assert_eq!(log_warn(ok, "ok"), Some(3));
        let err: Result<u8, String> = Err("boom".into());
        assert_eq!(log_warn(err, "err"), None);
        log_and_ignore(Err::<(), _>("ignored"), "cleanup");
    }
}
