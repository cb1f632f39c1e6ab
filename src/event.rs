//! Runtime events for monitoring session health.
//!
//! Events are non-fatal notifications about session behavior. The session
//! continues running after most events are emitted - they're for
//! logging/metrics and UI status, not error handling. The one exception is
//! [`SessionEvent::Stopped`], which is the single terminal notification.

use std::fmt;
use std::sync::Arc;

/// Why a session stopped.
///
/// Carried by [`SessionEvent::Stopped`]. Every cause funnels through the
/// same teardown path; the reason only records which trigger fired first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The caller invoked [`Session::stop()`](crate::Session::stop).
    User,

    /// The remote session closed without reporting an error.
    ///
    /// Treated as normal termination, never surfaced as an error.
    RemoteClosed,

    /// The shared screen went away (for example, the user revoked the
    /// share from outside the application).
    ScreenShareEnded,

    /// The transport reported an error after the session was open.
    TransportError {
        /// What the transport reported.
        reason: String,
    },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "stopped by user"),
            Self::RemoteClosed => write!(f, "remote session closed"),
            Self::ScreenShareEnded => write!(f, "screen share ended"),
            Self::TransportError { reason } => write!(f, "transport error: {reason}"),
        }
    }
}

/// Runtime events emitted during a live session.
///
/// These are informational events, not errors. Use the [`EventCallback`] to
/// log them or drive UI status.
///
/// # Example
///
/// ```
/// use tutor_live::SessionEvent;
///
/// fn handle_event(event: SessionEvent) {
///     match event {
///         SessionEvent::Connected => {
///             eprintln!("session open");
///         }
///         SessionEvent::Interrupted { cancelled } => {
///             eprintln!("barge-in: {} playback units flushed", cancelled);
///         }
///         SessionEvent::TurnComplete => {
///             eprintln!("assistant finished its turn");
///         }
///         SessionEvent::OutboundOverflow { dropped } => {
///             eprintln!("send queue full: {} payloads dropped so far", dropped);
///         }
///         SessionEvent::DecodeFailed { reason } => {
///             eprintln!("skipped undecodable reply: {}", reason);
///         }
///         SessionEvent::Stopped { reason } => {
///             eprintln!("session over: {}", reason);
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The remote session resolved and queued media is now flowing.
    Connected,

    /// The assistant's reply was cut off because the user spoke.
    ///
    /// All scheduled playback has been flushed; the next reply schedules
    /// from the live output clock.
    Interrupted {
        /// Number of playback units that were stopped mid-flight.
        cancelled: usize,
    },

    /// The assistant finished a reply turn.
    ///
    /// Informational only; playback of already-scheduled audio continues.
    TurnComplete,

    /// The outbound queue dropped a payload because it was full.
    ///
    /// This happens when the remote session resolves slowly or the
    /// transport stalls. Consider increasing
    /// [`SessionConfig::outbound_capacity`](crate::SessionConfig::outbound_capacity).
    OutboundOverflow {
        /// Total payloads dropped so far in this session.
        dropped: u64,
    },

    /// An inbound audio payload could not be decoded and was skipped.
    ///
    /// Subsequent replies keep playing; a single malformed message never
    /// stops the session.
    DecodeFailed {
        /// Description of the decode failure.
        reason: String,
    },

    /// The session tore down. This is always the last event.
    Stopped {
        /// Which trigger stopped the session.
        reason: StopReason,
    },
}

/// Callback type for receiving runtime events.
///
/// Register an event callback via [`TutorLiveBuilder::on_event()`] to
/// receive notifications about connection state, barge-in, dropped media,
/// and teardown.
///
/// [`TutorLiveBuilder::on_event()`]: crate::TutorLiveBuilder::on_event
///
/// # Example
///
/// ```ignore
/// use tutor_live::TutorLive;
///
/// let session = TutorLive::builder()
///     .on_event(|event| {
///         tracing::info!(?event, "session event");
///     })
///     .start()
///     .await?;
/// ```
pub type EventCallback = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// This is a convenience function for creating event callbacks without
/// manually wrapping in `Arc`.
///
/// # Example
///
/// ```
/// use tutor_live::{event_callback, SessionEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(SessionEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_event_debug() {
        let event = SessionEvent::OutboundOverflow { dropped: 3 };
        let debug = format!("{:?}", event);
        assert!(debug.contains("OutboundOverflow"));
        assert!(debug.contains("3"));
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::User.to_string(), "stopped by user");
        assert_eq!(StopReason::RemoteClosed.to_string(), "remote session closed");
        let err = StopReason::TransportError {
            reason: "socket reset".to_string(),
        };
        assert_eq!(err.to_string(), "transport error: socket reset");
    }

    #[test]
    fn test_stopped_event_clone() {
        let event = SessionEvent::Stopped {
            reason: StopReason::ScreenShareEnded,
        };
        let cloned = event.clone();
        if let SessionEvent::Stopped { reason } = cloned {
            assert_eq!(reason, StopReason::ScreenShareEnded);
        } else {
            panic!("Expected Stopped variant");
        }
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        callback(SessionEvent::Connected);
        assert!(called.load(Ordering::SeqCst));
    }
}
