//! Maps `Box<dyn Error>` from host trait boundaries to typed `SyncError`.
//!
//! The traits in `stagesync_traits` use `Box<dyn Error + Send + Sync>` so any
//! host can plug in; this module converts those to our typed error enum, with
//! an optional feature-gated path for `stagesync_host::HostError` downcasting.

use crate::error::SyncError;

/// Human-readable reason for a host error.
///
/// Attempts to downcast known host error types first, then falls back to the
/// error's own message.
pub fn describe_host_error(e: &(dyn std::error::Error + 'static)) -> String {
    // Feature-gated: try to downcast to HostError for precise wording
    #[cfg(feature = "host-errors")]
    {
        use stagesync_host::HostError;
        if let Some(host) = e.downcast_ref::<HostError>() {
            return match host {
                HostError::Rejected(reason) => format!("host rejected script ({reason})"),
                HostError::Malformed { line, text } => {
                    format!("host could not parse line {line} ({text})")
                }
                other => other.to_string(),
            };
        }
    }

    e.to_string()
}

/// A sampling failure on `heater`; always retryable.
pub fn map_sample_error(heater: &str, e: &(dyn std::error::Error + 'static)) -> SyncError {
    SyncError::TransientSample {
        heater: heater.to_string(),
        reason: describe_host_error(e),
    }
}

/// A rejected batch; always fatal.
pub fn map_dispatch_error(
    stages: String,
    target: f64,
    e: &(dyn std::error::Error + 'static),
) -> SyncError {
    SyncError::Dispatch {
        stages,
        target,
        reason: describe_host_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_keep_their_message() {
        let e: Box<dyn std::error::Error + Send + Sync> = "gcode mutex busy".into();
        let mapped = map_sample_error("extruder", &*e);
        assert_eq!(
            mapped,
            SyncError::TransientSample {
                heater: "extruder".into(),
                reason: "gcode mutex busy".into()
            }
        );
        assert!(!mapped.is_fatal());
    }

    #[cfg(feature = "host-errors")]
    #[test]
    fn host_rejections_are_described() {
        let e = stagesync_host::HostError::Rejected("printer is shutdown".into());
        let mapped = map_dispatch_error("left, right".into(), 200.0, &e);
        assert!(mapped.is_fatal());
        assert_eq!(
            mapped.to_string(),
            "failed to dispatch batch for stages [left, right] at target 200.00: host rejected script (printer is shutdown)"
        );
    }
}
