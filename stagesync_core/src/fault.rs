//! Fault escalator: the single sink for unrecoverable conditions.

use stagesync_traits::Shutdown;

use crate::error::SyncError;

/// Message handed to the host when `err` forces a shutdown.
pub fn fault_message(err: &SyncError) -> String {
    format!("stagesync: {err}")
}

pub struct FaultEscalator {
    shutdown: Box<dyn Shutdown>,
    fault: Option<String>,
}

impl core::fmt::Debug for FaultEscalator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FaultEscalator")
            .field("fault", &self.fault)
            .finish()
    }
}

impl FaultEscalator {
    pub fn new(shutdown: Box<dyn Shutdown>) -> Self {
        Self {
            shutdown,
            fault: None,
        }
    }

    /// Log `err` and ask the host to terminate. Returns the shutdown message.
    ///
    /// Latches: the host is asked at most once, later faults are only logged.
    pub fn escalate(&mut self, err: &SyncError) -> String {
        let msg = fault_message(err);
        tracing::error!(error = %err, "{msg}");
        if self.fault.is_none() {
            self.shutdown.invoke_shutdown(&msg);
            self.fault = Some(msg.clone());
        }
        msg
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// Message of the fault that caused the shutdown.
    pub fn message(&self) -> Option<&str> {
        self.fault.as_deref()
    }
}
