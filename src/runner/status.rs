//! Host status codes and progress reporting
//!
//! The WPS host consumes numeric status codes and optional progress
//! updates. Progress reporting is a capability the embedder supplies; the
//! default implementation only logs, which is what standalone runs want.

use tracing::info;

/// Final status of one execution, as the host encodes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Succeeded,
    Failed,
}

impl ServiceStatus {
    /// The host's numeric encoding
    pub fn code(self) -> i32 {
        match self {
            ServiceStatus::Succeeded => 3,
            ServiceStatus::Failed => 4,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ServiceStatus::Succeeded)
    }
}

/// Progress reporting capability supplied by the embedding host
pub trait StatusReporter: Send + Sync {
    fn update_status(&self, progress: u8, message: Option<&str>);
}

/// Default reporter for standalone use: logs and does nothing else
#[derive(Debug, Default)]
pub struct NoopStatusReporter;

impl StatusReporter for NoopStatusReporter {
    fn update_status(&self, progress: u8, message: Option<&str>) {
        match message {
            Some(message) => info!("Status {}: {}", progress, message),
            None => info!("Status {}", progress),
        }
    }
}
