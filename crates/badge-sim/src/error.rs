//! Simulator errors
//!
//! Every variant except [`SimError::Present`] is a fatal startup failure: the
//! coordinator reports it and exits the process with status 1.

use softbuffer::SoftBufferError;
use winit::error::EventLoopError;

/// Simulator errors
#[derive(Debug)]
pub enum SimError {
    /// Host event loop (video + event subsystems) could not be created
    EventLoop(EventLoopError),
    /// Window creation failed
    Window(String),
    /// Software surface (renderer) creation or resize failed
    Surface(SoftBufferError),
    /// A frame could not be presented
    Present(SoftBufferError),
    /// The firmware worker thread could not be spawned
    WorkerSpawn(std::io::Error),
    /// A simulator session is already running in this process
    AlreadyRunning,
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EventLoop(e) => Some(e),
            Self::Surface(e) | Self::Present(e) => Some(e),
            Self::WorkerSpawn(e) => Some(e),
            Self::Window(_) | Self::AlreadyRunning => None,
        }
    }
}

impl core::fmt::Display for SimError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EventLoop(e) => write!(f, "Unable to initialize host event loop: {e}"),
            Self::Window(msg) => write!(f, "Could not create window: {msg}"),
            Self::Surface(e) => write!(f, "Could not create renderer: {e}"),
            Self::Present(e) => write!(f, "Could not present frame: {e}"),
            Self::WorkerSpawn(e) => write!(f, "Could not start firmware thread: {e}"),
            Self::AlreadyRunning => write!(f, "Simulator is already running in this process"),
        }
    }
}

impl SimError {
    /// Whether this error aborts the process
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Present(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_are_fatal() {
        assert!(SimError::AlreadyRunning.is_fatal());
        assert!(SimError::Window("no display".into()).is_fatal());
    }

    #[test]
    fn window_error_message_carries_cause() {
        let err = SimError::Window("no display".into());
        assert_eq!(err.to_string(), "Could not create window: no display");
    }
}
