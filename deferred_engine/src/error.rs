//! Error types for the deferred engine
//!
//! This module defines the error types used throughout the engine,
//! including context calls, pipeline state misuse, and shader building.

use std::fmt;

/// Result type for deferred engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Deferred engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error reported by the graphics context
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, surface, program, light, object)
    InvalidResource(String),

    /// Operation called in a state that does not allow it
    InvalidState(String),

    /// A shader stage failed to compile
    ShaderCompilationFailed {
        /// Name of the stage ("deferred vertex", ...)
        name: String,
        /// Diagnostic text returned by the compiler
        log: String,
    },

    /// A program failed to link
    ShaderLinkFailed {
        /// Name of the program
        name: String,
        /// Diagnostic text returned by the linker
        log: String,
    },

    /// Reading shader source from disk failed
    Io {
        /// Path that could not be read
        path: String,
        /// Underlying I/O error message
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::ShaderCompilationFailed { name, log } => {
                write!(f, "Failed to compile shader {}: {}", name, log)
            }
            Error::ShaderLinkFailed { name, log } => {
                write!(f, "Failed to link shader {}: {}", name, log)
            }
            Error::Io { path, message } => write!(f, "I/O error on {}: {}", path, message),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error and build an `Error::BackendError` with the same message
///
/// # Example
///
/// ```no_run
/// # use deferred_engine::engine_err;
/// let err = engine_err!("deferred::GBuffer", "Attachment {} is missing", 2);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::deferred::Error::BackendError(message)
    }};
}

/// Log an error and return early with an `Error::BackendError`
///
/// # Example
///
/// ```no_run
/// # use deferred_engine::engine_bail;
/// fn check(count: usize) -> deferred_engine::deferred::Result<()> {
///     if count == 0 {
///         engine_bail!("deferred::GBuffer", "No attachment declared");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
