// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the visualizer
//!
//! The per-frame hot path is infallible: every numeric operation is
//! defined (saturating or clamped) over the full 11-bit depth domain.
//! Errors only arise at the boundary: source startup, snapshot IO and
//! terminal setup.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Depth source errors
    Source(SourceError),
    /// Snapshot capture/save errors
    Snapshot(SnapshotError),
    /// Configuration errors (preset file parsing, unknown preset names)
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Depth-source specific errors
#[derive(Debug, Clone)]
pub enum SourceError {
    /// No depth source available
    NoSourceFound,
    /// Source initialization failed
    InitializationFailed(String),
    /// Source stopped delivering frames
    Disconnected,
}

/// Snapshot capture errors
#[derive(Debug, Clone)]
pub enum SnapshotError {
    /// No finished frame was published in time
    NoFrameAvailable,
    /// Encoding the output image failed
    EncodingFailed(String),
    /// Writing the output file failed
    SaveFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Source(e) => write!(f, "Source error: {}", e),
            AppError::Snapshot(e) => write!(f, "Snapshot error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NoSourceFound => write!(f, "No depth source available"),
            SourceError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            SourceError::Disconnected => write!(f, "Depth source disconnected"),
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::NoFrameAvailable => write!(f, "No finished frame available"),
            SnapshotError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            SnapshotError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for SourceError {}
impl std::error::Error for SnapshotError {}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        AppError::Source(err)
    }
}

impl From<SnapshotError> for AppError {
    fn from(err: SnapshotError) -> Self {
        AppError::Snapshot(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::SaveFailed(err.to_string())
    }
}
