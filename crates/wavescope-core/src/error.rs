//! Error types for the waveform engine
//!
//! Each concern gets its own enum so callers can tell construction faults
//! (fatal, never retried) apart from validation faults (surfaced, no state
//! change). Out-of-range numeric input is clamped and never shows up here.

use thiserror::Error;

/// Errors produced by the resample engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResampleError {
    /// Whole-envelope fit requested for a zero-width target
    #[error("Invalid resample width: {0}")]
    InvalidWidth(u32),

    /// Scale is zero, negative or not finite
    #[error("Invalid resample scale: {0}")]
    InvalidScale(f64),

    /// Windowed request asked for a negative or non-finite output length
    #[error("Invalid resample output length: {0}")]
    InvalidLength(f64),

    /// The envelope has no data to resample
    #[error("Envelope is empty")]
    EmptyEnvelope,
}

/// Result type for resample operations
pub type ResampleResult<T> = Result<T, ResampleError>;

/// Errors produced while decoding an envelope payload
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Binary header shorter than its declared version requires
    #[error("Truncated envelope header: {0} bytes")]
    TruncatedHeader(usize),

    /// Header version we do not understand
    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(i32),

    /// Only 8 and 16 bit envelopes exist
    #[error("Unsupported envelope bit depth: {0}")]
    UnsupportedBits(u32),

    /// Sample rate or samples-per-pixel not positive
    #[error("Invalid envelope header: sample_rate={sample_rate}, samples_per_pixel={samples_per_pixel}")]
    InvalidHeader { sample_rate: i64, samples_per_pixel: i64 },

    /// Min/max data does not match the declared length
    #[error("Envelope data mismatch: expected {expected} min/max pairs, found {found}")]
    DataMismatch { expected: usize, found: usize },

    /// Declared length and channel count do not fit in memory
    #[error("Envelope too large: {length} entries x {channels} channel(s)")]
    TooLarge { length: usize, channels: usize },

    /// JSON envelope could not be parsed
    #[error("Envelope JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for envelope decoding
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Errors produced by annotation operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnotationError {
    /// Time range failed validation (start >= 0, end > 0, end > start)
    #[error("Invalid time range: start={start}, end={end}")]
    InvalidRange { start: f64, end: f64 },

    /// Edit operation referenced an id that does not exist
    #[error("Annotation not found: {0}")]
    NotFound(u64),

    /// Drag attempted on a segment created as read-only
    #[error("Segment {0} is not editable")]
    NotEditable(u64),
}

/// Result type for annotation operations
pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// Errors produced when validating a viewer configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No zoom levels configured
    #[error("At least one zoom level is required")]
    NoZoomLevels,

    /// Zoom levels must be strictly ascending and non-zero
    #[error("Zoom levels must be non-zero and strictly ascending: {0:?}")]
    ZoomLevelsNotAscending(Vec<u32>),

    /// Initial zoom level index outside the configured list
    #[error("Initial zoom level {index} out of range (have {count} levels)")]
    InitialZoomOutOfRange { index: usize, count: usize },

    /// Animation frame counts must be positive
    #[error("Zoom animation frame counts must be positive (in={zoom_in}, out={zoom_out})")]
    InvalidFrameCount { zoom_in: usize, zoom_out: usize },

    /// A numeric setting that must be positive was not
    #[error("Setting {name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
}

/// Errors produced while constructing a session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Container width or height is zero
    #[error("Invalid container dimensions: {width}x{height}")]
    InvalidContainer { width: u32, height: u32 },

    /// Envelope has no samples
    #[error("Envelope is empty")]
    EmptyEnvelope,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Initial resample failed
    #[error("Initial resample failed: {0}")]
    Resample(#[from] ResampleError),
}

/// Result type for session construction
pub type SessionResult<T> = Result<T, SessionError>;
