// SPDX-License-Identifier: MPL-2.0

//! Error types for the live overlay pipeline
//!
//! Every recoverable failure is a value returned to the immediate caller.
//! Lock corruption is not represented here; it aborts the process (see
//! [`crate::sync`]).

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Top-level error used by the binary
#[derive(Debug, Clone)]
pub enum AppError {
    /// Pipeline construction or operation errors
    Pipeline(PipelineError),
    /// Overlay registry errors
    Overlay(OverlayError),
    /// Inference engine errors
    Inference(InferenceError),
    /// Configuration errors
    Config(ConfigError),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Which graph construction step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    /// Framework initialization
    Init,
    /// Creating a graph node
    Element,
    /// Adding a node to the graph
    Add,
    /// Linking two nodes
    Link,
    /// Hooking callbacks or the bus
    Wiring,
}

/// Pipeline errors
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Graph construction failed; the pipeline instance is unusable
    Construction { stage: BuildStage, message: String },
    /// The graph refused to start (e.g. no capture device present)
    StartFailed(String),
    /// Operation not valid in the current state
    InvalidState(String),
    /// The pull returned nothing (timeout, end of stream, torn-down sink)
    NoFrame(String),
    /// A stop request arrived while the pull was in progress
    Interrupted,
    /// A sample arrived but could not be turned into a frame
    MalformedSample(String),
    /// The framework reported an error on the bus
    Graph { source: String, message: String },
    /// The pipeline hit a terminal error earlier
    Errored(String),
}

/// Overlay registry errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// The overlay is already held by a registry
    AlreadyOwned,
}

/// Overlay drawing errors
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The canvas pixel layout cannot be drawn on
    UnsupportedCanvas(String),
    /// The canvas buffer is smaller than its declared geometry
    CanvasTooSmall { needed: usize, actual: usize },
    /// The overlay carries coordinates that cannot be drawn
    MalformedOverlay(String),
}

/// Inference engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The frame could not be handed to the engine
    UnsupportedFrame(String),
    /// The engine failed to evaluate
    EvaluationFailed(String),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Config file exists but could not be read
    Read(String),
    /// Config file could not be parsed
    Parse(String),
    /// A value is out of range
    Invalid(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            AppError::Overlay(e) => write!(f, "Overlay error: {}", e),
            AppError::Inference(e) => write!(f, "Inference error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStage::Init => write!(f, "init"),
            BuildStage::Element => write!(f, "element"),
            BuildStage::Add => write!(f, "add"),
            BuildStage::Link => write!(f, "link"),
            BuildStage::Wiring => write!(f, "wiring"),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Construction { stage, message } => {
                write!(f, "Construction failed ({}): {}", stage, message)
            }
            PipelineError::StartFailed(msg) => write!(f, "Failed to start: {}", msg),
            PipelineError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            PipelineError::NoFrame(msg) => write!(f, "No frame available: {}", msg),
            PipelineError::Interrupted => write!(f, "Frame pull interrupted by stop"),
            PipelineError::MalformedSample(msg) => write!(f, "Malformed sample: {}", msg),
            PipelineError::Graph { source, message } => {
                write!(f, "Error in {}: {}", source, message)
            }
            PipelineError::Errored(msg) => write!(f, "Pipeline is in error state: {}", msg),
        }
    }
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::AlreadyOwned => write!(f, "Overlay already owned by another pipeline"),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UnsupportedCanvas(fmt_name) => {
                write!(f, "Unexpected canvas format {} when drawing overlays", fmt_name)
            }
            RenderError::CanvasTooSmall { needed, actual } => {
                write!(f, "Canvas buffer too small: need {} bytes, have {}", needed, actual)
            }
            RenderError::MalformedOverlay(msg) => write!(f, "Malformed overlay: {}", msg),
        }
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::UnsupportedFrame(msg) => write!(f, "Unsupported frame: {}", msg),
            InferenceError::EvaluationFailed(msg) => write!(f, "Evaluation failed: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for PipelineError {}
impl std::error::Error for OverlayError {}
impl std::error::Error for RenderError {}
impl std::error::Error for InferenceError {}
impl std::error::Error for ConfigError {}

impl PipelineError {
    /// Shorthand for construction failures
    pub fn construction(stage: BuildStage, message: impl Into<String>) -> Self {
        PipelineError::Construction {
            stage,
            message: message.into(),
        }
    }
}

// Conversions from sub-errors to AppError
impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Pipeline(err)
    }
}

impl From<OverlayError> for AppError {
    fn from(err: OverlayError) -> Self {
        AppError::Overlay(err)
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::Inference(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
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
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<gstreamer::glib::Error> for PipelineError {
    fn from(err: gstreamer::glib::Error) -> Self {
        PipelineError::construction(BuildStage::Init, err.to_string())
    }
}
