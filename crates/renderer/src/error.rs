use crate::types::ShaderStage;

/// Failures that abort pipeline construction.
///
/// None of these are retried: the driver answers deterministically for a
/// given source and layout, so every variant carries the diagnostic that
/// produced it and is surfaced to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program failed to link:\n{log}")]
    Link { log: String },
    #[error("program failed validation:\n{log}")]
    Validation { log: String },
    #[error("invalid pipeline configuration: {0}")]
    Configuration(String),
    #[error("driver refused to allocate {what}: {reason}")]
    Resource { what: &'static str, reason: String },
}

impl PipelineError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Driver-side diagnostic text, if the failure came from the driver.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Compile { log, .. } | Self::Link { log } | Self::Validation { log } => {
                Some(log.as_str())
            }
            Self::Configuration(_) | Self::Resource { .. } => None,
        }
    }
}

/// A uniform name that the linked program does not expose.
///
/// Drivers strip uniforms the shaders never read, so this is an expected
/// outcome rather than a fault; writes through the resulting binding are
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("uniform `{name}` is not active in the linked program")]
pub struct UniformNotFound {
    pub name: String,
}
