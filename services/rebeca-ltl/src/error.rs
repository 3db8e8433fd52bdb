//! Error handling for the Rebeca LTL translator

use thiserror::Error;

/// Main error type for the translator
#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("Compilation error: {0}")]
    CompileError(#[from] CompileError),

    #[error("Definition error: {0}")]
    DefinitionError(#[from] DefinitionError),

    #[error("Translation engine error: {0}")]
    EngineError(#[from] EngineError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Errors raised while obtaining the model and property model
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Could not access file \"{path}\": {reason}")]
    FileAccess { path: String, reason: String },

    #[error("Invalid model in {path}: {message}")]
    InvalidModel { path: String, message: String },

    #[error("Invalid property model in {path}: {message}")]
    InvalidPropertyModel { path: String, message: String },

    #[error("Definition '{definition}' refers to unknown rebec '{instance}'")]
    UnknownInstance { definition: String, instance: String },
}

/// Failure to assemble one definition; the rest of the batch is unaffected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Expression of '{definition}' is nested {depth} levels deep, limit is {limit}")]
    DepthExceeded {
        definition: String,
        depth: usize,
        limit: usize,
    },

    #[error("Formula of '{definition}' uses proposition {index} but only {available} are named")]
    DanglingProposition {
        definition: String,
        index: usize,
        available: usize,
    },
}

impl DefinitionError {
    /// Name of the definition that failed
    pub fn definition(&self) -> &str {
        match self {
            DefinitionError::DepthExceeded { definition, .. }
            | DefinitionError::DanglingProposition { definition, .. } => definition,
        }
    }
}

/// Errors from the downstream LTL-to-automaton engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Translation engine not found: {engine}")]
    EngineNotFound { engine: String },

    #[error("Translation engine execution failed: {output}")]
    ExecutionFailed { output: String },

    #[error("Translation engine timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Translation engine produced no automaton for: {formula}")]
    EmptyOutput { formula: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {message}")]
    InvalidFormat { message: String },

    #[error("Missing required configuration key: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for key '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

/// Result type for the translator
pub type TranslatorResult<T> = Result<T, TranslatorError>;

/// Result type for model and property compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type for definition assembly
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
