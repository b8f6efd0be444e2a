use thiserror::Error;

/// Failures that stop the program before the chat loop starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{var} is not set in the environment variables.")]
    MissingCredential { var: &'static str },
    #[error("Failed to initialize Gemini client: {0}")]
    ClientInit(#[source] reqwest::Error),
}

/// Failures of a single send. The session survives all of them.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(
        "Model request timed out after {timeout_secs}s while calling '{url}'. \
         Increase MODEL_TIMEOUT_SECS or check model responsiveness."
    )]
    Timeout { url: String, timeout_secs: u64 },
    #[error(
        "Connection refused by model API at '{url}'. \
         Ensure MODEL_BASE_URL is correct."
    )]
    ConnectionRefused { url: String },
    #[error(
        "Failed to connect to model API at '{url}'. \
         Check MODEL_BASE_URL and network connectivity."
    )]
    Connect { url: String },
    #[error("Failed to call model API at '{url}': {reason}")]
    Request { url: String, reason: reqwest::Error },
    #[error("Model request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Failed to parse model response: {0}")]
    InvalidResponse(String),
}
