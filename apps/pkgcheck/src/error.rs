//! CLI error handling

use std::fmt;

use pkgcheck_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(pkgcheck_errors::ConfigError),
    /// Loading the package or running the checks failed
    Run(pkgcheck_errors::Error),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => {
                write!(f, "Configuration error: {e}")?;
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::Run(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Run(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<pkgcheck_errors::ConfigError> for CliError {
    fn from(e: pkgcheck_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<pkgcheck_errors::Error> for CliError {
    fn from(e: pkgcheck_errors::Error) -> Self {
        match e {
            pkgcheck_errors::Error::Config(e) => CliError::Config(e),
            other => CliError::Run(other),
        }
    }
}

impl From<pkgcheck_errors::EngineError> for CliError {
    fn from(e: pkgcheck_errors::EngineError) -> Self {
        CliError::Run(e.into())
    }
}

impl From<pkgcheck_errors::PackageError> for CliError {
    fn from(e: pkgcheck_errors::PackageError) -> Self {
        CliError::Run(e.into())
    }
}

impl From<pkgcheck_errors::NetworkError> for CliError {
    fn from(e: pkgcheck_errors::NetworkError) -> Self {
        CliError::Run(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
