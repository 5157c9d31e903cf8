use thiserror::Error;

/// Failures outside a running session: configuration, setup and I/O.
///
/// Problems during a session are reported through the handler table and
/// [`SessionEnd`](crate::session::SessionEnd), never as this error.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = PulseError::Config("poll interval must be positive".into());
        assert_eq!(err.to_string(), "Config error: poll interval must be positive");
    }

    #[test]
    fn io_error_converts() {
        let err: PulseError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "IO error: gone");
    }
}
