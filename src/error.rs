use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Unknown client: \"{0}\". Check your URL or add this client to the config.")]
    UnknownClient(String),

    #[error("Client \"{0}\" has no sheet configured yet.")]
    ClientWithoutSheet(String),

    #[error("Failed to fetch data: {status}")]
    FetchFailed { status: u16 },

    #[cfg(feature = "sheets")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV parse error: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DashboardError {
    /// Fetch and document-level failures can be retried; configuration
    /// problems need a human to fix the client directory first.
    pub fn is_retryable(&self) -> bool {
        match self {
            DashboardError::FetchFailed { .. } | DashboardError::CsvParse(_) => true,
            #[cfg(feature = "sheets")]
            DashboardError::Http(_) => true,
            DashboardError::IoError(_) => true,
            DashboardError::UnknownClient(_)
            | DashboardError::ClientWithoutSheet(_)
            | DashboardError::DateError(_)
            | DashboardError::SerializationError(_) => false,
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DashboardError::UnknownClient(_) | DashboardError::ClientWithoutSheet(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_not_retryable() {
        let unknown = DashboardError::UnknownClient("acme".to_string());
        assert!(unknown.is_configuration_error());
        assert!(!unknown.is_retryable());
        assert_eq!(
            unknown.to_string(),
            "Unknown client: \"acme\". Check your URL or add this client to the config."
        );

        let no_sheet = DashboardError::ClientWithoutSheet("Acme Co".to_string());
        assert!(no_sheet.is_configuration_error());
        assert!(!no_sheet.is_retryable());
    }

    #[test]
    fn test_fetch_failure_is_retryable() {
        let err = DashboardError::FetchFailed { status: 404 };
        assert!(err.is_retryable());
        assert!(!err.is_configuration_error());
        assert_eq!(err.to_string(), "Failed to fetch data: 404");
    }
}
