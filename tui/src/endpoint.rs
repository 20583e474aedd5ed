use http::Uri;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("API endpoint URL is required")]
    Missing,

    #[error("Please enter a valid URL")]
    Invalid(String),
}

impl EndpointError {
    /// Short reason shown on the status line.
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Missing => "Please enter an API endpoint URL",
            Self::Invalid(_) => "Invalid URL format",
        }
    }
}

/// Check that `raw` is an absolute URL (scheme and host) before any network
/// activity. Surrounding whitespace is ignored.
pub fn validate_endpoint(raw: &str) -> Result<Uri, EndpointError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EndpointError::Missing);
    }

    let uri: Uri = trimmed
        .parse()
        .map_err(|e: http::uri::InvalidUri| EndpointError::Invalid(e.to_string()))?;

    if uri.scheme().is_none() {
        return Err(EndpointError::Invalid("missing scheme".to_string()));
    }
    match uri.host() {
        Some(host) if !host.is_empty() => Ok(uri),
        _ => Err(EndpointError::Invalid("missing host".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_are_missing() {
        assert_eq!(validate_endpoint(""), Err(EndpointError::Missing));
        assert_eq!(validate_endpoint("   "), Err(EndpointError::Missing));
    }

    #[test]
    fn prose_is_invalid() {
        assert!(matches!(
            validate_endpoint("not a url"),
            Err(EndpointError::Invalid(_))
        ));
    }

    #[test]
    fn host_without_scheme_is_invalid() {
        assert!(matches!(
            validate_endpoint("localhost:8080/stream"),
            Err(EndpointError::Invalid(_))
        ));
    }

    #[test]
    fn relative_path_is_invalid() {
        assert!(matches!(
            validate_endpoint("/stream"),
            Err(EndpointError::Invalid(_))
        ));
    }

    #[test]
    fn absolute_urls_are_accepted() {
        let uri = validate_endpoint("  http://127.0.0.1:8080/stream ").unwrap();
        assert_eq!(uri.host(), Some("127.0.0.1"));
        assert_eq!(uri.port_u16(), Some(8080));
        assert_eq!(uri.path(), "/stream");

        assert!(validate_endpoint("https://abc.execute-api.example.com/prod/stream").is_ok());
    }

    #[test]
    fn status_reasons_differ() {
        assert_ne!(
            EndpointError::Missing.status_reason(),
            EndpointError::Invalid(String::new()).status_reason()
        );
    }
}
