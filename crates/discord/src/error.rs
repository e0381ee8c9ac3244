use {prunebot_channels::PlatformError, serenity::http::HttpError};

/// Map a serenity error onto the platform error taxonomy.
pub fn to_platform_error(err: serenity::Error) -> PlatformError {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) => {
            let detail = format!("{} {}: {}", resp.method, resp.url, resp.error.message);
            from_status(resp.status_code.as_u16(), detail)
        },
        serenity::Error::Http(HttpError::Request(e)) => PlatformError::Transport(e.to_string()),
        serenity::Error::Gateway(e) => PlatformError::Transport(e.to_string()),
        serenity::Error::Io(e) => PlatformError::Transport(e.to_string()),
        other => PlatformError::Other(other.to_string()),
    }
}

/// Classify an unsuccessful HTTP response by status code.
pub fn from_status(status: u16, detail: String) -> PlatformError {
    match status {
        404 => PlatformError::NotFound(detail),
        401 | 403 => PlatformError::Forbidden(detail),
        429 => PlatformError::RateLimited { retry_after: None },
        500..=599 => PlatformError::Unavailable(detail),
        _ => PlatformError::Other(format!("HTTP {status}: {detail}")),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(404, "not_found")]
    #[case(403, "forbidden")]
    #[case(401, "forbidden")]
    #[case(429, "rate_limited")]
    #[case(502, "unavailable")]
    #[case(400, "other")]
    fn classifies_status_codes(#[case] status: u16, #[case] kind: &str) {
        let err = from_status(status, "DELETE /channels/1/messages/2".into());
        let actual = match err {
            PlatformError::NotFound(_) => "not_found",
            PlatformError::Forbidden(_) => "forbidden",
            PlatformError::RateLimited { .. } => "rate_limited",
            PlatformError::Unavailable(_) => "unavailable",
            PlatformError::Other(_) => "other",
            PlatformError::Transport(_) => "transport",
        };
        assert_eq!(actual, kind);
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(from_status(503, String::new()).is_transient());
        assert!(!from_status(404, String::new()).is_transient());
    }
}
