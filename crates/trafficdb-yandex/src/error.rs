use std::fmt;

use thiserror::Error;

/// Which vendor API produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Metrika,
    Webmaster,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Metrika => f.write_str("Metrika"),
            Service::Webmaster => f.write_str("Webmaster"),
        }
    }
}

/// Errors returned by the Metrika and Webmaster clients.
#[derive(Debug, Error)]
pub enum YandexError {
    /// HTTP 403: the token is invalid or lacks access to the counter/host.
    #[error("{service} denied access (HTTP 403); check token permissions")]
    Auth { service: Service },

    /// Any other failed request: a non-2xx status or a transport failure.
    /// `status` and `body` are set when the server answered.
    #[error("{service} request failed: {message}")]
    Api {
        service: Service,
        status: Option<u16>,
        body: Option<String>,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("unexpected {service} response for {context}: {source}")]
    Deserialize {
        service: Service,
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The client could not be constructed (bad base URL, unusable token).
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl YandexError {
    /// `true` for [`YandexError::Auth`].
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, YandexError::Auth { .. })
    }

    /// HTTP status carried by an [`YandexError::Api`] error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            YandexError::Api { status, .. } => *status,
            YandexError::Auth { .. } => Some(403),
            _ => None,
        }
    }

    pub(crate) fn transport(service: Service, err: &reqwest::Error) -> Self {
        YandexError::Api {
            service,
            status: err.status().map(|s| s.as_u16()),
            body: None,
            message: err.to_string(),
        }
    }
}
