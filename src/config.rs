//! Client configuration for an OTOBO/Znuny web service.
//!
//! This module handles loading configuration from environment variables,
//! with validation to ensure all required values are present. The endpoint
//! map can also be derived from a webservice descriptor, see
//! [`crate::webservice::load_operation_endpoints`].

use std::collections::HashMap;
use std::env;
use std::fmt;

use url::Url;

use crate::error::OtoboError;
use crate::operation::TicketOperation;

/// Agent credentials injected into every request body.
///
/// The password is stored but never logged or exposed in error messages;
/// the `Debug` implementation redacts it.
#[derive(Clone)]
pub struct Credentials {
    user_login: String,
    password: String,
}

impl Credentials {
    /// Creates credentials for the given agent login.
    pub fn new(user_login: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            user_login: user_login.into(),
            password: password.into(),
        }
    }

    /// Returns the agent login name.
    pub fn user_login(&self) -> &str {
        &self.user_login
    }

    /// Returns the password.
    ///
    /// Only the request serializer should need this; never log the value.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_login", &self.user_login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for connecting to an OTOBO/Znuny ticket web service.
///
/// Holds the instance base URL, the webservice name, the map of configured
/// operation endpoints, and optional credentials. Operations missing from
/// the endpoint map fail fast with a configuration error before any
/// network traffic happens.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the generic interface
    /// (e.g., `https://support.example.com/otobo/nph-genericinterface.pl`).
    pub base_url: String,

    /// Name of the webservice registered on the server.
    pub webservice: String,

    /// Endpoint name per configured operation.
    pub operations: HashMap<TicketOperation, String>,

    /// Credentials merged into every request body, if already known.
    pub credentials: Option<Credentials>,
}

impl ClientConfig {
    /// Creates a configuration with an empty endpoint map.
    ///
    /// The base URL is validated and normalized (trailing slashes removed);
    /// the webservice name is trimmed of surrounding slashes.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::Config` if the base URL is not a valid http(s)
    /// URL or the webservice name is empty.
    pub fn new(
        base_url: impl Into<String>,
        webservice: impl Into<String>,
    ) -> Result<Self, OtoboError> {
        let base_url = Self::validate_base_url(base_url.into())?;
        let webservice = webservice.into().trim().trim_matches('/').to_string();
        if webservice.is_empty() {
            return Err(OtoboError::invalid_config(
                "webservice name must not be empty",
            ));
        }

        Ok(ClientConfig {
            base_url,
            webservice,
            operations: HashMap::new(),
            credentials: None,
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTOBO_BASE_URL`: base URL of the generic interface (required)
    /// - `OTOBO_WEBSERVICE`: name of the webservice (required)
    /// - `OTOBO_USER`: agent login (optional, pairs with `OTOBO_PASSWORD`)
    /// - `OTOBO_PASSWORD`: agent password (optional)
    ///
    /// All four ticket operations are mapped to their default endpoint
    /// names; use [`ClientConfig::with_operations`] afterwards to replace
    /// the map with one parsed from a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::Config` if a required variable is missing, if
    /// values fail validation, or if only one half of the credential pair
    /// is set.
    ///
    /// # Example
    ///
    /// ```ignore
    /// dotenvy::dotenv().ok();
    /// let config = ClientConfig::from_env()?;
    /// ```
    pub fn from_env() -> Result<Self, OtoboError> {
        let base_url = Self::get_required_env("OTOBO_BASE_URL")?;
        let webservice = Self::get_required_env("OTOBO_WEBSERVICE")?;

        let user = Self::get_optional_env("OTOBO_USER");
        let password = Self::get_optional_env("OTOBO_PASSWORD");
        let credentials = match (user, password) {
            (Some(user), Some(password)) => Some(Credentials::new(user, password)),
            (None, None) => None,
            _ => {
                return Err(OtoboError::invalid_config(
                    "OTOBO_USER and OTOBO_PASSWORD must be set together",
                ))
            }
        };

        let mut config = Self::new(base_url, webservice)?.with_default_operations();
        config.credentials = credentials;
        Ok(config)
    }

    /// Maps all four ticket operations to their default endpoint names.
    #[must_use]
    pub fn with_default_operations(mut self) -> Self {
        for op in TicketOperation::ALL {
            self.operations.insert(op, op.endpoint_name().to_string());
        }
        self
    }

    /// Maps a single operation to an endpoint name.
    ///
    /// Endpoint names may contain a `:TicketID` placeholder which the
    /// client substitutes with the ticket id at request time.
    #[must_use]
    pub fn with_operation(
        mut self,
        operation: TicketOperation,
        endpoint: impl Into<String>,
    ) -> Self {
        self.operations.insert(operation, endpoint.into());
        self
    }

    /// Replaces the endpoint map, e.g. with one parsed from a descriptor.
    #[must_use]
    pub fn with_operations(mut self, operations: HashMap<TicketOperation, String>) -> Self {
        self.operations = operations;
        self
    }

    /// Sets the credentials merged into every request body.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String, OtoboError> {
        env::var(name)
            .map_err(|_| OtoboError::missing_env(name))
            .and_then(|value| {
                if value.trim().is_empty() {
                    Err(OtoboError::missing_env(name))
                } else {
                    Ok(value)
                }
            })
    }

    /// Gets an optional environment variable, treating empty values as unset.
    fn get_optional_env(name: &str) -> Option<String> {
        env::var(name).ok().filter(|value| !value.trim().is_empty())
    }

    /// Validates and normalizes the base URL.
    fn validate_base_url(url: String) -> Result<String, OtoboError> {
        let url = url.trim().trim_end_matches('/').to_string();

        let parsed = Url::parse(&url).map_err(|_| {
            OtoboError::invalid_config(format!("base URL '{url}' is not a valid URL"))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(OtoboError::invalid_config(
                "base URL must start with http:// or https://",
            ));
        }

        Ok(url)
    }
}
