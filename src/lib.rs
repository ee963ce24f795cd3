//! # otobo-client
//!
//! Client library and admin tooling for the OTOBO (and Znuny) ticket
//! system's generic-interface REST API.
//!
//! ## Features
//!
//! - **Ticket operations**: Create, get, update, and search tickets over a
//!   configured webservice
//! - **Search-and-fetch**: Search then fetch full tickets concurrently,
//!   with optional sampling for spot checks
//! - **Descriptor tooling**: Generate and parse the YAML webservice
//!   descriptors the admin UI imports
//! - **Provisioning**: Drive `otobo.Console.pl` to create agents, groups,
//!   queues, and webservices
//! - **Security**: Passwords are never logged or included in errors
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`] - Client configuration and credential handling
//! - [`error`] - The unified error type and its failure classes
//! - [`client`] - HTTP client for the ticket REST endpoints
//! - [`models`] - Domain ticket types and their wire-format counterparts
//! - [`mapper`] - Conversion between domain and wire types
//! - [`operation`] - The four ticket operations and their metadata
//! - [`webservice`] - Webservice descriptor builder and parser
//! - [`console`] - Admin console command wrapper
//!
//! ## Usage
//!
//! As a library, configure a client from the environment:
//!
//! ```bash
//! export OTOBO_BASE_URL=https://tickets.example.com/otobo/nph-genericinterface.pl
//! export OTOBO_WEBSERVICE=Support
//! export OTOBO_USER=api_agent
//! export OTOBO_PASSWORD=...
//! ```
//!
//! The `otobo-admin` binary covers provisioning:
//!
//! ```bash
//! otobo-admin generate-webservice --name Support --file support.yml
//! otobo-admin install-webservice --name Support
//! ```
//!
//! ## Configuration
//!
//! Two environment variables are required:
//!
//! - `OTOBO_BASE_URL`: Base URL of the generic-interface entry point
//! - `OTOBO_WEBSERVICE`: Name of the webservice to talk to
//!
//! Optional:
//! - `OTOBO_USER` / `OTOBO_PASSWORD`: Agent credentials (must be set
//!   together)
//! - `RUST_LOG`: Log level (e.g., `otobo_client=debug`)
//!
//! ## Security Considerations
//!
//! The agent password is stored only in memory and is:
//! - Never logged at any log level
//! - Redacted from debug output
//! - Only serialized into request bodies
//!
//! ## Example
//!
//! Using the [`OtoboClient`](client::OtoboClient) directly:
//!
//! ```ignore
//! use otobo_client::client::{OtoboClient, SearchAndGet};
//! use otobo_client::config::ClientConfig;
//! use otobo_client::models::{IdName, TicketSearch};
//!
//! async fn example() -> Result<(), otobo_client::error::OtoboError> {
//!     let config = ClientConfig::from_env()?;
//!     let client = OtoboClient::new(config)?;
//!
//!     // Fetch up to ten open tickets from the Support queue
//!     let search = TicketSearch::default()
//!         .with_queue(IdName::by_name("Support")?)
//!         .with_state(IdName::by_name("open")?);
//!     let options = SearchAndGet::default().with_max_tickets(10);
//!
//!     let tickets = client.search_and_get(&search, &options).await?;
//!     for ticket in tickets {
//!         println!("#{}: {}", ticket.number, ticket.title.unwrap_or_default());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod mapper;
pub mod models;
pub mod operation;
pub mod webservice;
