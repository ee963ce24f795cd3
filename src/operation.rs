//! Ticket operations and their wire-level metadata.
//!
//! The generic interface exposes four ticket operations. Everything the rest
//! of the crate needs to know about them lives in a static lookup table:
//! the `Type` string a webservice descriptor declares, the default endpoint
//! name, the provider route and methods, and the HTTP verb the client uses.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;

use crate::error::OtoboError;

/// The ticket operations a webservice can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketOperation {
    /// Create a ticket with an initial article.
    Create,
    /// Fetch one ticket with articles and dynamic fields.
    Get,
    /// Search for ticket ids matching filter criteria.
    Search,
    /// Partially update an existing ticket.
    Update,
}

/// Static metadata for one ticket operation.
///
/// `route` and `methods` describe the provider side of a webservice
/// descriptor; `endpoint` is the operation name used both as the descriptor
/// key and as the default URL path segment for clients.
#[derive(Debug)]
pub struct OperationSpec {
    /// The operation this entry describes.
    pub operation: TicketOperation,
    /// Descriptor `Type` string, e.g. `Ticket::TicketCreate`.
    pub wire_type: &'static str,
    /// Default endpoint name, e.g. `ticket-create`.
    pub endpoint: &'static str,
    /// Provider route template.
    pub route: &'static str,
    /// HTTP methods the provider route accepts.
    pub methods: &'static [&'static str],
    /// Human-readable description embedded in descriptors.
    pub description: &'static str,
}

// Indexed by the enum discriminant; keep both in the same order.
static SPECS: [OperationSpec; 4] = [
    OperationSpec {
        operation: TicketOperation::Create,
        wire_type: "Ticket::TicketCreate",
        endpoint: "ticket-create",
        route: "/tickets",
        methods: &["POST"],
        description: "Create a new ticket from the supplied Ticket and Article data.",
    },
    OperationSpec {
        operation: TicketOperation::Get,
        wire_type: "Ticket::TicketGet",
        endpoint: "ticket-get",
        route: "/tickets/:TicketID",
        methods: &["GET"],
        description: "Get ticket details by ID.",
    },
    OperationSpec {
        operation: TicketOperation::Search,
        wire_type: "Ticket::TicketSearch",
        endpoint: "ticket-search",
        route: "/tickets/search",
        methods: &["POST"],
        description: "Search for tickets using the request payload as criteria.",
    },
    OperationSpec {
        operation: TicketOperation::Update,
        wire_type: "Ticket::TicketUpdate",
        endpoint: "ticket-update",
        route: "/tickets/:TicketID",
        methods: &["PUT", "PATCH"],
        description: "Update an existing ticket identified by the path parameter.",
    },
];

impl TicketOperation {
    /// All operations, in descriptor order.
    pub const ALL: [TicketOperation; 4] = [
        TicketOperation::Create,
        TicketOperation::Get,
        TicketOperation::Search,
        TicketOperation::Update,
    ];

    /// Returns the static metadata for this operation.
    pub fn spec(self) -> &'static OperationSpec {
        &SPECS[self as usize]
    }

    /// Returns the descriptor `Type` string, e.g. `Ticket::TicketSearch`.
    pub fn wire_type(self) -> &'static str {
        self.spec().wire_type
    }

    /// Returns the default endpoint name, e.g. `ticket-search`.
    pub fn endpoint_name(self) -> &'static str {
        self.spec().endpoint
    }

    /// Resolves a descriptor `Type` string back to an operation.
    pub fn from_wire_type(wire_type: &str) -> Option<Self> {
        SPECS
            .iter()
            .find(|spec| spec.wire_type == wire_type)
            .map(|spec| spec.operation)
    }

    /// Returns the HTTP verb the client uses for this operation.
    ///
    /// This is a protocol contract of the ticket system: create, get, and
    /// search are invoked with POST (the request body carries credentials
    /// and criteria), update with PUT.
    pub fn request_method(self) -> Method {
        match self {
            TicketOperation::Update => Method::PUT,
            _ => Method::POST,
        }
    }
}

impl fmt::Display for TicketOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TicketOperation::Create => "create",
            TicketOperation::Get => "get",
            TicketOperation::Search => "search",
            TicketOperation::Update => "update",
        };
        f.write_str(name)
    }
}

impl FromStr for TicketOperation {
    type Err = OtoboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(TicketOperation::Create),
            "get" => Ok(TicketOperation::Get),
            "search" => Ok(TicketOperation::Search),
            "update" => Ok(TicketOperation::Update),
            other => Err(OtoboError::validation(format!(
                "unknown ticket operation '{}' (expected one of: create, get, search, update)",
                other
            ))),
        }
    }
}
