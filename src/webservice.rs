//! Webservice descriptor construction and parsing.
//!
//! A descriptor is the YAML document an OTOBO/Znuny administrator imports
//! to register a webservice. [`WebserviceBuilder`] produces descriptors
//! that expose a chosen set of ticket operations; the parsing side reads a
//! descriptor back into the endpoint map a [`crate::client::OtoboClient`]
//! needs, so client and server are configured from the same file.
//!
//! Serialization never emits YAML anchors or aliases; the admin importer
//! rejects documents that use them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::OtoboError;
use crate::operation::TicketOperation;

/// Framework version stamped into generated descriptors.
pub const DEFAULT_FRAMEWORK_VERSION: &str = "11.0.11";

/// A complete webservice descriptor document.
///
/// Field order matches the layout administrators are used to seeing in
/// exported descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webservice {
    /// Debugger settings.
    #[serde(rename = "Debugger", default)]
    pub debugger: Debugger,
    /// Human-readable description shown in the admin UI.
    #[serde(rename = "Description", default)]
    pub description: String,
    /// Framework version the descriptor targets.
    #[serde(rename = "FrameworkVersion", default)]
    pub framework_version: String,
    /// Provider side: the operations this webservice exposes.
    #[serde(rename = "Provider", default)]
    pub provider: Provider,
    /// Remote system label, unused by ticket webservices.
    #[serde(rename = "RemoteSystem", default)]
    pub remote_system: String,
    /// Requester side, empty for provider-only webservices.
    #[serde(rename = "Requester", default)]
    pub requester: Requester,
}

/// Debugger section of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debugger {
    /// Log threshold for the webservice debugger.
    #[serde(rename = "DebugThreshold", default)]
    pub debug_threshold: String,
    /// Test mode flag, as the stringly boolean the importer expects.
    #[serde(rename = "TestMode", default)]
    pub test_mode: String,
}

impl Default for Debugger {
    fn default() -> Self {
        Debugger {
            debug_threshold: "debug".to_string(),
            test_mode: "0".to_string(),
        }
    }
}

/// Provider section: operations plus their transport.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Provider {
    /// Operations keyed by endpoint name.
    #[serde(rename = "Operation", default)]
    pub operation: IndexMap<String, ProviderOperation>,
    /// Transport configuration.
    #[serde(rename = "Transport", default)]
    pub transport: Transport,
}

/// One operation entry in the provider section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderOperation {
    /// Backend operation type, e.g. `Ticket::TicketCreate`.
    #[serde(rename = "Type", default)]
    pub operation_type: String,
    /// Description shown in the admin UI.
    #[serde(rename = "Description", default)]
    pub description: String,
    /// Ask the backend to echo full ticket data in responses.
    #[serde(rename = "IncludeTicketData", default)]
    pub include_ticket_data: String,
    /// Mapping applied to incoming payloads.
    #[serde(rename = "MappingInbound", default)]
    pub mapping_inbound: Mapping,
    /// Mapping applied to outgoing payloads.
    #[serde(rename = "MappingOutbound", default)]
    pub mapping_outbound: Mapping,
}

/// A `Simple` mapping block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Mapping backend type.
    #[serde(rename = "Type", default)]
    pub kind: String,
    /// Mapping rules.
    #[serde(rename = "Config", default)]
    pub config: MappingConfig,
}

impl Default for Mapping {
    fn default() -> Self {
        Mapping {
            kind: "Simple".to_string(),
            config: MappingConfig::default(),
        }
    }
}

/// Rules inside a `Simple` mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Default rule for keys without an exact match.
    #[serde(rename = "KeyMapDefault", default)]
    pub key_map_default: MapRule,
    /// Exact key passthroughs.
    #[serde(rename = "KeyMapExact", default, skip_serializing_if = "Option::is_none")]
    pub key_map_exact: Option<IndexMap<String, String>>,
    /// Default rule for values.
    #[serde(rename = "ValueMapDefault", default)]
    pub value_map_default: MapRule,
    /// Per-key value rewrites.
    #[serde(rename = "ValueMap", default, skip_serializing_if = "Option::is_none")]
    pub value_map: Option<IndexMap<String, ValueMapRule>>,
}

/// A keep-or-rewrite rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRule {
    /// Replacement value, empty for `Keep`.
    #[serde(rename = "MapTo", default)]
    pub map_to: String,
    /// Rule kind, e.g. `Keep`.
    #[serde(rename = "MapType", default)]
    pub map_type: String,
}

impl Default for MapRule {
    fn default() -> Self {
        MapRule {
            map_to: String::new(),
            map_type: "Keep".to_string(),
        }
    }
}

/// Regex-based value rewrites for one key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueMapRule {
    /// Pattern to replacement map.
    #[serde(rename = "ValueMapRegEx", default)]
    pub value_map_reg_ex: IndexMap<String, String>,
}

/// Transport section of the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    /// Transport configuration.
    #[serde(rename = "Config", default)]
    pub config: TransportConfig,
    /// Transport backend type.
    #[serde(rename = "Type", default)]
    pub kind: String,
}

impl Default for Transport {
    fn default() -> Self {
        Transport {
            config: TransportConfig::default(),
            kind: "HTTP::REST".to_string(),
        }
    }
}

/// HTTP::REST transport configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Extra response headers; the importer wants the key present.
    #[serde(rename = "AdditionalHeaders", default)]
    pub additional_headers: Option<String>,
    /// Keep-alive setting, stringly.
    #[serde(rename = "KeepAlive", default)]
    pub keep_alive: String,
    /// Maximum accepted payload size in bytes, stringly.
    #[serde(rename = "MaxLength", default)]
    pub max_length: String,
    /// Outbound header overrides.
    #[serde(rename = "OutboundHeaders", default)]
    pub outbound_headers: IndexMap<String, String>,
    /// Route per endpoint name.
    #[serde(rename = "RouteOperationMapping", default)]
    pub route_operation_mapping: IndexMap<String, RouteMapping>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            additional_headers: None,
            keep_alive: String::new(),
            max_length: "1000000".to_string(),
            outbound_headers: IndexMap::new(),
            route_operation_mapping: IndexMap::new(),
        }
    }
}

/// Route declaration for one endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteMapping {
    /// URL route, possibly with a `:TicketID` placeholder.
    #[serde(rename = "Route", default)]
    pub route: String,
    /// Accepted HTTP methods.
    #[serde(rename = "RequestMethod", default)]
    pub request_method: Vec<String>,
    /// Payload parser.
    #[serde(rename = "ParserBackend", default)]
    pub parser_backend: String,
}

/// Requester section, present but empty for provider-only webservices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Requester {
    /// Requester transport.
    #[serde(rename = "Transport", default)]
    pub transport: RequesterTransport,
}

/// Transport stub of the requester section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequesterTransport {
    /// Transport backend type, empty when unused.
    #[serde(rename = "Type", default)]
    pub kind: String,
}

impl Webservice {
    /// Serializes the descriptor to YAML.
    ///
    /// The output is alias-free and keeps the section order of
    /// [`Webservice`].
    pub fn to_yaml(&self) -> Result<String, OtoboError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Writes the descriptor to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Refuses to overwrite an existing file with `OtoboError::Config`;
    /// descriptors are hand-tuned often enough that clobbering one
    /// silently is worse than failing.
    pub fn save(&self, path: &Path) -> Result<(), OtoboError> {
        if path.exists() {
            return Err(OtoboError::invalid_config(format!(
                "refusing to overwrite existing descriptor: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Reads a descriptor from a YAML file.
    ///
    /// Unknown keys are ignored and missing sections fall back to their
    /// defaults, so hand-edited or exported descriptors load fine.
    pub fn load(path: &Path) -> Result<Self, OtoboError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Extracts the endpoint map for configuring a client.
    ///
    /// Operation entries with types this crate does not know (FAQ,
    /// config item, custom backends) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::Config` when the descriptor declares no
    /// supported ticket operation at all.
    pub fn operation_endpoints(&self) -> Result<HashMap<TicketOperation, String>, OtoboError> {
        let mut endpoints = HashMap::new();
        for (endpoint, entry) in &self.provider.operation {
            if let Some(operation) = TicketOperation::from_wire_type(entry.operation_type.trim()) {
                endpoints.insert(operation, endpoint.clone());
            }
        }
        if endpoints.is_empty() {
            return Err(OtoboError::invalid_config(
                "descriptor declares no supported ticket operations",
            ));
        }
        Ok(endpoints)
    }
}

/// Parses the endpoint map out of descriptor YAML.
pub fn parse_operation_endpoints(
    yaml: &str,
) -> Result<HashMap<TicketOperation, String>, OtoboError> {
    let webservice: Webservice = serde_yaml::from_str(yaml)?;
    webservice.operation_endpoints()
}

/// Reads a descriptor file and parses its endpoint map.
pub fn load_operation_endpoints(
    path: &Path,
) -> Result<HashMap<TicketOperation, String>, OtoboError> {
    Webservice::load(path)?.operation_endpoints()
}

/// Checks a webservice name against the admin importer's expectations:
/// a letter followed by letters, digits, underscores, or hyphens.
pub fn is_valid_webservice_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Builder for ticket webservice descriptors.
///
/// # Example
///
/// ```ignore
/// let descriptor = WebserviceBuilder::new("Support")
///     .enable(TicketOperation::Create)
///     .enable(TicketOperation::Get)
///     .restrict_to_user("api_agent")
///     .build()?;
/// descriptor.save(Path::new("webservices/support.yml"))?;
/// ```
#[derive(Debug, Clone)]
pub struct WebserviceBuilder {
    name: String,
    framework_version: String,
    operations: Vec<TicketOperation>,
    restricted_user: Option<String>,
}

impl WebserviceBuilder {
    /// Creates a builder for a webservice with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        WebserviceBuilder {
            name: name.into(),
            framework_version: DEFAULT_FRAMEWORK_VERSION.to_string(),
            operations: Vec::new(),
            restricted_user: None,
        }
    }

    /// Exposes an operation. Enabling twice is a no-op.
    #[must_use]
    pub fn enable(mut self, operation: TicketOperation) -> Self {
        if !self.operations.contains(&operation) {
            self.operations.push(operation);
        }
        self
    }

    /// Exposes all four ticket operations.
    #[must_use]
    pub fn enable_all(mut self) -> Self {
        for operation in TicketOperation::ALL {
            self = self.enable(operation);
        }
        self
    }

    /// Restricts the webservice to one agent login.
    ///
    /// The inbound mapping rewrites every incoming `UserLogin` to the
    /// given login, so other credentials cannot authenticate through this
    /// webservice even if they are valid agents.
    #[must_use]
    pub fn restrict_to_user(mut self, user_login: impl Into<String>) -> Self {
        self.restricted_user = Some(user_login.into());
        self
    }

    /// Overrides the framework version stamped into the descriptor.
    #[must_use]
    pub fn framework_version(mut self, version: impl Into<String>) -> Self {
        self.framework_version = version.into();
        self
    }

    /// Builds the descriptor document.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::Config` when no operation is enabled; an
    /// operation-less webservice imports fine but can never serve a
    /// request.
    pub fn build(&self) -> Result<Webservice, OtoboError> {
        if self.operations.is_empty() {
            return Err(OtoboError::invalid_config(format!(
                "webservice '{}' has no operations enabled",
                self.name
            )));
        }

        let mut operation = IndexMap::new();
        let mut routes = IndexMap::new();
        for op in &self.operations {
            let spec = op.spec();
            operation.insert(
                spec.endpoint.to_string(),
                ProviderOperation {
                    operation_type: spec.wire_type.to_string(),
                    description: spec.description.to_string(),
                    include_ticket_data: "1".to_string(),
                    mapping_inbound: self.inbound_mapping(),
                    mapping_outbound: Mapping::default(),
                },
            );
            routes.insert(
                spec.endpoint.to_string(),
                RouteMapping {
                    route: spec.route.to_string(),
                    request_method: spec.methods.iter().map(|m| m.to_string()).collect(),
                    parser_backend: "JSON".to_string(),
                },
            );
        }

        let description = match &self.restricted_user {
            Some(user) => format!(
                "Webservice for '{}'. Restricted to user '{}'.",
                self.name, user
            ),
            None => format!("Webservice for '{}'.", self.name),
        };

        Ok(Webservice {
            debugger: Debugger::default(),
            description,
            framework_version: self.framework_version.clone(),
            provider: Provider {
                operation,
                transport: Transport {
                    config: TransportConfig {
                        route_operation_mapping: routes,
                        ..TransportConfig::default()
                    },
                    ..Transport::default()
                },
            },
            remote_system: String::new(),
            requester: Requester::default(),
        })
    }

    /// Inbound mapping: pass keys through, pin `UserLogin` exactly, and
    /// rewrite its value when the webservice is restricted.
    fn inbound_mapping(&self) -> Mapping {
        let mut config = MappingConfig {
            key_map_exact: Some(IndexMap::from([(
                "UserLogin".to_string(),
                "UserLogin".to_string(),
            )])),
            ..MappingConfig::default()
        };
        if let Some(user) = &self.restricted_user {
            config.value_map = Some(IndexMap::from([(
                "UserLogin".to_string(),
                ValueMapRule {
                    value_map_reg_ex: IndexMap::from([(".*".to_string(), user.clone())]),
                },
            )]));
        }
        Mapping {
            config,
            ..Mapping::default()
        }
    }
}
