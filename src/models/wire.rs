//! Wire-level records for the generic interface JSON protocol.
//!
//! Field names follow the server's capitalized spelling via serde renames.
//! Response records are deliberately tolerant: every field is optional,
//! ids accept both numbers and numeric strings, and article lists accept a
//! bare object where a list is expected. Instances and their mapping
//! layers vary enough that a strict schema would reject valid answers.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// A numeric id that instances may serialize as a number or a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WireId(pub u64);

impl<'de> Deserialize<'de> for WireId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct WireIdVisitor;

        impl Visitor<'_> for WireIdVisitor {
            type Value = WireId;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("an id as an integer or a numeric string")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(WireId(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map(WireId)
                    .map_err(|_| E::custom(format!("id {value} is negative")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .trim()
                    .parse::<u64>()
                    .map(WireId)
                    .map_err(|_| E::custom(format!("id '{value}' is not numeric")))
            }
        }

        deserializer.deserialize_any(WireIdVisitor)
    }
}

/// A value that may arrive as a single object or a list of objects.
///
/// Perl-side serializers collapse one-element lists into bare objects;
/// both shapes normalize to the same `Vec` via [`OneOrMany::into_vec`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A real JSON list.
    Many(Vec<T>),
    /// A bare object standing in for a one-element list.
    One(T),
}

impl<T> OneOrMany<T> {
    /// Normalizes to a list, preserving order.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// One dynamic field entry as the server exchanges it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDynamicField {
    /// Field name without the `DynamicField_` prefix.
    #[serde(rename = "Name")]
    pub name: String,
    /// Field value; responses may carry any scalar type here.
    #[serde(rename = "Value")]
    pub value: serde_json::Value,
}

/// Ticket attributes shared by create and update requests.
///
/// Only set fields are serialized. For entity references, an id field and
/// a name field coexist; callers populate at most one of each pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WireTicketBase {
    /// Ticket title.
    #[serde(rename = "Title", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Queue id.
    #[serde(rename = "QueueID", skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<u64>,
    /// Queue name.
    #[serde(rename = "Queue", skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    /// State id.
    #[serde(rename = "StateID", skip_serializing_if = "Option::is_none")]
    pub state_id: Option<u64>,
    /// State name.
    #[serde(rename = "State", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Priority id.
    #[serde(rename = "PriorityID", skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<u64>,
    /// Priority name.
    #[serde(rename = "Priority", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Type id.
    #[serde(rename = "TypeID", skip_serializing_if = "Option::is_none")]
    pub type_id: Option<u64>,
    /// Type name.
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,
    /// Owner id.
    #[serde(rename = "OwnerID", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u64>,
    /// Owner login.
    #[serde(rename = "Owner", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Lock id.
    #[serde(rename = "LockID", skip_serializing_if = "Option::is_none")]
    pub lock_id: Option<u64>,
    /// Lock name.
    #[serde(rename = "Lock", skip_serializing_if = "Option::is_none")]
    pub lock: Option<String>,
    /// Customer company id.
    #[serde(rename = "CustomerID", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Customer user login.
    #[serde(rename = "CustomerUser", skip_serializing_if = "Option::is_none")]
    pub customer_user: Option<String>,
}

impl WireTicketBase {
    /// True when no attribute is set and the record can be omitted.
    pub fn is_empty(&self) -> bool {
        *self == WireTicketBase::default()
    }
}

/// An article as the server exchanges it.
///
/// Requests only populate the address, subject, body, and content type;
/// the remaining fields are response-side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireArticle {
    /// Sender address.
    #[serde(rename = "From", skip_serializing_if = "Option::is_none")]
    pub from_addr: Option<String>,
    /// Recipient address.
    #[serde(rename = "To", skip_serializing_if = "Option::is_none")]
    pub to_addr: Option<String>,
    /// Subject line.
    #[serde(rename = "Subject", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Message body.
    #[serde(rename = "Body", skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// MIME content type.
    #[serde(rename = "ContentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Creation timestamp.
    #[serde(rename = "CreateTime", skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Modification timestamp.
    #[serde(rename = "ChangeTime", skip_serializing_if = "Option::is_none")]
    pub change_time: Option<String>,
    /// Server-assigned article id.
    #[serde(rename = "ArticleID", skip_serializing_if = "Option::is_none")]
    pub article_id: Option<WireId>,
    /// Position of the article within its ticket.
    #[serde(rename = "ArticleNumber", skip_serializing_if = "Option::is_none")]
    pub article_number: Option<WireId>,
}

/// A full ticket as returned by get, create, and update responses.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireTicketOutput {
    /// Ticket id.
    #[serde(rename = "TicketID")]
    pub ticket_id: Option<WireId>,
    /// Ticket number.
    #[serde(rename = "TicketNumber", default, deserialize_with = "lenient_string")]
    pub ticket_number: Option<String>,
    /// Title.
    #[serde(rename = "Title")]
    pub title: Option<String>,
    /// Queue name.
    #[serde(rename = "Queue")]
    pub queue: Option<String>,
    /// Queue id.
    #[serde(rename = "QueueID")]
    pub queue_id: Option<WireId>,
    /// State name.
    #[serde(rename = "State")]
    pub state: Option<String>,
    /// State id.
    #[serde(rename = "StateID")]
    pub state_id: Option<WireId>,
    /// Priority name.
    #[serde(rename = "Priority")]
    pub priority: Option<String>,
    /// Priority id.
    #[serde(rename = "PriorityID")]
    pub priority_id: Option<WireId>,
    /// Type name.
    #[serde(rename = "Type")]
    pub ticket_type: Option<String>,
    /// Type id.
    #[serde(rename = "TypeID")]
    pub type_id: Option<WireId>,
    /// Owner login.
    #[serde(rename = "Owner")]
    pub owner: Option<String>,
    /// Owner id.
    #[serde(rename = "OwnerID")]
    pub owner_id: Option<WireId>,
    /// Lock name.
    #[serde(rename = "Lock")]
    pub lock: Option<String>,
    /// Lock id.
    #[serde(rename = "LockID")]
    pub lock_id: Option<WireId>,
    /// Customer company id.
    #[serde(rename = "CustomerID", default, deserialize_with = "lenient_string")]
    pub customer_id: Option<String>,
    /// Customer user login.
    #[serde(rename = "CustomerUser")]
    pub customer_user: Option<String>,
    /// Creation timestamp.
    #[serde(rename = "Created")]
    pub created: Option<String>,
    /// Modification timestamp.
    #[serde(rename = "Changed")]
    pub changed: Option<String>,
    /// Dynamic field entries.
    #[serde(rename = "DynamicField")]
    pub dynamic_field: Option<Vec<WireDynamicField>>,
    /// Articles, as an object or a list.
    #[serde(rename = "Article")]
    pub article: Option<OneOrMany<WireArticle>>,
}

/// Request body for the create operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WireTicketCreateRequest {
    /// Ticket attributes.
    #[serde(rename = "Ticket", skip_serializing_if = "Option::is_none")]
    pub ticket: Option<WireTicketBase>,
    /// Initial article.
    #[serde(rename = "Article", skip_serializing_if = "Option::is_none")]
    pub article: Option<WireArticle>,
    /// Dynamic field values to set.
    #[serde(rename = "DynamicField", skip_serializing_if = "Option::is_none")]
    pub dynamic_field: Option<Vec<WireDynamicField>>,
}

/// Request body for the update operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WireTicketUpdateRequest {
    /// Id of the ticket to update.
    #[serde(rename = "TicketID", skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<u64>,
    /// Number of the ticket to update.
    #[serde(rename = "TicketNumber", skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<String>,
    /// Changed ticket attributes; omitted when nothing changes.
    #[serde(rename = "Ticket", skip_serializing_if = "Option::is_none")]
    pub ticket: Option<WireTicketBase>,
    /// Article to append.
    #[serde(rename = "Article", skip_serializing_if = "Option::is_none")]
    pub article: Option<WireArticle>,
    /// Dynamic field values to set.
    #[serde(rename = "DynamicField", skip_serializing_if = "Option::is_none")]
    pub dynamic_field: Option<Vec<WireDynamicField>>,
}

/// Request body for the get operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireTicketGetRequest {
    /// Id of the ticket to fetch.
    #[serde(rename = "TicketID", skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<u64>,
    /// Number of the ticket to fetch.
    #[serde(rename = "TicketNumber", skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<String>,
    /// Ask the server to include dynamic fields.
    #[serde(rename = "DynamicFields")]
    pub dynamic_fields: u8,
    /// Ask the server to include all articles.
    #[serde(rename = "AllArticles")]
    pub all_articles: u8,
}

impl Default for WireTicketGetRequest {
    fn default() -> Self {
        WireTicketGetRequest {
            ticket_id: None,
            ticket_number: None,
            dynamic_fields: 1,
            all_articles: 1,
        }
    }
}

/// Request body for the search operation.
///
/// List criteria are only serialized when non-empty; names and ids of the
/// same entity kind travel in separate fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WireTicketSearchRequest {
    /// Ticket numbers to match.
    #[serde(rename = "TicketNumber", skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<Vec<String>>,
    /// Titles to match.
    #[serde(rename = "Title", skip_serializing_if = "Option::is_none")]
    pub title: Option<Vec<String>>,
    /// Queue names to match.
    #[serde(rename = "Queues", skip_serializing_if = "Option::is_none")]
    pub queues: Option<Vec<String>>,
    /// Queue ids to match.
    #[serde(rename = "QueueIDs", skip_serializing_if = "Option::is_none")]
    pub queue_ids: Option<Vec<u64>>,
    /// State names to match.
    #[serde(rename = "States", skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<String>>,
    /// State ids to match.
    #[serde(rename = "StateIDs", skip_serializing_if = "Option::is_none")]
    pub state_ids: Option<Vec<u64>>,
    /// Priority names to match.
    #[serde(rename = "Priorities", skip_serializing_if = "Option::is_none")]
    pub priorities: Option<Vec<String>>,
    /// Priority ids to match.
    #[serde(rename = "PriorityIDs", skip_serializing_if = "Option::is_none")]
    pub priority_ids: Option<Vec<u64>>,
    /// Type names to match.
    #[serde(rename = "Types", skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    /// Type ids to match.
    #[serde(rename = "TypeIDs", skip_serializing_if = "Option::is_none")]
    pub type_ids: Option<Vec<u64>>,
    /// Customer company ids to match.
    #[serde(rename = "CustomerID", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Vec<String>>,
    /// Customer user logins to match.
    #[serde(rename = "CustomerUserLogin", skip_serializing_if = "Option::is_none")]
    pub customer_user_login: Option<Vec<String>>,
    /// Include tickets from sub-queues (0 or 1).
    #[serde(rename = "UseSubQueues")]
    pub use_sub_queues: u8,
    /// Cap on the number of returned ids.
    #[serde(rename = "Limit", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Response body for the create and update operations.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireTicketResponse {
    /// Id of the affected ticket.
    #[serde(rename = "TicketID")]
    pub ticket_id: Option<WireId>,
    /// Number of the affected ticket.
    #[serde(rename = "TicketNumber", default, deserialize_with = "lenient_string")]
    pub ticket_number: Option<String>,
    /// Id of the article created alongside, if any.
    #[serde(rename = "ArticleID")]
    pub article_id: Option<WireId>,
    /// The resulting ticket, when the instance echoes it back.
    #[serde(rename = "Ticket")]
    pub ticket: Option<WireTicketOutput>,
}

/// Response body for the get operation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireTicketGetResponse {
    /// The fetched tickets; a lookup by id yields exactly one.
    #[serde(rename = "Ticket")]
    pub ticket: Option<Vec<WireTicketOutput>>,
}

/// Response body for the search operation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireTicketSearchResponse {
    /// Matching ticket ids.
    #[serde(rename = "TicketID")]
    pub ticket_id: Option<Vec<WireId>>,
}

/// Deserializes an optional value that can be a string or an integer into
/// `Option<String>`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientStringVisitor;

    impl<'de> Visitor<'de> for LenientStringVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("null, a string, or an integer")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(LenientStringVisitor)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }
    }

    deserializer.deserialize_any(LenientStringVisitor)
}
