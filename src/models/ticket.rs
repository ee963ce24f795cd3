//! Domain model for tickets, articles, and search criteria.
//!
//! These types use stable names and strong typing; the loosely typed JSON
//! shapes of the generic interface live in [`crate::models::wire`] and the
//! translation between the two in [`crate::mapper`].

use indexmap::IndexMap;

use crate::error::OtoboError;

/// A reference to a named entity such as a queue, state, or priority.
///
/// The generic interface accepts either a numeric id or a display name for
/// these entities. At least one of the two must be present; when both are
/// set, the id takes precedence on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdName {
    id: Option<u64>,
    name: Option<String>,
}

impl IdName {
    /// Creates a reference from a numeric id.
    pub fn by_id(id: u64) -> Self {
        IdName {
            id: Some(id),
            name: None,
        }
    }

    /// Creates a reference from a display name.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::Validation` if the name is blank.
    pub fn by_name(name: impl Into<String>) -> Result<Self, OtoboError> {
        Self::new(None, Some(name.into()))
    }

    /// Creates a reference from an optional id and an optional name.
    ///
    /// Names are trimmed; a blank name counts as absent.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::Validation` when neither an id nor a usable
    /// name is present.
    pub fn new(id: Option<u64>, name: Option<String>) -> Result<Self, OtoboError> {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if id.is_none() && name.is_none() {
            return Err(OtoboError::validation(
                "entity reference needs an id or a non-empty name",
            ));
        }
        Ok(IdName { id, name })
    }

    /// Returns the numeric id, if set.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Returns the display name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// A single communication entry attached to a ticket.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Article {
    /// Sender address.
    pub from_addr: Option<String>,
    /// Recipient address.
    pub to_addr: Option<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Message body.
    pub body: Option<String>,
    /// MIME content type of the body.
    pub content_type: Option<String>,
    /// Server-side creation timestamp, as reported by the instance.
    pub created_at: Option<String>,
    /// Server-side modification timestamp.
    pub changed_at: Option<String>,
    /// Server-assigned article id.
    pub article_id: Option<u64>,
    /// Position of the article within its ticket.
    pub article_number: Option<u64>,
}

impl Article {
    /// Creates an empty article.
    pub fn new() -> Self {
        Article::default()
    }

    /// Creates a plain-text article with the instance's default charset.
    pub fn plain_text(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Article {
            subject: Some(subject.into()),
            body: Some(body.into()),
            content_type: Some("text/plain; charset=utf-8".to_string()),
            ..Article::default()
        }
    }

    /// Sets the sender address.
    #[must_use]
    pub fn with_from(mut self, from_addr: impl Into<String>) -> Self {
        self.from_addr = Some(from_addr.into());
        self
    }

    /// Sets the recipient address.
    #[must_use]
    pub fn with_to(mut self, to_addr: impl Into<String>) -> Self {
        self.to_addr = Some(to_addr.into());
        self
    }

    /// Sets the subject line.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the message body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the MIME content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A ticket as reported by the server.
///
/// Fields the server did not send are `None` (or empty for collections);
/// responses are decoded leniently, so partial tickets are possible when
/// an instance returns unexpected shapes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ticket {
    /// Server-assigned ticket id.
    pub id: u64,
    /// Human-facing ticket number.
    pub number: String,
    /// Ticket title.
    pub title: Option<String>,
    /// Queue the ticket lives in.
    pub queue: Option<IdName>,
    /// Current state.
    pub state: Option<IdName>,
    /// Priority.
    pub priority: Option<IdName>,
    /// Ticket type.
    pub ticket_type: Option<IdName>,
    /// Owning agent.
    pub owner: Option<IdName>,
    /// Lock state.
    pub lock: Option<IdName>,
    /// Customer company id.
    pub customer_id: Option<String>,
    /// Customer user login.
    pub customer_user: Option<String>,
    /// Server-side creation timestamp.
    pub created_at: Option<String>,
    /// Server-side modification timestamp.
    pub changed_at: Option<String>,
    /// Dynamic field values, in the order the server listed them.
    pub dynamic_fields: IndexMap<String, String>,
    /// Articles, in the order the server listed them.
    pub articles: Vec<Article>,
}

impl Ticket {
    /// Returns the queue name, if the server reported one.
    pub fn queue_name(&self) -> Option<&str> {
        self.queue.as_ref().and_then(IdName::name)
    }

    /// Returns the state name, if the server reported one.
    pub fn state_name(&self) -> Option<&str> {
        self.state.as_ref().and_then(IdName::name)
    }

    /// Returns the priority name, if the server reported one.
    pub fn priority_name(&self) -> Option<&str> {
        self.priority.as_ref().and_then(IdName::name)
    }

    /// Returns the value of a dynamic field, if present.
    pub fn dynamic_field(&self, name: &str) -> Option<&str> {
        self.dynamic_fields.get(name).map(String::as_str)
    }
}

/// Payload for creating a ticket.
///
/// A title is always required; everything else is optional and omitted
/// from the request when unset. Instances fall back to their configured
/// defaults for omitted fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketCreate {
    /// Ticket title.
    pub title: String,
    /// Target queue.
    pub queue: Option<IdName>,
    /// Initial state.
    pub state: Option<IdName>,
    /// Priority.
    pub priority: Option<IdName>,
    /// Ticket type.
    pub ticket_type: Option<IdName>,
    /// Owning agent.
    pub owner: Option<IdName>,
    /// Lock state.
    pub lock: Option<IdName>,
    /// Customer company id.
    pub customer_id: Option<String>,
    /// Customer user login.
    pub customer_user: Option<String>,
    /// Dynamic field values to set.
    pub dynamic_fields: IndexMap<String, String>,
    /// The initial article. Most instances require one.
    pub article: Option<Article>,
}

impl TicketCreate {
    /// Creates a payload with the given title and nothing else set.
    pub fn new(title: impl Into<String>) -> Self {
        TicketCreate {
            title: title.into(),
            queue: None,
            state: None,
            priority: None,
            ticket_type: None,
            owner: None,
            lock: None,
            customer_id: None,
            customer_user: None,
            dynamic_fields: IndexMap::new(),
            article: None,
        }
    }

    /// Sets the target queue.
    #[must_use]
    pub fn with_queue(mut self, queue: IdName) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Sets the initial state.
    #[must_use]
    pub fn with_state(mut self, state: IdName) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: IdName) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the ticket type.
    #[must_use]
    pub fn with_type(mut self, ticket_type: IdName) -> Self {
        self.ticket_type = Some(ticket_type);
        self
    }

    /// Sets the owning agent.
    #[must_use]
    pub fn with_owner(mut self, owner: IdName) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Sets the lock state.
    #[must_use]
    pub fn with_lock(mut self, lock: IdName) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Sets the customer company id.
    #[must_use]
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Sets the customer user login.
    #[must_use]
    pub fn with_customer_user(mut self, customer_user: impl Into<String>) -> Self {
        self.customer_user = Some(customer_user.into());
        self
    }

    /// Sets a dynamic field value. Repeated names keep the last value.
    #[must_use]
    pub fn with_dynamic_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dynamic_fields.insert(name.into(), value.into());
        self
    }

    /// Sets the initial article.
    #[must_use]
    pub fn with_article(mut self, article: Article) -> Self {
        self.article = Some(article);
        self
    }
}

/// Payload for partially updating a ticket.
///
/// The target is identified by id and/or number; only set fields are sent,
/// everything else stays untouched on the server.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TicketUpdate {
    /// Id of the ticket to update.
    pub id: Option<u64>,
    /// Number of the ticket to update.
    pub number: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New queue.
    pub queue: Option<IdName>,
    /// New state.
    pub state: Option<IdName>,
    /// New priority.
    pub priority: Option<IdName>,
    /// New ticket type.
    pub ticket_type: Option<IdName>,
    /// New owning agent.
    pub owner: Option<IdName>,
    /// New lock state.
    pub lock: Option<IdName>,
    /// New customer company id.
    pub customer_id: Option<String>,
    /// New customer user login.
    pub customer_user: Option<String>,
    /// Dynamic field values to set.
    pub dynamic_fields: IndexMap<String, String>,
    /// An article to append.
    pub article: Option<Article>,
}

impl TicketUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        TicketUpdate::default()
    }

    /// Targets the ticket with the given id.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Targets the ticket with the given number.
    #[must_use]
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Sets a new title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Moves the ticket to a queue.
    #[must_use]
    pub fn with_queue(mut self, queue: IdName) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Sets a new state.
    #[must_use]
    pub fn with_state(mut self, state: IdName) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets a new priority.
    #[must_use]
    pub fn with_priority(mut self, priority: IdName) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets a new ticket type.
    #[must_use]
    pub fn with_type(mut self, ticket_type: IdName) -> Self {
        self.ticket_type = Some(ticket_type);
        self
    }

    /// Assigns a new owning agent.
    #[must_use]
    pub fn with_owner(mut self, owner: IdName) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Sets a new lock state.
    #[must_use]
    pub fn with_lock(mut self, lock: IdName) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Sets a new customer company id.
    #[must_use]
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Sets a new customer user login.
    #[must_use]
    pub fn with_customer_user(mut self, customer_user: impl Into<String>) -> Self {
        self.customer_user = Some(customer_user.into());
        self
    }

    /// Sets a dynamic field value. Repeated names keep the last value.
    #[must_use]
    pub fn with_dynamic_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dynamic_fields.insert(name.into(), value.into());
        self
    }

    /// Appends an article to the ticket.
    #[must_use]
    pub fn with_article(mut self, article: Article) -> Self {
        self.article = Some(article);
        self
    }
}

/// Filter criteria for a ticket search.
///
/// Every list is a disjunction (any match qualifies); the lists themselves
/// combine conjunctively. Empty lists are not sent at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TicketSearch {
    /// Match any of these ticket numbers.
    pub numbers: Vec<String>,
    /// Match any of these titles.
    pub titles: Vec<String>,
    /// Match tickets in any of these queues.
    pub queues: Vec<IdName>,
    /// Match tickets in any of these states.
    pub states: Vec<IdName>,
    /// Match tickets with any of these priorities.
    pub priorities: Vec<IdName>,
    /// Match tickets of any of these types.
    pub types: Vec<IdName>,
    /// Match any of these customer company ids.
    pub customer_ids: Vec<String>,
    /// Match any of these customer user logins.
    pub customer_users: Vec<String>,
    /// Include tickets from sub-queues of the listed queues.
    pub use_sub_queues: bool,
    /// Cap on the number of ids the server returns.
    pub limit: Option<u32>,
}

impl TicketSearch {
    /// Creates an empty search matching everything.
    pub fn new() -> Self {
        TicketSearch::default()
    }

    /// Adds a ticket number criterion.
    #[must_use]
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.numbers.push(number.into());
        self
    }

    /// Adds a title criterion.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.titles.push(title.into());
        self
    }

    /// Adds a queue criterion.
    #[must_use]
    pub fn with_queue(mut self, queue: IdName) -> Self {
        self.queues.push(queue);
        self
    }

    /// Adds a state criterion.
    #[must_use]
    pub fn with_state(mut self, state: IdName) -> Self {
        self.states.push(state);
        self
    }

    /// Adds a priority criterion.
    #[must_use]
    pub fn with_priority(mut self, priority: IdName) -> Self {
        self.priorities.push(priority);
        self
    }

    /// Adds a ticket type criterion.
    #[must_use]
    pub fn with_type(mut self, ticket_type: IdName) -> Self {
        self.types.push(ticket_type);
        self
    }

    /// Adds a customer company id criterion.
    #[must_use]
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_ids.push(customer_id.into());
        self
    }

    /// Adds a customer user login criterion.
    #[must_use]
    pub fn with_customer_user(mut self, customer_user: impl Into<String>) -> Self {
        self.customer_users.push(customer_user.into());
        self
    }

    /// Includes tickets from sub-queues of the listed queues.
    #[must_use]
    pub fn with_sub_queues(mut self) -> Self {
        self.use_sub_queues = true;
        self
    }

    /// Caps the number of ids the server returns.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
