//! Translation between the domain model and wire records.
//!
//! All functions in here are pure. Requests serialize only what the caller
//! set; responses are absorbed without failing, missing ids fall back to
//! zero and unknown dynamic field scalars are coerced to strings.
//!
//! For entity references carrying both an id and a name, the id wins and
//! the name is dropped from the request. Sending both would let the server
//! resolve them independently and disagree.

use indexmap::IndexMap;

use crate::models::wire::{
    OneOrMany, WireArticle, WireDynamicField, WireId, WireTicketBase, WireTicketCreateRequest,
    WireTicketOutput, WireTicketSearchRequest, WireTicketUpdateRequest,
};
use crate::models::{Article, IdName, Ticket, TicketCreate, TicketSearch, TicketUpdate};

/// Builds the create request body for a ticket payload.
pub fn ticket_create_to_wire(create: &TicketCreate) -> WireTicketCreateRequest {
    let (queue_id, queue) = entity_to_wire(&create.queue);
    let (state_id, state) = entity_to_wire(&create.state);
    let (priority_id, priority) = entity_to_wire(&create.priority);
    let (type_id, ticket_type) = entity_to_wire(&create.ticket_type);
    let (owner_id, owner) = entity_to_wire(&create.owner);
    let (lock_id, lock) = entity_to_wire(&create.lock);

    WireTicketCreateRequest {
        ticket: Some(WireTicketBase {
            title: Some(create.title.clone()),
            queue_id,
            queue,
            state_id,
            state,
            priority_id,
            priority,
            type_id,
            ticket_type,
            owner_id,
            owner,
            lock_id,
            lock,
            customer_id: create.customer_id.clone(),
            customer_user: create.customer_user.clone(),
        }),
        article: create.article.as_ref().map(article_to_wire),
        dynamic_field: dynamic_fields_to_wire(&create.dynamic_fields),
    }
}

/// Builds the update request body for a partial update.
///
/// The `Ticket` sub-object is omitted entirely when no base attribute
/// changed, leaving only the target id/number and any article or dynamic
/// field payloads.
pub fn ticket_update_to_wire(update: &TicketUpdate) -> WireTicketUpdateRequest {
    let (queue_id, queue) = entity_to_wire(&update.queue);
    let (state_id, state) = entity_to_wire(&update.state);
    let (priority_id, priority) = entity_to_wire(&update.priority);
    let (type_id, ticket_type) = entity_to_wire(&update.ticket_type);
    let (owner_id, owner) = entity_to_wire(&update.owner);
    let (lock_id, lock) = entity_to_wire(&update.lock);

    let base = WireTicketBase {
        title: update.title.clone(),
        queue_id,
        queue,
        state_id,
        state,
        priority_id,
        priority,
        type_id,
        ticket_type,
        owner_id,
        owner,
        lock_id,
        lock,
        customer_id: update.customer_id.clone(),
        customer_user: update.customer_user.clone(),
    };

    WireTicketUpdateRequest {
        ticket_id: update.id,
        ticket_number: update.number.clone(),
        ticket: (!base.is_empty()).then_some(base),
        article: update.article.as_ref().map(article_to_wire),
        dynamic_field: dynamic_fields_to_wire(&update.dynamic_fields),
    }
}

/// Builds the search request body for a set of filter criteria.
pub fn ticket_search_to_wire(search: &TicketSearch) -> WireTicketSearchRequest {
    let (queue_ids, queues) = split_id_names(&search.queues);
    let (state_ids, states) = split_id_names(&search.states);
    let (priority_ids, priorities) = split_id_names(&search.priorities);
    let (type_ids, types) = split_id_names(&search.types);

    WireTicketSearchRequest {
        ticket_number: non_empty(search.numbers.clone()),
        title: non_empty(search.titles.clone()),
        queues,
        queue_ids,
        states,
        state_ids,
        priorities,
        priority_ids,
        types,
        type_ids,
        customer_id: non_empty(search.customer_ids.clone()),
        customer_user_login: non_empty(search.customer_users.clone()),
        use_sub_queues: u8::from(search.use_sub_queues),
        limit: search.limit,
    }
}

/// Turns a wire ticket into the domain model.
///
/// Missing ids fall back to zero rather than failing; the client layer
/// decides whether a response without ticket data is acceptable.
pub fn ticket_from_wire(wire: WireTicketOutput) -> Ticket {
    let articles = wire
        .article
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(article_from_wire)
        .collect();

    Ticket {
        id: wire.ticket_id.map(|id| id.0).unwrap_or_default(),
        number: wire.ticket_number.unwrap_or_default(),
        title: wire.title,
        queue: entity_from_wire(wire.queue_id, wire.queue),
        state: entity_from_wire(wire.state_id, wire.state),
        priority: entity_from_wire(wire.priority_id, wire.priority),
        ticket_type: entity_from_wire(wire.type_id, wire.ticket_type),
        owner: entity_from_wire(wire.owner_id, wire.owner),
        lock: entity_from_wire(wire.lock_id, wire.lock),
        customer_id: wire.customer_id,
        customer_user: wire.customer_user,
        created_at: wire.created,
        changed_at: wire.changed,
        dynamic_fields: dynamic_fields_from_wire(wire.dynamic_field),
        articles,
    }
}

/// Splits an entity reference into its wire id/name pair, id first.
fn entity_to_wire(entity: &Option<IdName>) -> (Option<u64>, Option<String>) {
    match entity {
        Some(entity) => match entity.id() {
            Some(id) => (Some(id), None),
            None => (None, entity.name().map(str::to_string)),
        },
        None => (None, None),
    }
}

/// Rebuilds an entity reference from a wire id/name pair.
fn entity_from_wire(id: Option<WireId>, name: Option<String>) -> Option<IdName> {
    let id = id.map(|wire_id| wire_id.0);
    if id.is_none() && name.is_none() {
        return None;
    }
    IdName::new(id, name).ok()
}

/// Splits search criteria into id and name lists, by what each entry has.
fn split_id_names(entities: &[IdName]) -> (Option<Vec<u64>>, Option<Vec<String>>) {
    let mut ids = Vec::new();
    let mut names = Vec::new();
    for entity in entities {
        match entity.id() {
            Some(id) => ids.push(id),
            None => {
                if let Some(name) = entity.name() {
                    names.push(name.to_string());
                }
            }
        }
    }
    (non_empty(ids), non_empty(names))
}

/// Wraps a list in `Some` only when it has entries, so optional request
/// fields drop out of the body instead of serializing as `[]`.
fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    (!values.is_empty()).then_some(values)
}

fn article_to_wire(article: &Article) -> WireArticle {
    WireArticle {
        from_addr: article.from_addr.clone(),
        to_addr: article.to_addr.clone(),
        subject: article.subject.clone(),
        body: article.body.clone(),
        content_type: article.content_type.clone(),
        ..WireArticle::default()
    }
}

fn article_from_wire(wire: WireArticle) -> Article {
    Article {
        from_addr: wire.from_addr,
        to_addr: wire.to_addr,
        subject: wire.subject,
        body: wire.body,
        content_type: wire.content_type,
        created_at: wire.create_time,
        changed_at: wire.change_time,
        article_id: wire.article_id.map(|id| id.0),
        article_number: wire.article_number.map(|id| id.0),
    }
}

fn dynamic_fields_to_wire(fields: &IndexMap<String, String>) -> Option<Vec<WireDynamicField>> {
    let entries: Vec<WireDynamicField> = fields
        .iter()
        .map(|(name, value)| WireDynamicField {
            name: name.clone(),
            value: serde_json::Value::String(value.clone()),
        })
        .collect();
    non_empty(entries)
}

/// Collects dynamic field entries into a map, keeping the entry order.
/// Repeated names keep the first position and the last value.
fn dynamic_fields_from_wire(fields: Option<Vec<WireDynamicField>>) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for field in fields.unwrap_or_default() {
        map.insert(field.name, scalar_to_string(&field.value));
    }
    map
}

/// Renders a dynamic field scalar as a string.
///
/// Strings pass through, null becomes empty, and everything else is
/// rendered as compact JSON.
fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_create_round_trip_preserves_fields() {
        let create = TicketCreate::new("Printer broken")
            .with_queue(IdName::by_name("Raw").unwrap())
            .with_state(IdName::by_name("new").unwrap())
            .with_priority(IdName::by_name("3 normal").unwrap())
            .with_type(IdName::by_name("Incident").unwrap())
            .with_customer_user("customer@example.com")
            .with_dynamic_field("Device", "printer-7")
            .with_article(Article::plain_text("Printer broken", "Paper jam in tray 2"));

        let request = ticket_create_to_wire(&create);
        let base = request.ticket.as_ref().unwrap();
        assert_eq!(base.title.as_deref(), Some("Printer broken"));
        assert_eq!(base.queue.as_deref(), Some("Raw"));
        assert_eq!(base.state.as_deref(), Some("new"));
        assert_eq!(base.priority.as_deref(), Some("3 normal"));
        assert_eq!(base.ticket_type.as_deref(), Some("Incident"));
        assert_eq!(base.type_id, None);
        assert_eq!(base.customer_user.as_deref(), Some("customer@example.com"));

        // Synthesize the server's echo of the same ticket.
        let echoed: WireTicketOutput = serde_json::from_value(json!({
            "TicketID": 901,
            "TicketNumber": "2024012210000011",
            "Title": "Printer broken",
            "Queue": "Raw",
            "QueueID": 2,
            "State": "new",
            "StateID": 1,
            "Priority": "3 normal",
            "PriorityID": 3,
            "Type": "Incident",
            "TypeID": 5,
            "CustomerUser": "customer@example.com",
            "DynamicField": [{"Name": "Device", "Value": "printer-7"}],
            "Article": [{"Subject": "Printer broken", "Body": "Paper jam in tray 2"}],
        }))
        .unwrap();

        let ticket = ticket_from_wire(echoed);
        assert_eq!(ticket.id, 901);
        assert_eq!(ticket.title.as_deref(), Some("Printer broken"));
        assert_eq!(ticket.queue_name(), Some("Raw"));
        assert_eq!(ticket.state_name(), Some("new"));
        assert_eq!(ticket.priority_name(), Some("3 normal"));
        let ticket_type = ticket.ticket_type.as_ref().unwrap();
        assert_eq!(ticket_type.id(), Some(5));
        assert_eq!(ticket_type.name(), Some("Incident"));
        assert_eq!(ticket.customer_user.as_deref(), Some("customer@example.com"));
        assert_eq!(ticket.dynamic_field("Device"), Some("printer-7"));
        assert_eq!(ticket.articles.len(), 1);
        assert_eq!(ticket.articles[0].body.as_deref(), Some("Paper jam in tray 2"));
    }

    #[test]
    fn test_update_with_title_only_omits_untouched_fields() {
        let update = TicketUpdate::new()
            .with_id(55)
            .with_number("2024012210000011")
            .with_title("New title");

        let value = serde_json::to_value(ticket_update_to_wire(&update)).unwrap();
        assert_eq!(value["TicketID"], json!(55));
        assert_eq!(value["TicketNumber"], json!("2024012210000011"));
        assert_eq!(value["Ticket"], json!({"Title": "New title"}));

        let base = value["Ticket"].as_object().unwrap();
        for key in ["Queue", "QueueID", "State", "StateID", "Priority", "Type"] {
            assert!(!base.contains_key(key), "unexpected key {key}");
        }
    }

    #[test]
    fn test_update_without_base_changes_omits_ticket_object() {
        let update = TicketUpdate::new()
            .with_id(55)
            .with_article(Article::plain_text("Follow-up", "Still broken"));
        let request = ticket_update_to_wire(&update);
        assert_eq!(request.ticket, None);
        assert!(request.article.is_some());
    }

    #[test]
    fn test_entity_pair_prefers_id_on_the_wire() {
        let create =
            TicketCreate::new("t").with_queue(IdName::new(Some(3), Some("Junk".into())).unwrap());
        let base = ticket_create_to_wire(&create).ticket.unwrap();
        assert_eq!(base.queue_id, Some(3));
        assert_eq!(base.queue, None);
    }

    #[test]
    fn test_split_id_names_routes_by_id_presence() {
        let entities = vec![
            IdName::by_id(7),
            IdName::by_name("Raw").unwrap(),
            IdName::new(Some(3), Some("Junk".into())).unwrap(),
        ];
        let (ids, names) = split_id_names(&entities);
        assert_eq!(ids, Some(vec![7, 3]));
        assert_eq!(names, Some(vec!["Raw".to_string()]));

        let (no_ids, no_names) = split_id_names(&[]);
        assert_eq!(no_ids, None);
        assert_eq!(no_names, None);
    }

    #[test]
    fn test_search_to_wire_skips_empty_lists() {
        let search = TicketSearch::new()
            .with_queue(IdName::by_name("Raw").unwrap())
            .with_sub_queues();
        let value = serde_json::to_value(ticket_search_to_wire(&search)).unwrap();
        assert_eq!(value, json!({"Queues": ["Raw"], "UseSubQueues": 1}));
    }

    #[test]
    fn test_non_empty_wraps_only_populated_lists() {
        assert_eq!(non_empty(Vec::<u64>::new()), None);
        assert_eq!(non_empty(vec![1, 2]), Some(vec![1, 2]));
    }

    #[test]
    fn test_dynamic_fields_last_value_wins_first_position_kept() {
        let fields = vec![
            WireDynamicField { name: "Device".into(), value: json!("a") },
            WireDynamicField { name: "Location".into(), value: json!("basement") },
            WireDynamicField { name: "Device".into(), value: json!("b") },
        ];
        let map = dynamic_fields_from_wire(Some(fields));
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Device", "Location"]);
        assert_eq!(map.get("Device").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_dynamic_field_scalars_coerce_to_strings() {
        assert_eq!(scalar_to_string(&json!("plain")), "plain");
        assert_eq!(scalar_to_string(&json!(42)), "42");
        assert_eq!(scalar_to_string(&json!(true)), "true");
        assert_eq!(scalar_to_string(&json!(null)), "");
        assert_eq!(scalar_to_string(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_single_article_object_normalizes_to_one_element() {
        let wire: WireTicketOutput = serde_json::from_value(json!({
            "TicketID": 1,
            "Article": {"Subject": "only one"},
        }))
        .unwrap();
        let ticket = ticket_from_wire(wire);
        assert_eq!(ticket.articles.len(), 1);
        assert_eq!(ticket.articles[0].subject.as_deref(), Some("only one"));
    }

    #[test]
    fn test_ticket_from_wire_defaults_missing_identity() {
        let ticket = ticket_from_wire(WireTicketOutput::default());
        assert_eq!(ticket.id, 0);
        assert_eq!(ticket.number, "");
        assert_eq!(ticket.queue, None);
        assert!(ticket.articles.is_empty());
    }
}
