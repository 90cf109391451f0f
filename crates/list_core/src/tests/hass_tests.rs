use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct StubState {
    lists: Arc<Mutex<Value>>,
    service_calls: Arc<Mutex<Vec<(String, String, Value)>>>,
    authorizations: Arc<Mutex<Vec<Option<String>>>>,
    reject_services: Arc<Mutex<bool>>,
}

async fn stub_entity_state(
    State(state): State<StubState>,
    Path(entity_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    state.authorizations.lock().await.push(
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    );
    if entity_id == "sensor.cozi_broken" {
        return Ok(Json(json!(["not", "an", "entity"])));
    }
    if entity_id != "sensor.cozi_lists" {
        return Err(StatusCode::NOT_FOUND);
    }
    let lists = state.lists.lock().await.clone();
    Ok(Json(json!({
        "entity_id": entity_id,
        "state": "2",
        "attributes": { "lists": lists, "friendly_name": "Cozi Lists" },
    })))
}

async fn stub_service_call(
    State(state): State<StubState>,
    Path((domain, service)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> StatusCode {
    state
        .service_calls
        .lock()
        .await
        .push((domain, service, body));
    if *state.reject_services.lock().await {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    }
}

async fn spawn_hass_stub() -> Result<(String, StubState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = StubState {
        lists: Arc::new(Mutex::new(json!([
            {
                "listId": "g",
                "title": "Groceries",
                "listType": "shopping",
                "items": [
                    { "itemId": "1", "text": "Milk", "status": "incomplete", "itemType": null, "itemPos": 0 },
                    { "itemId": "2", "text": "Eggs", "status": "complete", "itemType": null, "itemPos": 1 },
                ],
            },
            { "listId": "t", "title": "Chores", "listType": "todo", "items": [] },
        ]))),
        service_calls: Arc::new(Mutex::new(Vec::new())),
        authorizations: Arc::new(Mutex::new(Vec::new())),
        reject_services: Arc::new(Mutex::new(false)),
    };
    let app = Router::new()
        .route("/api/states/:entity_id", get(stub_entity_state))
        .route("/api/services/:domain/:service", post(stub_service_call))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn groceries() -> ListSummary {
    ListSummary {
        list_id: ListId::from("g"),
        title: "Groceries".into(),
        list_type: ListType::Shopping,
        items: Vec::new(),
    }
}

#[tokio::test]
async fn reads_lists_sensor_with_bearer_token() {
    let (server_url, server_state) = spawn_hass_stub().await.expect("spawn stub");
    let gateway = HassGateway::new(&server_url, Some("secret".into())).expect("gateway");

    let host = gateway.host_state().await.expect("host state").expect("sensor");
    let lists = host
        .entity("sensor.cozi_lists")
        .expect("entity")
        .lists()
        .expect("lists");
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[1].list_type, ListType::Todo);
    assert_eq!(
        server_state.authorizations.lock().await.as_slice(),
        &[Some("Bearer secret".to_string())]
    );
}

#[tokio::test]
async fn missing_sensor_reads_as_no_host_state() {
    let (server_url, _server_state) = spawn_hass_stub().await.expect("spawn stub");
    let settings = Settings {
        base_url: server_url,
        sensor_entity: "sensor.not_there".into(),
        ..Settings::default()
    };
    let gateway = HassGateway::from_settings(&settings).expect("gateway");

    assert!(gateway.host_state().await.expect("host state").is_none());
}

#[tokio::test]
async fn malformed_entity_body_is_a_host_state_error() {
    let (server_url, _server_state) = spawn_hass_stub().await.expect("spawn stub");
    let settings = Settings {
        base_url: server_url,
        sensor_entity: "sensor.cozi_broken".into(),
        ..Settings::default()
    };
    let gateway = HassGateway::from_settings(&settings).expect("gateway");

    let err = gateway.host_state().await.expect_err("malformed entity");
    assert!(matches!(
        err.downcast_ref::<HostStateError>(),
        Some(HostStateError::MalformedEntity(_))
    ));
}

#[tokio::test]
async fn fetch_returns_list_items_in_order() {
    let (server_url, _server_state) = spawn_hass_stub().await.expect("spawn stub");
    let gateway = HassGateway::new(&server_url, None).expect("gateway");

    let items = gateway.fetch(&groceries()).await.expect("fetch");
    let ids: Vec<&str> = items.keys().map(ItemId::as_str).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(items[&ItemId::from("2")].status);
    assert!(!items[&ItemId::from("1")].status);
}

#[tokio::test]
async fn fetch_of_unpublished_list_fails() {
    let (server_url, _server_state) = spawn_hass_stub().await.expect("spawn stub");
    let gateway = HassGateway::new(&server_url, None).expect("gateway");
    let mut gone = groceries();
    gone.list_id = ListId::from("deleted");

    assert!(gateway.fetch(&gone).await.is_err());
}

#[tokio::test]
async fn mutations_post_service_payloads() {
    let (server_url, server_state) = spawn_hass_stub().await.expect("spawn stub");
    let gateway = HassGateway::new(&server_url, None).expect("gateway");
    let list_id = ListId::from("g");

    gateway.add(&list_id, "Bread", 4).await.expect("add");
    gateway
        .mark(&list_id, &ItemId::from("1"), MarkStatus::Complete)
        .await
        .expect("mark");
    gateway
        .clear(&list_id, &[ItemId::from("2")])
        .await
        .expect("clear");
    gateway
        .reorder(&list_id, "Groceries", &["{}".to_string()], ListType::Shopping)
        .await
        .expect("reorder");
    gateway
        .create_list("Hardware", ListType::Todo)
        .await
        .expect("create list");
    gateway.refresh_all().await.expect("refresh");

    let calls = server_state.service_calls.lock().await.clone();
    let services: Vec<&str> = calls.iter().map(|(_, service, _)| service.as_str()).collect();
    assert_eq!(
        services,
        vec![
            "add_item",
            "mark_item",
            "remove_items",
            "reorder_items",
            "add_list",
            "refresh"
        ]
    );
    assert!(calls.iter().all(|(domain, _, _)| domain == "cozi"));
    assert_eq!(
        calls[0].2,
        json!({"list_id": "g", "item_text": "Bread", "item_pos": 4})
    );
    assert_eq!(
        calls[1].2,
        json!({"list_id": "g", "item_id": "1", "status": "complete"})
    );
    assert_eq!(calls[2].2, json!({"list_id": "g", "item_ids": ["2"]}));
    assert_eq!(
        calls[3].2,
        json!({
            "list_id": "g",
            "list_title": "Groceries",
            "items_list": ["{}"],
            "list_type": "shopping",
        })
    );
    assert_eq!(
        calls[4].2,
        json!({"list_title": "Hardware", "list_type": "todo"})
    );
    assert_eq!(calls[5].2, json!({}));
}

#[tokio::test]
async fn rejected_service_call_surfaces_gateway_exception() {
    let (server_url, server_state) = spawn_hass_stub().await.expect("spawn stub");
    *server_state.reject_services.lock().await = true;
    let gateway = HassGateway::new(&server_url, None).expect("gateway");

    let err = gateway
        .edit(&ListId::from("g"), &ItemId::from("1"), "Oat milk")
        .await
        .expect_err("rejected");
    let exception = err
        .downcast_ref::<GatewayException>()
        .expect("gateway exception");
    assert_eq!(exception.service, "edit_item");
    assert_eq!(exception.code, ErrorCode::Validation);
}

#[tokio::test]
async fn coordinator_round_trip_against_stub() {
    let (server_url, server_state) = spawn_hass_stub().await.expect("spawn stub");
    let gateway = Arc::new(HassGateway::new(&server_url, None).expect("gateway"));
    let coordinator = crate::MutationCoordinator::new(gateway);
    coordinator.reload_directory().await;

    assert_eq!(coordinator.clear_completed().await, crate::Outcome::Committed);

    let calls = server_state.service_calls.lock().await.clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, "remove_items");
    assert_eq!(calls[0].2["item_ids"], json!(["2"]));
}

#[test]
fn rejects_unparseable_base_url() {
    assert!(HassGateway::new("not a url", None).is_err());
}
