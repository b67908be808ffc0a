use std::sync::Arc;

use super::*;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{patch, post},
    Json, Router,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(String, Value, Option<String>)>>>,
}

async fn create(
    State(state): State<Captured>,
    Path(channel_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .requests
        .lock()
        .await
        .push((format!("create {channel_id}"), body, auth));
    Json(json!({ "id": 777 }))
}

async fn edit(
    State(state): State<Captured>,
    Path((channel_id, message_id)): Path<(i64, i64)>,
    Json(body): Json<Value>,
) -> StatusCode {
    if message_id == 404 {
        return StatusCode::NOT_FOUND;
    }
    state
        .requests
        .lock()
        .await
        .push((format!("edit {channel_id}/{message_id}"), body, None));
    StatusCode::NO_CONTENT
}

async fn callback(
    State(state): State<Captured>,
    Path((interaction_id, token)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> StatusCode {
    state
        .requests
        .lock()
        .await
        .push((format!("callback {interaction_id}/{token}"), body, None));
    StatusCode::NO_CONTENT
}

async fn platform() -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/api/channels/:channel_id/messages", post(create))
        .route("/api/channels/:channel_id/messages/:message_id", patch(edit))
        .route("/api/interactions/:interaction_id/:token/callback", post(callback))
        .with_state(captured.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}/api/"), captured)
}

fn controls() -> Vec<Control> {
    vec![
        Control::new("review:like", "👍", ControlStyle::Success, 0),
        Control::new("embed:prev_page", "◀", ControlStyle::Primary, 2),
        Control::new("embed:lock", "🔓", ControlStyle::Success, 0),
    ]
}

#[test]
fn components_are_grouped_into_rows() {
    let mut controls = controls();
    controls[1].enabled = false;

    let rows = components_json(&controls);

    let rows = rows.as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    let first: Vec<&str> = rows[0]["components"]
        .as_array()
        .expect("buttons")
        .iter()
        .map(|button| button["custom_id"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(first, vec!["review:like", "embed:lock"]);
    assert_eq!(rows[0]["components"][0]["style"], 3);
    assert_eq!(rows[1]["components"][0]["disabled"], true);
}

#[test]
fn embeds_use_the_platform_shape() {
    let mut page = Embed::new("IPP")
        .with_color(0x3498db)
        .with_footer("Review | IPP | ID: 3")
        .with_timestamp(
            chrono::DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
                .expect("timestamp")
                .with_timezone(&chrono::Utc),
        );
    page.add_field("Grade", "B", true);

    let embed = embed_json(&page);

    assert_eq!(embed["title"], "IPP");
    assert_eq!(embed["color"], 0x3498db);
    assert_eq!(embed["footer"], json!({ "text": "Review | IPP | ID: 3" }));
    assert_eq!(embed["timestamp"], "2024-03-01T12:00:00+00:00");
    assert_eq!(embed["fields"], json!([{ "name": "Grade", "value": "B", "inline": true }]));
    assert!(embed.get("description").is_none());
}

#[test]
fn rejects_invalid_api_url() {
    assert!(HttpTransport::new("not a url", None).is_err());
}

#[tokio::test]
async fn send_edit_and_detach_hit_the_platform() {
    let (api_url, captured) = platform().await;
    let transport = HttpTransport::new(&api_url, Some("secret".into())).expect("transport");

    let page = Embed::new("page 1").with_footer("Page 1/2");
    let handle = transport
        .send_message(ChannelId(5), &page, &controls())
        .await
        .expect("send");
    assert_eq!(handle.message_id, MessageId(777));

    transport
        .edit_message(&handle, Some(&Embed::new("page 2")), None)
        .await
        .expect("edit");
    transport.detach_controls(&handle).await.expect("detach");

    let requests = captured.requests.lock().await.clone();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].0, "create 5");
    assert_eq!(requests[0].1["embeds"][0]["title"], "page 1");
    assert_eq!(requests[0].1["embeds"][0]["footer"]["text"], "Page 1/2");
    assert_eq!(requests[0].2.as_deref(), Some("Bot secret"));
    assert_eq!(requests[1].0, "edit 5/777");
    assert!(requests[1].1.get("components").is_none());
    assert_eq!(requests[2].1["components"], json!([]));
}

#[tokio::test]
async fn private_reply_uses_the_interaction_callback() {
    let (api_url, captured) = platform().await;
    let transport = HttpTransport::new(&api_url, None).expect("transport");
    let event = ControlEvent {
        interaction_id: "ia1".into(),
        token: "tok".into(),
        channel_id: ChannelId(5),
        message_id: MessageId(777),
        control_id: "embed:lock".into(),
        actor: shared::domain::UserId(9),
        metadata: Value::Null,
    };

    transport.reply_private(&event, "nope").await.expect("reply");

    let requests = captured.requests.lock().await.clone();
    assert_eq!(requests[0].0, "callback ia1/tok");
    assert_eq!(requests[0].1["data"]["content"], "nope");
    assert_eq!(requests[0].1["data"]["flags"], 64);
}

#[tokio::test]
async fn failed_edit_is_an_error() {
    let (api_url, _) = platform().await;
    let transport = HttpTransport::new(&api_url, None).expect("transport");
    let handle = MessageHandle {
        channel_id: ChannelId(5),
        message_id: MessageId(404),
    };
    assert!(transport.edit_message(&handle, None, None).await.is_err());
}
