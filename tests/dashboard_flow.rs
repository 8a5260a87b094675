use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use invite_console::{
    api::ApiClient,
    config::Config,
    console::render_listing,
    dashboard::{Dashboard, EditUserForm, PageChange},
    error::Error,
    state::{InviteStore, ProjectStore},
};

struct Stub {
    users: Mutex<Vec<Value>>,
    users_hits: AtomicU32,
    search_hits: AtomicU32,
    invite_hits: AtomicU32,
    last_search_query: Mutex<Option<String>>,
    last_invite_body: Mutex<Option<Value>>,
    last_resend_body: Mutex<Option<Value>>,
    last_update: Mutex<Option<(String, Value)>>,
}

impl Stub {
    fn new(users: Vec<Value>) -> Self {
        Self {
            users: Mutex::new(users),
            users_hits: AtomicU32::new(0),
            search_hits: AtomicU32::new(0),
            invite_hits: AtomicU32::new(0),
            last_search_query: Mutex::new(None),
            last_invite_body: Mutex::new(None),
            last_resend_body: Mutex::new(None),
            last_update: Mutex::new(None),
        }
    }
}

fn user_value(uuid: &str, name: &str, email: &str, role: &str, project_uuid: &str) -> Value {
    json!({
        "uuid": uuid,
        "name": name,
        "email": email,
        "role": role,
        "projectUuid": project_uuid,
    })
}

fn paginate(users: &[Value], page: usize, limit: usize) -> Value {
    let total_rows = users.len();
    let total_pages = (total_rows.div_ceil(limit)).max(1);
    let rows: Vec<Value> = users
        .iter()
        .skip((page - 1) * limit)
        .take(limit)
        .cloned()
        .collect();
    json!({"data": rows, "totalPages": total_pages, "totalRows": total_rows})
}

fn page_and_limit(params: &HashMap<String, String>) -> (usize, usize) {
    let page = params
        .get("page")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1usize);
    let limit = params
        .get("limit")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(10usize);
    (page.max(1), limit.max(1))
}

async fn users_handler(
    State(stub): State<Arc<Stub>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    stub.users_hits.fetch_add(1, Ordering::SeqCst);
    let (page, limit) = page_and_limit(&params);
    let users = stub.users.lock().unwrap().clone();
    Json(paginate(&users, page, limit))
}

async fn search_handler(
    State(stub): State<Arc<Stub>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    stub.search_hits.fetch_add(1, Ordering::SeqCst);
    let query = params.get("query").cloned().unwrap_or_default();
    *stub.last_search_query.lock().unwrap() = Some(query.clone());
    if query == "slow" {
        tokio::time::sleep(Duration::from_millis(400)).await;
    }
    if query == "explode" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "kaboom").into_response();
    }
    let (page, limit) = page_and_limit(&params);
    let matches: Vec<Value> = stub
        .users
        .lock()
        .unwrap()
        .iter()
        .filter(|user| {
            user["email"]
                .as_str()
                .unwrap_or_default()
                .contains(&query)
        })
        .cloned()
        .collect();
    Json(paginate(&matches, page, limit)).into_response()
}

async fn invite_handler(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Json<Value> {
    stub.invite_hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_invite_body.lock().unwrap() = Some(body.clone());
    let rejected = body["emails"]
        .as_array()
        .map(|emails| {
            emails
                .iter()
                .any(|email| email.as_str().unwrap_or_default().contains("reject"))
        })
        .unwrap_or(false);
    if rejected {
        Json(json!({"success": false, "message": "rejected by policy"}))
    } else {
        Json(json!({"success": true, "message": "ok"}))
    }
}

async fn resend_handler(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Json<Value> {
    *stub.last_resend_body.lock().unwrap() = Some(body.clone());
    let email = body["emails"][0].as_str().unwrap_or_default().to_owned();
    if email.contains("fail") {
        Json(json!({"results": [{"email": email, "success": false, "message": "smtp unavailable"}]}))
    } else {
        Json(json!({"results": [{"email": email, "success": true, "message": ""}]}))
    }
}

async fn update_handler(
    State(stub): State<Arc<Stub>>,
    Path(uuid): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    *stub.last_update.lock().unwrap() = Some((uuid.clone(), body.clone()));
    let mut users = stub.users.lock().unwrap();
    let user = users
        .iter_mut()
        .find(|user| user["uuid"].as_str() == Some(uuid.as_str()));
    match user {
        Some(user) => {
            for field in ["name", "email", "role"] {
                if let Some(value) = body.get(field) {
                    user[field] = value.clone();
                }
            }
            Json(json!({"data": user.clone()})).into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such user").into_response(),
    }
}

async fn projects_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let projects = vec![
        json!({"uuid": "11111111-1111-1111-1111-111111111111", "name": "Apollo"}),
        json!({"uuid": "22222222-2222-2222-2222-222222222222", "name": "Borealis"}),
    ];
    let filtered: Vec<Value> = match params.get("search") {
        Some(search) => projects
            .into_iter()
            .filter(|project| {
                project["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&search.to_lowercase())
            })
            .collect(),
        None => projects,
    };
    Json(json!({"data": filtered}))
}

async fn roles_handler() -> Json<Value> {
    Json(json!({"data": [
        {"uuid": "aaaaaaaa-0000-0000-0000-000000000001", "displayName": "Super Admin"},
        {"uuid": "aaaaaaaa-0000-0000-0000-000000000002", "displayName": "Admin"},
        {"uuid": "aaaaaaaa-0000-0000-0000-000000000003", "displayName": "Member"},
    ]}))
}

async fn spawn_stub(users: Vec<Value>) -> (String, Arc<Stub>) {
    let stub = Arc::new(Stub::new(users));
    let router = Router::new()
        .route("/users", get(users_handler))
        .route("/users/search", get(search_handler))
        .route("/users/:uuid", put(update_handler))
        .route("/invite", post(invite_handler))
        .route("/invite/resend", post(resend_handler))
        .route("/projects", get(projects_handler))
        .route("/roles", get(roles_handler))
        .with_state(stub.to_owned());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), stub)
}

fn test_config(base_url: &str) -> Config {
    toml::from_str(&format!(
        "api_base_url = \"{}\"\nitems_per_page = 10\nsearch_debounce_millis = 80\n",
        base_url
    ))
    .unwrap()
}

fn build_dashboard(config: &Config) -> Arc<Dashboard> {
    let api = Arc::new(ApiClient::new(config).unwrap());
    let invites = Arc::new(InviteStore::new(api.to_owned()));
    let projects = Arc::new(ProjectStore::new(api));
    Arc::new(Dashboard::new(invites, projects, config))
}

#[tokio::test]
async fn mount_populates_and_normalizes_listing_roles_and_projects() {
    let (base_url, _stub) = spawn_stub(vec![
        user_value(
            "550E8400E29B41D4A716446655440000",
            "Ana",
            "ana@x.com",
            "member",
            "6BA7B8109DAD11D180B400C04FD430C8",
        ),
        user_value(
            "550e8400-e29b-41d4-a716-446655440001",
            "",
            "bo@x.com",
            "admin",
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
        ),
        user_value(
            "550e8400-e29b-41d4-a716-446655440002",
            "Cy",
            "cy@x.com",
            "member",
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
        ),
    ])
    .await;
    let dashboard = build_dashboard(&test_config(&base_url));

    dashboard.mount().await;

    let invite_state = dashboard.get_invites().snapshot().await;
    assert_eq!(invite_state.listing.rows.len(), 3);
    assert_eq!(invite_state.listing.total_pages, 1);
    assert_eq!(invite_state.listing.total_rows, 3);
    assert_eq!(
        invite_state.listing.rows[0].get_uuid(),
        "550e8400-e29b-41d4-a716-446655440000"
    );
    assert_eq!(
        invite_state.listing.rows[0].get_project_uuid(),
        "6ba7b810-9dad-11d1-80b4-00c04fd430c8"
    );
    assert_eq!(invite_state.roles.len(), 3);
    assert_eq!(invite_state.roles[1].get_display_name(), "Admin");
    assert!(!invite_state.loading);
    assert!(invite_state.error.is_none());

    let project_state = dashboard.get_projects().snapshot().await;
    assert_eq!(project_state.projects.len(), 2);

    //Three rows on a single page: both pagination controls disabled.
    let rendered = render_listing(&invite_state);
    assert!(rendered.contains("page 1 of 1"));
    assert!(!rendered.contains('<'));
    assert!(!rendered.contains('>'));
}

#[tokio::test]
async fn page_changes_are_clamped_to_the_listing_bounds() {
    let users: Vec<Value> = (0..25)
        .map(|index| {
            user_value(
                &format!("550e8400-e29b-41d4-a716-4466554400{:02}", index),
                "",
                &format!("user{}@x.com", index),
                "member",
                "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
            )
        })
        .collect();
    let (base_url, _stub) = spawn_stub(users).await;
    let dashboard = build_dashboard(&test_config(&base_url));
    dashboard.mount().await;
    assert_eq!(dashboard.get_invites().snapshot().await.listing.total_pages, 3);

    assert_eq!(
        dashboard.change_page(PageChange::Previous).await.unwrap(),
        1
    );
    assert_eq!(dashboard.change_page(PageChange::Next).await.unwrap(), 2);
    assert_eq!(dashboard.change_page(PageChange::Next).await.unwrap(), 3);
    assert_eq!(dashboard.change_page(PageChange::Next).await.unwrap(), 3);

    let state = dashboard.get_invites().snapshot().await;
    assert_eq!(state.listing.page, 3);
    assert_eq!(state.listing.rows.len(), 5);
}

#[tokio::test]
async fn rapid_search_edits_dispatch_once_with_the_final_text() {
    let (base_url, stub) = spawn_stub(vec![user_value(
        "550e8400-e29b-41d4-a716-446655440000",
        "Ana",
        "ana@x.com",
        "member",
        "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
    )])
    .await;
    let dashboard = build_dashboard(&test_config(&base_url));
    dashboard.mount().await;

    dashboard.set_search_term("a").await;
    dashboard.set_search_term("an").await;
    dashboard.set_search_term("ana").await;
    dashboard.settled().await;

    assert_eq!(stub.search_hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        stub.last_search_query.lock().unwrap().as_deref(),
        Some("ana")
    );
    let state = dashboard.get_invites().snapshot().await;
    assert_eq!(state.listing.rows.len(), 1);
}

#[tokio::test]
async fn a_superseded_listing_response_is_discarded() {
    let (base_url, _stub) = spawn_stub(vec![
        user_value(
            "550e8400-e29b-41d4-a716-446655440000",
            "Ana",
            "ana@x.com",
            "member",
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
        ),
        user_value(
            "550e8400-e29b-41d4-a716-446655440001",
            "Bo",
            "bo@x.com",
            "admin",
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
        ),
    ])
    .await;
    let config = test_config(&base_url);
    let store = Arc::new(InviteStore::new(Arc::new(ApiClient::new(&config).unwrap())));

    //The slow search resolves long after the plain fetch that superseded
    //it; its empty result set must not overwrite the fetched listing.
    let slow = {
        let store = store.to_owned();
        tokio::spawn(async move {
            let _ = store.search_users(1, 10, "slow").await;
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    store.fetch_users(1, 10).await.unwrap();
    slow.await.unwrap();

    let state = store.snapshot().await;
    assert_eq!(state.listing.rows.len(), 2);
    assert!(state.error.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn submit_sends_split_emails_then_clears_the_form_and_refetches() {
    let (base_url, stub) = spawn_stub(vec![user_value(
        "550e8400-e29b-41d4-a716-446655440000",
        "Ana",
        "ana@x.com",
        "member",
        "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
    )])
    .await;
    let dashboard = build_dashboard(&test_config(&base_url));
    dashboard.mount().await;
    let fetches_before = stub.users_hits.load(Ordering::SeqCst);

    dashboard
        .set_form_project("6BA7B8109DAD11D180B400C04FD430C8")
        .await;
    dashboard.set_form_email("b@y.com, c@z.com ,").await;
    dashboard.set_form_role("member").await;
    dashboard.submit().await.unwrap();

    assert_eq!(stub.invite_hits.load(Ordering::SeqCst), 1);
    let body = stub.last_invite_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["emails"], json!(["b@y.com", "c@z.com"]));
    assert_eq!(body["role"], json!("member"));
    assert_eq!(
        body["projectUuid"],
        json!("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
    );

    let form = dashboard.get_form().await;
    assert!(form.project_uuid.is_empty());
    assert!(form.email.is_empty());
    assert!(form.role.is_empty());
    assert!(stub.users_hits.load(Ordering::SeqCst) > fetches_before);
}

#[tokio::test]
async fn a_rejected_invite_keeps_the_form_and_surfaces_the_message() {
    let (base_url, stub) = spawn_stub(Vec::new()).await;
    let dashboard = build_dashboard(&test_config(&base_url));
    dashboard.mount().await;

    dashboard
        .set_form_project("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
        .await;
    dashboard.set_form_email("reject@x.com").await;
    dashboard.set_form_role("admin").await;
    let err = dashboard.submit().await.unwrap_err();
    assert!(matches!(err, Error::InviteRejected(_)));
    assert!(err.to_string().contains("rejected by policy"));

    assert_eq!(stub.invite_hits.load(Ordering::SeqCst), 1);
    let form = dashboard.get_form().await;
    assert_eq!(form.email, "reject@x.com");
}

#[tokio::test]
async fn an_invalid_form_never_reaches_the_network() {
    let (base_url, stub) = spawn_stub(Vec::new()).await;
    let dashboard = build_dashboard(&test_config(&base_url));
    dashboard.mount().await;

    assert!(dashboard.submit().await.is_err());
    assert_eq!(stub.invite_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resend_uses_the_rows_fields_and_reports_server_failures() {
    let (base_url, stub) = spawn_stub(vec![
        user_value(
            "550e8400-e29b-41d4-a716-446655440000",
            "Ana",
            "ana@x.com",
            "member",
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
        ),
        user_value(
            "550e8400-e29b-41d4-a716-446655440001",
            "Bo",
            "fail@x.com",
            "admin",
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
        ),
    ])
    .await;
    let dashboard = build_dashboard(&test_config(&base_url));
    dashboard.mount().await;
    let rows = dashboard.get_invites().snapshot().await.listing.rows;

    dashboard.resend(&rows[0]).await.unwrap();
    let body = stub.last_resend_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["emails"], json!(["ana@x.com"]));
    assert_eq!(
        body["projectUuid"],
        json!("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
    );
    assert_eq!(body["role"], json!("member"));

    let err = dashboard.resend(&rows[1]).await.unwrap_err();
    assert!(matches!(err, Error::InviteRejected(_)));
    assert!(err.to_string().contains("smtp unavailable"));
}

#[tokio::test]
async fn edit_submits_only_the_changed_email_and_updates_the_row() {
    let (base_url, stub) = spawn_stub(vec![user_value(
        "550e8400-e29b-41d4-a716-446655440000",
        "Ana",
        "ana@x.com",
        "member",
        "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
    )])
    .await;
    let dashboard = build_dashboard(&test_config(&base_url));
    dashboard.mount().await;
    let row = dashboard.get_invites().snapshot().await.listing.rows[0].clone();

    let form = EditUserForm {
        name: None,
        email: Some("b@y.com".to_owned()),
        //Unchanged, so it must be dropped from the payload.
        role: Some("member".to_owned()),
    };
    dashboard.edit(&row, form).await.unwrap();

    let (uuid, body) = stub.last_update.lock().unwrap().clone().unwrap();
    assert_eq!(uuid, "550e8400-e29b-41d4-a716-446655440000");
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(object.get("email").unwrap(), "b@y.com");

    let state = dashboard.get_invites().snapshot().await;
    assert_eq!(state.listing.rows[0].get_email(), "b@y.com");
}

#[tokio::test]
async fn a_server_error_reduces_into_listing_state() {
    let (base_url, _stub) = spawn_stub(Vec::new()).await;
    let config = test_config(&base_url);
    let store = InviteStore::new(Arc::new(ApiClient::new(&config).unwrap()));

    let err = store.search_users(1, 10, "explode").await.unwrap_err();
    assert!(matches!(err, Error::Api(_)));
    let state = store.snapshot().await;
    assert!(!state.loading);
    assert!(state.error.as_deref().unwrap_or_default().contains("kaboom"));
}

#[tokio::test]
async fn a_transport_error_reduces_into_listing_state() {
    //Nothing listens here.
    let config = test_config("http://127.0.0.1:9");
    let store = InviteStore::new(Arc::new(ApiClient::new(&config).unwrap()));

    assert!(store.fetch_users(1, 10).await.is_err());
    let state = store.snapshot().await;
    assert!(!state.loading);
    assert!(state.error.is_some());
}
