// Integration tests: the real HTTP client and session against an in-process mock API.

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fintracker::app::{self, Command, Outcome};
use fintracker::forms::{PasswordForm, ProfileForm, SignInForm, SignUpForm};
use fintracker::{
    session, ApiError, Category, ExpenseDraft, FinanceApi, LocalStore, NotificationPrefs, Session,
    Theme, GENERIC_FAILURE,
};

const TOKEN: &str = "tok-1";
const PASSWORD: &str = "secret";

// ============================================================================
// MOCK SERVER
// ============================================================================

#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    path: String,
    token: Option<String>,
    request_id: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Mock {
    expenses: Arc<Mutex<Vec<Value>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Mock {
    fn record(&self, method: &'static str, path: &str, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(Seen {
            method,
            path: path.to_string(),
            token: header("x-auth-token"),
            request_id: header("x-request-id"),
            body,
        });
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().expect("no request recorded")
    }

    fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-auth-token").and_then(|v| v.to_str().ok()) == Some(TOKEN)
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn user_json() -> Value {
    json!({
        "_id": "u1",
        "name": "Ada",
        "email": "ada@example.com",
        "notificationPrefs": { "weeklySummary": true, "budgetAlerts": false, "largeTransactions": false }
    })
}

async fn login(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("POST", "/users/login", &headers, body.clone());
    if body["password"] != PASSWORD {
        return reject(StatusCode::BAD_REQUEST, "Invalid credentials");
    }
    Json(json!({ "token": TOKEN, "user": user_json() })).into_response()
}

async fn sign_up(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("POST", "/users/signUp", &headers, body);
    (StatusCode::CREATED, Json(json!({ "message": "User registered" }))).into_response()
}

async fn list_expenses(State(mock): State<Mock>, headers: HeaderMap) -> Response {
    mock.record("GET", "/expense/get", &headers, Value::Null);
    if !authorized(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let expenses = mock.expenses.lock().unwrap().clone();
    Json(json!({ "expenses": expenses })).into_response()
}

async fn add_expense(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("POST", "/expense/add", &headers, body.clone());
    if !authorized(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut record = body;
    record["_id"] = json!("new-1");
    mock.expenses.lock().unwrap().push(record);
    (StatusCode::CREATED, Json(json!({ "message": "Expense added" }))).into_response()
}

async fn update_expense(
    State(mock): State<Mock>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.record("PUT", &format!("/expense/{}", id), &headers, body.clone());
    let mut expenses = mock.expenses.lock().unwrap();
    match expenses.iter_mut().find(|e| e["_id"] == id.as_str()) {
        Some(existing) => {
            let mut updated = body;
            updated["_id"] = json!(id);
            *existing = updated;
            Json(json!({ "message": "Expense updated" })).into_response()
        }
        None => reject(StatusCode::NOT_FOUND, "Expense not found"),
    }
}

async fn delete_expense(State(mock): State<Mock>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    mock.record("DELETE", &format!("/expense/{}", id), &headers, Value::Null);
    mock.expenses.lock().unwrap().retain(|e| e["_id"] != id.as_str());
    // plain text on purpose
    (StatusCode::OK, "Deleted").into_response()
}

async fn get_prefs(State(mock): State<Mock>, headers: HeaderMap) -> Response {
    mock.record("GET", "/users/notifications", &headers, Value::Null);
    Json(json!({ "notificationPrefs": { "weeklySummary": true, "budgetAlerts": true } })).into_response()
}

async fn update_prefs(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("PATCH", "/users/notifications", &headers, body.clone());
    let mut user = user_json();
    user["notificationPrefs"] = body;
    Json(json!({ "message": "Preferences updated", "user": user })).into_response()
}

async fn edit_profile(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("PATCH", "/users/edit", &headers, body.clone());
    let mut user = user_json();
    user["name"] = body["name"].clone();
    user["email"] = body["email"].clone();
    Json(json!({ "message": "Profile updated successfully", "user": user })).into_response()
}

async fn update_photo(State(mock): State<Mock>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let mut fields = Vec::new();
    let mut file_name = String::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        fields.push(json!({ "name": name, "file": file_name, "len": bytes.len() }));
    }
    mock.record("POST", "/users/update-photo", &headers, Value::Array(fields));

    let mut user = user_json();
    user["photoUrl"] = json!(format!("uploads/{}", file_name));
    Json(json!({ "user": user })).into_response()
}

async fn change_password(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("PATCH", "/users/change-password", &headers, body.clone());
    if body["currentPassword"] != PASSWORD {
        return reject(StatusCode::BAD_REQUEST, "Current password is incorrect");
    }
    Json(json!({ "message": "Password updated successfully" })).into_response()
}

async fn notifications(State(mock): State<Mock>, headers: HeaderMap) -> Response {
    mock.record("GET", "/notifications", &headers, Value::Null);
    Json(json!({
        "notifications": [
            { "_id": "n1", "message": "Budget exceeded for Food", "read": false, "createdAt": "2024-03-02T08:00:00.000Z" },
            { "_id": "n2", "message": "Weekly summary ready", "read": true }
        ]
    }))
    .into_response()
}

async fn mark_all_read(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("PATCH", "/notifications/markAllRead", &headers, body);
    Json(json!({ "message": "All marked read" })).into_response()
}

fn router(mock: Mock) -> Router {
    Router::new()
        .route("/users/login", post(login))
        .route("/users/signUp", post(sign_up))
        .route("/expense/get", get(list_expenses))
        .route("/expense/add", post(add_expense))
        .route("/expense/:id", put(update_expense).delete(delete_expense))
        .route("/users/notifications", get(get_prefs).patch(update_prefs))
        .route("/users/edit", patch(edit_profile))
        .route("/users/update-photo", post(update_photo))
        .route("/users/change-password", patch(change_password))
        .route("/notifications", get(notifications))
        .route("/notifications/markAllRead", patch(mark_all_read))
        .with_state(mock)
}

async fn spawn_mock() -> (String, Mock) {
    let mock = Mock::default();
    mock.expenses.lock().unwrap().extend([
        json!({ "_id": "e1", "amount": 2000, "selectedCategory": "Income", "date": "2024-03-01T00:00:00.000Z", "notes": "salary" }),
        json!({ "_id": "e2", "amount": 45.5, "selectedCategory": "Food", "date": "2024-03-02", "notes": "" }),
        json!({ "_id": "e3", "amount": 12, "selectedCategory": "Gifts", "date": "2024-02-14" }),
    ]);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(mock.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), mock)
}

fn new_session(base_url: &str) -> Session {
    let api = FinanceApi::new(base_url, Duration::from_secs(5)).unwrap();
    Session::new(api, LocalStore::open_in_memory().unwrap())
}

async fn signed_in_session(base_url: &str) -> Session {
    let session = new_session(base_url);
    let form = SignInForm {
        email: "ada@example.com".to_string(),
        password: PASSWORD.to_string(),
    };
    session.sign_in(&form).await.unwrap();
    session
}

// ============================================================================
// ACCOUNT
// ============================================================================

#[tokio::test]
async fn test_sign_in_stores_token_and_user() {
    let (url, mock) = spawn_mock().await;
    let session = new_session(&url);
    assert!(!session.is_signed_in());

    let form = SignInForm {
        email: " ada@example.com ".to_string(),
        password: PASSWORD.to_string(),
    };
    let user = session.sign_in(&form).await.unwrap();
    assert_eq!(user.name, "Ada");

    let sent = mock.last();
    assert_eq!(sent.body, json!({ "email": "ada@example.com", "password": PASSWORD }));
    assert!(sent.token.is_none());
    assert!(sent.request_id.is_some());

    assert!(session.is_signed_in());
    assert_eq!(session.current_user().unwrap().email, "ada@example.com");

    session.expenses().await.unwrap();
    assert_eq!(mock.last().token.as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn test_rejected_sign_in_shows_server_message() {
    let (url, _mock) = spawn_mock().await;
    let session = new_session(&url);
    let form = SignInForm {
        email: "ada@example.com".to_string(),
        password: "wrong".to_string(),
    };

    let err = session.sign_in(&form).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.user_message(GENERIC_FAILURE), "Invalid credentials");
    assert!(!session.is_signed_in());
}

#[tokio::test]
async fn test_sign_up_payload() {
    let (url, mock) = spawn_mock().await;
    let session = new_session(&url);
    let form = SignUpForm {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
    };

    assert_eq!(session.sign_up(&form).await.unwrap(), session::SIGNED_UP);
    assert_eq!(
        mock.last().body,
        json!({ "name": "Ada", "email": "ada@example.com", "password": "secret1", "confirmPassword": "secret1" })
    );
    // account creation does not sign in
    assert!(!session.is_signed_in());
}

#[tokio::test]
async fn test_sign_out_keeps_theme() {
    let (url, _mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;
    session.set_theme(Theme::Dark).unwrap();

    session.sign_out().unwrap();
    assert!(!session.is_signed_in());
    assert!(session.current_user().is_none());
    assert_eq!(session.theme(Theme::Light), Theme::Dark);
}

#[tokio::test]
async fn test_authenticated_calls_need_a_token() {
    let (url, mock) = spawn_mock().await;
    let session = new_session(&url);

    let err = session.expenses().await.unwrap_err();
    assert!(matches!(err, ApiError::NotSignedIn));
    assert_eq!(err.user_message(GENERIC_FAILURE), "Please sign in first.");
    assert_eq!(mock.count(), 0);
}

// ============================================================================
// EXPENSES
// ============================================================================

#[tokio::test]
async fn test_list_expenses_reads_records() {
    let (url, _mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;

    let expenses = session.expenses().await.unwrap();
    assert_eq!(expenses.len(), 3);
    assert_eq!(expenses[0].id, "e1");
    assert_eq!(expenses[0].category, Category::Income);
    assert_eq!(expenses[1].amount, 45.5);
    assert_eq!(expenses[2].category, Category::Other("Gifts".to_string()));
    assert!(expenses[2].notes.is_empty());
}

#[tokio::test]
async fn test_add_expense_payload_shape() {
    let (url, mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;
    let draft = ExpenseDraft {
        amount: 12.5,
        category: Category::Transport,
        date: "2024-03-05".to_string(),
        notes: "bus".to_string(),
    };

    assert_eq!(session.add_expense(&draft).await.unwrap(), session::EXPENSE_ADDED);

    let sent = mock.last();
    assert_eq!(sent.method, "POST");
    assert_eq!(sent.token.as_deref(), Some(TOKEN));
    assert_eq!(
        sent.body,
        json!({ "amount": 12.5, "selectedCategory": "Transport", "date": "2024-03-05", "notes": "bus" })
    );
    assert_eq!(session.expenses().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_update_and_delete_expense() {
    let (url, mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;
    let draft = ExpenseDraft {
        amount: 50.0,
        category: Category::Groceries,
        date: "2024-03-02".to_string(),
        notes: "market".to_string(),
    };

    assert_eq!(session.update_expense("e2", &draft).await.unwrap(), session::EXPENSE_UPDATED);
    let sent = mock.last();
    assert_eq!(sent.method, "PUT");
    assert_eq!(sent.path, "/expense/e2");
    assert_eq!(sent.body["selectedCategory"], "Groceries");

    let err = session.update_expense("missing", &draft).await.unwrap_err();
    assert_eq!(err.user_message(session::UPDATE_FAILED), "Expense not found");

    // plain-text success body
    assert_eq!(session.delete_expense("e3").await.unwrap(), session::EXPENSE_DELETED);
    let ids: Vec<String> = session.expenses().await.unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["e1", "e2"]);
}

// ============================================================================
// PROFILE & PREFERENCES
// ============================================================================

#[tokio::test]
async fn test_read_notification_prefs() {
    let (url, _mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;

    let prefs = session.notification_prefs().await.unwrap();
    assert_eq!(
        prefs,
        NotificationPrefs { weekly_summary: true, budget_alerts: true, large_transactions: false }
    );
}

#[tokio::test]
async fn test_saved_prefs_merge_into_cached_user() {
    let (url, mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;
    let prefs = NotificationPrefs { weekly_summary: false, budget_alerts: true, large_transactions: true };

    let update = session.update_notification_prefs(&prefs).await.unwrap();
    assert_eq!(update.prefs, prefs);
    assert_eq!(update.message.as_deref(), Some("Preferences updated"));
    assert_eq!(
        mock.last().body,
        json!({ "weeklySummary": false, "budgetAlerts": true, "largeTransactions": true })
    );

    let cached = session.current_user().unwrap();
    assert_eq!(cached.notification_prefs, Some(prefs));
}

#[tokio::test]
async fn test_edit_profile_updates_cache() {
    let (url, mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;
    let form = ProfileForm {
        name: "Ada Lovelace".to_string(),
        email: "ada@lovelace.dev".to_string(),
    };

    let (user, message) = session.edit_profile(&form).await.unwrap();
    assert_eq!(message, "Profile updated successfully");
    assert_eq!(user.name, "Ada Lovelace");
    assert_eq!(mock.last().body, json!({ "name": "Ada Lovelace", "email": "ada@lovelace.dev" }));
    assert_eq!(session.current_user().unwrap().email, "ada@lovelace.dev");
}

#[tokio::test]
async fn test_photo_upload_is_multipart() {
    let (url, mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avatar.png");
    std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

    let (user, message) = session.upload_photo(&path).await.unwrap();
    assert_eq!(message, session::PHOTO_SAVED);
    assert_eq!(
        user.photo_location(session.api_url()),
        Some(format!("{}/uploads/avatar.png", url))
    );

    let sent = mock.last();
    assert_eq!(sent.token.as_deref(), Some(TOKEN));
    assert_eq!(sent.body, json!([{ "name": "profilePic", "file": "avatar.png", "len": 4 }]));
    assert!(session.current_user().unwrap().photo_url.is_some());
}

#[tokio::test]
async fn test_missing_photo_file_never_sent() {
    let (url, mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;
    let before = mock.count();

    let err = session
        .upload_photo(std::path::Path::new("/definitely/not/here.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Io(_)));
    assert_eq!(err.user_message(session::PHOTO_FAILED), session::PHOTO_FAILED);
    assert_eq!(mock.count(), before);
}

#[tokio::test]
async fn test_change_password() {
    let (url, mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;
    let before = mock.count();

    let mismatch = PasswordForm {
        current_password: PASSWORD.to_string(),
        new_password: "abcdef".to_string(),
        confirm_password: "abcdeg".to_string(),
    };
    let err = session.change_password(&mismatch).await.unwrap_err();
    assert_eq!(err.user_message(session::PASSWORD_FAILED), "New passwords do not match.");
    assert_eq!(mock.count(), before);

    let wrong = PasswordForm {
        current_password: "nope".to_string(),
        new_password: "abcdef".to_string(),
        confirm_password: "abcdef".to_string(),
    };
    let err = session.change_password(&wrong).await.unwrap_err();
    assert_eq!(err.user_message(session::PASSWORD_FAILED), "Current password is incorrect");

    let good = PasswordForm {
        current_password: PASSWORD.to_string(),
        ..wrong
    };
    assert_eq!(session.change_password(&good).await.unwrap(), "Password updated successfully");
    assert_eq!(
        mock.last().body,
        json!({ "currentPassword": PASSWORD, "newPassword": "abcdef", "confirmNewPassword": "abcdef" })
    );
}

// ============================================================================
// NOTIFICATIONS FEED
// ============================================================================

#[tokio::test]
async fn test_notifications_and_mark_all_read() {
    let (url, mock) = spawn_mock().await;
    let session = signed_in_session(&url).await;

    let list = session.notifications().await.unwrap();
    assert_eq!(list.len(), 2);
    assert!(!list[0].read);
    assert_eq!(list[0].created_at.as_deref(), Some("2024-03-02T08:00:00.000Z"));
    assert!(list[1].created_at.is_none());

    assert_eq!(session.mark_all_read().await.unwrap(), session::ALL_READ);
    let sent = mock.last();
    assert_eq!(sent.method, "PATCH");
    assert_eq!(sent.body, json!({}));
}

// ============================================================================
// UI COMMANDS
// ============================================================================

#[tokio::test]
async fn test_commands_produce_outcomes() {
    let (url, _mock) = spawn_mock().await;

    let signed_out = new_session(&url);
    match app::execute(&signed_out, Command::LoadExpenses).await {
        Outcome::Failed { needs_sign_in, .. } => assert!(needs_sign_in),
        other => panic!("unexpected outcome {:?}", other),
    }

    let session = signed_in_session(&url).await;
    match app::execute(&session, Command::LoadExpenses).await {
        Outcome::ExpensesLoaded(list) => assert_eq!(list.len(), 3),
        other => panic!("unexpected outcome {:?}", other),
    }

    let outcome = app::execute(&session, Command::DeleteExpense { id: "e1".to_string() }).await;
    assert_eq!(
        outcome,
        Outcome::ExpenseDeleted {
            id: "e1".to_string(),
            message: session::EXPENSE_DELETED.to_string(),
        }
    );

    let draft = ExpenseDraft {
        amount: 1.0,
        category: Category::Food,
        date: "2024-01-01".to_string(),
        notes: String::new(),
    };
    let outcome = app::execute(
        &session,
        Command::UpdateExpense { id: "gone".to_string(), draft },
    )
    .await;
    assert_eq!(
        outcome,
        Outcome::Failed {
            message: "Expense not found".to_string(),
            needs_sign_in: false,
        }
    );

    assert_eq!(app::execute(&session, Command::SaveTheme(Theme::Dark)).await, Outcome::ThemeSaved);
    assert_eq!(session.theme(Theme::Light), Theme::Dark);
}

#[tokio::test]
async fn test_unreachable_server_uses_fallback() {
    // nothing listens on port 9 of localhost in the test environment
    let session = new_session("http://127.0.0.1:9");
    let form = SignInForm {
        email: "ada@example.com".to_string(),
        password: PASSWORD.to_string(),
    };
    let err = session.sign_in(&form).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.user_message(GENERIC_FAILURE), GENERIC_FAILURE);
}
