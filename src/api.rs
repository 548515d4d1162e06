// 🌐 FinTracker REST client
// Thin typed wrapper over the remote API. Auth is a token in the `x-auth-token` header.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    AuthResponse, Credentials, Expense, ExpenseDraft, Notification, NotificationPrefs,
    PasswordChange, ProfileUpdate, SignUpRequest, UserResponse,
};

pub const AUTH_HEADER: &str = "x-auth-token";
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
pub const PHOTO_FIELD: &str = "profilePic";

#[derive(Debug, Clone, Default, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpenseList {
    #[serde(default)]
    expenses: Vec<Expense>,
}

#[derive(Debug, Deserialize)]
struct NotificationList {
    #[serde(default)]
    notifications: Vec<Notification>,
}

/// Server reply to a preference update, plus what we believe is now saved.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefsUpdate {
    pub prefs: NotificationPrefs,
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct FinanceApi {
    base_url: String,
    client: Client,
}

impl FinanceApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.header(AUTH_HEADER, token),
            None => builder,
        }
    }

    /// Sends, maps non-2xx to `Rejected` with the body's `message`.
    /// A 2xx body that is not JSON comes back as a JSON string.
    async fn send_value(&self, builder: RequestBuilder) -> ApiResult<Value> {
        let request_id = Uuid::new_v4().hyphenated().to_string();
        let request = builder.header(REQUEST_ID_HEADER, &request_id).build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        tracing::debug!(%method, %path, %request_id, "sending request");
        let response = self.client.execute(request).await.map_err(|e| {
            tracing::warn!(%method, %path, %request_id, "request failed: {}", e);
            e
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<MessageBody>(&body)
                .ok()
                .and_then(|b| b.message);
            tracing::warn!(%method, %path, %request_id, %status, "request rejected: {:?}", message);
            return Err(ApiError::Rejected { status, message });
        }

        tracing::info!(%method, %path, %request_id, %status, "request ok");
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let value = self.send_value(builder).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send_message(&self, builder: RequestBuilder) -> ApiResult<Option<String>> {
        let value = self.send_value(builder).await?;
        Ok(message_of(&value))
    }

    fn expense_path(id: &str) -> String {
        format!("/expense/{}", urlencoding::encode(id))
    }

    // ========================================================================
    // AUTHENTICATION
    // ========================================================================

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        let builder = self
            .request(Method::POST, "/users/login", None)
            .json(credentials);
        self.send(builder).await
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> ApiResult<Option<String>> {
        let builder = self
            .request(Method::POST, "/users/signUp", None)
            .json(request);
        self.send_message(builder).await
    }

    // ========================================================================
    // EXPENSES
    // ========================================================================

    pub async fn list_expenses(&self, token: &str) -> ApiResult<Vec<Expense>> {
        let builder = self.request(Method::GET, "/expense/get", Some(token));
        let list: ExpenseList = self.send(builder).await?;
        Ok(list.expenses)
    }

    pub async fn add_expense(&self, token: &str, draft: &ExpenseDraft) -> ApiResult<Option<String>> {
        let builder = self
            .request(Method::POST, "/expense/add", Some(token))
            .json(draft);
        self.send_message(builder).await
    }

    pub async fn update_expense(
        &self,
        token: &str,
        id: &str,
        draft: &ExpenseDraft,
    ) -> ApiResult<Option<String>> {
        let builder = self
            .request(Method::PUT, &Self::expense_path(id), Some(token))
            .json(draft);
        self.send_message(builder).await
    }

    pub async fn delete_expense(&self, token: &str, id: &str) -> ApiResult<Option<String>> {
        let builder = self.request(Method::DELETE, &Self::expense_path(id), Some(token));
        self.send_message(builder).await
    }

    // ========================================================================
    // PROFILE & PREFERENCES
    // ========================================================================

    /// The server answers either with the bare flags or under `notificationPrefs`.
    pub async fn notification_prefs(&self, token: &str) -> ApiResult<NotificationPrefs> {
        let builder = self.request(Method::GET, "/users/notifications", Some(token));
        let body = self.send_value(builder).await?;
        let nested = body
            .get("notificationPrefs")
            .filter(|v| !v.is_null())
            .cloned();
        Ok(serde_json::from_value(nested.unwrap_or(body))?)
    }

    pub async fn update_notification_prefs(
        &self,
        token: &str,
        prefs: &NotificationPrefs,
    ) -> ApiResult<PrefsUpdate> {
        let builder = self
            .request(Method::PATCH, "/users/notifications", Some(token))
            .json(prefs);
        let body: Value = self.send_value(builder).await?;

        let nested = body
            .get("user")
            .and_then(|u| u.get("notificationPrefs"))
            .filter(|v| !v.is_null());
        let top = body.get("notificationPrefs").filter(|v| !v.is_null());

        let saved = match nested.or(top) {
            Some(v) => serde_json::from_value::<NotificationPrefs>(v.clone())?,
            None => prefs.clone(),
        };

        Ok(PrefsUpdate {
            prefs: saved,
            message: message_of(&body),
        })
    }

    pub async fn edit_profile(&self, token: &str, update: &ProfileUpdate) -> ApiResult<UserResponse> {
        let builder = self
            .request(Method::PATCH, "/users/edit", Some(token))
            .json(update);
        self.send(builder).await
    }

    pub async fn upload_photo(&self, token: &str, path: &Path) -> ApiResult<UserResponse> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "photo".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(guess_image_mime(path))?;
        let form = Form::new().part(PHOTO_FIELD, part);

        let builder = self
            .request(Method::POST, "/users/update-photo", Some(token))
            .multipart(form);
        self.send(builder).await
    }

    pub async fn change_password(
        &self,
        token: &str,
        change: &PasswordChange,
    ) -> ApiResult<Option<String>> {
        let builder = self
            .request(Method::PATCH, "/users/change-password", Some(token))
            .json(change);
        self.send_message(builder).await
    }

    // ========================================================================
    // NOTIFICATIONS FEED
    // ========================================================================

    pub async fn notifications(&self, token: &str) -> ApiResult<Vec<Notification>> {
        let builder = self.request(Method::GET, "/notifications", Some(token));
        let list: Option<NotificationList> = self.send(builder).await?;
        Ok(list.map(|l| l.notifications).unwrap_or_default())
    }

    pub async fn mark_all_notifications_read(&self, token: &str) -> ApiResult<Option<String>> {
        let builder = self
            .request(Method::PATCH, "/notifications/markAllRead", Some(token))
            .json(&EmptyBody {});
        self.send_message(builder).await
    }
}

#[derive(Serialize)]
struct EmptyBody {}

fn message_of(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("message").and_then(Value::as_str).map(str::to_string),
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn guess_image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
