// 💸 Records exchanged with the FinTracker API
// Everything here is passed through unchanged to and from the server.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATEGORY
// ============================================================================

/// Fixed label set used for both expenses and income entries.
///
/// Labels outside the set are kept verbatim in `Other` so a record the
/// server knows about never disappears from the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Food,
    Transport,
    Housing,
    Health,
    Education,
    Shopping,
    Groceries,
    Bills,
    Electronics,
    Income,
    Other(String),
}

impl Category {
    /// The closed set, in the order the forms offer it.
    pub const ALL: [Category; 10] = [
        Category::Food,
        Category::Transport,
        Category::Housing,
        Category::Health,
        Category::Education,
        Category::Shopping,
        Category::Groceries,
        Category::Bills,
        Category::Electronics,
        Category::Income,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Housing => "Housing",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Shopping => "Shopping",
            Category::Groceries => "Groceries",
            Category::Bills => "Bills",
            Category::Electronics => "Electronics",
            Category::Income => "Income",
            Category::Other(label) => label.as_str(),
        }
    }

    /// Income is the only label that adds to the balance.
    pub fn is_income(&self) -> bool {
        matches!(self, Category::Income)
    }

    /// Case-insensitive match against the closed set.
    pub fn parse_known(label: &str) -> Option<Category> {
        Category::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label.trim()))
            .cloned()
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Food
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::parse_known(&label).unwrap_or(Category::Other(label))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse_known(s).ok_or_else(|| {
            let known: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
            format!("unknown category '{}' (expected one of: {})", s, known.join(", "))
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// EXPENSE RECORD
// ============================================================================

/// A single categorized monetary entry as the server returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: String,

    pub amount: f64,

    #[serde(rename = "selectedCategory", default)]
    pub category: Category,

    /// ISO date or full timestamp, kept as sent
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Expense {
    /// Calendar date of the entry, `None` when the server sent something unparseable.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }

    pub fn is_income(&self) -> bool {
        self.category.is_income()
    }

    /// Merge an edit that the server accepted.
    pub fn apply(&mut self, draft: &ExpenseDraft) {
        self.amount = draft.amount;
        self.category = draft.category.clone();
        self.date = draft.date.clone();
        self.notes = draft.notes.clone();
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and anything starting with a
/// `YYYY-MM-DD` prefix.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Body of the create and update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub amount: f64,

    #[serde(rename = "selectedCategory")]
    pub category: Category,

    pub date: String,

    pub notes: String,
}

impl From<&Expense> for ExpenseDraft {
    fn from(expense: &Expense) -> Self {
        Self {
            amount: expense.amount,
            category: expense.category.clone(),
            date: expense.date.clone(),
            notes: expense.notes.clone(),
        }
    }
}

// ============================================================================
// USER PROFILE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPrefs {
    #[serde(default)]
    pub weekly_summary: bool,

    #[serde(default)]
    pub budget_alerts: bool,

    #[serde(default)]
    pub large_transactions: bool,
}

impl NotificationPrefs {
    pub const KEYS: [&'static str; 3] = ["weeklySummary", "budgetAlerts", "largeTransactions"];

    pub fn get(&self, key: &str) -> Option<bool> {
        match key {
            "weeklySummary" => Some(self.weekly_summary),
            "budgetAlerts" => Some(self.budget_alerts),
            "largeTransactions" => Some(self.large_transactions),
            _ => None,
        }
    }

    /// Returns false when the key is not a known flag.
    pub fn set(&mut self, key: &str, value: bool) -> bool {
        match key {
            "weeklySummary" => self.weekly_summary = value,
            "budgetAlerts" => self.budget_alerts = value,
            "largeTransactions" => self.large_transactions = value,
            _ => return false,
        }
        true
    }

    pub fn toggle(&mut self, key: &str) -> bool {
        match self.get(key) {
            Some(current) => self.set(key, !current),
            None => false,
        }
    }
}

/// Profile cached locally as a read-through convenience; the server is the source of truth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_prefs: Option<NotificationPrefs>,
}

impl User {
    /// Absolute photo location; the server stores paths relative to the API root.
    pub fn photo_location(&self, api_url: &str) -> Option<String> {
        let path = self.photo_url.as_deref()?.trim();
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }
        Some(format!(
            "{}/{}",
            api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}

// ============================================================================
// NOTIFICATIONS FEED
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", default)]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub read: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

// ============================================================================
// REQUEST / RESPONSE BODIES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

/// `{ message, user }` as returned by the profile endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
}
