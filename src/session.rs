// 🔐 Request orchestration
// Attaches the stored token, calls the API, and merges what comes back into local storage.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::api::{FinanceApi, PrefsUpdate};
use crate::error::{ApiError, ApiResult};
use crate::forms::{PasswordForm, ProfileForm, SignInForm, SignUpForm};
use crate::models::{Expense, ExpenseDraft, Notification, NotificationPrefs, User};
use crate::storage::LocalStore;
use crate::theme::Theme;

// ============================================================================
// USER-FACING TEXT
// ============================================================================

pub const SIGNED_IN: &str = "Signed in successfully!";
pub const SIGNED_UP: &str = "Account created successfully!";
pub const EXPENSE_ADDED: &str = "Expense added successfully!";
pub const EXPENSE_UPDATED: &str = "Expense updated successfully";
pub const EXPENSE_DELETED: &str = "Transaction deleted successfully!";
pub const PREFS_SAVED: &str = "Preferences saved!";
pub const PROFILE_SAVED: &str = "Profile updated";
pub const PHOTO_SAVED: &str = "Photo updated";
pub const PASSWORD_CHANGED: &str = "Password changed";
pub const ALL_READ: &str = "All notifications marked as read";

pub const UPDATE_FAILED: &str = "Error updating expense";
pub const DELETE_FAILED: &str = "Failed to delete transaction. Please try again.";
pub const PROFILE_FAILED: &str = "Failed to update info";
pub const PHOTO_FAILED: &str = "Failed to upload photo";
pub const PREFS_FAILED: &str = "Could not save preferences.";
pub const PASSWORD_FAILED: &str = "Failed to change password";
pub const LOAD_FAILED: &str = "Could not load your data.";

/// API client plus local storage; every page of the app goes through here.
pub struct Session {
    api: FinanceApi,
    store: Mutex<LocalStore>,
}

impl Session {
    pub fn new(api: FinanceApi, store: LocalStore) -> Self {
        Self {
            api,
            store: Mutex::new(store),
        }
    }

    pub fn api_url(&self) -> &str {
        self.api.base_url()
    }

    fn store(&self) -> MutexGuard<'_, LocalStore> {
        // a panic elsewhere cannot leave the key-value table half-written
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stored token or `NotSignedIn`, checked before any authenticated call.
    fn token(&self) -> ApiResult<String> {
        self.store().token()?.ok_or(ApiError::NotSignedIn)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.store().token(), Ok(Some(_)))
    }

    pub fn current_user(&self) -> Option<User> {
        self.store().cached_user().ok().flatten()
    }

    /// Cached user again if another process touched storage since the last check.
    pub fn reload_if_changed(&self) -> ApiResult<Option<Option<User>>> {
        let mut store = self.store();
        if store.has_external_changes()? {
            tracing::debug!("storage changed outside this process");
            return Ok(Some(store.cached_user()?));
        }
        Ok(None)
    }

    // ========================================================================
    // ACCOUNT
    // ========================================================================

    pub async fn sign_in(&self, form: &SignInForm) -> ApiResult<User> {
        let credentials = form.to_request()?;
        let auth = self.api.login(&credentials).await?;
        self.store().save_session(&auth.token, &auth.user)?;
        tracing::info!("signed in as {}", auth.user.email);
        Ok(auth.user)
    }

    /// Creates the account only; the user still signs in afterwards.
    pub async fn sign_up(&self, form: &SignUpForm) -> ApiResult<String> {
        let request = form.to_request()?;
        self.api.sign_up(&request).await?;
        Ok(SIGNED_UP.to_string())
    }

    pub fn sign_out(&self) -> ApiResult<()> {
        self.store().clear_session()?;
        tracing::info!("signed out");
        Ok(())
    }

    // ========================================================================
    // EXPENSES
    // ========================================================================

    pub async fn expenses(&self) -> ApiResult<Vec<Expense>> {
        let token = self.token()?;
        self.api.list_expenses(&token).await
    }

    pub async fn add_expense(&self, draft: &ExpenseDraft) -> ApiResult<String> {
        let token = self.token()?;
        self.api.add_expense(&token, draft).await?;
        Ok(EXPENSE_ADDED.to_string())
    }

    pub async fn update_expense(&self, id: &str, draft: &ExpenseDraft) -> ApiResult<String> {
        let token = self.token()?;
        self.api.update_expense(&token, id, draft).await?;
        Ok(EXPENSE_UPDATED.to_string())
    }

    pub async fn delete_expense(&self, id: &str) -> ApiResult<String> {
        let token = self.token()?;
        self.api.delete_expense(&token, id).await?;
        Ok(EXPENSE_DELETED.to_string())
    }

    // ========================================================================
    // PROFILE & PREFERENCES
    // ========================================================================

    pub async fn notification_prefs(&self) -> ApiResult<NotificationPrefs> {
        let token = self.token()?;
        self.api.notification_prefs(&token).await
    }

    /// Saved flags are also written into the cached user.
    pub async fn update_notification_prefs(
        &self,
        prefs: &NotificationPrefs,
    ) -> ApiResult<PrefsUpdate> {
        let token = self.token()?;
        let update = self.api.update_notification_prefs(&token, prefs).await?;

        let store = self.store();
        if let Some(mut user) = store.cached_user()? {
            user.notification_prefs = Some(update.prefs.clone());
            store.cache_user(&user)?;
        }
        Ok(update)
    }

    pub async fn edit_profile(&self, form: &ProfileForm) -> ApiResult<(User, String)> {
        let token = self.token()?;
        let update = form.to_request()?;
        let response = self.api.edit_profile(&token, &update).await?;
        self.store().cache_user(&response.user)?;
        let message = response.message.unwrap_or_else(|| PROFILE_SAVED.to_string());
        Ok((response.user, message))
    }

    pub async fn upload_photo(&self, path: &Path) -> ApiResult<(User, String)> {
        let token = self.token()?;
        let response = self.api.upload_photo(&token, path).await?;
        self.store().cache_user(&response.user)?;
        let message = response.message.unwrap_or_else(|| PHOTO_SAVED.to_string());
        Ok((response.user, message))
    }

    pub async fn change_password(&self, form: &PasswordForm) -> ApiResult<String> {
        let change = form.to_request()?;
        let token = self.token()?;
        let message = self.api.change_password(&token, &change).await?;
        Ok(message.unwrap_or_else(|| PASSWORD_CHANGED.to_string()))
    }

    // ========================================================================
    // NOTIFICATIONS FEED
    // ========================================================================

    pub async fn notifications(&self) -> ApiResult<Vec<Notification>> {
        let token = self.token()?;
        self.api.notifications(&token).await
    }

    pub async fn mark_all_read(&self) -> ApiResult<String> {
        let token = self.token()?;
        self.api.mark_all_notifications_read(&token).await?;
        Ok(ALL_READ.to_string())
    }

    // ========================================================================
    // THEME
    // ========================================================================

    pub fn theme(&self, fallback: Theme) -> Theme {
        let stored = self.store().theme().ok().flatten();
        let hint = std::env::var("COLORFGBG").ok();
        Theme::resolve(stored.map(|t| t.as_str()), hint.as_deref(), fallback)
    }

    pub fn set_theme(&self, theme: Theme) -> ApiResult<()> {
        self.store().set_theme(theme)
    }
}
