// FinTracker - Core Library
// Exposes all modules for use in the CLI, the terminal UI, and tests

pub mod analytics;
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod forms;
pub mod logging;
pub mod models;
pub mod session;
pub mod storage;
pub mod theme;
pub mod toast;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use analytics::{CategoryFilter, CategoryTotal, MonthlySpending, Totals};
pub use api::{FinanceApi, PrefsUpdate};
pub use app::{App, Command, Outcome};
pub use config::Settings;
pub use error::{ApiError, ApiResult, GENERIC_FAILURE};
pub use forms::{ExpenseForm, PasswordForm, ProfileForm, SignInForm, SignUpForm};
pub use models::{Category, Expense, ExpenseDraft, Notification, NotificationPrefs, User};
pub use session::Session;
pub use storage::LocalStore;
pub use theme::Theme;
pub use toast::{Toast, ToastKind, Toasts};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
