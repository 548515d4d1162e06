// 🧭 UI state - pages, filters, modals and request outcomes
// Independent of the terminal backend so it can be driven from tests.
//
// Key presses produce `Command`s (network or storage work). The runner executes
// them off the event loop and feeds the resulting `Outcome`s back through `apply`.

use chrono::{Datelike, Local, NaiveDate};
use std::path::PathBuf;
use std::time::Instant;

use crate::analytics::{self, CategoryFilter, Totals};
use crate::api::PrefsUpdate;
use crate::error::{ApiError, GENERIC_FAILURE};
use crate::forms::{ExpenseForm, PasswordForm, ProfileForm, SignInForm, SignUpForm};
use crate::models::{Category, Expense, ExpenseDraft, Notification, NotificationPrefs, User};
use crate::session::{self, Session};
use crate::theme::Theme;
use crate::toast::Toasts;

/// Rows skipped by PageUp / PageDown
const PAGE_STEP: usize = 20;

// ============================================================================
// KEYS
// ============================================================================

/// Backend-neutral key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Enter,
    Esc,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Backspace,
    Delete,
    PageUp,
    PageDown,
    Home,
    End,
}

// ============================================================================
// PAGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Transactions,
    Analytics,
    Notifications,
    Settings,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Transactions,
        Page::Analytics,
        Page::Notifications,
        Page::Settings,
    ];

    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::Transactions,
            Page::Transactions => Page::Analytics,
            Page::Analytics => Page::Notifications,
            Page::Notifications => Page::Settings,
            Page::Settings => Page::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dashboard => Page::Settings,
            Page::Transactions => Page::Dashboard,
            Page::Analytics => Page::Transactions,
            Page::Notifications => Page::Analytics,
            Page::Settings => Page::Notifications,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Transactions => "Transactions",
            Page::Analytics => "Analytics",
            Page::Notifications => "Notifications",
            Page::Settings => "Settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTab {
    Profile,
    Notifications,
    Security,
}

impl SettingsTab {
    pub fn title(&self) -> &str {
        match self {
            SettingsTab::Profile => "Profile",
            SettingsTab::Notifications => "Notifications",
            SettingsTab::Security => "Security",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth(AuthMode),
    Main,
}

// ============================================================================
// FORM FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    /// Cycles through the category set with Left / Right
    Category,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
}

impl Field {
    fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self { label, kind: FieldKind::Text, value: value.into() }
    }

    fn secret(label: &'static str) -> Self {
        Self { label, kind: FieldKind::Secret, value: String::new() }
    }

    /// What the renderer shows.
    pub fn display(&self) -> String {
        match self.kind {
            FieldKind::Secret => "•".repeat(self.value.chars().count()),
            FieldKind::Category => format!("◂ {} ▸", self.value),
            FieldKind::Text => self.value.clone(),
        }
    }
}

/// A vertical list of inputs with one focused field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl FieldSet {
    fn new(fields: Vec<Field>) -> Self {
        Self { fields, focus: 0 }
    }

    pub fn value(&self, idx: usize) -> String {
        self.fields.get(idx).map(|f| f.value.clone()).unwrap_or_default()
    }

    pub fn set_value(&mut self, idx: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(idx) {
            field.value = value.into();
        }
    }

    /// Editing keys; returns false for keys the field set does not use.
    fn edit(&mut self, key: Key) -> bool {
        let len = self.fields.len();
        if len == 0 {
            return false;
        }
        match key {
            Key::Tab | Key::Down => self.focus = (self.focus + 1) % len,
            Key::BackTab | Key::Up => self.focus = (self.focus + len - 1) % len,
            Key::Left | Key::Right => {
                let field = &mut self.fields[self.focus];
                if field.kind != FieldKind::Category {
                    return false;
                }
                let mut form = ExpenseForm {
                    category: Category::from(field.value.clone()),
                    ..ExpenseForm::default()
                };
                if key == Key::Right {
                    form.next_category();
                } else {
                    form.previous_category();
                }
                field.value = form.category.to_string();
            }
            Key::Backspace => {
                let field = &mut self.fields[self.focus];
                if field.kind != FieldKind::Category {
                    field.value.pop();
                }
            }
            Key::Char(c) => {
                let field = &mut self.fields[self.focus];
                if field.kind != FieldKind::Category {
                    field.value.push(c);
                }
            }
            _ => return false,
        }
        true
    }

    fn expense(form: &ExpenseForm) -> Self {
        let mut category = Field::text("Category", form.category.to_string());
        category.kind = FieldKind::Category;
        Self::new(vec![
            Field::text("Amount", form.amount.clone()),
            category,
            Field::text("Date (YYYY-MM-DD)", form.date.clone()),
            Field::text("Notes", form.notes.clone()),
        ])
    }

    fn to_expense_form(&self) -> ExpenseForm {
        ExpenseForm {
            amount: self.value(0),
            category: Category::from(self.value(1)),
            date: self.value(2),
            notes: self.value(3),
        }
    }

    fn sign_in() -> Self {
        Self::new(vec![Field::text("Email", ""), Field::secret("Password")])
    }

    fn sign_up() -> Self {
        Self::new(vec![
            Field::text("Full Name", ""),
            Field::text("Email", ""),
            Field::secret("Password"),
            Field::secret("Confirm Password"),
        ])
    }

    fn profile(form: &ProfileForm) -> Self {
        Self::new(vec![
            Field::text("Name", form.name.clone()),
            Field::text("Email", form.email.clone()),
        ])
    }

    fn photo() -> Self {
        Self::new(vec![Field::text("Image path", "")])
    }

    fn password() -> Self {
        Self::new(vec![
            Field::secret("Current Password"),
            Field::secret("New Password"),
            Field::secret("Confirm New Password"),
        ])
    }
}

// ============================================================================
// MODALS, COMMANDS, OUTCOMES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    AddExpense(FieldSet),
    EditExpense { id: String, fields: FieldSet },
    ConfirmDelete { id: String, summary: String },
    EditProfile(FieldSet),
    UploadPhoto(FieldSet),
    ChangePassword(FieldSet),
}

impl Modal {
    pub fn title(&self) -> &str {
        match self {
            Modal::AddExpense(_) => "Add Expense",
            Modal::EditExpense { .. } => "Edit Expense",
            Modal::ConfirmDelete { .. } => "Delete Transaction",
            Modal::EditProfile(_) => "Personal Information",
            Modal::UploadPhoto(_) => "Profile Photo",
            Modal::ChangePassword(_) => "Change Password",
        }
    }

    pub fn fields(&self) -> Option<&FieldSet> {
        match self {
            Modal::AddExpense(f)
            | Modal::EditProfile(f)
            | Modal::UploadPhoto(f)
            | Modal::ChangePassword(f) => Some(f),
            Modal::EditExpense { fields, .. } => Some(fields),
            Modal::ConfirmDelete { .. } => None,
        }
    }

    fn fields_mut(&mut self) -> Option<&mut FieldSet> {
        match self {
            Modal::AddExpense(f)
            | Modal::EditProfile(f)
            | Modal::UploadPhoto(f)
            | Modal::ChangePassword(f) => Some(f),
            Modal::EditExpense { fields, .. } => Some(fields),
            Modal::ConfirmDelete { .. } => None,
        }
    }
}

/// Work the runner performs on behalf of the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SignIn(SignInForm),
    SignUp(SignUpForm),
    SignOut,
    LoadExpenses,
    LoadNotifications,
    LoadPrefs,
    AddExpense(ExpenseDraft),
    UpdateExpense { id: String, draft: ExpenseDraft },
    DeleteExpense { id: String },
    SavePrefs(NotificationPrefs),
    SaveProfile(ProfileForm),
    UploadPhoto(PathBuf),
    ChangePassword(PasswordForm),
    MarkAllRead,
    SaveTheme(Theme),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    SignedIn(User),
    SignedUp(String),
    SignedOut,
    ExpensesLoaded(Vec<Expense>),
    NotificationsLoaded(Vec<Notification>),
    PrefsLoaded(NotificationPrefs),
    ExpenseAdded(String),
    ExpenseUpdated { id: String, draft: ExpenseDraft, message: String },
    ExpenseDeleted { id: String, message: String },
    PrefsSaved(PrefsUpdate),
    ProfileSaved { user: User, message: String },
    PasswordChanged(String),
    AllRead(String),
    ThemeSaved,
    Failed { message: String, needs_sign_in: bool },
}

impl Outcome {
    fn failed(err: ApiError, fallback: &str) -> Self {
        Outcome::Failed {
            message: err.user_message(fallback),
            needs_sign_in: matches!(err, ApiError::NotSignedIn),
        }
    }
}

/// Run one command against the session.
pub async fn execute(session: &Session, command: Command) -> Outcome {
    match command {
        Command::SignIn(form) => match session.sign_in(&form).await {
            Ok(user) => Outcome::SignedIn(user),
            Err(e) => Outcome::failed(e, GENERIC_FAILURE),
        },
        Command::SignUp(form) => match session.sign_up(&form).await {
            Ok(message) => Outcome::SignedUp(message),
            Err(e) => Outcome::failed(e, GENERIC_FAILURE),
        },
        Command::SignOut => match session.sign_out() {
            Ok(()) => Outcome::SignedOut,
            Err(e) => Outcome::failed(e, GENERIC_FAILURE),
        },
        Command::LoadExpenses => match session.expenses().await {
            Ok(expenses) => Outcome::ExpensesLoaded(expenses),
            Err(e) => Outcome::failed(e, session::LOAD_FAILED),
        },
        Command::LoadNotifications => match session.notifications().await {
            Ok(list) => Outcome::NotificationsLoaded(list),
            Err(e) => Outcome::failed(e, session::LOAD_FAILED),
        },
        Command::LoadPrefs => match session.notification_prefs().await {
            Ok(prefs) => Outcome::PrefsLoaded(prefs),
            Err(e) => Outcome::failed(e, session::LOAD_FAILED),
        },
        Command::AddExpense(draft) => match session.add_expense(&draft).await {
            Ok(message) => Outcome::ExpenseAdded(message),
            Err(e) => Outcome::failed(e, GENERIC_FAILURE),
        },
        Command::UpdateExpense { id, draft } => match session.update_expense(&id, &draft).await {
            Ok(message) => Outcome::ExpenseUpdated { id, draft, message },
            Err(e) => Outcome::failed(e, session::UPDATE_FAILED),
        },
        Command::DeleteExpense { id } => match session.delete_expense(&id).await {
            Ok(message) => Outcome::ExpenseDeleted { id, message },
            Err(e) => Outcome::failed(e, session::DELETE_FAILED),
        },
        Command::SavePrefs(prefs) => match session.update_notification_prefs(&prefs).await {
            Ok(update) => Outcome::PrefsSaved(update),
            Err(e) => Outcome::failed(e, session::PREFS_FAILED),
        },
        Command::SaveProfile(form) => match session.edit_profile(&form).await {
            Ok((user, message)) => Outcome::ProfileSaved { user, message },
            Err(e) => Outcome::failed(e, session::PROFILE_FAILED),
        },
        Command::UploadPhoto(path) => match session.upload_photo(&path).await {
            Ok((user, message)) => Outcome::ProfileSaved { user, message },
            Err(e) => Outcome::failed(e, session::PHOTO_FAILED),
        },
        Command::ChangePassword(form) => match session.change_password(&form).await {
            Ok(message) => Outcome::PasswordChanged(message),
            Err(e) => Outcome::failed(e, session::PASSWORD_FAILED),
        },
        Command::MarkAllRead => match session.mark_all_read().await {
            Ok(message) => Outcome::AllRead(message),
            Err(e) => Outcome::failed(e, GENERIC_FAILURE),
        },
        Command::SaveTheme(theme) => match session.set_theme(theme) {
            Ok(()) => Outcome::ThemeSaved,
            Err(e) => Outcome::failed(e, GENERIC_FAILURE),
        },
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    pub screen: Screen,
    pub auth_fields: FieldSet,
    pub page: Page,
    pub expenses: Vec<Expense>,
    pub filtered_expenses: Vec<Expense>,
    pub selected: Option<usize>,
    pub filter: CategoryFilter,
    pub show_detail: bool,
    pub show_balance: bool,
    pub modal: Option<Modal>,
    pub settings_tab: SettingsTab,
    pub prefs: NotificationPrefs,
    pub pref_cursor: usize,
    pub notifications: Vec<Notification>,
    pub user: Option<User>,
    pub theme: Theme,
    pub toasts: Toasts,
    pub in_flight: usize,
    pub should_quit: bool,
    pub today: NaiveDate,
    pub currency: String,
    pub api_url: String,
}

impl App {
    pub fn new(user: Option<User>, theme: Theme, currency: &str, api_url: &str) -> Self {
        let screen = if user.is_some() {
            Screen::Main
        } else {
            Screen::Auth(AuthMode::SignIn)
        };
        let prefs = user
            .as_ref()
            .and_then(|u| u.notification_prefs.clone())
            .unwrap_or_default();

        Self {
            screen,
            auth_fields: FieldSet::sign_in(),
            page: Page::Dashboard,
            expenses: Vec::new(),
            filtered_expenses: Vec::new(),
            selected: None,
            filter: CategoryFilter::All,
            show_detail: false,
            show_balance: false,
            modal: None,
            settings_tab: SettingsTab::Profile,
            prefs,
            pref_cursor: 0,
            notifications: Vec::new(),
            user,
            theme,
            toasts: Toasts::default(),
            in_flight: 0,
            should_quit: false,
            today: Local::now().date_naive(),
            currency: currency.to_string(),
            api_url: api_url.to_string(),
        }
    }

    /// Requests to fire right after start-up.
    pub fn startup_commands(&self) -> Vec<Command> {
        match self.screen {
            Screen::Main => vec![Command::LoadExpenses, Command::LoadNotifications],
            Screen::Auth(_) => Vec::new(),
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.toasts.prune(now);
    }

    // ========================================================================
    // DERIVED STATE
    // ========================================================================

    pub fn totals(&self) -> Totals {
        analytics::totals(&self.expenses)
    }

    pub fn this_month_spending(&self) -> f64 {
        analytics::month_spending(&self.expenses, self.today.year(), self.today.month())
    }

    pub fn balance_change(&self) -> f64 {
        let current = analytics::monthly_balance(&self.expenses, self.today, 0);
        let last = analytics::monthly_balance(&self.expenses, self.today, 1);
        analytics::balance_change(current, last)
    }

    pub fn unread_count(&self) -> usize {
        analytics::unread_count(&self.notifications)
    }

    pub fn money(&self, value: f64) -> String {
        analytics::format_amount(value, &self.currency)
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        self.selected.and_then(|i| self.filtered_expenses.get(i))
    }

    // ========================================================================
    // FILTER & SELECTION
    // ========================================================================

    pub fn apply_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
        self.refilter();
        // Reset selection to first item
        self.selected = if self.filtered_expenses.is_empty() { None } else { Some(0) };
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(CategoryFilter::All);
    }

    /// Rebuild the visible list, keeping the selection in range.
    fn refilter(&mut self) {
        self.filtered_expenses = analytics::filter(&self.expenses, &self.filter)
            .into_iter()
            .cloned()
            .collect();
        let len = self.filtered_expenses.len();
        self.selected = match (self.selected, len) {
            (_, 0) => None,
            (Some(i), _) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
    }

    pub fn next(&mut self) {
        let len = self.filtered_expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    pub fn previous(&mut self) {
        let len = self.filtered_expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.selected {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    pub fn page_down(&mut self) {
        let len = self.filtered_expenses.len();
        if len == 0 {
            return;
        }
        let i = self.selected.map(|i| (i + PAGE_STEP).min(len - 1)).unwrap_or(0);
        self.selected = Some(i);
    }

    pub fn page_up(&mut self) {
        if self.filtered_expenses.is_empty() {
            return;
        }
        let i = self.selected.map(|i| i.saturating_sub(PAGE_STEP)).unwrap_or(0);
        self.selected = Some(i);
    }

    // ========================================================================
    // MODALS
    // ========================================================================

    pub fn open_add(&mut self) {
        let form = ExpenseForm {
            date: self.today.format("%Y-%m-%d").to_string(),
            ..ExpenseForm::default()
        };
        self.modal = Some(Modal::AddExpense(FieldSet::expense(&form)));
    }

    pub fn open_edit(&mut self) {
        if let Some(expense) = self.selected_expense() {
            let fields = FieldSet::expense(&ExpenseForm::from_expense(expense));
            self.modal = Some(Modal::EditExpense { id: expense.id.clone(), fields });
        }
    }

    pub fn open_delete(&mut self) {
        if let Some(expense) = self.selected_expense() {
            let summary = format!(
                "{} {} on {}",
                expense.category,
                analytics::format_amount(expense.amount, &self.currency),
                analytics::format_date(&expense.date)
            );
            self.modal = Some(Modal::ConfirmDelete { id: expense.id.clone(), summary });
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    fn submit_modal(&mut self) -> Vec<Command> {
        let modal = match &self.modal {
            Some(m) => m,
            None => return Vec::new(),
        };

        let result: Result<Command, ApiError> = match modal {
            Modal::AddExpense(fields) => fields.to_expense_form().to_draft().map(Command::AddExpense),
            Modal::EditExpense { id, fields } => fields
                .to_expense_form()
                .to_draft()
                .map(|draft| Command::UpdateExpense { id: id.clone(), draft }),
            Modal::ConfirmDelete { id, .. } => Ok(Command::DeleteExpense { id: id.clone() }),
            Modal::EditProfile(fields) => {
                let form = ProfileForm { name: fields.value(0), email: fields.value(1) };
                form.to_request().map(|_| Command::SaveProfile(form))
            }
            Modal::UploadPhoto(fields) => {
                let raw = fields.value(0);
                if raw.trim().is_empty() {
                    Err(ApiError::Validation("Image path is required".to_string()))
                } else {
                    Ok(Command::UploadPhoto(PathBuf::from(raw.trim())))
                }
            }
            Modal::ChangePassword(fields) => {
                let form = PasswordForm {
                    current_password: fields.value(0),
                    new_password: fields.value(1),
                    confirm_password: fields.value(2),
                };
                form.to_request().map(|_| Command::ChangePassword(form))
            }
        };

        match result {
            Ok(command) => vec![command],
            Err(e) => {
                self.toasts.error(e.user_message(GENERIC_FAILURE));
                Vec::new()
            }
        }
    }

    // ========================================================================
    // KEY HANDLING
    // ========================================================================

    pub fn handle_key(&mut self, key: Key) -> Vec<Command> {
        if let Screen::Auth(mode) = self.screen {
            return self.handle_auth_key(mode, key);
        }
        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }

        match key {
            Key::Char('q') | Key::Esc => {
                self.should_quit = true;
                return Vec::new();
            }
            Key::Tab => {
                self.page = self.page.next();
                return self.entered_page();
            }
            Key::BackTab => {
                self.page = self.page.previous();
                return self.entered_page();
            }
            Key::Char('d') => return self.toggle_theme(),
            Key::Char('r') => return vec![Command::LoadExpenses, Command::LoadNotifications],
            Key::Char('a') if self.page != Page::Settings => {
                self.open_add();
                return Vec::new();
            }
            _ => {}
        }

        match self.page {
            Page::Dashboard => {
                if key == Key::Char('b') {
                    self.show_balance = !self.show_balance;
                }
                Vec::new()
            }
            Page::Transactions => self.handle_transactions_key(key),
            Page::Analytics => {
                self.handle_filter_key(key);
                Vec::new()
            }
            Page::Notifications => {
                if key == Key::Char('m') && self.unread_count() > 0 {
                    // optimistic: the list shows read straight away
                    for n in &mut self.notifications {
                        n.read = true;
                    }
                    return vec![Command::MarkAllRead];
                }
                Vec::new()
            }
            Page::Settings => self.handle_settings_key(key),
        }
    }

    fn entered_page(&mut self) -> Vec<Command> {
        if self.page == Page::Settings && self.settings_tab == SettingsTab::Notifications {
            return vec![Command::LoadPrefs];
        }
        Vec::new()
    }

    pub fn toggle_theme(&mut self) -> Vec<Command> {
        self.theme = self.theme.toggled();
        vec![Command::SaveTheme(self.theme)]
    }

    fn handle_filter_key(&mut self, key: Key) -> bool {
        match key {
            Key::Char('f') => self.apply_filter(self.filter.next()),
            Key::Char('F') => self.apply_filter(self.filter.previous()),
            Key::Char('c') => self.clear_filter(),
            _ => return false,
        }
        true
    }

    fn handle_transactions_key(&mut self, key: Key) -> Vec<Command> {
        if self.handle_filter_key(key) {
            return Vec::new();
        }
        match key {
            Key::Down | Key::Char('j') => self.next(),
            Key::Up | Key::Char('k') => self.previous(),
            Key::PageDown => self.page_down(),
            Key::PageUp => self.page_up(),
            Key::Home => {
                if !self.filtered_expenses.is_empty() {
                    self.selected = Some(0);
                }
            }
            Key::End => {
                if !self.filtered_expenses.is_empty() {
                    self.selected = Some(self.filtered_expenses.len() - 1);
                }
            }
            Key::Enter => self.show_detail = !self.show_detail,
            Key::Char('e') => self.open_edit(),
            Key::Char('x') | Key::Delete => self.open_delete(),
            _ => {}
        }
        Vec::new()
    }

    fn handle_settings_key(&mut self, key: Key) -> Vec<Command> {
        match key {
            Key::Char('1') => self.settings_tab = SettingsTab::Profile,
            Key::Char('2') => {
                self.settings_tab = SettingsTab::Notifications;
                return vec![Command::LoadPrefs];
            }
            Key::Char('3') => self.settings_tab = SettingsTab::Security,
            Key::Char('o') => return vec![Command::SignOut],
            _ => match self.settings_tab {
                SettingsTab::Profile => match key {
                    Key::Char('e') => {
                        let form = self.user.as_ref().map(ProfileForm::from_user).unwrap_or_default();
                        self.modal = Some(Modal::EditProfile(FieldSet::profile(&form)));
                    }
                    Key::Char('p') => self.modal = Some(Modal::UploadPhoto(FieldSet::photo())),
                    _ => {}
                },
                SettingsTab::Notifications => {
                    let n = NotificationPrefs::KEYS.len();
                    match key {
                        Key::Down | Key::Char('j') => self.pref_cursor = (self.pref_cursor + 1) % n,
                        Key::Up | Key::Char('k') => self.pref_cursor = (self.pref_cursor + n - 1) % n,
                        Key::Char(' ') | Key::Enter => {
                            self.prefs.toggle(NotificationPrefs::KEYS[self.pref_cursor]);
                        }
                        Key::Char('s') => return vec![Command::SavePrefs(self.prefs.clone())],
                        _ => {}
                    }
                }
                SettingsTab::Security => {
                    if key == Key::Char('c') {
                        self.modal = Some(Modal::ChangePassword(FieldSet::password()));
                    }
                }
            },
        }
        Vec::new()
    }

    fn handle_modal_key(&mut self, key: Key) -> Vec<Command> {
        if let Some(Modal::ConfirmDelete { .. }) = self.modal {
            return match key {
                Key::Char('y') | Key::Enter => self.submit_modal(),
                Key::Char('n') | Key::Esc => {
                    self.close_modal();
                    Vec::new()
                }
                _ => Vec::new(),
            };
        }

        match key {
            Key::Esc => {
                self.close_modal();
                Vec::new()
            }
            Key::Enter => self.submit_modal(),
            other => {
                if let Some(fields) = self.modal.as_mut().and_then(Modal::fields_mut) {
                    fields.edit(other);
                }
                Vec::new()
            }
        }
    }

    fn handle_auth_key(&mut self, mode: AuthMode, key: Key) -> Vec<Command> {
        match key {
            Key::Esc => self.should_quit = true,
            Key::Ctrl('s') => {
                let next = match mode {
                    AuthMode::SignIn => AuthMode::SignUp,
                    AuthMode::SignUp => AuthMode::SignIn,
                };
                self.show_auth(next);
            }
            Key::Enter => {
                let f = &self.auth_fields;
                let command = match mode {
                    AuthMode::SignIn => {
                        let form = SignInForm { email: f.value(0), password: f.value(1) };
                        form.to_request().map(|_| Command::SignIn(form))
                    }
                    AuthMode::SignUp => {
                        let form = SignUpForm {
                            name: f.value(0),
                            email: f.value(1),
                            password: f.value(2),
                            confirm_password: f.value(3),
                        };
                        form.to_request().map(|_| Command::SignUp(form))
                    }
                };
                match command {
                    Ok(command) => return vec![command],
                    Err(e) => self.toasts.error(e.user_message(GENERIC_FAILURE)),
                }
            }
            other => {
                self.auth_fields.edit(other);
            }
        }
        Vec::new()
    }

    fn show_auth(&mut self, mode: AuthMode) {
        self.screen = Screen::Auth(mode);
        self.auth_fields = match mode {
            AuthMode::SignIn => FieldSet::sign_in(),
            AuthMode::SignUp => FieldSet::sign_up(),
        };
    }

    // ========================================================================
    // OUTCOMES
    // ========================================================================

    /// Merge a finished request into UI state; may ask for follow-up requests.
    pub fn apply(&mut self, outcome: Outcome) -> Vec<Command> {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            Outcome::SignedIn(user) => {
                self.prefs = user.notification_prefs.clone().unwrap_or_default();
                self.user = Some(user);
                self.screen = Screen::Main;
                self.page = Page::Dashboard;
                self.auth_fields = FieldSet::sign_in();
                self.toasts.success(session::SIGNED_IN);
                return vec![Command::LoadExpenses, Command::LoadNotifications];
            }
            Outcome::SignedUp(message) => {
                self.toasts.success(message);
                self.show_auth(AuthMode::SignIn);
            }
            Outcome::SignedOut => self.reset_to_sign_in(),
            Outcome::ExpensesLoaded(expenses) => {
                self.expenses = expenses;
                self.refilter();
            }
            Outcome::NotificationsLoaded(list) => self.notifications = list,
            Outcome::PrefsLoaded(prefs) => self.prefs = prefs,
            Outcome::ExpenseAdded(message) => {
                self.toasts.success(message);
                self.close_modal();
                return vec![Command::LoadExpenses];
            }
            Outcome::ExpenseUpdated { id, draft, message } => {
                if let Some(expense) = self.expenses.iter_mut().find(|e| e.id == id) {
                    expense.apply(&draft);
                }
                self.refilter();
                self.toasts.success(message);
                self.close_modal();
            }
            Outcome::ExpenseDeleted { id, message } => {
                self.expenses.retain(|e| e.id != id);
                self.refilter();
                self.toasts.success(message);
                self.close_modal();
            }
            Outcome::PrefsSaved(update) => {
                self.prefs = update.prefs.clone();
                if let Some(user) = self.user.as_mut() {
                    user.notification_prefs = Some(update.prefs);
                }
                self.toasts
                    .success(update.message.unwrap_or_else(|| session::PREFS_SAVED.to_string()));
            }
            Outcome::ProfileSaved { user, message } => {
                self.user = Some(user);
                self.toasts.success(message);
                self.close_modal();
            }
            Outcome::PasswordChanged(message) => {
                self.toasts.success(message);
                self.close_modal();
            }
            Outcome::AllRead(message) => self.toasts.success(message),
            Outcome::ThemeSaved => {}
            Outcome::Failed { message, needs_sign_in } => {
                self.toasts.error(message);
                if needs_sign_in {
                    self.reset_to_sign_in();
                }
            }
        }
        Vec::new()
    }

    /// Another terminal signed in or out; follow it.
    pub fn user_changed(&mut self, user: Option<User>) -> Vec<Command> {
        match user {
            Some(user) => {
                let was_signed_out = self.screen != Screen::Main;
                self.user = Some(user);
                if was_signed_out {
                    self.screen = Screen::Main;
                    return vec![Command::LoadExpenses, Command::LoadNotifications];
                }
            }
            None => {
                if self.screen == Screen::Main {
                    self.reset_to_sign_in();
                }
            }
        }
        Vec::new()
    }

    fn reset_to_sign_in(&mut self) {
        self.user = None;
        self.expenses.clear();
        self.filtered_expenses.clear();
        self.notifications.clear();
        self.selected = None;
        self.modal = None;
        self.show_balance = false;
        self.show_auth(AuthMode::SignIn);
    }
}
