// 📝 Form state and presence checks
// Turns what the user typed into request payloads. The server does the real validation.

use crate::error::ApiError;
use crate::models::{
    parse_day, Category, Credentials, Expense, ExpenseDraft, PasswordChange, ProfileUpdate,
    SignUpRequest, User,
};

pub const MIN_PASSWORD_LEN: usize = 6;

fn required(value: &str, label: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::Validation(format!("{} is required", label)))
    } else {
        Ok(trimmed.to_string())
    }
}

// ============================================================================
// EXPENSE FORM (add + edit)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseForm {
    pub amount: String,
    pub category: Category,
    /// `YYYY-MM-DD`
    pub date: String,
    pub notes: String,
}

impl Default for ExpenseForm {
    fn default() -> Self {
        Self {
            amount: String::new(),
            category: Category::Food,
            date: String::new(),
            notes: String::new(),
        }
    }
}

impl ExpenseForm {
    /// Pre-fill from an existing record; dates the client cannot read become empty.
    pub fn from_expense(expense: &Expense) -> Self {
        Self {
            amount: format_plain_amount(expense.amount),
            category: expense.category.clone(),
            date: expense
                .day()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            notes: expense.notes.clone(),
        }
    }

    pub fn to_draft(&self) -> Result<ExpenseDraft, ApiError> {
        let raw_amount = required(&self.amount, "Amount")?;
        let amount: f64 = raw_amount
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| ApiError::Validation("Amount must be a number".to_string()))?;

        let date = required(&self.date, "Date")?;
        if parse_day(&date).is_none() || date.len() != 10 {
            return Err(ApiError::Validation(
                "Date must look like YYYY-MM-DD".to_string(),
            ));
        }

        Ok(ExpenseDraft {
            amount,
            category: self.category.clone(),
            date,
            notes: self.notes.trim().to_string(),
        })
    }

    pub fn next_category(&mut self) {
        self.category = step_category(&self.category, 1);
    }

    pub fn previous_category(&mut self) {
        self.category = step_category(&self.category, Category::ALL.len() - 1);
    }
}

fn step_category(current: &Category, by: usize) -> Category {
    let n = Category::ALL.len();
    let idx = Category::ALL.iter().position(|c| c == current).unwrap_or(0);
    Category::ALL[(idx + by) % n].clone()
}

/// `12.5` rather than `12.50`, `40` rather than `40.0`.
fn format_plain_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

// ============================================================================
// ACCOUNT FORMS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn to_request(&self) -> Result<Credentials, ApiError> {
        Ok(Credentials {
            email: required(&self.email, "Email")?,
            password: required(&self.password, "Password")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    /// Password agreement is left to the server, as the web form did.
    pub fn to_request(&self) -> Result<SignUpRequest, ApiError> {
        Ok(SignUpRequest {
            name: required(&self.name, "Name")?,
            email: required(&self.email, "Email")?,
            password: required(&self.password, "Password")?,
            confirm_password: required(&self.confirm_password, "Password confirmation")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }

    pub fn to_request(&self) -> Result<ProfileUpdate, ApiError> {
        Ok(ProfileUpdate {
            name: required(&self.name, "Name")?,
            email: required(&self.email, "Email")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    pub fn to_request(&self) -> Result<PasswordChange, ApiError> {
        if self.new_password != self.confirm_password {
            return Err(ApiError::Validation("New passwords do not match.".to_string()));
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "Password must be at least {} characters long.",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(PasswordChange {
            current_password: required(&self.current_password, "Current password")?,
            new_password: self.new_password.clone(),
            confirm_new_password: self.confirm_password.clone(),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
