// 📊 Derived state for tables and charts
// Linear reductions over the in-memory expense list. Nothing here is stored.

use chrono::{Datelike, NaiveDate};

use crate::models::{parse_day, Category, Expense, Notification};

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ============================================================================
// FILTERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => category
                .as_str()
                .eq_ignore_ascii_case(expense.category.as_str()),
        }
    }

    /// Lowercase label as shown in the filter selector ("all", "food", ...).
    pub fn label(&self) -> String {
        match self {
            CategoryFilter::All => "all".to_string(),
            CategoryFilter::Only(category) => category.as_str().to_lowercase(),
        }
    }

    /// Cycle order: all, then the closed category set, then back to all.
    pub fn next(&self) -> Self {
        let idx = self.position();
        Self::choice((idx + 1) % (Category::ALL.len() + 1))
    }

    pub fn previous(&self) -> Self {
        let n = Category::ALL.len() + 1;
        let idx = self.position();
        Self::choice((idx + n - 1) % n)
    }

    fn position(&self) -> usize {
        match self {
            CategoryFilter::All => 0,
            CategoryFilter::Only(category) => Category::ALL
                .iter()
                .position(|c| c == category)
                .map(|i| i + 1)
                .unwrap_or(0),
        }
    }

    fn choice(idx: usize) -> Self {
        if idx == 0 {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(Category::ALL[idx - 1].clone())
        }
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse::<Category>().map(CategoryFilter::Only)
    }
}

pub fn filter<'a>(expenses: &'a [Expense], by: &CategoryFilter) -> Vec<&'a Expense> {
    expenses.iter().filter(|e| by.matches(e)).collect()
}

fn dated_in(expense: &Expense, year: i32, month: u32) -> bool {
    expense
        .day()
        .map(|d| d.year() == year && d.month() == month)
        .unwrap_or(false)
}

/// Entries dated in the given calendar month. Undated entries never match.
pub fn in_month(expenses: &[Expense], year: i32, month: u32) -> Vec<&Expense> {
    expenses.iter().filter(|e| dated_in(e, year, month)).collect()
}

/// Category filter, then the optional `(year, month)`.
pub fn select<'a>(
    expenses: &'a [Expense],
    by: &CategoryFilter,
    month: Option<(i32, u32)>,
) -> Vec<&'a Expense> {
    let mut selected = filter(expenses, by);
    if let Some((year, month)) = month {
        selected.retain(|e| dated_in(e, year, month));
    }
    selected
}

/// Parses `YYYY-MM` as used by `--month`.
pub fn parse_month(raw: &str) -> Option<(i32, u32)> {
    let day = parse_day(&format!("{}-01", raw.trim()))?;
    Some((day.year(), day.month()))
}

// ============================================================================
// TOTALS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expenses: f64,
}

impl Totals {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

pub fn totals<'a, I>(expenses: I) -> Totals
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut totals = Totals::default();
    for expense in expenses {
        if expense.is_income() {
            totals.income += expense.amount;
        } else {
            totals.expenses += expense.amount;
        }
    }
    totals
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

/// Per-category sums for the chart, in order of first appearance.
pub fn category_totals(expenses: &[Expense], by: &CategoryFilter) -> Vec<CategoryTotal> {
    let mut result: Vec<CategoryTotal> = Vec::new();

    for expense in expenses.iter().filter(|e| by.matches(e)) {
        match result.iter_mut().find(|t| t.category == expense.category) {
            Some(entry) => {
                entry.total += expense.amount;
                entry.count += 1;
            }
            None => result.push(CategoryTotal {
                category: expense.category.clone(),
                total: expense.amount,
                count: 1,
            }),
        }
    }

    result
}

// ============================================================================
// MONTHS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySpending {
    pub name: &'static str,
    pub spending: f64,
}

/// Twelve rows, Jan..Dec, summing every dated entry by month, income included.
/// `year = None` folds every year onto the same twelve months.
pub fn monthly_spending(expenses: &[Expense], year: Option<i32>) -> Vec<MonthlySpending> {
    let mut sums = [0.0_f64; 12];

    for expense in expenses {
        if let Some(day) = expense.day() {
            if year.map(|y| y == day.year()).unwrap_or(true) {
                sums[day.month0() as usize] += expense.amount;
            }
        }
    }

    MONTH_NAMES
        .into_iter()
        .zip(sums)
        .map(|(name, spending)| MonthlySpending { name, spending })
        .collect()
}

/// Sum of every entry in one calendar month, all categories.
pub fn month_spending(expenses: &[Expense], year: i32, month: u32) -> f64 {
    in_month(expenses, year, month).iter().map(|e| e.amount).sum()
}

/// `(year, month)` that is `offset` months before the given one.
pub fn shift_month(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - offset as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Income minus expenses for the month `offset` months before `today`.
pub fn monthly_balance(expenses: &[Expense], today: NaiveDate, offset: u32) -> f64 {
    let (year, month) = shift_month(today.year(), today.month(), offset);
    totals(in_month(expenses, year, month)).net()
}

/// Percent change between two monthly balances.
pub fn balance_change(current: f64, last: f64) -> f64 {
    if last == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current - last) / last.abs() * 100.0
    }
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

// ============================================================================
// FORMATTING
// ============================================================================

/// `₦1,234.50`; negatives carry the sign before the symbol.
pub fn format_amount(value: f64, symbol: &str) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}{}.{}", sign, symbol, grouped, cents)
}

/// `Mar 5, 2024`; unparseable input is returned as-is.
pub fn format_date(raw: &str) -> String {
    match parse_day(raw) {
        Some(day) => day.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(id: &str, amount: f64, category: Category, date: &str) -> Expense {
        Expense {
            id: id.to_string(),
            amount,
            category,
            date: date.to_string(),
            notes: String::new(),
        }
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense("1", 2000.0, Category::Income, "2024-03-01"),
            expense("2", 45.5, Category::Food, "2024-03-02T12:00:00.000Z"),
            expense("3", 120.0, Category::Transport, "2024-03-10"),
            expense("4", 30.0, Category::Food, "2024-02-20"),
            expense("5", 500.0, Category::Income, "2024-02-01"),
            expense("6", 10.0, Category::Bills, "not a date"),
            expense("7", 70.0, Category::Food, "2023-03-15"),
        ]
    }

    #[test]
    fn test_filter_narrows_by_category() {
        let data = sample();
        let food = filter(&data, &CategoryFilter::Only(Category::Food));
        assert_eq!(food.len(), 3);
        assert!(food.iter().all(|e| e.category == Category::Food));

        assert_eq!(filter(&data, &CategoryFilter::All).len(), data.len());

        let case_insensitive = vec![expense("x", 1.0, Category::Other("FOOD ".into()), "")];
        // Other labels only match exactly (ignoring case)
        assert!(filter(&case_insensitive, &CategoryFilter::Only(Category::Food)).is_empty());
    }

    #[test]
    fn test_category_totals_match_filtered_sum() {
        let data = sample();
        for by in [
            CategoryFilter::All,
            CategoryFilter::Only(Category::Food),
            CategoryFilter::Only(Category::Income),
            CategoryFilter::Only(Category::Health),
        ] {
            let chart = category_totals(&data, &by);
            let chart_sum: f64 = chart.iter().map(|t| t.total).sum();
            let input_sum: f64 = filter(&data, &by).iter().map(|e| e.amount).sum();
            assert!((chart_sum - input_sum).abs() < 1e-9, "filter {:?}", by);
        }

        let all = category_totals(&data, &CategoryFilter::All);
        let order: Vec<&str> = all.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(order, vec!["Income", "Food", "Transport", "Bills"]);
        assert_eq!(all[1].count, 3);
        assert!((all[1].total - 145.5).abs() < 1e-9);
    }

    #[test]
    fn test_totals_and_net() {
        let data = sample();
        let t = totals(&data);
        assert!((t.income - 2500.0).abs() < 1e-9);
        assert!((t.expenses - 275.5).abs() < 1e-9);
        assert!((t.net() - 2224.5).abs() < 1e-9);
    }

    #[test]
    fn test_month_filters() {
        let data = sample();
        let march = in_month(&data, 2024, 3);
        assert_eq!(march.len(), 3);
        assert!((month_spending(&data, 2024, 3) - 2165.5).abs() < 1e-9);
        assert!((month_spending(&data, 2024, 2) - 530.0).abs() < 1e-9);
        assert_eq!(month_spending(&data, 2024, 4), 0.0);
        assert_eq!(parse_month("2024-03"), Some((2024, 3)));
        assert_eq!(parse_month("2024-13"), None);
    }

    #[test]
    fn test_select_combines_category_and_month() {
        let data = sample();
        let food = CategoryFilter::Only(Category::Food);

        let march_food: Vec<&str> = select(&data, &food, Some((2024, 3)))
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(march_food, vec!["2"]);

        assert_eq!(select(&data, &food, None).len(), 3);
        assert_eq!(select(&data, &CategoryFilter::All, Some((2024, 2))).len(), 2);
        assert!(select(&data, &CategoryFilter::Only(Category::Bills), Some((2024, 3))).is_empty());
        assert!(select(&data, &food, Some((2025, 3))).is_empty());
    }

    #[test]
    fn test_monthly_spending_rows() {
        let data = sample();
        let this_year = monthly_spending(&data, Some(2024));
        assert_eq!(this_year.len(), 12);
        assert_eq!(this_year[0].name, "Jan");
        // income counts toward the month it is dated in
        assert!((this_year[1].spending - 530.0).abs() < 1e-9);
        assert!((this_year[2].spending - 2165.5).abs() < 1e-9);

        let folded = monthly_spending(&data, None);
        assert!((folded[2].spending - 2235.5).abs() < 1e-9);

        let total: f64 = folded.iter().map(|m| m.spending).sum();
        let all: f64 = data.iter().map(|e| e.amount).sum();
        // the undated bill is the only entry left out
        assert!((total - (all - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_spending_counts_income() {
        let data = vec![
            expense("i", 2000.0, Category::Income, "2024-03-01"),
            expense("f", 50.0, Category::Food, "2024-03-04"),
        ];
        assert!((monthly_spending(&data, Some(2024))[2].spending - 2050.0).abs() < 1e-9);
        assert!((month_spending(&data, 2024, 3) - 2050.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_balance_wraps_year() {
        assert_eq!(shift_month(2024, 1, 1), (2023, 12));
        assert_eq!(shift_month(2024, 3, 0), (2024, 3));
        assert_eq!(shift_month(2024, 3, 15), (2022, 12));

        let data = sample();
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        assert!((monthly_balance(&data, today, 0) - 1834.5).abs() < 1e-9);
        assert!((monthly_balance(&data, today, 1) - 470.0).abs() < 1e-9);

        let january = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let december = vec![expense("d", 90.0, Category::Income, "2023-12-24")];
        assert!((monthly_balance(&december, january, 1) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_balance_change() {
        assert_eq!(balance_change(50.0, 0.0), 100.0);
        assert_eq!(balance_change(-50.0, 0.0), 0.0);
        assert_eq!(balance_change(0.0, 0.0), 0.0);
        assert!((balance_change(150.0, 100.0) - 50.0).abs() < 1e-9);
        assert!((balance_change(-50.0, -100.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_cycle() {
        let mut f = CategoryFilter::All;
        let mut seen = vec![f.label()];
        for _ in 0..Category::ALL.len() {
            f = f.next();
            seen.push(f.label());
        }
        assert_eq!(seen[1], "food");
        assert_eq!(seen.last().unwrap(), "income");
        assert_eq!(f.next(), CategoryFilter::All);
        assert_eq!(CategoryFilter::All.previous(), CategoryFilter::Only(Category::Income));
        assert_eq!("ALL".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_amount(1234.5, "₦"), "₦1,234.50");
        assert_eq!(format_amount(0.0, "$"), "$0.00");
        assert_eq!(format_amount(-1234567.891, "₦"), "-₦1,234,567.89");
        assert_eq!(format_amount(999.999, ""), "1,000.00");
        assert_eq!(format_date("2024-03-05T00:00:00.000Z"), "Mar 5, 2024");
        assert_eq!(format_date("someday"), "someday");
    }

    #[test]
    fn test_unread_count() {
        let notes = vec![
            Notification { id: "a".into(), message: "x".into(), read: false, created_at: None },
            Notification { id: "b".into(), message: "y".into(), read: true, created_at: None },
        ];
        assert_eq!(unread_count(&notes), 1);
    }
}
