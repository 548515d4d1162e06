use crate::analytics;
use crate::app::{self, App, AuthMode, Command, Key, Modal, Outcome, Page, Screen, SettingsTab};
use crate::models::NotificationPrefs;
use crate::session::Session;
use crate::theme::Theme;
use crate::toast::ToastKind;
use anyhow::Result;
use chrono::Datelike;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const STORAGE_CHECK_INTERVAL: Duration = Duration::from_secs(2);

// ============================================================================
// PALETTE
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Palette {
    bg: Color,
    fg: Color,
    muted: Color,
    accent: Color,
    border: Color,
    positive: Color,
    negative: Color,
    highlight: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Black,
                fg: Color::White,
                muted: Color::DarkGray,
                accent: Color::Yellow,
                border: Color::Cyan,
                positive: Color::Green,
                negative: Color::Red,
                highlight: Color::DarkGray,
            },
            Theme::Light => Self {
                bg: Color::White,
                fg: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                border: Color::Blue,
                positive: Color::Green,
                negative: Color::Red,
                highlight: Color::Gray,
            },
        }
    }

    fn block(&self, title: &str) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border))
            .title(format!(" {} ", title))
    }

    fn label(&self) -> Style {
        Style::default().fg(self.border).add_modifier(Modifier::BOLD)
    }

    fn key(&self) -> Style {
        Style::default().fg(self.accent)
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

pub fn run_ui(handle: Handle, session: Arc<Session>, app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, &handle, &session, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!("ui loop failed: {:?}", err);
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    handle: &Handle,
    session: &Arc<Session>,
    app: &mut App,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();
    let mut last_storage_check = Instant::now();

    let startup = app.startup_commands();
    dispatch(handle, session, &tx, app, startup);

    loop {
        app.tick(Instant::now());
        terminal.draw(|f| ui(f, app))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(key) = map_key(key) {
                        let commands = app.handle_key(key);
                        dispatch(handle, session, &tx, app, commands);
                    }
                }
            }
        }

        while let Ok(outcome) = rx.try_recv() {
            let follow_up = app.apply(outcome);
            dispatch(handle, session, &tx, app, follow_up);
        }

        if last_storage_check.elapsed() >= STORAGE_CHECK_INTERVAL {
            last_storage_check = Instant::now();
            match session.reload_if_changed() {
                Ok(Some(user)) => {
                    let commands = app.user_changed(user);
                    dispatch(handle, session, &tx, app, commands);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("storage check failed: {}", e),
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Each command runs on the runtime; its outcome comes back over the channel.
fn dispatch(
    handle: &Handle,
    session: &Arc<Session>,
    tx: &UnboundedSender<Outcome>,
    app: &mut App,
    commands: Vec<Command>,
) {
    for command in commands {
        app.in_flight += 1;
        let session = Arc::clone(session);
        let tx = tx.clone();
        handle.spawn(async move {
            let outcome = app::execute(&session, command).await;
            // receiver gone means the UI already exited
            let _ = tx.send(outcome);
        });
    }
}

fn map_key(key: KeyEvent) -> Option<Key> {
    let mapped = match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if c == 'c' {
                Key::Esc
            } else {
                Key::Ctrl(c)
            }
        }
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Key::BackTab,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    };
    Some(mapped)
}

// ============================================================================
// LAYOUT
// ============================================================================

fn ui(f: &mut Frame, app: &App) {
    let palette = Palette::for_theme(app.theme);
    f.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        f.size(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    match app.screen {
        Screen::Auth(mode) => {
            render_brand(f, chunks[0], &palette);
            render_auth(f, chunks[1], app, mode, &palette);
        }
        Screen::Main => {
            render_header(f, chunks[0], app, &palette);

            // Content area with optional split for detail panel
            if app.show_detail && app.page == Page::Transactions {
                let content_chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(60), // Transaction list
                        Constraint::Percentage(40), // Detail panel
                    ])
                    .split(chunks[1]);

                render_table(f, content_chunks[0], app, &palette);
                render_detail_panel(f, content_chunks[1], app, &palette);
            } else {
                match app.page {
                    Page::Dashboard => render_dashboard(f, chunks[1], app, &palette),
                    Page::Transactions => render_table(f, chunks[1], app, &palette),
                    Page::Analytics => render_analytics(f, chunks[1], app, &palette),
                    Page::Notifications => render_notifications(f, chunks[1], app, &palette),
                    Page::Settings => render_settings(f, chunks[1], app, &palette),
                }
            }

            if let Some(modal) = &app.modal {
                render_modal(f, chunks[1], modal, &palette);
            }
        }
    }

    render_status_bar(f, chunks[2], app, &palette);
}

fn render_brand(f: &mut Frame, area: Rect, palette: &Palette) {
    let header = Paragraph::new(Line::from(vec![Span::styled(
        "FinTracker",
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
    )]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(palette.border)));
    f.render_widget(header, area);
}

fn render_header(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.page {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(palette.muted)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let unread = app.unread_count();
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("🔔 {}", unread),
        Style::default().fg(if unread > 0 { palette.negative } else { palette.muted }),
    ));

    if let Some(user) = &app.user {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(user.name.clone(), Style::default().fg(palette.fg)));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(palette.border)));

    f.render_widget(header, area);
}

// ============================================================================
// DASHBOARD
// ============================================================================

fn render_dashboard(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(chunks[0]);

    let totals = app.totals();
    let change = app.balance_change();

    let balance_text = if app.show_balance {
        app.money(totals.net())
    } else {
        "••••••".to_string()
    };
    let change_style = Style::default().fg(if change >= 0.0 { palette.positive } else { palette.negative });
    render_card(
        f,
        cards[0],
        "Balance (b)",
        vec![
            Span::styled(balance_text, Style::default().fg(palette.fg).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(format!("{:+.1}%", change), change_style),
        ],
        palette,
    );
    render_card(
        f,
        cards[1],
        "Income",
        vec![Span::styled(app.money(totals.income), Style::default().fg(palette.positive))],
        palette,
    );
    render_card(
        f,
        cards[2],
        "Expenses",
        vec![Span::styled(app.money(totals.expenses), Style::default().fg(palette.negative))],
        palette,
    );
    render_card(
        f,
        cards[3],
        "This Month",
        vec![Span::styled(app.money(app.this_month_spending()), Style::default().fg(palette.accent))],
        palette,
    );

    // Most recent first, as entered on the server
    let rows = app.expenses.iter().rev().take(10).map(|e| {
        let color = if e.is_income() { palette.positive } else { palette.negative };
        Row::new(vec![
            Cell::from(analytics::format_date(&e.date)),
            Cell::from(e.category.to_string()),
            Cell::from(app.money(e.amount)).style(Style::default().fg(color)),
            Cell::from(truncate(&e.notes, 40)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .header(table_header(&["Date", "Category", "Amount", "Notes"], palette))
    .block(palette.block("Recent Transactions"));

    f.render_widget(table, chunks[1]);
}

fn render_card(f: &mut Frame, area: Rect, title: &str, value: Vec<Span<'static>>, palette: &Palette) {
    let card = Paragraph::new(vec![Line::from(""), Line::from(value)]).block(palette.block(title));
    f.render_widget(card, area);
}

fn table_header(titles: &[&'static str], palette: &Palette) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(palette.highlight)).height(1)
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

fn render_table(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let rows = app.filtered_expenses.iter().map(|e| {
        let color = if e.is_income() { palette.positive } else { palette.negative };

        let cells = vec![
            Cell::from(analytics::format_date(&e.date)),
            Cell::from(e.category.to_string()),
            Cell::from(app.money(e.amount)).style(Style::default().fg(color)),
            Cell::from(truncate(&e.notes, 30)),
        ];

        Row::new(cells).height(1)
    });

    let title = format!("Transactions - {}", app.filter.label());
    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .header(table_header(&["Date", "Category", "Amount", "Notes"], palette))
    .block(palette.block(&title))
    .highlight_style(Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    let mut state = TableState::default();
    state.select(app.selected);
    f.render_stateful_widget(table, area, &mut state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let expense = match app.selected_expense() {
        Some(e) => e,
        None => {
            let no_selection = Paragraph::new("No transaction selected").block(palette.block("Transaction Details"));
            f.render_widget(no_selection, area);
            return;
        }
    };

    let amount_color = if expense.is_income() { palette.positive } else { palette.negative };
    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Date: ", palette.label()),
            Span::raw(analytics::format_date(&expense.date)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Category: ", palette.label()),
            Span::raw(expense.category.to_string()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Amount: ", palette.label()),
            Span::styled(app.money(expense.amount), Style::default().fg(amount_color)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Id: ", palette.label()),
            Span::styled(expense.id.clone(), Style::default().fg(palette.muted)),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  NOTES",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                wrap_text(&expense.notes, 35),
                Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  e edit · x delete · Enter close",
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        )]),
    ];

    let detail_panel = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(palette.block("Transaction Details"));

    f.render_widget(detail_panel, area);
}

// ============================================================================
// ANALYTICS
// ============================================================================

fn render_analytics(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    // Bars carry whole units; the labels below them keep the formatted figures
    let by_category = analytics::category_totals(&app.expenses, &app.filter);
    let category_data: Vec<(String, u64)> = by_category
        .iter()
        .map(|c| (truncate(c.category.as_str(), 10), c.total.max(0.0).round() as u64))
        .collect();
    let category_bars: Vec<(&str, u64)> = category_data.iter().map(|(l, v)| (l.as_str(), *v)).collect();

    let title = format!("Spending by Category - {} (f/F filter, c clear)", app.filter.label());
    let chart = BarChart::default()
        .block(palette.block(&title))
        .data(category_bars.as_slice())
        .bar_width(10)
        .bar_gap(2)
        .bar_style(Style::default().fg(palette.accent))
        .value_style(Style::default().fg(palette.bg).bg(palette.accent));
    f.render_widget(chart, chunks[0]);

    let year = app.today.year();
    let monthly = analytics::monthly_spending(&app.expenses, Some(year));
    let monthly_bars: Vec<(&str, u64)> = monthly
        .iter()
        .map(|m| (&m.name[..3], m.spending.max(0.0).round() as u64))
        .collect();

    let title = format!("Monthly Spending {}", year);
    let chart = BarChart::default()
        .block(palette.block(&title))
        .data(monthly_bars.as_slice())
        .bar_width(5)
        .bar_gap(1)
        .bar_style(Style::default().fg(palette.negative))
        .value_style(Style::default().fg(palette.bg).bg(palette.negative));
    f.render_widget(chart, chunks[1]);
}

// ============================================================================
// NOTIFICATIONS
// ============================================================================

fn render_notifications(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let mut content = vec![Line::from("")];

    if app.notifications.is_empty() {
        content.push(Line::from(Span::styled(
            "  No notifications yet",
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    for n in &app.notifications {
        let (marker, style) = if n.read {
            ("  ", Style::default().fg(palette.muted))
        } else {
            ("● ", Style::default().fg(palette.fg).add_modifier(Modifier::BOLD))
        };
        let when = n
            .created_at
            .as_deref()
            .map(analytics::format_date)
            .unwrap_or_default();
        content.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(marker, Style::default().fg(palette.negative)),
            Span::styled(n.message.clone(), style),
            Span::raw("  "),
            Span::styled(when, Style::default().fg(palette.muted)),
        ]));
    }

    let title = format!("Notifications ({} unread, m mark all read)", app.unread_count());
    let list = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(palette.block(&title));
    f.render_widget(list, area);
}

// ============================================================================
// SETTINGS
// ============================================================================

fn render_settings(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let mut tabs = vec![Span::raw("  ")];
    for (i, tab) in [SettingsTab::Profile, SettingsTab::Notifications, SettingsTab::Security]
        .iter()
        .enumerate()
    {
        if i > 0 {
            tabs.push(Span::raw(" │ "));
        }
        let style = if *tab == app.settings_tab {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(palette.muted)
        };
        tabs.push(Span::styled(format!("{} {}", i + 1, tab.title()), style));
    }

    let mut content = vec![Line::from(""), Line::from(tabs), Line::from("")];

    match app.settings_tab {
        SettingsTab::Profile => {
            let (name, email, photo) = match &app.user {
                Some(u) => (
                    u.name.clone(),
                    u.email.clone(),
                    u.photo_location(&app.api_url).unwrap_or_else(|| "none".to_string()),
                ),
                None => Default::default(),
            };
            content.push(Line::from(vec![Span::styled("  Name: ", palette.label()), Span::raw(name)]));
            content.push(Line::from(vec![Span::styled("  Email: ", palette.label()), Span::raw(email)]));
            content.push(Line::from(vec![
                Span::styled("  Photo: ", palette.label()),
                Span::styled(photo, Style::default().fg(palette.muted)),
            ]));
            content.push(Line::from(""));
            content.push(hint_line(&[("e", "edit info"), ("p", "upload photo")], palette));
        }
        SettingsTab::Notifications => {
            let labels = ["Weekly summary", "Budget alerts", "Large transactions"];
            for (i, (key, label)) in NotificationPrefs::KEYS.iter().zip(labels).enumerate() {
                let on = app.prefs.get(key).unwrap_or(false);
                let cursor = if i == app.pref_cursor { "→ " } else { "  " };
                content.push(Line::from(vec![
                    Span::styled(format!("  {}", cursor), Style::default().fg(palette.accent)),
                    Span::styled(
                        if on { "[x] " } else { "[ ] " },
                        Style::default().fg(if on { palette.positive } else { palette.muted }),
                    ),
                    Span::raw(label),
                ]));
            }
            content.push(Line::from(""));
            content.push(hint_line(&[("Space", "toggle"), ("s", "save")], palette));
        }
        SettingsTab::Security => {
            content.push(Line::from(vec![
                Span::styled("  Theme: ", palette.label()),
                Span::raw(app.theme.as_str()),
            ]));
            content.push(Line::from(""));
            content.push(hint_line(&[("c", "change password"), ("d", "toggle theme")], palette));
        }
    }

    content.push(Line::from(""));
    content.push(hint_line(&[("o", "log out")], palette));

    let panel = Paragraph::new(content).block(palette.block("Settings"));
    f.render_widget(panel, area);
}

fn hint_line(hints: &[(&'static str, &'static str)], palette: &Palette) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (i, (key, what)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" · "));
        }
        spans.push(Span::styled(*key, palette.key()));
        spans.push(Span::styled(format!(" {}", what), Style::default().fg(palette.muted)));
    }
    Line::from(spans)
}

// ============================================================================
// FORMS
// ============================================================================

fn field_lines(fields: &app::FieldSet, palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    for (i, field) in fields.fields.iter().enumerate() {
        let focused = i == fields.focus;
        let label_style = if focused {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            palette.label()
        };
        let cursor = if focused { "▏" } else { "" };
        lines.push(Line::from(vec![Span::styled(format!("  {}", field.label), label_style)]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("{}{}", field.display(), cursor), Style::default().fg(palette.fg)),
        ]));
    }
    lines.push(Line::from(""));
    lines
}

fn render_auth(f: &mut Frame, area: Rect, app: &App, mode: AuthMode, palette: &Palette) {
    let rect = centered_rect(50, 70, area);
    let (title, switch) = match mode {
        AuthMode::SignIn => ("Sign In", "Ctrl-S create an account"),
        AuthMode::SignUp => ("Create Account", "Ctrl-S back to sign in"),
    };

    let mut lines = field_lines(&app.auth_fields, palette);
    lines.push(hint_line(&[("Enter", "submit"), ("Tab", "next field")], palette));
    lines.push(Line::from(vec![Span::raw("  "), Span::styled(switch, Style::default().fg(palette.muted))]));

    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(lines).block(palette.block(title)), rect);
}

fn render_modal(f: &mut Frame, area: Rect, modal: &Modal, palette: &Palette) {
    let rect = centered_rect(60, 60, area);
    let lines = match modal {
        Modal::ConfirmDelete { summary, .. } => vec![
            Line::from(""),
            Line::from("  Delete this transaction?"),
            Line::from(""),
            Line::from(vec![Span::raw("  "), Span::styled(summary.clone(), palette.label())]),
            Line::from(""),
            hint_line(&[("y", "delete"), ("n", "cancel")], palette),
        ],
        other => {
            let mut lines = other.fields().map(|fs| field_lines(fs, palette)).unwrap_or_default();
            lines.push(hint_line(&[("Enter", "save"), ("Tab", "next"), ("Esc", "cancel")], palette));
            if matches!(other, Modal::AddExpense(_) | Modal::EditExpense { .. }) {
                lines.push(hint_line(&[("←/→", "change category")], palette));
            }
            lines
        }
    };

    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(lines).block(palette.block(modal.title())), rect);
}

// ============================================================================
// STATUS BAR
// ============================================================================

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let mut status_spans = vec![];

    if app.in_flight > 0 {
        status_spans.push(Span::styled(" ⏳ ", Style::default().fg(palette.accent)));
    }

    if let Some(toast) = app.toasts.current() {
        let color = match toast.kind {
            ToastKind::Success => palette.positive,
            ToastKind::Error => palette.negative,
        };
        status_spans.push(Span::styled(
            format!(" {} ", toast.message),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    } else {
        let hints: &[(&'static str, &'static str)] = match (app.screen, app.page) {
            (Screen::Auth(_), _) => &[("Enter", "Submit"), ("Esc", "Quit")],
            (Screen::Main, Page::Transactions) => &[
                ("Enter", "Details"),
                ("↑/↓", "Nav"),
                ("f", "Filter"),
                ("a", "Add"),
                ("e", "Edit"),
                ("x", "Delete"),
                ("Tab", "Page"),
                ("q", "Quit"),
            ],
            (Screen::Main, Page::Dashboard) => &[
                ("b", "Balance"),
                ("a", "Add"),
                ("r", "Refresh"),
                ("d", "Theme"),
                ("Tab", "Page"),
                ("q", "Quit"),
            ],
            (Screen::Main, _) => &[("r", "Refresh"), ("d", "Theme"), ("Tab", "Page"), ("q", "Quit")],
        };
        status_spans.extend(hint_line(hints, palette).spans);
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(palette.fg)));

    f.render_widget(status_bar, area);
}

// ============================================================================
// HELPERS
// ============================================================================

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Cuts on a char boundary.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Greedy word wrap measured in chars; continuation lines are indented two spaces.
fn wrap_text(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.chars().count();
        if current_width > 0 && current_width + 1 + word_width > width {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if current_width > 0 {
            current.push(' ');
            current_width += 1;
        }
        current.push_str(word);
        current_width += word_width;
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n  ")
}
