//! The channel onboarding form page.
//!
//! Every keystroke becomes a controller call: editing commits via
//! `set_value`, focus moves deliver blur (`touch`), list keys drive
//! `append`/`remove`, and the submit/reset/get-values/set-value actions map
//! to the controller's protocol. The page itself keeps no form state beyond
//! focus and the line editor.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use serde_json::Value;
use tracing::info;
use tui_input::{Input, backend::crossterm::EventHandler};

use formwork::{FormController, FormEvent, FormStatus, ItemId, RuleSet, SetOptions};

use crate::action::Action;
use crate::components::Component;
use crate::form::{self, PH_NUMBERS};
use crate::tui::{EventResponse, Frame};

/// How a row's input text is parsed back into the form tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Text,
    Number,
    Date,
}

struct FieldRow {
    label: String,
    path: String,
    kind: RowKind,
    /// Present on dynamic phone rows: the entry's stable identity and its
    /// current position in the list.
    item: Option<(ItemId, usize)>,
}

impl FieldRow {
    fn text(label: &str, path: &str) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            kind: RowKind::Text,
            item: None,
        }
    }
}

pub struct FormPage {
    form: FormController,
    rows: Vec<FieldRow>,
    focused: usize,
    scroll: usize,
    editing: bool,
    input: Input,
    notice: Option<String>,
    /// Buffer the watch subscription writes into; drained on Tick.
    seen_events: Arc<Mutex<Vec<FormEvent>>>,
    last_event: Option<String>,
    /// Dynamic rows currently registered, so shrinking unbinds stale paths.
    dynamic_rows: usize,
}

impl FormPage {
    pub fn new() -> Result<Self> {
        let mut form = form::channel_controller()?;

        let seen_events: Arc<Mutex<Vec<FormEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen_events.clone();
        form.watch(move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        let mut page = Self {
            form,
            rows: Vec::new(),
            focused: 0,
            scroll: 0,
            editing: false,
            input: Input::default(),
            notice: None,
            seen_events,
            last_event: None,
            dynamic_rows: 0,
        };
        page.rebuild_rows()?;
        Ok(page)
    }

    pub fn status(&self) -> FormStatus {
        self.form.status()
    }

    pub fn last_event(&self) -> Option<&str> {
        self.last_event.as_deref()
    }

    /// Rebuild the visible rows from the current list identities, binding new
    /// dynamic slots and unbinding vanished ones.
    fn rebuild_rows(&mut self) -> Result<()> {
        let ids = self.form.item_ids(PH_NUMBERS)?;

        for index in ids.len()..self.dynamic_rows {
            self.form
                .unregister(&format!("{PH_NUMBERS}.{index}.number"))?;
        }
        self.dynamic_rows = ids.len();

        let mut rows = vec![
            FieldRow::text("Username", "username"),
            FieldRow::text("Email", "email"),
            FieldRow::text("Channel", "channel"),
            FieldRow::text("Twitter", "social.twitter"),
            FieldRow::text("Facebook", "social.facebook"),
            FieldRow::text("Primary phone number", "phone_numbers.0"),
            FieldRow::text("Secondary phone number", "phone_numbers.1"),
        ];
        for (index, id) in ids.iter().enumerate() {
            let binding = self
                .form
                .register(&format!("{PH_NUMBERS}.{index}.number"), RuleSet::new())?;
            rows.push(FieldRow {
                label: format!("Phone number #{id}"),
                path: binding.name(),
                kind: RowKind::Text,
                item: Some((*id, index)),
            });
        }
        rows.push(FieldRow {
            label: "Age".into(),
            path: "age".into(),
            kind: RowKind::Number,
            item: None,
        });
        rows.push(FieldRow {
            label: "Date of birth".into(),
            path: "dob".into(),
            kind: RowKind::Date,
            item: None,
        });

        self.rows = rows;
        if self.focused >= self.rows.len() {
            self.focused = self.rows.len().saturating_sub(1);
        }
        Ok(())
    }

    // --- Focus / editing --------------------------------------------------

    fn focus_to(&mut self, next: usize) -> Result<()> {
        if next != self.focused {
            // Leaving a field is the blur event.
            let left = self.rows[self.focused].path.clone();
            self.form.touch(&left)?;
            self.focused = next;
        }
        Ok(())
    }

    fn focus_next(&mut self) -> Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        self.focus_to((self.focused + 1) % self.rows.len())
    }

    fn focus_prev(&mut self) -> Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        let next = if self.focused == 0 {
            self.rows.len() - 1
        } else {
            self.focused - 1
        };
        self.focus_to(next)
    }

    fn display_value(&self, row: &FieldRow) -> String {
        match self.form.get(&row.path).unwrap_or(Value::Null) {
            Value::Null => String::new(),
            Value::String(text) => text,
            other => other.to_string(),
        }
    }

    fn start_edit(&mut self) {
        let Some(row) = self.rows.get(self.focused) else {
            return;
        };
        let current = self.display_value(row);
        self.editing = true;
        self.input = Input::default().with_value(current);
    }

    fn cancel_edit(&mut self) {
        self.editing = false;
        self.input = Input::default();
    }

    fn commit_edit(&mut self) -> Result<()> {
        let Some(row) = self.rows.get(self.focused) else {
            self.cancel_edit();
            return Ok(());
        };
        let raw = self.input.value().to_string();
        // Unparsable number/date input is stored as null so the field's
        // required rule reports it.
        let parsed = match row.kind {
            RowKind::Text => Value::String(raw),
            RowKind::Number => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(Value::Null),
            RowKind::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(|date| Value::String(date.to_string()))
                .unwrap_or(Value::Null),
        };
        let path = row.path.clone();
        self.form.set_value(
            &path,
            parsed,
            SetOptions {
                mark_dirty: true,
                mark_touched: false,
                revalidate: true,
            },
        )?;
        self.editing = false;
        self.input = Input::default();
        Ok(())
    }

    // --- Form actions -----------------------------------------------------

    fn add_phone(&mut self) -> Result<()> {
        let id = self.form.append(PH_NUMBERS, form::empty_phone())?;
        self.rebuild_rows()?;
        self.notice = Some(format!("Added phone number #{id}"));
        Ok(())
    }

    fn remove_phone(&mut self) -> Result<()> {
        let Some((id, index)) = self.rows.get(self.focused).and_then(|row| row.item) else {
            self.notice = Some("Focus a phone entry to remove it".into());
            return Ok(());
        };
        if index == 0 {
            self.notice = Some("The first phone entry cannot be removed".into());
            return Ok(());
        }
        self.form.remove(PH_NUMBERS, index)?;
        self.rebuild_rows()?;
        self.notice = Some(format!("Removed phone number #{id}"));
        Ok(())
    }

    fn submit(&mut self) -> Result<()> {
        let status = self.form.status();
        // Mirrors the submit button enablement: untouched or invalid forms
        // never reach the controller.
        if !status.is_dirty || !status.is_valid || status.is_submitting {
            self.notice = Some("Submit unavailable: edit the form and fix validation errors".into());
            return Ok(());
        }
        let mut payload = None;
        let mut failures = 0usize;
        self.form.submit(
            |values| payload = Some(values.clone()),
            |errors| failures = errors.len(),
        )?;
        if let Some(values) = payload {
            info!(%values, "form submitted");
            self.notice = Some("Form submitted; values returned to defaults".into());
            self.rebuild_rows()?;
        } else {
            self.notice = Some(format!("Submit failed with {failures} validation errors"));
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.form.reset();
        self.cancel_edit();
        self.rebuild_rows()?;
        self.notice = Some("Form reset to defaults".into());
        Ok(())
    }

    fn log_values(&mut self) -> Result<()> {
        let pair = self.form.get_values(&["username", "email"])?;
        let social = self.form.get("social")?;
        let facebook = self.form.get("social.facebook")?;
        info!(?pair, %social, %facebook, "get values");
        self.notice = Some(format!(
            "username/email: {pair:?} · social: {social} · facebook: {facebook}"
        ));
        Ok(())
    }

    fn set_value_demo(&mut self) -> Result<()> {
        self.form
            .set_value("username", Value::String(String::new()), SetOptions::all())?;
        self.notice = Some("username cleared via set_value (dirty, touched, validated)".into());
        Ok(())
    }

    // --- Rendering helpers ------------------------------------------------

    fn max_visible(inner_height: u16) -> usize {
        // Each row takes up to three lines (value, error, spacer).
        (inner_height as usize / 3).max(3)
    }

    fn ensure_visible(&mut self, inner_height: u16) {
        let max_visible = Self::max_visible(inner_height);
        if self.focused < self.scroll {
            self.scroll = self.focused;
        } else if self.focused >= self.scroll + max_visible {
            self.scroll = self.focused + 1 - max_visible;
        }
    }

    fn visible_bounds(&self, inner_height: u16) -> (usize, usize) {
        let max_visible = Self::max_visible(inner_height);
        let total = self.rows.len();
        if total == 0 {
            return (0, 0);
        }
        let start = self.scroll.min(total - 1);
        let end = (start + max_visible).min(total);
        (start, end)
    }

    fn describe(event: &FormEvent) -> String {
        match event {
            FormEvent::ValueChanged { path } => format!("changed {path}"),
            FormEvent::ListChanged { path } => format!("list {path}"),
            FormEvent::StatusChanged => "status".into(),
            FormEvent::Reset => "reset".into(),
            FormEvent::Submitted { successful: true } => "submitted".into(),
            FormEvent::Submitted { successful: false } => "submit rejected".into(),
        }
    }
}

impl Component for FormPage {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        // Editing mode: route to the line editor.
        if self.editing {
            match key.code {
                KeyCode::Enter => {
                    self.commit_edit()?;
                    return Ok(Some(EventResponse::Stop(Action::Update)));
                }
                KeyCode::Esc => {
                    self.cancel_edit();
                    return Ok(Some(EventResponse::Stop(Action::Update)));
                }
                _ => {
                    self.input.handle_event(&crossterm::event::Event::Key(key));
                    return Ok(Some(EventResponse::Stop(Action::Update)));
                }
            }
        }

        // Not editing: navigate and trigger form actions.
        match key.code {
            KeyCode::Up | KeyCode::BackTab => {
                self.focus_prev()?;
                Ok(Some(EventResponse::Stop(Action::Update)))
            }
            KeyCode::Down | KeyCode::Tab => {
                self.focus_next()?;
                Ok(Some(EventResponse::Stop(Action::Update)))
            }
            KeyCode::Enter => {
                self.start_edit();
                Ok(Some(EventResponse::Stop(Action::Update)))
            }
            KeyCode::Char('a') => {
                self.add_phone()?;
                Ok(Some(EventResponse::Stop(Action::Update)))
            }
            KeyCode::Char('d') => {
                self.remove_phone()?;
                Ok(Some(EventResponse::Stop(Action::Update)))
            }
            KeyCode::Char('s') => {
                self.submit()?;
                Ok(Some(EventResponse::Stop(Action::Update)))
            }
            KeyCode::Char('r') => {
                self.reset()?;
                Ok(Some(EventResponse::Stop(Action::Update)))
            }
            KeyCode::Char('g') => {
                self.log_values()?;
                Ok(Some(EventResponse::Stop(Action::Update)))
            }
            KeyCode::Char('v') => {
                self.set_value_demo()?;
                Ok(Some(EventResponse::Stop(Action::Update)))
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if action == Action::Tick {
            let drained: Vec<FormEvent> = self.seen_events.lock().unwrap().drain(..).collect();
            if let Some(event) = drained.last() {
                self.last_event = Some(Self::describe(event));
                return Ok(Some(Action::Update));
            }
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Channel onboarding ");
        let inner = block.inner(area);
        f.render_widget(block, area);
        if inner.width < 5 || inner.height < 5 {
            return Ok(());
        }

        self.ensure_visible(inner.height);
        let (start, end) = self.visible_bounds(inner.height);

        let mut lines: Vec<Line> = Vec::new();
        for (offset, row) in self.rows[start..end].iter().enumerate() {
            let absolute = start + offset;
            let focused = absolute == self.focused;
            let meta = self.form.meta(&row.path).unwrap_or_default();

            let marker = if meta.dirty { "*" } else { " " };
            let mut spans = vec![Span::styled(
                format!("{marker}{}:", row.label),
                Style::default().fg(Color::White).add_modifier(if focused {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                }),
            )];

            let value = if focused && self.editing {
                self.input.value().to_string()
            } else {
                self.display_value(row)
            };
            spans.push(Span::raw(" "));
            let value_style = if focused {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().fg(Color::Cyan)
            };
            spans.push(Span::styled(value, value_style));
            lines.push(Line::from(spans));

            if let Some(error) = self.form.errors().get(&row.path) {
                lines.push(Line::from(Span::styled(
                    error.message.clone(),
                    Style::default().fg(Color::Red),
                )));
            }
            lines.push(Line::raw(""));
        }

        if let Some(notice) = &self.notice {
            lines.push(Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::raw(""));
        }

        let footer = Line::from(vec![
            Span::styled("Up/Down", Style::default().fg(Color::White)),
            Span::raw(": Navigate  "),
            Span::styled("Enter", Style::default().fg(Color::White)),
            Span::raw(if self.editing {
                ": Confirm edit  "
            } else {
                ": Edit  "
            }),
            Span::styled("a", Style::default().fg(Color::White)),
            Span::raw(": Add phone  "),
            Span::styled("d", Style::default().fg(Color::White)),
            Span::raw(": Remove phone  "),
            Span::styled("s", Style::default().fg(Color::White)),
            Span::raw(": Submit  "),
            Span::styled("r", Style::default().fg(Color::White)),
            Span::raw(": Reset  "),
            Span::styled("g", Style::default().fg(Color::White)),
            Span::raw(": Get values  "),
            Span::styled("v", Style::default().fg(Color::White)),
            Span::raw(": Set value  "),
            Span::styled("q", Style::default().fg(Color::White)),
            Span::raw(": Quit"),
        ])
        .fg(Color::DarkGray);
        lines.push(footer);

        let para = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
        f.render_widget(para, inner);
        Ok(())
    }
}
