use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    prelude::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::action::Action;
use crate::cli::Cli;
use crate::components::{Component, form_page::FormPage};
use crate::config::Config;
use crate::tui::{Event, EventResponse, Frame, Tui};

pub struct App {
    tick_rate: f64,
    frame_rate: f64,
    form: FormPage,
    should_quit: bool,
    should_suspend: bool,
}

impl App {
    pub fn new(args: Cli) -> Result<Self> {
        crate::config::ensure_dirs_exist()?;
        let config = Config::load()?;
        debug!(?config, "configuration loaded");

        Ok(Self {
            tick_rate: args.tick_rate.unwrap_or(config.tick_rate),
            frame_rate: args.frame_rate.unwrap_or(config.frame_rate),
            form: FormPage::new()?,
            should_quit: false,
            should_suspend: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

        let mut tui = Tui::new()?
            .tick_rate(self.tick_rate)
            .frame_rate(self.frame_rate);
        tui.enter()?;

        loop {
            if let Some(e) = tui.next().await {
                let stop_event_propagation = match self.form.handle_events(e.clone())? {
                    Some(EventResponse::Continue(action)) => {
                        action_tx.send(action).ok();
                        false
                    }
                    Some(EventResponse::Stop(action)) => {
                        action_tx.send(action).ok();
                        true
                    }
                    None => false,
                };

                if !stop_event_propagation {
                    match e {
                        Event::Quit => {
                            action_tx.send(Action::Quit).ok();
                        }
                        Event::Tick => {
                            action_tx.send(Action::Tick).ok();
                        }
                        Event::Render => {
                            action_tx.send(Action::Render).ok();
                        }
                        Event::Resize(x, y) => {
                            action_tx.send(Action::Resize(x, y)).ok();
                        }
                        Event::Key(key) => self.handle_global_keys(key, &action_tx),
                        _ => {}
                    }
                }
            }

            while let Ok(action) = action_rx.try_recv() {
                match action {
                    Action::Tick | Action::Render => {}
                    _ => debug!("{action}"),
                }
                match action {
                    Action::Quit => self.should_quit = true,
                    Action::Suspend => self.should_suspend = true,
                    Action::Resume => self.should_suspend = false,
                    Action::Resize(w, h) => {
                        tui.resize(Rect::new(0, 0, w, h))?;
                        tui.draw(|f| {
                            self.render(f).unwrap_or_else(|err| {
                                action_tx
                                    .send(Action::Error(format!("Failed to draw: {err:?}")))
                                    .ok();
                            })
                        })?;
                    }
                    Action::Render => {
                        tui.draw(|f| {
                            self.render(f).unwrap_or_else(|err| {
                                action_tx
                                    .send(Action::Error(format!("Failed to draw: {err:?}")))
                                    .ok();
                            })
                        })?;
                    }
                    Action::Error(ref msg) => tracing::error!("{msg}"),
                    _ => {}
                }
                if let Some(next) = self.form.update(action)? {
                    action_tx.send(next).ok();
                }
            }

            if self.should_suspend {
                tui.suspend()?;
                action_tx.send(Action::Resume).ok();
                tui = Tui::new()?
                    .tick_rate(self.tick_rate)
                    .frame_rate(self.frame_rate);
                tui.enter()?;
            } else if self.should_quit {
                tui.stop()?;
                break;
            }
        }
        tui.exit()?;
        Ok(())
    }

    fn handle_global_keys(&mut self, key: KeyEvent, action_tx: &mpsc::UnboundedSender<Action>) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                action_tx.send(Action::Quit).ok();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                action_tx.send(Action::Quit).ok();
            }
            KeyCode::Char('z') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                action_tx.send(Action::Suspend).ok();
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let vertical_layout =
            Layout::vertical(vec![Constraint::Fill(1), Constraint::Length(1)]).split(frame.area());

        self.form.draw(frame, vertical_layout[0])?;
        self.render_footer(frame, vertical_layout[1]);
        Ok(())
    }

    /// One-line status footer: controller flags, submit count, last watch
    /// event.
    fn render_footer(&self, frame: &mut Frame<'_>, area: Rect) {
        let status = self.form.status();
        let flag = |name: &str, on: bool| -> Span<'static> {
            let style = if on {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" {name} "), style)
        };

        let mut spans = vec![
            flag("dirty", status.is_dirty),
            flag("valid", status.is_valid),
            flag("submitting", status.is_submitting),
            flag("submitted", status.is_submitted),
            flag("ok", status.is_submit_successful),
            Span::raw(format!(" submits: {} ", status.submit_count)),
        ];
        if let Some(event) = self.form.last_event() {
            spans.push(Span::styled(
                format!(" watch: {event} "),
                Style::default().fg(Color::Cyan),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
