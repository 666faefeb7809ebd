use clap::Args;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use eyre::Result;
use mailmatch_console::http::build_agent;
use mailmatch_console::{Config, HttpLogSource, LogRecord, Readiness, StreamSession};
use ratatui::{
    style::Stylize,
    symbols::border,
    text::Line,
    widgets::{Block, TableState},
    DefaultTerminal, Frame,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::state::Focus;
use super::views::bottom_bar::controls_line;
use super::views::main_view::{render_init_error, render_main_view};
use super::widgets::formatters::format_countdown;

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Only show records containing this text, e.g. a file id from `upload`
    #[arg(long)]
    pub correlation: Option<String>,

    /// Start streaming as soon as a log group is selected
    #[arg(long)]
    pub stream: bool,
}

/// Whether a logs cursor at `selected` should move along with new records
fn on_newest_row(selected: Option<usize>, len: usize) -> bool {
    match selected {
        Some(i) => i + 1 >= len,
        None => true,
    }
}

pub(crate) struct App {
    session: Option<StreamSession<HttpLogSource>>,
    init_error: Option<String>,
    exit: bool,
    focus: Focus,
    show_all_groups: bool,
    groups_state: TableState,
    logs_state: TableState,
    inspected: Option<LogRecord>,
    /// Logs cursor sits on the newest record and moves with new ones
    follow_logs: bool,
    stream_on_select: bool,
    last_render_duration: Duration,
}

impl ConsoleArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let agent = build_agent();
        let (session, init_error) = match config.log_source(&agent) {
            Readiness::Ready(source) => {
                let mut session =
                    StreamSession::new(Arc::new(source), config.log_group_prefix.clone());
                session.set_correlation(self.correlation.clone());
                session.discover_groups();
                (Some(session), None)
            }
            Readiness::NotReady { feature, missing } => (
                None,
                Some(format!("{} needs {}", feature, missing.join(", "))),
            ),
        };

        let mut app = App {
            session,
            init_error,
            exit: false,
            focus: Focus::Groups,
            show_all_groups: false,
            groups_state: TableState::default(),
            logs_state: TableState::default(),
            inspected: None,
            follow_logs: true,
            stream_on_select: self.stream,
            last_render_duration: Duration::from_millis(0),
        };

        let mut terminal = ratatui::init();
        let app_result = app.run(&mut terminal);
        ratatui::restore();
        app_result.map_err(|e| eyre::eyre!("TUI error: {}", e))
    }
}

impl App {
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        while !self.exit {
            self.tick(Instant::now());

            let render_start = Instant::now();
            terminal.draw(|frame| self.draw(frame))?;
            self.last_render_duration = render_start.elapsed();

            self.handle_events()?;
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let had_group = session.state().selected_group.is_some();
        session.tick(now);

        if !had_group && session.state().selected_group.is_some() {
            self.sync_group_selection();
            if self.stream_on_select {
                self.stream_on_select = false;
                if let Some(session) = self.session.as_mut() {
                    session.start_streaming(now);
                }
            }
        }

        if let Some(session) = self.session.as_mut() {
            let following = self.follow_logs && self.focus != Focus::Inspect;
            if session.take_scroll_request(now) && following {
                let shown = session.projection().len();
                self.logs_state
                    .select(if shown == 0 { None } else { Some(shown - 1) });
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.render_ui(frame);
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    self.handle_key_event(key_event);
                }
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.exit(),
            KeyCode::Esc => match self.focus {
                Focus::Inspect => self.toggle_inspect(),
                _ => self.exit(),
            },
            KeyCode::Tab => self.toggle_focus(),
            KeyCode::Left | KeyCode::Char('h') => self.focus_groups(),
            KeyCode::Right | KeyCode::Char('l') => self.focus_logs(),
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Focus::Groups => self.select_previous_group(),
                Focus::Logs | Focus::Inspect => self.select_previous_record(),
            },
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Focus::Groups => self.select_next_group(),
                Focus::Logs | Focus::Inspect => self.select_next_record(),
            },
            KeyCode::Enter if self.focus == Focus::Groups => self.activate_selected_group(),
            KeyCode::Char('i') | KeyCode::Char('I') => self.toggle_inspect(),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                if let Some(session) = self.session.as_mut() {
                    session.toggle_streaming(Instant::now());
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if let Some(session) = self.session.as_mut() {
                    session.refresh();
                }
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if let Some(session) = self.session.as_mut() {
                    session.clear();
                }
                self.logs_state.select(None);
                self.follow_logs = true;
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                if let Some(session) = self.session.as_mut() {
                    session.set_correlation(None);
                }
                self.logs_state.select(None);
                self.follow_logs = true;
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.show_all_groups = !self.show_all_groups;
                self.sync_group_selection();
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                if let Some(session) = self.session.as_mut() {
                    session.discover_groups();
                }
            }
            _ => {}
        }
    }

    fn visible_groups_len(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| s.catalog().visible(self.show_all_groups).len())
            .unwrap_or(0)
    }

    fn projection_len(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| s.projection().len())
            .unwrap_or(0)
    }

    /// Points the groups cursor at the active group, if it is listed
    fn sync_group_selection(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let visible = session.catalog().visible(self.show_all_groups);
        let index = session
            .state()
            .selected_group
            .as_ref()
            .and_then(|active| visible.iter().position(|group| group == active))
            .or(if visible.is_empty() { None } else { Some(0) });
        self.groups_state.select(index);
    }

    fn select_previous_group(&mut self) {
        if self.visible_groups_len() > 0 {
            let i = match self.groups_state.selected() {
                Some(i) => i.saturating_sub(1),
                None => 0,
            };
            self.groups_state.select(Some(i));
        }
    }

    fn select_next_group(&mut self) {
        let len = self.visible_groups_len();
        if len > 0 {
            let i = match self.groups_state.selected() {
                Some(i) => (i + 1).min(len - 1),
                None => 0,
            };
            self.groups_state.select(Some(i));
        }
    }

    fn activate_selected_group(&mut self) {
        let show_all = self.show_all_groups;
        let Some(index) = self.groups_state.selected() else {
            return;
        };
        if let Some(session) = self.session.as_mut() {
            let group = session.catalog().visible(show_all).get(index).cloned();
            if let Some(group) = group {
                session.select_group(group);
                self.logs_state.select(None);
                if !session.state().is_streaming {
                    session.refresh();
                }
            }
        }
    }

    fn toggle_focus(&mut self) {
        match self.focus {
            Focus::Groups => self.focus_logs(),
            Focus::Logs => self.focus_groups(),
            Focus::Inspect => {}
        }
    }

    fn focus_groups(&mut self) {
        if self.focus == Focus::Logs {
            self.focus = Focus::Groups;
            self.follow_logs = true;
        }
    }

    fn focus_logs(&mut self) {
        let len = self.projection_len();
        if len > 0 && self.focus == Focus::Groups {
            self.focus = Focus::Logs;
            match self.logs_state.selected() {
                Some(i) => self.follow_logs = on_newest_row(Some(i), len),
                None => {
                    self.logs_state.select(Some(len - 1));
                    self.follow_logs = true;
                }
            }
        }
    }

    fn select_previous_record(&mut self) {
        let len = self.projection_len();
        if len > 0 {
            let i = match self.logs_state.selected() {
                Some(i) => i.saturating_sub(1),
                None => 0,
            };
            self.logs_state.select(Some(i));
            self.follow_logs = on_newest_row(Some(i), len);
            self.update_inspected(i);
        }
    }

    fn select_next_record(&mut self) {
        let len = self.projection_len();
        if len > 0 {
            let i = match self.logs_state.selected() {
                Some(i) => (i + 1).min(len - 1),
                None => 0,
            };
            self.logs_state.select(Some(i));
            self.follow_logs = on_newest_row(Some(i), len);
            self.update_inspected(i);
        }
    }

    fn update_inspected(&mut self, index: usize) {
        if self.focus != Focus::Inspect {
            return;
        }
        if let Some(session) = self.session.as_ref() {
            if let Some(record) = session.projection().get(index) {
                self.inspected = Some((*record).clone());
            }
        }
    }

    fn toggle_inspect(&mut self) {
        if self.focus == Focus::Inspect {
            self.focus = Focus::Logs;
            self.inspected = None;
        } else if self.focus == Focus::Logs {
            if let (Some(selected), Some(session)) =
                (self.logs_state.selected(), self.session.as_ref())
            {
                if let Some(record) = session.projection().get(selected) {
                    self.inspected = Some((*record).clone());
                    self.focus = Focus::Inspect;
                }
            }
        }
    }

    fn exit(&mut self) {
        self.exit = true;
    }
}

impl App {
    fn status_line(&self) -> Line<'static> {
        let Some(session) = self.session.as_ref() else {
            return Line::from(" not configured ".red());
        };
        let state = session.state();
        let now = Instant::now();

        let mut spans = Vec::new();
        if state.is_streaming {
            let countdown = session
                .scheduler()
                .time_until_due(now)
                .map(format_countdown)
                .unwrap_or_default();
            spans.push(format!(" ● STREAMING {} ", countdown).green().bold());
        } else {
            spans.push(" ⏸ IDLE ".yellow());
        }
        if session.is_fetching() {
            spans.push(" ⟳ ".cyan());
        }
        if let Some(diagnostic) = &session.catalog().diagnostic {
            spans.push(format!(" {} ", diagnostic).yellow());
        }
        if let Some(error) = &state.last_error {
            spans.push(format!(" ⚠ {} ", error).red());
        }
        Line::from(spans)
    }

    fn render_ui(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let title = Line::from(" Mailmatch Console ".bold());
        let streaming = self
            .session
            .as_ref()
            .is_some_and(|s| s.state().is_streaming);

        #[cfg(feature = "dev")]
        let block = {
            let render_time_ms = self.last_render_duration.as_millis();
            Block::bordered()
                .title(title.centered())
                .title(self.status_line().right_aligned())
                .title_bottom(controls_line(self.focus, streaming).centered())
                .title_bottom(Line::from(format!(" {}ms ", render_time_ms)).cyan().right_aligned())
                .border_set(border::THICK)
        };

        #[cfg(not(feature = "dev"))]
        let block = Block::bordered()
            .title(title.centered())
            .title(self.status_line().right_aligned())
            .title_bottom(controls_line(self.focus, streaming).centered())
            .border_set(border::THICK);

        let inner_area = block.inner(area);
        frame.render_widget(block, area);

        if let Some(error) = &self.init_error {
            render_init_error(frame, inner_area, error);
            return;
        }

        if let Some(session) = self.session.as_ref() {
            render_main_view(
                frame,
                inner_area,
                session,
                self.show_all_groups,
                &mut self.groups_state,
                &mut self.logs_state,
                self.focus,
                self.inspected.as_ref(),
            );
        }
    }
}
