use std::future::Future;
use std::io;
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};

use crate::api::TaskApi;
use crate::client::TaskClient;
use crate::form::FormField;
use crate::models::TaskStatus;
use crate::state::ViewSnapshot;
use crate::view::{
    filter_controls, filter_options, parse_filter, render_list, ListView, RowAction, TaskRow,
};

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Form(FormField),
    /// Free-form status filter typed into the status bar.
    Filter,
}

struct Ui {
    selected: usize,
    mode: Mode,
    filter_input: String,
}

impl Ui {
    fn new() -> Self {
        Self {
            selected: 0,
            mode: Mode::Browse,
            filter_input: String::new(),
        }
    }
}

/// Leaves raw mode and the alternate screen when dropped, including while unwinding.
struct RestoreOnDrop<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> Drop for RestoreOnDrop<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen, cursor::Show).ok();
}

enum Flow {
    Continue,
    Quit,
}

/// Runs the terminal UI until the user quits. Must be called from inside a multi-threaded
/// tokio runtime: requests run on its workers while this thread polls the terminal.
pub fn run<A: TaskApi + 'static>(client: TaskClient<A>) -> io::Result<()> {
    enable_raw_mode()?;
    let _restore = RestoreOnDrop {
        restore: restore_terminal,
    };
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    event_loop(&mut terminal, client)
}

/// The first list load does not wait on the health check: `/health` sits outside the task api
/// and may hang or be unrouted.
fn spawn_startup<A: TaskApi + 'static>(client: &TaskClient<A>) {
    let list_client = client.clone();
    spawn_action(async move {
        let _ = list_client.refresh().await;
    });
    let health_client = client.clone();
    spawn_action(async move {
        let _ = health_client.health().await;
    });
}

fn event_loop<B: Backend, A: TaskApi + 'static>(
    terminal: &mut Terminal<B>,
    client: TaskClient<A>,
) -> io::Result<()> {
    spawn_startup(&client);

    let mut ui = Ui::new();

    loop {
        let snapshot = client.state().snapshot();
        let list = render_list(&snapshot.list);
        let rows = list.rows();
        ui.selected = ui.selected.min(rows.len().saturating_sub(1));

        terminal.draw(|frame| draw(frame, &snapshot, &list, &ui))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let flow = match ui.mode {
                Mode::Browse => handle_browse_key(key, &client, &mut ui, rows),
                Mode::Form(field) => handle_form_key(key, field, &client, &mut ui),
                Mode::Filter => handle_filter_key(key, &client, &mut ui),
            };
            if let Flow::Quit = flow {
                return Ok(());
            }
        }
    }
}

fn spawn_action<F>(action: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(action);
}

fn handle_browse_key<A: TaskApi + 'static>(
    key: KeyEvent,
    client: &TaskClient<A>,
    ui: &mut Ui,
    rows: &[TaskRow],
) -> Flow {
    let selected = rows.get(ui.selected);
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::Down | KeyCode::Char('j') => {
            if ui.selected + 1 < rows.len() {
                ui.selected += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            ui.selected = ui.selected.saturating_sub(1);
        }
        KeyCode::Char('n') => ui.mode = Mode::Form(FormField::Title),
        KeyCode::Char('/') => {
            ui.filter_input.clear();
            ui.mode = Mode::Filter;
        }
        KeyCode::Char('r') => {
            let client = client.clone();
            spawn_action(async move {
                let _ = client.refresh().await;
            });
        }
        KeyCode::Char(c @ '1'..='4') => {
            let index = (c as usize) - ('1' as usize);
            let (_, filter) = filter_options()[index].clone();
            let client = client.clone();
            spawn_action(async move {
                let _ = client.set_filter(filter).await;
            });
        }
        KeyCode::Char('d') => {
            if let Some(row) = selected.filter(|row| row.can_mark_done()) {
                let id = row.id;
                let client = client.clone();
                spawn_action(async move {
                    let _ = client.mark_done(id).await;
                });
            }
        }
        KeyCode::Char('x') | KeyCode::Delete => {
            if let Some(row) = selected {
                let id = row.id;
                let client = client.clone();
                spawn_action(async move {
                    let _ = client.delete(id).await;
                });
            }
        }
        _ => {}
    }
    Flow::Continue
}

fn handle_form_key<A: TaskApi + 'static>(
    key: KeyEvent,
    field: FormField,
    client: &TaskClient<A>,
    ui: &mut Ui,
) -> Flow {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::Esc => ui.mode = Mode::Browse,
        KeyCode::Tab | KeyCode::Down => ui.mode = Mode::Form(field.next()),
        KeyCode::BackTab | KeyCode::Up => ui.mode = Mode::Form(field.prev()),
        KeyCode::Enter => {
            ui.mode = Mode::Browse;
            let client = client.clone();
            spawn_action(async move {
                let _ = client.create().await;
            });
        }
        KeyCode::Backspace => client.state().update_form(|form| {
            form.field_mut(field).pop();
        }),
        KeyCode::Char(c) => client
            .state()
            .update_form(|form| form.field_mut(field).push(c)),
        _ => {}
    }
    Flow::Continue
}

/// Blank input clears the filter; anything else is sent to the backend as a raw status value.
fn handle_filter_key<A: TaskApi + 'static>(
    key: KeyEvent,
    client: &TaskClient<A>,
    ui: &mut Ui,
) -> Flow {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::Esc => ui.mode = Mode::Browse,
        KeyCode::Enter => {
            ui.mode = Mode::Browse;
            let filter = parse_filter(&ui.filter_input);
            let client = client.clone();
            spawn_action(async move {
                let _ = client.set_filter(filter).await;
            });
        }
        KeyCode::Backspace => {
            ui.filter_input.pop();
        }
        KeyCode::Char(c) => ui.filter_input.push(c),
        _ => {}
    }
    Flow::Continue
}

fn draw(frame: &mut Frame, snapshot: &ViewSnapshot, list: &ListView, ui: &Ui) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title bar
            Constraint::Length(1), // filters
            Constraint::Min(3),    // task list
            Constraint::Length(3), // detail
            Constraint::Length(1), // status bar
        ])
        .split(frame.area());

    draw_title_bar(frame, chunks[0], snapshot);
    draw_filters(frame, chunks[1], &snapshot.filter);
    draw_list(frame, chunks[2], list, ui.selected);
    draw_detail(frame, chunks[3], list.rows().get(ui.selected));
    draw_status_bar(frame, chunks[4], snapshot, ui);

    if let Mode::Form(field) = ui.mode {
        draw_form(frame, snapshot, field);
    }
}

fn draw_title_bar(frame: &mut Frame, area: Rect, snapshot: &ViewSnapshot) {
    let mut spans = vec![Span::styled(
        " Tasks ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if snapshot.refreshing {
        spans.push(Span::styled(
            "refreshing...",
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Line::from(spans), area);
}

fn draw_filters(frame: &mut Frame, area: Rect, active: &Option<TaskStatus>) {
    let mut spans = Vec::new();
    for (index, control) in filter_controls(active).iter().enumerate() {
        let style = if control.active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let key = if index < 4 {
            format!("{}:", index + 1)
        } else {
            String::new()
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {key}{} ", control.label), style));
    }
    frame.render_widget(Line::from(spans), area);
}

fn badge_style(status: &TaskStatus) -> Style {
    let color = match status {
        TaskStatus::Pending => Color::Blue,
        TaskStatus::InProgress => Color::Yellow,
        TaskStatus::Done => Color::Green,
        TaskStatus::Other(_) => Color::Gray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn draw_list(frame: &mut Frame, area: Rect, list: &ListView, selected: usize) {
    let block = Block::default().borders(Borders::ALL).title("Task list");
    let message = match list {
        ListView::Loading => Some(Line::styled(
            crate::view::LOADING_TEXT,
            Style::default().fg(Color::DarkGray),
        )),
        ListView::Failed(reason) => Some(Line::styled(
            format!("Could not load tasks: {reason}"),
            Style::default().fg(Color::Red),
        )),
        ListView::Tasks(crate::view::TaskListView::Placeholder(text)) => Some(Line::raw(*text)),
        ListView::Tasks(crate::view::TaskListView::Rows(_)) => None,
    };
    if let Some(message) = message {
        frame.render_widget(Paragraph::new(message).block(block), area);
        return;
    }

    let items: Vec<ListItem> = list
        .rows()
        .iter()
        .map(|row| {
            let mut spans = vec![
                Span::styled(format!("[{}] ", row.badge.label), badge_style(&row.status)),
                Span::raw(row.title.clone()),
            ];
            if !row.meta.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", row.meta),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let widget = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(widget, area, &mut state);
}

fn draw_detail(frame: &mut Frame, area: Rect, row: Option<&TaskRow>) {
    let block = Block::default().borders(Borders::ALL).title("Actions");
    let line = match row {
        None => Line::raw(""),
        Some(row) => {
            let mut spans = Vec::new();
            for action in &row.actions {
                let key = match action {
                    RowAction::MarkDone(_) => "d",
                    RowAction::Delete(_) => "x",
                };
                spans.push(Span::styled(
                    format!(" {key} "),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::raw(format!("{}  ", action.label())));
            }
            Line::from(spans)
        }
    };
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, snapshot: &ViewSnapshot, ui: &Ui) {
    if let Mode::Filter = ui.mode {
        let line = Line::from(vec![
            Span::styled(
                " status filter: ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{}_", ui.filter_input)),
        ]);
        frame.render_widget(line, area);
        return;
    }
    if let Some(error) = &snapshot.last_error {
        frame.render_widget(
            Line::styled(format!(" {error}"), Style::default().fg(Color::Red)),
            area,
        );
        return;
    }
    let help: &[(&str, &str)] = match ui.mode {
        Mode::Browse => &[
            ("q", "quit"),
            ("j/k", "move"),
            ("n", "new"),
            ("d", "mark done"),
            ("x", "delete"),
            ("1-4", "filter"),
            ("/", "custom filter"),
            ("r", "refresh"),
        ],
        Mode::Form(_) => &[("tab", "next field"), ("enter", "create"), ("esc", "close")],
        Mode::Filter => &[],
    };
    let mut spans = Vec::new();
    for (key, what) in help {
        spans.push(Span::styled(
            format!(" {key}"),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {what} ")));
    }
    frame.render_widget(Line::from(spans), area);
}

fn draw_form(frame: &mut Frame, snapshot: &ViewSnapshot, focused: FormField) {
    let area = centered_rect(60, 11, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("New task");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3); 3])
        .split(inner);

    for (field, row) in FormField::ALL.iter().zip(rows.iter()) {
        let style = if *field == focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let input = Paragraph::new(snapshot.form.field(*field).to_string()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style)
                .title(field.label()),
        );
        frame.render_widget(input, *row);
    }
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
