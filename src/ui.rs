use crate::client::{
    AppSnapshot,
    CellSnapshot,
    WithdrawalSnapshot,
};
use color_eyre::eyre::Result;
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use itertools::Itertools;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::{
    io::stdout,
    thread,
};
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthStr;

const GRID_COLUMNS: u16 = 13;
const GRID_ROWS: u16 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    Redraw,
    MoveCursor(isize),
    MoveRow { up: bool },
    SelectChip(usize),
    ClearChip,
    ToggleErase,
    Click,
    NewSession,
    OpenWithdraw,
    CloseWithdraw,
    AmountChar(char),
    AmountBackspace,
    ToggleToken,
    SubmitWithdraw,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    Withdraw,
    QuitModal,
}

#[derive(Default)]
pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

pub type InputEventReceiver = mpsc::UnboundedReceiver<std::io::Result<Event>>;

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    // Create a single persistent Terminal to preserve buffers across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

/// Reads terminal events on a dedicated thread so the async loop can
/// `select!` over them.
pub fn input_event_stream() -> InputEventReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        loop {
            let ev = event::read();
            let failed = ev.is_err();
            if tx.send(ev).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub async fn next_raw_event(rx: &mut InputEventReceiver) -> Result<Event> {
    match rx.recv().await {
        Some(ev) => Ok(ev?),
        None => Err(color_eyre::eyre::eyre!("input thread stopped")),
    }
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        let mode = state.mode.clone();
        term.draw(|f| ui(f, &mode, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    let k = match event {
        Event::Key(k) => k,
        Event::Resize(_, _) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    if k.kind != KeyEventKind::Press {
        return None;
    }
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return Some(UserEvent::Quit);
    }
    match state.mode {
        Mode::QuitModal => match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::Withdraw => match k.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::CloseWithdraw)
            }
            KeyCode::Enter => Some(UserEvent::SubmitWithdraw),
            KeyCode::Tab => Some(UserEvent::ToggleToken),
            KeyCode::Backspace => Some(UserEvent::AmountBackspace),
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                Some(UserEvent::AmountChar(c))
            }
            _ => None,
        },
        Mode::Normal => match k.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                state.mode = Mode::QuitModal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Right => Some(UserEvent::MoveCursor(1)),
            KeyCode::Left => Some(UserEvent::MoveCursor(-1)),
            KeyCode::Up => Some(UserEvent::MoveRow { up: true }),
            KeyCode::Down => Some(UserEvent::MoveRow { up: false }),
            KeyCode::Enter | KeyCode::Char(' ') => Some(UserEvent::Click),
            KeyCode::Char('0') => Some(UserEvent::ClearChip),
            KeyCode::Char(c @ '1'..='9') => {
                Some(UserEvent::SelectChip(c as usize - '1' as usize))
            }
            KeyCode::Char('e') => Some(UserEvent::ToggleErase),
            KeyCode::Char('n') => Some(UserEvent::NewSession),
            KeyCode::Char('w') => {
                state.mode = Mode::Withdraw;
                Some(UserEvent::OpenWithdraw)
            }
            _ => None,
        },
    }
}

fn ui(f: &mut Frame, mode: &Mode, snap: &AppSnapshot) {
    // Clear the whole frame to avoid leftover fragments
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                       // status
            Constraint::Length(GRID_ROWS * 4 + 2),       // number grid
            Constraint::Length(6),                       // outside bets
            Constraint::Length(3),                       // chip selector
            Constraint::Min(4),                          // messages
            Constraint::Length(3),                       // help
        ])
        .split(f.area());

    draw_top(f, chunks[0], snap);
    draw_grid(f, chunks[1], snap);
    draw_outside(f, chunks[2], snap);
    draw_chip_selector(f, chunks[3], snap);
    draw_messages(f, chunks[4], snap);
    draw_help(f, chunks[5], mode);
    match mode {
        Mode::Withdraw => draw_withdraw_modal(f, &snap.withdrawal, snap),
        Mode::QuitModal => draw_quit_modal(f),
        Mode::Normal => {}
    }
}

fn draw_top(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let wallet = snap
        .wallet
        .as_ref()
        .map(|w| w.short())
        .unwrap_or_else(|| String::from("not connected"));
    let chip = snap
        .selected_chip
        .map(|c| c.to_string())
        .unwrap_or_else(|| String::from("none"));
    let mode = if snap.erase_mode { "ERASE" } else { "place" };
    let text = format!(
        "Network: {} | Wallet: {} | Chip: {} | Mode: {} | Board rev: {} | Staked: {}",
        snap.network, wallet, chip, mode, snap.revision, snap.staked
    );
    let widget = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Table"));
    f.render_widget(widget, area);
}

fn draw_grid(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let block = Block::default().borders(Borders::ALL).title("Board");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let col_w = inner.width / GRID_COLUMNS;
    let row_h = inner.height / GRID_ROWS;
    for cell in &snap.board {
        let rect = match grid_position(cell.number()) {
            GridPosition::Zero => {
                Rect::new(inner.x, inner.y, col_w, row_h * GRID_ROWS)
            }
            GridPosition::Number { column, row } => Rect::new(
                inner.x + (column + 1) * col_w,
                inner.y + row * row_h,
                col_w,
                row_h,
            ),
        };
        draw_cell(f, rect, cell, snap.cursor == cell.id);
    }
}

fn draw_outside(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let block = Block::default().borders(Borders::ALL).title("Outside bets");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let count = snap.outside.len().max(1) as u16;
    let col_w = inner.width / count;
    for (i, cell) in snap.outside.iter().enumerate() {
        let rect = Rect::new(inner.x + i as u16 * col_w, inner.y, col_w, inner.height);
        draw_cell(f, rect, cell, snap.cursor == cell.id);
    }
}

fn draw_cell(f: &mut Frame, rect: Rect, cell: &CellSnapshot, selected: bool) {
    let (r, g, b) = cell.color.rgb();
    let width = rect.width.saturating_sub(2) as usize;
    let mut lines = vec![Line::from(centered(&cell.label, width)).bold()];
    if let Some(chips) = &cell.chips {
        let stack = chips.iter().map(|c| c.to_string()).join(" ");
        lines.push(Line::from(centered(&stack, width)).fg(Color::White));
    }
    let border = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if cell.is_first {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };
    let widget = Paragraph::new(lines)
        .style(Style::default().bg(Color::Rgb(r, g, b)).fg(Color::White))
        .block(Block::default().borders(Borders::ALL).border_style(border));
    f.render_widget(widget, rect);
}

fn draw_chip_selector(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut spans = Vec::new();
    for (i, chip) in snap.denominations.iter().enumerate() {
        let label = format!(" [{}] {} ", i + 1, chip);
        let style = if snap.selected_chip == Some(*chip) {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        spans.push(Span::styled(label, style));
    }
    let erase_style = if snap.erase_mode {
        Style::default().fg(Color::Black).bg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    spans.push(Span::styled(" [e] erase ", erase_style));
    let widget = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Chips"));
    f.render_widget(widget, area);
}

fn draw_messages(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let widget = if snap.errors.is_empty() {
        let mut lines: Vec<Line> = Vec::new();
        if snap.status.trim().is_empty() {
            lines.push(Line::from("Ready"));
        } else {
            for line in snap.status.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let lines: Vec<Line> = snap
            .errors
            .iter()
            .rev()
            .map(|e| Line::from(e.clone()))
            .collect();
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(widget, area);
}

fn draw_help(f: &mut Frame, area: Rect, mode: &Mode) {
    let text = match mode {
        Mode::Withdraw => {
            "0-9 . amount | Backspace delete | Tab switch token | Enter withdraw | Esc close"
        }
        _ => {
            "←/→/↑/↓ move | Enter place | 1-9 chip | 0 no chip | e erase | n new session | w withdraw | q quit"
        }
    };
    let help =
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_withdraw_modal(f: &mut Frame, form: &WithdrawalSnapshot, snap: &AppSnapshot) {
    let area = centered_rect(60, 50, f.area());
    f.render_widget(Clear, area);
    let balance = |b: Option<String>| b.unwrap_or_else(|| String::from("--"));
    let mut lines = vec![
        Line::from(format!("Token: {} (Tab to switch)", form.token)),
        Line::from(format!(
            "You withdraw: {}",
            if form.amount.is_empty() { "0.00" } else { form.amount.as_str() }
        )),
        Line::from(format!("~ ${:.2}", form.usd_value)),
        Line::from(format!(
            "Platform balance: {} {} (Max)",
            balance(form.platform_balance.clone()),
            form.token
        )),
        Line::from(format!(
            "Wallet balance: {} {}",
            balance(form.wallet_balance.clone()),
            form.token
        )),
        Line::from(format!(
            "Receiver: {}",
            snap.wallet
                .as_ref()
                .map(|w| w.to_string())
                .unwrap_or_else(|| String::from("connect a wallet with --wallet"))
        )),
    ];
    if form.insufficient {
        lines.push(Line::from("Insufficient Balance").fg(Color::Red));
    }
    if let Some(summary) = &form.last_summary {
        lines.push(Line::from(""));
        lines.push(
            Line::from(format!(
                "Sent {} {} to {} | tx {}",
                summary.amount,
                summary.token,
                summary.receiver.short(),
                summary.transaction_hash
            ))
            .fg(Color::Green),
        );
    }
    lines.push(Line::from(""));
    lines.push(
        Line::from(if form.loading { "Loading..." } else { "[Enter] Withdraw" })
            .fg(Color::Cyan)
            .bold(),
    );
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Withdraw"));
    f.render_widget(widget, area);
}

fn draw_quit_modal(f: &mut Frame) {
    let area = centered_rect(30, 20, f.area());
    f.render_widget(Clear, area);
    let widget = Paragraph::new("Quit the table? (y/n)")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Quit"));
    f.render_widget(widget, area);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GridPosition {
    Zero,
    Number { column: u16, row: u16 },
}

/// Numbers run up the columns: 1 bottom-left, 3 top-left, 36 top-right.
fn grid_position(number: u8) -> GridPosition {
    if number == 0 {
        return GridPosition::Zero;
    }
    let n = (number - 1) as u16;
    GridPosition::Number {
        column: n / 3,
        row: 2 - n % 3,
    }
}

fn centered(text: &str, width: usize) -> String {
    let text_width = UnicodeWidthStr::width(text);
    if text_width >= width {
        return text.to_string();
    }
    let pad = (width - text_width) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}
