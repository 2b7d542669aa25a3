use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::{Duration, Instant},
};

use arena_tetris::config::{Config, USAGE};
use arena_tetris::event_log::EventLog;
use arena_tetris::game::{Game, GameStatus, Intent};
use arena_tetris::matrix::{Matrix, FIELD_HEIGHT, FIELD_WIDTH};
use arena_tetris::pieces::PieceKind;

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const PREVIEW_BOX: usize = 5;
const FRAME: Duration = Duration::from_millis(16);

// ============================================================================
// Color Mapping
// ============================================================================

fn cell_color(id: u8) -> Color {
    match PieceKind::from_id(id) {
        Some(PieceKind::I) => Color::Rgb(0xFF, 0x0D, 0x72),
        Some(PieceKind::L) => Color::Rgb(0x0D, 0xC2, 0xFF),
        Some(PieceKind::J) => Color::Rgb(0x0D, 0xFF, 0x72),
        Some(PieceKind::O) => Color::Rgb(0xF5, 0x38, 0xFF),
        Some(PieceKind::S) => Color::Rgb(0xFF, 0x8E, 0x0D),
        Some(PieceKind::T) => Color::Rgb(0xFF, 0xE1, 0x38),
        Some(PieceKind::Z) => Color::Rgb(0x38, 0x77, 0xFF),
        None => Color::Reset,
    }
}

fn cell_span(id: u8) -> Span<'static> {
    if id == 0 {
        Span::raw(EMPTY_CHAR)
    } else {
        Span::styled(BLOCK_CHAR, Style::default().fg(cell_color(id)))
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, game: &Game) {
    let area = frame.size();

    render_game(frame, game, area);
    match game.status() {
        GameStatus::Idle => render_idle(frame, area),
        GameStatus::Running => {}
        GameStatus::Paused => render_paused(frame, area),
        GameStatus::GameOver => render_game_over(frame, game, area),
    }
}

fn render_game(frame: &mut Frame, game: &Game, area: Rect) {
    let grid_display_width = (FIELD_WIDTH as u16 * CELL_WIDTH) + 2;
    let grid_display_height = FIELD_HEIGHT as u16 + 2;
    let preview_width = PREVIEW_BOX as u16 * CELL_WIDTH + 2;
    let info_width = 14;
    let total_width = grid_display_width + preview_width + info_width + 4;
    let total_height = grid_display_height + 3;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    // Layout: [Grid][Side panel: Next over Info]
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(preview_width.max(info_width)),
    ])
    .split(game_row);

    let side = Layout::vertical([
        Constraint::Length(PREVIEW_BOX as u16 + 2),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    render_grid(frame, game, horizontal[0]);
    render_preview(frame, game.next(), side[0]);
    render_info(frame, game, side[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "←→: Move | ↓: Drop | ↑: Rotate | Space: Hard drop | P: Pause | R: Restart | Q/ESC: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Tetris ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .render_field()
        .rows()
        .iter()
        .map(|row| Line::from(row.iter().map(|&id| cell_span(id)).collect::<Vec<_>>()))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_preview(frame: &mut Frame, next: Option<&Matrix>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(shape) = next else {
        return;
    };

    // Center the shape inside a 5x5 box.
    let off_x = (PREVIEW_BOX - shape.width()) / 2;
    let off_y = (PREVIEW_BOX - shape.height()) / 2;

    let lines: Vec<Line> = (0..PREVIEW_BOX)
        .map(|y| {
            let spans: Vec<Span> = (0..PREVIEW_BOX)
                .map(|x| {
                    let id = shape
                        .get(x as i16 - off_x as i16, y as i16 - off_y as i16)
                        .unwrap_or(0);
                    cell_span(id)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let progress = game.progress();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", progress.score)),
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", progress.lines)),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", progress.level)),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_popup(frame: &mut Frame, title: &str, text: Vec<Line>, area: Rect) {
    let height = text.len() as u16 + 2;
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", title))
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(26, height, area));
}

fn hint(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn render_idle(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("TETRIS", Style::default().fg(Color::Cyan))),
        Line::from(""),
        hint("Press Enter to start"),
        hint("Press ESC to quit"),
    ];
    render_popup(frame, "Start", text, area);
}

fn render_paused(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
        Line::from(""),
        hint("Press P to continue"),
        hint("Press ESC to quit"),
    ];
    render_popup(frame, "Paused", text, area);
}

fn render_game_over(frame: &mut Frame, game: &Game, area: Rect) {
    let progress = game.progress();
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Score: {}", progress.score)),
        Line::from(format!("Lines: {}", progress.lines)),
        Line::from(format!("Level: {}", progress.level)),
        Line::from(""),
        hint("Press R to restart"),
        hint("Press ESC to quit"),
    ];
    render_popup(frame, "Game Over", text, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Input
// ============================================================================

fn intent_for(code: KeyCode) -> Option<Intent> {
    match code {
        KeyCode::Left => Some(Intent::MoveLeft),
        KeyCode::Right => Some(Intent::MoveRight),
        KeyCode::Down => Some(Intent::SoftDrop),
        KeyCode::Up => Some(Intent::RotateClockwise),
        KeyCode::Char(' ') => Some(Intent::HardDrop),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Intent::TogglePause),
        KeyCode::Enter | KeyCode::Char('s') | KeyCode::Char('S') => Some(Intent::Start),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Intent::Restart),
        _ => None,
    }
}

// ============================================================================
// Main Loop
// ============================================================================

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::load(&args)?;
    if config.show_help {
        print!("{}", USAGE);
        return Ok(());
    }

    let mut event_log = match &config.event_log {
        Some(path) => Some(EventLog::open(path)?),
        None => None,
    };
    let mut game = Game::with_provider(config.piece_provider());

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run(&mut terminal, &mut game, event_log.as_mut());

    // Always try to restore terminal state, even when the game loop failed.
    let raw_mode = disable_raw_mode().context("disabling raw mode");
    let screen = stdout()
        .execute(LeaveAlternateScreen)
        .map(|_| ())
        .context("leaving alternate screen");
    let flushed = match event_log.as_mut() {
        Some(log) => log.flush(),
        None => Ok(()),
    };

    settle(result, [raw_mode, screen, flushed])
}

/// Reports the run error first, then the first failed cleanup step.
fn settle<const N: usize>(result: Result<()>, cleanup: [Result<()>; N]) -> Result<()> {
    result?;
    cleanup.into_iter().collect()
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    game: &mut Game,
    mut event_log: Option<&mut EventLog>,
) -> Result<()> {
    let started = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, game))?;

        if event::poll(FRAME)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        code => {
                            if let Some(intent) = intent_for(code) {
                                game.apply(intent);
                            }
                        }
                    }
                }
            }
        }

        let now_ms = started.elapsed().as_millis() as u64;
        game.advance_to(now_ms);

        let events = game.take_events();
        if let Some(log) = event_log.as_deref_mut() {
            log.record(now_ms, &events)?;
        }
    }

    Ok(())
}
