use clap::Parser;
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
    fs::File,
    io::{stdout, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, warn};

use tetris_engine::{
    piece::RandomPieceProvider, CellState, Command, Config, Flow, Game, GameEvent, GameState,
    PieceProvider, SessionStore, Stats, StatsStore,
};

/// Terminal falling-block puzzle
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file (cols, rows, fallSpeedMs, lineScore)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Field width, overrides the configuration file
    #[arg(long)]
    cols: Option<usize>,

    /// Field height, overrides the configuration file
    #[arg(long)]
    rows: Option<usize>,

    /// Milliseconds between gravity steps
    #[arg(long)]
    fall_speed_ms: Option<u64>,

    /// Points per cleared line
    #[arg(long)]
    line_score: Option<u32>,

    /// Where the paused session is saved
    #[arg(long, default_value = "savegame.json")]
    save_file: PathBuf,

    /// Where record and games played are kept
    #[arg(long, default_value = "stats.json")]
    stats_file: PathBuf,

    /// Seed for a reproducible piece sequence
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> tetris_engine::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(cols) = self.cols {
            config = config.with_cols(cols);
        }
        if let Some(rows) = self.rows {
            config = config.with_rows(rows);
        }
        if let Some(ms) = self.fall_speed_ms {
            config = config.with_fall_speed_ms(ms);
        }
        if let Some(score) = self.line_score {
            config = config.with_line_score(score);
        }
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Visual Constants
// ============================================================================

const FRAME: Duration = Duration::from_millis(16);
const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const MENU_ITEMS: [&str; 3] = ["New game", "Continue", "Quit"];

fn cell_color(color: tetris_engine::Color) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

// ============================================================================
// Application
// ============================================================================

enum Screen {
    Menu { selected: usize },
    Session(Game),
}

struct App {
    config: Config,
    sessions: SessionStore,
    stats_store: StatsStore,
    stats: Stats,
    seed: Option<u64>,
    notice: Option<String>,
    screen: Screen,
}

impl App {
    fn new(args: &Args, config: Config) -> Self {
        let stats_store = StatsStore::new(&args.stats_file);
        let stats = stats_store.load();
        Self {
            config,
            sessions: SessionStore::new(&args.save_file),
            stats_store,
            stats,
            seed: args.seed,
            notice: None,
            screen: Screen::Menu { selected: 0 },
        }
    }

    fn provider(&self) -> Box<dyn PieceProvider> {
        match self.seed {
            Some(seed) => Box::new(RandomPieceProvider::seeded(seed)),
            None => Box::new(RandomPieceProvider::new()),
        }
    }

    fn new_game(&mut self) -> tetris_engine::Result<()> {
        let game = Game::with_provider(self.config, self.provider())?.with_stats(self.stats);
        self.notice = None;
        self.screen = Screen::Session(game);
        Ok(())
    }

    fn continue_game(&mut self) -> tetris_engine::Result<()> {
        let game = self
            .sessions
            .load(self.config, self.provider())?
            .with_stats(self.stats);
        self.notice = None;
        self.screen = Screen::Session(game);
        Ok(())
    }

    /// Returns false once the player asked to quit
    fn on_key(&mut self, code: KeyCode) -> tetris_engine::Result<bool> {
        if let Screen::Menu { selected } = &mut self.screen {
            let choice = match code {
                KeyCode::Up | KeyCode::Char('w') => {
                    *selected = (*selected + MENU_ITEMS.len() - 1) % MENU_ITEMS.len();
                    None
                }
                KeyCode::Down | KeyCode::Char('s') => {
                    *selected = (*selected + 1) % MENU_ITEMS.len();
                    None
                }
                KeyCode::Char('n') => Some(0),
                KeyCode::Char('c') => Some(1),
                KeyCode::Char('q') | KeyCode::Esc => Some(2),
                KeyCode::Enter => Some(*selected),
                _ => None,
            };
            match choice {
                Some(0) => self.new_game()?,
                Some(1) => self.continue_game()?,
                Some(_) => return Ok(false),
                None => {}
            }
            return Ok(true);
        }

        let command = match &self.screen {
            Screen::Session(game) => command_for_key(code, game.state),
            Screen::Menu { .. } => None,
        };
        match command {
            Some(command) => self.apply(command),
            None => Ok(true),
        }
    }

    fn on_elapsed(&mut self, elapsed: Duration) -> tetris_engine::Result<bool> {
        if matches!(self.screen, Screen::Session(_)) {
            self.apply(Command::GravityTick(elapsed))
        } else {
            Ok(true)
        }
    }

    fn apply(&mut self, command: Command) -> tetris_engine::Result<bool> {
        let Screen::Session(game) = &mut self.screen else {
            return Ok(true);
        };
        let flow = game.handle(command);

        for event in game.take_events() {
            if let GameEvent::GameOver { score, new_record } = event {
                info!(score, new_record, "session finished");
                self.stats = game.stats;
                if let Err(e) = self.stats_store.save(&self.stats) {
                    warn!(error = %e, "failed to write stats");
                }
            }
        }

        match flow {
            Flow::Continue => {}
            Flow::Save => {
                self.notice = Some(match self.sessions.save(&game.snapshot()) {
                    Ok(()) => format!("Saved to {}", self.sessions.path().display()),
                    Err(e) => {
                        warn!(error = %e, "failed to save session");
                        "Save failed".to_string()
                    }
                });
            }
            Flow::ReturnToMenu => {
                self.notice = None;
                self.screen = Screen::Menu { selected: 0 };
            }
            Flow::Quit => return Ok(false),
        }
        Ok(true)
    }
}

fn command_for_key(code: KeyCode, state: GameState) -> Option<Command> {
    if state == GameState::GameOver {
        return Some(match code {
            KeyCode::Char('q') => Command::Quit,
            KeyCode::Char('r') => Command::Restart,
            _ => Command::Acknowledge,
        });
    }
    let command = match code {
        KeyCode::Left | KeyCode::Char('a') => Command::MoveLeft,
        KeyCode::Right | KeyCode::Char('d') => Command::MoveRight,
        KeyCode::Down | KeyCode::Char('s') => Command::SoftDrop,
        KeyCode::Up | KeyCode::Char('w') => Command::Rotate,
        KeyCode::Char(' ') | KeyCode::Char('p') => Command::TogglePause,
        KeyCode::F(5) => Command::Save,
        KeyCode::Char('r') => Command::Restart,
        KeyCode::Esc | KeyCode::Char('m') => Command::ReturnToMenu,
        KeyCode::Char('q') => Command::Quit,
        _ => return None,
    };
    Some(command)
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, app: &App) {
    let area = frame.size();

    match &app.screen {
        Screen::Menu { selected } => render_menu(frame, app, *selected, area),
        Screen::Session(game) => match game.state {
            GameState::Playing => render_game(frame, app, game, area),
            GameState::Paused => render_paused(frame, app, game, area),
            GameState::GameOver => render_game_over(frame, app, game, area),
        },
    }
}

fn render_menu(frame: &mut Frame, app: &App, selected: usize, area: Rect) {
    let mut lines = vec![Line::from("")];
    for (i, item) in MENU_ITEMS.iter().enumerate() {
        let style = if i == selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let marker = if i == selected { "> " } else { "  " };
        lines.push(Line::from(Span::styled(format!("{marker}{item}"), style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(format!("Record: {}", app.stats.record)));
    lines.push(Line::from(format!("Games: {}", app.stats.games_played)));

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Tetris ")
            .title_alignment(Alignment::Center),
    );
    frame.render_widget(paragraph, centered_rect(26, 10, area));
}

fn render_game(frame: &mut Frame, app: &App, game: &Game, area: Rect) {
    let config = game.config();
    let cols = u16::try_from(config.cols).unwrap_or(u16::MAX);
    let rows = u16::try_from(config.rows).unwrap_or(u16::MAX);
    let grid_display_width = cols.saturating_mul(CELL_WIDTH).saturating_add(2);
    let grid_display_height = rows.saturating_add(2);
    let preview_width = 12;
    let info_width = 14;
    let total_width = grid_display_width.saturating_add(preview_width + info_width + 4);
    let total_height = grid_display_height.saturating_add(3);

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    // Layout: [Grid][Preview][Info]
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(preview_width),
        Constraint::Length(info_width),
    ])
    .split(game_row);

    render_grid(frame, game, horizontal[0]);
    render_preview(frame, game, horizontal[1]);
    render_info(frame, game, horizontal[2]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let hint = app.notice.clone().unwrap_or_else(|| {
            "←→/AD: Move | ↓/S: Drop | ↑/W: Rotate | Space: Pause | F5: Save | R: Restart | M: Menu"
                .to_string()
        });
        let controls = Paragraph::new(vec![Line::from(hint)])
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
        .render_grid()
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| match cell {
                    CellState::Empty => Span::raw(EMPTY_CHAR),
                    CellState::Filled(color) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(cell_color(*color)))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_preview(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let piece = &game.next_piece;
    let style = Style::default().fg(cell_color(piece.color));
    let mut lines = vec![Line::from("")];
    for row in piece.shape.rows() {
        let mut spans = vec![Span::raw(" ")];
        for &occupied in row {
            spans.push(if occupied {
                Span::styled(BLOCK_CHAR, style)
            } else {
                Span::raw(EMPTY_CHAR)
            });
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", game.score)),
        Line::from(""),
        Line::from(Span::styled("Record", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", game.stats.record.max(game.score))),
        Line::from(""),
        Line::from(Span::styled("Games", Style::default().fg(Color::Green))),
        Line::from(format!("{}", game.stats.games_played)),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_game_over(frame: &mut Frame, app: &App, game: &Game, area: Rect) {
    render_game(frame, app, game, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Score: {}", game.score)),
        Line::from(format!("Record: {}", game.stats.record)),
        Line::from(""),
        Line::from(Span::styled(
            "R: restart, any key: menu",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Game Over ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(28, 10, area));
}

fn render_paused(frame: &mut Frame, app: &App, game: &Game, area: Rect) {
    render_game(frame, app, game, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(
            "Space to continue",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled("F5 to save", Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled("M for menu", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Paused ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(24, 10, area));
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
// Main Loop
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, app))?;

        if event::poll(FRAME)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.on_key(key.code)? {
                    break;
                }
            }
        }

        let elapsed = last_frame.elapsed();
        last_frame = Instant::now();
        if !app.on_elapsed(elapsed)? {
            break;
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // The terminal belongs to the UI, so logs only go to a file
    if let Some(path) = &args.log_file {
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let config = args.config()?;
    let mut app = App::new(&args, config);
    info!(?config, "starting");

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

