//! App: terminal init, main loop, fixed-rate ticks and key handling.

use crate::GameConfig;
use crate::game::{Board, Cursor, TickReport};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, ClearFx, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Ticks run at most this many times per frame to catch up after a stall.
const MAX_CATCH_UP_TICKS: u32 = 5;
/// Frame budget for rendering and input polling (~60 FPS).
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

/// What the main loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    board: Board,
    cursor: Cursor,
    screen: Screen,
    paused: bool,
    quit_selected: QuitOption,
    /// Best score this session; nothing is persisted.
    best: u64,
    last_tick: Instant,
    clear_fx: ClearFx,
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn new_board(config: &GameConfig) -> Board {
    let seed = config.seed.unwrap_or_else(clock_seed);
    let mut board = Board::new(config.board.clone(), seed);
    board.fill_initial_rows();
    log::info!(
        "New game: seed {seed}, {}x{} board",
        board.width(),
        board.height()
    );
    board
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Result<Self> {
        let board = new_board(&config);
        let cursor = Cursor::new(board.width(), board.height());
        Ok(Self {
            config,
            theme,
            board,
            cursor,
            screen: Screen::Playing,
            paused: false,
            quit_selected: QuitOption::Resume,
            best: 0,
            last_tick: Instant::now(),
            clear_fx: ClearFx::default(),
        })
    }

    fn reset_game(&mut self) {
        self.board = new_board(&self.config);
        self.cursor = Cursor::new(self.board.width(), self.board.height());
        self.screen = Screen::Playing;
        self.paused = false;
        self.quit_selected = QuitOption::Resume;
        self.last_tick = Instant::now();
        self.clear_fx.reset();
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.tick_rate.max(1.0))
    }

    /// Run one board tick and keep cursor, effects and screen in step with it.
    fn step(&mut self) {
        let report = self.board.advance_tick();
        self.on_report(report);
    }

    fn on_report(&mut self, report: TickReport) {
        if report.row_added {
            self.row_added();
        }
        if report.matched > 0 && self.board.chain() > 1 {
            log::info!("Chain x{} at tick {}", self.board.chain(), self.board.tick_count());
        }
        if report.removed > 0 {
            log::debug!(
                "tick {}: removed {} blocks, +{} (chain {})",
                self.board.tick_count(),
                report.removed,
                report.score_gained,
                self.board.chain()
            );
        }
        self.best = self.best.max(self.board.score());
        if report.lost {
            self.game_over();
        }
    }

    fn row_added(&mut self) {
        self.cursor.shift_up();
        self.clear_fx.shift_up();
    }

    fn game_over(&mut self) {
        if self.screen != Screen::GameOver {
            log::info!(
                "Game over: score {} after {} ticks (seed {})",
                self.board.score(),
                self.board.tick_count(),
                self.board.seed()
            );
        }
        self.screen = Screen::GameOver;
        self.paused = false;
    }

    /// Advance the board by as many ticks as wall time allows.
    fn catch_up(&mut self, now: Instant) {
        let interval = self.tick_interval();
        let mut ticks = 0;
        while now.saturating_duration_since(self.last_tick) >= interval {
            if ticks == MAX_CATCH_UP_TICKS {
                self.last_tick = now;
                break;
            }
            self.last_tick += interval;
            self.step();
            ticks += 1;
            if self.screen != Screen::Playing {
                break;
            }
        }
    }

    fn apply_action(&mut self, action: Action) -> Result<Flow> {
        match self.screen {
            Screen::Playing if self.paused => match action {
                Action::Pause => {
                    self.paused = false;
                    self.last_tick = Instant::now();
                }
                Action::Quit => self.open_quit_menu(),
                _ => {}
            },
            Screen::Playing => match action {
                Action::MoveLeft => self.cursor.move_left(),
                Action::MoveRight => self.cursor.move_right(),
                Action::MoveUp => self.cursor.move_up(),
                Action::MoveDown => self.cursor.move_down(),
                Action::Swap => self.cursor.swap(&mut self.board)?,
                Action::Raise => {
                    if self.board.raise_stack() {
                        self.row_added();
                    } else if self.board.is_lost() {
                        self.game_over();
                    }
                }
                Action::Pause => self.paused = true,
                Action::Quit => self.open_quit_menu(),
                Action::Restart | Action::None => {}
            },
            Screen::QuitMenu => match action {
                Action::MoveDown | Action::MoveRight => self.quit_selected = self.quit_selected.next(),
                Action::MoveUp | Action::MoveLeft => self.quit_selected = self.quit_selected.prev(),
                Action::Swap => match self.quit_selected {
                    QuitOption::Resume => self.resume(),
                    QuitOption::Restart => self.reset_game(),
                    QuitOption::Exit => return Ok(Flow::Exit),
                },
                Action::Pause | Action::Quit => self.resume(),
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return Ok(Flow::Exit),
                Action::Restart | Action::Swap => self.reset_game(),
                _ => {}
            },
        }
        Ok(Flow::Continue)
    }

    fn open_quit_menu(&mut self) {
        self.screen = Screen::QuitMenu;
        self.quit_selected = QuitOption::Resume;
    }

    fn resume(&mut self) {
        self.screen = Screen::Playing;
        self.last_tick = Instant::now();
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
                PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        // Not every terminal supports this; press/release still works without it.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let result = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            .map_err(anyhow::Error::from)
            .and_then(|mut terminal| self.run_loop(&mut terminal));

        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_tick = Instant::now();
        loop {
            let now = Instant::now();
            let view = View {
                screen: self.screen,
                board: &self.board,
                cursor: &self.cursor,
                theme: &self.theme,
                paused: self.paused,
                tick_rate: self.config.tick_rate,
                best: self.best,
                quit_selected: self.quit_selected,
            };
            let clear_fx = &mut self.clear_fx;
            terminal.draw(|f| ui::draw(f, &view, clear_fx, now))?;

            let timeout = Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.apply_action(key_to_action(key))? == Flow::Exit {
                            return Ok(());
                        }
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                self.catch_up(Instant::now());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::BoardConfig;

    fn app() -> App {
        let config = GameConfig {
            board: BoardConfig::default(),
            seed: Some(11),
            tick_rate: 30.0,
        };
        App::new(config, Theme::default()).unwrap()
    }

    #[test]
    fn test_fixed_seed_is_used() {
        let a = app();
        assert_eq!(a.board.seed(), 11);
        assert_eq!(a.screen, Screen::Playing);
    }

    #[test]
    fn test_pause_blocks_moves() {
        let mut a = app();
        let x = a.cursor.x;
        a.apply_action(Action::Pause).unwrap();
        a.apply_action(Action::MoveLeft).unwrap();
        assert_eq!(a.cursor.x, x);
        a.apply_action(Action::Pause).unwrap();
        a.apply_action(Action::MoveLeft).unwrap();
        assert_eq!(a.cursor.x, x - 1);
    }

    #[test]
    fn test_raise_moves_cursor_with_stack() {
        let mut a = app();
        let y = a.cursor.y;
        a.apply_action(Action::Raise).unwrap();
        assert_eq!(a.cursor.y, y - 1);
        assert_eq!(a.board.tick_count(), 0);
    }

    #[test]
    fn test_quit_menu_cycles_and_exits() {
        let mut a = app();
        a.apply_action(Action::Quit).unwrap();
        assert_eq!(a.screen, Screen::QuitMenu);
        a.apply_action(Action::MoveDown).unwrap();
        a.apply_action(Action::MoveDown).unwrap();
        assert_eq!(a.quit_selected, QuitOption::Exit);
        assert_eq!(a.apply_action(Action::Swap).unwrap(), Flow::Exit);
    }

    #[test]
    fn test_catch_up_is_bounded() {
        let mut a = app();
        let start = a.last_tick;
        a.catch_up(start + Duration::from_secs(10));
        assert_eq!(a.board.tick_count(), u64::from(MAX_CATCH_UP_TICKS));
    }

    #[test]
    fn test_game_over_and_restart() {
        let mut a = app();
        while a.screen == Screen::Playing {
            a.apply_action(Action::Raise).unwrap();
        }
        assert_eq!(a.screen, Screen::GameOver);
        assert!(a.board.is_lost());
        a.apply_action(Action::Restart).unwrap();
        assert_eq!(a.screen, Screen::Playing);
        assert!(!a.board.is_lost());
        assert_eq!(a.board.seed(), 11);
    }
}
