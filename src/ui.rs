//! Layout and drawing: well, cursor, next-row preview, sidebar, pause, quit menu, game over.

use crate::app::{QuitOption, Screen};
use crate::game::block::BlockColor;
use crate::game::{Board, Cursor};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal columns per board cell.
const CELL_W: u16 = 4;
/// Half-block pixels per board cell; two pixels per terminal row (▀).
const CELL_PX: usize = 4;
const SIDEBAR_WIDTH: u16 = 22;

/// Outer size (border included) of the well for a board.
fn well_size(board: &Board) -> (u16, u16) {
    let w = board.width() as u16 * CELL_W;
    let h = (board.height() * CELL_PX / 2) as u16;
    (w + 2, h + 2)
}

/// Pixel rows the stack has risen toward the next row.
fn scroll_px(board: &Board) -> usize {
    ((board.spawn_progress() * CELL_PX as f64) as usize).min(CELL_PX - 1)
}

/// Fade of freshly matched cells toward the background while they clear.
/// Cells already being faded are remembered so a later match elsewhere
/// does not restart their animation.
#[derive(Default)]
pub struct ClearFx {
    effects: Vec<Effect>,
    last_process: Option<Instant>,
    seen: HashSet<(usize, usize)>,
}

impl ClearFx {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Keep remembered cells aligned after a new row pushed the stack up.
    pub fn shift_up(&mut self) {
        self.seen = self
            .seen
            .iter()
            .filter(|&&(_, y)| y > 0)
            .map(|&(x, y)| (x, y - 1))
            .collect();
    }

    #[cfg(test)]
    fn active(&self) -> usize {
        self.effects.len()
    }
}

/// Board cells currently clearing.
fn clearing_cells(board: &Board) -> HashSet<(usize, usize)> {
    let mut set = HashSet::new();
    for y in 0..board.height() {
        for x in 0..board.width() {
            if board.cell_is_clearing(x, y).unwrap_or(false) {
                set.insert((x, y));
            }
        }
    }
    set
}

/// Buffer positions covered by the given board cells at the current scroll.
fn buffer_positions(
    well: Rect,
    cells: &HashSet<(usize, usize)>,
    scroll: usize,
) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(cx, cy) in cells {
        let top = (cy * CELL_PX).saturating_sub(scroll) / 2;
        let bottom = ((cy + 1) * CELL_PX).saturating_sub(scroll + 1) / 2;
        for ty in top..=bottom {
            let by = well.y + ty as u16;
            if by >= well.y + well.height {
                continue;
            }
            let x0 = well.x + cx as u16 * CELL_W;
            for bx in x0..(x0 + CELL_W).min(well.x + well.width) {
                set.insert((bx, by));
            }
        }
    }
    set
}

fn apply_clear_effect(
    frame: &mut Frame,
    board: &Board,
    theme: &Theme,
    well: Rect,
    clear_fx: &mut ClearFx,
    tick_rate: f64,
    now: Instant,
) {
    let delta = clear_fx
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    clear_fx.last_process = Some(now);

    let clearing = clearing_cells(board);
    let fresh: HashSet<(usize, usize)> = clearing.difference(&clear_fx.seen).copied().collect();
    if !fresh.is_empty() {
        let positions = buffer_positions(well, &fresh, scroll_px(board));
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let fade_ms = (f64::from(board.config().clear_ticks) / tick_rate.max(1.0) * 1000.0) as u32;
        let effect = fx::fade_to(theme.bg, theme.bg, (fade_ms.max(1), Interpolation::Linear))
            .with_filter(filter)
            .with_area(well);
        clear_fx.effects.push(effect);
    }
    clear_fx.seen = clearing;

    let tfx_delta = TfxDuration::from_millis(delta_ms);
    for effect in &mut clear_fx.effects {
        frame.render_effect(effect, well, tfx_delta);
    }
    clear_fx.effects.retain(|e| !e.done());
}

/// Everything the draw functions need about the running game.
pub struct View<'a> {
    pub screen: Screen,
    pub board: &'a Board,
    pub cursor: &'a Cursor,
    pub theme: &'a Theme,
    pub paused: bool,
    pub tick_rate: f64,
    pub best: u64,
    pub quit_selected: QuitOption,
}

/// Draw the current screen; matched cells fade out via `clear_fx` while playing.
pub fn draw(frame: &mut Frame, view: &View, clear_fx: &mut ClearFx, now: Instant) {
    let area = frame.area();
    match view.screen {
        Screen::Playing => {
            let well = draw_game(frame, view, area);
            if view.paused {
                draw_pause_overlay(frame, view.theme, area);
            } else {
                apply_clear_effect(
                    frame,
                    view.board,
                    view.theme,
                    well,
                    clear_fx,
                    view.tick_rate,
                    now,
                );
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, view, area);
            draw_quit_menu(frame, view.theme, view.quit_selected);
        }
        Screen::GameOver => {
            draw_game(frame, view, area);
            draw_game_over(frame, view, area);
        }
    }
}

/// Well on the left, sidebar on the right, centred. Returns the well's inner rect.
fn draw_game(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let (pw, ph) = well_size(view.board);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph.max(SIDEBAR_HEIGHT)),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);

    let well_area = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    let well = draw_well(frame, view, well_area);
    draw_sidebar(frame, view, inner[1]);
    well
}

fn scale(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        _ => return color,
    };
    let s = |c: u8| (f32::from(c) * factor).clamp(0.0, 255.0) as u8;
    Color::Rgb(s(r), s(g), s(b))
}

/// Bevel: light top edge, dark bottom/right edge.
fn shade(color: Color, lx: u16, ly: usize) -> Color {
    if ly == CELL_PX - 1 || lx == CELL_W - 1 {
        scale(color, 0.7)
    } else if ly == 0 {
        scale(color, 1.12)
    } else {
        color
    }
}

/// Colour of one half-block pixel; `col` is the terminal column inside the well
/// and `py` the pixel row in board space (already scrolled).
fn pixel_color(view: &View, preview: &[BlockColor], col: u16, py: usize) -> Color {
    let board = view.board;
    let theme = view.theme;
    let bx = usize::from(col / CELL_W);
    let by = py / CELL_PX;
    let lx = col % CELL_W;
    let ly = py % CELL_PX;

    let cursor = view.cursor;
    let in_cursor = by == cursor.y && (bx == cursor.x || bx == cursor.x + 1);
    if in_cursor && view.screen == Screen::Playing {
        let left_edge = bx == cursor.x && lx == 0;
        let right_edge = bx == cursor.x + 1 && lx == CELL_W - 1;
        if left_edge || right_edge || ly == 0 || ly == CELL_PX - 1 {
            return theme.main_fg;
        }
    }

    if by >= board.height() {
        // Incoming row, dimmed until it rises into play.
        return match preview.get(bx) {
            Some(&c) => blend_dim(shade(theme.block_color(c), lx, ly), theme.bg),
            None => theme.bg,
        };
    }
    match board.get_cell(bx, by).ok().flatten() {
        Some(c) if board.cell_is_clearing(bx, by).unwrap_or(false) => {
            shade(theme.clearing_color(c), lx, ly)
        }
        Some(c) => shade(theme.block_color(c), lx, ly),
        None => theme.bg,
    }
}

fn blend_dim(color: Color, bg: Color) -> Color {
    crate::theme::blend(color, bg, 0.55)
}

fn draw_well(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let board = view.board;
    let theme = view.theme;
    let border = if board.is_about_to_lose() && !board.is_lost() {
        Color::Red
    } else {
        theme.div_line
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(theme.bg))
        .title(Span::styled(" Panelpop ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let (pw, ph) = well_size(board);
    let well = Rect {
        x: inner.x,
        y: inner.y,
        width: (pw - 2).min(inner.width),
        height: (ph - 2).min(inner.height),
    };
    let scroll = scroll_px(board);
    let preview = board.next_row_preview();
    let buf = frame.buffer_mut();
    for ty in 0..well.height {
        let py = usize::from(ty) * 2 + scroll;
        for col in 0..well.width {
            let top = pixel_color(view, &preview, col, py);
            let bottom = pixel_color(view, &preview, col, py + 1);
            buf[(well.x + col, well.y + ty)]
                .set_symbol("▀")
                .set_style(Style::default().fg(top).bg(bottom));
        }
    }
    well
}

const SIDEBAR_HEIGHT: u16 = 20;

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let board = view.board;
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Next row
            Constraint::Length(1),
            Constraint::Length(8), // Stats
            Constraint::Length(1),
            Constraint::Length(4), // Rise gauge
        ])
        .split(area);

    // --- Next row ---
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let next_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(next_inner);
    Paragraph::new(Line::from(Span::styled("Next", title_style)))
        .render(next_layout[0], frame.buffer_mut());
    draw_next_row(frame, theme, &board.next_row_preview(), next_layout[1]);

    // --- Stats ---
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let chain = if board.chain() > 1 {
        format!("x{}", board.chain())
    } else {
        "-".to_string()
    };
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let lines = vec![
        stat("Score: ", board.score().to_string()),
        stat("Best:  ", view.best.to_string()),
        stat("Time:  ", format_time(board.tick_count(), view.tick_rate)),
        stat("Chain: ", chain),
        Line::from(vec![
            Span::styled("Seed:  ", title_style),
            Span::styled(board.seed().to_string(), Style::default().fg(theme.inactive_fg)),
        ]),
    ];
    Paragraph::new(Text::from(lines)).render(stats_inner, frame.buffer_mut());

    // --- Rise ---
    let rise_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let rise_inner = rise_block.inner(chunks[4]);
    rise_block.render(chunks[4], frame.buffer_mut());
    let rise_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(rise_inner);
    let danger = board.is_about_to_lose();
    let label = if danger { "Rise  DANGER" } else { "Rise" };
    Paragraph::new(Line::from(Span::styled(label, title_style)))
        .render(rise_layout[0], frame.buffer_mut());
    let bar_color = if danger { Color::Red } else { Color::Green };
    Gauge::default()
        .ratio(board.spawn_progress().clamp(0.0, 1.0))
        .gauge_style(Style::default().fg(bar_color))
        .render(rise_layout[1], frame.buffer_mut());
}

fn draw_next_row(frame: &mut Frame, theme: &Theme, row: &[BlockColor], area: Rect) {
    let cell_w = 2u16;
    for (i, &c) in row.iter().enumerate() {
        let x = area.x + i as u16 * cell_w;
        if x + cell_w > area.x + area.width {
            break;
        }
        let r = Rect {
            x,
            y: area.y,
            width: cell_w,
            height: area.height.min(1),
        };
        let color = theme.block_color(c);
        Paragraph::new("██")
            .style(Style::default().fg(color).bg(theme.bg))
            .render(r, frame.buffer_mut());
    }
}

/// `mm:ss` of game time.
pub fn format_time(ticks: u64, tick_rate: f64) -> String {
    let secs = (ticks as f64 / tick_rate.max(1.0)) as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn clear_rect(frame: &mut Frame, rect: Rect, bg: Color) {
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            frame.buffer_mut()[(x, y)]
                .set_symbol(" ")
                .set_style(Style::default().bg(bg));
        }
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    clear_rect(frame, popup, theme.bg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: Resume    Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let board = view.board;
    let popup = centered(area, 30, 10);
    clear_rect(frame, popup, theme.bg);
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", board.score()), fg)),
        Line::from(Span::styled(
            format!(" Time: {} ", format_time(board.tick_count(), view.tick_rate)),
            fg,
        )),
    ];
    if board.score() > 0 && board.score() >= view.best {
        lines.push(Line::from(Span::styled(
            " Best this session! ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
    } else {
        lines.push(Line::from(Span::styled(format!(" Best: {} ", view.best), fg)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" R: Restart    Q: Quit ", fg)));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" Panelpop ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 8);
    clear_rect(frame, quit_rect, theme.bg);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];
    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + inner.width.saturating_sub(label.len() as u16) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
