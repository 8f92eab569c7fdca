//! Drawing: menu, playfield, sidebar and popups. Everything is read from a [`Snapshot`].

use crate::block::ShapeKind;
use crate::controller::{GameState, LoseReason};
use crate::snapshot::{CellView, Snapshot};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal columns per grid cell (glyph + gap).
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 24;
const CLEAR_FLASH_MS: u32 = 350;

/// Render-side state that outlives a frame: theme and the clear flash.
pub struct RenderContext {
    pub theme: Theme,
    animations: bool,
    /// Grid cells waiting for a flash effect to be built.
    pending_clear: Vec<(usize, usize)>,
    clear_effect: Option<Effect>,
    last_effect_tick: Option<Instant>,
}

impl RenderContext {
    pub fn new(theme: Theme, animations: bool) -> Self {
        Self {
            theme,
            animations,
            pending_clear: Vec::new(),
            clear_effect: None,
            last_effect_tick: None,
        }
    }

    /// Flash the given grid cells on the next frames.
    pub fn flash(&mut self, cells: &[(usize, usize)]) {
        if !self.animations || cells.is_empty() {
            return;
        }
        self.pending_clear = cells.to_vec();
        self.clear_effect = None;
        self.last_effect_tick = None;
    }

    fn cancel_effects(&mut self) {
        self.pending_clear.clear();
        self.clear_effect = None;
        self.last_effect_tick = None;
    }
}

pub fn glyph(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Triangle => "▲",
        ShapeKind::Square => "■",
        ShapeKind::Circle => "●",
        ShapeKind::Pentagon => "⬟",
        ShapeKind::Star => "★",
        ShapeKind::Diamond => "◆",
    }
}

/// Buffer position of grid cell (x, y), or None for buffer rows and cells outside `board`.
fn cell_origin(board: Rect, top: usize, x: usize, y: usize) -> Option<(u16, u16)> {
    let row = y.checked_sub(top)? as u16;
    let rx = board.x + x as u16 * CELL_WIDTH;
    let ry = board.y + row;
    (rx < board.right() && ry < board.bottom()).then_some((rx, ry))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

pub fn draw(frame: &mut Frame, snapshot: &Snapshot<'_>, ctx: &mut RenderContext, now: Instant) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(ctx.theme.bg)),
        area,
    );
    match snapshot.state {
        GameState::Menu => {
            ctx.cancel_effects();
            draw_menu(frame, &ctx.theme, area);
        }
        state => {
            let board = draw_game(frame, snapshot, &ctx.theme, area);
            apply_clear_effect(frame, ctx, board, snapshot.visible_top(), now);
            match state {
                GameState::Paused => draw_pause_popup(frame, &ctx.theme, area),
                GameState::Lose | GameState::Win => {
                    draw_end_popup(frame, snapshot, &ctx.theme, area);
                }
                _ => {}
            }
        }
    }
}

/// Build the flash for pending cells, then advance it by the time since the last frame.
fn apply_clear_effect(
    frame: &mut Frame,
    ctx: &mut RenderContext,
    board: Rect,
    top: usize,
    now: Instant,
) {
    if ctx.clear_effect.is_none() && ctx.pending_clear.is_empty() {
        return;
    }
    let delta = ctx
        .last_effect_tick
        .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    ctx.last_effect_tick = Some(now);

    if ctx.clear_effect.is_none() {
        let positions: HashSet<(u16, u16)> = ctx
            .pending_clear
            .drain(..)
            .filter_map(|(x, y)| cell_origin(board, top, x, y))
            .flat_map(|(rx, ry)| [(rx, ry), (rx + 1, ry)])
            .collect();
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let flash = ctx.theme.flash;
        let effect = fx::fade_from(flash, flash, (CLEAR_FLASH_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        ctx.clear_effect = Some(effect);
    }

    if let Some(effect) = ctx.clear_effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
        if effect.done() {
            ctx.cancel_effects();
        }
    }
}

fn draw_menu(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 44, 14);
    let title = Style::default()
        .fg(theme.title)
        .add_modifier(Modifier::BOLD);
    let fg = Style::default().fg(theme.main_fg);
    let hint = Style::default().fg(theme.inactive_fg);

    let shapes: Vec<Span> = ShapeKind::ALL
        .iter()
        .map(|&k| {
            Span::styled(
                format!("{} ", glyph(k)),
                Style::default().fg(theme.block_color(k.color())),
            )
        })
        .collect();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("GeoMatch", title)),
        Line::from(Span::styled("Falling Geo-Block Puzzle", fg)),
        Line::from(""),
        Line::from(shapes),
        Line::from(""),
        Line::from(Span::styled("Match 4 alike, ◆ clears its row", fg)),
        Line::from(""),
        Line::from(Span::styled(
            " Enter  Start ",
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("←/→ move  ↓ drop  ↑ rotate", hint)),
        Line::from(Span::styled("P pause  Q quit", hint)),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line)),
        ),
        popup,
    );
}

/// Playfield and sidebar, centred. Returns the inner board rect.
fn draw_game(frame: &mut Frame, snapshot: &Snapshot<'_>, theme: &Theme, area: Rect) -> Rect {
    let visible_rows = snapshot.height().saturating_sub(snapshot.visible_top()) as u16;
    let pw = snapshot.width() as u16 * CELL_WIDTH + 2;
    let ph = visible_rows + 2;
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
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);

    let board = draw_playfield(frame, snapshot, theme, inner[0]);
    draw_sidebar(frame, snapshot, theme, inner[1]);
    board
}

fn draw_playfield(frame: &mut Frame, snapshot: &Snapshot<'_>, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" GeoMatch ", theme.title));
    let board = block.inner(area);
    frame.render_widget(block, area);

    let top = snapshot.visible_top();
    let buf = frame.buffer_mut();
    let mut put = |cell: CellView, active: bool| {
        let Some((rx, ry)) = cell_origin(board, top, cell.x, cell.y) else {
            return;
        };
        let mut style = Style::default()
            .fg(theme.block_color(cell.color))
            .bg(theme.bg);
        if cell.is_trigger || active {
            style = style.add_modifier(Modifier::BOLD);
        }
        buf.set_string(rx, ry, glyph(cell.kind), style);
    };
    for cell in snapshot.cells() {
        put(cell, false);
    }
    for cell in snapshot.active() {
        put(cell, true);
    }
    board
}

fn draw_sidebar(frame: &mut Frame, snapshot: &Snapshot<'_>, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // time, score, goal
            Constraint::Length(3), // progress
            Constraint::Length(1),
            Constraint::Length(8), // shapes legend
        ])
        .split(area);

    let time_style = if snapshot.time_left < 30.0 {
        Style::default().fg(Color::Red)
    } else {
        fg_style
    };
    let stats = vec![
        Line::from(vec![
            Span::styled("Time:  ", title_style),
            Span::styled(format!("{:.1}", snapshot.time_left), time_style),
        ]),
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(snapshot.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Goal:  ", title_style),
            Span::styled(snapshot.target_score.to_string(), fg_style),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(stats).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style),
        ),
        chunks[0],
    );

    let ratio = snapshot.progress();
    frame.render_widget(
        Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .ratio(ratio)
            .label(format!("{:.0}%", ratio * 100.0))
            .gauge_style(Style::default().fg(theme.title).bg(theme.bg)),
        chunks[1],
    );

    let legend: Vec<Line> = ShapeKind::ALL
        .iter()
        .map(|&k| {
            let note = if k.is_trigger() { " clears row" } else { "" };
            Line::from(vec![
                Span::styled(
                    glyph(k),
                    Style::default().fg(theme.block_color(k.color())),
                ),
                Span::styled(format!(" {:?}{note}", k), fg_style),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(legend).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Shapes ", title_style)),
        ),
        chunks[3],
    );
}

fn draw_popup(frame: &mut Frame, theme: &Theme, area: Rect, title: &str, lines: Vec<Line<'_>>) {
    let popup = centered(area, 30, lines.len() as u16 + 2);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.title))
                .style(Style::default().bg(theme.bg))
                .title(Span::styled(format!(" {title} "), theme.title)),
        ),
        popup,
    );
}

fn draw_pause_popup(frame: &mut Frame, theme: &Theme, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("P  Continue", fg)),
        Line::from(Span::styled("R  Restart", fg)),
        Line::from(Span::styled("M  Main Menu", fg)),
        Line::from(""),
    ];
    draw_popup(frame, theme, area, "Paused", lines);
}

fn end_title(state: GameState, reason: Option<LoseReason>) -> &'static str {
    match (state, reason) {
        (GameState::Win, _) => "Congratulations!",
        (_, Some(LoseReason::TimeUp)) => "Time's up!",
        _ => "Game Over",
    }
}

fn draw_end_popup(frame: &mut Frame, snapshot: &Snapshot<'_>, theme: &Theme, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let banner = if snapshot.state == GameState::Win {
        Style::default().fg(Color::Black).bg(theme.title)
    } else {
        Style::default().fg(Color::White).bg(Color::Red)
    };
    let title = end_title(snapshot.state, snapshot.lose_reason);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {title} "), banner)),
        Line::from(""),
        Line::from(Span::styled(format!("Final score: {}", snapshot.score), fg)),
        Line::from(""),
        Line::from(Span::styled("Enter  Play again", fg)),
        Line::from(Span::styled("M  Main Menu", fg)),
        Line::from(Span::styled("Q  Quit", fg)),
        Line::from(""),
    ];
    draw_popup(frame, theme, area, "GeoMatch", lines);
}
