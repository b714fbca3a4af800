// Celebration overlay: confetti scattered over the page after a market is
// registered.

use std::time::{Duration, Instant};

use rand::Rng;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::Frame;

/// How long the confetti stays on screen.
pub const CELEBRATION_DURATION: Duration = Duration::from_secs(2);

const PIECE_COUNT: usize = 120;
const SYMBOLS: &[&str] = &["*", "+", "•", "◆", "▪", "~"];
const COLORS: &[Color] = &[
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Cyan,
    Color::Magenta,
    Color::Blue,
];

/// One confetti piece, positioned as a fraction of the covered area so the
/// burst survives terminal resizes.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub x: f32,
    pub y: f32,
    pub symbol: &'static str,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct Celebration {
    pub started: Instant,
    pub pieces: Vec<Piece>,
}

impl Celebration {
    pub fn new(started: Instant) -> Self {
        Self::with_rng(started, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(started: Instant, rng: &mut R) -> Self {
        let pieces = (0..PIECE_COUNT)
            .map(|_| Piece {
                x: rng.gen_range(0.0..1.0),
                y: rng.gen_range(0.0..1.0),
                symbol: SYMBOLS[rng.gen_range(0..SYMBOLS.len())],
                color: COLORS[rng.gen_range(0..COLORS.len())],
            })
            .collect();
        Celebration { started, pieces }
    }

    pub fn is_over(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= CELEBRATION_DURATION
    }
}

/// Paint the pieces directly into the frame buffer over `area`.
pub fn render(frame: &mut Frame, area: Rect, celebration: &Celebration) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let buffer = frame.buffer_mut();
    for piece in &celebration.pieces {
        let x = area.x + ((piece.x * area.width as f32) as u16).min(area.width - 1);
        let y = area.y + ((piece.y * area.height as f32) as u16).min(area.height - 1);
        buffer[(x, y)]
            .set_symbol(piece.symbol)
            .set_style(Style::default().fg(piece.color));
    }
}
