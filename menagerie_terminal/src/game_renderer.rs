use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, PrintStyledContent, Stylize},
    terminal, QueueableCommand,
};

use menagerie_engine::{
    CrazyKind, Feedback, FeedbackEvents, Game, GameTime, PieceKind, RemoverActivity, Tile,
    HEIGHT, WIDTH,
};

const MESSAGE_TTL: Duration = Duration::from_secs(4);
/// Board cells are drawn two characters wide.
const CELL_W: u16 = 2;

/// Draws one frame of the game into the terminal and keeps the short-lived
/// feedback message ticker.
#[derive(Default, Debug)]
pub struct GameRenderer {
    messages: Vec<(GameTime, String)>,
}

fn tile_color(tile: Tile) -> Color {
    match tile {
        Tile::Piece(PieceKind::I) => Color::Cyan,
        Tile::Piece(PieceKind::O) => Color::Yellow,
        Tile::Piece(PieceKind::T) => Color::Magenta,
        Tile::Piece(PieceKind::S) => Color::Green,
        Tile::Piece(PieceKind::Z) => Color::Red,
        Tile::Piece(PieceKind::J) => Color::Blue,
        Tile::Piece(PieceKind::L) => Color::DarkYellow,
        Tile::Crazy(CrazyKind::BigL) => Color::DarkBlue,
        Tile::Crazy(CrazyKind::BigT) => Color::DarkMagenta,
        Tile::Crazy(CrazyKind::WideZ) => Color::DarkRed,
        Tile::Crazy(CrazyKind::Slab) => Color::DarkGreen,
        Tile::Crazy(CrazyKind::LongBar) => Color::DarkCyan,
        Tile::Relocator => Color::White,
        Tile::Filler => Color::Grey,
    }
}

impl GameRenderer {
    pub fn render(
        &mut self,
        term: &mut impl Write,
        game: &Game,
        new_events: FeedbackEvents,
    ) -> io::Result<()> {
        let snapshot = game.snapshot();
        for (time, feedback) in new_events {
            if let Some(text) = Self::message(&feedback) {
                self.messages.push((time, text));
            }
        }
        self.messages
            .retain(|(time, _)| snapshot.time.saturating_sub(*time) < MESSAGE_TTL);

        term.queue(terminal::Clear(terminal::ClearType::All))?;
        // Playfield frame.
        let inner = "═".repeat((CELL_W as usize) * WIDTH);
        term.queue(MoveTo(0, 0))?
            .queue(Print(format!("╔{inner}╗")))?;
        for y in 0..HEIGHT as u16 {
            term.queue(MoveTo(0, y + 1))?.queue(Print("║"))?;
            term.queue(MoveTo(1 + CELL_W * WIDTH as u16, y + 1))?
                .queue(Print("║"))?;
        }
        term.queue(MoveTo(0, HEIGHT as u16 + 1))?
            .queue(Print(format!("╚{inner}╝")))?;

        let cell_at = |x: i32, y: i32| MoveTo(1 + CELL_W * x as u16, 1 + y as u16);

        // Settled cells.
        for (y, row) in snapshot.board.rows().iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(tile) = cell {
                    term.queue(cell_at(x as i32, y as i32))?
                        .queue(PrintStyledContent("██".with(tile_color(*tile))))?;
                }
            }
        }
        // Matched rows dissolve in place while their animation runs.
        if let Some(anim) = snapshot.clearing {
            let glyph = if anim.fade_alpha() >= 1.0 {
                "▓▓"
            } else if anim.outline_alpha() > 0.0 {
                "░░"
            } else {
                "  "
            };
            for &row in &anim.rows {
                for x in 0..WIDTH as i32 {
                    term.queue(cell_at(x, row as i32))?
                        .queue(PrintStyledContent(glyph.white()))?;
                }
            }
        }
        // Active piece, shaded to stand apart from settled material.
        if let Some(active) = snapshot.active {
            for (x, y) in active.cells() {
                if y >= 0 {
                    term.queue(cell_at(x, y))?
                        .queue(PrintStyledContent("▒▒".with(tile_color(active.tile))))?;
                }
            }
        }
        // Creatures.
        for filler in snapshot.fillers {
            let (x, y) = filler.board_cell();
            if (0..WIDTH as i32).contains(&x) && (0..HEIGHT as i32).contains(&y) {
                term.queue(cell_at(x, y))?
                    .queue(PrintStyledContent("··".yellow()))?;
            }
        }
        if let Some(remover) = snapshot.remover {
            let x = (remover.pos.0.floor() as i32).clamp(0, WIDTH as i32 - 1);
            let y = (remover.pos.1.floor() as i32).clamp(0, HEIGHT as i32 - 1);
            let glyph = match remover.activity {
                RemoverActivity::Prowling => "@@".dark_red(),
                RemoverActivity::Napping => "zZ".dark_grey(),
                RemoverActivity::Clawing { .. } => "><".red().bold(),
            };
            term.queue(cell_at(x, y))?.queue(PrintStyledContent(glyph))?;
        }

        // Sidebar.
        let side = CELL_W * WIDTH as u16 + 4;
        let secs = snapshot.time.as_secs();
        term.queue(MoveTo(side, 1))?
            .queue(Print(format!("score {:>8}", snapshot.score)))?;
        term.queue(MoveTo(side, 2))?
            .queue(Print(format!("lines {:>8}", snapshot.lines)))?;
        term.queue(MoveTo(side, 3))?
            .queue(Print(format!("level {:>8}", snapshot.level)))?;
        term.queue(MoveTo(side, 4))?
            .queue(Print(format!("time   {:>4}:{:02}", secs / 60, secs % 60)))?;
        if snapshot.paused {
            term.queue(MoveTo(side, 6))?
                .queue(PrintStyledContent("PAUSED".bold()))?;
        }
        // Next piece preview.
        term.queue(MoveTo(side, 8))?.queue(Print("next"))?;
        let next = &snapshot.next.shape;
        for row in 0..next.height() {
            term.queue(MoveTo(side, 9 + row as u16))?;
            for col in 0..next.width() {
                if next.filled(col, row) {
                    term.queue(PrintStyledContent(
                        "██".with(tile_color(snapshot.next.tile)),
                    ))?;
                } else {
                    term.queue(Print("  "))?;
                }
            }
        }
        // Feedback ticker, newest on top.
        for (i, (_, text)) in self.messages.iter().rev().take(6).enumerate() {
            term.queue(MoveTo(side, 15 + i as u16))?
                .queue(Print(text))?;
        }
        term.flush()
    }

    fn message(feedback: &Feedback) -> Option<String> {
        match feedback {
            Feedback::PieceLocked | Feedback::HardDrop => None,
            Feedback::LineClears(rows, _) => Some(format!(
                "{} line{} matched",
                rows.len(),
                if rows.len() == 1 { "" } else { "s" }
            )),
            Feedback::LinesCleared { n, score_bonus } => Some(format!(
                "+{score_bonus} for {n} line{}",
                if *n == 1 { "" } else { "s" }
            )),
            Feedback::GapFilled { .. } => Some(String::from("+5 gap patched")),
            Feedback::BlockClawed { .. } => Some(String::from("a block was clawed away")),
            Feedback::RelocationPhase(n) => {
                Some(format!("the long one stirs (phase {})", n + 1))
            }
            Feedback::GameOver { score, .. } => {
                Some(format!("GAME OVER! final score {score}"))
            }
        }
    }
}
