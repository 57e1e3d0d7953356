mod game_input_handler;
mod game_renderer;
pub mod terminal_menagerie;

use std::io;

use clap::Parser;
use menagerie_engine::{Difficulty, GameConfig};

/// Terminal frontend for the menagerie falling-block game.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The framerate at which to run the main game.
    #[arg(short, long, default_value_t = 30)]
    fps: u32,
    /// Gravity pacing: easy, normal, hard or expert.
    #[arg(short, long, default_value_t = String::from("normal"))]
    difficulty: String,
    /// Disable the oversized bonus shapes.
    #[arg(long)]
    no_crazy: bool,
    /// Disable the gap-filling swarm.
    #[arg(long)]
    no_fillers: bool,
    /// Disable the self-relocating creature piece.
    #[arg(long)]
    no_relocator: bool,
    /// Disable the block-removing creature.
    #[arg(long)]
    no_remover: bool,
}

fn main() -> Result<(), io::Error> {
    let args = Args::parse();
    let difficulty: Difficulty = args
        .difficulty
        .parse()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let config = GameConfig {
        difficulty,
        crazy_enabled: !args.no_crazy,
        fillers_enabled: !args.no_fillers,
        relocator_enabled: !args.no_relocator,
        remover_enabled: !args.no_remover,
        ..GameConfig::default()
    };
    let stdout = io::BufWriter::new(io::stdout());
    let mut app = terminal_menagerie::App::new(stdout, args.fps, config);
    let msg = app.run()?;
    drop(app);
    println!("{msg}");
    Ok(())
}
