//! Panelpop: Panel de Pon / Tetris Attack style block-matching puzzle in the terminal.

mod app;
mod game;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use game::BoardConfig;

/// Options derived from CLI that affect game behaviour (board rules, seed, tick rate).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub board: BoardConfig,
    /// Fixed seed for the row generator; a fresh one per game if unset.
    pub seed: Option<u64>,
    pub tick_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        logging::init(path, args.log_level)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        board: BoardConfig {
            width: usize::from(args.width),
            height: usize::from(args.height),
            spawn_period: args.spawn_period,
            clear_ticks: args.clear_ticks,
            fall_delay_ticks: args.fall_delay,
            gravity_ticks: args.gravity_ticks,
            score_per_block: BoardConfig::default().score_per_block,
            initial_rows: args.initial_rows,
            chain_policy: args.chain_policy,
        },
        seed: args.seed,
        tick_rate: args.tick_rate,
    };
    log::info!("Starting with {:?}", config);
    let mut app = App::new(config, theme)?;
    app.run()?;
    Ok(())
}

/// Panel de Pon style puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "panelpop",
    version,
    about = "Block-matching puzzle in the terminal. Swap blocks to line up three of a colour before the stack reaches the top.",
    long_about = "Panelpop is a terminal puzzle game in the style of Tetris Attack / Panel de Pon.\n\n\
        Blocks rise from the bottom of the well. Swap two horizontally adjacent blocks to line up \
        three or more of the same colour, horizontally or vertically. Matched blocks clear, blocks \
        above them fall, and matches made by falling blocks build chains worth more points. \
        The game ends when a new row is pushed while the top row is occupied.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Space / Enter  Swap\n  x              Raise stack    p              Pause\n  q / Esc        Quit           r              Restart (game over)"
)]
pub struct Args {
    /// Seed for the row generator (same seed, same rows). Random if not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Chain rule: cascade (only matches made by falling blocks extend a chain) or per-match (every matching tick extends it).
    #[arg(short, long, default_value = "cascade")]
    pub chain_policy: ChainPolicy,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Well width in columns.
    #[arg(long, default_value = "7", value_name = "COLS", value_parser = clap::value_parser!(u16).range(3..=16))]
    pub width: u16,

    /// Well height in rows.
    #[arg(long, default_value = "9", value_name = "ROWS", value_parser = clap::value_parser!(u16).range(4..=24))]
    pub height: u16,

    /// Ticks between new rows rising from the bottom.
    #[arg(long, default_value = "150", value_name = "TICKS", value_parser = clap::value_parser!(u32).range(1..))]
    pub spawn_period: u32,

    /// Ticks a matched block flashes before it disappears.
    #[arg(long, default_value = "45", value_name = "TICKS")]
    pub clear_ticks: u32,

    /// Ticks an unsupported block hangs before its first step down.
    #[arg(long, default_value = "40", value_name = "TICKS")]
    pub fall_delay: u32,

    /// Ticks per cell once a block is falling.
    #[arg(long, default_value = "2", value_name = "TICKS")]
    pub gravity_ticks: u32,

    /// Rows already on the board when the game starts.
    #[arg(long, default_value = "5", value_name = "N")]
    pub initial_rows: usize,

    /// Game logic ticks per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Write log output to this file (nothing is logged otherwise).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log level for --log-file.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: log::LevelFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

/// How the chain counter grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ChainPolicy {
    /// Only matches containing a block that fell from a cleared one extend the chain.
    #[default]
    Cascade,
    /// Every tick that produces a match extends the chain.
    PerMatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_match_board_defaults() {
        let args = Args::parse_from(["panelpop"]);
        let d = BoardConfig::default();
        assert_eq!(usize::from(args.width), d.width);
        assert_eq!(usize::from(args.height), d.height);
        assert_eq!(args.spawn_period, d.spawn_period);
        assert_eq!(args.clear_ticks, d.clear_ticks);
        assert_eq!(args.fall_delay, d.fall_delay_ticks);
        assert_eq!(args.gravity_ticks, d.gravity_ticks);
        assert_eq!(args.initial_rows, d.initial_rows);
        assert_eq!(args.chain_policy, ChainPolicy::Cascade);
    }

    #[test]
    fn test_chain_policy_flag() {
        let args = Args::parse_from(["panelpop", "--chain-policy", "per-match", "--seed", "7"]);
        assert_eq!(args.chain_policy, ChainPolicy::PerMatch);
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn test_width_out_of_range_is_rejected() {
        assert!(Args::try_parse_from(["panelpop", "--width", "2"]).is_err());
    }
}
