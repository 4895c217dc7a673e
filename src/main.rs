use std::process::ExitCode;

use clap::Parser;
use fen_link::config::Config;
use fen_link::opponent::{Opponent, RandomOpponent};
use fen_link::serial::SerialLink;
use fen_link::session::Session;
use fen_link::{fen, terminal};
use shakmaty::Chess;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    let position = match config.fen.as_deref().map(fen::load).transpose() {
        Ok(position) => position.unwrap_or_default(),
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let link = match SerialLink::open(&config.serial()) {
        Ok(link) => link,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!("Chess Board - {}", config.port);

    match config.seed {
        Some(seed) => play(&config, position, link, RandomOpponent::seeded(seed)),
        None => play(&config, position, link, RandomOpponent::new()),
    }
}

fn play(config: &Config, position: Chess, link: SerialLink, opponent: impl Opponent) -> ExitCode {
    let mut session = Session::new(position, link, opponent)
        .with_mode(config.mode)
        .with_highlights(config.highlights);

    let outcome = terminal::run_interactive_terminal(&mut session);
    session.peripheral_mut().transport_mut().close();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
