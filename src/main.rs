use std::io::{self, Write};
use std::process;

use clap::Parser;

use prospector::agent::Agent;
use prospector::config::Config;
use prospector::deadline::Deadline;
use prospector::interface::{self, ProtocolError};

const BOT_NAME: &str = "prospector";

fn main() {
    let config = Config::parse();

    let level = if config.debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();

    match serde_json::to_string(&config) {
        Ok(json) => tracing::info!(config = %json, "starting"),
        Err(err) => tracing::warn!(error = %err, "could not serialize config"),
    }

    if let Err(err) = run(config) {
        tracing::error!(error = %err, "game aborted");
        process::exit(1);
    }
}

fn run(config: Config) -> Result<(), ProtocolError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    let mut game = interface::read_initial(&mut input)?;
    writeln!(output, "{}", BOT_NAME)?;
    output.flush()?;

    let budget_ms = config.turn_budget_ms;
    let mut agent = Agent::new(config);

    // game loop
    loop {
        let world = match interface::read_frame(&mut input, &mut game) {
            Ok(world) => world,
            Err(ProtocolError::Eof) => {
                tracing::info!("host closed the game");
                return Ok(());
            },
            Err(err) => return Err(err),
        };

        let deadline = Deadline::start(budget_ms);
        let actions = agent.act(&world, &deadline);

        writeln!(output, "{}", interface::format_actions(&actions))?;
        output.flush()?;
    }
}
