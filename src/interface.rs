use std::fmt;
use std::io::{self, BufRead};
use std::str::FromStr;

use super::inputs::*;

#[derive(Debug)]
pub enum ProtocolError {
    Io(io::Error),
    Eof,
    Malformed { line: String, reason: String },
    Constants(serde_json::Error),
}
impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Io(err) => write!(f, "failed to read from host: {}", err),
            ProtocolError::Eof => write!(f, "host closed the input"),
            ProtocolError::Malformed { line, reason } => write!(f, "malformed line {:?}: {}", line, reason),
            ProtocolError::Constants(err) => write!(f, "invalid game constants: {}", err),
        }
    }
}
impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Io(err) => Some(err),
            ProtocolError::Constants(err) => Some(err),
            _ => None,
        }
    }
}
impl From<io::Error> for ProtocolError {
    fn from(err: io::Error) -> Self { ProtocolError::Io(err) }
}
impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self { ProtocolError::Constants(err) }
}

/// What the host sends once before the first turn, kept for building every frame
#[derive(Clone,Debug)]
pub struct Game {
    pub rules: Rules,
    pub me: PlayerId,
    pub shipyards: Vec<(PlayerId, Position)>,
    pub grid: Grid,
}

struct Line {
    text: String,
}
impl Line {
    fn tokens(&self) -> Tokens<'_> {
        Tokens {
            line: &self.text,
            parts: self.text.split_whitespace(),
        }
    }
}

struct Tokens<'a> {
    line: &'a str,
    parts: std::str::SplitWhitespace<'a>,
}
impl<'a> Tokens<'a> {
    fn next<T: FromStr>(&mut self, what: &str) -> Result<T, ProtocolError> {
        let token = self.parts.next().ok_or_else(|| malformed(self.line, format!("missing {}", what)))?;
        token.parse().map_err(|_| malformed(self.line, format!("bad {}: {}", what, token)))
    }
}

fn malformed(line: &str, reason: String) -> ProtocolError {
    ProtocolError::Malformed { line: line.trim().to_string(), reason }
}

fn read_line(input: &mut impl BufRead) -> Result<Line, ProtocolError> {
    let mut text = String::new();
    if input.read_line(&mut text)? == 0 {
        return Err(ProtocolError::Eof);
    }
    Ok(Line { text })
}

pub fn read_initial(input: &mut impl BufRead) -> Result<Game, ProtocolError> {
    let constants = read_line(input)?;
    let rules: Rules = serde_json::from_str(constants.text.trim())?;

    let header = read_line(input)?;
    let mut tokens = header.tokens();
    let num_players: usize = tokens.next("player count")?;
    let me: PlayerId = tokens.next("player id")?;

    let mut shipyards = Vec::with_capacity(num_players);
    for _ in 0..num_players {
        let line = read_line(input)?;
        let mut tokens = line.tokens();
        let id: PlayerId = tokens.next("player id")?;
        let x = tokens.next("shipyard x")?;
        let y = tokens.next("shipyard y")?;
        shipyards.push((id, Position::new(x, y)));
    }

    let size = read_line(input)?;
    let mut tokens = size.tokens();
    let width: i32 = tokens.next("width")?;
    let height: i32 = tokens.next("height")?;
    if width <= 0 || height <= 0 {
        return Err(malformed(&size.text, "empty map".to_string()));
    }

    let mut halite = Vec::with_capacity((width * height) as usize);
    for _ in 0..height {
        let row = read_line(input)?;
        let mut tokens = row.tokens();
        for _ in 0..width {
            halite.push(tokens.next("halite")?);
        }
    }

    tracing::info!(players = num_players, me, width, height, "game started");
    Ok(Game {
        rules,
        me,
        shipyards,
        grid: Grid::new(width, height, halite),
    })
}

/// Reads one turn. Cell updates are applied to `game.grid`; units and structures come fresh from the frame.
pub fn read_frame(input: &mut impl BufRead, game: &mut Game) -> Result<WorldState, ProtocolError> {
    let turn_line = read_line(input)?;
    let host_turn: u32 = turn_line.tokens().next("turn")?;

    let mut players = Vec::with_capacity(game.shipyards.len());
    for _ in 0..game.shipyards.len() {
        let line = read_line(input)?;
        let mut tokens = line.tokens();
        let id: PlayerId = tokens.next("player id")?;
        let num_units: usize = tokens.next("unit count")?;
        let num_dropoffs: usize = tokens.next("dropoff count")?;
        let halite: i32 = tokens.next("bank")?;

        let shipyard = game.shipyards.iter()
            .find(|(owner, _)| *owner == id)
            .map(|&(_, position)| position)
            .ok_or_else(|| malformed(&line.text, format!("unknown player {}", id)))?;

        let mut units = Vec::with_capacity(num_units);
        for _ in 0..num_units {
            let line = read_line(input)?;
            let mut tokens = line.tokens();
            let unit_id = tokens.next("unit id")?;
            let x = tokens.next("unit x")?;
            let y = tokens.next("unit y")?;
            let cargo = tokens.next("cargo")?;
            units.push(Unit { owner: id, id: unit_id, position: Position::new(x, y), cargo });
        }

        let mut structures = Vec::with_capacity(num_dropoffs + 1);
        structures.push(Structure {
            owner: id,
            id: id as StructureId,
            position: shipyard,
            kind: StructureKind::Shipyard,
            provisional: false,
        });
        for _ in 0..num_dropoffs {
            let line = read_line(input)?;
            let mut tokens = line.tokens();
            let structure_id = tokens.next("dropoff id")?;
            let x = tokens.next("dropoff x")?;
            let y = tokens.next("dropoff y")?;
            structures.push(Structure {
                owner: id,
                id: structure_id,
                position: Position::new(x, y),
                kind: StructureKind::Dropoff,
                provisional: false,
            });
        }

        players.push(Player { id, halite, units, structures });
    }
    if !players.iter().any(|player| player.id == game.me) {
        return Err(malformed(&turn_line.text, format!("no frame for own player {}", game.me)));
    }

    let count_line = read_line(input)?;
    let num_updates: usize = count_line.tokens().next("update count")?;
    for _ in 0..num_updates {
        let line = read_line(input)?;
        let mut tokens = line.tokens();
        let x = tokens.next("cell x")?;
        let y = tokens.next("cell y")?;
        let halite = tokens.next("cell halite")?;
        let cell = game.grid.index(Position::new(x, y));
        game.grid.halite[cell] = halite;
    }

    Ok(WorldState {
        turn: host_turn.saturating_sub(1),
        me: game.me,
        rules: game.rules.clone(),
        grid: game.grid.clone(),
        players,
    })
}

pub fn format_action(action: &Action) -> String {
    match action {
        Action::Move { unit, direction } => format!("m {} {}", unit, direction),
        Action::Convert { unit } => format!("c {}", unit),
        Action::Spawn => "g".to_string(),
    }
}

pub fn format_actions(actions: &[Action]) -> String {
    actions.iter().map(format_action).collect::<Vec<_>>().join(" ")
}
