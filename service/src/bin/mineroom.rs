use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use mineroom_core::{ActionKind, DISPLACEMENTS, Difficulty, FLAGGED, HIDDEN, MINE};
use mineroom_protocol::{BatchActionRequest, CreateSessionRequest, PlayerAction, SessionView, encode};
use mineroom_service::{GameHub, ServiceConfig};
use tracing_subscriber::filter::LevelFilter;

const HELP: &str = "\
commands:
  new [easy|medium|hard | WIDTH HEIGHT MINES]
  reveal ROW COL      flag ROW COL      unflag ROW COL      toggle ROW COL
  chord ROW COL       reveal every hidden neighbor at once
  pause  resume  surrender  restart
  show  json  help  quit";

#[derive(Parser, Debug)]
#[command(name = "mineroom", version, about = "Play a minesweeper session from the terminal")]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// TOML service configuration
    #[arg(short, long, env = "MINEROOM_CONFIG")]
    config: Option<PathBuf>,

    /// Force a seed instead of the clock
    #[arg(short, long)]
    seed: Option<u64>,

    /// Player name recorded on new sessions
    #[arg(short, long, default_value = "local")]
    user: String,
}

enum Flow {
    Continue,
    Quit,
}

struct Repl {
    hub: GameHub,
    user: String,
    current: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose.log_level_filter());

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    log::debug!("seed: {:?}", config.seed);

    let mut repl = Repl {
        hub: GameHub::from_config(&config)?,
        user: args.user,
        current: None,
    };

    println!("{HELP}");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("> ");
        stdout.flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match repl.run(&line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => eprintln!("error: {err}"),
        }
    }
    Ok(())
}

fn init_logging(filter: log::LevelFilter) {
    let level = match filter {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

impl Repl {
    fn run(&mut self, line: &str) -> anyhow::Result<Flow> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            return Ok(Flow::Continue);
        };

        let sessions = self.hub.sessions();
        let view = match command.to_ascii_lowercase().as_str() {
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            "help" | "?" => {
                println!("{HELP}");
                return Ok(Flow::Continue);
            }
            "new" => {
                let request = new_request(rest)?.with_user(self.user.as_str());
                let view = self.hub.start_game(&request)?;
                self.current = Some(view.session_id.clone());
                view
            }
            "reveal" | "r" => self.act(ActionKind::Reveal, rest)?,
            "flag" | "f" => self.act(ActionKind::Flag, rest)?,
            "unflag" => self.act(ActionKind::Unflag, rest)?,
            "toggle" | "t" => self.act(ActionKind::ToggleFlag, rest)?,
            "chord" | "c" => {
                let (row, col) = parse_coords(rest)?;
                let view = sessions.get_view(self.current()?)?;
                let batch = chord(&view, row, col);
                let result = sessions.apply_batch(self.current()?, &batch)?;
                log::info!("chord applied {} of {}", result.applied, batch.actions.len());
                result.session
            }
            "pause" => sessions.pause(self.current()?)?,
            "resume" => sessions.resume(self.current()?)?,
            "surrender" => sessions.surrender(self.current()?)?,
            "restart" => sessions.restart(self.current()?)?,
            "show" => sessions.get_view(self.current()?)?,
            "json" => {
                let view = sessions.get_view(self.current()?)?;
                println!("{}", encode(&view).context("encoding view")?);
                return Ok(Flow::Continue);
            }
            other => bail!("unknown command {other:?}, try `help`"),
        };

        print!("{}", render(&view));
        Ok(Flow::Continue)
    }

    fn act(&self, kind: ActionKind, rest: &[&str]) -> anyhow::Result<SessionView> {
        let (row, col) = parse_coords(rest)?;
        let action = PlayerAction::new(kind, row, col);
        Ok(self.hub.sessions().apply_action(self.current()?, &action)?)
    }

    fn current(&self) -> anyhow::Result<&str> {
        self.current
            .as_deref()
            .context("no session yet, start one with `new`")
    }
}

fn new_request(rest: &[&str]) -> anyhow::Result<CreateSessionRequest> {
    match rest {
        [] => CreateSessionRequest::preset(Difficulty::Easy).context("easy preset"),
        [level] => Difficulty::parse(level)
            .and_then(CreateSessionRequest::preset)
            .with_context(|| format!("unknown difficulty {level:?}")),
        [width, height, mines] => Ok(CreateSessionRequest::new(
            width.parse().context("width")?,
            height.parse().context("height")?,
            mines.parse().context("mines")?,
        )),
        _ => bail!("usage: new [easy|medium|hard | WIDTH HEIGHT MINES]"),
    }
}

fn parse_coords(rest: &[&str]) -> anyhow::Result<(u32, u32)> {
    match rest {
        [row, col] => Ok((row.parse().context("row")?, col.parse().context("col")?)),
        _ => bail!("expected ROW COL"),
    }
}

/// Reveals of every hidden neighbor of `(row, col)`, sent as one batch.
fn chord(view: &SessionView, row: u32, col: u32) -> BatchActionRequest {
    let actions = DISPLACEMENTS
        .iter()
        .filter_map(|&(d_row, d_col)| {
            let row = row.checked_add_signed(d_row.into())?;
            let col = col.checked_add_signed(d_col.into())?;
            let cell = view.cell(row as usize, col as usize)?;
            (cell == HIDDEN).then(|| PlayerAction::new(ActionKind::Reveal, row, col))
        })
        .collect();
    BatchActionRequest { actions }
}

fn render(view: &SessionView) -> String {
    let mut out = format!(
        "{} {}  {:?}  mines left {}  {}.{:01}s\n   ",
        view.session_id,
        view.difficulty.as_str(),
        view.status,
        view.mines_left,
        view.elapsed_ms / 1000,
        view.elapsed_ms % 1000 / 100,
    );
    for col in 0..view.width {
        out.push_str(&format!("{:>3}", col));
    }
    out.push('\n');
    for (row, cells) in view.board.iter().enumerate() {
        out.push_str(&format!("{row:>3}"));
        for &cell in cells {
            let glyph = match cell {
                MINE => '*',
                HIDDEN => '#',
                FLAGGED => 'F',
                0 => '.',
                count => char::from(b'0' + count as u8),
            };
            out.push_str(&format!("{glyph:>3}"));
        }
        out.push('\n');
    }
    out
}
