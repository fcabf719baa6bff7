mod app;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use beatkeeper::command::{Command, CommandSource};
use beatkeeper::settings::{self, JsonFileStore};
use beatkeeper::TimeSignature;
use clap::Parser;

use app::App;
use ui::Theme;

/// Beatkeeper - terminal metronome with tap tempo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tempo in beats per minute (30-300), overrides the saved tempo
    #[arg(long)]
    bpm: Option<u16>,

    /// Time signature such as 3/4 or 7/8, overrides the saved one
    #[arg(long)]
    signature: Option<TimeSignature>,

    /// Settings file holding the saved tempo and time signature
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Start playing immediately
    #[arg(long)]
    start: bool,

    /// Ring the terminal bell on every downbeat
    #[arg(long)]
    bell: bool,

    /// Theme to use for the interface
    #[arg(long, default_value = "default")]
    theme: String,

    /// List available themes and exit
    #[arg(long)]
    list_themes: bool,

    /// List the time signatures offered by the cycle key and exit
    #[arg(long)]
    list_signatures: bool,

    /// Print the given number of beats on a simulated clock and exit
    #[arg(long, value_name = "BEATS")]
    simulate: Option<u64>,
}

impl Args {
    /// Command-line overrides, applied after the saved settings
    fn overrides(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        if let Some(bpm) = self.bpm {
            commands.push(Command::SetBpm(bpm));
        }
        if let Some(signature) = self.signature {
            commands.push(Command::SetTimeSignature {
                numerator: signature.numerator(),
                denominator: signature.denominator(),
            });
        }
        commands
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::init();

    if args.list_themes {
        println!("Available themes:");
        for theme in Theme::available_themes() {
            println!("  {}", theme);
        }
        return Ok(());
    }

    if args.list_signatures {
        println!("Time signatures:");
        for signature in TimeSignature::COMMON {
            println!("  {}", signature);
        }
        return Ok(());
    }

    let settings_path = args.settings.clone().unwrap_or_else(settings::default_path);
    let store = JsonFileStore::open(&settings_path)?;
    log::debug!("settings at {}", store.path().display());

    if let Some(beats) = args.simulate {
        return app::run_simulation(&store, &args.overrides(), beats);
    }

    let theme = Theme::from_name(&args.theme).unwrap_or_else(|| {
        eprintln!(
            "Warning: Unknown theme '{}', using default. Use --list-themes to see available themes.",
            args.theme
        );
        Theme::default()
    });
    log::debug!("using theme {}", theme.name);

    let mut app = App::new(theme, store, args.bell);
    for cmd in args.overrides() {
        app.dispatch(cmd, CommandSource::CommandLine);
    }
    if args.start {
        app.dispatch(Command::Start, CommandSource::CommandLine);
    }
    app.run()
}
