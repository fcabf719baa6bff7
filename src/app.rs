use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use beatkeeper::command::{Command, CommandBus, CommandReceiver, CommandSender, CommandSource, Poll};
use beatkeeper::event::EventLog;
use beatkeeper::settings::{self, JsonFileStore};
use beatkeeper::{BeatEvent, Bpm, ManualTimer, MetronomeEngine, SystemTimer, TimeSignature};
use crossbeam_channel::{unbounded, Receiver};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{cursor, execute};
use parking_lot::RwLock;

use crate::ui::{render_status, StatusInfo, Theme};

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Command(Command),
    Quit,
    Ignore,
}

/// Map a key press to an action
pub fn map_key(key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char(' ') | KeyCode::Enter => KeyAction::Command(Command::Toggle),
        KeyCode::Char('t') => KeyAction::Command(Command::Tap),
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => {
            KeyAction::Command(Command::NudgeBpm(1))
        }
        KeyCode::Char('-') | KeyCode::Down => KeyAction::Command(Command::NudgeBpm(-1)),
        KeyCode::Char(']') | KeyCode::Right => KeyAction::Command(Command::NudgeBpm(10)),
        KeyCode::Char('[') | KeyCode::Left => KeyAction::Command(Command::NudgeBpm(-10)),
        KeyCode::Char('s') => KeyAction::Command(Command::CycleTimeSignature),
        _ => KeyAction::Ignore,
    }
}

/// Interactive terminal metronome
pub struct App {
    /// Current theme
    theme: Theme,
    /// Engine driven by wall-clock timers
    engine: MetronomeEngine<SystemTimer>,
    /// Beats forwarded by the engine listener
    beats: Receiver<BeatEvent>,
    /// Persisted tempo and signature
    store: JsonFileStore,
    /// Command history, shared with the input thread
    event_log: Arc<RwLock<EventLog>>,
    /// Ring the terminal bell on every downbeat
    bell: bool,
    last_beat: Option<BeatEvent>,
    /// Save failure shown until the next successful save
    status_message: Option<String>,
}

impl App {
    /// Create the app and restore the saved tempo and signature
    pub fn new(theme: Theme, store: JsonFileStore, bell: bool) -> Self {
        let mut engine = MetronomeEngine::new(SystemTimer::new());
        settings::restore(&mut engine, &store);

        let (tx, beats) = unbounded();
        engine.set_listener(move |event| {
            // The receiver only goes away when the app does.
            let _ = tx.send(*event);
        });

        Self {
            theme,
            engine,
            beats,
            store,
            event_log: Arc::new(RwLock::new(EventLog::new())),
            bell,
            last_beat: None,
            status_message: None,
        }
    }

    /// Apply a command and save tempo and signature if it changed them
    pub fn dispatch(&mut self, cmd: Command, source: CommandSource) {
        if source != CommandSource::Keyboard {
            // Keyboard commands are logged by the input thread.
            self.event_log.write().log(cmd, source);
        }

        let before = (self.engine.bpm(), self.engine.time_signature());
        self.engine.apply(cmd);
        let after = (self.engine.bpm(), self.engine.time_signature());

        if before != after {
            match settings::persist(&self.engine, &mut self.store) {
                Ok(()) => self.status_message = None,
                Err(e) => {
                    log::warn!("failed to save settings: {:#}", e);
                    self.status_message = Some(format!("Save failed: {}", e));
                }
            }
        }
    }

    /// Run the main application loop
    pub fn run(&mut self) -> Result<()> {
        let bus = CommandBus::new();
        let input = spawn_input_thread(bus.sender(), self.event_log.clone());
        let commands = bus.into_receiver();

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, cursor::Hide, Print(HELP_LINE), Print("\r\n"))?;

        let result = self.main_loop(&commands, &mut stdout);

        self.engine.stop();
        execute!(stdout, Print("\r\n"), cursor::Show)?;
        disable_raw_mode()?;

        // The input thread exits on the quit key, which is how we got here.
        if input.join().is_err() {
            log::warn!("input thread panicked");
        }
        log::info!("{}", session_summary(&self.event_log.read()));
        result
    }

    /// Main event loop: wait for a command or the next timer, whichever is first
    fn main_loop(&mut self, commands: &CommandReceiver, out: &mut Stdout) -> Result<()> {
        loop {
            self.render(out)?;

            let deadline = self.engine.timer_mut().next_deadline();
            match commands.poll_until(deadline) {
                Poll::Command(cmd, source) => self.dispatch(cmd, source),
                Poll::Idle => {}
                Poll::Closed => break,
            }

            while let Some(handle) = self.engine.timer_mut().pop_due() {
                self.engine.fire(handle);
            }

            for beat in self.beats.try_iter() {
                if self.bell && beat.is_downbeat() && self.engine.is_playing() {
                    out.write_all(b"\x07")?;
                }
                self.last_beat = Some(beat);
            }
        }
        Ok(())
    }

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        let info = StatusInfo {
            playing: self.engine.is_playing(),
            bpm: self.engine.bpm(),
            signature: self.engine.time_signature(),
            last_beat: self.last_beat,
            taps: self.engine.tap_count(),
            message: self.status_message.as_deref(),
        };
        render_status(out, &info, &self.theme)
    }
}

const HELP_LINE: &str =
    "space: play/stop  t: tap  +/-: 1 BPM  ]/[: 10 BPM  s: time signature  q: quit";

/// Read keys on a separate thread and forward them to the bus. Returning
/// drops the sender, which closes the bus.
fn spawn_input_thread(sender: CommandSender, event_log: Arc<RwLock<EventLog>>) -> JoinHandle<()> {
    thread::spawn(move || loop {
        let key = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
            Ok(_) => continue,
            Err(e) => {
                log::warn!("failed to read terminal input: {}", e);
                break;
            }
        };
        match map_key(key) {
            KeyAction::Quit => break,
            KeyAction::Command(cmd) => {
                event_log.write().log(cmd, CommandSource::Keyboard);
                if !sender.send(cmd, CommandSource::Keyboard) {
                    break;
                }
            }
            KeyAction::Ignore => {}
        }
    })
}

/// Count the logged commands by where they came from
fn session_summary(log: &EventLog) -> String {
    let events = log.get_events_since(0);
    let typed = events
        .iter()
        .filter(|e| e.source == CommandSource::Keyboard)
        .count();
    format!(
        "{} commands logged ({} keyboard, {} command line)",
        events.len(),
        typed,
        events.len() - typed
    )
}

/// Play `beats` beats on a simulated clock and print them, without touching
/// the terminal or the settings file
pub fn run_simulation(store: &JsonFileStore, overrides: &[Command], beats: u64) -> Result<()> {
    let mut engine = MetronomeEngine::new(ManualTimer::new());
    settings::restore(&mut engine, store);
    for cmd in overrides {
        engine.apply(*cmd);
    }

    let (tx, rx) = unbounded();
    engine.set_listener(move |event| {
        let _ = tx.send(*event);
    });

    let bpm = engine.bpm();
    let signature = engine.time_signature();
    println!("{} BPM in {}, {} beats", bpm, signature, beats);

    engine.start();
    engine.advance(bpm.beat_offset(beats));
    engine.stop();

    let mut out = io::stdout().lock();
    for beat in rx.try_iter() {
        writeln!(out, "{}", simulation_line(&beat, bpm, signature))?;
    }
    Ok(())
}

fn simulation_line(beat: &BeatEvent, bpm: Bpm, signature: TimeSignature) -> String {
    let accent = if beat.is_downbeat() { "ACCENT" } else { "" };
    format!(
        "{:>9.3}s  {:>2}/{}  {:>3} BPM  {}",
        beat.at.as_secs_f64(),
        beat.index + 1,
        signature.numerator(),
        bpm,
        accent
    )
}
