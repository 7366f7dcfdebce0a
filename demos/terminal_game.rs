//! Terminal game: play keydance with the lamps drawn in the terminal.
//!
//! F5 starts a game, keys 1/2/3 clear the Num/Caps/Scroll lamps, Esc quits.
//! Set `RUST_LOG=keydance=debug` and redirect stderr to follow the rounds.

use crossbeam_channel::{select, tick, unbounded};
use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use keydance::{GameConfig, HostEvent, KeyboardActor, Keydance, TerminalController};
use std::io::{self, Write};
use std::time::Duration;

/// Row where the status report starts.
const STATUS_ROW: u16 = 3;

fn main() -> keydance::Result<()> {
    env_logger::init();

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let result = run();

    let _ = execute!(stdout, cursor::Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    result
}

fn run() -> keydance::Result<()> {
    let lamps = TerminalController::with_origin(io::stdout(), 2, 1);
    let game = Keydance::with_controller(GameConfig::default(), lamps)?;
    let control = game.control();

    let (host_tx, host_rx) = unbounded();
    let keyboard = KeyboardActor::spawn(game.interrupt_line(), host_tx, Duration::from_millis(10))?;
    let refresh = tick(Duration::from_millis(100));

    loop {
        select! {
            recv(host_rx) -> event => match event {
                Ok(HostEvent::Start) => {
                    control.start();
                }
                Ok(HostEvent::Error(e)) => log::warn!("keyboard source: {e}"),
                Ok(HostEvent::Quit | HostEvent::Shutdown) | Err(_) => break,
            },
            recv(refresh) -> _ => draw_status(&control.report())?,
        }
    }

    keyboard.join();
    game.unload();
    Ok(())
}

/// Redraw the status report below the lamps in one write.
fn draw_status(report: &str) -> io::Result<()> {
    let mut frame = Vec::with_capacity(512);
    let lines = report
        .lines()
        .chain(["", "F5: start   1/2/3: clear lamps   Esc: quit"]);
    for (row, line) in (STATUS_ROW..).zip(lines) {
        queue!(
            frame,
            MoveTo(2, row),
            Clear(ClearType::UntilNewLine),
            Print(line)
        )?;
    }

    let mut stdout = io::stdout();
    stdout.write_all(&frame)?;
    stdout.flush()
}
