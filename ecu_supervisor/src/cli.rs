//! The operator CLI: a single-character command set read from a
//! UART/terminal. A direct byte match is more idiomatic here than a
//! `clap` parser — this is a one-shot-per-keystroke REPL, not a
//! multi-flag process invocation.

use std::io::Read;
use std::sync::mpsc::Sender;
use std::thread;

/// One parsed operator command (`t s = - ] [ r p o k y x d`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `t` — start the wasted-spark→sequential trim.
    Trim,
    /// `s` — toggle timing-advance-enabled mode.
    ToggleAdvance,
    /// `=` — bump timing advance (clamped 0..=40 degrees).
    BumpAdvance,
    /// `-` — cut timing advance.
    CutAdvance,
    /// `]` — bump fuel pulse width (clamped 0..=20 ms).
    BumpFuel,
    /// `[` — cut fuel pulse width.
    CutFuel,
    /// `r` — print RPM and the 10°-equivalent microsecond span.
    PrintRpm,
    /// `p` — prime all four injectors for 17ms each.
    PrimeInjectors,
    /// `o` — master relay on.
    RelayOn,
    /// `k` — starter on.
    StarterOn,
    /// `y` — toggle record mode.
    ToggleRecordMode,
    /// `x` — force-die (operator-triggered fatal shutdown).
    ForceDie,
    /// `d` — print test probes (current output-driver state).
    PrintProbes,
}

/// Parse one input byte into a [`Command`]. Unrecognized bytes
/// (including newlines from line-buffered terminals) are silently
/// ignored, matching the original's `default: break;`.
pub fn parse(byte: u8) -> Option<Command> {
    match byte {
        b't' => Some(Command::Trim),
        b's' => Some(Command::ToggleAdvance),
        b'=' => Some(Command::BumpAdvance),
        b'-' => Some(Command::CutAdvance),
        b']' => Some(Command::BumpFuel),
        b'[' => Some(Command::CutFuel),
        b'r' => Some(Command::PrintRpm),
        b'p' => Some(Command::PrimeInjectors),
        b'o' => Some(Command::RelayOn),
        b'k' => Some(Command::StarterOn),
        b'y' => Some(Command::ToggleRecordMode),
        b'x' => Some(Command::ForceDie),
        b'd' => Some(Command::PrintProbes),
        _ => None,
    }
}

/// Spawn a background thread that reads single bytes from `reader` and
/// forwards parsed commands down `tx`. Runs until the reader hits EOF
/// or the channel's receiver is dropped.
pub fn spawn_reader<R>(mut reader: R, tx: Sender<Command>) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; 1];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if let Some(cmd) = parse(buf[0]) {
                        if tx.send(cmd).is_err() {
                            break;
                        }
                    }
                }
                Err(_) => break,
            }
        }
    })
}
