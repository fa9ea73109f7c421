use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Export,
    Clear,
    ToggleFollow,
    ReloadInterfaces,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Run(Command),
    /// Claimed chord whose guard failed. Consumed, nothing happens.
    Suppressed,
    /// Not ours; the focused widget gets it.
    Passthrough,
}

/// Maps a key press onto a global command.
///
/// Chords are Ctrl plus a letter and nothing else. They are claimed whether
/// or not their guard passes, so they never reach the focused widget. Bare
/// Esc is only claimed while capturing.
pub fn route(key: KeyEvent, capturing: bool) -> KeyDisposition {
    if key.modifiers == KeyModifiers::CONTROL {
        let KeyCode::Char(ch) = key.code else {
            return KeyDisposition::Passthrough;
        };
        return match ch.to_ascii_lowercase() {
            's' if capturing => KeyDisposition::Suppressed,
            's' => KeyDisposition::Run(Command::Start),
            'e' if capturing => KeyDisposition::Run(Command::Stop),
            'e' => KeyDisposition::Suppressed,
            'd' => KeyDisposition::Run(Command::Export),
            'l' => KeyDisposition::Run(Command::Clear),
            'f' => KeyDisposition::Run(Command::ToggleFollow),
            'r' => KeyDisposition::Run(Command::ReloadInterfaces),
            'c' | 'q' => KeyDisposition::Run(Command::Quit),
            _ => KeyDisposition::Passthrough,
        };
    }
    if key.code == KeyCode::Esc && key.modifiers.is_empty() && capturing {
        return KeyDisposition::Run(Command::Stop);
    }
    KeyDisposition::Passthrough
}
