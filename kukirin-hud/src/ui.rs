use colored::{ColoredString, Colorize};
use kukirin::Mode;
use std::io::{self, Write};

const PREFIX: &str = "MODE: ";
/// Enough to overwrite the longest mode name with the shortest.
const PADDING: &str = "            ";

/// The terminal display: a single line showing the current riding mode, rewritten in place, plus
/// dimmed status messages.
#[derive(Debug)]
pub struct Hud {
    eco_line: String,
    sport_line: String,
    race_line: String,
}

impl Hud {
    /// Builds all the mode lines up front so that showing a mode change doesn't need to format
    /// anything.
    ///
    /// If `colour` is false, colours are turned off for the whole process. Otherwise they are used
    /// when stdout is a terminal.
    pub fn new(colour: bool) -> Self {
        if !colour {
            colored::control::set_override(false);
        }
        let line = |name: ColoredString| format!("\r{PREFIX}{name}{PADDING}");
        Self {
            eco_line: line(Mode::Eco.as_str().green().bold()),
            sport_line: line(Mode::Sport.as_str().blue().bold()),
            race_line: line(Mode::Race.as_str().red().bold()),
        }
    }

    /// Returns the line for the given mode, or `None` if it is not one which can be displayed.
    pub fn mode_line(&self, mode: Mode) -> Option<&str> {
        match mode {
            Mode::Eco => Some(self.eco_line.as_str()),
            Mode::Sport => Some(self.sport_line.as_str()),
            Mode::Race => Some(self.race_line.as_str()),
            Mode::Unknown(_) => None,
        }
    }

    /// Replaces the mode line on stdout.
    pub fn show_mode(&self, mode: Mode) -> io::Result<()> {
        self.write_mode(&mut io::stdout().lock(), mode)
    }

    fn write_mode(&self, out: &mut impl Write, mode: Mode) -> io::Result<()> {
        if let Some(line) = self.mode_line(mode) {
            out.write_all(line.as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }

    /// Prints a timestamped status message on its own line.
    pub fn status(&self, message: &str) {
        println!("{}", dim(&format!("[{}] {}", now_local(), message)));
    }

    /// Ends the mode line, so that following output starts on a new line.
    pub fn finish(&self) {
        println!();
    }
}

fn dim(s: &str) -> ColoredString {
    s.bright_black()
}

fn now_local() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

// Colouring is a process-wide switch, so these tests all run with it off to avoid racing each
// other.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines() {
        let hud = Hud::new(false);
        assert_eq!(hud.mode_line(Mode::Eco), Some("\rMODE: ECO            "));
        assert_eq!(hud.mode_line(Mode::Sport), Some("\rMODE: SPORT            "));
        assert_eq!(hud.mode_line(Mode::Race), Some("\rMODE: RACE            "));
    }

    #[test]
    fn unknown_not_shown() {
        let hud = Hud::new(false);
        assert_eq!(hud.mode_line(Mode::Unknown(0x09)), None);

        let mut out = Vec::new();
        hud.write_mode(&mut out, Mode::Unknown(0x09)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn write_mode() {
        let hud = Hud::new(false);
        let mut out = Vec::new();
        hud.write_mode(&mut out, Mode::Eco).unwrap();
        hud.write_mode(&mut out, Mode::Sport).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\rMODE: ECO            \rMODE: SPORT            "
        );
    }

    #[test]
    fn dim_plain() {
        Hud::new(false);
        assert_eq!(dim("hi").to_string(), "hi");
    }
}
