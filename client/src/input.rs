//! Parsing of the commands typed at the client prompt

/// A player command read from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Roll,
    Move,
    Reset,
    Ping,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. Returns `None` for blank or unknown input.
    pub fn parse(line: &str) -> Option<Command> {
        let word = line.split_whitespace().next()?.to_ascii_lowercase();
        let command = match word.as_str() {
            "r" | "roll" => Command::Roll,
            "m" | "move" => Command::Move,
            "n" | "new" | "reset" => Command::Reset,
            "p" | "ping" => Command::Ping,
            "s" | "status" => Command::Status,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            _ => return None,
        };
        Some(command)
    }

    pub fn help() -> &'static str {
        "Commands: [r]oll, [m]ove, [n]ew game, [p]ing, [s]tatus, [h]elp, [q]uit"
    }
}
