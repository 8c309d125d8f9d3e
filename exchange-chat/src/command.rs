//! Classification of inbound chat messages.

pub const GREETING_REPLY: &str = "Welcome to the dangerous road!";

const GREETINGS: &[&str] = &["Hello server", "Hello all"];
const EXCHANGE_KEYWORD: &str = "exchange";

/// What the router should do with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    /// `exchange <d>` with a single decimal digit, or bare `exchange` for one day.
    Exchange { days: u8 },
    /// One of the fixed greetings.
    Greeting,
    /// Anything else is relayed as-is.
    Echo,
}

impl ChatCommand {
    pub fn parse(message: &str) -> Self {
        if let Some(days) = parse_exchange(message) {
            return ChatCommand::Exchange { days };
        }
        if GREETINGS.contains(&message) {
            return ChatCommand::Greeting;
        }
        ChatCommand::Echo
    }
}

fn parse_exchange(message: &str) -> Option<u8> {
    let rest = message.strip_prefix(EXCHANGE_KEYWORD)?;
    if rest.is_empty() {
        return Some(1);
    }

    let digits = rest.strip_prefix(' ')?;
    match digits.as_bytes() {
        [digit] if digit.is_ascii_digit() => Some(digit - b'0'),
        _ => None,
    }
}
