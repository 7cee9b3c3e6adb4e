//! Parsing of interactive `play` input.

/// Outcome of parsing one line typed during a round.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// One or two board positions, converted to 0-based indices
    Flip(Vec<usize>),
    /// `r` or `reset`: drop the round and collect names again
    Reset,
    /// `q` or `quit`
    Quit,
    /// Invalid input with error message
    Invalid(String),
}

/// Parses a line of play input.
///
/// Positions are typed 1-based as shown on the board, either one at a time
/// (`3`) or as a pair (`3 7`, `3,7`). `card_count` bounds the accepted range.
///
/// ```rust
/// # use memora_cli::validation::{parse_play_input, ParseResult};
/// assert_eq!(parse_play_input("3 7", 16), ParseResult::Flip(vec![2, 6]));
/// assert_eq!(parse_play_input("Q", 16), ParseResult::Quit);
/// assert_eq!(parse_play_input("reset", 16), ParseResult::Reset);
/// assert!(matches!(parse_play_input("17", 16), ParseResult::Invalid(_)));
/// ```
pub fn parse_play_input(input: &str, card_count: usize) -> ParseResult {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "" => return ParseResult::Invalid("Empty input".to_string()),
        "q" | "quit" => return ParseResult::Quit,
        "r" | "reset" => return ParseResult::Reset,
        _ => {}
    }

    let parts: Vec<&str> = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() > 2 {
        return ParseResult::Invalid("Enter at most two positions".to_string());
    }

    let mut positions = Vec::with_capacity(parts.len());
    for part in parts {
        let n: usize = match part.parse() {
            Ok(n) => n,
            Err(_) => return ParseResult::Invalid(format!("Unrecognized input: {}", part)),
        };
        if n == 0 || n > card_count {
            return ParseResult::Invalid(format!(
                "Position {} is out of range (1-{})",
                n, card_count
            ));
        }
        positions.push(n - 1);
    }
    ParseResult::Flip(positions)
}
