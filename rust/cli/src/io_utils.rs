//! Line-oriented input helpers for interactive commands.

use std::io::BufRead;

/// Reads one line from `stdin`, trimmed.
///
/// Returns `Ok(None)` at end of input. Read errors propagate; an interrupted
/// read surfaces as [`std::io::ErrorKind::Interrupted`].
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// # use memora_cli::io_utils::read_stdin_line;
///
/// let mut input = Cursor::new("  3 7 \n");
/// assert_eq!(read_stdin_line(&mut input).unwrap().as_deref(), Some("3 7"));
/// assert_eq!(read_stdin_line(&mut input).unwrap(), None);
/// ```
pub fn read_stdin_line(stdin: &mut dyn BufRead) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    match stdin.read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line.trim().to_string())),
    }
}
