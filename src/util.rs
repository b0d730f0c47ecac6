use crossterm::style::Stylize;
use std::io::{self, Write};

/// Prints a prompt and reads one trimmed line from stdin. `None` on EOF.
pub fn input(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Colors a string for terminal display. Unknown color names pass through.
pub fn format_str(text: String, color: &str) -> String {
    match color {
        "red" => text.red().to_string(),
        "green" => text.green().to_string(),
        "grey" => text.dark_grey().to_string(),
        _ => text,
    }
}
