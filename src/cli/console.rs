use colored::*;
use std::io::{self, Write};

/// Console handles all terminal I/O with colored formatting
pub struct Console {
    user_color: Color,
    answer_color: Color,
    code_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            user_color: Color::Cyan,
            answer_color: Color::Green,
            code_color: Color::Magenta,
        }
    }

    /// Print an answer from the SQL agent
    pub fn print_answer(&self, message: &str) {
        println!(
            "{} {}",
            "Answer:".color(self.answer_color).bold(),
            message.color(self.answer_color)
        );
    }

    /// Print an answer from the code agent
    pub fn print_code(&self, message: &str) {
        println!("{}", "Code:".color(self.code_color).bold());
        println!("{}", message.color(self.code_color));
    }

    /// Print a system message (errors, info, etc.)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Read a line of input from the user; `None` at end of input
    pub fn read_input(&self) -> io::Result<Option<String>> {
        print!("{} ", ">".color(self.user_color).bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }

    /// Print a welcome banner
    pub fn print_banner(&self, database: &str, session_id: &str) {
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "  SQL Chat Agent".bright_blue().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!();
        println!("Connected to {} (session {})", database, session_id);
        println!("Ask a question about the data and press Enter.");
        println!("  /plot <request>  turn the last answer into plotly code");
        println!("  /clear           forget the conversation");
        println!("  exit | quit      end the session");
        println!();
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(60).bright_black());
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
