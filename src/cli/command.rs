//! Console input commands

/// What a line of console input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the REPL
    Exit,
    /// Forget the conversation
    Clear,
    /// Send the last answer plus this request to the code agent
    Plot(String),
    /// Ask the SQL agent
    Ask(String),
    /// Blank line
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Command::Exit;
        }
        if line == "/clear" {
            return Command::Clear;
        }
        if let Some(request) = line.strip_prefix("/plot") {
            if request.is_empty() || request.starts_with(char::is_whitespace) {
                return Command::Plot(request.trim().to_string());
            }
        }
        Command::Ask(line.to_string())
    }
}

/// Input for the code agent: the data to plot, then the request
pub fn plot_request(last_answer: &str, request: &str) -> String {
    let request = if request.is_empty() {
        "Plot this data"
    } else {
        request
    };
    format!("{}\n\nData:\n{}", request, last_answer)
}
