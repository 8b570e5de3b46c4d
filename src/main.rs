use anyhow::Result;
use sqlchat_agent::cli::{plot_request, Command, Console};
use sqlchat_agent::logging;
use sqlchat_agent::prompt::extract_code_block;
use sqlchat_agent::{AgentFactory, AgentSettings, ConnectionConfig, Secrets};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging system
    let _log_guard = logging::init_logging()?;

    tracing::info!("=== SQL Chat Agent Starting ===");

    // Create console for terminal I/O
    let console = Console::new();

    // Configuration is read and validated before anything is opened
    let secrets = Secrets::from_env()?;
    let settings = AgentSettings::from_env()?;
    let config = ConnectionConfig::from_env()?;

    let code_model = settings.model.clone();
    let database = config.database().to_string();
    let factory = AgentFactory::live(secrets, settings);

    let mut sql_agent = factory.create_sql_agent(&config).await?;
    let mut code_agent = match factory.create_code_agent(&code_model).await {
        Ok(agent) => agent,
        Err(e) => {
            sql_agent.close().await;
            return Err(e.into());
        }
    };

    console.print_banner(&database, sql_agent.session_id());

    let mut last_answer: Option<String> = None;

    loop {
        let line = match console.read_input() {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                console.print_error(&format!("Failed to read input: {}", e));
                break;
            }
        };

        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Exit => break,
            Command::Clear => match sql_agent.clear_memory().await {
                Ok(()) => {
                    last_answer = None;
                    console.print_system("Conversation cleared");
                }
                Err(e) => console.print_error(&e.to_string()),
            },
            Command::Plot(request) => {
                let Some(data) = last_answer.as_deref() else {
                    console.print_system("Ask a question first: /plot works on the last answer");
                    continue;
                };
                match code_agent.invoke(&plot_request(data, &request)).await {
                    Ok(answer) => {
                        console.print_code(extract_code_block(&answer).unwrap_or(answer.as_str()))
                    }
                    Err(e) => {
                        tracing::error!("Code agent failed: {}", e);
                        console.print_error(&e.to_string());
                    }
                }
            }
            Command::Ask(question) => match sql_agent.invoke(&question).await {
                Ok(answer) => {
                    console.print_answer(&answer);
                    last_answer = Some(answer);
                }
                Err(e) => {
                    tracing::error!("SQL agent failed: {}", e);
                    console.print_error(&e.to_string());
                }
            },
        }

        console.print_separator();
    }

    code_agent.close().await;
    sql_agent.close().await;

    tracing::info!("=== SQL Chat Agent Shutting Down ===");

    Ok(())
}
