//! Interactive chat loop over a connected MCP session.

use crate::agent::{Agent, ChatBackend};
use crate::cli::Output;
use crate::error::Result;
use crate::mcp::McpSession;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::info;

/// Read queries from stdin and answer them until the user quits.
///
/// Per-query errors are printed and the loop continues; only the caller's
/// teardown runs when this returns.
pub async fn run_chat<B: ChatBackend>(agent: &Agent<B>, session: &mut McpSession) -> Result<()> {
    println!("\n{}", style("Tether").bold().cyan());
    println!(
        "{}",
        style("Connected to MCP server with tools:").dim()
    );
    for tool in session.tools() {
        Output::list_item(&tool.name);
    }
    println!(
        "\n{}\n",
        style("Type your query, or 'quit' to exit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("Query:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF on stdin ends the session like an explicit quit.
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            Output::info("Goodbye!");
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let result = agent.process_query(session, input).await;
        spinner.finish_and_clear();

        match result {
            Ok(outcome) => {
                info!("Query answered in {} model turns", outcome.turns);
                if outcome.answer.is_empty() {
                    Output::warning("Model returned an empty answer.");
                } else {
                    println!("\n{}\n", outcome.answer);
                }
            }
            Err(e) => {
                Output::error(&format!("Query failed: {}", e));
            }
        }
    }

    Ok(())
}
