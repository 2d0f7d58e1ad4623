//! Run the digest pipeline once from the command line and print the outcome as JSON.
//! Exit code is non-zero when the run fails hard.

use std::process::ExitCode;

use tech_news_digest::{init_tracing, AgentConfig, NewsAgent};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match AgentConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {e}");
            return ExitCode::from(2);
        }
    };
    let agent = match NewsAgent::from_config(&cfg) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("setup error: {e:#}");
            return ExitCode::from(2);
        }
    };

    match agent.execute().await {
        Ok(outcome) => {
            match serde_json::to_string(&outcome) {
                Ok(s) => println!("{s}"),
                Err(_) => println!("{outcome:?}"),
            }
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("run failed: {failure} (alert sent: {})", failure.notified);
            ExitCode::FAILURE
        }
    }
}
