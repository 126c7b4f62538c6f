use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde_json::Value;
use shared::{
    domain::ViewKind,
    error::ApiError,
    protocol::{ControllerEvent, ViewChange},
};

#[derive(Parser, Debug)]
#[command(name = "viewctl", about = "Operator commands for the view controller")]
struct Cli {
    #[arg(long, env = "VIEWCTL_CONTROLLER_URL", default_value = "http://127.0.0.1:8000")]
    controller_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push a view to every connected display.
    Switch {
        view: ViewKind,
        /// JSON object with the view's payload.
        #[arg(long)]
        data: Option<String>,
    },
    /// Print the view the controller is currently showing.
    Current,
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let base = cli.controller_url.trim_end_matches('/');
    let client = Client::new();

    match cli.command {
        Command::Switch { view, data } => {
            let data = match data {
                Some(raw) => serde_json::from_str::<Value>(&raw)
                    .with_context(|| format!("--data is not valid JSON: {raw}"))?,
                None => Value::Object(Default::default()),
            };
            let change = ViewChange::new(view.as_str(), data);
            // Catch payload mistakes before they reach the controller.
            change.to_state()?;

            let response = client
                .post(format!("{base}/views"))
                .json(&change)
                .send()
                .await
                .context("controller unreachable")?;
            print_event(response).await?;
        }
        Command::Current => {
            let response = client
                .get(format!("{base}/views/current"))
                .send()
                .await
                .context("controller unreachable")?;
            print_event(response).await?;
        }
        Command::Health => {
            let response = client
                .get(format!("{base}/health"))
                .send()
                .await
                .context("controller unreachable")?;
            let status = response.status();
            let body: Value = response.json().await?;
            if !status.is_success() {
                bail!("controller unhealthy ({status}): {body}");
            }
            println!("{body}");
        }
    }

    Ok(())
}

async fn print_event(response: Response) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ApiError>(&text) {
            Ok(error) => bail!("controller rejected request ({status}): {}", error.message),
            Err(_) => bail!("controller rejected request ({status}): {text}"),
        }
    }

    match response.json::<ControllerEvent>().await? {
        ControllerEvent::ViewChange(change) => {
            println!("view={} data={}", change.view, change.data);
        }
        ControllerEvent::Error(error) => bail!("controller error: {}", error.message),
    }
    Ok(())
}
