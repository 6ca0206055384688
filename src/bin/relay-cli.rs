use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for the Tableau workbook relay", long_about = None)]
struct Cli {
    /// Base URL of a running relay.
    #[arg(short, long, default_value = "http://localhost:4000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Login {
    /// Tableau host, without scheme (e.g. 10ax.online.tableau.com).
    #[arg(short, long)]
    instance: String,

    #[arg(short = 'U', long)]
    username: String,

    #[arg(short = 'P', long)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects with their workbooks
    Projects(Login),
    /// Download workbooks into a zip archive
    Download {
        #[command(flatten)]
        login: Login,

        /// JSON file holding the project tree to download (as printed by
        /// `projects`). Every listed workbook is downloaded when omitted.
        #[arg(short, long)]
        selection: Option<PathBuf>,

        /// Where to write the archive.
        #[arg(short, long, default_value = "workbooks.zip")]
        output: PathBuf,
    },
    /// Forward a JSON payload to the text-generation endpoint
    Generate {
        /// JSON file holding the payload.
        payload: PathBuf,
    },
}

fn login_body(login: &Login) -> Value {
    json!({
        "username": login.username,
        "password": login.password,
        "instance": login.instance,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Projects(login) => {
            let res = client
                .post(format!("{}/api/tableau/projects", cli.url))
                .json(&login_body(&login))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Download { login, selection, output } => {
            let projects: Value = match selection {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => {
                    let res = client
                        .post(format!("{}/api/tableau/projects", cli.url))
                        .json(&login_body(&login))
                        .send()
                        .await?;
                    if !res.status().is_success() {
                        return print_response(res).await;
                    }
                    res.json().await?
                }
            };

            let mut body = login_body(&login);
            body["projects"] = projects;

            let res = client
                .post(format!("{}/api/tableau/downloadWorkbooks", cli.url))
                .json(&body)
                .send()
                .await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }

            let included = header_count(&res, "x-workbooks-included");
            let failed = header_count(&res, "x-workbooks-failed");
            let bytes = res.bytes().await?;
            std::fs::write(&output, &bytes)?;
            println!(
                "Wrote {} ({} bytes): {} workbook(s) included, {} failed",
                output.display(),
                bytes.len(),
                included,
                failed
            );
        }
        Commands::Generate { payload } => {
            let payload: Value = serde_json::from_str(&std::fs::read_to_string(payload)?)?;
            let res = client
                .post(format!("{}/api/tableau/aiGenerate", cli.url))
                .json(&payload)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn header_count(res: &reqwest::Response, name: &str) -> String {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("?")
        .to_string()
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
