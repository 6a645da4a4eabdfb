use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use linklet::models::{CreateUrlResponse, StatsView};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "linklet-admin")]
#[command(about = "Command line client for a running linklet server", long_about = None)]
struct Cli {
    /// Base URL of the server
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shorten a URL
    Create {
        /// Absolute http(s) URL to shorten
        url: String,
        /// Validity in minutes (server default when omitted)
        #[arg(long)]
        validity: Option<f64>,
        /// Custom short code (3-20 alphanumeric characters)
        #[arg(long)]
        shortcode: Option<String>,
    },
    /// Show click statistics for a short code
    Stats {
        shortcode: String,
    },
}

/// Turn a non-2xx response into an error carrying the server's message
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| "no error message".to_string());
    bail!("{}: {}", status, message)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/');
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Create {
            url,
            validity,
            shortcode,
        } => {
            let mut body = json!({ "url": url });
            if let Some(validity) = validity {
                body["validity"] = json!(validity);
            }
            if let Some(shortcode) = shortcode {
                body["shortcode"] = json!(shortcode);
            }

            let response = client
                .post(format!("{server}/shorturls"))
                .json(&body)
                .send()
                .await
                .with_context(|| format!("Failed to reach {server}"))?;
            let created: CreateUrlResponse = check(response).await?.json().await?;

            println!("✅ Short link: {}", created.short_link);
            println!("   Expires:    {}", created.expiry.to_rfc3339());
        }
        Commands::Stats { shortcode } => {
            let response = client
                .get(format!("{server}/shorturls/{shortcode}"))
                .send()
                .await
                .with_context(|| format!("Failed to reach {server}"))?;
            let stats: StatsView = check(response).await?.json().await?;

            println!("{} -> {}", stats.shortcode, stats.original_url);
            println!("  Created: {}", stats.created_at.to_rfc3339());
            println!("  Expires: {}", stats.expiry.to_rfc3339());
            println!("  Clicks:  {}", stats.total_clicks);
            if !stats.click_details.is_empty() {
                println!("{:<32} {:<24} {:<32} Source", "Timestamp", "Location", "Referrer");
                for click in &stats.click_details {
                    println!(
                        "{:<32} {:<24} {:<32} {}",
                        click.timestamp.to_rfc3339(),
                        click.location,
                        click.referrer,
                        click.source
                    );
                }
            }
        }
    }

    Ok(())
}
