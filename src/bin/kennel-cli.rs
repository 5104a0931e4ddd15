use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use kennel_api::{ApiClient, ApiConfig, ApiResponse, UploadFile, DEFAULT_API_ROOT};
use serde_json::Value;

use kennel_bridge::observability::logging;

#[derive(Parser)]
#[command(name = "kennel-cli")]
#[command(about = "Call the kennel backend API through the access layer", long_about = None)]
struct Cli {
    /// Origin serving the API (the dev proxy by default).
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Path prefix the API lives under.
    #[arg(long, default_value = DEFAULT_API_ROOT)]
    api_root: String,

    /// Whole-request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized path for a resource
    Url { path: String },
    /// GET a resource
    Get {
        path: String,
        /// Query parameter as key=value, repeatable
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// POST a JSON body
    Post {
        path: String,
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// PUT a JSON body
    Put {
        path: String,
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// DELETE a resource
    Delete { path: String },
    /// Upload a file
    Upload {
        file: PathBuf,
        /// Upload discriminator, e.g. image or document
        #[arg(short = 't', long = "type", default_value = "image")]
        kind: String,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn parse_body(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("--data is not valid JSON: {}", e))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    logging::init_logging("warn");
    let cli = Cli::parse();

    let client = ApiClient::with_config(ApiConfig {
        base_url: cli.url,
        api_root: cli.api_root,
        timeout: cli.timeout.map(Duration::from_secs),
    })?;

    let response = match cli.command {
        Commands::Url { path } => {
            println!("{}", client.format_api_url(&path));
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Get { path, params } => {
            if params.is_empty() {
                client.get(&path).await
            } else {
                client.get_with_params(&path, &params).await
            }
        }
        Commands::Post { path, data } => client.post(&path, &parse_body(&data)?).await,
        Commands::Put { path, data } => client.put(&path, &parse_body(&data)?).await,
        Commands::Delete { path } => client.delete(&path).await,
        Commands::Upload { file, kind } => {
            let file = UploadFile::from_path(&file).await?;
            client.upload(file, &kind).await
        }
    };

    print_response(&response)
}

fn print_response(response: &ApiResponse) -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(response)?);
    if response.ok {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
