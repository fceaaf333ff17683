use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the token gateway", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Token name, symbol and supply
    Details,
    /// Balance of an address
    Balance { address: String },
    /// Send tokens with an attached message
    Transfer {
        to: String,
        /// Decimal token amount, e.g. "1.5"
        amount: String,
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// Transfer history and running balance of an address
    History {
        address: String,
        #[arg(long)]
        to_block: Option<u64>,
    },
    /// Transfer carried by a transaction
    Lookup { tx_hash: String },
    /// Wait for a transaction to be confirmed
    Confirm {
        tx_hash: String,
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let request_id = Uuid::new_v4().to_string();
    let mut headers = HeaderMap::new();
    headers.insert("x-request-id", HeaderValue::from_str(&request_id)?);

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Details => client.get(format!("{}/tokendetails", base)),
        Commands::Balance { address } => client.get(format!("{}/balance/{}", base, address)),
        Commands::Transfer {
            to,
            amount,
            message,
        } => client
            .post(format!("{}/transferWithDetails", base))
            .json(&json!({ "to": to, "amount": amount, "message": message })),
        Commands::History { address, to_block } => {
            let mut req = client.get(format!("{}/accounts/{}/history", base, address));
            if let Some(block) = to_block {
                req = req.query(&[("toBlock", block)]);
            }
            req
        }
        Commands::Lookup { tx_hash } => {
            client.get(format!("{}/getTransactionDetails/{}", base, tx_hash))
        }
        Commands::Confirm {
            tx_hash,
            timeout_secs,
        } => client
            .get(format!("{}/transactions/{}/confirmation", base, tx_hash))
            .query(&[("timeoutSecs", timeout_secs)]),
    };

    let res = request.headers(headers).send().await?;
    print_response(res, &request_id).await
}

async fn print_response(
    res: reqwest::Response,
    request_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {} (request {})", status, request_id);
        match res.json::<Value>().await {
            Ok(body) => {
                let kind = body["error"]["kind"].as_str().unwrap_or("UNKNOWN");
                let message = body["error"]["message"].as_str().unwrap_or("");
                eprintln!("{}: {}", kind, message);
            }
            Err(_) => eprintln!("Response body was not JSON"),
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
