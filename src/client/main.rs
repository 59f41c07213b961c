/**
 * Ledger Console Client
 *
 * Line-oriented front end for the ledger session. Reads commands from stdin:
 *
 *   + <name> <amount>   add funds
 *   - <name> <amount>   subtract funds
 *   list                show the ledger and running balance
 *   sync                run a sync cycle now
 *   online | offline    simulate a connectivity change
 *   quit
 *
 * Notices from the session are printed as they arrive.
 */
use offline_ledger::client::{LedgerSession, NetworkStatus, Notice, TransactionForm};
use offline_ledger::shared::{AppConfig, Direction};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load()?;
    tracing::info!("Using server {}", config.client.server_url);

    let session = LedgerSession::open(&config.client).await?;
    let listener = session.spawn_network_listener();
    let poller = config
        .client
        .connectivity_poll()
        .map(|every| session.monitor().spawn_poller(session.api(), every));

    let mut notices = session.subscribe_notices();
    let printer = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            match notice {
                Notice::Cleared | Notice::LedgerChanged => {}
                other => println!("! {}", other),
            }
        }
    });

    session.initialize().await?;
    print_ledger(&session).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some(sign @ ("+" | "-")) => {
                let direction = if sign == "+" {
                    Direction::Add
                } else {
                    Direction::Subtract
                };
                let name = parts.next().unwrap_or_default();
                let amount = parts.next().unwrap_or_default();
                match session
                    .submit(TransactionForm::new(name, amount, direction))
                    .await
                {
                    Ok(outcome) => println!("{:?}", outcome),
                    Err(e) => println!("error: {}", e),
                }
            }
            Some("list") => print_ledger(&session).await,
            Some("sync") => match session.sync_now().await {
                Ok(outcome) => println!("{:?}", outcome),
                Err(e) => println!("error: {}", e),
            },
            Some("online") => {
                session.monitor().set_status(NetworkStatus::Online);
            }
            Some("offline") => {
                session.monitor().set_status(NetworkStatus::Offline);
            }
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unknown command: {}", other),
            None => {}
        }
    }

    session.shutdown();
    listener.abort();
    printer.abort();
    if let Some(poller) = poller {
        poller.abort();
    }
    Ok(())
}

async fn print_ledger(session: &LedgerSession) {
    let ledger = session.ledger().await;
    for record in ledger.entries() {
        let marker = if record.pending { " (pending)" } else { "" };
        println!(
            "{:>10}  {:<24} {}{}",
            record.value,
            record.name,
            record.timestamp.format("%-m/%-d/%Y"),
            marker
        );
    }
    println!("Total: {}", ledger.total());
    if let Some(last) = ledger.balance_series().last() {
        println!("Balance as of {}: {}", last.label, last.balance);
    }
}
