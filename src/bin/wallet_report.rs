//! Wallet Report Binary - Activity Summary and Engagement Score
//!
//! Fetches one address's recent activity from a Blockscout-compatible
//! explorer, aggregates it, and prints the summary, score, and paginated
//! transfer views.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin wallet_report -- 0xYourAddress [--days 30] [--page 1] [--page-size 10]
//! ```
//!
//! ## Environment Variables
//!
//! - EXPLORER_API_URL - Blockscout API base (default: https://base.blockscout.com/api)
//! - PRICE_API_URL - Spot price endpoint (default: CoinGecko base-eth/usd)
//! - LOOKBACK_DAYS - Aggregation window in days (default: 30, overridden by --days)
//! - EXPLORER_PAGE_SIZE / EXPLORER_MAX_PAGES / EXPLORER_MAX_RETRIES - Feed paging knobs
//! - SCORE_*_TARGET / SCORE_*_WEIGHT - Score normalization overrides
//! - RUST_LOG - Logging level (optional, default: info)

use walletflow::config::Config;
use walletflow::engine::{CycleConfig, Session};
use walletflow::engine_core::classifier::{Classifier, Direction, KnownContracts, MemoryLabelCache};
use walletflow::explorer_core::client::ExplorerClient;
use walletflow::explorer_core::price::PriceClient;
use std::env;

struct Args {
    address: String,
    days: Option<u32>,
    page: usize,
    page_size: usize,
}

fn parse_args() -> Result<Args, String> {
    let argv: Vec<String> = env::args().skip(1).collect();
    let mut address = None;
    let mut days = None;
    let mut page = 1usize;
    let mut page_size = 10usize;

    let mut i = 0;
    while i < argv.len() {
        match argv[i].as_str() {
            "--days" => {
                days = Some(
                    argv.get(i + 1)
                        .and_then(|s| s.parse().ok())
                        .ok_or("--days requires a number")?,
                );
                i += 2;
            }
            "--page" => {
                page = argv
                    .get(i + 1)
                    .and_then(|s| s.parse().ok())
                    .ok_or("--page requires a number")?;
                i += 2;
            }
            "--page-size" => {
                page_size = argv
                    .get(i + 1)
                    .and_then(|s| s.parse().ok())
                    .ok_or("--page-size requires a number")?;
                i += 2;
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown flag: {}", other));
            }
            other => {
                address = Some(other.to_string());
                i += 1;
            }
        }
    }

    Ok(Args {
        address: address.ok_or("usage: wallet_report <0xADDRESS> [--days N] [--page N] [--page-size N]")?,
        days,
        page,
        page_size,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    // NOTE: Workaround for rustls issue
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Can't set crypto provider to aws_lc_rs");

    let args = parse_args().map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;
    let mut config = Config::from_env()?;
    if let Some(days) = args.days {
        config.lookback_days = days.clamp(1, 365);
    }

    log::info!("🚀 Starting wallet report");
    log::info!("   Explorer: {}", config.explorer_url);
    log::info!("   Lookback: {} days", config.lookback_days);

    let explorer = ExplorerClient::new(
        &config.explorer_url,
        config.page_size,
        config.max_pages,
        config.max_retries,
    );
    let price = PriceClient::new(
        &config.price_url,
        &config.price_coin_id,
        &config.price_vs_currency,
    );
    let contracts = KnownContracts::base_defaults();
    let cycle_config = CycleConfig::from(&config);

    let session = Session::new();
    let report = match session
        .check(&explorer, &price, &contracts, &cycle_config, &args.address)
        .await?
    {
        Some(report) => report,
        None => {
            // Single-shot binary: only reachable if a concurrent caller
            // restarted the session, which this CLI never does.
            log::error!("cycle superseded before commit");
            return Ok(());
        }
    };

    let summary = &report.summary;
    let fmt_usd = |v: Option<f64>| match v {
        Some(usd) => format!("${:.2}", usd),
        None => "unavailable".to_string(),
    };

    println!("== Wallet report for {} ==", report.address);
    println!(
        "Window: last {} days (since {})",
        report.lookback_days,
        chrono::DateTime::from_timestamp(report.since, 0)
            .map(|d| d.to_rfc3339())
            .unwrap_or_default()
    );
    println!();
    println!("Engagement score (estimate): {}/100", report.score);
    println!(
        "Total txs: {} | Native: {} | Token: {} | NFT: {}",
        summary.native_tx_count + summary.token_transfer_count,
        summary.native_tx_count,
        summary.token_transfer_count,
        summary.nft_transfer_count
    );
    println!(
        "Native volume: {:.6} in / {:.6} out / {:.6} total ({})",
        summary.native_inflow,
        summary.native_outflow,
        summary.native_total,
        fmt_usd(report.native_volume_display())
    );
    println!("Fees paid: {:.6} native", summary.fee_spent_native);
    println!(
        "Unique peers: {} | Active days: {} | Contracts deployed: {}",
        summary.unique_peer_count, summary.distinct_active_days, summary.contracts_deployed
    );
    println!(
        "Bridged inflow: {:.6} native, {} token(s)",
        summary.bridged_native_inflow,
        summary.bridged_token_inflows.len()
    );
    println!(
        "Balance: {}",
        report
            .balance_native
            .map(|b| format!("{:.6} native", b))
            .unwrap_or_else(|| "unavailable".to_string())
    );
    if report.dropped_records > 0 {
        println!("({} malformed records dropped)", report.dropped_records);
    }

    println!();
    println!("Suggested criteria:");
    for criterion in &report.criteria {
        println!(
            "  [{}] {}",
            if criterion.pass { "x" } else { " " },
            criterion.label
        );
    }

    let classifier = Classifier::new(&report.address, &contracts);
    let labels = MemoryLabelCache::new();

    let native_page = report.native_page(args.page, args.page_size);
    println!();
    println!(
        "Native transfers (page {}/{}, {} total):",
        native_page.effective_page, native_page.total_pages, native_page.total_count
    );
    for rec in native_page.items {
        let dir = match rec.direction {
            Direction::Inbound => "IN ",
            Direction::Outbound => "OUT",
        };
        let peer = match rec.direction {
            Direction::Inbound => rec.record.from.clone(),
            Direction::Outbound => rec
                .record
                .to
                .clone()
                .unwrap_or_else(|| "(contract creation)".to_string()),
        };
        let badge = classifier
            .label_for(&peer, &labels)
            .map(|l| format!(" [{}]", l))
            .unwrap_or_default();
        println!(
            "  {} {} {:.6} {} {}{}",
            chrono::DateTime::from_timestamp(rec.record.timestamp, 0)
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            dir,
            rec.record.display_amount,
            &rec.record.hash[..rec.record.hash.len().min(12)],
            peer,
            badge
        );
    }

    let token_page = report.token_page(args.page, args.page_size);
    println!();
    println!(
        "Token ledgers (page {}/{}, {} total):",
        token_page.effective_page, token_page.total_pages, token_page.total_count
    );
    for ledger in token_page.items {
        println!(
            "  {} ({}) in {:.4} / out {:.4} / total {:.4} over {} transfers [{}]",
            ledger.symbol, ledger.name, ledger.inflow, ledger.outflow, ledger.total,
            ledger.transfer_count, ledger.contract
        );
    }

    Ok(())
}
