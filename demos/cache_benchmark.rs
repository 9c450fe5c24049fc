use amm_price_sdk::PriceResolver;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token = "03faf2cb329f2e90d6d23b58d91bbb6c046aa143261cc21f52fbe2824bfcbf04";
    let resolver = PriceResolver::global().await;

    println!("Benchmarking AMM Price SDK (token: {:.12}…)", token);
    println!("-------------------------------------------");

    // 1. Cold lookup: fetches the full market list
    println!("1. Cold lookup (fetches /amm/markets)...");
    let start_api = Instant::now();
    if let Err(e) = resolver.refresh_now().await {
        eprintln!("   Warning: market fetch failed: {}", e);
    }
    let api_latency = start_api.elapsed();

    let price = resolver.get_price_in_native(token).await;
    println!("   Price:  {:.8} ERG", price);
    println!("   API Latency (network + parsing): {:?}", api_latency);
    println!();

    // 2. Warm lookups: served from the snapshot
    println!("2. Warm lookups (served from the cached snapshot)...");
    let iterations = 10_000;
    let mut total = Duration::default();

    for _ in 0..iterations {
        let start = Instant::now();
        let _ = resolver.get_price_in_native(token).await;
        total += start.elapsed();
    }

    println!("   Total iterations: {}", iterations);
    println!("   Average lookup latency: {:?}", total / iterations);

    let metrics = resolver.cache().get_fetch_metrics().await;
    println!(
        "   Fetches: {} (failed: {}), p50={:.1}ms",
        metrics.total_requests, metrics.failed_requests, metrics.latency_p50_ms
    );

    Ok(())
}
