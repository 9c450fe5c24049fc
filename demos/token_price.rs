use amm_price_sdk::{constants::NATIVE_TOKEN_ID, PriceResolver};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    // Token ids to price can be passed as arguments
    let mut tokens: Vec<String> = std::env::args().skip(1).collect();
    if tokens.is_empty() {
        tokens.push(NATIVE_TOKEN_ID.to_string());
        tokens.push("03faf2cb329f2e90d6d23b58d91bbb6c046aa143261cc21f52fbe2824bfcbf04".to_string());
    }

    let resolver = PriceResolver::global().await;

    println!("AMM Price SDK (oracle: {})", resolver.oracle_name());
    println!("==================================");

    for token in &tokens {
        let native = resolver.quote_in_native(token).await;
        let fiat = resolver.quote_in_fiat(token).await;

        let label = if fiat.known { "" } else { "  (unknown)" };
        println!(
            "{:.12}…  {:>14.6} ERG  {:>12.4} fiat{}",
            token, native.value, fiat.value, label
        );
    }

    if let Some(pool) = resolver.find_pair_id(NATIVE_TOKEN_ID, &tokens[tokens.len() - 1]).await {
        match resolver.pool_stats(&pool).await {
            Some(stats) => println!("\nPool {}: {:?}", pool, stats.tvl),
            None => println!("\nPool {}: stats unavailable", pool),
        }
    }

    let health = resolver.health_check().await;
    println!("\nHealth: {:?} - {}", health.status, health.message.unwrap_or_default());

    Ok(())
}
