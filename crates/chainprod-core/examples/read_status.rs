//! Example: Reading the Chain Controller Status
//!
//! This example connects to a printer host, fetches the chain production
//! controller status once and prints the labels a UI would show.
//!
//! Run with: `cargo run --example read_status -- <HOST_URL> [API_KEY]`

use std::env;

use chainprod_core::{ChainClient, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let url = if args.len() > 1 {
        &args[1]
    } else {
        eprintln!("Usage: {} <HOST_URL> [API_KEY]", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} http://octopi.local ABCDEF0123", args[0]);
        std::process::exit(1);
    };

    let config = ClientConfig::builder(url.as_str())
        .maybe_api_key(args.get(2).cloned())
        .build();
    let client = ChainClient::new(config)?;

    println!("Fetching status from {}...", url);
    client.start().await?;

    let status = client.status();
    let view = client.view();

    println!();
    println!("Chain Controller:");
    println!("  Serial link:  {}", if status.is_connected() { "open" } else { "closed" });
    println!("  Chain:        {}", view.eject);
    println!("  Fans:         {}", view.fan);
    println!("  LEDs:         {}", view.led);
    println!("  Cooling:      {}", view.cooling_time);
    println!("  Can eject:    {}", if view.eject_enabled { "yes" } else { "no" });

    Ok(())
}
