use std::sync::Arc;

use gatehouse::prelude::*;

// ---------------------------------------------------------------------------
// Usage: login-demo [config.json]
//
// Without a config, records go to a scratch directory under the system
// temp dir and tokens are signed with GATEHOUSE_SECRET (or a fixed demo
// secret). Set RUST_LOG=debug to watch the actors.
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    gatehouse::init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => GatehouseConfig::from_json_file(path).await?,
        None => GatehouseConfig {
            store_path: Some(std::env::temp_dir().join("gatehouse-demo")),
            issuer: IssuerConfig {
                secret: std::env::var("GATEHOUSE_SECRET")
                    .unwrap_or_else(|_| "gatehouse-demo-secret".into()),
                ..IssuerConfig::default()
            },
            ..GatehouseConfig::default()
        },
    };
    let gatehouse = Arc::new(GatehouseBuilder::from_config(config).build().await?);

    // First contact registers, the second login verifies.
    let alice = Username::new("alice");
    for attempt in ["secret1", "secret1", "wrong"] {
        match gatehouse.login(&alice, attempt).await {
            Ok(session) => println!("alice/{attempt}: ok, {}-byte token", session.token.len()),
            Err(IdentityError::InvalidCredential) => {
                println!("alice/{attempt}: rejected")
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Racing logins for a fresh name: one registers, the rest verify.
    let bob = Username::new("bob");
    let racers: Vec<_> = (0..4)
        .map(|_| {
            let gatehouse = Arc::clone(&gatehouse);
            let bob = bob.clone();
            tokio::spawn(async move { gatehouse.login(&bob, "hunter2").await })
        })
        .collect();
    for racer in racers {
        let session = racer.await??;
        println!("bob: ok, {}-byte token", session.token.len());
    }

    let record = gatehouse.snapshot(&bob).await?;
    println!(
        "bob registered={} state={}",
        record.exists,
        gatehouse.state(&bob).await
    );

    let stopped = gatehouse.shutdown_all().await;
    tracing::info!(stopped, "demo finished");
    Ok(())
}
