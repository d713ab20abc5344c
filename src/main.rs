//! Proof-of-Knowledge Economy Demo
//!
//! Runs one end-to-end scenario against a shared economy service:
//! students mine tokens by answering challenges, then transfer, stake and
//! receive UBI. Configuration comes from `POK_*` environment variables.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pok_economy::{
    ledger::Address,
    policy::MarketConditions,
    EconomyConfig, EconomyService, UbiPeriod, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EconomyConfig::from_env().context("invalid POK_* configuration")?;

    info!("PoK Economy v{}", VERSION);
    info!(
        "Max supply: {}, base reward: {}, threshold: {}, schedule: {:?}",
        config.max_supply, config.base_reward, config.proof_threshold, config.reward_schedule
    );

    let service = EconomyService::new(config);
    demo_economy(&service).await
}

/// Demo scenario exercising every ledger path.
async fn demo_economy(service: &EconomyService) -> anyhow::Result<()> {
    info!("=== Mining Knowledge ===");

    let alice = service.create_wallet("alice").await.address;
    let bob = service.create_wallet("bob").await.address;

    for (student, address, subject, level) in [
        ("alice", alice, "javascript", 3),
        ("bob", bob, "mathematics", 1),
        ("alice", alice, "rust", 5),
    ] {
        let challenge = service.generate_challenge(student, subject).await;
        let answers: Vec<String> = challenge
            .questions
            .iter()
            .map(|q| format!("I believe it is {}", q.expected_answer))
            .collect();

        let rewarded = service
            .mine_and_reward(&challenge, &answers, level, &address)
            .await
            .with_context(|| format!("{} failed to mine {}", student, subject))?;
        info!(
            "{} mined {} tokens on {} (fingerprint {})",
            student,
            rewarded.outcome.minted,
            subject,
            &rewarded.record.fingerprint_hex()[..16]
        );
    }

    // A weak attempt is rejected without touching supply
    let challenge = service.generate_challenge("bob", "python").await;
    if let Err(err) = service.mine_and_reward(&challenge, &["def"], 0, &bob).await {
        info!("bob's weak attempt rejected: {}", err);
    }

    info!("=== Moving Tokens ===");
    let moved = service.transfer(&alice, &bob, 5).await?;
    info!("alice -> bob 5: balances {} / {}", moved.from, moved.to);

    let staked = service.stake(&bob, 10).await?;
    info!("bob staked 10: staked {}, balance {}", staked.staked, staked.balance);

    let yield_paid = service.pay_staking_reward(&bob, 365).await?;
    info!("bob's annual staking yield: {}", yield_paid);

    let ubi = service.distribute_ubi(&[alice, bob], UbiPeriod::Monthly).await?;
    info!("UBI: {} each to {} wallets", ubi.per_user, ubi.recipients);

    let rate = service
        .adjust_inflation(MarketConditions { demand: 120, supply: 100 })
        .await;
    info!("Inflation adjusted to {}", rate);

    info!("=== Results ===");
    report_wallet(service, "alice", &alice).await;
    report_wallet(service, "bob", &bob).await;

    let stats = service.supply_stats().await;
    info!(
        "Supply: {} / {} ({} issued), {} staked",
        stats.current, stats.max, stats.issued_share, stats.total_staked
    );
    info!("Transaction root: {}", hex::encode(service.transaction_root().await));

    service.audit().await.context("ledger audit failed")?;
    info!("AUDIT PASSED: supply equals wallet holdings");
    Ok(())
}

async fn report_wallet(service: &EconomyService, name: &str, address: &Address) {
    if let Some(view) = service.get_balance(address).await {
        info!(
            "{} ({}): balance {}, staked {}, earned {}",
            name,
            address.short(),
            view.balance,
            view.staked,
            view.earned
        );
    }
}
