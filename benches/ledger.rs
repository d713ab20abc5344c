use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::Rng;
use std::hint::black_box;

use pok_economy::{
    ledger::{Address, Ledger},
    EconomyConfig, KnowledgeVerifier,
};

/// Ledger with `wallets` wallets holding 1_000 tokens each.
fn funded_ledger(wallets: usize) -> (Ledger, Vec<Address>) {
    let mut ledger = Ledger::new(&EconomyConfig::default());
    let addresses: Vec<Address> = (0..wallets)
        .map(|i| ledger.create_wallet(&format!("user-{}", i)).address)
        .collect();
    for address in &addresses {
        let _ = ledger.mint_reward(address, 1_000, "bench");
    }
    (ledger, addresses)
}

fn bench_transfer(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    c.bench_function("ledger_transfer_random_pair", |b| {
        b.iter_batched(
            || funded_ledger(64),
            |(mut ledger, addresses)| {
                for _ in 0..100 {
                    let from = addresses[rng.gen_range(0..addresses.len())];
                    let to = addresses[rng.gen_range(0..addresses.len())];
                    let _ = black_box(ledger.transfer(&from, &to, rng.gen_range(1..50)));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_verify_proof(c: &mut Criterion) {
    let verifier = KnowledgeVerifier::default();
    let challenge = verifier.generate_challenge("student", "javascript");
    let answers: Vec<String> = challenge
        .questions
        .iter()
        .map(|q| format!("the answer is {}", q.expected_answer))
        .collect();
    c.bench_function("verifier_verify_proof", |b| {
        b.iter(|| black_box(verifier.verify_proof(&challenge, &answers)));
    });
}

fn bench_transaction_root(c: &mut Criterion) {
    let (ledger, _) = funded_ledger(1_024);
    c.bench_function("ledger_transaction_root_1024", |b| {
        b.iter(|| black_box(ledger.transaction_root()));
    });
}

fn bench_audit(c: &mut Criterion) {
    let (ledger, _) = funded_ledger(1_024);
    c.bench_function("ledger_audit_1024", |b| {
        b.iter(|| black_box(ledger.audit()));
    });
}

criterion_group!(
    benches,
    bench_transfer,
    bench_verify_proof,
    bench_transaction_root,
    bench_audit
);
criterion_main!(benches);
