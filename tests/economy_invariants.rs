use proptest::prelude::*;

use pok_economy::{
    knowledge::{KnowledgeVerifier, Proof, Question, QuestionBank},
    ledger::{Address, Ledger},
    policy::{MonetaryPolicy, UbiPeriod},
    EconomyConfig, Rate,
};

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(64);
    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}

/// One ledger call, with wallet indices resolved modulo the wallet count.
#[derive(Clone, Debug)]
enum Op {
    Mint { to: usize, amount: u64 },
    Transfer { from: usize, to: usize, amount: u64 },
    Stake { at: usize, amount: u64 },
    Unstake { at: usize, amount: u64 },
    StakingPayout { at: usize, days: u64 },
    Ubi { count: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, 0u64..400).prop_map(|(to, amount)| Op::Mint { to, amount }),
        (0usize..4, 0usize..4, 0u64..300)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (0usize..4, 0u64..300).prop_map(|(at, amount)| Op::Stake { at, amount }),
        (0usize..4, 0u64..300).prop_map(|(at, amount)| Op::Unstake { at, amount }),
        (0usize..4, 0u64..2_000).prop_map(|(at, days)| Op::StakingPayout { at, days }),
        (1usize..5).prop_map(|count| Op::Ubi { count }),
    ]
}

fn apply(ledger: &mut Ledger, wallets: &[Address], op: &Op) -> bool {
    let pick = |i: &usize| wallets[*i % wallets.len()];
    match op {
        Op::Mint { to, amount } => ledger.mint_reward(&pick(to), *amount, "knowledge").is_ok(),
        Op::Transfer { from, to, amount } => {
            ledger.transfer(&pick(from), &pick(to), *amount).is_ok()
        }
        Op::Stake { at, amount } => ledger.stake(&pick(at), *amount).is_ok(),
        Op::Unstake { at, amount } => ledger.unstake(&pick(at), *amount).is_ok(),
        Op::StakingPayout { at, days } => ledger.pay_staking_reward(&pick(at), *days).is_ok(),
        Op::Ubi { count } => ledger
            .distribute_ubi(&wallets[..(*count).min(wallets.len())], UbiPeriod::Monthly)
            .is_ok(),
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn supply_is_conserved_and_capped(ops in proptest::collection::vec(op(), 1..60)) {
        let config = EconomyConfig { max_supply: 2_000, ..EconomyConfig::default() };
        let mut ledger = Ledger::new(&config);
        let wallets: Vec<Address> = (0..4)
            .map(|i| ledger.create_wallet(&format!("user-{}", i)).address)
            .collect();

        for op in &ops {
            let supply_before = ledger.policy().current_supply();
            let log_before = ledger.transactions().len();
            let root_before = ledger.transaction_root();

            let accepted = apply(&mut ledger, &wallets, op);

            prop_assert!(ledger.audit().is_ok());
            prop_assert!(ledger.policy().current_supply() <= config.max_supply);
            prop_assert!(ledger.policy().current_supply() >= supply_before);
            if !accepted {
                prop_assert_eq!(ledger.policy().current_supply(), supply_before);
                prop_assert_eq!(ledger.transactions().len(), log_before);
                prop_assert_eq!(ledger.transaction_root(), root_before);
            }
        }
    }

    #[test]
    fn transfer_conserves_pair_total(
        funded in 1u64..10_000,
        amount in 0u64..20_000,
    ) {
        let mut ledger = Ledger::default();
        let a = ledger.create_wallet("a").address;
        let b = ledger.create_wallet("b").address;
        ledger.mint_reward(&a, funded, "grant").unwrap();

        let result = ledger.transfer(&a, &b, amount);
        let total =
            ledger.get_balance(&a).unwrap().balance + ledger.get_balance(&b).unwrap().balance;
        prop_assert_eq!(total, funded);
        prop_assert_eq!(result.is_ok(), amount > 0 && amount <= funded);
    }

    #[test]
    fn stake_round_trip_restores_wallet(funded in 1u64..10_000, share in 1u64..=100) {
        let mut ledger = Ledger::default();
        let a = ledger.create_wallet("a").address;
        ledger.mint_reward(&a, funded, "grant").unwrap();
        let before = ledger.get_balance(&a).unwrap();

        let amount = (funded * share / 100).max(1);
        ledger.stake(&a, amount).unwrap();
        ledger.unstake(&a, amount).unwrap();
        prop_assert_eq!(ledger.get_balance(&a).unwrap(), before);
    }

    #[test]
    fn rejected_mint_leaves_supply(first in 0u64..30_000_000, second in 0u64..30_000_000) {
        let mut policy = MonetaryPolicy::default();
        let _ = policy.mint_tokens(first, "first");
        let before = policy.current_supply();

        match policy.mint_tokens(second, "second") {
            Ok(receipt) => prop_assert_eq!(receipt.new_supply, before + second),
            Err(_) => prop_assert_eq!(policy.current_supply(), before),
        }
        prop_assert!(policy.current_supply() <= 21_000_000);
    }

    #[test]
    fn reward_monotone_in_score_and_level(
        total in 1u32..50,
        correct in 0u32..50,
        level in 0u32..100,
    ) {
        let verifier = KnowledgeVerifier::default();
        let correct = correct.min(total);
        let proof = |c: u32| Proof {
            valid: true,
            score: Rate::from_ratio(c as u64, total as u64),
            correct_count: c,
            total_count: total,
        };

        let reward = verifier.calculate_reward(&proof(correct), level);
        prop_assert!(reward <= verifier.calculate_reward(&proof(correct), level + 1));
        if correct < total {
            prop_assert!(reward <= verifier.calculate_reward(&proof(correct + 1), level));
        }
    }

    #[test]
    fn threshold_is_exact(total in 1u32..200, correct in 0u32..200) {
        let correct = correct.min(total);
        let questions = (0..total)
            .map(|i| Question::new(format!("q{}", i), format!("answer-{}", i)))
            .collect();
        let verifier =
            KnowledgeVerifier::with_bank(&EconomyConfig::default(), QuestionBank::new(questions));
        let challenge = verifier.generate_challenge("student", "any");

        let answers: Vec<String> = (0..total)
            .map(|i| if i < correct { format!("answer-{}", i) } else { "skip".to_string() })
            .collect();
        let proof = verifier.verify_proof(&challenge, &answers);

        prop_assert_eq!(proof.correct_count, correct);
        prop_assert_eq!(proof.valid, correct as u64 * 10 >= total as u64 * 7);
    }
}

#[test]
fn threshold_boundary_fractional() {
    let threshold = Rate::from_ppm(700_000);
    assert!(threshold.is_met_by(7, 10));
    assert!(threshold.is_met_by(7_000, 10_000));
    assert!(!threshold.is_met_by(6_999, 10_000));
}
