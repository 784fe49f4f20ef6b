//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Money conservation: custody == Σ(balances) + platform fees
//! - Level monotonicity in cumulative deposit
//! - Failed operations leave no trace
//! - Referral lists match sponsor links

use proptest::prelude::*;
use referral_ledger::{Config, Custody, Error, LevelCalculator, Ledger, ParticipantId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

const ACCOUNTS: usize = 6;

fn account(index: usize) -> ParticipantId {
    ParticipantId::new(format!("0x{:04x}", index))
}

/// Strategy for deposit amounts, in thousandths (0.001 .. 50)
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..50_000i64).prop_map(|milli| Decimal::new(milli, 3))
}

#[derive(Debug, Clone)]
enum Op {
    SignUp(usize),
    SignUpWith(usize, usize),
    Invest(usize, Decimal),
    Withdraw(usize),
    FailingWithdraw(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ACCOUNTS).prop_map(Op::SignUp),
        (0..ACCOUNTS, 0..ACCOUNTS).prop_map(|(a, s)| Op::SignUpWith(a, s)),
        (0..ACCOUNTS, amount_strategy()).prop_map(|(a, m)| Op::Invest(a, m)),
        (0..ACCOUNTS).prop_map(Op::Withdraw),
        (0..ACCOUNTS).prop_map(Op::FailingWithdraw),
    ]
}

fn create_test_ledger() -> (Ledger, Arc<Custody>) {
    let custody = Arc::new(Custody::new());
    for index in 0..ACCOUNTS {
        custody.fund(&account(index), dec!(1_000_000));
    }
    let ledger = Ledger::new(Config::default(), custody.clone()).unwrap();
    (ledger, custody)
}

fn apply(ledger: &mut Ledger, custody: &Custody, op: &Op) {
    let _ = match op {
        Op::SignUp(a) => ledger.sign_up(&account(*a)).map(|_| ()),
        Op::SignUpWith(a, s) => ledger
            .sign_up_with_sponsor(&account(*a), &account(*s))
            .map(|_| ()),
        Op::Invest(a, amount) => ledger.invest(&account(*a), *amount).map(|_| ()),
        Op::Withdraw(a) => ledger.withdraw(&account(*a)).map(|_| ()),
        Op::FailingWithdraw(a) => {
            custody.fail_next(1);
            let result = ledger.withdraw(&account(*a)).map(|_| ());
            custody.fail_next(0);
            result
        }
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: no operation sequence creates or destroys value
    #[test]
    fn prop_conservation_holds(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let (mut ledger, custody) = create_test_ledger();

        for op in &ops {
            apply(&mut ledger, &custody, op);
            prop_assert!(ledger.check_conservation().is_ok());
        }

        let custody_account = ParticipantId::new("ledger-custody");
        prop_assert_eq!(custody.balance_of(&custody_account), ledger.custody());
    }

    /// Property: referral lists agree with sponsor links
    #[test]
    fn prop_children_match_sponsors(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let (mut ledger, custody) = create_test_ledger();
        for op in &ops {
            apply(&mut ledger, &custody, op);
        }

        for index in 0..ACCOUNTS {
            let id = account(index);
            let Ok(participant) = ledger.participant(&id) else { continue };
            for child in &participant.children {
                let child = ledger.participant(child).unwrap();
                prop_assert_eq!(child.sponsor.as_ref(), Some(&id));
            }
            if let Some(sponsor) = &participant.sponsor {
                let sponsor = ledger.participant(sponsor).unwrap();
                prop_assert!(sponsor.children.contains(&id));
            }
        }
    }

    /// Property: deposits credit exactly 95% of the gross amount
    #[test]
    fn prop_deposit_fee_exact(amount in amount_strategy()) {
        let (mut ledger, _) = create_test_ledger();
        let alice = account(0);
        ledger.sign_up(&alice).unwrap();

        match ledger.invest(&alice, amount) {
            Ok(receipt) => {
                prop_assert!(amount >= dec!(0.005));
                prop_assert_eq!(ledger.balance(&alice), amount * dec!(0.95));
                prop_assert_eq!(receipt.fee + receipt.credited, amount);
            }
            Err(Error::BelowMinimum { .. }) => {
                prop_assert!(amount < dec!(0.005));
                prop_assert_eq!(ledger.balance(&alice), Decimal::ZERO);
                prop_assert_eq!(ledger.level(&alice), 0);
            }
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }

    /// Property: level never decreases as cumulative deposit grows
    #[test]
    fn prop_level_monotonic(a in amount_strategy(), b in amount_strategy()) {
        let calc = LevelCalculator::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(calc.level(low) <= calc.level(high));
    }

    /// Property: a refused payout leaves balances untouched
    #[test]
    fn prop_failed_withdraw_is_invisible(amount in (5i64..50_000i64).prop_map(|m| Decimal::new(m, 3))) {
        let (mut ledger, custody) = create_test_ledger();
        let (a, b, c) = (account(0), account(1), account(2));
        ledger.sign_up(&a).unwrap();
        ledger.sign_up_with_sponsor(&b, &a).unwrap();
        ledger.sign_up_with_sponsor(&c, &b).unwrap();
        ledger.invest(&c, amount).unwrap();

        let before: Vec<_> = [&a, &b, &c].iter().map(|id| ledger.balance(id)).collect();
        custody.fail_next(1);
        prop_assert!(ledger.withdraw(&c).is_err());
        let after: Vec<_> = [&a, &b, &c].iter().map(|id| ledger.balance(id)).collect();

        prop_assert_eq!(before, after);
    }
}
