//! End-to-end scenarios for the native-value and token variants

use referral_ledger::{
    config::UnpaidCommissionPolicy, AssetKind, Config, Custody, Error, Ledger, ParticipantId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

struct Accounts {
    acc1: ParticipantId,
    acc2: ParticipantId,
    acc3: ParticipantId,
    acc4: ParticipantId,
}

fn accounts() -> Accounts {
    Accounts {
        acc1: ParticipantId::new("0x70997970c51812dc3a010c7d01b50e0d17dc79c8"),
        acc2: ParticipantId::new("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc"),
        acc3: ParticipantId::new("0x90f79bf6eb2c4f870365e785982e1f101e93b906"),
        acc4: ParticipantId::new("0x15d34aaf54267db7d7c367839aaf71a00a2c6a65"),
    }
}

fn create_ledger(kind: AssetKind) -> (Ledger, Arc<Custody>, Accounts) {
    let mut config = Config::default();
    config.asset.kind = kind;

    let accs = accounts();
    let custody = Arc::new(Custody::new());
    for acc in [&accs.acc1, &accs.acc2, &accs.acc3, &accs.acc4] {
        custody.fund(acc, dec!(10_000));
    }
    let ledger = Ledger::new(config, custody.clone()).unwrap();
    (ledger, custody, accs)
}

#[test]
fn registered_without_referrer_has_zero_balance() {
    for kind in [AssetKind::Native, AssetKind::Token] {
        let (mut ledger, _, a) = create_ledger(kind);
        ledger.sign_up(&a.acc1).unwrap();
        assert_eq!(ledger.balance(&a.acc1), Decimal::ZERO);
        assert_eq!(ledger.balance(&a.acc2), Decimal::ZERO);
    }
}

#[test]
fn duplicate_registration_rejected_with_or_without_referrer() {
    let (mut ledger, _, a) = create_ledger(AssetKind::Token);
    ledger.sign_up(&a.acc1).unwrap();
    ledger.sign_up_with_sponsor(&a.acc2, &a.acc1).unwrap();

    let err = ledger.sign_up(&a.acc1).unwrap_err();
    assert_eq!(err.to_string(), "user already registered");
    let err = ledger.sign_up_with_sponsor(&a.acc2, &a.acc1).unwrap_err();
    assert_eq!(err.to_string(), "user already registered");
    assert_eq!(ledger.balance(&a.acc2), Decimal::ZERO);
}

#[test]
fn referrer_must_exist() {
    let (mut ledger, _, a) = create_ledger(AssetKind::Native);
    let err = ledger.sign_up_with_sponsor(&a.acc1, &a.acc1).unwrap_err();
    assert!(matches!(err, Error::UnknownSponsor(_)));
    assert_eq!(err.to_string(), "referrer address doesn't exist");
}

#[test]
fn invest_credits_ninety_five_percent() {
    let (mut ledger, custody, a) = create_ledger(AssetKind::Token);
    ledger.sign_up(&a.acc1).unwrap();
    ledger.invest(&a.acc1, dec!(1)).unwrap();

    assert_eq!(ledger.balance(&a.acc1), dec!(0.95));
    assert_eq!(custody.balance_of(&a.acc1), dec!(9_999));
    let pull = &custody.history()[0];
    assert_eq!(pull.from, a.acc1);
    assert_eq!(pull.to, ParticipantId::new("ledger-custody"));
    assert_eq!(pull.amount, dec!(1));
}

#[test]
fn minimum_deposit_messages() {
    let (mut ledger, _, a) = create_ledger(AssetKind::Native);
    ledger.sign_up(&a.acc1).unwrap();
    let err = ledger.invest(&a.acc1, Decimal::new(1, 18)).unwrap_err();
    assert_eq!(err.to_string(), "minimal value = 0.005 Eth");

    let (mut ledger, _, a) = create_ledger(AssetKind::Token);
    ledger.sign_up(&a.acc1).unwrap();
    let err = ledger.invest(&a.acc1, dec!(0.001)).unwrap_err();
    assert_eq!(err.to_string(), "donate at least 0.005 tokens");
}

#[test]
fn referral_info_lists_children_with_levels() {
    let (mut ledger, _, a) = create_ledger(AssetKind::Native);
    let value = dec!(0.006);
    ledger.sign_up(&a.acc1).unwrap();
    ledger.sign_up_with_sponsor(&a.acc2, &a.acc1).unwrap();
    ledger.sign_up_with_sponsor(&a.acc3, &a.acc1).unwrap();
    ledger.sign_up_with_sponsor(&a.acc4, &a.acc1).unwrap();
    ledger.invest(&a.acc1, value * dec!(10)).unwrap();
    ledger.invest(&a.acc2, value * dec!(2)).unwrap();
    ledger.invest(&a.acc3, value * dec!(4)).unwrap();
    ledger.invest(&a.acc4, value).unwrap();

    let referrals = ledger.referrals_info(&a.acc1).unwrap();
    assert_eq!(referrals[0].id, a.acc2);
    assert_eq!(referrals[0].level, ledger.level(&a.acc2));
    assert_eq!(referrals[1].id, a.acc3);
    assert_eq!(referrals[1].level, ledger.level(&a.acc3));
    assert_eq!(referrals[2].id, a.acc4);
    assert_eq!(referrals[2].level, ledger.level(&a.acc4));
    assert_eq!(ledger.level(&a.acc4), 1);
}

#[test]
fn referral_info_requires_referrals() {
    let (mut ledger, _, a) = create_ledger(AssetKind::Token);
    ledger.sign_up(&a.acc1).unwrap();
    let err = ledger.referrals_info(&a.acc1).unwrap_err();
    assert_eq!(err.to_string(), "No referrals");
}

#[test]
fn withdraw_commission_shared_up_two_levels() {
    for kind in [AssetKind::Native, AssetKind::Token] {
        let (mut ledger, custody, a) = create_ledger(kind);
        ledger.sign_up(&a.acc1).unwrap();
        ledger.sign_up_with_sponsor(&a.acc2, &a.acc1).unwrap();
        ledger.sign_up_with_sponsor(&a.acc3, &a.acc2).unwrap();
        ledger.invest(&a.acc1, dec!(0.012)).unwrap();
        ledger.invest(&a.acc2, dec!(0.006)).unwrap();
        ledger.invest(&a.acc3, dec!(20)).unwrap();

        let acc1_balance = ledger.balance(&a.acc1);
        let acc2_balance = ledger.balance(&a.acc2);
        let acc3_balance = ledger.balance(&a.acc3);
        let wallet_before = custody.balance_of(&a.acc3);

        ledger.withdraw(&a.acc3).unwrap();

        assert_eq!(ledger.balance(&a.acc1), acc1_balance + acc3_balance * dec!(0.007));
        assert_eq!(ledger.balance(&a.acc2), acc2_balance + acc3_balance * dec!(0.01));
        assert_eq!(ledger.balance(&a.acc3), Decimal::ZERO);
        assert_eq!(
            custody.balance_of(&a.acc3) - wallet_before,
            acc3_balance * (Decimal::ONE - dec!(0.017))
        );
        ledger.check_conservation().unwrap();
    }
}

#[test]
fn root_withdrawal_zeroes_balance() {
    let (mut ledger, custody, a) = create_ledger(AssetKind::Native);
    ledger.sign_up(&a.acc1).unwrap();
    ledger.invest(&a.acc1, dec!(1000)).unwrap();

    let receipt = ledger.withdraw(&a.acc1).unwrap();
    assert_eq!(ledger.balance(&a.acc1), Decimal::ZERO);
    assert_eq!(receipt.net_payout, dec!(950));
    assert_eq!(custody.balance_of(&a.acc1), dec!(9_950));
}

#[test]
fn root_withdrawal_under_retain_policy() {
    let mut config = Config::default();
    config.policy.unpaid_commission = UnpaidCommissionPolicy::RetainByPlatform;
    let a = accounts();
    let custody = Arc::new(Custody::new());
    custody.fund(&a.acc1, dec!(100));
    let mut ledger = Ledger::new(config, custody.clone()).unwrap();

    ledger.sign_up(&a.acc1).unwrap();
    ledger.invest(&a.acc1, dec!(100)).unwrap();
    let receipt = ledger.withdraw(&a.acc1).unwrap();

    assert_eq!(receipt.retained, dec!(1.615));
    assert_eq!(custody.balance_of(&a.acc1), dec!(93.385));
    assert_eq!(ledger.platform_fees(), dec!(6.615));
}

#[test]
fn unregistered_caller_cannot_invest_or_withdraw() {
    let (mut ledger, custody, a) = create_ledger(AssetKind::Token);
    assert!(matches!(
        ledger.invest(&a.acc1, dec!(1)),
        Err(Error::NotRegistered(_))
    ));
    assert!(matches!(ledger.withdraw(&a.acc1), Err(Error::NotRegistered(_))));
    assert!(custody.history().is_empty());
}

#[test]
fn snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.snapshot.path = Some(dir.path().join("ledger.snap"));

    let a = accounts();
    let custody = Arc::new(Custody::new());
    custody.fund(&a.acc2, dec!(5));

    let mut ledger = Ledger::open(config.clone(), custody.clone()).unwrap();
    ledger.sign_up(&a.acc1).unwrap();
    ledger.sign_up_with_sponsor(&a.acc2, &a.acc1).unwrap();
    ledger.invest(&a.acc2, dec!(2)).unwrap();
    ledger.save_snapshot().unwrap();
    drop(ledger);

    let mut reopened = Ledger::open(config, custody).unwrap();
    assert_eq!(reopened.participant_count(), 2);
    assert_eq!(reopened.balance(&a.acc2), dec!(1.9));
    assert_eq!(reopened.level(&a.acc2), 9);

    reopened.withdraw(&a.acc2).unwrap();
    assert_eq!(reopened.balance(&a.acc1), dec!(0.019));
    reopened.check_conservation().unwrap();
}

#[test]
fn reopen_with_fresh_wallet_book_needs_seeded_custody() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.snapshot.path = Some(dir.path().join("ledger.snap"));

    let a = accounts();
    let custody = Arc::new(Custody::new());
    custody.fund(&a.acc1, dec!(1));

    let mut ledger = Ledger::open(config.clone(), custody).unwrap();
    ledger.sign_up(&a.acc1).unwrap();
    ledger.invest(&a.acc1, dec!(1)).unwrap();
    ledger.save_snapshot().unwrap();
    drop(ledger);

    let err = Ledger::open(config.clone(), Arc::new(Custody::new())).unwrap_err();
    assert!(matches!(err, Error::InvariantViolation(_)));

    let fresh = Arc::new(Custody::new());
    fresh.fund(&config.asset.custody_id(), dec!(1));
    let mut reopened = Ledger::open(config, fresh.clone()).unwrap();
    reopened.withdraw(&a.acc1).unwrap();
    assert_eq!(fresh.balance_of(&a.acc1), dec!(0.95));
    reopened.check_custody_backing().unwrap();
}
