use storefront_payments::domain::event::GatewayEventType;
use storefront_payments::domain::ledger::TransactionType;
use storefront_payments::domain::payment::PaymentStatus;
use storefront_payments::reconcile::transitions::{
    decide, transaction_type_for, OrderSideEffect, Transition, TransitionDecision,
};

#[test]
fn success_completes_pending_and_processing_payments() {
    for current in [PaymentStatus::Pending, PaymentStatus::Processing] {
        let decision = decide(current, GatewayEventType::PaymentSucceeded);
        assert_eq!(
            decision,
            TransitionDecision::Apply(Transition {
                next: PaymentStatus::Completed,
                set_paid_at: true,
                order_side_effect: Some(OrderSideEffect::MarkProcessing),
            }),
            "from {current:?}"
        );
    }
}

#[test]
fn replayed_success_is_a_duplicate_no_op() {
    for _ in 0..5 {
        assert_eq!(
            decide(PaymentStatus::Completed, GatewayEventType::PaymentSucceeded),
            TransitionDecision::DuplicateNoOp
        );
    }
}

#[test]
fn success_never_escapes_failed_or_refunded() {
    for current in [PaymentStatus::Failed, PaymentStatus::Refunded] {
        assert_eq!(
            decide(current, GatewayEventType::PaymentSucceeded),
            TransitionDecision::IgnoredTerminal,
            "from {current:?}"
        );
    }
}

#[test]
fn failure_moves_live_payments_to_failed_without_paid_at() {
    for current in [PaymentStatus::Pending, PaymentStatus::Processing] {
        let decision = decide(current, GatewayEventType::PaymentFailed);
        assert_eq!(
            decision,
            TransitionDecision::Apply(Transition {
                next: PaymentStatus::Failed,
                set_paid_at: false,
                order_side_effect: Some(OrderSideEffect::MarkPaymentFailedIfNoneCompleted),
            }),
            "from {current:?}"
        );
    }
}

#[test]
fn repeated_failure_is_a_duplicate_no_op() {
    assert_eq!(
        decide(PaymentStatus::Failed, GatewayEventType::PaymentFailed),
        TransitionDecision::DuplicateNoOp
    );
}

#[test]
fn failure_never_downgrades_a_completed_or_refunded_payment() {
    for current in [PaymentStatus::Completed, PaymentStatus::Refunded] {
        assert_eq!(
            decide(current, GatewayEventType::PaymentFailed),
            TransitionDecision::IgnoredTerminal,
            "from {current:?}"
        );
    }
}

#[test]
fn refund_applies_only_from_completed() {
    assert_eq!(
        decide(PaymentStatus::Completed, GatewayEventType::Refunded),
        TransitionDecision::Apply(Transition {
            next: PaymentStatus::Refunded,
            set_paid_at: false,
            order_side_effect: None,
        })
    );

    for current in [
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Failed,
    ] {
        assert_eq!(
            decide(current, GatewayEventType::Refunded),
            TransitionDecision::IgnoredTerminal,
            "from {current:?}"
        );
    }
}

#[test]
fn repeated_refund_is_a_duplicate_no_op() {
    assert_eq!(
        decide(PaymentStatus::Refunded, GatewayEventType::Refunded),
        TransitionDecision::DuplicateNoOp
    );
}

#[test]
fn terminal_states_have_no_exit_besides_completed_to_refunded() {
    let events = [
        GatewayEventType::PaymentSucceeded,
        GatewayEventType::PaymentFailed,
        GatewayEventType::Refunded,
    ];
    for event in events {
        assert!(!matches!(
            decide(PaymentStatus::Refunded, event),
            TransitionDecision::Apply(_)
        ));
        assert!(!matches!(
            decide(PaymentStatus::Failed, event),
            TransitionDecision::Apply(_)
        ));
    }
    for event in [GatewayEventType::PaymentSucceeded, GatewayEventType::PaymentFailed] {
        assert!(!matches!(
            decide(PaymentStatus::Completed, event),
            TransitionDecision::Apply(_)
        ));
    }
}

#[test]
fn ledger_rows_carry_the_matching_transaction_type() {
    assert_eq!(
        transaction_type_for(GatewayEventType::PaymentSucceeded),
        TransactionType::Capture
    );
    assert_eq!(
        transaction_type_for(GatewayEventType::PaymentFailed),
        TransactionType::Authorize
    );
    assert_eq!(
        transaction_type_for(GatewayEventType::Refunded),
        TransactionType::Refund
    );
}
