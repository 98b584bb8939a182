use crate::domain::event::GatewayEventType;
use crate::domain::ledger::TransactionType;
use crate::domain::payment::PaymentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSideEffect {
    MarkProcessing,
    MarkPaymentFailedIfNoneCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: PaymentStatus,
    pub set_paid_at: bool,
    pub order_side_effect: Option<OrderSideEffect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
    Apply(Transition),
    DuplicateNoOp,
    IgnoredTerminal,
}

pub fn decide(current: PaymentStatus, event: GatewayEventType) -> TransitionDecision {
    match (current, event) {
        (PaymentStatus::Pending | PaymentStatus::Processing, GatewayEventType::PaymentSucceeded) => {
            TransitionDecision::Apply(Transition {
                next: PaymentStatus::Completed,
                set_paid_at: true,
                order_side_effect: Some(OrderSideEffect::MarkProcessing),
            })
        }
        (PaymentStatus::Completed, GatewayEventType::PaymentSucceeded) => {
            TransitionDecision::DuplicateNoOp
        }
        (PaymentStatus::Failed | PaymentStatus::Refunded, GatewayEventType::PaymentSucceeded) => {
            TransitionDecision::IgnoredTerminal
        }

        (PaymentStatus::Pending | PaymentStatus::Processing, GatewayEventType::PaymentFailed) => {
            TransitionDecision::Apply(Transition {
                next: PaymentStatus::Failed,
                set_paid_at: false,
                order_side_effect: Some(OrderSideEffect::MarkPaymentFailedIfNoneCompleted),
            })
        }
        (PaymentStatus::Failed, GatewayEventType::PaymentFailed) => TransitionDecision::DuplicateNoOp,
        (PaymentStatus::Completed | PaymentStatus::Refunded, GatewayEventType::PaymentFailed) => {
            TransitionDecision::IgnoredTerminal
        }

        (PaymentStatus::Completed, GatewayEventType::Refunded) => {
            TransitionDecision::Apply(Transition {
                next: PaymentStatus::Refunded,
                set_paid_at: false,
                order_side_effect: None,
            })
        }
        (PaymentStatus::Refunded, GatewayEventType::Refunded) => TransitionDecision::DuplicateNoOp,
        (
            PaymentStatus::Pending | PaymentStatus::Processing | PaymentStatus::Failed,
            GatewayEventType::Refunded,
        ) => TransitionDecision::IgnoredTerminal,
    }
}

pub fn transaction_type_for(event: GatewayEventType) -> TransactionType {
    match event {
        GatewayEventType::PaymentSucceeded => TransactionType::Capture,
        GatewayEventType::PaymentFailed => TransactionType::Authorize,
        GatewayEventType::Refunded => TransactionType::Refund,
    }
}
