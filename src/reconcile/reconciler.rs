use crate::domain::event::{GatewayEvent, GatewayEventType};
use crate::domain::ledger::{NewLedgerEntry, TransactionStatus};
use crate::domain::order::{OrderStatus, OrderStore};
use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::reconcile::transitions::{decide, transaction_type_for, OrderSideEffect, TransitionDecision};
use crate::repo::payments_repo::PaymentsRepo;
use crate::repo::transactions_repo::TransactionsRepo;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Reconciler {
    pub payments_repo: PaymentsRepo,
    pub transactions_repo: TransactionsRepo,
    pub orders: Arc<dyn OrderStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied { status: PaymentStatus },
    DuplicateNoOp { status: PaymentStatus },
    IgnoredTerminal { status: PaymentStatus },
    NotFound,
}

impl Reconciler {
    pub async fn apply(&self, method: PaymentMethod, event: &GatewayEvent) -> Result<ReconcileOutcome> {
        let Some(mut payment) = self
            .payments_repo
            .find_by_gateway_transaction_id(method, &event.gateway_transaction_id)
            .await?
        else {
            warn!(
                gateway = method.as_str(),
                gateway_transaction_id = %event.gateway_transaction_id,
                "gateway event does not match any payment"
            );
            return Ok(ReconcileOutcome::NotFound);
        };

        // Two passes: the loser of a concurrent compare-and-set re-reads and
        // lands in the duplicate/ignored branch on the second pass.
        for _ in 0..2 {
            match decide(payment.status, event.event_type) {
                TransitionDecision::Apply(transition) => {
                    let won = self
                        .payments_repo
                        .transition(
                            payment.id,
                            payment.status,
                            transition.next,
                            transition.set_paid_at,
                            Some(event.raw.clone()),
                        )
                        .await?;

                    if !won {
                        payment = self
                            .payments_repo
                            .find_by_id(payment.id)
                            .await?
                            .ok_or_else(|| anyhow!("payment {} disappeared mid-transition", payment.id))?;
                        continue;
                    }

                    match transition.order_side_effect {
                        Some(OrderSideEffect::MarkProcessing) => {
                            self.orders
                                .set_status(payment.order_id, OrderStatus::Processing)
                                .await?;
                        }
                        Some(OrderSideEffect::MarkPaymentFailedIfNoneCompleted) => {
                            if !self
                                .payments_repo
                                .has_completed_for_order(payment.order_id)
                                .await?
                            {
                                self.orders
                                    .set_status(payment.order_id, OrderStatus::PaymentFailed)
                                    .await?;
                            }
                        }
                        None => {}
                    }

                    self.append_ledger(&payment, event, ledger_status(event.event_type), false, None)
                        .await?;

                    info!(
                        payment_id = %payment.id,
                        from = payment.status.as_str(),
                        to = transition.next.as_str(),
                        "applied gateway event"
                    );
                    return Ok(ReconcileOutcome::Applied {
                        status: transition.next,
                    });
                }
                TransitionDecision::DuplicateNoOp => {
                    self.append_ledger(&payment, event, ledger_status(event.event_type), true, None)
                        .await?;
                    return Ok(ReconcileOutcome::DuplicateNoOp {
                        status: payment.status,
                    });
                }
                TransitionDecision::IgnoredTerminal => {
                    let detail = format!(
                        "event {:?} ignored: payment already {}",
                        event.event_type,
                        payment.status.as_str()
                    );
                    self.append_ledger(&payment, event, TransactionStatus::Failed, true, Some(detail))
                        .await?;
                    return Ok(ReconcileOutcome::IgnoredTerminal {
                        status: payment.status,
                    });
                }
            }
        }

        Err(anyhow!(
            "payment {} transitioned concurrently twice while applying event",
            payment.id
        ))
    }

    async fn append_ledger(
        &self,
        payment: &Payment,
        event: &GatewayEvent,
        status: TransactionStatus,
        is_duplicate: bool,
        error_message: Option<String>,
    ) -> Result<()> {
        self.transactions_repo
            .insert(&NewLedgerEntry {
                payment_id: payment.id,
                transaction_type: transaction_type_for(event.event_type),
                amount: event.amount.unwrap_or(payment.amount),
                currency: event.currency.clone().unwrap_or_else(|| payment.currency.clone()),
                status,
                is_duplicate,
                gateway_transaction_id: Some(event.gateway_transaction_id.clone()),
                gateway_response: event.raw.clone(),
                error_message,
            })
            .await
    }
}

fn ledger_status(event: GatewayEventType) -> TransactionStatus {
    match event {
        GatewayEventType::PaymentSucceeded | GatewayEventType::Refunded => TransactionStatus::Success,
        GatewayEventType::PaymentFailed => TransactionStatus::Failed,
    }
}
