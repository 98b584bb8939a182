use crate::domain::event::{GatewayEvent, GatewayEventType};
use crate::domain::ledger::{NewLedgerEntry, TransactionStatus, TransactionType};
use crate::domain::order::OrderStore;
use crate::domain::payment::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, ErrorEnvelope, ErrorPayload,
    InitiatePaymentRequest, InitiatePaymentResponse, Payment, PaymentDetailResponse,
    PaymentHistoryResponse, PaymentStatus, RefundPaymentRequest, RefundPaymentResponse,
};
use crate::gateways::{
    CanonicalStatus, CaptureOutcome, ChargeOutcome, ChargeRequest, GatewayRegistry, RefundOutcome,
};
use crate::reconcile::reconciler::Reconciler;
use crate::repo::payments_repo::{NewPayment, PaymentsRepo};
use crate::repo::transactions_repo::TransactionsRepo;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct PaymentService {
    pub payments_repo: PaymentsRepo,
    pub transactions_repo: TransactionsRepo,
    pub orders: Arc<dyn OrderStore>,
    pub gateways: GatewayRegistry,
    pub reconciler: Reconciler,
}

type ServiceError = (StatusCode, ErrorEnvelope);

impl PaymentService {
    pub async fn initiate(
        &self,
        user_id: Uuid,
        req: InitiatePaymentRequest,
    ) -> Result<InitiatePaymentResponse, ServiceError> {
        validate_currency(&req.currency)?;

        let adapter = self.gateways.for_method(req.payment_method);
        if !adapter.supports_currency(&req.currency) {
            return Err((
                StatusCode::BAD_REQUEST,
                err(
                    "VALIDATION_ERROR",
                    "currency is not supported by the selected payment method",
                ),
            ));
        }

        let order = self
            .orders
            .fetch(req.order_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    err("ORDER_NOT_FOUND", "order does not exist"),
                )
            })?;

        if order.user_id != user_id {
            return Err((
                StatusCode::FORBIDDEN,
                err("UNAUTHORIZED", "order does not belong to the caller"),
            ));
        }

        if order.currency != req.currency {
            return Err((
                StatusCode::BAD_REQUEST,
                err("VALIDATION_ERROR", "currency does not match the order"),
            ));
        }

        if self
            .payments_repo
            .has_completed_for_order(order.id)
            .await
            .map_err(internal)?
        {
            return Err((
                StatusCode::CONFLICT,
                err("ALREADY_PAID", "order already has a completed payment"),
            ));
        }

        let payment_id = Uuid::new_v4();
        self.payments_repo
            .insert_pending(&NewPayment {
                id: payment_id,
                order_id: order.id,
                user_id,
                amount: order.total,
                currency: req.currency.clone(),
                method: req.payment_method,
            })
            .await
            .map_err(internal)?;

        let outcome = adapter
            .create_payment(&ChargeRequest {
                order_id: order.id,
                user_id,
                amount: order.total,
                currency: req.currency.clone(),
            })
            .await
            .map_err(internal)?;

        match outcome {
            ChargeOutcome::Created {
                transaction_id,
                next_action,
                raw,
            } => {
                self.payments_repo
                    .mark_processing(payment_id, &transaction_id, raw)
                    .await
                    .map_err(internal)?;

                Ok(InitiatePaymentResponse {
                    payment_id,
                    transaction_id,
                    status: PaymentStatus::Processing,
                    next_action,
                })
            }
            ChargeOutcome::Declined {
                error_code,
                error_message,
                raw,
            } => {
                self.payments_repo
                    .mark_failed_initiation(
                        payment_id,
                        raw.or_else(|| {
                            Some(json!({
                                "error_code": error_code,
                                "error_message": error_message,
                            }))
                        }),
                    )
                    .await
                    .map_err(internal)?;

                Err((
                    StatusCode::BAD_GATEWAY,
                    err_with_details(
                        "GATEWAY_ERROR",
                        "payment could not be started, try again",
                        format!("{error_code}: {error_message}"),
                    ),
                ))
            }
        }
    }

    pub async fn confirm(
        &self,
        user_id: Uuid,
        req: ConfirmPaymentRequest,
    ) -> Result<ConfirmPaymentResponse, ServiceError> {
        let payment = self.owned_payment(user_id, req.payment_id).await?;

        match payment.gateway_transaction_id.as_deref() {
            Some(stored) if stored == req.transaction_id => {}
            _ => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    err(
                        "VALIDATION_ERROR",
                        "transaction id does not match the payment",
                    ),
                ));
            }
        }

        if payment.status == PaymentStatus::Completed {
            return Ok(ConfirmPaymentResponse {
                payment_id: payment.id,
                payment_status: PaymentStatus::Completed,
            });
        }

        let adapter = self.gateways.for_method(payment.method);
        let mut status = adapter
            .payment_status(&req.transaction_id)
            .await
            .map_err(gateway_error)?;
        let mut capture_failure: Option<(String, String)> = None;

        if status == CanonicalStatus::Processing {
            match adapter
                .capture_payment(&req.transaction_id)
                .await
                .map_err(gateway_error)?
            {
                CaptureOutcome::Captured { status: captured, .. } => status = captured,
                CaptureOutcome::NotRequired { status: known } => {
                    if known != CanonicalStatus::Unknown {
                        status = known;
                    }
                }
                CaptureOutcome::Declined {
                    error_code,
                    error_message,
                } => capture_failure = Some((error_code, error_message)),
            }
        }

        let event_type = if capture_failure.is_some() {
            Some(GatewayEventType::PaymentFailed)
        } else {
            match status {
                CanonicalStatus::Completed => Some(GatewayEventType::PaymentSucceeded),
                CanonicalStatus::Failed => Some(GatewayEventType::PaymentFailed),
                _ => None,
            }
        };

        if let Some(event_type) = event_type {
            let raw = match &capture_failure {
                Some((code, message)) => json!({
                    "source": "confirm",
                    "capture_error_code": code,
                    "capture_error_message": message,
                }),
                None => json!({ "source": "confirm", "gateway_status": status }),
            };
            self.reconciler
                .apply(
                    payment.method,
                    &GatewayEvent {
                        event_type,
                        gateway_transaction_id: req.transaction_id.clone(),
                        amount: Some(payment.amount),
                        currency: Some(payment.currency.clone()),
                        raw,
                    },
                )
                .await
                .map_err(internal)?;
        }

        let current = self
            .payments_repo
            .find_by_id(payment.id)
            .await
            .map_err(internal)?
            .ok_or_else(|| internal(anyhow::anyhow!("payment vanished after confirm")))?;

        Ok(ConfirmPaymentResponse {
            payment_id: current.id,
            payment_status: current.status,
        })
    }

    pub async fn status(
        &self,
        user_id: Uuid,
        payment_id: Uuid,
    ) -> Result<PaymentDetailResponse, ServiceError> {
        let payment = self.owned_payment(user_id, payment_id).await?;
        let transactions = self
            .transactions_repo
            .list_for_payment(payment.id)
            .await
            .map_err(internal)?;

        Ok(PaymentDetailResponse {
            payment,
            transactions,
        })
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<PaymentHistoryResponse, ServiceError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let offset = (page - 1) * per_page;

        let payments = self
            .payments_repo
            .list_for_user(user_id, per_page, offset)
            .await
            .map_err(internal)?;
        let total = self
            .payments_repo
            .count_for_user(user_id)
            .await
            .map_err(internal)?;

        Ok(PaymentHistoryResponse {
            payments,
            page,
            per_page,
            total,
        })
    }

    pub async fn refund(
        &self,
        user_id: Uuid,
        req: RefundPaymentRequest,
    ) -> Result<RefundPaymentResponse, ServiceError> {
        let payment = self.owned_payment(user_id, req.payment_id).await?;

        if payment.status != PaymentStatus::Completed {
            return Err((
                StatusCode::CONFLICT,
                err("VALIDATION_ERROR", "only completed payments can be refunded"),
            ));
        }
        let Some(transaction_id) = payment.gateway_transaction_id.clone() else {
            return Err((
                StatusCode::CONFLICT,
                err("VALIDATION_ERROR", "payment has no gateway transaction"),
            ));
        };

        let adapter = self.gateways.for_method(payment.method);
        let outcome = adapter
            .refund_payment(&transaction_id, payment.amount, &payment.currency)
            .await
            .map_err(gateway_error)?;

        match outcome {
            RefundOutcome::Refunded { refund_id, .. } => {
                self.reconciler
                    .apply(
                        payment.method,
                        &GatewayEvent {
                            event_type: GatewayEventType::Refunded,
                            gateway_transaction_id: transaction_id,
                            amount: Some(payment.amount),
                            currency: Some(payment.currency.clone()),
                            raw: json!({ "source": "refund_api", "refund_id": refund_id }),
                        },
                    )
                    .await
                    .map_err(internal)?;

                Ok(RefundPaymentResponse {
                    payment_id: payment.id,
                    payment_status: PaymentStatus::Refunded,
                    refund_id: Some(refund_id),
                })
            }
            RefundOutcome::ManualActionRequired { detail } => {
                self.append_refund_attempt(&payment, &transaction_id, detail.clone())
                    .await
                    .map_err(internal)?;

                Err((
                    StatusCode::CONFLICT,
                    err_with_details(
                        "UNSUPPORTED_OPERATION",
                        "refund requires manual action with the payment provider",
                        detail,
                    ),
                ))
            }
            RefundOutcome::Declined {
                error_code,
                error_message,
            } => {
                self.append_refund_attempt(
                    &payment,
                    &transaction_id,
                    format!("{error_code}: {error_message}"),
                )
                .await
                .map_err(internal)?;

                Err((
                    StatusCode::BAD_GATEWAY,
                    err_with_details(
                        "GATEWAY_ERROR",
                        "refund was declined by the payment provider",
                        format!("{error_code}: {error_message}"),
                    ),
                ))
            }
        }
    }

    async fn owned_payment(&self, user_id: Uuid, payment_id: Uuid) -> Result<Payment, ServiceError> {
        let payment = self
            .payments_repo
            .find_by_id(payment_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    err("PAYMENT_NOT_FOUND", "payment does not exist"),
                )
            })?;

        if payment.user_id != user_id {
            return Err((
                StatusCode::FORBIDDEN,
                err("UNAUTHORIZED", "payment does not belong to the caller"),
            ));
        }

        Ok(payment)
    }

    async fn append_refund_attempt(
        &self,
        payment: &Payment,
        transaction_id: &str,
        detail: String,
    ) -> anyhow::Result<()> {
        self.transactions_repo
            .insert(&NewLedgerEntry {
                payment_id: payment.id,
                transaction_type: TransactionType::Refund,
                amount: payment.amount,
                currency: payment.currency.clone(),
                status: TransactionStatus::Failed,
                is_duplicate: false,
                gateway_transaction_id: Some(transaction_id.to_string()),
                gateway_response: json!({ "source": "refund_api" }),
                error_message: Some(detail),
            })
            .await
    }
}

pub fn validate_currency(currency: &str) -> Result<(), ServiceError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Ok(());
    }
    Err((
        StatusCode::BAD_REQUEST,
        err("VALIDATION_ERROR", "currency must be a 3-letter ISO code"),
    ))
}

fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}

fn err_with_details(code: &str, message: &str, details: String) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: Some(details),
        },
    }
}

fn internal(e: anyhow::Error) -> ServiceError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        err("INTERNAL_ERROR", &e.to_string()),
    )
}

fn gateway_error(e: anyhow::Error) -> ServiceError {
    (
        StatusCode::BAD_GATEWAY,
        err("GATEWAY_ERROR", &e.to_string()),
    )
}
