//! gRPC surface: payment lookup for sibling services.

use std::sync::Arc;

use domain_payments::{PaymentError, PaymentRepository};
use rpc::payments::payment_service_server::{PaymentService, PaymentServiceServer};
use rpc::payments::{GetPaymentRequest, GetPaymentResponse};
use tonic::{Request, Response, Status};
use tracing::info;

pub struct PaymentGrpcService {
    repository: Arc<dyn PaymentRepository>,
}

impl PaymentGrpcService {
    pub fn new(repository: Arc<dyn PaymentRepository>) -> Self {
        Self { repository }
    }

    pub fn into_server(self) -> PaymentServiceServer<Self> {
        PaymentServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl PaymentService for PaymentGrpcService {
    async fn get_payment(
        &self,
        request: Request<GetPaymentRequest>,
    ) -> Result<Response<GetPaymentResponse>, Status> {
        let id = request.into_inner().id;

        let payment = self.repository.get(id).await.map_err(|err| match err {
            PaymentError::NotFound => Status::not_found(format!("payment {id} not found")),
            other => Status::internal(other.to_string()),
        })?;

        Ok(Response::new(GetPaymentResponse {
            payment: Some(rpc::payments::Payment {
                id: payment.id,
                order_id: payment.order_id,
                user_id: payment.user_id,
                stripe_payment_intent_id: payment.stripe_payment_intent_id,
                amount_cents: payment.amount_cents,
                currency: payment.currency,
                status: payment.status.to_string(),
                payment_method: payment.payment_method,
                captured: payment.captured,
                failure_reason: payment.failure_reason,
                metadata: payment.metadata,
                created_at: payment.created_at.to_rfc3339(),
            }),
        }))
    }
}

/// Serve the gRPC endpoint until the shutdown future resolves.
pub async fn serve(
    addr: std::net::SocketAddr,
    repository: Arc<dyn PaymentRepository>,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<(), tonic::transport::Error> {
    info!(%addr, "gRPC server started");
    tonic::transport::Server::builder()
        .add_service(PaymentGrpcService::new(repository).into_server())
        .serve_with_shutdown(addr, shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use domain_payments::{CreatePayment, Payment, PaymentResult, PaymentStatus, StatusUpdate};

    struct StubRepository {
        payment: Option<Payment>,
    }

    #[async_trait]
    impl PaymentRepository for StubRepository {
        async fn insert(&self, _input: CreatePayment) -> PaymentResult<Payment> {
            unimplemented!()
        }

        async fn get(&self, _id: i64) -> PaymentResult<Payment> {
            self.payment.clone().ok_or(PaymentError::NotFound)
        }

        async fn get_by_intent(&self, _intent: &str) -> PaymentResult<Payment> {
            unimplemented!()
        }

        async fn update_status(&self, _update: StatusUpdate) -> PaymentResult<Payment> {
            unimplemented!()
        }
    }

    fn payment() -> Payment {
        Payment {
            id: 3,
            order_id: 7,
            user_id: 9,
            stripe_payment_intent_id: "pi_abc".to_string(),
            amount_cents: 1250,
            currency: "usd".to_string(),
            status: PaymentStatus::Succeeded,
            created_at: Utc::now(),
            updated_at: None,
            payment_method: "card".to_string(),
            captured: true,
            failure_reason: None,
            metadata: "{}".to_string(),
            version: 1,
        }
    }

    #[tokio::test]
    async fn test_get_payment_maps_fields() {
        let service = PaymentGrpcService::new(Arc::new(StubRepository {
            payment: Some(payment()),
        }));
        let response = service
            .get_payment(Request::new(GetPaymentRequest { id: 3 }))
            .await
            .unwrap();

        let payment = response.into_inner().payment.unwrap();
        assert_eq!(payment.id, 3);
        assert_eq!(payment.status, "succeeded");
        assert!(payment.captured);
    }

    #[tokio::test]
    async fn test_missing_payment_is_not_found() {
        let service = PaymentGrpcService::new(Arc::new(StubRepository { payment: None }));
        let status = service
            .get_payment(Request::new(GetPaymentRequest { id: 404 }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
    }
}
