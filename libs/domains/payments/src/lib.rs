//! Payments domain: models, persistence and Stripe event processing.

pub mod error;
pub mod models;
pub mod postgres;
pub mod processor;
pub mod repository;

pub use error::{PaymentError, PaymentResult};
pub use models::{CreatePayment, Payment, PaymentStatus, StatusUpdate};
pub use postgres::PgPaymentRepository;
pub use processor::PaymentEventProcessor;
pub use repository::PaymentRepository;
