// @generated
// This file is @generated by prost-build.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetPaymentRequest {
    #[prost(int64, tag="1")]
    pub id: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Payment {
    #[prost(int64, tag="1")]
    pub id: i64,
    #[prost(int64, tag="2")]
    pub order_id: i64,
    #[prost(int64, tag="3")]
    pub user_id: i64,
    #[prost(string, tag="4")]
    pub stripe_payment_intent_id: ::prost::alloc::string::String,
    #[prost(int32, tag="5")]
    pub amount_cents: i32,
    #[prost(string, tag="6")]
    pub currency: ::prost::alloc::string::String,
    #[prost(string, tag="7")]
    pub status: ::prost::alloc::string::String,
    #[prost(string, tag="8")]
    pub payment_method: ::prost::alloc::string::String,
    #[prost(bool, tag="9")]
    pub captured: bool,
    #[prost(string, optional, tag="10")]
    pub failure_reason: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, tag="11")]
    pub metadata: ::prost::alloc::string::String,
    #[prost(string, tag="12")]
    pub created_at: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetPaymentResponse {
    #[prost(message, optional, tag="1")]
    pub payment: ::core::option::Option<Payment>,
}
include!("payments.tonic.rs");
// @@protoc_insertion_point(module)
