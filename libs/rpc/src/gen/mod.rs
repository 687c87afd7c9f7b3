// @generated
// This file wires up buf-generated protobuf code
// Note: The prost files already include!() the tonic files automatically

pub mod payments {
    include!("payments.rs");
    // payments.tonic.rs is auto-included by payments.rs
}
