pub mod gen;

pub use gen::payments;
