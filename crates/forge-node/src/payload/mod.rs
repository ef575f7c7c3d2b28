//! Payload-source arbitration (C7) and the builder circuit breaker (C8).

pub mod arbitration;
pub mod circuit_breaker;
