//! Third-party CRDs that the generated manifests refer to.
//!
//! These are never installed by this operator.

pub mod cert_manager;
pub mod prometheus_operator;
