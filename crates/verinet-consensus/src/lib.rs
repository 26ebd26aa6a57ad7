// crates/verinet-consensus/src/lib.rs
//
// verinet-consensus: Membership, claim aggregation and publication for VeriNet.
//
// The registry decides who may contribute claims, the aggregator turns a
// batch of claims about one subject into a consensus result, and the
// pipeline publishes each distinct result to the ledger exactly once.

pub mod aggregator;
pub mod authority;
pub mod pipeline;
pub mod policy;
pub mod registry;
pub mod revocation;

pub use aggregator::{AggregationError, Aggregator};
pub use authority::{Authority, Role, StaticAuthority};
pub use pipeline::{AttestationPipeline, PipelineError};
pub use policy::{AggregationPolicy, MeanPolicy, TrimmedMeanPolicy};
pub use registry::{ParticipantRegistry, RegistryError};
pub use revocation::{RevocationError, RevocationList};

#[cfg(test)]
pub(crate) mod testutil;
