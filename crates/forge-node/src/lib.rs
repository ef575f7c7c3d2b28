//! Orchestration layer around `forge-core`'s pure algorithms: collaborator
//! traits (pools, execution engine, builder, fork choice), the packing and
//! payload-arbitration glue that talks to them, logging/metrics/config, and
//! the C9 proposal constructor that ties it all together.

pub mod collaborators;
pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod packing;
pub mod payload;
pub mod proposal;
pub mod rpc;

#[cfg(feature = "test-util")]
pub mod testing;

pub use error::ProposerError;
pub use proposal::{build_proposal, Collaborators};
