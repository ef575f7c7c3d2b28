pub mod attestation;
pub mod bitfield;
pub mod block;
pub mod primitives;
pub mod sync;

pub use attestation::*;
pub use bitfield::*;
pub use block::*;
pub use primitives::*;
pub use sync::*;
