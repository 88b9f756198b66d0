//! Wire translation boundary
//!
//! Everything that touches the remote service's compact encoding lives here:
//! primitive codecs in [`codec`], typed record decoders in [`records`].

pub mod codec;
pub mod records;

pub use codec::{ActorId, Tokens};
