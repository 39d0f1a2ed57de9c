//! Post identifiers, bearer credentials, and the process-wide credential holder.

pub mod credential;
pub mod exchange;
pub mod holder;
pub mod id;

pub use credential::*;
pub use exchange::*;
pub use holder::*;
pub use id::*;
