//! `grantgate-core`: foundation primitives shared by every GrantGate crate.
//!
//! No IO and no framework types live here.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use id::UserId;
