//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request (policy, session?)
//!     → router.rs (dispatch on policy)
//!         - priority.rs (least-loaded candidate)
//!         - rotation.rs (round-robin cursor)
//!         - affinity.rs (sticky session lookup / bind)
//!         - topology.rs (nearest healthy neighbour)
//!     → server.rs (admit or reject against capacity)
//!     → priority.rs (re-push updated load)
//! ```
//!
//! # Design Decisions
//! - The priority index is lazy: stale entries are tolerated, rebuilt on
//!   membership and release events
//! - Registry is the source of truth; indexes hold ids only
//! - One router owns all state; `shared.rs` adds a single coarse lock

pub mod affinity;
pub mod error;
pub mod policy;
pub mod priority;
pub mod registry;
pub mod rotation;
pub mod router;
pub mod server;
pub mod shared;
pub mod topology;

pub use error::{RouterError, RouterResult};
pub use policy::Policy;
pub use router::{Admission, Assignment, Router, ServerStatus};
pub use server::{HealthState, Server, ServerId, ServerSpec};
pub use shared::SharedRouter;
