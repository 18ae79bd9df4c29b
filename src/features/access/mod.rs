//! File access control.
//!
//! Three visibility tiers decide who may fetch a file and with which credential:
//!
//! | Level | Read | Mutate / delete |
//! |-------|------|-----------------|
//! | `private` | owner (session or API key) | owner session |
//! | `read-only` | owner (session or API key), any session | owner session |
//! | `public` | owner (session or API key), any session | owner session |
//!
//! Decisions are pure functions of a record snapshot and a resolved [`Credential`];
//! all I/O happens before the policy is consulted.

pub mod model;
pub mod policy;

pub use model::{AccessControlled, AccessLevel, Credential, PrincipalId};
pub use policy::AccessPolicy;
