//! Executor delegation: invitation lifecycle, state machine, access scoping
//!
//! A principal designates an executor, the executor answers the emailed
//! invite (validate/accept/reject), and once approved their sessions are
//! transparently scoped to the principal's records.

pub mod registry;
pub mod scope;
pub mod service;
pub mod token;

pub use registry::ExecutorRegistry;
pub use scope::AccessScopeResolver;
pub use service::{CreatedExecutor, DelegationService, InviteOutcome, InvitePreview};
pub use token::{InvitePayload, TokenCodec, INVITE_TTL_DAYS};
