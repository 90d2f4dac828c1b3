//! Client core for the course-management console: an authenticated HTTP
//! client, a session object, and a generic resource controller that every
//! entity screen instantiates.

pub mod auth;
pub mod entities;
pub mod error;
pub mod filter;
pub mod lookup;
pub mod messages;
pub mod resource;
pub mod session;
pub mod transport;

pub use auth::AuthService;
pub use error::ClientError;
pub use filter::{filtered_view, StatusFilter};
pub use lookup::{LookupController, LookupOutcome};
pub use messages::{DisplayError, Locale, Operation};
pub use resource::{
    ActionKind, DialogState, Endpoint, MutationKind, Phase, Resource, ResourceConfig,
    ResourceController, ResourceSnapshot,
};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionEvent, SessionStore};
pub use transport::{ApiRequest, ApiResponse, AuthenticatedClient, ClientConfig};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
