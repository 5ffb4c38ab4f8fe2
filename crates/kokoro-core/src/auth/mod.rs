//! Authentication domain: the session model, change events, OAuth redirect
//! fragment parsing, and the provider trait the auth client fulfils.

pub mod event;
pub mod fragment;
pub mod provider;
pub mod session;

pub use event::{AuthChange, AuthEvent};
pub use fragment::{RedirectFragment, sanitized_landing};
pub use provider::{AuthProvider, SignUpOutcome};
pub use session::{Session, UserProfile};
