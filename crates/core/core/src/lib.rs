//! # Phone OTP Core
//!
//! This crate provides the foundational types and traits for phone-number
//! login with one-time passcodes. It defines the account and session types,
//! the error taxonomy reported to callers, and the collaborator traits
//! (`IdentityProvider`, `Notifier`) that the issuer and verifier depend on.

pub mod clock;
pub mod csrf;
pub mod error;
pub mod router;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use csrf::{CsrfGuard, CSRF_SESSION_COOKIE};
pub use error::{IdentityError, OtpError, OtpResult, StoreError};
pub use traits::{AuthPlugin, IdentityProvider, Notifier};
pub use types::{DeliveryResult, ProviderFailure, Session, User};

// Re-export router types
pub use router::{CookieOptions, Method, Request, RequestHandler, Response, Route, Router};
