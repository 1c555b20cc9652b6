#![doc = include_str!("../README.md")]

#[macro_use]
extern crate tracing;

pub use self::{
    bucket::{FormTokens, TokenBucket},
    error::{InvalidToken, ERROR_INVALID_TOKEN},
    newtypes::*,
    registry::{ContextNameProvider, HiddenField, TokenRegistry},
    request::{RequestValueReader, UrlEncodedForm},
    store::{InMemoryStore, SessionStore},
};

use std::num::{NonZeroU32, NonZeroUsize};

mod bucket;
mod error;
mod registry;
mod request;
mod store;

/// Key under which the host session layer persists the [`FormTokens`] tree.
pub const SESSION_KEY: &str = "FORM_TOKENS";

/// Prefix of the submitted field name: `token_<context name>`.
pub const FIELD_PREFIX: &str = "token_";

/// Length of a generated token.
pub const TOKEN_LENGTH: usize = 16;

/// Live tokens a bucket holds before FIFO eviction kicks in.
///
/// Finite on purpose. Every page load issues a token, so an unbounded
/// bucket would grow without limit over a session's lifetime.
pub const DEFAULT_TOKEN_LIMIT: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(limit) => limit,
    None => unreachable!(),
};

/// Successful validations before a token is discarded (single-use).
pub const DEFAULT_MAX_USAGE: NonZeroU32 = match NonZeroU32::new(1) {
    Some(usage) => usage,
    None => unreachable!(),
};

mod newtypes {
    /// An issued form token.
    #[aliri_braid::braid(serde)]
    pub struct Token;

    /// The logical name scoping a token bucket, typically a route or form name.
    #[aliri_braid::braid(serde)]
    pub struct ContextName;

    /// Identity of the session a store call is scoped to.
    #[aliri_braid::braid(serde)]
    pub struct SessionId;
}
