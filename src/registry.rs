use crate::{
    ContextName, ContextNameRef, InvalidToken, RequestValueReader, SessionId, SessionStore, Token,
    TokenRef, DEFAULT_MAX_USAGE, DEFAULT_TOKEN_LIMIT, FIELD_PREFIX, TOKEN_LENGTH,
};
use rand::{distributions::Alphanumeric, Rng};
use std::{
    fmt::{self, Display},
    num::{NonZeroU32, NonZeroUsize},
};
use typed_builder::TypedBuilder;

/// Resolves the bucket key when the caller does not name one, typically
/// "the route currently being dispatched".
pub trait ContextNameProvider {
    fn current_context(&self) -> ContextName;
}

impl<F> ContextNameProvider for F
where
    F: Fn() -> ContextName,
{
    fn current_context(&self) -> ContextName {
        self()
    }
}

fn random_token(length: usize) -> Token {
    rand::thread_rng()
        .sample_iter(Alphanumeric)
        .map(char::from)
        .take(length)
        .collect::<String>()
        .into()
}

/// Issues and consumes single-use tokens for one context within one session.
///
/// A registry is per-request state: it holds configuration and the render
/// cache, never bucket contents. Any number of instances may address the
/// same bucket through a shared [`SessionStore`].
#[derive(TypedBuilder)]
pub struct TokenRegistry<S> {
    store: S,
    #[builder(setter(into))]
    session_id: SessionId,
    /// Permanent bucket key for this instance.
    #[builder(setter(into))]
    name: ContextName,
    #[builder(default = DEFAULT_TOKEN_LIMIT)]
    token_limit: NonZeroUsize,
    #[builder(default = DEFAULT_MAX_USAGE)]
    max_usage: NonZeroU32,
    #[builder(default = TOKEN_LENGTH)]
    token_length: usize,
    #[builder(default, setter(skip))]
    last_token: Option<Token>,
}

impl<S> TokenRegistry<S>
where
    S: SessionStore,
{
    /// Build a registry keyed by the provider's current context.
    ///
    /// The name is resolved once, here. It stays the bucket key for the
    /// whole lifetime of the instance even if the ambient context moves on.
    pub fn for_context<P>(store: S, session_id: SessionId, provider: &P) -> Self
    where
        P: ContextNameProvider,
    {
        Self::builder()
            .store(store)
            .session_id(session_id)
            .name(provider.current_context())
            .build()
    }

    #[must_use]
    pub fn name(&self) -> &ContextNameRef {
        &self.name
    }

    /// Field name the token travels under: `token_<context name>`.
    #[must_use]
    pub fn field_name(&self) -> String {
        format!("{FIELD_PREFIX}{}", self.name)
    }

    /// Issue a fresh token into this context's bucket.
    ///
    /// Draws until the candidate is unique within the bucket, evicts the
    /// oldest entry if the bucket is at capacity, and inserts the token
    /// with usage count zero.
    pub fn generate(&mut self) -> Token {
        let limit = self.token_limit.get();
        let length = self.token_length;

        self.store.with_tokens(&self.session_id, |tokens| {
            let bucket = tokens.bucket_entry(&self.name);
            let token = bucket.draw_unique(|| random_token(length));

            while bucket.len() >= limit {
                let Some(evicted) = bucket.evict_oldest() else {
                    break;
                };
                debug!(context = %self.name, %evicted, "token bucket full, evicted oldest token");
            }

            bucket.insert_fresh(token.clone());
            token
        })
    }

    /// The hidden field for this registry, issuing a token on first call.
    ///
    /// Subsequent calls return the same token, so rendering one logical
    /// form several times within a request burns a single bucket slot.
    pub fn hidden_field(&mut self) -> HiddenField {
        let token = match self.last_token {
            Some(ref token) => token.clone(),
            None => {
                let token = self.generate();
                self.last_token = Some(token.clone());
                token
            }
        };

        HiddenField {
            name: self.field_name(),
            token,
        }
    }

    /// A hidden field around a freshly issued token, bypassing the cache.
    pub fn fresh_hidden_field(&mut self) -> HiddenField {
        HiddenField {
            name: self.field_name(),
            token: self.generate(),
        }
    }

    /// Consume one use of `token`.
    ///
    /// `false` for an empty candidate, a context that never issued a
    /// token, or a token not (or no longer) in the bucket — all routine
    /// states, and none of them mutate anything. A `true` return advances
    /// the usage count and removes the token once it reaches `max_usage`.
    pub fn validate(&self, token: &TokenRef) -> bool {
        if token.as_str().is_empty() {
            return false;
        }

        self.store.with_tokens(&self.session_id, |tokens| {
            let Some(bucket) = tokens.bucket_mut(&self.name) else {
                return false;
            };

            let consumed = bucket.consume(token, self.max_usage);
            if !consumed {
                debug!(context = %self.name, "rejected unknown form token");
            }

            consumed
        })
    }

    /// Read `token_<name>` from the request and [`validate`](Self::validate) it.
    pub fn validate_request<R>(&self, request: &R) -> bool
    where
        R: RequestValueReader,
    {
        let field_name = self.field_name();
        request
            .form_value(&field_name)
            .is_some_and(|value| self.validate(TokenRef::from_str(value)))
    }

    /// Like [`validate_request`](Self::validate_request), but failure
    /// becomes an [`InvalidToken`] error tagged with `domain`.
    pub fn enforce_request<R>(&self, request: &R, domain: Option<&str>) -> Result<(), InvalidToken>
    where
        R: RequestValueReader,
    {
        if self.validate_request(request) {
            Ok(())
        } else {
            Err(InvalidToken::new(domain.map(ToOwned::to_owned)))
        }
    }
}

/// Rendered reference to an issued token: the submitted field name and
/// the token value. `Display` writes it as a hidden `<input>` tag.
pub struct HiddenField {
    name: String,
    token: Token,
}

impl HiddenField {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn token(&self) -> &TokenRef {
        &self.token
    }
}

impl Display for HiddenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<input type="hidden" name="{}" value="{}" />"#,
            self.name, self.token
        )
    }
}
