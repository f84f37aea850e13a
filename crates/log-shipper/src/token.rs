// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bearer tokens for the source API and the ingestion endpoint.
//!
//! Tokens are either configured statically or produced by a resolver that is
//! awaited at most once, the first time a request needs it. How the resolver
//! obtains the token is up to the caller.

use std::fmt::Debug;
use std::sync::Arc;
use std::{future::Future, pin::Pin};
use tokio::sync::OnceCell;

pub type TokenResolverFn =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Option<String>> + Send>> + Send + Sync>;

#[derive(Clone)]
pub enum TokenFactory {
    Static(String),
    Deferred {
        resolver_fn: TokenResolverFn,
        token: Arc<OnceCell<Option<String>>>,
    },
}

impl TokenFactory {
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self::Static(token.to_string())
    }

    #[must_use]
    pub fn new_from_resolver(resolver_fn: TokenResolverFn) -> Self {
        Self::Deferred {
            resolver_fn,
            token: Arc::new(OnceCell::new()),
        }
    }

    /// Returns the token, or `None` when the resolver could not produce one.
    pub async fn get_token(&self) -> Option<&str> {
        match self {
            Self::Static(token) => Some(token),
            Self::Deferred { resolver_fn, token } => token
                .get_or_init(|| async { (resolver_fn)().await })
                .await
                .as_deref(),
        }
    }
}

impl Debug for TokenFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenFactory")
    }
}
