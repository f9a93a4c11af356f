// File: src/middleware.rs
// Purpose: Explicit continuation for the root-to-leaf middleware chain

use crate::module::{BoxFuture, MiddlewareFn};
use crate::request_context::RequestContext;
use crate::response::Response;

/// Terminal link of a middleware chain
pub trait Endpoint: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, anyhow::Result<Response>>;
}

/// The remainder of a middleware chain
///
/// A middleware either calls [`Next::run`] to continue or returns its own
/// response, which short-circuits everything after it. Dropping `Next`
/// without running it is the short-circuit. `run` consumes `Next`, so the
/// rest of the chain runs at most once.
pub struct Next<'a> {
    chain: &'a [MiddlewareFn],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    pub fn new(chain: &'a [MiddlewareFn], endpoint: &'a dyn Endpoint) -> Self {
        Self { chain, endpoint }
    }

    /// Runs the next middleware, or the endpoint once the chain is exhausted
    ///
    /// The context may be reborrowed, so a middleware can still inspect or
    /// modify it after the rest of the chain has produced a response.
    pub fn run<'b>(self, ctx: &'b mut RequestContext) -> BoxFuture<'b, anyhow::Result<Response>>
    where
        'a: 'b,
    {
        match self.chain.split_first() {
            Some((head, rest)) => head(
                ctx,
                Next {
                    chain: rest,
                    endpoint: self.endpoint,
                },
            ),
            None => self.endpoint.call(ctx),
        }
    }

    /// Number of middleware still to run
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len())
            .finish()
    }
}
