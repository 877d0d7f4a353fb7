use std::fmt;
use std::sync::Arc;

use crate::dispatcher::Next;
use crate::server::Context;

/// Result returned by every step in an execution stack.
///
/// Steps fail with any error type; the dispatcher catches the error once at
/// its boundary. Typed errors raised by the crate itself (for example
/// [`crate::dispatcher::ExecError`]) can be recovered with `downcast_ref`.
pub type StepResult = anyhow::Result<()>;

type ChainFn = dyn Fn(&mut Context, &mut Next<'_>) -> StepResult + Send + Sync;
type TerminalFn = dyn Fn(&mut Context) -> StepResult + Send + Sync;

/// One entry of an execution stack: a middleware or a handler.
///
/// The variant decides how the executor drives the entry:
///
/// - [`Step::Chaining`] receives a one-shot [`Next`] and continues the chain
///   only by calling [`Next::run`]. Not calling it truncates the chain.
/// - [`Step::Terminal`] receives the context only. The chain never advances
///   past it.
///
/// Steps are reference counted; cloning a step clones the handle, and
/// [`Step::ptr_eq`] compares identity.
#[derive(Clone)]
pub enum Step {
    Chaining(Arc<ChainFn>),
    Terminal(Arc<TerminalFn>),
}

impl Step {
    /// Wrap a closure that takes the continuation.
    ///
    /// ```rust
    /// use signalrouter::middleware::Step;
    ///
    /// let audit = Step::chain(|ctx, next| {
    ///     ctx.res.header("x-audited", "1");
    ///     next.run(ctx)
    /// });
    /// assert!(audit.is_chaining());
    /// ```
    pub fn chain<F>(f: F) -> Self
    where
        F: Fn(&mut Context, &mut Next<'_>) -> StepResult + Send + Sync + 'static,
    {
        Step::Chaining(Arc::new(f))
    }

    /// Wrap a closure that ends the chain.
    ///
    /// ```rust
    /// use signalrouter::middleware::Step;
    ///
    /// let hello = Step::terminal(|ctx| {
    ///     ctx.res.text("hello")?;
    ///     Ok(())
    /// });
    /// assert!(!hello.is_chaining());
    /// ```
    pub fn terminal<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> StepResult + Send + Sync + 'static,
    {
        Step::Terminal(Arc::new(f))
    }

    #[must_use]
    pub fn is_chaining(&self) -> bool {
        matches!(self, Step::Chaining(_))
    }

    /// True when both handles point at the same callable.
    #[must_use]
    pub fn ptr_eq(&self, other: &Step) -> bool {
        match (self, other) {
            (Step::Chaining(a), Step::Chaining(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Step::Terminal(a), Step::Terminal(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Chaining(inner) => write!(f, "Step::Chaining({:p})", Arc::as_ptr(inner)),
            Step::Terminal(inner) => write!(f, "Step::Terminal({:p})", Arc::as_ptr(inner)),
        }
    }
}
