//! Continuation-passing execution of a resolved stack.
//!
//! The chain is driven by [`run_from`], one call per index, so recursion
//! depth never exceeds the stack length. Each index ends in exactly one of:
//!
//! - advanced to the next index (a chaining step called [`Next::run`])
//! - stopped because a response was already committed
//! - stopped because the stack was exhausted
//! - stopped by a chaining step that never advanced, or by a terminal step
//! - failed with the step's error
//!
//! The executor does not catch errors; they surface to the dispatcher.

use std::cell::Cell;

use thiserror::Error;
use tracing::{debug, trace};

use crate::middleware::{Step, StepResult};
use crate::server::Context;

/// Failure raised by the execution engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecError {
    /// A chaining step called its continuation a second time.
    #[error("next() called multiple times by the step at index {index}")]
    DoubleAdvance { index: usize },
}

/// Where a chain came to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// The step at `index` was skipped because a response was committed.
    StoppedByCommit { index: usize },
    /// Every step advanced and the stack ran out.
    StoppedExhausted,
    /// The chaining step at `index` returned without calling its continuation.
    Truncated { index: usize },
    /// The terminal step at `index` ran; terminal steps never advance.
    Terminated { index: usize },
}

/// One-shot continuation handed to a [`Step::Chaining`] step.
pub struct Next<'a> {
    stack: &'a [Step],
    /// Index of the step that will run when the chain advances.
    index: usize,
    advanced: bool,
    state: &'a Cell<ChainState>,
}

impl Next<'_> {
    /// Run the rest of the chain.
    ///
    /// The first call runs the following steps and returns their result.
    /// Any later call fails with [`ExecError::DoubleAdvance`] without running
    /// anything.
    pub fn run(&mut self, ctx: &mut Context) -> StepResult {
        if self.advanced {
            return Err(ExecError::DoubleAdvance {
                index: self.index - 1,
            }
            .into());
        }
        self.advanced = true;
        run_from(self.stack, self.index, ctx, self.state)
    }

    /// Whether [`Next::run`] has been called.
    #[must_use]
    pub fn has_advanced(&self) -> bool {
        self.advanced
    }
}

/// Execute `stack` against `ctx`, starting at index 0.
///
/// Returns where the chain stopped, or the first error raised by a step.
pub fn execute(stack: &[Step], ctx: &mut Context) -> anyhow::Result<ChainState> {
    let state = Cell::new(ChainState::StoppedExhausted);
    run_from(stack, 0, ctx, &state)?;
    let state = state.get();
    debug!(stack_len = stack.len(), state = ?state, "Execution chain finished");
    Ok(state)
}

fn run_from(stack: &[Step], index: usize, ctx: &mut Context, state: &Cell<ChainState>) -> StepResult {
    if ctx.res.is_sent() {
        trace!(index, "Response committed; skipping remaining steps");
        state.set(ChainState::StoppedByCommit { index });
        return Ok(());
    }

    let Some(step) = stack.get(index) else {
        state.set(ChainState::StoppedExhausted);
        return Ok(());
    };

    match step {
        Step::Chaining(f) => {
            let mut next = Next {
                stack,
                index: index + 1,
                advanced: false,
                state,
            };
            f(ctx, &mut next)?;
            if !next.advanced {
                state.set(ChainState::Truncated { index });
            }
        }
        Step::Terminal(f) => {
            f(ctx)?;
            state.set(ChainState::Terminated { index });
        }
    }
    Ok(())
}
