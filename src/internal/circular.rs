//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use smallvec::SmallVec;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// One registration being produced: the owning container's address plus the key.
///
/// A child resolving its parent's registration of the same key is a
/// different frame, not a cycle.
#[derive(Clone, Copy, PartialEq, Eq)]
struct Frame {
    owner: usize,
    key: Key,
}

// Thread-local resolution state for circular dependency detection
thread_local! {
    static RESOLUTION_TLS: RefCell<SmallVec<[Frame; 16]>> = RefCell::new(SmallVec::new());
}

/// Marks the registration of `key` owned by `owner` as being produced on
/// this thread for the guard's lifetime.
///
/// Entering a registration that is already in progress on the same thread
/// is a cycle. The check runs before the producer is invoked, so a cycle
/// fails fast instead of recursing until the stack overflows.
pub(crate) struct ResolutionGuard {
    frame: Frame,
}

impl ResolutionGuard {
    pub(crate) fn enter(owner: usize, key: Key, max_depth: usize) -> DiResult<Self> {
        let frame = Frame { owner, key };
        RESOLUTION_TLS.with(|tls| {
            let mut stack = tls.borrow_mut();

            // Circular detection BEFORE pushing the new frame
            if stack.iter().any(|f| *f == frame) {
                let mut path: Vec<&'static str> = stack
                    .iter()
                    .skip_while(|f| **f != frame)
                    .map(|f| f.key.display_name())
                    .collect();
                path.push(key.display_name());
                return Err(DiError::Circular(path));
            }

            if stack.len() >= max_depth {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(frame);
            Ok(())
        })?;

        Ok(Self { frame })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            let mut stack = tls.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|f| *f == self.frame) {
                stack.truncate(pos);
            }
        });
    }
}
