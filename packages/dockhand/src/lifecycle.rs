// ABOUTME: Handle lifecycle states and the failure reconciliation shared by image and container handles
// ABOUTME: A failed command is followed by an existence probe that decides whether the resource is gone

use crate::error::{DockhandError, Result};
use std::future::Future;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Active,
    /// Terminal; a deleted handle never becomes active again
    Deleted,
}

/// State change a reconciled operation asks its handle to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Deleted,
}

impl LifecycleState {
    pub fn is_deleted(self) -> bool {
        self == LifecycleState::Deleted
    }

    pub fn apply(&mut self, transition: Transition, id: &str) {
        if transition == Transition::Deleted && !self.is_deleted() {
            info!("Marking docker resource {} as deleted", id);
            *self = LifecycleState::Deleted;
        }
    }
}

/// Outcome of an operation together with the state change it implies
#[derive(Debug)]
pub struct Reconciled<T> {
    pub result: Result<T>,
    pub transition: Transition,
}

impl<T> Reconciled<T> {
    fn unchanged(result: Result<T>) -> Self {
        Self {
            result,
            transition: Transition::Unchanged,
        }
    }
}

/// Constructors for the errors reported once a resource is known to be gone
#[derive(Debug, Clone, Copy)]
pub struct GoneErrors {
    pub not_found: fn(String, DockhandError) -> DockhandError,
    pub deleted: fn(String) -> DockhandError,
}

pub const IMAGE_GONE: GoneErrors = GoneErrors {
    not_found: image_not_found,
    deleted: DockhandError::ImageDeleted,
};

pub const CONTAINER_GONE: GoneErrors = GoneErrors {
    not_found: container_not_found,
    deleted: DockhandError::ContainerDeleted,
};

fn image_not_found(id: String, cause: DockhandError) -> DockhandError {
    DockhandError::ImageNotFound {
        id,
        source: Box::new(cause),
    }
}

fn container_not_found(id: String, cause: DockhandError) -> DockhandError {
    DockhandError::ContainerNotFound {
        id,
        source: Box::new(cause),
    }
}

/// Run `action` against a resource, reconciling a command failure with `probe`.
///
/// A deleted handle fails with the `deleted` error and runs nothing. When the
/// action fails with [`DockhandError::CommandFailed`] the probe is asked
/// whether the resource still exists:
///
/// - probe error: that error is returned and the state is left alone
/// - still present: the original failure is returned
/// - absent: `not_found` wrapping the original failure, with [`Transition::Deleted`]
///
/// Any other action error is returned unchanged without probing.
pub async fn reconcile<T, A, AF, P, PF>(
    state: LifecycleState,
    id: &str,
    gone: GoneErrors,
    action: A,
    probe: P,
) -> Reconciled<T>
where
    A: FnOnce() -> AF,
    AF: Future<Output = Result<T>>,
    P: FnOnce() -> PF,
    PF: Future<Output = Result<bool>>,
{
    if state.is_deleted() {
        return Reconciled::unchanged(Err((gone.deleted)(id.to_string())));
    }

    let failure = match action().await {
        Err(e) if e.is_command_failure() => e,
        other => return Reconciled::unchanged(other),
    };

    match probe().await {
        Err(probe_error) => {
            warn!(
                "Could not confirm whether docker resource {} still exists: {}",
                id, probe_error
            );
            Reconciled::unchanged(Err(probe_error))
        }
        Ok(true) => Reconciled::unchanged(Err(failure)),
        Ok(false) => {
            warn!("Docker resource {} no longer exists", id);
            Reconciled {
                result: Err((gone.not_found)(id.to_string(), failure)),
                transition: Transition::Deleted,
            }
        }
    }
}
