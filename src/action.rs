//! Actions: the work an event performs when it is dispatched.
//!
//! Client closures may return either `()` or `Result<(), E>`; both are
//! normalised to [`ActionResult`] when the closure is boxed, so the run loop
//! only ever deals with one shape.

use crate::simulation::SimContext;

/// Boxed error returned by a failing action.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a dispatched action reports back to the run loop.
pub type ActionResult = Result<(), BoxError>;

/// One-shot action stored in the event queue.
pub(crate) type Action = Box<dyn FnOnce(&mut SimContext<'_>) -> ActionResult>;

/// Repeating action owned by a periodic task.
pub(crate) type RepeatingAction = Box<dyn FnMut(&mut SimContext<'_>) -> ActionResult>;

/// Conversion from a closure's return value into an [`ActionResult`].
pub trait IntoActionResult {
    fn into_action_result(self) -> ActionResult;
}

impl IntoActionResult for () {
    #[inline]
    fn into_action_result(self) -> ActionResult {
        Ok(())
    }
}

impl<E> IntoActionResult for Result<(), E>
where
    E: Into<BoxError>,
{
    #[inline]
    fn into_action_result(self) -> ActionResult {
        self.map_err(Into::into)
    }
}

pub(crate) fn boxed_once<F, R>(action: F) -> Action
where
    F: FnOnce(&mut SimContext<'_>) -> R + 'static,
    R: IntoActionResult,
{
    erase_once(move |ctx| action(ctx).into_action_result())
}

pub(crate) fn boxed_repeating<F, R>(mut action: F) -> RepeatingAction
where
    F: FnMut(&mut SimContext<'_>) -> R + 'static,
    R: IntoActionResult,
{
    erase_repeating(move |ctx| action(ctx).into_action_result())
}

fn erase_once<F>(f: F) -> Action
where
    F: FnOnce(&mut SimContext<'_>) -> ActionResult + 'static,
{
    Box::new(f)
}

fn erase_repeating<F>(f: F) -> RepeatingAction
where
    F: FnMut(&mut SimContext<'_>) -> ActionResult + 'static,
{
    Box::new(f)
}
