//! Fluent "run this if locked, that if contended" dispatch.

use std::future::Future;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{instrument, warn};

use crate::coordinator::{LockCoordinator, Scoped};
use crate::error::LockError;
use crate::id::LockId;
use crate::traits::LockStore;

type SyncFn<'a, A, R> = Box<dyn FnOnce(A) -> R + Send + 'a>;
type AsyncFn<'a, A, R> = Box<dyn FnOnce(A) -> BoxFuture<'a, R> + Send + 'a>;

/// One registered callback. `A` is the argument it receives: `()` or the
/// wait hint.
///
/// Unit-producing shapes carry the `Default` constructor of the result type,
/// so every variant yields a `T`.
enum Work<'a, A, T, E> {
    Value(SyncFn<'a, A, Result<T, E>>),
    AsyncValue(AsyncFn<'a, A, Result<T, E>>),
    Unit {
        run: SyncFn<'a, A, Result<(), E>>,
        fill: fn() -> T,
    },
    AsyncUnit {
        run: AsyncFn<'a, A, Result<(), E>>,
        fill: fn() -> T,
    },
}

impl<'a, A, T, E> Work<'a, A, T, E> {
    fn value(f: impl FnOnce(A) -> Result<T, E> + Send + 'a) -> Self {
        Self::Value(Box::new(f))
    }

    fn async_value<Fut>(f: impl FnOnce(A) -> Fut + Send + 'a) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        Self::AsyncValue(Box::new(move |arg| f(arg).boxed()))
    }

    fn unit(f: impl FnOnce(A) -> Result<(), E> + Send + 'a) -> Self
    where
        T: Default,
    {
        Self::Unit {
            run: Box::new(f),
            fill: T::default,
        }
    }

    fn async_unit<Fut>(f: impl FnOnce(A) -> Fut + Send + 'a) -> Self
    where
        T: Default,
        Fut: Future<Output = Result<(), E>> + Send + 'a,
    {
        Self::AsyncUnit {
            run: Box::new(move |arg| f(arg).boxed()),
            fill: T::default,
        }
    }

    async fn run(self, arg: A) -> Result<T, E> {
        match self {
            Self::Value(f) => f(arg),
            Self::AsyncValue(f) => f(arg).await,
            Self::Unit { run, fill } => run(arg).map(|()| fill()),
            Self::AsyncUnit { run, fill } => run(arg).await.map(|()| fill()),
        }
    }
}

/// The contended-branch slot: with or without the wait hint.
enum OnContended<'a, T, E> {
    Plain(Work<'a, (), T, E>),
    WithHint(Work<'a, i64, T, E>),
}

impl<T, E> OnContended<'_, T, E> {
    async fn run(self, wait_hint_seconds: i64) -> Result<T, E> {
        match self {
            // A callback without an argument never sees the hint.
            Self::Plain(work) => work.run(()).await,
            Self::WithHint(work) => work.run(wait_hint_seconds).await,
        }
    }
}

/// Declarative lock usage: bind an identifier, register what to do when the
/// lock is acquired and what to do when it is contended, then
/// [`execute`](FluentLock::execute).
///
/// Created by [`LockCoordinator::lock`]. Each slot holds exactly one callback;
/// registering again replaces the previous one. Callbacks may be synchronous
/// or `async`, may produce the result type `T` or nothing (in which case
/// `T::default()` is returned), and the contended callback may take the wait
/// hint in seconds.
///
/// Callback errors are the caller's own `E`; lock errors are converted into it
/// through `From<LockError>`.
///
/// # Example
///
/// ```rust,ignore
/// coordinator
///     .lock("order-42", None)
///     .on_acquired_async(|| async { write_order().await })
///     .on_contended(|| Err(AppError::Locked))
///     .execute()
///     .await?;
/// ```
#[must_use = "a fluent lock does nothing until `execute` is awaited"]
pub struct FluentLock<'a, S: LockStore, T, E = LockError> {
    coordinator: &'a LockCoordinator<S>,
    id: LockId,
    wait: Option<Duration>,
    on_acquired: Option<Work<'a, (), T, E>>,
    on_contended: Option<OnContended<'a, T, E>>,
}

impl<'a, S: LockStore, T, E> FluentLock<'a, S, T, E> {
    pub(crate) fn new(
        coordinator: &'a LockCoordinator<S>,
        id: LockId,
        wait: Option<Duration>,
    ) -> Self {
        Self {
            coordinator,
            id,
            wait,
            on_acquired: None,
            on_contended: None,
        }
    }

    /// The identifier this declaration will lock.
    pub fn id(&self) -> &LockId {
        &self.id
    }

    /// Runs `f` once the lock is held.
    pub fn on_acquired(mut self, f: impl FnOnce() -> Result<T, E> + Send + 'a) -> Self {
        self.on_acquired = Some(Work::value(move |()| f()));
        self
    }

    /// Runs the future produced by `f` once the lock is held.
    pub fn on_acquired_async<Fut>(mut self, f: impl FnOnce() -> Fut + Send + 'a) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        self.on_acquired = Some(Work::async_value(move |()| f()));
        self
    }

    /// Runs `f` when the lock is held by someone else.
    pub fn on_contended(mut self, f: impl FnOnce() -> Result<T, E> + Send + 'a) -> Self {
        self.on_contended = Some(OnContended::Plain(Work::value(move |()| f())));
        self
    }

    /// Runs the future produced by `f` when the lock is held by someone else.
    pub fn on_contended_async<Fut>(mut self, f: impl FnOnce() -> Fut + Send + 'a) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        self.on_contended = Some(OnContended::Plain(Work::async_value(move |()| f())));
        self
    }

    /// Runs `f` with the wait hint in seconds when the lock is contended.
    pub fn on_contended_with_hint(
        mut self,
        f: impl FnOnce(i64) -> Result<T, E> + Send + 'a,
    ) -> Self {
        self.on_contended = Some(OnContended::WithHint(Work::value(f)));
        self
    }

    /// Runs the future produced by `f` with the wait hint in seconds when the
    /// lock is contended.
    pub fn on_contended_with_hint_async<Fut>(
        mut self,
        f: impl FnOnce(i64) -> Fut + Send + 'a,
    ) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        self.on_contended = Some(OnContended::WithHint(Work::async_value(f)));
        self
    }
}

/// Registrations for callbacks that produce nothing.
impl<'a, S: LockStore, T: Default, E> FluentLock<'a, S, T, E> {
    /// Runs `f` once the lock is held; the result is `T::default()`.
    pub fn on_acquired_unit(mut self, f: impl FnOnce() -> Result<(), E> + Send + 'a) -> Self {
        self.on_acquired = Some(Work::unit(move |()| f()));
        self
    }

    /// Async counterpart of [`on_acquired_unit`](Self::on_acquired_unit).
    pub fn on_acquired_unit_async<Fut>(mut self, f: impl FnOnce() -> Fut + Send + 'a) -> Self
    where
        Fut: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.on_acquired = Some(Work::async_unit(move |()| f()));
        self
    }

    /// Runs `f` when the lock is contended; the result is `T::default()`.
    pub fn on_contended_unit(mut self, f: impl FnOnce() -> Result<(), E> + Send + 'a) -> Self {
        self.on_contended = Some(OnContended::Plain(Work::unit(move |()| f())));
        self
    }

    /// Async counterpart of [`on_contended_unit`](Self::on_contended_unit).
    pub fn on_contended_unit_async<Fut>(mut self, f: impl FnOnce() -> Fut + Send + 'a) -> Self
    where
        Fut: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.on_contended = Some(OnContended::Plain(Work::async_unit(move |()| f())));
        self
    }

    /// Runs `f` with the wait hint when the lock is contended; the result is
    /// `T::default()`.
    pub fn on_contended_unit_with_hint(
        mut self,
        f: impl FnOnce(i64) -> Result<(), E> + Send + 'a,
    ) -> Self {
        self.on_contended = Some(OnContended::WithHint(Work::unit(f)));
        self
    }

    /// Async counterpart of
    /// [`on_contended_unit_with_hint`](Self::on_contended_unit_with_hint).
    pub fn on_contended_unit_with_hint_async<Fut>(
        mut self,
        f: impl FnOnce(i64) -> Fut + Send + 'a,
    ) -> Self
    where
        Fut: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.on_contended = Some(OnContended::WithHint(Work::async_unit(f)));
        self
    }
}

impl<S: LockStore, T, E: From<LockError>> FluentLock<'_, S, T, E> {
    /// Acquires the lock and dispatches to the matching callback.
    ///
    /// * Contended: the contended callback runs once and its result is
    ///   returned. Nothing is released.
    /// * Acquired: the acquired callback runs once, then the lock is released
    ///   whether or not the callback failed. A callback error is returned after
    ///   the release; a release error is returned only if the callback
    ///   succeeded.
    ///
    /// # Errors
    ///
    /// [`LockError::MissingCallback`] if either callback is missing (checked
    /// before the store is contacted), store errors, or the callback's error.
    #[instrument(skip(self), fields(lock.id = %self.id))]
    pub async fn execute(self) -> Result<T, E> {
        let on_acquired = self
            .on_acquired
            .ok_or(LockError::MissingCallback("on_acquired"))?;
        let on_contended = self
            .on_contended
            .ok_or(LockError::MissingCallback("on_contended"))?;

        let handle = match self.coordinator.claim_scoped(self.id, self.wait).await? {
            Scoped::Held(handle) => handle,
            Scoped::Contended(wait_hint_seconds) => {
                return on_contended.run(wait_hint_seconds).await;
            }
        };

        let outcome = on_acquired.run(()).await;
        let released = handle.release().await;

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(release_err)) => Err(release_err.into()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                warn!(error = %release_err, "release after failed callback also failed");
                Err(err)
            }
        }
    }
}
