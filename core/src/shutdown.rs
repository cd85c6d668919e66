//! Shutdown controller shared by the crawler tasks.
//!
//! Shutdown is triggered once, with a reason. Every task waiting on the
//! [`Signal`] is woken up, and futures wrapped with [`Controller::with_cancel`]
//! are dropped, resolving to the shutdown reason.

use std::{
	fmt,
	future::Future,
	mem,
	sync::{Arc, Mutex, MutexGuard, PoisonError},
	task::Waker,
};
use tracing::info;

pub use self::signal::Signal;

mod signal;

/// Thread safe shutdown controller. Clones share the same shutdown state.
#[derive(Clone)]
pub struct Controller<T: Clone> {
	inner: Arc<Mutex<ControllerInner<T>>>,
}

impl<T: Clone> Controller<T> {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(Mutex::new(ControllerInner {
				reason: None,
				on_shutdown_trigger: Vec::new(),
			})),
		}
	}

	fn lock(&self) -> MutexGuard<'_, ControllerInner<T>> {
		lock(&self.inner)
	}

	pub fn is_shutdown_triggered(&self) -> bool {
		self.lock().reason.is_some()
	}

	/// Returns [`None`] if the shutdown has not been triggered yet.
	pub fn shutdown_reason(&self) -> Option<T> {
		self.lock().reason.clone()
	}

	/// Triggers the shutdown, waking up all pending [`Signal`] futures.
	///
	/// If the shutdown has already been triggered, this function returns an error.
	pub fn trigger_shutdown(&self, reason: T) -> Result<(), ShutdownHasStarted<T>> {
		let mut inner = self.lock();
		if let Some(original) = &inner.reason {
			return Err(ShutdownHasStarted {
				reason: original.clone(),
				ignored: reason,
			});
		}
		inner.reason = Some(reason);
		for waker in mem::take(&mut inner.on_shutdown_trigger) {
			waker.wake();
		}
		Ok(())
	}

	/// Returns a future which resolves to the shutdown reason once the shutdown is triggered.
	pub fn triggered_shutdown(&self) -> Signal<T> {
		Signal {
			inner: self.inner.clone(),
		}
	}

	/// Wraps a future to cancel it upon a triggered shutdown.
	///
	/// Resolves to `Err(reason)` if the shutdown is triggered before the wrapped future completes.
	pub fn with_cancel<F: Future>(&self, future: F) -> impl Future<Output = Result<F::Output, T>> {
		let signal = self.triggered_shutdown();
		async move {
			tokio::pin!(future);
			tokio::select! {
				biased;
				reason = signal => Err(reason),
				value = &mut future => Ok(value),
			}
		}
	}
}

impl<T: Clone + fmt::Display> Controller<T> {
	/// Triggers the shutdown with given reason upon receiving a termination signal.
	pub fn on_user_signal(&self, reason: T) -> impl Future<Output = ()> {
		let controller = self.clone();
		async move {
			user_signal().await;
			info!("{reason}");
			let _ = controller.trigger_shutdown(reason);
		}
	}
}

impl<T: Clone> Default for Controller<T> {
	fn default() -> Self {
		Self::new()
	}
}

pub(crate) struct ControllerInner<T> {
	reason: Option<T>,
	/// Tasks to wake up when the shutdown is triggered
	on_shutdown_trigger: Vec<Waker>,
}

fn lock<T>(inner: &Mutex<ControllerInner<T>>) -> MutexGuard<'_, ControllerInner<T>> {
	// state is consistent after every mutation, so poisoned lock is still usable
	inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Error returned when the shutdown is triggered more than once.
#[derive(Debug, Clone)]
pub struct ShutdownHasStarted<T> {
	/// Reason of the already triggered shutdown
	pub reason: T,
	/// Reason ignored because the shutdown has already been triggered
	pub ignored: T,
}

impl<T: fmt::Debug> std::error::Error for ShutdownHasStarted<T> {}

impl<T> fmt::Display for ShutdownHasStarted<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "shutdown has already been triggered")
	}
}

/// Completes upon receiving Ctrl-C, or SIGTERM on Unix systems.
pub async fn user_signal() {
	let ctrl_c = tokio::signal::ctrl_c();

	#[cfg(unix)]
	{
		let terminate = async {
			let mut signal =
				tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
			signal.recv().await;
			std::io::Result::Ok(())
		};

		tokio::select! {
			_ = ctrl_c => {},
			_ = terminate => {},
		}
	}

	#[cfg(not(unix))]
	{
		let _ = ctrl_c.await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{future, time::Duration};
	use tokio::time::{sleep, timeout};

	#[tokio::test]
	async fn shutdown_trigger() {
		let controller = Controller::new();
		assert!(!controller.is_shutdown_triggered());
		assert!(controller.trigger_shutdown(1).is_ok());
		assert!(controller.is_shutdown_triggered());
		assert_eq!(controller.triggered_shutdown().await, 1);
		assert_eq!(controller.shutdown_reason(), Some(1));
	}

	#[tokio::test]
	async fn shutdown_trigger_from_other_task() {
		let controller = Controller::new();

		tokio::spawn({
			let controller = controller.clone();
			async move {
				sleep(Duration::from_millis(20)).await;
				assert!(controller.trigger_shutdown(22).is_ok());
			}
		});

		let reason = timeout(Duration::from_millis(500), controller.triggered_shutdown()).await;
		assert_eq!(reason.unwrap(), 22);
	}

	#[test]
	fn shutdown_only_once() {
		let controller = Controller::new();
		assert!(controller.trigger_shutdown("first").is_ok());

		let Err(ShutdownHasStarted { reason, ignored }) = controller.trigger_shutdown("second")
		else {
			panic!("Expected ShutdownHasStarted error");
		};
		assert_eq!(reason, "first");
		assert_eq!(ignored, "second");
	}

	#[tokio::test]
	async fn with_cancel_completes_before_shutdown() {
		let controller = Controller::<String>::new();
		assert_eq!(controller.with_cancel(async { 42 }).await, Ok(42));
	}

	#[tokio::test]
	async fn with_cancel_is_canceled_on_shutdown() {
		let controller = Controller::new();

		tokio::spawn({
			let controller = controller.clone();
			async move {
				sleep(Duration::from_millis(10)).await;
				let _ = controller.trigger_shutdown("stop".to_string());
			}
		});

		let result = timeout(
			Duration::from_millis(500),
			controller.with_cancel(future::pending::<()>()),
		)
		.await;
		assert_eq!(result.unwrap(), Err("stop".to_string()));
	}
}
