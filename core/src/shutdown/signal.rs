use std::{
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
	task::{Context, Poll},
};

use super::{lock, ControllerInner};

/// Future which completes when the associated [`super::Controller`] triggers the shutdown.
#[derive(Clone)]
pub struct Signal<T: Clone> {
	pub(crate) inner: Arc<Mutex<ControllerInner<T>>>,
}

impl<T: Clone> Future for Signal<T> {
	type Output = T;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let mut inner = lock(&self.inner);

		if let Some(reason) = inner.reason.as_ref() {
			return Poll::Ready(reason.clone());
		}

		inner
			.on_shutdown_trigger
			.retain(|waker| !waker.will_wake(cx.waker()));
		inner.on_shutdown_trigger.push(cx.waker().clone());
		Poll::Pending
	}
}
