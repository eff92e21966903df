//! Frame scheduler: start/stop and delta-time bookkeeping for the frame loop.
//!
//! The scheduler never calls the host's frame primitive on its own. It is fed
//! each frame callback through [`FrameScheduler::on_frame`] and asks a
//! [`FrameHost`] for the next one only while active. Stopping cancels the
//! pending callback, so nothing keeps ticking after deactivation.

use log::info;

use super::pool::MAX_DT_MS;

/// The host's "next frame" primitive (`requestAnimationFrame` in a browser).
pub trait FrameHost {
	/// Requests one callback. `None` if the host refused.
	fn request_frame(&mut self) -> Option<i32>;

	fn cancel_frame(&mut self, handle: i32);
}

/// Owns the running flag, the pending callback handle and the last timestamp.
#[derive(Clone, Debug, Default)]
pub struct FrameScheduler {
	active: bool,
	last_timestamp: Option<f64>,
	pending: Option<i32>,
	ticks: u64,
}

impl FrameScheduler {
	/// Starts requesting frames. Idempotent: a running scheduler keeps its
	/// single pending callback.
	pub fn start(&mut self, host: &mut dyn FrameHost) {
		if !self.active {
			info!("field: scheduler started");
			self.active = true;
			// A resumed loop derives dt from a fresh timestamp.
			self.last_timestamp = None;
		}
		if self.pending.is_none() {
			self.pending = host.request_frame();
		}
	}

	/// Stops the loop and releases the pending callback. Idempotent.
	pub fn stop(&mut self, host: &mut dyn FrameHost) {
		if let Some(handle) = self.pending.take() {
			host.cancel_frame(handle);
		}
		if self.active {
			info!("field: scheduler stopped");
		}
		self.active = false;
		self.last_timestamp = None;
	}

	/// Handles one frame callback at `timestamp` ms.
	///
	/// Returns the delta to simulate, or `None` when the callback arrived after
	/// a stop and must not tick. The first frame after a start yields `0.0`.
	/// The next frame is requested before returning.
	pub fn on_frame(&mut self, timestamp: f64, host: &mut dyn FrameHost) -> Option<f64> {
		self.pending = None;
		if !self.active {
			return None;
		}

		let dt = match self.last_timestamp {
			Some(last) if timestamp.is_finite() => (timestamp - last).clamp(0.0, MAX_DT_MS),
			_ => 0.0,
		};
		if timestamp.is_finite() {
			self.last_timestamp = Some(timestamp);
		}
		self.ticks += 1;
		self.pending = host.request_frame();
		Some(dt)
	}

	pub fn is_active(&self) -> bool {
		self.active
	}

	/// True while a frame callback is outstanding.
	pub fn has_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Frames that produced a tick since creation.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Default)]
	struct FakeHost {
		next: i32,
		live: Vec<i32>,
		cancelled: Vec<i32>,
	}

	impl FrameHost for FakeHost {
		fn request_frame(&mut self) -> Option<i32> {
			self.next += 1;
			self.live.push(self.next);
			Some(self.next)
		}

		fn cancel_frame(&mut self, handle: i32) {
			self.live.retain(|h| *h != handle);
			self.cancelled.push(handle);
		}
	}

	#[test]
	fn start_is_idempotent() {
		let mut host = FakeHost::default();
		let mut scheduler = FrameScheduler::default();
		scheduler.start(&mut host);
		scheduler.start(&mut host);
		assert!(scheduler.is_active());
		assert_eq!(host.live, vec![1]);
	}

	#[test]
	fn first_frame_has_zero_dt_then_real_deltas() {
		let mut host = FakeHost::default();
		let mut scheduler = FrameScheduler::default();
		scheduler.start(&mut host);
		assert_eq!(scheduler.on_frame(1000.0, &mut host), Some(0.0));
		assert_eq!(scheduler.on_frame(1016.0, &mut host), Some(16.0));
		// A long stall is clamped.
		assert_eq!(scheduler.on_frame(5000.0, &mut host), Some(MAX_DT_MS));
		assert!(scheduler.has_pending());
	}

	#[test]
	fn stop_cancels_pending_and_late_callbacks_do_not_tick() {
		let mut host = FakeHost::default();
		let mut scheduler = FrameScheduler::default();
		scheduler.start(&mut host);
		scheduler.on_frame(0.0, &mut host);
		let pending = host.next;

		scheduler.stop(&mut host);
		scheduler.stop(&mut host);
		assert_eq!(host.cancelled, vec![pending]);
		assert!(!scheduler.has_pending());

		let ticks = scheduler.ticks();
		for t in 1..100 {
			assert_eq!(scheduler.on_frame(t as f64 * 16.0, &mut host), None);
		}
		assert_eq!(scheduler.ticks(), ticks);
		assert!(!scheduler.has_pending());
	}

	#[test]
	fn stop_before_any_frame_releases_the_request() {
		let mut host = FakeHost::default();
		let mut scheduler = FrameScheduler::default();
		scheduler.start(&mut host);
		assert_eq!(host.live, vec![1]);

		scheduler.stop(&mut host);
		assert!(host.live.is_empty());
		assert_eq!(host.cancelled, vec![1]);
		assert!(!scheduler.is_active());
		assert_eq!(scheduler.on_frame(16.0, &mut host), None);
		assert!(host.live.is_empty());
	}

	#[test]
	fn resume_uses_a_fresh_timestamp() {
		let mut host = FakeHost::default();
		let mut scheduler = FrameScheduler::default();
		scheduler.start(&mut host);
		scheduler.on_frame(100.0, &mut host);
		scheduler.on_frame(116.0, &mut host);
		scheduler.stop(&mut host);

		scheduler.start(&mut host);
		assert_eq!(scheduler.on_frame(60_000.0, &mut host), Some(0.0));
		assert_eq!(scheduler.on_frame(60_016.0, &mut host), Some(16.0));
	}
}
