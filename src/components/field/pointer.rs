//! Pointer interaction: smoothing, idle debounce and the induced force field.
//!
//! Two states. Any move event makes the controller `Active` and restarts a
//! 150 ms debounce; when the debounce elapses with no further moves it drops
//! back to `Idle`. While active the smoothed position chases the raw input with
//! exponential smoothing and the force strength ramps to 1. While idle the
//! strength decays quickly to zero and trail emission stops.

use super::config::EngineConfig;
use super::stars::Star;
use super::types::Point;

/// Time without movement before the pointer counts as idle.
pub const IDLE_DEBOUNCE_MS: f64 = 150.0;

/// Smoothing speed for the pointer position (1/s). ~95% in 60 ms.
const FOLLOW_SPEED: f64 = 50.0;
/// Strength ramp while active (1/s).
const RAMP_UP_SPEED: f64 = 20.0;
/// Strength decay while idle (1/s). Falls below 1% in ~25 ms.
const IDLE_DECAY_SPEED: f64 = 200.0;
/// Strength below which the field is switched off entirely.
const STRENGTH_EPSILON: f64 = 1e-3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InteractionState {
	#[default]
	Idle,
	Active,
}

/// Read-only view of the pointer handed to the layers each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
	/// Smoothed position, the origin of the force field.
	pub position: Point,
	/// Force multiplier in `[0, 1]`.
	pub strength: f64,
	pub state: InteractionState,
	/// False until the first move event; the field is off while false.
	pub present: bool,
}

impl PointerState {
	/// A pointer held at `position` with a fixed field strength.
	pub fn pinned(position: Point, strength: f64) -> Self {
		Self {
			position,
			strength: strength.clamp(0.0, 1.0),
			state: InteractionState::Active,
			present: true,
		}
	}

	pub fn is_active(&self) -> bool {
		self.state == InteractionState::Active
	}

	/// Writes the pointer distance and repulsion displacement of one star.
	///
	/// Displacement is `repulsion * (radius - d) / radius`, scaled by field
	/// strength and by the star's parallax so near stars move more.
	pub fn induce(&self, star: &mut Star, config: &EngineConfig) {
		if !self.present {
			star.pointer_distance = f64::INFINITY;
			star.push = Point::default();
			return;
		}
		let d = star.position.distance(self.position);
		star.pointer_distance = d;

		let radius = config.interaction_radius;
		if self.strength <= 0.0 || d >= radius {
			star.push = Point::default();
			return;
		}
		let falloff = (radius - d) / radius;
		let (ux, uy) = if d > 1e-6 {
			((star.position.x - self.position.x) / d, (star.position.y - self.position.y) / d)
		} else {
			(0.0, -1.0)
		};
		let magnitude = config.repulsion * falloff * self.strength * (0.4 + 0.6 * star.parallax());
		star.push = Point::new(ux * magnitude, uy * magnitude);
	}

	/// Shift applied to a whole layer with the given parallax factor (0..1),
	/// proportional to the pointer's offset from the viewport center.
	pub fn parallax_offset(&self, center: Point, factor: f64, config: &EngineConfig) -> Point {
		if !self.present || center.x <= 0.0 || center.y <= 0.0 {
			return Point::default();
		}
		let nx = ((self.position.x - center.x) / center.x).clamp(-1.0, 1.0);
		let ny = ((self.position.y - center.y) / center.y).clamp(-1.0, 1.0);
		let shift = config.parallax * factor * self.strength;
		Point::new(-nx * shift, -ny * shift)
	}
}

/// Owns the smoothed pointer state. Fed raw move events, advanced once per tick.
#[derive(Clone, Debug, Default)]
pub struct PointerController {
	raw: Point,
	smoothed: Point,
	strength: f64,
	state: InteractionState,
	present: bool,
	last_move_ms: f64,
}

impl PointerController {
	/// Records a raw move. Idle -> Active, and restarts the debounce.
	pub fn on_move(&mut self, x: f64, y: f64, at_ms: f64) {
		if !x.is_finite() || !y.is_finite() {
			return;
		}
		self.raw = Point::new(x, y);
		if !self.present {
			self.smoothed = self.raw;
			self.present = true;
		}
		self.state = InteractionState::Active;
		self.last_move_ms = at_ms;
	}

	/// Pointer left the surface: go idle now and let the field decay.
	pub fn on_leave(&mut self) {
		self.state = InteractionState::Idle;
	}

	/// Advances smoothing, debounce and strength. `dt` in seconds.
	pub fn update(&mut self, now_ms: f64, dt: f64) {
		let quiet_ms = now_ms - self.last_move_ms;
		if self.state == InteractionState::Active && quiet_ms >= IDLE_DEBOUNCE_MS {
			self.state = InteractionState::Idle;
		}

		match self.state {
			InteractionState::Active => {
				let follow = 1.0 - (-FOLLOW_SPEED * dt).exp();
				self.smoothed = self.smoothed.lerp(self.raw, follow);
				let ramp = 1.0 - (-RAMP_UP_SPEED * dt).exp();
				self.strength += (1.0 - self.strength) * ramp;
			}
			InteractionState::Idle => {
				self.strength *= (-IDLE_DECAY_SPEED * dt).exp();
				if self.strength < STRENGTH_EPSILON {
					self.strength = 0.0;
				}
			}
		}
		self.strength = self.strength.clamp(0.0, 1.0);
	}

	pub fn state(&self) -> InteractionState {
		self.state
	}

	pub fn snapshot(&self) -> PointerState {
		PointerState {
			position: self.smoothed,
			strength: self.strength,
			state: self.state,
			present: self.present,
		}
	}
}
