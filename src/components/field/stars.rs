//! Starfield layer: thousands of drifting, twinkling points in three depth bands.
//!
//! Stars are never destroyed. When one drifts past the extended viewport edge
//! it re-enters from the opposite side, so the population stays exactly
//! constant between rebuilds.

use std::f64::consts::TAU;

use rand::Rng;

use super::config::EngineConfig;
use super::layer::{FieldLayer, FieldRng, LayerContext};
use super::theme::{Color, Palette};
use super::types::{Point, Viewport};

/// Virtual depth range. Only used for parallax and brightness scaling.
pub const MAX_DEPTH: f64 = 1000.0;

/// Number of depth bands (0 = back, 1 = mid, 2 = front).
pub const STAR_LAYERS: usize = 3;

/// Angular speed (rad/s) of the orbital wobble.
const WOBBLE_SPEED: f64 = 0.8;

/// Rate at which displayed opacity chases its target (1/s).
const OPACITY_EASE: f64 = 8.0;

/// A single star.
#[derive(Clone, Debug)]
pub struct Star {
	pub position: Point,
	/// Virtual depth, 0 (nearest) to [`MAX_DEPTH`] (farthest).
	pub z: f64,
	/// Drift in px/s.
	pub velocity: Point,
	pub size: f64,
	pub color: Color,
	pub twinkle_phase: f64,
	pub twinkle_speed: f64,
	pub wobble_phase: f64,
	pub brightness: f64,
	pub layer: usize,
	pub opacity: f64,
	pub target_opacity: f64,
	/// Written by the pointer controller each tick.
	pub pointer_distance: f64,
	/// Repulsion displacement induced by the pointer, written by the pointer
	/// controller each tick.
	pub push: Point,
}

impl Star {
	/// Brightness scale from depth: far stars are dimmer (0.4..1.0).
	pub fn depth_factor(&self) -> f64 {
		1.0 - (self.z / MAX_DEPTH).clamp(0.0, 1.0) * 0.6
	}

	/// How strongly pointer motion moves this star (0 = far, 1 = near).
	pub fn parallax(&self) -> f64 {
		1.0 - (self.z / MAX_DEPTH).clamp(0.0, 1.0)
	}

	/// Where the star is drawn this frame.
	pub fn draw_position(&self) -> Point {
		self.position.offset(self.push.x, self.push.y)
	}

	/// `0.5 + 0.5 * sin(phase + t * speed)`
	pub fn twinkle(&self, time: f64) -> f64 {
		0.5 + 0.5 * (self.twinkle_phase + time * self.twinkle_speed).sin()
	}
}

/// Manages the star population of one engine.
#[derive(Default)]
pub struct StarLayer {
	pub stars: Vec<Star>,
	/// Upper bound for `spawn`, fixed at populate time.
	cap: usize,
	/// Bounds spawned stars are wrapped into, fixed at populate time.
	viewport: Viewport,
}

impl StarLayer {
	/// Stars of one depth band, in spawn order.
	pub fn in_layer(&self, layer: usize) -> impl Iterator<Item = &Star> {
		self.stars.iter().filter(move |s| s.layer == layer)
	}

	/// Adds up to `count` stars scattered around `origin`, skipping once the
	/// layer is at its cap. Positions outside the viewport margin are wrapped
	/// back in. Returns how many were added.
	pub fn spawn(
		&mut self,
		origin: Point,
		count: usize,
		palette: &Palette,
		config: &EngineConfig,
		rng: &mut FieldRng,
	) -> usize {
		let room = self.cap.saturating_sub(self.stars.len());
		let n = count.min(room);
		for _ in 0..n {
			let jitter = Point::new(rng.random_range(-20.0..20.0), rng.random_range(-20.0..20.0));
			let mut position = origin.offset(jitter.x, jitter.y);
			self.viewport.wrap(&mut position, config.wrap_margin);
			let star = random_star(position, palette, config, rng);
			self.stars.push(star);
		}
		n
	}
}

fn random_star(
	position: Point,
	palette: &Palette,
	config: &EngineConfig,
	rng: &mut FieldRng,
) -> Star {
	// Back band is the most populated, like real sky depth.
	let roll: f64 = rng.random();
	let layer = if roll < 0.5 {
		0
	} else if roll < 0.8 {
		1
	} else {
		2
	};
	let (z_min, z_max, size_min, size_max) = match layer {
		0 => (600.0, MAX_DEPTH, 0.4, 1.0),
		1 => (300.0, 600.0, 0.8, 1.6),
		_ => (0.0, 300.0, 1.2, 2.4),
	};
	let z = rng.random_range(z_min..z_max);
	let near = 1.0 - z / MAX_DEPTH;
	let angle = rng.random_range(0.0..TAU);
	let speed = config.star_speed * (0.3 + 0.7 * near) * rng.random_range(0.5..1.0);
	let brightness = rng.random_range(0.55..1.0);

	Star {
		position,
		z,
		velocity: Point::new(angle.cos() * speed, angle.sin() * speed),
		size: rng.random_range(size_min..size_max),
		color: palette.star(rng.random_range(0..palette.stars.len().max(1))),
		twinkle_phase: rng.random_range(0.0..TAU),
		twinkle_speed: rng.random_range(0.6..2.4),
		wobble_phase: rng.random_range(0.0..TAU),
		brightness,
		layer,
		opacity: 0.0,
		target_opacity: 0.0,
		pointer_distance: f64::INFINITY,
		push: Point::default(),
	}
}

impl FieldLayer for StarLayer {
	fn populate(
		&mut self,
		viewport: Viewport,
		palette: &Palette,
		config: &EngineConfig,
		rng: &mut FieldRng,
	) {
		self.stars.clear();
		self.viewport = viewport;
		self.cap = if viewport.is_empty() { 0 } else { config.star_count.max };
		let count = config.star_count.for_area(viewport.area(), config.star_area);
		self.stars.reserve(count);
		for _ in 0..count {
			let position = Point::new(
				rng.random_range(0.0..=viewport.width),
				rng.random_range(0.0..=viewport.height),
			);
			self.stars.push(random_star(position, palette, config, rng));
		}
	}

	fn update(&mut self, ctx: &LayerContext<'_>, rng: &mut FieldRng) {
		let dt = ctx.dt;
		let margin = ctx.config.wrap_margin;
		let wobble = ctx.config.star_wobble * WOBBLE_SPEED;
		let ease = 1.0 - (-OPACITY_EASE * dt).exp();

		for star in &mut self.stars {
			let phase = ctx.time * WOBBLE_SPEED + star.wobble_phase;
			star.position.x += (star.velocity.x + phase.cos() * wobble) * dt;
			star.position.y += (star.velocity.y + phase.sin() * wobble) * dt;

			if ctx.viewport.wrap(&mut star.position, margin) {
				// A wrapped star counts as respawned and picks up the current palette.
				star.color = ctx.palette.star(rng.random_range(0..ctx.palette.stars.len().max(1)));
			}

			ctx.pointer.induce(star, ctx.config);

			let radius = ctx.config.interaction_radius;
			let glow = if star.pointer_distance < radius {
				(1.0 - star.pointer_distance / radius) * 0.5 * ctx.pointer.strength
			} else {
				0.0
			};
			let base = star.brightness * star.twinkle(ctx.time) * star.depth_factor();
			star.target_opacity = (base + glow).clamp(0.0, 1.0);
			star.opacity += (star.target_opacity - star.opacity) * ease;
			star.opacity = star.opacity.clamp(0.0, 1.0);
		}
	}

	fn len(&self) -> usize {
		self.stars.len()
	}

	fn clear(&mut self) {
		self.stars.clear();
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;

	use super::*;
	use crate::components::field::config::{CountRange, Intensity};
	use crate::components::field::pointer::PointerState;

	fn layer(width: f64, height: f64, config: &EngineConfig, rng: &mut FieldRng) -> StarLayer {
		let mut layer = StarLayer::default();
		layer.populate(Viewport::new(width, height), &Palette::night(), config, rng);
		layer
	}

	fn step(
		layer: &mut StarLayer,
		viewport: Viewport,
		pointer: &PointerState,
		time: f64,
		rng: &mut FieldRng,
	) {
		let (palette, config) = (Palette::night(), EngineConfig::default());
		let ctx = LayerContext {
			dt: 1.0 / 60.0,
			time,
			viewport,
			palette: &palette,
			pointer,
			config: &config,
			intensity: Intensity::Medium,
		};
		layer.update(&ctx, rng);
	}

	#[test]
	fn population_respects_bounds() {
		let config = EngineConfig::default();
		let mut rng = FieldRng::seed_from_u64(1);
		for (w, h) in [(1.0, 1.0), (320.0, 240.0), (1920.0, 1080.0), (10_000.0, 10_000.0)] {
			let n = layer(w, h, &config, &mut rng).len();
			assert!(
				(config.star_count.min..=config.star_count.max).contains(&n),
				"{w}x{h} -> {n}"
			);
		}
		assert_eq!(layer(0.0, 500.0, &config, &mut rng).len(), 0);
	}

	#[test]
	fn star_count_is_constant_and_opacity_bounded() {
		let config = EngineConfig::default();
		let mut rng = FieldRng::seed_from_u64(7);
		let viewport = Viewport::new(800.0, 600.0);
		let mut stars = layer(800.0, 600.0, &config, &mut rng);
		let before = stars.len();
		let pointer = PointerState::pinned(Point::new(400.0, 300.0), 1.0);
		for i in 0..600 {
			step(&mut stars, viewport, &pointer, i as f64 / 60.0, &mut rng);
			assert_eq!(stars.len(), before);
			for s in &stars.stars {
				assert!((0.0..=1.0).contains(&s.opacity));
				assert!(viewport.contains_with_margin(s.position, config.wrap_margin));
			}
		}
	}

	#[test]
	fn stars_near_pointer_are_pushed_away() {
		let config = EngineConfig::default();
		let mut rng = FieldRng::seed_from_u64(3);
		let viewport = Viewport::new(400.0, 400.0);
		let small = EngineConfig {
			star_count: CountRange::new(0, 10),
			..config.clone()
		};
		let mut stars = StarLayer::default();
		stars.populate(viewport, &Palette::night(), &small, &mut rng);
		stars.clear();
		let n = stars.spawn(Point::new(210.0, 200.0), 1, &Palette::night(), &config, &mut rng);
		assert_eq!(n, 1);
		stars.stars[0].velocity = Point::default();

		let pointer_at = Point::new(180.0, 200.0);
		let pointer = PointerState::pinned(pointer_at, 1.0);
		step(&mut stars, viewport, &pointer, 0.0, &mut rng);
		let star = &stars.stars[0];
		let before = star.position.distance(pointer_at);
		let after = star.draw_position().distance(pointer_at);
		assert!(after > before, "{after} <= {before}");
	}

	#[test]
	fn far_away_spawn_lands_inside_margin() {
		let config = EngineConfig::default();
		let mut rng = FieldRng::seed_from_u64(12);
		let viewport = Viewport::new(800.0, 600.0);
		let mut stars = layer(viewport.width, viewport.height, &config, &mut rng);
		stars.stars.clear();
		let origins = [
			Point::new(50_000.0, -9_000.0),
			Point::new(-1e7, 1e7),
			Point::new(f64::NAN, 300.0),
		];
		for origin in origins {
			assert_eq!(stars.spawn(origin, 3, &Palette::night(), &config, &mut rng), 3);
		}
		for star in &stars.stars {
			assert!(
				viewport.contains_with_margin(star.position, config.wrap_margin),
				"{:?}",
				star.position
			);
		}
	}

	#[test]
	fn spawn_skips_at_cap() {
		let config = EngineConfig::default();
		let mut rng = FieldRng::seed_from_u64(9);
		let mut stars = layer(1920.0, 1080.0, &config, &mut rng);
		let room = config.star_count.max - stars.len();
		let added = stars.spawn(Point::new(5.0, 5.0), room + 50, &Palette::night(), &config, &mut rng);
		assert_eq!(added, room);
		assert_eq!(stars.len(), config.star_count.max);
	}
}
