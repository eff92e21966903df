//! Trail and ambient particles: short-lived sparks that fade as they age.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use rand::Rng;

use super::config::EngineConfig;
use super::layer::{FieldLayer, FieldRng, LayerContext};
use super::theme::{Color, Palette};
use super::types::{Point, Viewport};

/// A single decaying particle.
#[derive(Clone, Debug)]
pub struct Particle {
	pub position: Point,
	/// px/s
	pub velocity: Point,
	/// Velocity kept per 1/60 s.
	pub drag: f64,
	pub life: f64,
	pub max_life: f64,
	pub size: f64,
	pub color: Color,
}

impl Particle {
	/// `life / max_life`, clamped.
	pub fn opacity(&self) -> f64 {
		if self.max_life <= 0.0 {
			return 0.0;
		}
		(self.life / self.max_life).clamp(0.0, 1.0)
	}
}

/// Manages live particles. Oldest particles are evicted first at the cap.
#[derive(Default)]
pub struct ParticleSystem {
	pub particles: VecDeque<Particle>,
	cap: usize,
	/// Fractional emissions carried over between ticks.
	trail_carry: f64,
	ambient_carry: f64,
}

impl ParticleSystem {
	/// Emits `count` particles at `origin`, evicting the oldest to stay under
	/// the cap. Returns how many were added.
	pub fn spawn(
		&mut self,
		origin: Point,
		count: usize,
		palette: &Palette,
		rng: &mut FieldRng,
	) -> usize {
		let n = count.min(self.cap);
		for _ in 0..n {
			if self.particles.len() >= self.cap {
				self.particles.pop_front();
			}
			self.particles.push_back(spark(origin, palette, rng));
		}
		n
	}

	fn emit_ambient(
		&mut self,
		viewport: Viewport,
		count: usize,
		palette: &Palette,
		rng: &mut FieldRng,
	) {
		for _ in 0..count {
			let at = Point::new(
				rng.random_range(0.0..=viewport.width),
				rng.random_range(0.0..=viewport.height),
			);
			self.spawn(at, 1, palette, rng);
		}
	}
}

fn spark(origin: Point, palette: &Palette, rng: &mut FieldRng) -> Particle {
	let angle = rng.random_range(0.0..TAU);
	let speed = rng.random_range(10.0..60.0);
	let life = rng.random_range(0.6..1.6);
	// Mostly accent sparks, a few in star colors.
	let color = if rng.random_bool(0.7) {
		palette.accent
	} else {
		palette.star(rng.random_range(0..palette.stars.len().max(1)))
	};
	Particle {
		position: origin.offset(rng.random_range(-4.0..4.0), rng.random_range(-4.0..4.0)),
		velocity: Point::new(angle.cos() * speed, angle.sin() * speed),
		drag: rng.random_range(0.92..0.98),
		life,
		max_life: life,
		size: rng.random_range(0.8..2.2),
		color,
	}
}

impl FieldLayer for ParticleSystem {
	fn populate(
		&mut self,
		viewport: Viewport,
		_palette: &Palette,
		config: &EngineConfig,
		_rng: &mut FieldRng,
	) {
		self.clear();
		self.cap = if viewport.is_empty() { 0 } else { config.particle_cap };
	}

	fn update(&mut self, ctx: &LayerContext<'_>, rng: &mut FieldRng) {
		let dt = ctx.dt;
		for p in &mut self.particles {
			p.position.x += p.velocity.x * dt;
			p.position.y += p.velocity.y * dt;
			let keep = p.drag.powf(dt * 60.0);
			p.velocity.x *= keep;
			p.velocity.y *= keep;
			p.life -= dt;
		}
		self.particles.retain(|p| p.life > 0.0);

		if ctx.viewport.is_empty() {
			return;
		}

		if ctx.pointer.present && ctx.pointer.is_active() {
			self.trail_carry += ctx.config.trail_rate * dt;
			let n = self.trail_carry.floor();
			self.trail_carry -= n;
			self.spawn(ctx.pointer.position, n as usize, ctx.palette, rng);
		} else {
			self.trail_carry = 0.0;
		}

		self.ambient_carry += ctx.config.ambient_rate * dt;
		let n = self.ambient_carry.floor();
		self.ambient_carry -= n;
		self.emit_ambient(ctx.viewport, n as usize, ctx.palette, rng);
	}

	fn len(&self) -> usize {
		self.particles.len()
	}

	fn clear(&mut self) {
		self.particles.clear();
		self.trail_carry = 0.0;
		self.ambient_carry = 0.0;
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;

	use super::*;
	use crate::components::field::config::Intensity;
	use crate::components::field::pointer::{InteractionState, PointerState};

	fn system(config: &EngineConfig, rng: &mut FieldRng) -> ParticleSystem {
		let mut ps = ParticleSystem::default();
		ps.populate(Viewport::new(800.0, 600.0), &Palette::night(), config, rng);
		ps
	}

	#[test]
	fn spawn_evicts_oldest_at_cap() {
		let config = EngineConfig {
			particle_cap: 5,
			..EngineConfig::default()
		};
		let mut rng = FieldRng::seed_from_u64(1);
		let mut ps = system(&config, &mut rng);
		ps.spawn(Point::new(0.0, 0.0), 5, &Palette::night(), &mut rng);
		let added = ps.spawn(Point::new(500.0, 500.0), 3, &Palette::night(), &mut rng);
		assert_eq!(added, 3);
		assert_eq!(ps.len(), 5);
		// The two survivors from the first batch sit at the front.
		assert!(ps.particles[0].position.x < 10.0);
		assert!(ps.particles[4].position.x > 490.0);
	}

	#[test]
	fn particles_fade_and_die() {
		let config = EngineConfig {
			ambient_rate: 0.0,
			..EngineConfig::default()
		};
		let mut rng = FieldRng::seed_from_u64(2);
		let mut ps = system(&config, &mut rng);
		ps.spawn(Point::new(100.0, 100.0), 20, &Palette::night(), &mut rng);
		let pointer = PointerState::default();
		let palette = Palette::night();
		for i in 0..120 {
			let ctx = LayerContext {
				dt: 1.0 / 60.0,
				time: i as f64 / 60.0,
				viewport: Viewport::new(800.0, 600.0),
				palette: &palette,
				pointer: &pointer,
				config: &config,
				intensity: Intensity::Medium,
			};
			ps.update(&ctx, &mut rng);
			assert!(ps.particles.iter().all(|p| (0.0..=1.0).contains(&p.opacity())));
		}
		assert!(ps.is_empty());
	}

	#[test]
	fn trail_follows_active_pointer_only() {
		let config = EngineConfig {
			ambient_rate: 0.0,
			trail_rate: 60.0,
			..EngineConfig::default()
		};
		let mut rng = FieldRng::seed_from_u64(3);
		let mut ps = system(&config, &mut rng);
		let palette = Palette::morning();
		let mut pointer = PointerState::pinned(Point::new(300.0, 200.0), 1.0);
		let step = |ps: &mut ParticleSystem, pointer: &PointerState, rng: &mut FieldRng| {
			let ctx = LayerContext {
				dt: 0.1,
				time: 0.0,
				viewport: Viewport::new(800.0, 600.0),
				palette: &palette,
				pointer,
				config: &config,
				intensity: Intensity::Medium,
			};
			ps.update(&ctx, rng);
		};
		step(&mut ps, &pointer, &mut rng);
		assert_eq!(ps.len(), 6);

		pointer.state = InteractionState::Idle;
		let before = ps.len();
		step(&mut ps, &pointer, &mut rng);
		assert!(ps.len() <= before);
	}
}
