//! Nebula layer: a handful of large, soft, slowly rotating blobs.

use std::f64::consts::TAU;

use rand::Rng;

use super::config::EngineConfig;
use super::layer::{FieldLayer, FieldRng, LayerContext};
use super::theme::{Color, Palette};
use super::types::{Point, Viewport};

/// One translucent radial blob.
#[derive(Clone, Debug)]
pub struct Nebula {
	pub position: Point,
	pub radius: f64,
	pub color: Color,
	pub rotation: f64,
	/// Radians per second.
	pub rotation_speed: f64,
	pub velocity: Point,
	pub pulse_phase: f64,
	pub pulse_speed: f64,
	/// 0 (far, barely follows the pointer) to 1 (near).
	pub depth: f64,
	/// Pulse multiplier on the tint's own alpha.
	pub opacity: f64,
}

impl Nebula {
	/// Radius including the current pulse.
	pub fn pulsed_radius(&self) -> f64 {
		self.radius * (1.0 + 0.08 * self.pulse_phase.sin())
	}
}

/// Manages the nebula blobs. Sorted back to front once at populate time;
/// depth never changes afterwards.
#[derive(Default)]
pub struct NebulaLayer {
	pub nebulas: Vec<Nebula>,
	cap: usize,
	viewport: Viewport,
}

impl NebulaLayer {
	/// Adds up to `count` blobs around `origin`, skipping at the cap. An origin
	/// beyond the wrap margin is wrapped back in.
	pub fn spawn(
		&mut self,
		origin: Point,
		count: usize,
		palette: &Palette,
		config: &EngineConfig,
		rng: &mut FieldRng,
	) -> usize {
		let room = self.cap.saturating_sub(self.nebulas.len());
		let n = count.min(room);
		for i in 0..n {
			let index = self.nebulas.len() + i;
			let mut nebula = random_nebula(origin, 200.0, index, palette, config, rng);
			self.viewport.wrap(&mut nebula.position, config.wrap_margin + nebula.radius);
			self.nebulas.push(nebula);
		}
		self.sort_by_depth();
		n
	}

	fn sort_by_depth(&mut self) {
		self.nebulas.sort_by(|a, b| a.depth.total_cmp(&b.depth));
	}
}

fn random_nebula(
	position: Point,
	base_radius: f64,
	index: usize,
	palette: &Palette,
	config: &EngineConfig,
	rng: &mut FieldRng,
) -> Nebula {
	let angle = rng.random_range(0.0..TAU);
	let speed = config.nebula_speed * rng.random_range(0.4..1.0);
	Nebula {
		position,
		radius: base_radius * rng.random_range(0.6..1.4),
		color: palette.nebula(index),
		rotation: rng.random_range(0.0..TAU),
		rotation_speed: rng.random_range(-0.05..0.05),
		velocity: Point::new(angle.cos() * speed, angle.sin() * speed),
		pulse_phase: rng.random_range(0.0..TAU),
		pulse_speed: rng.random_range(0.2..0.6),
		depth: rng.random_range(0.0..1.0),
		opacity: 0.0,
	}
}

impl FieldLayer for NebulaLayer {
	fn populate(
		&mut self,
		viewport: Viewport,
		palette: &Palette,
		config: &EngineConfig,
		rng: &mut FieldRng,
	) {
		self.nebulas.clear();
		self.viewport = viewport;
		self.cap = if viewport.is_empty() { 0 } else { config.nebula_count.max };
		let count = config.nebula_count.for_area(viewport.area(), config.nebula_area);
		let base_radius = viewport.width.max(viewport.height) * 0.22;
		for i in 0..count {
			let position = Point::new(
				rng.random_range(0.0..=viewport.width),
				rng.random_range(0.0..=viewport.height),
			);
			self.nebulas.push(random_nebula(position, base_radius, i, palette, config, rng));
		}
		self.sort_by_depth();
	}

	fn update(&mut self, ctx: &LayerContext<'_>, _rng: &mut FieldRng) {
		for (i, nebula) in self.nebulas.iter_mut().enumerate() {
			nebula.position.x += nebula.velocity.x * ctx.dt;
			nebula.position.y += nebula.velocity.y * ctx.dt;
			nebula.rotation = (nebula.rotation + nebula.rotation_speed * ctx.dt).rem_euclid(TAU);
			nebula.pulse_phase = (nebula.pulse_phase + nebula.pulse_speed * ctx.dt).rem_euclid(TAU);

			// Blobs are big; let them leave fully before re-entering.
			let margin = ctx.config.wrap_margin + nebula.radius;
			if ctx.viewport.wrap(&mut nebula.position, margin) {
				nebula.color = ctx.palette.nebula(i);
			}

			nebula.opacity = (0.75 + 0.25 * nebula.pulse_phase.sin()).clamp(0.0, 1.0);
		}
	}

	fn len(&self) -> usize {
		self.nebulas.len()
	}

	fn clear(&mut self) {
		self.nebulas.clear();
	}
}
