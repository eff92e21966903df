//! Entity pool: owns every layer and advances them together.

use log::debug;
use rand::SeedableRng;

use super::config::{EngineConfig, Intensity};
use super::layer::{FieldLayer, FieldRng, LayerContext};
use super::lightning::LightningLayer;
use super::nebula::NebulaLayer;
use super::particles::ParticleSystem;
use super::pointer::PointerState;
use super::stars::StarLayer;
use super::theme::Palette;
use super::types::{Point, Viewport};

/// Longest step a single tick may simulate.
pub const MAX_DT_MS: f64 = 100.0;

/// Entity kinds accepted by [`EntityPool::spawn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
	Star,
	Nebula,
	Bolt,
	Particle,
}

/// All live entities of one engine, grouped by layer.
pub struct EntityPool {
	pub stars: StarLayer,
	pub nebulas: NebulaLayer,
	pub lightning: LightningLayer,
	pub particles: ParticleSystem,
	config: EngineConfig,
	palette: Palette,
	viewport: Viewport,
	intensity: Intensity,
	rng: FieldRng,
	/// Simulated seconds since creation.
	time: f64,
}

impl EntityPool {
	/// Creates and populates a pool. The same seed always yields the same field.
	pub fn new(viewport: Viewport, palette: Palette, config: &EngineConfig, seed: u64) -> Self {
		let mut pool = Self {
			stars: StarLayer::default(),
			nebulas: NebulaLayer::default(),
			lightning: LightningLayer::default(),
			particles: ParticleSystem::default(),
			config: config.clone(),
			intensity: config.intensity,
			palette: Palette::default(),
			viewport: Viewport::default(),
			rng: FieldRng::seed_from_u64(seed),
			time: 0.0,
		};
		pool.initialize(viewport.width, viewport.height, palette);
		pool
	}

	/// Rebuilds every enabled layer for a `width` x `height` viewport.
	///
	/// A zero-area viewport leaves the pool empty.
	pub fn initialize(&mut self, width: f64, height: f64, palette: Palette) {
		self.viewport = Viewport::new(width, height);
		self.palette = palette;
		self.populate();
	}

	/// Full regeneration at the new size, keeping the current palette.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport = Viewport::new(width, height);
		self.populate();
	}

	/// Swaps the palette without touching live entities. New spawns and
	/// wrapping stars pick up the new colors.
	pub fn set_palette(&mut self, palette: Palette) {
		self.palette = palette;
	}

	/// Changes the lightning tier and trims surplus bolts to the new cap.
	pub fn set_intensity(&mut self, intensity: Intensity) {
		self.intensity = intensity;
		self.lightning.enforce_cap(intensity.max_bolts());
	}

	fn populate(&mut self) {
		let Self {
			stars,
			nebulas,
			lightning,
			particles,
			config,
			palette,
			viewport,
			rng,
			..
		} = self;
		let layers = config.layers;

		let toggled: [(&mut dyn FieldLayer, bool); 4] = [
			(stars, layers.stars),
			(nebulas, layers.nebulas),
			(lightning, layers.lightning),
			(particles, layers.particles),
		];
		for (layer, enabled) in toggled {
			if enabled {
				layer.populate(*viewport, palette, config, rng);
			} else {
				layer.clear();
			}
		}

		debug!(
			"field: populated {}x{}: {} stars, {} nebulas",
			self.viewport.width,
			self.viewport.height,
			self.stars.len(),
			self.nebulas.len()
		);
	}

	/// Appends up to `count` entities of `kind` near `origin`. Disabled layers
	/// and full layers add nothing. Returns how many were added.
	pub fn spawn(&mut self, kind: EntityKind, origin: Point, count: usize) -> usize {
		let layers = self.config.layers;
		let added = match kind {
			EntityKind::Star if layers.stars => {
				self.stars.spawn(origin, count, &self.palette, &self.config, &mut self.rng)
			}
			EntityKind::Nebula if layers.nebulas => {
				self.nebulas.spawn(origin, count, &self.palette, &self.config, &mut self.rng)
			}
			EntityKind::Bolt if layers.lightning => self.lightning.spawn(
				self.viewport,
				origin,
				count,
				self.intensity,
				&self.palette,
				&self.config,
				&mut self.rng,
			),
			EntityKind::Particle if layers.particles => {
				self.particles.spawn(origin, count, &self.palette, &mut self.rng)
			}
			_ => 0,
		};
		if added < count {
			debug!("field: spawn {kind:?} added {added} of {count}");
		}
		added
	}

	/// Advances every enabled layer by `dt_ms`, clamped to `0..=MAX_DT_MS`.
	pub fn tick(&mut self, dt_ms: f64, pointer: &PointerState) {
		let dt_ms = if dt_ms.is_finite() { dt_ms.clamp(0.0, MAX_DT_MS) } else { 0.0 };
		let dt = dt_ms / 1000.0;
		self.time += dt;

		let Self {
			stars,
			nebulas,
			lightning,
			particles,
			config,
			palette,
			viewport,
			intensity,
			rng,
			time,
		} = self;
		let ctx = LayerContext {
			dt,
			time: *time,
			viewport: *viewport,
			palette,
			pointer,
			config,
			intensity: *intensity,
		};
		let layers = config.layers;

		let toggled: [(&mut dyn FieldLayer, bool); 4] = [
			(nebulas, layers.nebulas),
			(stars, layers.stars),
			(lightning, layers.lightning),
			(particles, layers.particles),
		];
		for (layer, enabled) in toggled {
			if enabled {
				layer.update(&ctx, rng);
			}
		}
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn palette(&self) -> &Palette {
		&self.palette
	}

	pub fn intensity(&self) -> Intensity {
		self.intensity
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Simulated seconds since creation.
	pub fn time(&self) -> f64 {
		self.time
	}

	/// Total live entities across all layers.
	pub fn len(&self) -> usize {
		self.stars.len() + self.nebulas.len() + self.lightning.len() + self.particles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
