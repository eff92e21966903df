//! Engine façade: the one object the host talks to.
//!
//! Host events never touch the pool directly. They are queued as
//! [`EngineCommand`]s and applied at the start of the next [`FieldEngine::tick`],
//! so a resize or theme swap can never land in the middle of a simulation step.

use std::collections::VecDeque;

use log::{debug, info};

use super::config::{EngineConfig, Intensity};
use super::pointer::{InteractionState, PointerController, PointerState};
use super::pool::{EntityKind, EntityPool, MAX_DT_MS};
use super::render::{self, Frame};
use super::surface::DrawSurface;
use super::theme::{self, GradientStop, Palette, ThemeToken};
use super::types::{Point, Viewport};

/// Seed used when the config does not name one.
pub const DEFAULT_SEED: u64 = 0x5eed_f1e1d;

/// Host input, applied at the start of the next tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineCommand {
	Resize { width: f64, height: f64 },
	SetTheme(ThemeToken),
	SetIntensity(Intensity),
	/// Pointer position in surface coordinates, stamped with the event time.
	PointerMove { x: f64, y: f64, at_ms: f64 },
	PointerLeave,
}

/// Background transition after a theme swap.
struct Crossfade {
	/// What was on screen when the swap happened.
	from: Palette,
	elapsed_ms: f64,
	duration_ms: f64,
}

impl Crossfade {
	fn progress(&self) -> f64 {
		let t = (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0);
		t * t * (3.0 - 2.0 * t)
	}

	fn is_done(&self) -> bool {
		self.elapsed_ms >= self.duration_ms
	}
}

/// A complete field: entity pool, pointer controller and pending host input.
pub struct FieldEngine {
	pool: EntityPool,
	pointer: PointerController,
	theme: ThemeToken,
	fade: Option<Crossfade>,
	commands: VecDeque<EngineCommand>,
	ticks: u64,
}

impl FieldEngine {
	/// Builds a populated engine for a `width` x `height` surface.
	pub fn new(config: EngineConfig, width: f64, height: f64) -> Self {
		let config = config.sanitized();
		let theme = config.theme.unwrap_or_default();
		let seed = config.seed.unwrap_or(DEFAULT_SEED);
		let viewport = Viewport::new(width, height);
		let pool = EntityPool::new(viewport, theme::resolve(theme), &config, seed);
		info!(
			"field: engine created ({} preset, {} theme, {} intensity, {}x{})",
			config.preset.name(),
			theme.name(),
			config.intensity.name(),
			viewport.width,
			viewport.height
		);
		Self {
			pool,
			pointer: PointerController::default(),
			theme,
			fade: None,
			commands: VecDeque::new(),
			ticks: 0,
		}
	}

	/// Queues host input for the next tick.
	pub fn queue(&mut self, command: EngineCommand) {
		self.commands.push_back(command);
	}

	/// Number of commands waiting for the next tick.
	pub fn pending(&self) -> usize {
		self.commands.len()
	}

	/// Applies queued input, then advances the pointer and every layer.
	///
	/// `dt_ms` is the time since the previous tick and `now_ms` the host clock
	/// on the same timeline as the pointer event stamps.
	pub fn tick(&mut self, dt_ms: f64, now_ms: f64) {
		while let Some(command) = self.commands.pop_front() {
			self.apply(command);
		}

		let dt_ms = if dt_ms.is_finite() { dt_ms.clamp(0.0, MAX_DT_MS) } else { 0.0 };
		self.pointer.update(now_ms, dt_ms / 1000.0);

		if let Some(fade) = &mut self.fade {
			fade.elapsed_ms += dt_ms;
			if fade.is_done() {
				self.fade = None;
			}
		}

		let pointer = self.pointer.snapshot();
		self.pool.tick(dt_ms, &pointer);
		self.ticks += 1;
	}

	fn apply(&mut self, command: EngineCommand) {
		match command {
			EngineCommand::Resize { width, height } => {
				let current = self.pool.viewport();
				if current.width == width && current.height == height {
					return;
				}
				info!("field: resize {}x{} -> {width}x{height}", current.width, current.height);
				self.pool.resize(width, height);
			}
			EngineCommand::SetTheme(token) => {
				if token == self.theme {
					return;
				}
				info!("field: theme {} -> {}", self.theme.name(), token.name());
				let duration_ms = self.pool.config().crossfade_ms;
				let mut from = self.pool.palette().clone();
				from.background = self.background();
				self.fade = (duration_ms > 0.0).then_some(Crossfade {
					from,
					elapsed_ms: 0.0,
					duration_ms,
				});
				self.theme = token;
				self.pool.set_palette(theme::resolve(token));
			}
			EngineCommand::SetIntensity(intensity) => {
				if intensity != self.pool.intensity() {
					debug!("field: intensity {}", intensity.name());
					self.pool.set_intensity(intensity);
				}
			}
			EngineCommand::PointerMove { x, y, at_ms } => self.pointer.on_move(x, y, at_ms),
			EngineCommand::PointerLeave => self.pointer.on_leave(),
		}
	}

	/// Background stops currently on screen, cross-fade included.
	pub fn background(&self) -> Vec<GradientStop> {
		match &self.fade {
			Some(fade) => fade.from.blend_background(self.pool.palette(), fade.progress()),
			None => self.pool.palette().background.clone(),
		}
	}

	/// Paints the current state. Does not advance the simulation.
	pub fn render(&self, surface: &mut dyn DrawSurface) {
		let background = self.background();
		let frame = Frame {
			pool: &self.pool,
			pointer: self.pointer.snapshot(),
			background: &background,
		};
		render::render(&frame, surface);
	}

	/// Spawns entities immediately, outside the tick cycle.
	pub fn spawn(&mut self, kind: EntityKind, origin: Point, count: usize) -> usize {
		self.pool.spawn(kind, origin, count)
	}

	pub fn pool(&self) -> &EntityPool {
		&self.pool
	}

	pub fn theme(&self) -> ThemeToken {
		self.theme
	}

	pub fn pointer(&self) -> PointerState {
		self.pointer.snapshot()
	}

	pub fn interaction(&self) -> InteractionState {
		self.pointer.state()
	}

	/// Ticks run since creation.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// True while a theme cross-fade is in progress.
	pub fn is_fading(&self) -> bool {
		self.fade.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::field::config::Preset;
	use crate::components::field::layer::FieldLayer;
	use crate::components::field::surface::{DrawCommand, RecordingSurface};

	fn engine(preset: Preset) -> FieldEngine {
		let config = EngineConfig {
			seed: Some(11),
			..EngineConfig::from_preset(preset)
		};
		FieldEngine::new(config, 800.0, 600.0)
	}

	#[test]
	fn commands_wait_for_the_next_tick() {
		let mut engine = engine(Preset::Galaxy);
		engine.queue(EngineCommand::Resize {
			width: 400.0,
			height: 300.0,
		});
		engine.queue(EngineCommand::SetTheme(ThemeToken::Morning));
		assert_eq!(engine.pending(), 2);
		assert_eq!(engine.pool().viewport().width, 800.0);
		assert_eq!(engine.theme(), ThemeToken::Night);

		engine.tick(16.0, 16.0);
		assert_eq!(engine.pending(), 0);
		assert_eq!(engine.pool().viewport().width, 400.0);
		assert_eq!(engine.theme(), ThemeToken::Morning);
		assert_eq!(engine.pool().palette(), &Palette::morning());
	}

	#[test]
	fn theme_swap_keeps_entities() {
		let mut engine = engine(Preset::Galaxy);
		let before: Vec<_> = engine.pool().stars.stars.iter().map(|s| s.position).collect();
		engine.queue(EngineCommand::SetTheme(ThemeToken::Evening));
		engine.tick(0.0, 0.0);
		let after: Vec<_> = engine.pool().stars.stars.iter().map(|s| s.position).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn crossfade_runs_for_configured_duration() {
		let mut engine = engine(Preset::Galaxy);
		let night = Palette::night().background;
		engine.queue(EngineCommand::SetTheme(ThemeToken::Morning));
		engine.tick(0.0, 0.0);
		assert!(engine.is_fading());
		assert_eq!(engine.background(), night);

		for i in 1..=10 {
			engine.tick(100.0, i as f64 * 100.0);
		}
		assert!(!engine.is_fading());
		assert_eq!(engine.background(), Palette::morning().background);
	}

	#[test]
	fn zero_crossfade_swaps_at_once() {
		let config = EngineConfig {
			crossfade_ms: 0.0,
			..EngineConfig::default()
		};
		let mut engine = FieldEngine::new(config, 800.0, 600.0);
		engine.queue(EngineCommand::SetTheme(ThemeToken::Evening));
		engine.tick(16.0, 16.0);
		assert!(!engine.is_fading());
		assert_eq!(engine.background(), Palette::evening().background);
	}

	#[test]
	fn pointer_input_goes_through_the_queue() {
		let mut engine = engine(Preset::Particles);
		engine.queue(EngineCommand::PointerMove {
			x: 200.0,
			y: 150.0,
			at_ms: 0.0,
		});
		assert_eq!(engine.interaction(), InteractionState::Idle);
		engine.tick(16.0, 16.0);
		assert_eq!(engine.interaction(), InteractionState::Active);
		assert!(engine.pointer().present);

		engine.queue(EngineCommand::PointerLeave);
		engine.tick(16.0, 32.0);
		assert_eq!(engine.interaction(), InteractionState::Idle);
	}

	#[test]
	fn intensity_command_trims_bolts() {
		let mut engine = engine(Preset::Storm);
		engine.spawn(EntityKind::Bolt, Point::new(400.0, 0.0), 5);
		assert_eq!(engine.pool().lightning.len(), 5);
		engine.queue(EngineCommand::SetIntensity(Intensity::Low));
		engine.tick(0.0, 0.0);
		assert!(engine.pool().lightning.len() <= Intensity::Low.max_bolts());
	}

	#[test]
	fn render_starts_with_clear_and_blended_background() {
		let mut engine = engine(Preset::Full);
		engine.tick(16.0, 16.0);
		let mut surface = RecordingSurface::default();
		engine.render(&mut surface);
		let commands = surface.take();
		assert_eq!(commands[0], DrawCommand::Clear);
		assert_eq!(
			commands[1],
			DrawCommand::LinearGradient {
				stops: engine.background()
			}
		);
	}
}
