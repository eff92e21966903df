//! The contract every field layer implements.

use rand::rngs::SmallRng;

use super::config::{EngineConfig, Intensity};
use super::pointer::PointerState;
use super::theme::Palette;
use super::types::Viewport;

/// Random source shared by all layers of one pool. Seeded, so runs replay.
pub type FieldRng = SmallRng;

/// Everything a layer may read during one simulation step.
pub struct LayerContext<'a> {
	/// Seconds since the previous tick.
	pub dt: f64,
	/// Seconds of simulated time since the pool was created.
	pub time: f64,
	pub viewport: Viewport,
	pub palette: &'a Palette,
	pub pointer: &'a PointerState,
	pub config: &'a EngineConfig,
	pub intensity: Intensity,
}

/// A depth-ordered group of entities of one kind.
///
/// Layers own their entities. `populate` rebuilds from scratch (init and
/// resize), `update` advances one tick and may only destroy entities of
/// kinds with a finite life.
pub trait FieldLayer {
	fn populate(
		&mut self,
		viewport: Viewport,
		palette: &Palette,
		config: &EngineConfig,
		rng: &mut FieldRng,
	);

	fn update(&mut self, ctx: &LayerContext<'_>, rng: &mut FieldRng);

	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn clear(&mut self);
}
