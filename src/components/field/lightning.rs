//! Lightning layer: procedurally generated bolts with branches and a finite life.
//!
//! Unlike stars and nebulas, bolts are transient. Each one counts its life
//! down to zero and is then removed together with its branches.
//!
//! Path generation subdivides the straight start-end segment and pushes each
//! interior point sideways by a random offset that tapers to zero at both
//! ends. Offsets are orthogonal to the axis, so the path's projection onto
//! the axis stays monotone and the polyline cannot cross itself.

use rand::Rng;

use super::config::{EngineConfig, Intensity};
use super::layer::{FieldLayer, FieldRng, LayerContext};
use super::theme::{Color, Palette};
use super::types::{Point, Viewport};

/// Reveal progress gained per second by the main stroke (~200 ms to draw).
const REVEAL_SPEED: f64 = 5.0;
/// Reveal progress gained per second by branches once they start.
const BRANCH_REVEAL_SPEED: f64 = 6.0;
/// Main-stroke progress at which branches begin to draw.
pub const BRANCH_REVEAL_THRESHOLD: f64 = 0.3;
/// Sky flash decay (1/s).
const FLASH_DECAY: f64 = 6.0;
/// Share of the bolt's life over which it fades out.
const FADE_SHARE: f64 = 0.3;

/// A secondary stroke anchored on the main path.
#[derive(Clone, Debug)]
pub struct Branch {
	/// Index into the parent bolt's `points` where the branch starts.
	pub anchor: usize,
	pub points: Vec<Point>,
	pub reveal: f64,
	/// Seconds left. Always shorter than the parent's.
	pub life: f64,
}

/// One lightning strike.
#[derive(Clone, Debug)]
pub struct Bolt {
	pub points: Vec<Point>,
	pub branches: Vec<Branch>,
	/// Seconds left; the bolt is removed when this reaches zero.
	pub remaining_life: f64,
	pub max_life: f64,
	pub thickness: f64,
	pub color: Color,
	/// How much of the main path is drawn, 0 to 1.
	pub reveal: f64,
}

impl Bolt {
	/// Opacity in `[0, 1]`: full until the last part of its life, then fading.
	pub fn alpha(&self) -> f64 {
		if self.max_life <= 0.0 {
			return 0.0;
		}
		let left = (self.remaining_life / self.max_life).clamp(0.0, 1.0);
		(left / FADE_SHARE).min(1.0)
	}

	/// The currently drawn part of the main path.
	pub fn visible_path(&self) -> Vec<Point> {
		revealed_prefix(&self.points, self.reveal)
	}

	/// Branches that have started drawing, with their visible parts.
	pub fn visible_branches(&self) -> impl Iterator<Item = Vec<Point>> + '_ {
		let started = self.reveal >= BRANCH_REVEAL_THRESHOLD;
		self.branches
			.iter()
			.filter(move |b| started && b.reveal > 0.0)
			.map(|b| revealed_prefix(&b.points, b.reveal))
	}
}

/// Leading fraction `progress` of a polyline, interpolating the last segment.
pub fn revealed_prefix(points: &[Point], progress: f64) -> Vec<Point> {
	if points.len() < 2 {
		return points.to_vec();
	}
	let progress = progress.clamp(0.0, 1.0);
	let span = progress * (points.len() - 1) as f64;
	let whole = span.floor() as usize;
	let mut out: Vec<Point> = points[..=whole].to_vec();
	let frac = span - whole as f64;
	if frac > 0.0 && whole + 1 < points.len() {
		out.push(points[whole].lerp(points[whole + 1], frac));
	}
	out
}

/// Jagged path from `start` to `end` with `steps` segments.
pub fn jagged_path(
	start: Point,
	end: Point,
	steps: usize,
	roughness: f64,
	rng: &mut FieldRng,
) -> Vec<Point> {
	let steps = steps.max(1);
	let len = start.distance(end);
	if len < 1e-6 {
		return vec![start, end];
	}
	let (nx, ny) = (-(end.y - start.y) / len, (end.x - start.x) / len);
	let amplitude = roughness * len / steps as f64 * 2.0;

	let mut points = Vec::with_capacity(steps + 1);
	points.push(start);
	for i in 1..steps {
		let t = i as f64 / steps as f64;
		let taper = 4.0 * t * (1.0 - t);
		let offset = rng.random_range(-1.0..=1.0) * amplitude * taper;
		points.push(start.lerp(end, t).offset(nx * offset, ny * offset));
	}
	points.push(end);
	points
}

/// Edge-biased start and a matching end on the far side.
fn strike_endpoints(viewport: Viewport, rng: &mut FieldRng) -> (Point, Point) {
	let (w, h) = (viewport.width, viewport.height);
	let edge: f64 = rng.random();
	if edge < 0.6 {
		let start = Point::new(rng.random_range(0.1..0.9) * w, 0.0);
		let end_x = (start.x + rng.random_range(-0.3..0.3) * w).clamp(0.0, w);
		(start, Point::new(end_x, rng.random_range(0.6..=1.0) * h))
	} else if edge < 0.8 {
		let start = Point::new(0.0, rng.random_range(0.0..0.5) * h);
		let end = Point::new(rng.random_range(0.6..=1.0) * w, rng.random_range(0.4..=1.0) * h);
		(start, end)
	} else {
		let start = Point::new(w, rng.random_range(0.0..0.5) * h);
		let end = Point::new(rng.random_range(0.0..0.4) * w, rng.random_range(0.4..=1.0) * h);
		(start, end)
	}
}

/// Builds a bolt. With an `origin` the strike starts there and heads for the
/// mirrored point across the viewport center.
pub fn generate_bolt(
	viewport: Viewport,
	origin: Option<Point>,
	palette: &Palette,
	config: &EngineConfig,
	rng: &mut FieldRng,
) -> Bolt {
	let (start, end) = match origin {
		Some(o) => {
			let mut end = Point::new(
				viewport.width - o.x + rng.random_range(-0.1..0.1) * viewport.width,
				viewport.height - o.y,
			);
			if end.distance(o) < 1.0 {
				end = Point::new(o.x, viewport.height);
			}
			(o, end)
		}
		None => strike_endpoints(viewport, rng),
	};
	let steps = rng.random_range(12..=20);
	let points = jagged_path(start, end, steps, config.roughness, rng);
	let life = rng.random_range(0.5..1.1);

	let main_angle = (end.y - start.y).atan2(end.x - start.x);
	let main_len = start.distance(end);
	let branch_count = rng.random_range(1..=4);
	let mut branches = Vec::with_capacity(branch_count);
	if points.len() > 4 {
		for _ in 0..branch_count {
			let anchor = rng.random_range(2..points.len() - 2);
			// Stay within +-60 degrees of the main direction so branches never double back.
			let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
			let angle = main_angle + side * rng.random_range(0.35..1.05);
			let length = main_len * rng.random_range(0.12..0.3);
			let root = points[anchor];
			let tip = root.offset(angle.cos() * length, angle.sin() * length);
			branches.push(Branch {
				anchor,
				points: jagged_path(root, tip, rng.random_range(4..=7), config.roughness, rng),
				reveal: 0.0,
				life: life * rng.random_range(0.4..0.8),
			});
		}
	}

	Bolt {
		points,
		branches,
		remaining_life: life,
		max_life: life,
		thickness: rng.random_range(1.2..2.6),
		color: palette.lightning,
		reveal: 0.0,
	}
}

/// Manages live bolts and the sky flash they cause.
#[derive(Default)]
pub struct LightningLayer {
	pub bolts: Vec<Bolt>,
	/// Sky flash level in `[0, 1]`, raised by each strike.
	pub flash: f64,
}

impl LightningLayer {
	/// Adds up to `count` bolts starting at `origin`, skipping at the tier cap.
	#[allow(clippy::too_many_arguments)]
	pub fn spawn(
		&mut self,
		viewport: Viewport,
		origin: Point,
		count: usize,
		intensity: Intensity,
		palette: &Palette,
		config: &EngineConfig,
		rng: &mut FieldRng,
	) -> usize {
		if viewport.is_empty() {
			return 0;
		}
		let n = count.min(intensity.max_bolts().saturating_sub(self.bolts.len()));
		// Strikes always start on the surface.
		let origin = if origin.is_finite() {
			Point::new(origin.x.clamp(0.0, viewport.width), origin.y.clamp(0.0, viewport.height))
		} else {
			viewport.center()
		};
		for _ in 0..n {
			self.push(generate_bolt(viewport, Some(origin), palette, config, rng));
		}
		n
	}

	/// Drops the oldest bolts beyond `max`.
	pub fn enforce_cap(&mut self, max: usize) {
		if self.bolts.len() > max {
			let excess = self.bolts.len() - max;
			self.bolts.drain(..excess);
		}
	}

	/// Ages every bolt and removes the expired ones. Never adds bolts.
	pub fn expire(&mut self, dt: f64) {
		self.flash = (self.flash * (-FLASH_DECAY * dt).exp()).clamp(0.0, 1.0);
		for bolt in &mut self.bolts {
			bolt.reveal = (bolt.reveal + REVEAL_SPEED * dt).min(1.0);
			bolt.remaining_life -= dt;
			let started = bolt.reveal >= BRANCH_REVEAL_THRESHOLD;
			for branch in &mut bolt.branches {
				if started {
					branch.reveal = (branch.reveal + BRANCH_REVEAL_SPEED * dt).min(1.0);
				}
				branch.life -= dt;
			}
			bolt.branches.retain(|b| b.life > 0.0);
		}
		self.bolts.retain(|b| b.remaining_life > 0.0);
	}

	fn push(&mut self, bolt: Bolt) {
		self.flash = (self.flash + 0.35).min(1.0);
		self.bolts.push(bolt);
	}
}

impl FieldLayer for LightningLayer {
	fn populate(
		&mut self,
		_viewport: Viewport,
		_palette: &Palette,
		_config: &EngineConfig,
		_rng: &mut FieldRng,
	) {
		// Bolts are events, not scenery: a rebuild starts with a clear sky.
		self.clear();
	}

	fn update(&mut self, ctx: &LayerContext<'_>, rng: &mut FieldRng) {
		self.expire(ctx.dt);

		if ctx.viewport.is_empty() || self.bolts.len() >= ctx.intensity.max_bolts() {
			return;
		}
		let chance = (ctx.intensity.spawn_rate() * ctx.dt).clamp(0.0, 1.0);
		if chance > 0.0 && rng.random_bool(chance) {
			let bolt = generate_bolt(ctx.viewport, None, ctx.palette, ctx.config, rng);
			self.push(bolt);
		}
	}

	fn len(&self) -> usize {
		self.bolts.len()
	}

	fn clear(&mut self) {
		self.bolts.clear();
		self.flash = 0.0;
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;

	use super::*;

	fn cross(o: Point, a: Point, b: Point) -> f64 {
		(a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
	}

	fn segments_cross(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
		let d1 = cross(q1, q2, p1);
		let d2 = cross(q1, q2, p2);
		let d3 = cross(p1, p2, q1);
		let d4 = cross(p1, p2, q2);
		d1 * d2 < 0.0 && d3 * d4 < 0.0
	}

	#[test]
	fn jagged_path_keeps_endpoints_and_never_self_intersects() {
		let mut rng = FieldRng::seed_from_u64(11);
		for _ in 0..50 {
			let (start, end) = (Point::new(100.0, 0.0), Point::new(300.0, 900.0));
			let path = jagged_path(start, end, 16, 0.8, &mut rng);
			assert_eq!(path.len(), 17);
			assert_eq!(path[0], start);
			assert_eq!(path[16], end);
			for i in 0..path.len() - 1 {
				for j in i + 2..path.len() - 1 {
					assert!(!segments_cross(path[i], path[i + 1], path[j], path[j + 1]));
				}
			}
		}
	}

	#[test]
	fn generated_bolts_have_documented_shape() {
		let viewport = Viewport::new(1280.0, 720.0);
		let (palette, config) = (Palette::night(), EngineConfig::default());
		let mut rng = FieldRng::seed_from_u64(5);
		for _ in 0..100 {
			let bolt = generate_bolt(viewport, None, &palette, &config, &mut rng);
			assert!((13..=21).contains(&bolt.points.len()));
			assert!((1..=4).contains(&bolt.branches.len()));
			for branch in &bolt.branches {
				assert!((5..=8).contains(&branch.points.len()));
				assert!(branch.anchor > 0 && branch.anchor < bolt.points.len() - 1);
				assert_eq!(branch.points[0], bolt.points[branch.anchor]);
				assert!(branch.life < bolt.remaining_life);
			}
			assert_eq!(bolt.color, palette.lightning);
		}
	}

	#[test]
	fn branches_wait_for_main_reveal() {
		let viewport = Viewport::new(800.0, 600.0);
		let mut rng = FieldRng::seed_from_u64(8);
		let mut layer = LightningLayer::default();
		let added = layer.spawn(
			viewport,
			Point::new(400.0, 0.0),
			1,
			Intensity::Medium,
			&Palette::night(),
			&EngineConfig::default(),
			&mut rng,
		);
		assert_eq!(added, 1);

		layer.expire(0.02);
		let bolt = &layer.bolts[0];
		assert!(bolt.reveal < BRANCH_REVEAL_THRESHOLD);
		assert!(bolt.branches.iter().all(|b| b.reveal == 0.0));
		assert_eq!(bolt.visible_branches().count(), 0);

		layer.expire(0.06);
		let bolt = &layer.bolts[0];
		assert!(bolt.reveal >= BRANCH_REVEAL_THRESHOLD);
		assert!(bolt.branches.iter().all(|b| b.reveal > 0.0));
	}

	#[test]
	fn expired_bolts_are_removed_with_their_branches() {
		let viewport = Viewport::new(800.0, 600.0);
		let mut rng = FieldRng::seed_from_u64(13);
		let mut layer = LightningLayer::default();
		layer.spawn(
			viewport,
			Point::new(0.0, 100.0),
			3,
			Intensity::High,
			&Palette::night(),
			&EngineConfig::default(),
			&mut rng,
		);
		assert_eq!(layer.len(), 3);

		let mut previous = layer.len();
		let mut saw_decrease = false;
		for _ in 0..200 {
			let expiring = layer.bolts.iter().any(|b| b.remaining_life <= 0.01);
			layer.expire(0.01);
			assert!(layer.len() <= previous);
			if expiring {
				assert!(layer.len() < previous);
				saw_decrease = true;
			}
			for bolt in &layer.bolts {
				assert!((0.0..=1.0).contains(&bolt.alpha()));
			}
			previous = layer.len();
		}
		assert!(saw_decrease);
		assert!(layer.is_empty());
	}

	#[test]
	fn zero_area_viewport_never_spawns() {
		let mut rng = FieldRng::seed_from_u64(1);
		let mut layer = LightningLayer::default();
		let n = layer.spawn(
			Viewport::new(0.0, 0.0),
			Point::default(),
			5,
			Intensity::High,
			&Palette::night(),
			&EngineConfig::default(),
			&mut rng,
		);
		assert_eq!(n, 0);
	}

	#[test]
	fn off_surface_origin_starts_on_the_edge() {
		let viewport = Viewport::new(800.0, 600.0);
		let mut rng = FieldRng::seed_from_u64(17);
		let mut layer = LightningLayer::default();
		layer.spawn(
			viewport,
			Point::new(50_000.0, -9_000.0),
			1,
			Intensity::Medium,
			&Palette::night(),
			&EngineConfig::default(),
			&mut rng,
		);
		assert_eq!(layer.bolts[0].points[0], Point::new(800.0, 0.0));
	}

	#[test]
	fn revealed_prefix_interpolates() {
		let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 0.0)];
		assert_eq!(revealed_prefix(&points, 0.0), vec![points[0]]);
		assert_eq!(revealed_prefix(&points, 1.0), points.to_vec());
		let half = revealed_prefix(&points, 0.75);
		assert_eq!(half.last().copied(), Some(Point::new(15.0, 0.0)));
	}
}
