//! Engine configuration.
//!
//! One [`EngineConfig`] replaces the family of near-identical background
//! components: each of them is a [`Preset`] plus a few overridden fields.
//! The struct deserializes from the JSON the page embeds in a script tag.

use serde::{Deserialize, Serialize};

use super::theme::{ThemeToken, TokenRepr};

/// Hard ceilings no config can raise, bounding memory and per-frame cost.
pub const MAX_STARS: usize = 5_000;
pub const MAX_NEBULAS: usize = 64;
pub const MAX_PARTICLES: usize = 4_000;

/// Lightning intensity tier. Only changes spawn frequency and the
/// concurrent-bolt cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "TokenRepr", rename_all = "lowercase")]
pub enum Intensity {
	Low,
	#[default]
	Medium,
	High,
}

impl Intensity {
	/// Total parse: unknown names fall back to [`Intensity::Medium`].
	pub fn parse(name: &str) -> Self {
		match name.trim().to_ascii_lowercase().as_str() {
			"low" => Self::Low,
			"high" => Self::High,
			_ => Self::Medium,
		}
	}

	/// Numeric tier (0 = low, 1 = medium, 2 = high); anything else is medium.
	pub fn from_level(level: u64) -> Self {
		match level {
			0 => Self::Low,
			2 => Self::High,
			_ => Self::Medium,
		}
	}

	/// Expected bolt spawns per second while below the cap.
	pub fn spawn_rate(self) -> f64 {
		match self {
			Self::Low => 0.35,
			Self::Medium => 0.9,
			Self::High => 2.2,
		}
	}

	pub fn max_bolts(self) -> usize {
		match self {
			Self::Low => 2,
			Self::Medium => 3,
			Self::High => 5,
		}
	}
}

impl From<TokenRepr> for Intensity {
	fn from(value: TokenRepr) -> Self {
		match value {
			TokenRepr::Level(level) => Self::from_level(level),
			TokenRepr::Name(name) => Self::parse(&name),
			TokenRepr::Other(_) => Self::default(),
		}
	}
}

/// Named starting points standing in for the individual background variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
	/// Stars, nebulas and ambient particles.
	#[default]
	Galaxy,
	/// Sparse stars under a lightning storm.
	Storm,
	/// Dense star field with pointer trails.
	Particles,
	/// Every layer enabled.
	Full,
}

/// Which layers an engine instance runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerToggles {
	pub stars: bool,
	pub nebulas: bool,
	pub lightning: bool,
	pub particles: bool,
}

impl Default for LayerToggles {
	fn default() -> Self {
		Self {
			stars: true,
			nebulas: true,
			lightning: false,
			particles: true,
		}
	}
}

/// Inclusive bounds on how many instances a layer may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
	pub min: usize,
	pub max: usize,
}

impl CountRange {
	pub const fn new(min: usize, max: usize) -> Self {
		Self { min, max }
	}

	/// Instance count for `area` px² at one instance per `area_per_item` px².
	/// Zero area always yields zero.
	pub fn for_area(&self, area: f64, area_per_item: f64) -> usize {
		if area <= 0.0 || !area.is_finite() {
			return 0;
		}
		let raw = (area / area_per_item.max(1.0)).floor();
		(raw as usize).clamp(self.min, self.max)
	}
}

/// All tunables for one engine instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	pub preset: Preset,
	pub layers: LayerToggles,
	pub theme: Option<ThemeToken>,
	pub intensity: Intensity,
	pub seed: Option<u64>,

	/// Surface area (px²) per star.
	pub star_area: f64,
	pub star_count: CountRange,
	/// Base drift speed of the front star layer in px/s.
	pub star_speed: f64,
	/// Amplitude of the orbital wobble added to star drift, in px.
	pub star_wobble: f64,

	/// Surface area (px²) per nebula blob.
	pub nebula_area: f64,
	pub nebula_count: CountRange,
	pub nebula_speed: f64,

	/// Distance (px) entities may travel past an edge before wrapping.
	pub wrap_margin: f64,

	/// Radius (px) of the pointer force field.
	pub interaction_radius: f64,
	/// Peak repulsion displacement (px) at the pointer itself.
	pub repulsion: f64,
	/// How far the back layers shift with the pointer (px at full offset).
	pub parallax: f64,

	/// Hard cap on live trail and ambient particles.
	pub particle_cap: usize,
	/// Trail particles emitted per second while the pointer is active.
	pub trail_rate: f64,
	/// Ambient particles emitted per second at random points.
	pub ambient_rate: f64,

	/// Jaggedness of lightning paths; 0 is a straight line.
	pub roughness: f64,

	/// Peak alpha of the readability overlay.
	pub overlay_strength: f64,
	/// Background cross-fade duration on theme change; 0 disables it.
	pub crossfade_ms: f64,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self::from_preset(Preset::Galaxy)
	}
}

impl EngineConfig {
	pub fn from_preset(preset: Preset) -> Self {
		let base = Self {
			preset,
			layers: LayerToggles::default(),
			theme: None,
			intensity: Intensity::Medium,
			seed: None,
			star_area: 1_400.0,
			star_count: CountRange::new(60, 2_000),
			star_speed: 12.0,
			star_wobble: 0.6,
			nebula_area: 160_000.0,
			nebula_count: CountRange::new(8, 15),
			nebula_speed: 4.0,
			wrap_margin: 24.0,
			interaction_radius: 140.0,
			repulsion: 28.0,
			parallax: 18.0,
			particle_cap: 400,
			trail_rate: 70.0,
			ambient_rate: 6.0,
			roughness: 0.35,
			overlay_strength: 1.0,
			crossfade_ms: 800.0,
		};
		match preset {
			Preset::Galaxy => base,
			Preset::Storm => Self {
				layers: LayerToggles {
					stars: true,
					nebulas: false,
					lightning: true,
					particles: false,
				},
				star_area: 4_000.0,
				intensity: Intensity::High,
				..base
			},
			Preset::Particles => Self {
				layers: LayerToggles {
					stars: true,
					nebulas: false,
					lightning: false,
					particles: true,
				},
				star_area: 900.0,
				trail_rate: 120.0,
				repulsion: 40.0,
				..base
			},
			Preset::Full => Self {
				layers: LayerToggles {
					stars: true,
					nebulas: true,
					lightning: true,
					particles: true,
				},
				..base
			},
		}
	}

	/// Parses JSON config. Fields not given come from the named preset.
	pub fn from_json(text: &str) -> serde_json::Result<Self> {
		let value: serde_json::Value = serde_json::from_str(text)?;
		let preset = value
			.get("preset")
			.cloned()
			.map(serde_json::from_value::<Preset>)
			.transpose()?
			.unwrap_or_default();
		let mut merged = serde_json::to_value(Self::from_preset(preset))?;
		merge(&mut merged, value);
		Ok(serde_json::from_value::<Self>(merged)?.sanitized())
	}

	/// Repairs degenerate values so no config can make the engine misbehave.
	pub fn sanitized(self) -> Self {
		let fallback = Self::from_preset(self.preset);
		let positive = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
		let non_negative = |v: f64, d: f64| if v.is_finite() && v >= 0.0 { v } else { d };
		let bounded = |r: CountRange, ceiling: usize| {
			let (min, max) = if r.min <= r.max { (r.min, r.max) } else { (r.max, r.min) };
			CountRange::new(min.min(ceiling), max.min(ceiling))
		};
		Self {
			star_area: positive(self.star_area, fallback.star_area),
			star_count: bounded(self.star_count, MAX_STARS),
			star_speed: non_negative(self.star_speed, fallback.star_speed),
			star_wobble: non_negative(self.star_wobble, fallback.star_wobble),
			nebula_area: positive(self.nebula_area, fallback.nebula_area),
			nebula_count: bounded(self.nebula_count, MAX_NEBULAS),
			nebula_speed: non_negative(self.nebula_speed, fallback.nebula_speed),
			wrap_margin: non_negative(self.wrap_margin, fallback.wrap_margin),
			interaction_radius: positive(self.interaction_radius, fallback.interaction_radius),
			repulsion: non_negative(self.repulsion, fallback.repulsion),
			parallax: non_negative(self.parallax, fallback.parallax),
			trail_rate: non_negative(self.trail_rate, fallback.trail_rate),
			ambient_rate: non_negative(self.ambient_rate, fallback.ambient_rate),
			roughness: non_negative(self.roughness, fallback.roughness).min(2.0),
			overlay_strength: non_negative(self.overlay_strength, 1.0).min(1.0),
			crossfade_ms: non_negative(self.crossfade_ms, fallback.crossfade_ms),
			particle_cap: self.particle_cap.min(MAX_PARTICLES),
			..self
		}
	}
}

/// Overlays `patch` onto `base`, recursing into objects so a partial
/// `"layers"` override keeps the preset's other toggles.
fn merge(base: &mut serde_json::Value, patch: serde_json::Value) {
	match (base, patch) {
		(serde_json::Value::Object(target), serde_json::Value::Object(overrides)) => {
			for (key, value) in overrides {
				match target.get_mut(&key) {
					Some(existing) => merge(existing, value),
					None => {
						target.insert(key, value);
					}
				}
			}
		}
		(slot, value) => *slot = value,
	}
}

impl Preset {
	pub fn name(self) -> &'static str {
		match self {
			Self::Galaxy => "galaxy",
			Self::Storm => "storm",
			Self::Particles => "particles",
			Self::Full => "full",
		}
	}
}

impl Intensity {
	pub fn name(self) -> &'static str {
		match self {
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
		}
	}
}
