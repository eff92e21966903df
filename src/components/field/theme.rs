//! Visual theming for the field background.
//!
//! Maps a coarse time-of-day token to an immutable [`Palette`]. Resolution is a
//! pure, total function: any unknown token lands on the night palette.

use serde::{Deserialize, Serialize};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Replaces alpha, clamped to `[0, 1]` so composed opacities never overflow.
	pub fn with_alpha(self, a: f64) -> Self {
		let a = if a.is_finite() { a.clamp(0.0, 1.0) } else { 0.0 };
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * (1.0 - t) + other.r as f64 * t) as u8,
			g: (self.g as f64 * (1.0 - t) + other.g as f64 * t) as u8,
			b: (self.b as f64 * (1.0 - t) + other.b as f64 * t) as u8,
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
		}
	}
}

/// A gradient stop: offset in `[0, 1]` and its color.
pub type GradientStop = (f64, Color);

/// How a token may appear in JSON: a name, a numeric level, or anything else
/// (which maps to the default).
#[derive(Deserialize)]
#[serde(untagged)]
pub enum TokenRepr {
	Level(u64),
	Name(String),
	Other(serde::de::IgnoredAny),
}

/// Coarse time-of-day theme selected by the host page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "TokenRepr", rename_all = "lowercase")]
pub enum ThemeToken {
	Morning,
	Evening,
	#[default]
	Night,
}

impl ThemeToken {
	/// Total parse: unknown names fall back to [`ThemeToken::Night`].
	pub fn parse(name: &str) -> Self {
		match name.trim().to_ascii_lowercase().as_str() {
			"morning" | "day" | "dawn" => Self::Morning,
			"evening" | "dusk" | "sunset" => Self::Evening,
			_ => Self::Night,
		}
	}

	/// Numeric theme (0 = morning, 1 = evening, 2 = night); anything else is night.
	pub fn from_level(level: u64) -> Self {
		match level {
			0 => Self::Morning,
			1 => Self::Evening,
			_ => Self::Night,
		}
	}

	/// Picks a token from the local hour (0-23).
	pub fn from_hour(hour: u32) -> Self {
		match hour {
			5..=10 => Self::Morning,
			11..=18 => Self::Evening,
			_ => Self::Night,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Morning => "morning",
			Self::Evening => "evening",
			Self::Night => "night",
		}
	}
}

impl From<TokenRepr> for ThemeToken {
	fn from(value: TokenRepr) -> Self {
		match value {
			TokenRepr::Level(level) => Self::from_level(level),
			TokenRepr::Name(name) => Self::parse(&name),
			TokenRepr::Other(_) => Self::default(),
		}
	}
}

/// Complete color set for one theme. Swapped wholesale on theme change.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	pub token: ThemeToken,
	/// Top-to-bottom background gradient.
	pub background: Vec<GradientStop>,
	pub stars: Vec<Color>,
	/// Translucent nebula tints.
	pub nebulas: Vec<Color>,
	pub accent: Color,
	pub lightning: Color,
	/// Color of the pointer-centered readability overlay. Dark themes darken,
	/// light themes lighten.
	pub overlay: Color,
	/// Vignette intensity (0.0 = none, 1.0 = strong)
	pub vignette: f64,
}

impl Palette {
	pub fn star(&self, index: usize) -> Color {
		pick(&self.stars, index)
	}

	pub fn nebula(&self, index: usize) -> Color {
		pick(&self.nebulas, index)
	}

	/// Background stops blended toward `other`. Both palettes carry the same
	/// number of stops; extra stops on either side are taken from `other`.
	pub fn blend_background(&self, other: &Palette, t: f64) -> Vec<GradientStop> {
		other
			.background
			.iter()
			.enumerate()
			.map(|(i, &(offset, to))| match self.background.get(i) {
				Some(&(_, from)) => (offset, from.lerp(to, t)),
				None => (offset, to),
			})
			.collect()
	}

	/// Soft blue dawn sky with warm stars
	pub fn morning() -> Self {
		Self {
			token: ThemeToken::Morning,
			background: vec![
				(0.0, Color::rgb(94, 129, 172)),
				(0.55, Color::rgb(170, 145, 160)),
				(1.0, Color::rgb(235, 190, 160)),
			],
			stars: vec![
				Color::rgb(255, 250, 240), // Ivory
				Color::rgb(255, 236, 200), // Champagne
				Color::rgb(250, 220, 210), // Blush
				Color::rgb(220, 235, 255), // Ice
				Color::rgb(255, 245, 215), // Cream
			],
			nebulas: vec![
				Color::rgba(255, 190, 150, 0.22),
				Color::rgba(250, 170, 190, 0.18),
				Color::rgba(190, 210, 250, 0.20),
			],
			accent: Color::rgb(255, 200, 120),
			lightning: Color::rgb(255, 245, 220),
			overlay: Color::rgba(255, 255, 255, 0.18),
			vignette: 0.08,
		}
	}

	/// Sunset gradient with amber and violet tints
	pub fn evening() -> Self {
		Self {
			token: ThemeToken::Evening,
			background: vec![
				(0.0, Color::rgb(35, 30, 60)),
				(0.55, Color::rgb(110, 60, 90)),
				(1.0, Color::rgb(180, 100, 80)),
			],
			stars: vec![
				Color::rgb(255, 230, 200), // Peach
				Color::rgb(255, 200, 170), // Apricot
				Color::rgb(230, 200, 255), // Lilac
				Color::rgb(255, 255, 240), // White
				Color::rgb(250, 210, 150), // Amber
			],
			nebulas: vec![
				Color::rgba(200, 100, 140, 0.22),
				Color::rgba(130, 90, 170, 0.20),
				Color::rgba(230, 140, 90, 0.18),
				Color::rgba(90, 80, 150, 0.20),
			],
			accent: Color::rgb(255, 150, 110),
			lightning: Color::rgb(230, 210, 255),
			overlay: Color::rgba(20, 10, 30, 0.30),
			vignette: 0.18,
		}
	}

	/// Deep galaxy night with cool stars (default)
	pub fn night() -> Self {
		Self {
			token: ThemeToken::Night,
			background: vec![
				(0.0, Color::rgb(6, 8, 20)),
				(0.55, Color::rgb(14, 16, 38)),
				(1.0, Color::rgb(25, 20, 50)),
			],
			stars: vec![
				Color::rgb(255, 255, 255), // White
				Color::rgb(200, 220, 255), // Pale blue
				Color::rgb(170, 190, 255), // Periwinkle
				Color::rgb(255, 240, 220), // Warm white
				Color::rgb(210, 180, 255), // Lavender
				Color::rgb(150, 230, 255), // Cyan
			],
			nebulas: vec![
				Color::rgba(100, 60, 180, 0.22),
				Color::rgba(40, 90, 190, 0.20),
				Color::rgba(170, 60, 150, 0.18),
				Color::rgba(30, 130, 160, 0.18),
			],
			accent: Color::rgb(140, 170, 255),
			lightning: Color::rgb(190, 210, 255),
			overlay: Color::rgba(0, 0, 0, 0.35),
			vignette: 0.25,
		}
	}
}

impl Default for Palette {
	fn default() -> Self {
		Self::night()
	}
}

fn pick(colors: &[Color], index: usize) -> Color {
	if colors.is_empty() {
		Color::rgb(255, 255, 255)
	} else {
		colors[index % colors.len()]
	}
}

/// Resolves a theme token to its palette.
pub fn resolve(token: ThemeToken) -> Palette {
	match token {
		ThemeToken::Morning => Palette::morning(),
		ThemeToken::Evening => Palette::evening(),
		ThemeToken::Night => Palette::night(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_tokens_fall_back_to_night() {
		assert_eq!(ThemeToken::parse("aurora"), ThemeToken::Night);
		assert_eq!(ThemeToken::parse(" Morning "), ThemeToken::Morning);
		let token: ThemeToken = serde_json::from_str("\"neon\"").unwrap();
		assert_eq!(resolve(token), Palette::night());
	}

	#[test]
	fn palettes_have_documented_color_counts() {
		for token in [ThemeToken::Morning, ThemeToken::Evening, ThemeToken::Night] {
			let palette = resolve(token);
			assert_eq!(palette.token, token);
			assert!((4..=6).contains(&palette.stars.len()), "{token:?}");
			assert!((3..=4).contains(&palette.nebulas.len()), "{token:?}");
			assert!(palette.background.len() >= 2);
		}
	}

	#[test]
	fn hours_map_to_time_of_day() {
		assert_eq!(ThemeToken::from_hour(7), ThemeToken::Morning);
		assert_eq!(ThemeToken::from_hour(17), ThemeToken::Evening);
		assert_eq!(ThemeToken::from_hour(23), ThemeToken::Night);
		assert_eq!(ThemeToken::from_hour(2), ThemeToken::Night);
	}

	#[test]
	fn background_blend_endpoints() {
		let (m, n) = (Palette::morning(), Palette::night());
		assert_eq!(m.blend_background(&n, 1.0), n.background);
		assert_eq!(m.blend_background(&n, 0.0)[0].1, m.background[0].1);
	}

	#[test]
	fn with_alpha_clamps() {
		assert_eq!(Color::rgb(1, 2, 3).with_alpha(3.0).a, 1.0);
		assert_eq!(Color::rgb(1, 2, 3).with_alpha(f64::NAN).a, 0.0);
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
	}
}
