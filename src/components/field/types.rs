//! Small geometry types shared by every layer.

/// A position or offset in surface pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}

	pub fn length(self) -> f64 {
		(self.x * self.x + self.y * self.y).sqrt()
	}

	pub fn lerp(self, other: Point, t: f64) -> Self {
		Self {
			x: self.x + (other.x - self.x) * t,
			y: self.y + (other.y - self.y) * t,
		}
	}

	pub fn offset(self, dx: f64, dy: f64) -> Self {
		Self {
			x: self.x + dx,
			y: self.y + dy,
		}
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

/// Size of the drawing surface in pixels.
///
/// Negative or non-finite dimensions are clamped to zero on construction, so
/// an empty viewport is the only degenerate case the layers have to handle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		let clamp = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
		Self {
			width: clamp(width),
			height: clamp(height),
		}
	}

	pub fn area(&self) -> f64 {
		self.width * self.height
	}

	/// True when nothing can be drawn. Layers treat this as "populate nothing".
	pub fn is_empty(&self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}

	pub fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	/// Wraps a coordinate into `[-margin, extent + margin]`, re-entering from
	/// the opposite edge. Returns `true` when a wrap happened.
	pub fn wrap(&self, p: &mut Point, margin: f64) -> bool {
		let wrapped_x = wrap_axis(&mut p.x, self.width, margin);
		let wrapped_y = wrap_axis(&mut p.y, self.height, margin);
		wrapped_x || wrapped_y
	}

	pub fn contains_with_margin(&self, p: Point, margin: f64) -> bool {
		p.x >= -margin
			&& p.x <= self.width + margin
			&& p.y >= -margin
			&& p.y <= self.height + margin
	}
}

fn wrap_axis(v: &mut f64, extent: f64, margin: f64) -> bool {
	let span = extent + 2.0 * margin;
	if span <= 0.0 || !v.is_finite() {
		*v = extent / 2.0;
		return true;
	}
	if *v < -margin || *v > extent + margin {
		// rem_euclid keeps very fast entities inside the band in a single step
		*v = (*v + margin).rem_euclid(span) - margin;
		return true;
	}
	false
}
