//! Drawing backends.
//!
//! The compositor only talks to [`DrawSurface`]. [`CanvasSurface`] paints onto
//! an HTML canvas 2D context; [`RecordingSurface`] keeps a list of the calls,
//! which is what the headless tests assert against.

use std::f64::consts::PI;

use web_sys::{CanvasGradient, CanvasRenderingContext2d};

use super::theme::{Color, GradientStop};
use super::types::{Point, Viewport};

/// Minimal set of painting operations the compositor needs.
pub trait DrawSurface {
	/// Clears the whole surface to transparent.
	fn clear(&mut self, viewport: Viewport);

	fn fill_rect(&mut self, viewport: Viewport, color: Color);

	/// Fills the whole surface with a linear gradient from `from` to `to`.
	fn fill_linear_gradient(
		&mut self,
		viewport: Viewport,
		from: Point,
		to: Point,
		stops: &[GradientStop],
	);

	/// Fills a disc of `outer` radius with a radial gradient starting at `inner`.
	fn fill_radial_gradient(
		&mut self,
		center: Point,
		inner: f64,
		outer: f64,
		stops: &[GradientStop],
	);

	fn fill_circle(&mut self, center: Point, radius: f64, color: Color);

	fn stroke_path(&mut self, points: &[Point], width: f64, color: Color);
}

/// [`DrawSurface`] over a browser canvas.
pub struct CanvasSurface {
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	pub fn new(ctx: CanvasRenderingContext2d) -> Self {
		Self { ctx }
	}

	fn apply_stops(gradient: &CanvasGradient, stops: &[GradientStop]) {
		for (offset, color) in stops {
			let _ = gradient.add_color_stop(offset.clamp(0.0, 1.0) as f32, &color.to_css());
		}
	}
}

impl DrawSurface for CanvasSurface {
	fn clear(&mut self, viewport: Viewport) {
		self.ctx.clear_rect(0.0, 0.0, viewport.width, viewport.height);
	}

	fn fill_rect(&mut self, viewport: Viewport, color: Color) {
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
	}

	fn fill_linear_gradient(
		&mut self,
		viewport: Viewport,
		from: Point,
		to: Point,
		stops: &[GradientStop],
	) {
		let gradient = self.ctx.create_linear_gradient(from.x, from.y, to.x, to.y);
		Self::apply_stops(&gradient, stops);
		#[allow(deprecated)]
		self.ctx.set_fill_style(&gradient);
		self.ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
	}

	fn fill_radial_gradient(
		&mut self,
		center: Point,
		inner: f64,
		outer: f64,
		stops: &[GradientStop],
	) {
		let Ok(gradient) = self
			.ctx
			.create_radial_gradient(center.x, center.y, inner, center.x, center.y, outer)
		else {
			return;
		};
		Self::apply_stops(&gradient, stops);
		self.ctx.begin_path();
		let _ = self.ctx.arc(center.x, center.y, outer, 0.0, 2.0 * PI);
		#[allow(deprecated)]
		self.ctx.set_fill_style(&gradient);
		self.ctx.fill();
	}

	fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.begin_path();
		let _ = self.ctx.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
		self.ctx.fill();
	}

	fn stroke_path(&mut self, points: &[Point], width: f64, color: Color) {
		let Some((first, rest)) = points.split_first() else {
			return;
		};
		self.ctx.set_stroke_style_str(&color.to_css());
		self.ctx.set_line_width(width);
		self.ctx.set_line_cap("round");
		self.ctx.set_line_join("round");
		self.ctx.begin_path();
		self.ctx.move_to(first.x, first.y);
		for p in rest {
			self.ctx.line_to(p.x, p.y);
		}
		self.ctx.stroke();
	}
}

/// One recorded paint call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
	Clear,
	FillRect { color: Color },
	LinearGradient { stops: Vec<GradientStop> },
	RadialGradient { center: Point, inner: f64, outer: f64, stops: Vec<GradientStop> },
	Circle { center: Point, radius: f64, color: Color },
	Path { points: Vec<Point>, width: f64, color: Color },
}

/// Headless [`DrawSurface`] that records every call in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
	pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
	pub fn take(&mut self) -> Vec<DrawCommand> {
		std::mem::take(&mut self.commands)
	}
}

impl DrawSurface for RecordingSurface {
	fn clear(&mut self, _viewport: Viewport) {
		self.commands.push(DrawCommand::Clear);
	}

	fn fill_rect(&mut self, _viewport: Viewport, color: Color) {
		self.commands.push(DrawCommand::FillRect { color });
	}

	fn fill_linear_gradient(
		&mut self,
		_viewport: Viewport,
		_from: Point,
		_to: Point,
		stops: &[GradientStop],
	) {
		self.commands.push(DrawCommand::LinearGradient {
			stops: stops.to_vec(),
		});
	}

	fn fill_radial_gradient(
		&mut self,
		center: Point,
		inner: f64,
		outer: f64,
		stops: &[GradientStop],
	) {
		self.commands.push(DrawCommand::RadialGradient {
			center,
			inner,
			outer,
			stops: stops.to_vec(),
		});
	}

	fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
		self.commands.push(DrawCommand::Circle {
			center,
			radius,
			color,
		});
	}

	fn stroke_path(&mut self, points: &[Point], width: f64, color: Color) {
		self.commands.push(DrawCommand::Path {
			points: points.to_vec(),
			width,
			color,
		});
	}
}
