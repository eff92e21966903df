//! Compositor: paints one frame of the pool onto a [`DrawSurface`].
//!
//! Passes, back to front:
//! 1. Background gradient and vignette
//! 2. Nebula blobs, far to near
//! 3. Star bands 0 (back) to 2 (front)
//! 4. Lightning flash, bolts and branches
//! 5. Trail and ambient particles
//! 6. Pointer-centered readability overlay

use super::pointer::PointerState;
use super::pool::EntityPool;
use super::stars::STAR_LAYERS;
use super::surface::DrawSurface;
use super::theme::{Color, GradientStop};
use super::types::{Point, Viewport};

/// How far each star band follows the pointer parallax, back to front.
const STAR_PARALLAX: [f64; STAR_LAYERS] = [0.15, 0.35, 0.6];

/// Skip anything fainter than this.
const MIN_ALPHA: f64 = 0.01;

/// Read-only view of everything one frame needs. Borrowed for the duration of
/// the draw call only.
pub struct Frame<'a> {
	pub pool: &'a EntityPool,
	pub pointer: PointerState,
	/// Background stops, already cross-faded.
	pub background: &'a [GradientStop],
}

/// Renders the complete field. An empty viewport draws nothing.
pub fn render(frame: &Frame<'_>, surface: &mut dyn DrawSurface) {
	let viewport = frame.pool.viewport();
	if viewport.is_empty() {
		return;
	}

	surface.clear(viewport);
	draw_background(frame, viewport, surface);
	draw_nebulas(frame, viewport, surface);
	draw_stars(frame, viewport, surface);
	draw_lightning(frame, viewport, surface);
	draw_particles(frame, surface);
	draw_overlay(frame, viewport, surface);
}

fn draw_background(frame: &Frame<'_>, viewport: Viewport, surface: &mut dyn DrawSurface) {
	surface.fill_linear_gradient(
		viewport,
		Point::new(0.0, 0.0),
		Point::new(0.0, viewport.height),
		frame.background,
	);

	let vignette = frame.pool.palette().vignette;
	if vignette > 0.0 {
		let center = viewport.center();
		let outer = viewport.width.max(viewport.height) * 0.7;
		let inner = viewport.width.min(viewport.height) * 0.3;
		let stops = [
			(0.0, Color::rgba(0, 0, 0, 0.0)),
			(1.0, Color::rgb(0, 0, 0).with_alpha(vignette)),
		];
		surface.fill_radial_gradient(center, inner, outer, &stops);
	}
}

fn draw_nebulas(frame: &Frame<'_>, viewport: Viewport, surface: &mut dyn DrawSurface) {
	let center = viewport.center();
	for nebula in &frame.pool.nebulas.nebulas {
		let shift = frame
			.pointer
			.parallax_offset(center, 0.1 + 0.3 * nebula.depth, frame.pool.config());
		let position = nebula.position.offset(shift.x, shift.y);
		let radius = nebula.pulsed_radius();
		let alpha = nebula.color.a * nebula.opacity;
		if alpha < MIN_ALPHA || radius <= 0.0 {
			continue;
		}

		let stops = [
			(0.0, nebula.color.with_alpha(alpha)),
			(0.5, nebula.color.with_alpha(alpha * 0.4)),
			(1.0, nebula.color.with_alpha(0.0)),
		];
		surface.fill_radial_gradient(position, 0.0, radius, &stops);

		// A smaller lobe orbiting the core makes the rotation visible.
		let lobe = position.offset(
			nebula.rotation.cos() * radius * 0.35,
			nebula.rotation.sin() * radius * 0.35,
		);
		let lobe_stops = [
			(0.0, nebula.color.lighten(0.2).with_alpha(alpha * 0.6)),
			(1.0, nebula.color.with_alpha(0.0)),
		];
		surface.fill_radial_gradient(lobe, 0.0, radius * 0.6, &lobe_stops);
	}
}

fn draw_stars(frame: &Frame<'_>, viewport: Viewport, surface: &mut dyn DrawSurface) {
	let center = viewport.center();
	for (layer, parallax) in STAR_PARALLAX.iter().enumerate() {
		let shift = frame.pointer.parallax_offset(center, *parallax, frame.pool.config());
		for star in frame.pool.stars.in_layer(layer) {
			if star.opacity < MIN_ALPHA {
				continue;
			}
			let position = star.draw_position().offset(shift.x, shift.y);
			if star.size > 1.8 && star.opacity > 0.5 {
				let halo = [
					(0.0, star.color.with_alpha(star.opacity * 0.35)),
					(1.0, star.color.with_alpha(0.0)),
				];
				surface.fill_radial_gradient(position, 0.0, star.size * 4.0, &halo);
			}
			surface.fill_circle(position, star.size, star.color.with_alpha(star.opacity));
		}
	}
}

fn draw_lightning(frame: &Frame<'_>, viewport: Viewport, surface: &mut dyn DrawSurface) {
	let lightning = &frame.pool.lightning;
	let flash = lightning.flash * 0.12;
	if flash >= MIN_ALPHA * 0.5 {
		surface.fill_rect(viewport, frame.pool.palette().lightning.with_alpha(flash));
	}

	for bolt in &lightning.bolts {
		let alpha = bolt.alpha();
		if alpha < MIN_ALPHA {
			continue;
		}
		let core = bolt.color.lighten(0.5);

		let path = bolt.visible_path();
		if path.len() >= 2 {
			surface.stroke_path(&path, bolt.thickness * 4.0, bolt.color.with_alpha(alpha * 0.25));
			surface.stroke_path(&path, bolt.thickness, core.with_alpha(alpha));
		}
		for branch in bolt.visible_branches() {
			if branch.len() < 2 {
				continue;
			}
			let width = bolt.thickness * 0.6;
			surface.stroke_path(&branch, width * 3.0, bolt.color.with_alpha(alpha * 0.18));
			surface.stroke_path(&branch, width, core.with_alpha(alpha * 0.8));
		}
	}
}

fn draw_particles(frame: &Frame<'_>, surface: &mut dyn DrawSurface) {
	for p in &frame.pool.particles.particles {
		let alpha = p.opacity();
		if alpha < MIN_ALPHA {
			continue;
		}
		surface.fill_circle(p.position, p.size, p.color.with_alpha(alpha));
	}
}

/// Soft radial veil around the pointer (or the center before the first move)
/// that keeps foreground text legible over moving content.
fn draw_overlay(frame: &Frame<'_>, viewport: Viewport, surface: &mut dyn DrawSurface) {
	let strength = frame.pool.config().overlay_strength;
	let tint = frame.pool.palette().overlay;
	let alpha = tint.a * strength;
	if alpha < MIN_ALPHA {
		return;
	}
	let center = if frame.pointer.present {
		frame.pointer.position
	} else {
		viewport.center()
	};
	let radius = viewport.width.max(viewport.height) * 0.45;
	let stops = [
		(0.0, tint.with_alpha(alpha)),
		(0.6, tint.with_alpha(alpha * 0.4)),
		(1.0, tint.with_alpha(0.0)),
	];
	surface.fill_radial_gradient(center, 0.0, radius, &stops);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::field::config::EngineConfig;
	use crate::components::field::layer::FieldLayer;
	use crate::components::field::surface::{DrawCommand, RecordingSurface};
	use crate::components::field::theme::Palette;

	#[test]
	fn empty_viewport_draws_nothing() {
		let config = EngineConfig::default();
		let pool = EntityPool::new(Viewport::new(0.0, 0.0), Palette::night(), &config, 1);
		let palette = Palette::night();
		let frame = Frame {
			pool: &pool,
			pointer: PointerState::default(),
			background: &palette.background,
		};
		let mut surface = RecordingSurface::default();
		render(&frame, &mut surface);
		assert!(surface.commands.is_empty());
	}

	#[test]
	fn passes_run_back_to_front() {
		let config = EngineConfig::default();
		let palette = Palette::night();
		let mut pool = EntityPool::new(Viewport::new(640.0, 480.0), palette.clone(), &config, 3);
		for _ in 0..30 {
			pool.tick(16.0, &PointerState::default());
		}
		let frame = Frame {
			pool: &pool,
			pointer: PointerState::default(),
			background: &palette.background,
		};
		let mut surface = RecordingSurface::default();
		render(&frame, &mut surface);

		let commands = surface.take();
		assert_eq!(commands.first(), Some(&DrawCommand::Clear));
		assert!(matches!(commands[1], DrawCommand::LinearGradient { .. }));
		// Overlay is the final radial gradient.
		assert!(matches!(commands.last(), Some(DrawCommand::RadialGradient { .. })));

		// Vignette plus two gradients per nebula, all before the first star.
		let first_circle = commands
			.iter()
			.position(|c| matches!(c, DrawCommand::Circle { .. }))
			.unwrap();
		let gradients_before = commands[..first_circle]
			.iter()
			.filter(|c| matches!(c, DrawCommand::RadialGradient { .. }))
			.count();
		assert!(gradients_before > 2 * pool.nebulas.len());
	}
}
