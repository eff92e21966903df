//! Leptos component wrapping the field canvas.
//!
//! The component creates the canvas, turns DOM events into [`EngineCommand`]s
//! and drives the [`FrameScheduler`] with `requestAnimationFrame`. Each frame
//! callback ticks the engine once and repaints through a [`CanvasSurface`].

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, Window};

use super::config::{EngineConfig, Intensity};
use super::engine::{EngineCommand, FieldEngine};
use super::scheduler::{FrameHost, FrameScheduler};
use super::surface::CanvasSurface;
use super::theme::ThemeToken;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Engine, scheduler and the canvas they paint on.
struct FieldRuntime {
	engine: FieldEngine,
	scheduler: FrameScheduler,
	surface: CanvasSurface,
	canvas: HtmlCanvasElement,
}

impl FieldRuntime {
	/// Queues a pointer move given client coordinates.
	fn pointer_at(&mut self, client_x: i32, client_y: i32, at_ms: f64) {
		let rect = self.canvas.get_bounding_client_rect();
		self.engine.queue(EngineCommand::PointerMove {
			x: client_x as f64 - rect.left(),
			y: client_y as f64 - rect.top(),
			at_ms,
		});
	}
}

/// [`FrameHost`] over `window.requestAnimationFrame`.
struct BrowserFrameHost {
	callback: FrameCallback,
}

impl FrameHost for BrowserFrameHost {
	fn request_frame(&mut self) -> Option<i32> {
		let window = web_sys::window()?;
		let callback = self.callback.borrow();
		let callback = callback.as_ref()?;
		window.request_animation_frame(callback.as_ref().unchecked_ref()).ok()
	}

	fn cancel_frame(&mut self, handle: i32) {
		if let Some(window) = web_sys::window() {
			let _ = window.cancel_animation_frame(handle);
		}
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Renders an animated star, nebula and lightning field on a canvas element.
///
/// `theme` and `intensity` may change at any time and take effect on the next
/// frame. While `active` is false no frames are requested at all. The
/// component sizes itself to its parent container by default; set
/// `fullscreen = true` to fill the viewport and follow window resizes.
/// Explicit `width`/`height` override automatic sizing.
#[component]
pub fn FieldCanvas(
	#[prop(into)] theme: Signal<ThemeToken>,
	#[prop(into)] active: Signal<bool>,
	#[prop(into)] intensity: Signal<Intensity>,
	#[prop(optional)] config: EngineConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let runtime: Rc<RefCell<Option<FieldRuntime>>> = Rc::new(RefCell::new(None));
	let frame: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (runtime_init, frame_init, resize_cb_init) =
		(runtime.clone(), frame.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = match (fullscreen, window_size(&window)) {
			(true, Some(size)) => size,
			_ => (
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			),
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => {
					warn!("field: canvas context is not 2d");
					return;
				}
			},
			_ => {
				warn!("field: no 2d context, field disabled");
				return;
			}
		};

		let config = EngineConfig {
			theme: Some(theme.get_untracked()),
			intensity: intensity.get_untracked(),
			seed: config.seed.or_else(|| Some(js_sys::Date::now() as u64)),
			..config.clone()
		};
		*runtime_init.borrow_mut() = Some(FieldRuntime {
			engine: FieldEngine::new(config, w, h),
			scheduler: FrameScheduler::default(),
			surface: CanvasSurface::new(ctx),
			canvas: canvas.clone(),
		});

		if fullscreen {
			let (runtime_resize, canvas_resize) = (runtime_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut rt) = *runtime_resize.borrow_mut() {
					rt.engine.queue(EngineCommand::Resize {
						width: nw,
						height: nh,
					});
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (runtime_anim, frame_inner) = (runtime_init.clone(), frame_init.clone());
		*frame_init.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			let mut host = BrowserFrameHost {
				callback: frame_inner.clone(),
			};
			let Ok(mut guard) = runtime_anim.try_borrow_mut() else {
				return;
			};
			let Some(rt) = guard.as_mut() else {
				return;
			};
			if !rt.canvas.is_connected() {
				warn!("field: canvas detached, stopping");
				rt.scheduler.stop(&mut host);
				return;
			}
			let Some(dt) = rt.scheduler.on_frame(timestamp, &mut host) else {
				return;
			};
			rt.engine.tick(dt, timestamp);
			rt.engine.render(&mut rt.surface);
		}));

		if active.get_untracked() {
			if let Some(ref mut rt) = *runtime_init.borrow_mut() {
				rt.scheduler.start(&mut BrowserFrameHost {
					callback: frame_init.clone(),
				});
			}
		}
	});

	// Cleanup closures must be Send; everything here lives on the main thread.
	let teardown = SendWrapper::new((runtime.clone(), frame.clone(), resize_cb.clone()));
	on_cleanup(move || {
		let (runtime, frame, resize_cb) = &*teardown;
		if let Ok(mut guard) = runtime.try_borrow_mut() {
			if let Some(rt) = guard.as_mut() {
				rt.scheduler.stop(&mut BrowserFrameHost {
					callback: frame.clone(),
				});
			}
		}
		if let (Some(window), Some(cb)) = (web_sys::window(), resize_cb.borrow().as_ref()) {
			let _ =
				window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		// Drops the frame closure and the runtime it holds.
		frame.borrow_mut().take();
	});

	let (runtime_active, frame_active) = (runtime.clone(), frame.clone());
	Effect::new(move |_| {
		let on = active.get();
		let mut host = BrowserFrameHost {
			callback: frame_active.clone(),
		};
		if let Some(ref mut rt) = *runtime_active.borrow_mut() {
			if on {
				rt.scheduler.start(&mut host);
			} else {
				rt.scheduler.stop(&mut host);
			}
		}
	});

	let runtime_theme = runtime.clone();
	Effect::new(move |_| {
		let token = theme.get();
		if let Some(ref mut rt) = *runtime_theme.borrow_mut() {
			rt.engine.queue(EngineCommand::SetTheme(token));
		}
	});

	let runtime_intensity = runtime.clone();
	Effect::new(move |_| {
		let tier = intensity.get();
		if let Some(ref mut rt) = *runtime_intensity.borrow_mut() {
			rt.engine.queue(EngineCommand::SetIntensity(tier));
		}
	});

	let runtime_mm = runtime.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(ref mut rt) = *runtime_mm.borrow_mut() {
			rt.pointer_at(ev.client_x(), ev.client_y(), ev.time_stamp());
		}
	};

	let runtime_tm = runtime.clone();
	let on_touchmove = move |ev: TouchEvent| {
		let Some(touch) = ev.touches().get(0) else {
			return;
		};
		if let Some(ref mut rt) = *runtime_tm.borrow_mut() {
			rt.pointer_at(touch.client_x(), touch.client_y(), ev.time_stamp());
		}
	};

	let runtime_ml = runtime.clone();
	let on_leave = move || {
		if let Some(ref mut rt) = *runtime_ml.borrow_mut() {
			rt.engine.queue(EngineCommand::PointerLeave);
		}
	};
	let on_mouseleave = {
		let on_leave = on_leave.clone();
		move |_: MouseEvent| on_leave()
	};
	let on_touchend = move |_: TouchEvent| on_leave();

	view! {
		<canvas
			node_ref=canvas_ref
			class="field-canvas"
			on:mousemove=on_mousemove
			on:mouseleave=on_mouseleave
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			style="display: block;"
		/>
	}
}
