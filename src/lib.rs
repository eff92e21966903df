//! field-canvas: Procedural star, nebula and lightning backgrounds for the web.
//!
//! This crate provides a WASM canvas component that animates a layered,
//! pointer-reactive field behind page content, themed by time of day.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::field::{EngineConfig, FieldCanvas, Intensity, Preset, ThemeToken};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("field-canvas: logging initialized");
}

/// Load engine configuration from a script element with id="field-config".
///
/// Expected format: JSON object, e.g. `{ "preset": "storm", "intensity": "high" }`.
/// Missing or malformed config falls back to the defaults.
pub fn load_config() -> EngineConfig {
	let Some(json_text) = config_text() else {
		return EngineConfig::default();
	};
	match EngineConfig::from_json(&json_text) {
		Ok(config) => {
			info!(
				"field-canvas: loaded {} preset config",
				config.preset.name()
			);
			config
		}
		Err(e) => {
			warn!("field-canvas: failed to parse field config: {}", e);
			EngineConfig::default()
		}
	}
}

fn config_text() -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("field-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Theme for the visitor's local time.
fn theme_for_now() -> ThemeToken {
	ThemeToken::from_hour(js_sys::Date::new_0().get_hours())
}

fn prefers_reduced_motion(window: &Window) -> bool {
	window
		.match_media("(prefers-reduced-motion: reduce)")
		.ok()
		.flatten()
		.is_some_and(|query| query.matches())
}

/// Main application component.
/// Loads the field config from DOM and renders the animated background.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config();
	let theme = config.theme.unwrap_or_else(theme_for_now);
	let intensity = config.intensity;

	let window = web_sys::window();
	let reduced_motion = window.as_ref().is_some_and(prefers_reduced_motion);
	let document = window.as_ref().and_then(Window::document);
	let visible = RwSignal::new(document.as_ref().is_none_or(|d| !d.hidden()));

	if let Some(document) = document {
		let doc = document.clone();
		let on_visibility = Closure::<dyn FnMut()>::new(move || visible.set(!doc.hidden()));
		let _ = document.add_event_listener_with_callback(
			"visibilitychange",
			on_visibility.as_ref().unchecked_ref(),
		);
		// Lives as long as the page.
		on_visibility.forget();
	}
	if reduced_motion {
		info!("field-canvas: reduced motion requested, animation off");
	}

	let active = Signal::derive(move || !reduced_motion && visible.get());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=theme.name() />
		<Title text="Field" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-field">
			<FieldCanvas
				theme=Signal::stored(theme)
				active=active
				intensity=Signal::stored(intensity)
				config=config
				fullscreen=true
			/>
			<div class="field-overlay">
				<h1>"Field"</h1>
				<p class="subtitle">"Move the pointer to stir the stars."</p>
			</div>
		</div>
	}
}
