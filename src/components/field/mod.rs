//! Procedural field background.
//!
//! Animates a layered scene on an HTML canvas:
//! - Drifting, twinkling stars in three depth bands
//! - Slow nebula blobs with pointer parallax
//! - Branching lightning strikes with a sky flash
//! - Pointer trail and ambient particles
//!
//! The simulation ([`FieldEngine`] and the layers it owns) has no DOM
//! dependency and paints through [`DrawSurface`]; [`FieldCanvas`] is the
//! browser host.
//!
//! # Example
//!
//! ```ignore
//! use field_canvas::{EngineConfig, FieldCanvas, Intensity, Preset, ThemeToken};
//!
//! let config = EngineConfig::from_preset(Preset::Storm);
//! view! {
//!     <FieldCanvas
//!         theme=Signal::stored(ThemeToken::Night)
//!         active=Signal::stored(true)
//!         intensity=Signal::stored(Intensity::High)
//!         config=config
//!         fullscreen=true
//!     />
//! }
//! ```

mod component;
pub mod config;
pub mod engine;
pub mod layer;
pub mod lightning;
pub mod nebula;
pub mod particles;
pub mod pointer;
pub mod pool;
pub mod render;
pub mod scheduler;
pub mod stars;
pub mod surface;
pub mod theme;
pub mod types;

pub use component::FieldCanvas;
pub use config::{EngineConfig, Intensity, LayerToggles, Preset};
pub use engine::{EngineCommand, FieldEngine};
pub use pool::{EntityKind, EntityPool};
pub use scheduler::{FrameHost, FrameScheduler};
pub use surface::{CanvasSurface, DrawCommand, DrawSurface, RecordingSurface};
pub use theme::{Palette, ThemeToken, resolve};
pub use types::{Point, Viewport};
