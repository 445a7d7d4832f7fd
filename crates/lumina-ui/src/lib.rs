//! Retained-mode UI for lumina.
//!
//! Widgets live in a [`UiTree`] that owns layout, z-order, focus and mouse
//! capture. Input goes in through [`UiTree::dispatch`] and comes out as
//! [`UiEvent`]s; drawing produces a [`DrawList`] that [`UiOverlay`] renders on
//! top of the frame. The [`editor`] module builds the engine's own property
//! windows and main menu from these pieces.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Pixel coordinates convert between integers and floats throughout
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![allow(clippy::module_name_repetitions)]

pub mod draw;
pub mod editor;
pub mod error;
pub mod font;
pub mod geometry;
pub mod input;
pub mod overlay_pass;
pub mod tree;
pub mod widget;
pub mod widgets;
pub mod winit_input;

pub use draw::{tessellate, Align, Color, DrawCommand, DrawList, Mesh, Theme, UiVertex};
pub use editor::{EditorAction, EditorUi, Property, PropertyWindow};
pub use error::{UiError, UiResult};
pub use geometry::Rect;
pub use input::{InputEvent, Key, MouseButton, UiEvent};
pub use overlay_pass::UiOverlay;
pub use tree::{UiTree, WidgetId};
pub use widget::{EventContext, Widget, WidgetState};
pub use widgets::{
    Button, CheckBox, Container, Label, MainMenu, MenuItem, Orientation, Panel, ScrollBar,
    ScrollModel, ScrollableContainer, Slider, Window,
};
pub use winit_input::InputTranslator;
