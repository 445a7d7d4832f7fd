//! Built-in widgets.

mod button;
mod menu;
mod panel;
mod scroll_bar;
mod scrollable;
mod slider;
mod window;

pub use button::{Button, CheckBox};
pub use menu::{MainMenu, MenuItem};
pub use panel::{Container, Label, Panel};
pub use scroll_bar::{Orientation, ScrollBar, ScrollModel, MIN_THUMB_LENGTH, WHEEL_LINES};
pub use scrollable::ScrollableContainer;
pub use slider::Slider;
pub use window::Window;
