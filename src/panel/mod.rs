//! Panel system - typed windows fed from producer threads
//!
//! Every panel is split in two:
//!
//! - a *feed* (`ImageFeed`, `PlotFeed`, `ValueFeed`) shared with producers,
//!   buffering updates behind its own mutex
//! - the panel itself, owned by the [`crate::window::WindowManager`] and only
//!   touched on the render thread
//!
//! Each frame the manager calls [`Panel::sync`] to swap pending updates into
//! display state, then [`Panel::render`] inside the panel's egui window.
//!
//! ## Adding a panel type
//!
//! Implement [`Panel`] for the render half and [`PanelType`] to tell the
//! registry how to construct it and which feed producers receive.

mod image;
mod plot;
mod style;
mod values;

pub use self::image::{fit_size, ImageFeed, ImagePanel};
pub use self::plot::{AutoFit, AxisLimits, DataBounds, GroupData, GroupId, PlotFeed, PlotPanel};
pub use self::style::{LineColor, LineStyle};
pub use self::values::{ValueFeed, ValueListPanel};

use std::any::Any;
use std::sync::Arc;

use crate::window::WindowShared;

/// Render-thread half of a panel
pub trait Panel: Send + 'static {
    /// Metadata shared with producers
    fn window(&self) -> &WindowShared;

    fn name(&self) -> &str {
        self.window().name()
    }

    fn is_visible(&self) -> bool {
        self.window().is_visible()
    }

    /// Drop all displayed and pending content
    fn clear(&mut self);

    /// Adjust the egui window before it is shown (scroll bars, resizing, ...)
    fn begin_frame_window<'open>(&self, window: egui::Window<'open>) -> egui::Window<'open> {
        window
    }

    /// Swap pending producer updates into display state and upload textures
    fn sync(&mut self, ctx: &egui::Context);

    /// Draw the panel body
    fn render(&mut self, ui: &mut egui::Ui);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Construction side of a panel type
pub trait PanelType: Panel + Sized {
    /// Producer handle returned by `find_window`
    type Feed: Send + Sync + 'static;

    fn create(window: Arc<WindowShared>) -> Self;

    fn feed(&self) -> Arc<Self::Feed>;
}
