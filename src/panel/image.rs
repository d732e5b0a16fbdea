//! Image panel: latest-bitmap handoff and aspect-preserving display
//!
//! Producers replace the pending bitmap; older frames are dropped. The render
//! thread snapshots the pending bitmap each frame and uploads it to a texture
//! only when its pixel storage changed.

use std::any::Any;
use std::sync::{Arc, Mutex};

use egui::{TextureHandle, TextureOptions, Vec2};

use super::{Panel, PanelType};
use crate::bitmap::Bitmap;
use crate::util::lock;
use crate::window::{VisibilityFlag, WindowShared};

/// Largest size with the image's aspect ratio that fits `available`
///
/// Fits the width when the image is relatively wider than the available
/// area (`h/w` of the image <= `h/w` of the area), otherwise the height.
pub fn fit_size(image: Vec2, available: Vec2) -> Vec2 {
    if image.x <= 0.0 || image.y <= 0.0 || available.x <= 0.0 || available.y <= 0.0 {
        return Vec2::ZERO;
    }
    let image_aspect = image.y / image.x;
    let available_aspect = available.y / available.x;
    if image_aspect <= available_aspect {
        Vec2::new(available.x, available.x * image_aspect)
    } else {
        Vec2::new(available.y / image_aspect, available.y)
    }
}

/// Producer handle of an image panel
#[derive(Debug)]
pub struct ImageFeed {
    visible: VisibilityFlag,
    pending: Mutex<Option<Bitmap>>,
}

impl ImageFeed {
    fn new(visible: VisibilityFlag) -> Self {
        Self {
            visible,
            pending: Mutex::new(None),
        }
    }

    /// Replace the pending bitmap; dropped while the panel is hidden
    pub fn update_image(&self, bitmap: Bitmap) {
        if !self.visible.get() {
            return;
        }
        *lock(&self.pending) = Some(bitmap);
    }

    /// Bitmap the next frame will display
    pub fn latest(&self) -> Option<Bitmap> {
        lock(&self.pending).clone()
    }

    fn clear(&self) {
        *lock(&self.pending) = None;
    }
}

pub struct ImagePanel {
    window: Arc<WindowShared>,
    feed: Arc<ImageFeed>,
    texture: Option<TextureHandle>,
    /// Bitmap currently held by `texture`
    uploaded: Option<Bitmap>,
    displayed: Option<Bitmap>,
    last_draw_size: Option<Vec2>,
}

impl ImagePanel {
    /// Bitmap shown by the last frame
    pub fn displayed(&self) -> Option<&Bitmap> {
        self.displayed.as_ref()
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Size the image was drawn at last frame
    pub fn last_draw_size(&self) -> Option<Vec2> {
        self.last_draw_size
    }

    fn upload(&mut self, ctx: &egui::Context, bitmap: &Bitmap) {
        let image = bitmap.to_color_image();
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                let name = format!("cvlog_image_{}", self.window.name());
                self.texture = Some(ctx.load_texture(name, image, TextureOptions::LINEAR));
            }
        }
        self.uploaded = Some(bitmap.clone());
    }
}

impl Panel for ImagePanel {
    fn window(&self) -> &WindowShared {
        &self.window
    }

    fn clear(&mut self) {
        self.feed.clear();
        self.displayed = None;
        self.last_draw_size = None;
    }

    fn begin_frame_window<'open>(&self, window: egui::Window<'open>) -> egui::Window<'open> {
        window.scroll(false)
    }

    fn sync(&mut self, ctx: &egui::Context) {
        self.displayed = self.feed.latest();
        let Some(bitmap) = self.displayed.clone() else {
            return;
        };
        if bitmap.is_empty() {
            return;
        }
        let unchanged = self
            .uploaded
            .as_ref()
            .is_some_and(|uploaded| uploaded.same_data(&bitmap));
        if !unchanged || self.texture.is_none() {
            self.upload(ctx, &bitmap);
        }
    }

    fn render(&mut self, ui: &mut egui::Ui) {
        let (Some(texture), Some(bitmap)) = (&self.texture, &self.displayed) else {
            return;
        };
        if bitmap.is_empty() {
            return;
        }
        let image_size = Vec2::new(bitmap.width() as f32, bitmap.height() as f32);
        let size = fit_size(image_size, ui.available_size());
        ui.add(egui::Image::new((texture.id(), size)));
        self.last_draw_size = Some(size);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl PanelType for ImagePanel {
    type Feed = ImageFeed;

    fn create(window: Arc<WindowShared>) -> Self {
        let feed = Arc::new(ImageFeed::new(window.visibility().clone()));
        Self {
            window,
            feed,
            texture: None,
            uploaded: None,
            displayed: None,
            last_draw_size: None,
        }
    }

    fn feed(&self) -> Arc<ImageFeed> {
        Arc::clone(&self.feed)
    }
}
