//! Window placement: random initial positions and tile-and-scale
//!
//! Everything here is pure geometry on egui's `Rect`/`Vec2`, so it can be
//! exercised without a running GUI.

use std::cmp::Ordering;

use egui::{pos2, Pos2, Rect, Vec2};
use rand::Rng;

/// Width of the window list docked on the left edge
pub const SIDEBAR_WIDTH: f32 = 200.0;

/// Factor applied to every window size after a failed tiling pass
pub const SCALE_STEP: f32 = 0.95;

/// Tiling gives up after this many passes and accepts overflow.
/// The smallest scale ever tried is `SCALE_STEP^(MAX_TILE_PASSES - 1)`.
pub const MAX_TILE_PASSES: usize = 100;

/// Height egui adds on top of a window's content for the title bar
pub fn title_bar_height(style: &egui::Style) -> f32 {
    let font_size = style
        .text_styles
        .get(&egui::TextStyle::Heading)
        .map_or(18.0, |font| font.size);
    style.spacing.button_padding.y * 2.0 + font_size
}

/// Estimated size egui adds around a window's content: title bar, frame
/// margins and stroke. Replaced by the measured value once a window was
/// laid out.
pub fn window_chrome(style: &egui::Style) -> Vec2 {
    let stroke = style.visuals.window_stroke.width * 2.0;
    style.spacing.window_margin.sum() + Vec2::splat(stroke) + Vec2::new(0.0, title_bar_height(style))
}

/// Area windows are placed in: the viewport minus the sidebar strip
pub fn workspace_rect(viewport: Rect, sidebar_width: f32) -> Rect {
    Rect::from_min_max(
        pos2((viewport.min.x + sidebar_width).min(viewport.max.x), viewport.min.y),
        viewport.max,
    )
}

/// Uniformly random position keeping a window of `window_size` inside the workspace
pub fn initial_position<R: Rng + ?Sized>(window_size: Vec2, workspace: Rect, rng: &mut R) -> Pos2 {
    let span_x = (workspace.width() - window_size.x).max(0.0);
    let span_y = (workspace.height() - window_size.y).max(0.0);
    pos2(
        workspace.min.x + rng.random::<f32>() * span_x,
        workspace.min.y + rng.random::<f32>() * span_y,
    )
}

/// A window taking part in tiling
#[derive(Debug, Clone)]
pub struct TileRequest {
    pub name: String,
    /// Preferred content size, used for ordering
    pub content_size: Vec2,
    /// Preferred window size (content + frame), the size that gets scaled
    pub window_size: Vec2,
}

/// Result of [`tile_and_scale`]
#[derive(Debug, Clone, PartialEq)]
pub struct TilePlan {
    /// `(request index, window rect)` in placement order
    pub placements: Vec<(usize, Rect)>,
    pub scale: f32,
    /// False when the pass limit was hit and the last attempt overflows
    pub fits: bool,
}

fn tile_order(a: &TileRequest, b: &TileRequest) -> Ordering {
    a.content_size
        .y
        .total_cmp(&b.content_size.y)
        .then(a.content_size.x.total_cmp(&b.content_size.x))
        .then_with(|| a.name.cmp(&b.name))
}

/// Place windows in rows, shrinking all of them until they fit `workspace`
///
/// Windows are sorted by content height, then width, then name, and laid
/// out left to right. A window that does not fit the rest of a row starts a
/// new one below the tallest window of the current row.
pub fn tile_and_scale(requests: &[TileRequest], workspace: Rect) -> TilePlan {
    let mut order: Vec<usize> = (0..requests.len()).collect();
    order.sort_by(|&a, &b| tile_order(&requests[a], &requests[b]));

    let mut scale = 1.0;
    for pass in 1..=MAX_TILE_PASSES {
        let last_pass = pass == MAX_TILE_PASSES;
        if let Some((placements, fits)) = place_rows(requests, &order, workspace, scale, last_pass) {
            return TilePlan {
                placements,
                scale,
                fits,
            };
        }
        scale *= SCALE_STEP;
    }
    unreachable!("the last tiling pass always accepts its placements")
}

type Placements = Vec<(usize, Rect)>;

fn place_rows(
    requests: &[TileRequest],
    order: &[usize],
    workspace: Rect,
    scale: f32,
    accept_overflow: bool,
) -> Option<(Placements, bool)> {
    let mut placements = Vec::with_capacity(order.len());
    let mut fits = true;
    let mut x = workspace.min.x;
    let mut y = workspace.min.y;
    let mut row_height: f32 = 0.0;

    for &index in order {
        let size = requests[index].window_size * scale;

        if x > workspace.min.x && x + size.x > workspace.max.x {
            x = workspace.min.x;
            y += row_height;
            row_height = 0.0;
        }

        if x + size.x > workspace.max.x || y + size.y > workspace.max.y {
            if !accept_overflow {
                return None;
            }
            fits = false;
        }

        placements.push((index, Rect::from_min_size(pos2(x, y), size)));
        x += size.x;
        row_height = row_height.max(size.y);
    }

    Some((placements, fits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn request(name: &str, w: f32, h: f32) -> TileRequest {
        TileRequest {
            name: name.to_string(),
            content_size: Vec2::new(w, h),
            window_size: Vec2::new(w, h + 20.0),
        }
    }

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(1280.0, 720.0))
    }

    #[test]
    fn test_workspace_excludes_sidebar() {
        let area = workspace_rect(viewport(), SIDEBAR_WIDTH);
        assert_eq!(area.min, pos2(200.0, 0.0));
        assert_eq!(area.max, pos2(1280.0, 720.0));
    }

    #[test]
    fn test_initial_position_stays_in_workspace() {
        let area = workspace_rect(viewport(), SIDEBAR_WIDTH);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let pos = initial_position(Vec2::new(320.0, 260.0), area, &mut rng);
            assert!(pos.x >= 200.0 && pos.x <= 1280.0 - 320.0);
            assert!(pos.y >= 0.0 && pos.y <= 720.0 - 260.0);
        }
    }

    #[test]
    fn test_initial_position_oversized_window_pins_to_corner() {
        let area = workspace_rect(viewport(), SIDEBAR_WIDTH);
        let mut rng = StdRng::seed_from_u64(1);
        let pos = initial_position(Vec2::new(4000.0, 4000.0), area, &mut rng);
        assert_eq!(pos, pos2(200.0, 0.0));
    }

    #[test]
    fn test_tile_sorts_by_height_width_name() {
        let requests = vec![
            request("tall", 100.0, 300.0),
            request("b", 100.0, 100.0),
            request("a", 100.0, 100.0),
            request("wide", 200.0, 100.0),
        ];
        let plan = tile_and_scale(&requests, workspace_rect(viewport(), SIDEBAR_WIDTH));
        let order: Vec<_> = plan.placements.iter().map(|(i, _)| requests[*i].name.as_str()).collect();
        assert_eq!(order, ["a", "b", "wide", "tall"]);
        assert_eq!(plan.scale, 1.0);
        assert!(plan.fits);
        assert_eq!(plan.placements[0].1.min, pos2(200.0, 0.0));
        assert_eq!(plan.placements[1].1.min, pos2(300.0, 0.0));
    }

    #[test]
    fn test_tile_wraps_rows_at_tallest_window() {
        let requests = vec![
            request("a", 500.0, 100.0),
            request("b", 500.0, 150.0),
            request("c", 500.0, 200.0),
        ];
        let plan = tile_and_scale(&requests, workspace_rect(viewport(), SIDEBAR_WIDTH));
        assert!(plan.fits);
        let c = plan.placements[2].1;
        assert_eq!(c.min, pos2(200.0, 170.0));
    }

    #[test]
    fn test_tile_scales_down_until_everything_fits() {
        let requests: Vec<_> = (0..20)
            .map(|i| request(&format!("panel{i}"), 200.0 + (i % 5) as f32 * 60.0, 150.0 + (i % 3) as f32 * 90.0))
            .collect();
        let view = viewport();
        let plan = tile_and_scale(&requests, workspace_rect(view, SIDEBAR_WIDTH));

        assert!(plan.fits);
        assert!(plan.scale < 1.0);
        assert_eq!(plan.placements.len(), 20);
        for (_, rect) in &plan.placements {
            assert!(rect.min.x >= SIDEBAR_WIDTH);
            assert!(rect.max.x <= view.max.x);
            assert!(rect.max.y <= view.max.y);
        }
    }

    #[test]
    fn test_tile_gives_up_after_pass_limit() {
        let requests = vec![request("huge", 1.0e9, 1.0e9)];
        let plan = tile_and_scale(&requests, workspace_rect(viewport(), SIDEBAR_WIDTH));
        assert!(!plan.fits);
        assert_eq!(plan.placements.len(), 1);
        let floor = SCALE_STEP.powi(MAX_TILE_PASSES as i32 - 1);
        assert!((plan.scale - floor).abs() < 1e-4);
    }

    #[test]
    fn test_tile_empty_input() {
        let plan = tile_and_scale(&[], workspace_rect(viewport(), SIDEBAR_WIDTH));
        assert!(plan.placements.is_empty());
        assert!(plan.fits);
    }

    #[test]
    fn test_title_bar_height_uses_heading_font() {
        let style = egui::Style::default();
        let heading = style.text_styles[&egui::TextStyle::Heading].size;
        let expected = style.spacing.button_padding.y * 2.0 + heading;
        assert_eq!(title_bar_height(&style), expected);
    }

    #[test]
    fn test_window_chrome_adds_margins_and_stroke() {
        let mut style = egui::Style::default();
        style.spacing.window_margin = egui::Margin::same(6);
        style.visuals.window_stroke.width = 1.0;
        let chrome = window_chrome(&style);
        assert_eq!(chrome.x, 14.0);
        assert_eq!(chrome.y, 14.0 + title_bar_height(&style));
    }
}
