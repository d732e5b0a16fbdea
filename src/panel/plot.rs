//! Plot panel: accumulating multi-series line plot
//!
//! Producers append `(group, x, y)` samples; a group seen for the first time
//! also queues its name and style. The render thread swaps the pending
//! samples out under the lock, appends them to per-group series and keeps the
//! data bounds up to date for the auto-fit controller.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};

use super::style::LineStyle;
use super::{Panel, PanelType};
use crate::util::lock;
use crate::window::{VisibilityFlag, WindowShared};

/// Hash of a group name
pub type GroupId = egui::Id;

/// Min/max of a set of samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl DataBounds {
    pub fn from_point(x: f64, y: f64) -> Self {
        Self {
            x_min: x,
            x_max: x,
            y_min: y,
            y_max: y,
        }
    }

    pub fn include(&mut self, x: f64, y: f64) {
        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(y);
        self.y_max = self.y_max.max(y);
    }

    fn extend(bounds: &mut Option<DataBounds>, x: f64, y: f64) {
        match bounds {
            Some(bounds) => bounds.include(x, y),
            None => *bounds = Some(DataBounds::from_point(x, y)),
        }
    }
}

/// Visible axis ranges of a plot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimits {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl AxisLimits {
    /// Limits with headroom so a growing series does not refit every frame
    pub fn padded(bounds: &DataBounds) -> Self {
        let y_min_factor = if bounds.y_min < 0.0 { 1.2 } else { 0.8 };
        Self {
            x: [bounds.x_min, bounds.x_max * 1.5],
            y: [bounds.y_min * y_min_factor, bounds.y_max * 1.2],
        }
    }

    pub fn contains(&self, bounds: &DataBounds) -> bool {
        self.x[0] <= bounds.x_min
            && self.x[1] >= bounds.x_max
            && self.y[0] <= bounds.y_min
            && self.y[1] >= bounds.y_max
    }

    fn from_plot_bounds(bounds: &PlotBounds) -> Self {
        let [x_min, y_min] = bounds.min();
        let [x_max, y_max] = bounds.max();
        Self {
            x: [x_min, x_max],
            y: [y_min, y_max],
        }
    }

    fn to_plot_bounds(self) -> PlotBounds {
        PlotBounds::from_min_max([self.x[0], self.y[0]], [self.x[1], self.y[1]])
    }
}

/// Auto-fit controller
///
/// While enabled, the plot is refit whenever the data leaves the limits
/// shown in the previous frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoFit {
    enabled: bool,
    previous: Option<AxisLimits>,
}

impl Default for AutoFit {
    fn default() -> Self {
        Self {
            enabled: true,
            previous: None,
        }
    }
}

impl AutoFit {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn previous(&self) -> Option<AxisLimits> {
        self.previous
    }

    /// Limits to force this frame, if any
    pub fn next_limits(&self, bounds: &DataBounds) -> Option<AxisLimits> {
        if !self.enabled {
            return None;
        }
        match self.previous {
            Some(previous) if previous.contains(bounds) => None,
            _ => Some(AxisLimits::padded(bounds)),
        }
    }

    /// Remember the limits the plot ended up showing
    pub fn record(&mut self, limits: AxisLimits) {
        self.previous = Some(limits);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One series of a plot
#[derive(Debug, Clone)]
pub struct GroupData {
    pub name: String,
    pub style: LineStyle,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub bounds: Option<DataBounds>,
}

impl GroupData {
    fn new(name: String, style: LineStyle) -> Self {
        Self {
            name,
            style,
            x: Vec::new(),
            y: Vec::new(),
            bounds: None,
        }
    }

    pub fn has_custom_line_color(&self) -> bool {
        self.style.has_custom_line_color()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    group: GroupId,
    x: f64,
    y: f64,
}

#[derive(Debug)]
struct PendingGroup {
    id: GroupId,
    name: String,
    style: String,
}

#[derive(Debug, Default)]
struct PlotInbox {
    samples: Vec<Sample>,
    groups: Vec<PendingGroup>,
    /// Groups already announced to the render thread
    known: HashSet<GroupId>,
}

/// Producer handle of a plot panel
#[derive(Debug)]
pub struct PlotFeed {
    visible: VisibilityFlag,
    inbox: Mutex<PlotInbox>,
}

impl PlotFeed {
    fn new(visible: VisibilityFlag) -> Self {
        Self {
            visible,
            inbox: Mutex::new(PlotInbox::default()),
        }
    }

    /// Append a sample to `group`; dropped while the panel is hidden
    ///
    /// `style` is only read the first time a group is seen.
    pub fn add_plot_value(&self, group: &str, y: f64, x: f64, style: Option<&str>) {
        if !self.visible.get() {
            return;
        }
        let id = GroupId::new(group);
        let mut inbox = lock(&self.inbox);
        if inbox.known.insert(id) {
            inbox.groups.push(PendingGroup {
                id,
                name: group.to_string(),
                style: style.unwrap_or_default().to_string(),
            });
        }
        inbox.samples.push(Sample { group: id, x, y });
    }

    pub fn pending_samples(&self) -> usize {
        lock(&self.inbox).samples.len()
    }

    fn clear(&self) {
        *lock(&self.inbox) = PlotInbox::default();
    }
}

pub struct PlotPanel {
    window: Arc<WindowShared>,
    feed: Arc<PlotFeed>,
    groups: Vec<GroupData>,
    group_index: HashMap<GroupId, usize>,
    /// Swap buffer for pending samples; keeps its capacity across frames
    scratch: Vec<Sample>,
    bounds: Option<DataBounds>,
    auto_fit: AutoFit,
}

impl PlotPanel {
    /// Groups in creation order
    pub fn groups(&self) -> &[GroupData] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&GroupData> {
        self.group_index
            .get(&GroupId::new(name))
            .map(|&index| &self.groups[index])
    }

    /// Bounds over every sample of every group
    pub fn bounds(&self) -> Option<DataBounds> {
        self.bounds
    }

    pub fn auto_fit(&self) -> &AutoFit {
        &self.auto_fit
    }

    pub fn auto_fit_mut(&mut self) -> &mut AutoFit {
        &mut self.auto_fit
    }

    /// Limits the next rendered frame will force, if any
    pub fn pending_limits(&self) -> Option<AxisLimits> {
        self.bounds
            .as_ref()
            .and_then(|bounds| self.auto_fit.next_limits(bounds))
    }

    fn install_group(&mut self, pending: PendingGroup) {
        if self.group_index.contains_key(&pending.id) {
            return;
        }
        let style = LineStyle::parse_or_default(&pending.style);
        self.group_index.insert(pending.id, self.groups.len());
        self.groups.push(GroupData::new(pending.name, style));
    }

    fn push_sample(&mut self, sample: Sample) {
        let Some(&index) = self.group_index.get(&sample.group) else {
            tracing::debug!("Dropping sample for unannounced group in {}", self.window.name());
            return;
        };
        let group = &mut self.groups[index];
        group.x.push(sample.x);
        group.y.push(sample.y);
        DataBounds::extend(&mut group.bounds, sample.x, sample.y);
        DataBounds::extend(&mut self.bounds, sample.x, sample.y);
    }
}

impl Panel for PlotPanel {
    fn window(&self) -> &WindowShared {
        &self.window
    }

    fn clear(&mut self) {
        self.feed.clear();
        self.groups.clear();
        self.group_index.clear();
        self.scratch.clear();
        self.bounds = None;
        self.auto_fit.reset();
    }

    fn sync(&mut self, _ctx: &egui::Context) {
        let new_groups = {
            let mut inbox = lock(&self.feed.inbox);
            std::mem::swap(&mut inbox.samples, &mut self.scratch);
            std::mem::take(&mut inbox.groups)
        };

        for group in new_groups {
            self.install_group(group);
        }

        let mut samples = std::mem::take(&mut self.scratch);
        for sample in samples.drain(..) {
            self.push_sample(sample);
        }
        self.scratch = samples;
    }

    fn render(&mut self, ui: &mut egui::Ui) {
        if self.groups.iter().all(GroupData::is_empty) {
            return;
        }

        let forced = self.pending_limits();
        let groups = &self.groups;
        let response = Plot::new(self.window.id().window_id().with("plot"))
            .legend(Legend::default())
            .allow_double_click_reset(false)
            .show(ui, |plot_ui| {
                if let Some(limits) = forced {
                    plot_ui.set_plot_bounds(limits.to_plot_bounds());
                }
                for group in groups.iter().filter(|g| !g.is_empty()) {
                    let points: PlotPoints = group
                        .x
                        .iter()
                        .zip(&group.y)
                        .map(|(&x, &y)| [x, y])
                        .collect();
                    let mut line = Line::new(group.name.as_str(), points);
                    if let Some(color) = group.style.color {
                        line = line.color(color.to_color32());
                    }
                    plot_ui.line(line);
                }
            });

        // egui_plot has no per-axis fit gesture; a double click toggles auto-fit
        if response.response.double_clicked() {
            self.auto_fit.toggle();
        }
        self.auto_fit
            .record(AxisLimits::from_plot_bounds(response.transform.bounds()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl PanelType for PlotPanel {
    type Feed = PlotFeed;

    fn create(window: Arc<WindowShared>) -> Self {
        let feed = Arc::new(PlotFeed::new(window.visibility().clone()));
        Self {
            window,
            feed,
            groups: Vec::new(),
            group_index: HashMap::new(),
            scratch: Vec::new(),
            bounds: None,
            auto_fit: AutoFit::default(),
        }
    }

    fn feed(&self) -> Arc<PlotFeed> {
        Arc::clone(&self.feed)
    }
}
