//! Window registry tests driven through the public context
//!
//! Properties before panels, name uniqueness, category membership,
//! visibility lookups and pre-render hooks.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{render_frame, render_frames};
use cvlog::window::PanelId;
use cvlog::{CvLog, ImagePanel, PlotPanel, ValueListPanel, WindowProperties};

#[test]
fn test_properties_before_panel_exists() {
    let log = CvLog::new();
    let ctx = egui::Context::default();

    log.set_window_properties(
        "A",
        WindowProperties::new()
            .category("Images")
            .help("help")
            .preferred_size(640.0, 480.0),
    );
    render_frames(&log, &ctx, 2);

    log.with_windows(|windows| {
        let data = windows.window("A").unwrap();
        assert_eq!(data.category(), "Images");
        assert_eq!(data.help(), "help");
        assert_eq!(data.preferred_content_size(), egui::vec2(640.0, 480.0));
        assert!(data.is_visible());
        assert!(!data.has_panel());
    }).unwrap();
}

#[test]
fn test_one_metadata_per_name() {
    let log = CvLog::new();
    let ctx = egui::Context::default();

    for _ in 0..3 {
        log.set_window_properties("A", WindowProperties::new().category("Images"));
        log.add_value("B", "k", 1);
    }
    log.update_image("C", common::gray(4, 4));
    render_frame(&log, &ctx).unwrap();
    log.add_value("B", "k", 2);
    render_frame(&log, &ctx).unwrap();

    log.with_windows(|windows| {
        let names: Vec<_> = windows.windows().iter().map(|w| w.name().to_string()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        for data in windows.windows() {
            assert_eq!(data.id(), PanelId::from_name(data.name()));
        }
        assert_eq!(windows.index().len(), 3);
    }).unwrap();
}

#[test]
fn test_every_window_in_exactly_one_category() {
    let log = CvLog::new();
    let ctx = egui::Context::default();

    log.add_value("Values", "k", 1);
    log.set_window_properties("Img", WindowProperties::new().category("Images"));
    log.set_window_properties("Img", WindowProperties::new().category("Other"));
    log.add_plot_value("Plot", "L", 1.0, 0.0, None);
    log.set_window_properties("Plot", WindowProperties::new().category("Plots"));
    render_frame(&log, &ctx).unwrap();

    log.with_windows(|windows| {
        for slot in 0..windows.windows().len() {
            assert_eq!(windows.categories().count_memberships(slot), 1);
        }
        assert_eq!(windows.window("Values").unwrap().category(), "Default");
        assert_eq!(windows.window("Img").unwrap().category(), "Other");
        assert_eq!(windows.window("Plot").unwrap().category(), "Plots");
    }).unwrap();
}

#[test]
fn test_window_is_visible_does_not_create() {
    let log = CvLog::new();
    assert!(!log.window_is_visible("Nobody"));
    assert!(log.window_visibility("Nobody").is_none());
    log.with_windows(|windows| assert!(windows.windows().is_empty())).unwrap();
    assert_eq!(log.pending_tasks(), 0);
}

#[test]
fn test_visibility_flag_follows_sidebar_toggles() {
    let log = CvLog::new();
    let ctx = egui::Context::default();
    log.add_value("Values", "k", 1);
    render_frame(&log, &ctx).unwrap();

    let flag = log.window_visibility("Values").unwrap();
    assert!(flag.get());
    log.apply_sidebar_action(cvlog::sidebar::SidebarAction::SetVisible("Values".into(), false))
        .unwrap();
    assert!(!flag.get());
    assert!(!log.window_is_visible("Values"));

    let again = log.window_visibility("Values").unwrap();
    assert!(again.same_flag(&flag));
}

#[test]
fn test_category_checkbox_action() {
    let log = CvLog::new();
    let ctx = egui::Context::default();
    for name in ["a", "b"] {
        log.set_window_properties(name, WindowProperties::new().category("Plots"));
    }
    log.set_window_properties("c", WindowProperties::new().category("Images"));
    render_frame(&log, &ctx).unwrap();

    log.apply_sidebar_action(cvlog::sidebar::SidebarAction::SetCategoryVisible(
        "Plots".into(),
        false,
    ))
    .unwrap();
    assert!(!log.window_is_visible("a"));
    assert!(!log.window_is_visible("b"));
    assert!(log.window_is_visible("c"));

    log.apply_sidebar_action(cvlog::sidebar::SidebarAction::ShowAll)
        .unwrap();
    assert!(log.window_is_visible("a"));
}

#[test]
fn test_pre_render_hooks_run_in_order_inside_window() {
    let log = CvLog::new();
    let ctx = egui::Context::default();
    let calls = Arc::new(std::sync::Mutex::new(Vec::new()));

    for name in ["first", "second"] {
        let calls = Arc::clone(&calls);
        log.set_window_pre_render_callback(
            "Values",
            name,
            Some(Box::new(move |_: &mut egui::Ui| calls.lock().unwrap().push(name))),
        );
    }
    log.add_value("Values", "k", 1);
    render_frame(&log, &ctx).unwrap();
    assert_eq!(*calls.lock().unwrap(), ["first", "second"]);

    log.set_window_pre_render_callback("Values", "first", None);
    calls.lock().unwrap().clear();
    render_frame(&log, &ctx).unwrap();
    assert_eq!(*calls.lock().unwrap(), ["second"]);

    log.with_windows(|windows| {
        let hooks: Vec<_> = windows.window("Values").unwrap().hook_names().collect();
        assert_eq!(hooks, ["second"]);
    }).unwrap();
}

#[test]
fn test_hooks_skip_hidden_windows() {
    let log = CvLog::new();
    let ctx = egui::Context::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    log.set_window_pre_render_callback(
        "Values",
        "count",
        Some(Box::new(move |_: &mut egui::Ui| {
            counter.fetch_add(1, Ordering::Relaxed);
        })),
    );
    log.add_value("Values", "k", 1);
    render_frame(&log, &ctx).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 1);

    log.with_windows(|windows| windows.set_visible("Values", false)).unwrap();
    render_frame(&log, &ctx).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn test_find_window_downcasts_by_type() {
    let log = CvLog::new();
    log.find_or_create_window::<PlotPanel>("P").unwrap();
    assert!(log.find_window::<PlotPanel>("P").is_some());
    assert!(log.find_window::<ImagePanel>("P").is_none());
    assert!(log.find_window::<ValueListPanel>("P").is_none());
    assert!(log.find_or_create_window::<ImagePanel>("P").is_none());
}

#[test]
fn test_value_list_keeps_latest_values() {
    let log = CvLog::new();
    let ctx = egui::Context::default();
    log.add_value("ValueList", "Thread1 Index", 1);
    log.add_value("ValueList", "Thread2 Status", "Started");
    render_frame(&log, &ctx).unwrap();
    log.add_value("ValueList", "Thread1 Index", 2);
    render_frame(&log, &ctx).unwrap();

    log.with_windows(|windows| {
        let panel = windows.panel::<ValueListPanel>("ValueList").unwrap();
        assert_eq!(
            panel.lines().collect::<Vec<_>>(),
            ["Thread1 Index = 2", "Thread2 Status = Started"]
        );
    }).unwrap();
}

#[test]
fn test_clear_window_only_clears_named_panel() {
    let log = CvLog::new();
    let ctx = egui::Context::default();
    log.add_value("A", "k", 1);
    log.add_value("B", "k", 1);
    render_frame(&log, &ctx).unwrap();

    log.clear_window("A");
    render_frame(&log, &ctx).unwrap();
    log.with_windows(|windows| {
        assert_eq!(windows.panel::<ValueListPanel>("A").unwrap().lines().count(), 0);
        assert_eq!(windows.panel::<ValueListPanel>("B").unwrap().lines().count(), 1);
    }).unwrap();

    log.clear_all();
    render_frame(&log, &ctx).unwrap();
    log.with_windows(|windows| {
        assert_eq!(windows.panel::<ValueListPanel>("B").unwrap().lines().count(), 0);
    }).unwrap();
}

#[test]
fn test_rendered_window_records_geometry() {
    let log = CvLog::new();
    let ctx = egui::Context::default();
    log.add_value("Values", "k", 1);
    render_frames(&log, &ctx, 2);

    log.with_windows(|windows| {
        let data = windows.window("Values").unwrap();
        assert!(data.last_rect.is_some());
        assert!(!data.docked);
    }).unwrap();
}

#[test]
fn test_fast_visibility_check_uses_global_context() {
    fn check() -> bool {
        cvlog::fast_visibility_check!("FastCheckWindow")
    }

    assert!(!check());
    let feed = cvlog::find_or_create_window::<ValueListPanel>("FastCheckWindow");
    assert!(feed.is_some());
    assert!(check());

    let flag = cvlog::window_visibility("FastCheckWindow").unwrap();
    flag.set(false);
    assert!(!check());
    flag.set(true);
    assert!(check());
}
