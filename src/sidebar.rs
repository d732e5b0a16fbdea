//! Window list docked on the left edge
//!
//! The sidebar draws the "CVLog" menu, application menus and the category
//! tree. It never mutates the registry while drawing; every user gesture is
//! returned as a [`SidebarAction`] and applied after the panel is drawn.

use std::fs;
use std::path::{Path, PathBuf};

use egui::collapsing_header::CollapsingState;

use crate::window::{CategoryState, WindowManager};

/// User gesture collected while drawing the sidebar
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarAction {
    ShowAll,
    HideAll,
    TileWindows,
    ClearAll,
    OpenSaveDialog,
    CancelSave,
    /// Save the layout under `<name>.ini` in the layouts directory
    SaveLayout(String),
    LoadPreset(PathBuf),
    SetVisible(String, bool),
    SetCategoryVisible(String, bool),
}

/// State of the "Save Layout As..." modal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveDialog {
    pub name: String,
    /// Error of the last save attempt, shown until the next attempt
    pub error: Option<String>,
}

pub struct Sidebar {
    width: f32,
    layouts_dir: Option<PathBuf>,
    save_dialog: Option<SaveDialog>,
}

impl Sidebar {
    /// `layouts_dir` defaults to the current working directory
    pub fn new(width: f32, layouts_dir: Option<PathBuf>) -> Self {
        Self {
            width,
            layouts_dir,
            save_dialog: None,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub fn set_layouts_dir(&mut self, dir: Option<PathBuf>) {
        self.layouts_dir = dir;
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.layouts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Path a layout named `name` is saved to
    pub fn layout_path(&self, name: &str) -> PathBuf {
        layout_file(self.layouts_dir.as_deref(), name)
    }

    /// `*.ini` files in the layouts directory, sorted by name
    pub fn presets(&self) -> Vec<PathBuf> {
        list_presets(&self.layouts_dir())
    }

    pub fn save_dialog(&self) -> Option<&SaveDialog> {
        self.save_dialog.as_ref()
    }

    pub fn open_save_dialog(&mut self) {
        self.save_dialog.get_or_insert_with(SaveDialog::default);
    }

    pub fn close_save_dialog(&mut self) {
        self.save_dialog = None;
    }

    pub fn set_save_error(&mut self, error: String) {
        if let Some(dialog) = &mut self.save_dialog {
            dialog.error = Some(error);
        }
    }

    /// Draw the sidebar and the save modal, returning the gestures of this frame
    pub fn show(&mut self, ctx: &egui::Context, windows: &mut WindowManager) -> Vec<SidebarAction> {
        let mut actions = Vec::new();

        egui::SidePanel::left("cvlog_sidebar")
            .exact_width(self.width)
            .resizable(false)
            .show(ctx, |ui| {
                egui::MenuBar::new().ui(ui, |ui| {
                    self.cvlog_menu(ui, &mut actions);
                    for (_, callback) in windows.menu_callbacks_mut() {
                        callback(ui);
                    }
                });
                ui.separator();
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| category_tree(ui, windows, &mut actions));
            });

        self.save_dialog_ui(ctx, &mut actions);
        actions
    }

    fn cvlog_menu(&self, ui: &mut egui::Ui, actions: &mut Vec<SidebarAction>) {
        ui.menu_button("CVLog", |ui| {
            ui.menu_button("Windows", |ui| {
                for (label, action) in [
                    ("Show All", SidebarAction::ShowAll),
                    ("Hide All", SidebarAction::HideAll),
                    ("Tile Windows", SidebarAction::TileWindows),
                ] {
                    if ui.button(label).clicked() {
                        actions.push(action);
                        ui.close();
                    }
                }
            });

            if ui.button("Save Layout As...").clicked() {
                actions.push(SidebarAction::OpenSaveDialog);
                ui.close();
            }

            ui.menu_button("Load Preset", |ui| {
                let presets = self.presets();
                if presets.is_empty() {
                    ui.weak("No *.ini files");
                }
                for path in presets {
                    let label = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    if ui.button(label).clicked() {
                        actions.push(SidebarAction::LoadPreset(path));
                        ui.close();
                    }
                }
            });

            ui.separator();
            if ui.button("Clear All").clicked() {
                actions.push(SidebarAction::ClearAll);
                ui.close();
            }
        });
    }

    fn save_dialog_ui(&mut self, ctx: &egui::Context, actions: &mut Vec<SidebarAction>) {
        let Some(dialog) = &mut self.save_dialog else {
            return;
        };

        let modal = egui::Modal::new(egui::Id::new("cvlog_save_layout")).show(ctx, |ui| {
            ui.heading("Save Layout As");
            ui.label("Layout name (saved as <name>.ini):");
            let edit = ui.text_edit_singleline(&mut dialog.name);
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            if let Some(error) = &dialog.error {
                ui.colored_label(ui.visuals().error_fg_color, error);
            }

            let name = dialog.name.trim();
            ui.horizontal(|ui| {
                let ok = ui.add_enabled(!name.is_empty(), egui::Button::new("OK"));
                if ok.clicked() || (submitted && !name.is_empty()) {
                    actions.push(SidebarAction::SaveLayout(name.to_string()));
                }
                if ui.button("Cancel").clicked() {
                    actions.push(SidebarAction::CancelSave);
                }
            });
        });

        if modal.should_close() {
            actions.push(SidebarAction::CancelSave);
        }
    }
}

fn category_tree(ui: &mut egui::Ui, windows: &WindowManager, actions: &mut Vec<SidebarAction>) {
    for category in windows.categories().iter().filter(|c| !c.windows.is_empty()) {
        let state = windows
            .category_state(&category.name)
            .unwrap_or(CategoryState::Visible);
        let id = ui.make_persistent_id(("cvlog_category", &category.name));

        CollapsingState::load_with_default_open(ui.ctx(), id, true)
            .show_header(ui, |ui| {
                ui.label(&category.name);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let mut all_visible = state == CategoryState::Visible;
                    let checkbox = egui::Checkbox::without_text(&mut all_visible)
                        .indeterminate(state == CategoryState::Mixed);
                    if ui.add(checkbox).changed() {
                        actions.push(SidebarAction::SetCategoryVisible(
                            category.name.clone(),
                            all_visible,
                        ));
                    }
                });
            })
            .body(|ui| {
                for data in category.windows.iter().filter_map(|&slot| windows.window_at(slot)) {
                    let mut visible = data.is_visible();
                    let response = ui
                        .scope(|ui| {
                            if !data.has_panel() {
                                ui.multiply_opacity(0.5);
                            }
                            ui.checkbox(&mut visible, data.name())
                        })
                        .inner
                        .on_hover_ui(|ui| {
                            ui.strong(data.name());
                            ui.label(data.help());
                        });
                    if response.changed() {
                        actions.push(SidebarAction::SetVisible(data.name().to_string(), visible));
                    }
                }
            });
    }
}

/// `<name>.ini` inside `dir`, the current directory when unset
pub fn layout_file(dir: Option<&Path>, name: &str) -> PathBuf {
    dir.unwrap_or(Path::new(".")).join(format!("{}.ini", name))
}

fn list_presets(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot list presets in {}: {}", dir.display(), e);
            return Vec::new();
        }
    };
    let mut presets: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ini"))
        })
        .collect();
    presets.sort();
    presets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_path_uses_layouts_dir() {
        let sidebar = Sidebar::new(200.0, Some(PathBuf::from("/tmp/layouts")));
        assert_eq!(sidebar.layout_path("L"), PathBuf::from("/tmp/layouts/L.ini"));

        let cwd = Sidebar::new(200.0, None);
        assert_eq!(cwd.layout_path("L"), PathBuf::from("./L.ini"));
    }

    #[test]
    fn test_presets_lists_ini_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.ini", "a.INI", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("dir.ini")).unwrap();

        let sidebar = Sidebar::new(200.0, Some(dir.path().to_path_buf()));
        let names: Vec<_> = sidebar
            .presets()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, ["a.INI", "b.ini"]);
    }

    #[test]
    fn test_missing_layouts_dir_has_no_presets() {
        let sidebar = Sidebar::new(200.0, Some(PathBuf::from("/definitely/not/here")));
        assert!(sidebar.presets().is_empty());
    }

    #[test]
    fn test_save_dialog_keeps_error_until_closed() {
        let mut sidebar = Sidebar::new(200.0, None);
        sidebar.set_save_error("ignored".into());
        assert!(sidebar.save_dialog().is_none());

        sidebar.open_save_dialog();
        sidebar.set_save_error("Failed to write layout".into());
        assert_eq!(
            sidebar.save_dialog().and_then(|d| d.error.as_deref()),
            Some("Failed to write layout")
        );

        sidebar.close_save_dialog();
        assert!(sidebar.save_dialog().is_none());
    }
}
