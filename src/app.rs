use crate::error::PlaybackError;
use crate::model::{Config, Step};
use crate::runner::RunReport;
use crate::session::PlaybackSession;
use crate::store::ConfigStore;
use crate::window::{WindowHandle, WindowRect};
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Stroke};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
enum Action {
    Edit(usize),
    MoveUp(usize),
    MoveDown(usize),
    Remove(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Screen {
    Configs,
    Steps(String),
}

/// Step being edited in the dialog. Committed wholesale on Save.
#[derive(Clone, Debug)]
pub(crate) struct EditDialog {
    pub(crate) index: usize,
    pub(crate) draft: Step,
}

pub struct AppState {
    pub(crate) store: ConfigStore,
    store_path: PathBuf,
    pub(crate) session: PlaybackSession,

    pub(crate) screen: Screen,
    pub(crate) new_config_name: String,
    pub(crate) editing: Option<EditDialog>,

    pub(crate) window_titles: Vec<String>,
    pub(crate) selected_title: Option<String>,
    pub(crate) repeat_count: u32,
    pub(crate) overlay: Option<(WindowHandle, WindowRect)>,

    pub(crate) notice: Option<String>,
    pub(crate) last_report: Option<RunReport>,
}

impl AppState {
    pub fn new(store: ConfigStore, store_path: PathBuf, session: PlaybackSession) -> Self {
        let mut state = Self {
            store,
            store_path,
            session,
            screen: Screen::Configs,
            new_config_name: String::new(),
            editing: None,
            window_titles: Vec::new(),
            selected_title: None,
            repeat_count: 1,
            overlay: None,
            notice: None,
            last_report: None,
        };
        state.refresh_windows();
        state
    }

    /// Show a warning on the next frame.
    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::warn!("{msg}");
        self.notice = Some(msg);
    }

    fn current_config(&self) -> Option<&Config> {
        match &self.screen {
            Screen::Steps(name) => self.store.get(name),
            Screen::Configs => None,
        }
    }

    fn current_name(&self) -> Option<String> {
        match &self.screen {
            Screen::Steps(name) => Some(name.clone()),
            Screen::Configs => None,
        }
    }

    pub(crate) fn add_config(&mut self) {
        let name = std::mem::take(&mut self.new_config_name);
        if name.trim().is_empty() {
            return;
        }
        if let Err(e) = self.store.add_config(&name) {
            self.warn(e.to_string());
        }
    }

    pub(crate) fn enter_config(&mut self, name: &str) {
        if self.store.get(name).is_some() {
            self.screen = Screen::Steps(name.to_string());
        }
    }

    pub(crate) fn back_to_configs(&mut self) {
        self.editing = None;
        self.screen = Screen::Configs;
    }

    pub(crate) fn add_step(&mut self) {
        let Some(name) = self.current_name() else { return };
        if let Err(e) = self.store.add_step(&name) {
            self.warn(e.to_string());
        }
    }

    fn apply(&mut self, action: Action) {
        let Some(name) = self.current_name() else { return };
        let result = match action {
            Action::Edit(i) => {
                if let Some(step) = self.store.get(&name).and_then(|c| c.steps.get(i)) {
                    self.editing = Some(EditDialog { index: i, draft: step.clone() });
                }
                Ok(())
            }
            Action::MoveUp(i) => self.store.move_step_up(&name, i),
            Action::MoveDown(i) => self.store.move_step_down(&name, i),
            Action::Remove(i) => {
                self.editing = None;
                self.store.delete_step(&name, i).map(|_| ())
            }
        };
        if let Err(e) = result {
            self.warn(e.to_string());
        }
    }

    pub(crate) fn commit_edit(&mut self) {
        let (Some(name), Some(dialog)) = (self.current_name(), self.editing.take()) else { return };
        if let Err(e) = self.store.edit_step(&name, dialog.index, dialog.draft) {
            self.warn(e.to_string());
        }
    }

    pub(crate) fn refresh_windows(&mut self) {
        self.window_titles = self.session.windows().titles();
        if let Some(sel) = &self.selected_title {
            if !self.window_titles.contains(sel) {
                self.selected_title = None;
            }
        }
        if self.selected_title.is_none() {
            self.selected_title = self.window_titles.first().cloned();
        }
    }

    fn resolve_selected(&self) -> Result<WindowHandle, PlaybackError> {
        let title = self.selected_title.as_deref().ok_or(PlaybackError::NoTargetWindow)?;
        self.session
            .windows()
            .resolve(title)
            .ok_or_else(|| PlaybackError::WindowNotFound(title.to_string()))
    }

    pub(crate) fn start(&mut self) {
        let Some(config) = self.current_config().cloned() else { return };
        let repeats = NonZeroU32::new(self.repeat_count).unwrap_or(NonZeroU32::MIN);
        let result = self
            .resolve_selected()
            .and_then(|handle| self.session.start(&config, repeats, Some(&handle)));
        match result {
            Ok(()) => {
                self.last_report = None;
                self.notice = None;
            }
            Err(e) => self.warn(e.to_string()),
        }
    }

    pub(crate) fn stop(&mut self) {
        self.session.stop();
    }

    pub(crate) fn toggle_overlay(&mut self) {
        if self.overlay.take().is_some() {
            return;
        }
        let target = self.resolve_selected().and_then(|handle| {
            let rect = self.session.windows().rect(&handle);
            rect.map(|r| (handle.clone(), r))
                .ok_or_else(|| PlaybackError::WindowNotFound(handle.title.clone()))
        });
        match target {
            Ok(t) => self.overlay = Some(t),
            Err(e) => self.warn(e.to_string()),
        }
    }

    pub(crate) fn poll_session(&mut self) {
        match self.session.poll() {
            Some(Ok(report)) => self.last_report = Some(report),
            Some(Err(e)) => {
                self.last_report = None;
                self.warn(e.to_string());
            }
            None => {}
        }
    }

    fn save_store(&self) {
        if let Err(e) = self.store.save(&self.store_path) {
            tracing::error!(error = %e, "failed to save configs");
        }
    }

    fn status_text(&self) -> String {
        if let Some(name) = self.session.running_config() {
            return format!("Running '{}' (press {} to stop)", name, self.session.options().stop_key);
        }
        match self.last_report {
            Some(r) if r.cancelled => format!("Stopped after {} clicks", r.clicks),
            Some(r) if r.skipped > 0 => {
                format!("Finished: {} clicks, {} skipped (window unavailable)", r.clicks, r.skipped)
            }
            Some(r) => format!("Finished: {} clicks over {} repeats", r.clicks, r.repeats_completed),
            None => "Idle".to_string(),
        }
    }

    fn window_selector(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let label = if self.overlay.is_some() { "Hide Overlay" } else { "Show Overlay" };
            if ui.button(label).clicked() {
                self.toggle_overlay();
            }
            ui.label("Attach to Window:");
            let selected = self.selected_title.clone().unwrap_or_else(|| "No windows found".to_string());
            egui::ComboBox::from_id_source("window_selector")
                .selected_text(selected)
                .width(220.0)
                .show_ui(ui, |ui| {
                    for title in &self.window_titles {
                        ui.selectable_value(&mut self.selected_title, Some(title.clone()), title);
                    }
                });
            if ui.button("⟳").clicked() {
                self.refresh_windows();
            }
        });
    }

    fn config_screen(&mut self, ui: &mut egui::Ui) {
        ui.heading("Configs");
        let mut open: Option<String> = None;
        egui::ScrollArea::vertical().max_height(360.0).show(ui, |ui| {
            for name in self.store.names() {
                if ui.selectable_label(false, name).clicked() {
                    open = Some(name.to_string());
                }
            }
        });
        if let Some(name) = open {
            self.enter_config(&name);
        }
        ui.separator();
        ui.horizontal(|ui| {
            let resp = ui.text_edit_singleline(&mut self.new_config_name);
            let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Add Config").clicked() || submitted {
                self.add_config();
            }
        });
    }

    fn step_screen(&mut self, ui: &mut egui::Ui) {
        let Some(config) = self.current_config() else {
            self.back_to_configs();
            return;
        };
        let heading = config.name.clone();
        let rows: Vec<String> = config.steps.iter().enumerate().map(|(i, s)| s.summary(i)).collect();

        ui.heading(heading);
        if ui.button("Back to Configs").clicked() {
            self.back_to_configs();
            return;
        }

        let mut action: Option<Action> = None;
        egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
            for (i, row) in rows.iter().enumerate() {
                ui.horizontal(|ui| {
                    ui.label(row);
                    if ui.small_button("▲").clicked() { action = Some(Action::MoveUp(i)); }
                    if ui.small_button("▼").clicked() { action = Some(Action::MoveDown(i)); }
                    if ui.small_button("Edit").clicked() { action = Some(Action::Edit(i)); }
                    if ui.small_button("🗑").clicked() { action = Some(Action::Remove(i)); }
                });
            }
        });
        if let Some(a) = action {
            self.apply(a);
        }
        if ui.button("Add Step").clicked() {
            self.add_step();
        }

        ui.separator();
        let running = self.session.is_running();
        ui.horizontal(|ui| {
            ui.label("Repeat:");
            ui.add(egui::DragValue::new(&mut self.repeat_count).clamp_range(1..=100_000));
            if ui.add_enabled(!running, egui::Button::new("Start")).clicked() {
                self.start();
            }
            if ui.add_enabled(running, egui::Button::new("Stop")).clicked() {
                self.stop();
            }
        });
    }

    fn edit_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.editing.as_mut() else { return };
        let mut save = false;
        let mut cancel = false;
        egui::Window::new("Edit Step")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let d = &mut dialog.draft;
                egui::Grid::new("edit_step_grid").num_columns(2).show(ui, |ui| {
                    ui.label("Name:");
                    ui.text_edit_singleline(&mut d.name);
                    ui.end_row();
                    ui.label("X:");
                    ui.add(egui::DragValue::new(&mut d.x).clamp_range(0..=3000));
                    ui.end_row();
                    ui.label("Y:");
                    ui.add(egui::DragValue::new(&mut d.y).clamp_range(0..=3000));
                    ui.end_row();
                    ui.label("Radius:");
                    ui.add(egui::DragValue::new(&mut d.radius).clamp_range(0..=500));
                    ui.end_row();
                    ui.label("Delay Min (s):");
                    ui.add(egui::DragValue::new(&mut d.delay_min).speed(0.1).clamp_range(0.0..=60.0));
                    ui.end_row();
                    ui.label("Delay Max (s):");
                    ui.add(egui::DragValue::new(&mut d.delay_max).speed(0.1).clamp_range(0.0..=60.0));
                    ui.end_row();
                });
                ui.horizontal(|ui| {
                    save = ui.button("Save").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });
        if save {
            self.commit_edit();
        } else if cancel {
            self.editing = None;
        }
    }

    fn show_overlay(&self, ctx: &egui::Context) {
        let Some((handle, rect)) = &self.overlay else { return };
        let ppp = ctx.pixels_per_point();
        let steps: Vec<Step> = self.current_config().map(|c| c.steps.clone()).unwrap_or_default();
        let origin = (rect.left, rect.top);

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("step_overlay"),
            egui::ViewportBuilder::default()
                .with_title(format!("Overlay: {}", handle.title))
                .with_position([rect.left as f32 / ppp, rect.top as f32 / ppp])
                .with_inner_size([rect.width as f32 / ppp, rect.height as f32 / ppp])
                .with_decorations(false)
                .with_transparent(true)
                .with_always_on_top()
                .with_mouse_passthrough(true),
            |ctx, _class| {
                egui::CentralPanel::default().frame(egui::Frame::none()).show(ctx, |ui| {
                    let painter = ui.painter();
                    painter.rect_filled(ui.max_rect(), 0.0, Color32::from_rgba_unmultiplied(0, 255, 0, 40));
                    for (i, step) in steps.iter().enumerate() {
                        let center = Pos2::new(
                            (step.x - origin.0) as f32 / ppp,
                            (step.y - origin.1) as f32 / ppp,
                        );
                        let radius = (step.radius as f32 / ppp).max(3.0);
                        painter.circle(
                            center,
                            radius,
                            Color32::from_rgba_unmultiplied(0, 255, 0, 70),
                            Stroke::new(2.0, Color32::LIGHT_GREEN),
                        );
                        painter.text(
                            center,
                            Align2::CENTER_CENTER,
                            (i + 1).to_string(),
                            FontId::proportional(14.0),
                            Color32::WHITE,
                        );
                    }
                });
            },
        );
    }
}

impl eframe::App for AppState {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_session();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            self.window_selector(ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.monospace(self.status_text());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(msg) = self.notice.clone() {
                ui.horizontal(|ui| {
                    ui.colored_label(Color32::YELLOW, msg);
                    if ui.small_button("✕").clicked() {
                        self.notice = None;
                    }
                });
                ui.separator();
            }
            match self.screen {
                Screen::Configs => self.config_screen(ui),
                Screen::Steps(_) => self.step_screen(ui),
            }
        });

        self.edit_dialog(ctx);
        self.show_overlay(ctx);

        if self.session.is_running() {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.session.stop();
        self.save_store();
    }
}
