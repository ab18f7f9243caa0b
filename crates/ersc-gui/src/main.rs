use chrono::{DateTime, Local};
use eframe::{App, egui};
use ersc_core::{
    BackupPolicy, CopyOptions, CopySession, SlotSummary, append_error_log, default_save_dir,
    find_save_file,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum MessageKind {
    Error,
    #[default]
    Info,
    Success,
}

impl MessageKind {
    fn color(self) -> egui::Color32 {
        match self {
            MessageKind::Error => egui::Color32::from_rgb(255, 140, 0),
            MessageKind::Info => egui::Color32::WHITE,
            MessageKind::Success => egui::Color32::GOLD,
        }
    }
}

#[derive(Default)]
struct State {
    session: CopySession,
    status: String,
    status_kind: MessageKind,
    backup_keep: usize,
    remove_game_backup: bool,
    confirm_copy: bool,
    last_copy_time: Option<DateTime<Local>>,
}

impl State {
    fn set_status(&mut self, kind: MessageKind, msg: impl Into<String>) {
        self.status = msg.into();
        self.status_kind = kind;
    }

    fn log_dir(&self) -> PathBuf {
        self.session
            .target
            .as_ref()
            .and_then(|t| t.path.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_exe().ok()?.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn report_error(&mut self, msg: &str, err: &ersc_core::CoreError) {
        tracing::error!(error = %err, "{msg}");
        if let Err(e) = append_error_log(&self.log_dir(), msg, Some(&err.to_string())) {
            tracing::warn!(error = %e, "could not write error.log");
        }
        self.set_status(MessageKind::Error, format!("{msg}: {err}"));
    }
}

struct AppGui {
    state: State,
}

impl AppGui {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self {
            state: State {
                backup_keep: BackupPolicy::default().keep,
                remove_game_backup: true,
                ..Default::default()
            },
        };
        app.state.set_status(
            MessageKind::Info,
            "Select Source and Destination files and characters",
        );
        // A save sitting next to the executable is loaded as the source.
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf));
        if let Some(path) = exe_dir.as_deref().and_then(find_save_file) {
            app.load(&path, true);
        }
        app
    }

    fn pick_file(&self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Elden Ring Save File", &["sl2"])
            .add_filter("Elden Ring Coop Save File", &["co2"]);
        if let Some(dir) = default_save_dir() {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_file()
    }

    fn load(&mut self, path: &Path, is_source: bool) {
        let (res, which) = if is_source {
            (self.state.session.load_source(path), "source")
        } else {
            (self.state.session.load_target(path), "target")
        };
        match res {
            Ok(()) => {
                let msg = if is_source {
                    "Source savegame file loaded successfully."
                } else {
                    "Target savegame file loaded successfully."
                };
                self.state.set_status(MessageKind::Info, msg);
            }
            Err(e) => self
                .state
                .report_error(&format!("Failed to load {which} savegame file"), &e),
        }
    }

    fn do_copy(&mut self) {
        let options = CopyOptions {
            backup: BackupPolicy { keep: self.state.backup_keep },
            remove_game_backup: self.state.remove_game_backup,
        };
        match self.state.session.copy(options) {
            Ok(outcome) => {
                self.state.last_copy_time = Some(Local::now());
                let mut msg = format!(
                    "Copy successful! Backup created at {}.",
                    outcome.backup.display()
                );
                if !self.state.remove_game_backup {
                    msg.push_str(" Delete ER0000.sl2.bak before loading the game.");
                }
                self.state.set_status(MessageKind::Success, msg);
            }
            Err(e) => self.state.report_error("Copy failed", &e),
        }
    }
}

fn slot_combo(
    ui: &mut egui::Ui,
    id: &str,
    hint: &str,
    slots: &[SlotSummary],
    selected: Option<usize>,
) -> Option<usize> {
    let text = selected
        .and_then(|i| slots.iter().find(|s| s.index == i))
        .map(|s| s.name.clone())
        .unwrap_or_default();
    let mut picked = selected;
    egui::ComboBox::from_id_source(id)
        .width(260.0)
        .selected_text(text)
        .show_ui(ui, |ui| {
            for s in slots {
                let label = if s.active {
                    format!("{}  (lvl {}, {})", s.name, s.level, s.play_time())
                } else {
                    s.name.clone()
                };
                ui.selectable_value(&mut picked, Some(s.index), label);
            }
        })
        .response
        .on_hover_text(hint);
    if picked != selected { picked } else { None }
}

impl App for AppGui {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(self.state.status_kind.color(), &self.state.status);
                if let Some(time) = self.state.last_copy_time {
                    ui.separator();
                    ui.label(format!("Last copy: {}", time.format("%Y-%m-%d %H:%M:%S")));
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Elden Ring Save Copy");
            ui.separator();

            egui::Grid::new("files").num_columns(3).spacing([12.0, 8.0]).show(ui, |ui| {
                ui.label("Source");
                let src_path = self.state.session.source.as_ref().map(|s| s.path.display().to_string());
                ui.label(src_path.unwrap_or_else(|| "No file selected".into()));
                if ui.button("Browse…").clicked()
                    && let Some(p) = self.pick_file()
                {
                    self.load(&p, true);
                }
                ui.end_row();

                ui.label("Character");
                let picked = match &self.state.session.source {
                    Some(src) => slot_combo(
                        ui,
                        "source_slot",
                        "Select the character you want to copy from",
                        &src.slots,
                        self.state.session.source_selection.index(),
                    ),
                    None => None,
                };
                if let Some(i) = picked {
                    self.state.session.select_source(i);
                }
                ui.end_row();

                ui.label("Destination");
                let dst_path = self.state.session.target.as_ref().map(|s| s.path.display().to_string());
                ui.label(dst_path.unwrap_or_else(|| "No file selected".into()));
                if ui.button("Browse…").clicked()
                    && let Some(p) = self.pick_file()
                {
                    self.load(&p, false);
                }
                ui.end_row();

                ui.label("Slot");
                let picked = match &self.state.session.target {
                    Some(dst) => slot_combo(
                        ui,
                        "target_slot",
                        "Select the slot where you want to copy the character to",
                        &dst.slots,
                        self.state.session.target_selection.index(),
                    ),
                    None => None,
                };
                if let Some(i) = picked {
                    self.state.session.select_target(i);
                }
                ui.end_row();
            });

            ui.separator();
            ui.horizontal(|ui| {
                ui.label("Backups to keep (0 = all):");
                ui.add(egui::DragValue::new(&mut self.state.backup_keep).speed(1));
                ui.checkbox(&mut self.state.remove_game_backup, "Delete the game's .bak after copying");
            });
            ui.separator();

            let can_copy = self.state.session.can_copy();
            let label = self.state.session.copy_label();
            let fill = if can_copy {
                egui::Color32::from_rgb(218, 165, 32)
            } else {
                egui::Color32::from_rgb(255, 140, 0)
            };
            let button = egui::Button::new(label).fill(fill).min_size(egui::vec2(ui.available_width(), 36.0));
            if ui
                .add_enabled(can_copy && !self.state.confirm_copy, button)
                .on_hover_text("Copy the selected character to the destination slot")
                .clicked()
            {
                self.state.confirm_copy = true;
            }

            if self.state.confirm_copy {
                ui.horizontal(|ui| {
                    ui.label("Overwrite the destination file? A backup is taken first.");
                    if ui.button("Confirm").clicked() {
                        self.do_copy();
                        self.state.confirm_copy = false;
                    }
                    if ui.button("Cancel").clicked() {
                        self.state.confirm_copy = false;
                    }
                });
            }
        });
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let native_options = eframe::NativeOptions {
        viewport: egui::viewport::ViewportBuilder::default()
            .with_inner_size([720.0, 420.0])
            .with_min_inner_size([600.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Elden Ring Save Copy",
        native_options,
        Box::new(|cc| Ok(Box::new(AppGui::new(cc)))),
    )
}
