//! Main application UI and state management.
//! Handles the library, the markdown reader with notes, and review sessions.

use review_reader_app::database::db;
use review_reader_app::error::{AppError, Result};
use review_reader_app::export::json::{export_backup_to_path, read_backup, restore_backup};
use review_reader_app::import::directory::import_directory;
use review_reader_app::models::ebbinghaus::{describe_time_until_due, is_due};
use review_reader_app::models::{
    IntervalTable, Note, RecentReading, ReviewOutcome, ReviewSession, ReviewStats, ReviewTask,
    ReviewableFile, Theme, UserSettings,
};
use review_reader_app::time::{format_timestamp, local_day_bounds, now_millis};
use chrono::Local;
use eframe::egui;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Instant;

const RECENT_LIMIT: usize = 3;

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Library,
    Reader,
    Review,
}

/// A file opened in the reader together with its notes
struct ReaderState {
    file: ReviewableFile,
    notes: Vec<Note>,
    new_note: String,
    editing_note: Option<(i64, String)>,
    reading_progress: f64,
    opened_at: Instant,
}

/// Editable copy of the settings shown in the settings window
struct SettingsDraft {
    theme: Theme,
    font_size: f32,
    content_width: f32,
    intervals_text: String,
}

impl SettingsDraft {
    fn from_settings(settings: &UserSettings) -> Self {
        Self {
            theme: settings.theme,
            font_size: settings.font_size,
            content_width: settings.content_width,
            intervals_text: settings
                .review_intervals
                .minutes()
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Main application state
pub struct MyApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    conn: Arc<Mutex<Connection>>,

    current_screen: AppScreen,
    settings: UserSettings,

    files: Vec<ReviewableFile>,
    search_query: String,
    tasks: Vec<ReviewTask>,
    recent: Vec<RecentReading>,
    stats: ReviewStats,

    reader: Option<ReaderState>,
    review_session: Option<ReviewSession>,

    show_settings_dialog: bool,
    settings_draft: Option<SettingsDraft>,

    show_result_dialog: bool,
    result_message: String,
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(match self.settings.theme {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        });

        match self.current_screen {
            AppScreen::Library => self.render_library_screen(ctx),
            AppScreen::Reader => self.render_reader_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_settings_dialog {
            self.render_settings_dialog(ctx);
        }

        if self.show_result_dialog {
            egui::Window::new("Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.result_message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_result_dialog = false;
                    }
                });
        }
    }
}

impl MyApp {
    /// Creates the application and loads the library from the database
    pub fn new(conn: Connection) -> Self {
        let settings = db::load_settings(&conn).unwrap_or_else(|e| {
            log::warn!("Falling back to default settings: {}", e);
            UserSettings::default()
        });

        let mut app = Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            conn: Arc::new(Mutex::new(conn)),
            current_screen: AppScreen::Library,
            settings,
            files: Vec::new(),
            search_query: String::new(),
            tasks: Vec::new(),
            recent: Vec::new(),
            stats: ReviewStats::default(),
            reader: None,
            review_session: None,
            show_settings_dialog: false,
            settings_draft: None,
            show_result_dialog: false,
            result_message: String::new(),
        };
        app.refresh();
        app
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| AppError::LockPoisoned)?;
        f(&conn)
    }

    fn show_message(&mut self, message: String) {
        self.result_message = message;
        self.show_result_dialog = true;
    }

    fn report(&mut self, context: &str, error: AppError) {
        log::error!("{}: {}", context, error);
        self.show_message(format!("{}: {}", context, error));
    }

    /// Reloads every list shown on the library screen
    fn refresh(&mut self) {
        let now = now_millis();
        let (day_start, day_end) = local_day_bounds(now);
        let query = self.search_query.clone();

        let loaded = self.with_conn(|conn| {
            Ok((
                db::search_files(&query, conn)?,
                db::get_today_review_tasks(day_start, day_end, conn)?,
                db::get_recent_reading_files(RECENT_LIMIT, conn)?,
                db::get_review_stats(conn)?,
            ))
        });

        match loaded {
            Ok((files, tasks, recent, stats)) => {
                self.files = files;
                self.tasks = tasks;
                self.recent = recent;
                self.stats = stats;
            }
            Err(e) => self.report("Failed to load library", e),
        }
    }

    /// Renders the library with review tasks, recent reading and all files
    fn render_library_screen(&mut self, ctx: &egui::Context) {
        let mut action_open: Option<String> = None;
        let mut action_review = false;
        let mut action_import_dir = false;
        let mut action_export = false;
        let mut action_import_backup = false;
        let mut action_settings = false;
        let mut action_search = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(Local::now().format("%Y-%m-%d").to_string());
                ui.separator();
                if ui.button("Import Directory").clicked() {
                    action_import_dir = true;
                }
                if ui.button("Export Backup").clicked() {
                    action_export = true;
                }
                if ui.button("Import Backup").clicked() {
                    action_import_backup = true;
                }
                if ui.button("Settings").clicked() {
                    action_settings = true;
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                ui.label(format!("Files: {}", self.stats.total_files));
                ui.separator();
                ui.label(format!("Learned: {}", self.stats.learned_files));
                ui.separator();
                ui.label(format!("Reviews: {}", self.stats.total_reviews));
                ui.separator();
                let color = if self.stats.retention_rate >= 70 {
                    egui::Color32::from_rgb(63, 134, 0)
                } else {
                    egui::Color32::from_rgb(207, 19, 34)
                };
                ui.colored_label(color, format!("Retention: {}%", self.stats.retention_rate));
            });
            ui.separator();

            let now = now_millis();

            ui.horizontal(|ui| {
                ui.heading(format!("Today's Review ({})", self.tasks.len()));
                if !self.tasks.is_empty() && ui.button("Start Review").clicked() {
                    action_review = true;
                }
            });
            egui::ScrollArea::vertical()
                .id_source("tasks_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    if self.tasks.is_empty() {
                        ui.label("Nothing to review today");
                    }
                    for task in &self.tasks {
                        ui.horizontal(|ui| {
                            if ui.link(&task.file_name).clicked() {
                                action_open = Some(task.file_id.clone());
                            }
                            ui.label(format!("level {}", task.review_level));
                            if task.overdue {
                                ui.colored_label(egui::Color32::from_rgb(207, 19, 34), "overdue");
                            } else {
                                ui.label(describe_time_until_due(task.next_review_at, now));
                            }
                        });
                    }
                });
            ui.separator();

            ui.heading("Recent Reading");
            if self.recent.is_empty() {
                ui.label("No reading history yet");
            }
            for entry in &self.recent {
                ui.horizontal(|ui| {
                    if ui.link(&entry.file_name).clicked() {
                        action_open = Some(entry.file_id.clone());
                    }
                    ui.label(format!(
                        "read {} times, last {}",
                        entry.read_count,
                        format_timestamp(entry.last_read_at)
                    ));
                });
            }
            ui.separator();

            ui.heading(format!("Files ({})", self.files.len()));
            ui.horizontal(|ui| {
                ui.label("Search:");
                if ui.text_edit_singleline(&mut self.search_query).changed() {
                    action_search = true;
                }
            });

            let intervals = &self.settings.review_intervals;
            egui::ScrollArea::vertical()
                .id_source("files_list")
                .show(ui, |ui| {
                    for file in &self.files {
                        ui.group(|ui| {
                            ui.horizontal(|ui| {
                                if ui.link(&file.name).clicked() {
                                    action_open = Some(file.id.clone());
                                }
                                ui.label(&file.path);
                            });
                            ui.horizontal(|ui| {
                                let percent = intervals.progress_percent(file.review_level);
                                ui.add(
                                    egui::ProgressBar::new(percent as f32 / 100.0)
                                        .desired_width(120.0)
                                        .text(format!("{}%", percent)),
                                );
                                if !file.is_learned() {
                                    ui.label("not learned yet");
                                } else if is_due(file.next_review_at, now) {
                                    ui.label("due");
                                } else {
                                    ui.label(format!(
                                        "next review in {}",
                                        describe_time_until_due(file.next_review_at, now)
                                    ));
                                }
                            });
                        });
                    }
                });
        });

        // Execute deferred actions
        if action_search {
            self.refresh();
        }
        if action_import_dir {
            self.handle_import_directory();
        }
        if action_export {
            self.handle_export();
        }
        if action_import_backup {
            self.handle_import_backup();
        }
        if action_settings {
            self.settings_draft = Some(SettingsDraft::from_settings(&self.settings));
            self.show_settings_dialog = true;
        }
        if let Some(file_id) = action_open {
            self.open_reader(&file_id);
        }
        if action_review {
            self.start_review_session();
        }
    }

    /// Renders the reader with file content and the notes side panel
    fn render_reader_screen(&mut self, ctx: &egui::Context) {
        let font_size = self.settings.font_size;
        let content_width = self.settings.content_width;
        let intervals = self.settings.review_intervals.clone();
        let Some(reader) = &mut self.reader else {
            self.current_screen = AppScreen::Library;
            return;
        };

        let mut action_close = false;
        let mut action_learn = false;
        let mut action_remove = false;
        let mut action_add_note = false;
        let mut action_save_note = false;
        let mut action_delete_note: Option<i64> = None;
        let now = now_millis();

        egui::SidePanel::right("notes_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading(format!("Notes ({})", reader.notes.len()));
                ui.add(
                    egui::TextEdit::multiline(&mut reader.new_note)
                        .desired_rows(3)
                        .hint_text("Write a note"),
                );
                if ui.button("Add Note").clicked() && !reader.new_note.trim().is_empty() {
                    action_add_note = true;
                }
                ui.separator();

                egui::ScrollArea::vertical()
                    .id_source("notes_list")
                    .show(ui, |ui| {
                        for note in &reader.notes {
                            ui.group(|ui| {
                                let editing = reader
                                    .editing_note
                                    .as_mut()
                                    .filter(|(id, _)| *id == note.id);
                                match editing {
                                    Some((_, text)) => {
                                        ui.add(egui::TextEdit::multiline(text).desired_rows(3));
                                        if ui.button("Save").clicked() {
                                            action_save_note = true;
                                        }
                                    }
                                    None => {
                                        ui.label(&note.content);
                                        ui.small(format_timestamp(note.updated_at));
                                        ui.horizontal(|ui| {
                                            if ui.small_button("Edit").clicked() {
                                                reader.editing_note =
                                                    Some((note.id, note.content.clone()));
                                            }
                                            if ui.small_button("Delete").clicked() {
                                                action_delete_note = Some(note.id);
                                            }
                                        });
                                    }
                                }
                            });
                        }
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Back to Library").clicked() {
                    action_close = true;
                }
                ui.heading(&reader.file.name);
            });
            ui.label(&reader.file.path);

            ui.horizontal(|ui| {
                let percent = intervals.progress_percent(reader.file.review_level);
                ui.add(
                    egui::ProgressBar::new(percent as f32 / 100.0)
                        .desired_width(150.0)
                        .text(format!("Level {} ({}%)", reader.file.review_level, percent)),
                );
                if reader.file.is_learned() {
                    ui.label(format!(
                        "Last reviewed {}, next review: {}",
                        format_timestamp(reader.file.last_reviewed_at),
                        describe_time_until_due(reader.file.next_review_at, now)
                    ));
                } else if ui.button("Mark as learned").clicked() {
                    action_learn = true;
                }
            });

            ui.horizontal(|ui| {
                ui.label("Reading progress:");
                ui.add(egui::Slider::new(&mut reader.reading_progress, 0.0..=100.0).suffix("%"));
                if ui.button("Remove from library").clicked() {
                    action_remove = true;
                }
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .id_source("reader_content")
                .show(ui, |ui| {
                    ui.set_max_width(content_width);
                    ui.label(
                        egui::RichText::new(&reader.file.content)
                            .monospace()
                            .size(font_size),
                    );
                });
        });

        // Execute deferred actions
        if action_add_note {
            let content = std::mem::take(&mut reader.new_note);
            let file_id = reader.file.id.clone();
            let created = self.with_conn(|conn| db::create_note(&file_id, content.trim(), now, conn));
            match created {
                Ok(_) => self.reload_notes(),
                Err(e) => self.report("Failed to add note", e),
            }
        }
        if action_save_note {
            if let Some((note_id, content)) =
                self.reader.as_mut().and_then(|r| r.editing_note.take())
            {
                match self.with_conn(|conn| db::update_note(note_id, &content, now, conn)) {
                    Ok(()) => self.reload_notes(),
                    Err(e) => self.report("Failed to save note", e),
                }
            }
        }
        if let Some(note_id) = action_delete_note {
            match self.with_conn(|conn| db::delete_note(note_id, conn)) {
                Ok(()) => self.reload_notes(),
                Err(e) => self.report("Failed to delete note", e),
            }
        }
        if action_learn {
            self.handle_mark_as_learned();
        }
        if action_remove {
            self.handle_remove_file();
        } else if action_close {
            self.close_reader();
        }
    }

    /// Renders the review session screen
    fn render_review_screen(&mut self, ctx: &egui::Context) {
        let mut action_outcome: Option<ReviewOutcome> = None;
        let mut action_back = false;
        let font_size = self.settings.font_size;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &self.review_session else {
                action_back = true;
                return;
            };

            ui.heading("Review");
            ui.label(session.phase_message());
            ui.label(format!(
                "Progress: {} / {} remembered ({} remaining)",
                session.remembered_count(),
                session.total_count(),
                session.remaining_count()
            ));
            ui.add_space(20.0);

            if session.is_completed() {
                ui.heading("Well done!");
                ui.label("Every file due today has been reviewed.");
                ui.add_space(20.0);
                if ui.button("Back to Library").clicked() {
                    action_back = true;
                }
                return;
            }

            if let Some(task) = session.current_task() {
                let content = self
                    .files
                    .iter()
                    .find(|f| f.id == task.file_id)
                    .map(|f| f.content.as_str())
                    .unwrap_or("");

                ui.group(|ui| {
                    ui.set_min_height(200.0);
                    ui.heading(&task.file_name);
                    ui.label(format!(
                        "Level {}, last reviewed {}",
                        task.review_level,
                        format_timestamp(task.last_reviewed_at)
                    ));
                    ui.separator();
                    egui::ScrollArea::vertical()
                        .id_source("review_content")
                        .max_height(350.0)
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(content).monospace().size(font_size));
                        });
                });

                ui.add_space(20.0);
                ui.label("Do you still remember this note?");
                ui.horizontal(|ui| {
                    if ui.button("Remembered").clicked() {
                        action_outcome = Some(ReviewOutcome::Remembered);
                    }
                    if ui.button("Forgotten").clicked() {
                        action_outcome = Some(ReviewOutcome::Forgotten);
                    }
                });
            }

            ui.add_space(20.0);
            if ui.button("Back to Library").clicked() {
                action_back = true;
            }
        });

        // Execute deferred actions
        if let Some(outcome) = action_outcome {
            if let Some(session) = &mut self.review_session {
                if let Err(e) = session.submit(outcome, now_millis()) {
                    self.report("Failed to submit review", e);
                }
            }
        }
        if action_back {
            self.review_session = None;
            self.current_screen = AppScreen::Library;
            self.refresh();
        }
    }

    fn render_settings_dialog(&mut self, ctx: &egui::Context) {
        let Some(draft) = &mut self.settings_draft else {
            self.show_settings_dialog = false;
            return;
        };
        let mut action_save = false;
        let mut action_cancel = false;

        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::ComboBox::from_label("Theme")
                    .selected_text(match draft.theme {
                        Theme::Light => "Light",
                        Theme::Dark => "Dark",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut draft.theme, Theme::Light, "Light");
                        ui.selectable_value(&mut draft.theme, Theme::Dark, "Dark");
                    });
                ui.add(egui::Slider::new(&mut draft.font_size, 10.0..=32.0).text("Font size"));
                ui.add(
                    egui::Slider::new(&mut draft.content_width, 400.0..=1600.0)
                        .text("Content width"),
                );
                ui.label("Review intervals (minutes, comma separated):");
                ui.text_edit_singleline(&mut draft.intervals_text);

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        action_save = true;
                    }
                    if ui.button("Cancel").clicked() {
                        action_cancel = true;
                    }
                });
            });

        if action_save {
            let parsed = IntervalTable::parse(&draft.intervals_text);
            let draft_theme = draft.theme;
            let draft_font = draft.font_size;
            let draft_width = draft.content_width;
            match parsed {
                Ok(review_intervals) => {
                    let settings = UserSettings {
                        theme: draft_theme,
                        font_size: draft_font,
                        content_width: draft_width,
                        review_intervals,
                    };
                    match self.with_conn(|conn| db::save_settings(&settings, conn)) {
                        Ok(()) => {
                            self.settings = settings;
                            self.show_settings_dialog = false;
                            self.settings_draft = None;
                        }
                        Err(e) => self.report("Failed to save settings", e),
                    }
                }
                Err(e) => self.report("Settings not saved", e),
            }
        } else if action_cancel {
            self.show_settings_dialog = false;
            self.settings_draft = None;
        }
    }

    fn open_reader(&mut self, file_id: &str) {
        let loaded = self.with_conn(|conn| {
            Ok((db::get_file(file_id, conn)?, db::get_notes_by_file(file_id, conn)?))
        });
        match loaded {
            Ok((file, notes)) => {
                let reading_progress = file.reading_progress;
                self.reader = Some(ReaderState {
                    file,
                    notes,
                    new_note: String::new(),
                    editing_note: None,
                    reading_progress,
                    opened_at: Instant::now(),
                });
                self.current_screen = AppScreen::Reader;
            }
            Err(e) => self.report("Failed to open file", e),
        }
    }

    fn reload_notes(&mut self) {
        let Some(file_id) = self.reader.as_ref().map(|r| r.file.id.clone()) else {
            return;
        };
        match self.with_conn(|conn| db::get_notes_by_file(&file_id, conn)) {
            Ok(notes) => {
                if let Some(reader) = &mut self.reader {
                    reader.notes = notes;
                }
            }
            Err(e) => self.report("Failed to load notes", e),
        }
    }

    /// Saves reading progress and logs the reading session before leaving the reader
    fn close_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            let duration = reader.opened_at.elapsed().as_secs() as i64;
            let progress = reader.reading_progress;
            let scroll_position = reader.file.scroll_position;
            let file_id = reader.file.id;
            let saved = self.with_conn(|conn| {
                db::update_reading_progress(&file_id, progress, scroll_position, conn)?;
                db::record_reading_history(&file_id, Some(duration), Some(progress), now_millis(), conn)?;
                Ok(())
            });
            if let Err(e) = saved {
                self.report("Failed to save reading progress", e);
            }
        }
        self.current_screen = AppScreen::Library;
        self.refresh();
    }

    fn handle_mark_as_learned(&mut self) {
        let Some(file_id) = self.reader.as_ref().map(|r| r.file.id.clone()) else {
            return;
        };
        let updated = self.with_conn(|conn| {
            db::mark_as_learned(&file_id, now_millis(), conn)?;
            db::get_file(&file_id, conn)
        });
        match updated {
            Ok(file) => {
                if let Some(reader) = &mut self.reader {
                    reader.file = file;
                }
            }
            Err(e) => self.report("Failed to mark file as learned", e),
        }
    }

    fn handle_remove_file(&mut self) {
        if let Some(reader) = self.reader.take() {
            match self.with_conn(|conn| db::delete_file(&reader.file.id, conn)) {
                Ok(()) => self.show_message(format!("'{}' removed from library", reader.file.name)),
                Err(e) => self.report("Failed to remove file", e),
            }
        }
        self.current_screen = AppScreen::Library;
        self.refresh();
    }

    /// Starts a review session over today's tasks
    fn start_review_session(&mut self) {
        self.refresh();
        if self.tasks.is_empty() {
            return;
        }
        // The session shows file content, so make sure every task's file is loaded
        if !self.search_query.is_empty() {
            self.search_query.clear();
            self.refresh();
        }
        self.review_session = Some(ReviewSession::new_from_tasks(
            self.tasks.clone(),
            Arc::clone(&self.conn),
        ));
        self.current_screen = AppScreen::Review;
    }

    /// Imports a directory of markdown notes picked in a folder dialog
    fn handle_import_directory(&mut self) {
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };
        match self.with_conn(|conn| import_directory(&dir, now_millis(), conn)) {
            Ok(summary) => self.show_message(format!(
                "Imported '{}': {} new files, {} updated",
                dir.display(),
                summary.added,
                summary.updated
            )),
            Err(e) => self.report("Import failed", e),
        }
        self.refresh();
    }

    /// Exports the whole database to a JSON backup
    fn handle_export(&mut self) {
        let file_name = format!("review-backup-{}.json", Local::now().format("%Y-%m-%d"));
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(file_name)
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };
        match self.with_conn(|conn| export_backup_to_path(&path, now_millis(), conn)) {
            Ok(backup) => self.show_message(format!(
                "Exported {} files to '{}'",
                backup.files.len(),
                path.display()
            )),
            Err(e) => self.report("Export failed", e),
        }
    }

    /// Replaces the database contents with a JSON backup
    fn handle_import_backup(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };
        let restored = read_backup(&path).and_then(|backup| {
            self.with_conn(|conn| {
                let count = restore_backup(&backup, conn)?;
                Ok((count, db::load_settings(conn)?))
            })
        });
        match restored {
            Ok((count, settings)) => {
                self.settings = settings;
                self.show_message(format!("Restored {} files from backup", count));
            }
            Err(e) => self.report("Import failed", e),
        }
        self.refresh();
    }
}
