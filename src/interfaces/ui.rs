use crate::application::client::{
    ClientCommand, ClientEvent, ClientSession, PredictionClient, PredictionState, SampleState,
};
use eframe::egui;
use egui_plot::{Bar, BarChart, Legend, Plot};
use std::path::Path;
use std::time::Duration;

const MAX_LOG_LINES: usize = 500;
const MAX_TABLE_ROWS: usize = 1_000;
const HISTOGRAM_BINS: usize = 20;

/// Result of the last save action, shown under the buttons
enum Notice {
    Info(String),
    Error(String),
}

pub struct SantanderApp {
    client: PredictionClient,
    session: ClientSession,
    logs: Vec<String>,
    upload_path: String,
    sample_save_path: String,
    predictions_save_path: String,
    notice: Option<Notice>,
}

impl SantanderApp {
    pub fn new(client: PredictionClient) -> Self {
        let mut app = Self {
            client,
            session: ClientSession::new(),
            logs: Vec::new(),
            upload_path: String::new(),
            sample_save_path: "sample_file.csv".to_string(),
            predictions_save_path: "predictions.csv".to_string(),
            notice: None,
        };
        app.request_sample();
        app
    }

    fn request_sample(&mut self) {
        if !self.session.needs_sample() {
            return;
        }
        match self.client.send(ClientCommand::FetchSample) {
            Ok(()) => self.session.begin_sample_fetch(),
            Err(e) => self.session.on_sample(Err(e.to_string())),
        }
    }

    fn submit(&mut self, file_name: String, bytes: Vec<u8>) {
        if self.session.is_busy() {
            return;
        }
        self.session.begin_prediction(file_name.clone());
        if let Err(e) = self.client.send(ClientCommand::Predict { file_name, bytes }) {
            self.session
                .on_prediction(crate::domain::ports::PredictOutcome::Unreachable(e.to_string()));
        }
    }

    fn submit_path(&mut self) {
        let path = self.upload_path.trim().to_string();
        if path.is_empty() {
            return;
        }
        match std::fs::read(&path) {
            Ok(bytes) => {
                let name = Path::new(&path)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or(path);
                self.submit(name, bytes);
            }
            Err(e) => self.notice = Some(Notice::Error(format!("Cannot read {path}: {e}"))),
        }
    }

    fn save(&mut self, path: &str, bytes: &[u8]) {
        self.notice = Some(match std::fs::write(path, bytes) {
            Ok(()) => Notice::Info(format!("Saved {} bytes to {}", bytes.len(), path)),
            Err(e) => Notice::Error(format!("Failed to save {path}: {e}")),
        });
    }

    /// Drain background events into the session.
    fn process_events(&mut self) {
        while let Some(event) = self.client.poll_next() {
            match event {
                ClientEvent::Log(line) => {
                    self.logs.push(line.trim_end().to_string());
                    if self.logs.len() > MAX_LOG_LINES {
                        let excess = self.logs.len() - MAX_LOG_LINES;
                        self.logs.drain(..excess);
                    }
                }
                ClientEvent::Sample(result) => self.session.on_sample(result),
                ClientEvent::Prediction(outcome) => self.session.on_prediction(outcome),
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        let bytes = match (&file.bytes, &file.path) {
            (Some(bytes), _) => Ok(bytes.to_vec()),
            (None, Some(path)) => std::fs::read(path).map_err(|e| e.to_string()),
            (None, None) => Err("dropped file has no content".to_string()),
        };
        let name = if file.name.is_empty() {
            file.path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload.csv".to_string())
        } else {
            file.name.clone()
        };

        match bytes {
            Ok(bytes) => self.submit(name, bytes),
            Err(e) => self.notice = Some(Notice::Error(e)),
        }
    }

    fn sample_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Sample file");
        ui.horizontal(|ui| {
            match self.session.sample() {
                SampleState::NotFetched | SampleState::Fetching => {
                    ui.spinner();
                    ui.label("Fetching sample...");
                }
                SampleState::Failed(reason) => {
                    ui.colored_label(egui::Color32::YELLOW, format!("Sample unavailable: {reason}"));
                    if ui.button("Retry").clicked() {
                        self.request_sample();
                    }
                }
                SampleState::Ready(_) => {
                    ui.label("Save to:");
                    ui.text_edit_singleline(&mut self.sample_save_path);
                    if ui.button("Save sample").clicked() {
                        let path = self.sample_save_path.clone();
                        if let Some(bytes) = self.session.sample_bytes().map(<[u8]>::to_vec) {
                            self.save(&path, &bytes);
                        }
                    }
                }
            }
        });
    }

    fn upload_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Predict");
        ui.label("Enter a CSV path or drop a file onto the window.");
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.upload_path)
                    .hint_text("path/to/transactions.csv")
                    .desired_width(400.0),
            );
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let button = ui.add_enabled(!self.session.is_busy(), egui::Button::new("Upload"));
            if button.clicked() || enter {
                self.submit_path();
            }
        });

        if let Some(message) = self.session.status_message() {
            match self.session.prediction() {
                PredictionState::InFlight { .. } => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(message);
                    });
                }
                PredictionState::Rejected(_) => {
                    ui.colored_label(egui::Color32::from_rgb(255, 80, 80), message);
                }
                PredictionState::Unreachable => {
                    ui.colored_label(egui::Color32::YELLOW, message);
                }
                _ => {
                    ui.label(message);
                }
            }
        }

        match &self.notice {
            Some(Notice::Info(msg)) => {
                ui.colored_label(egui::Color32::GREEN, msg);
            }
            Some(Notice::Error(msg)) => {
                ui.colored_label(egui::Color32::from_rgb(255, 80, 80), msg);
            }
            None => {}
        }
    }

    fn results_section(&mut self, ui: &mut egui::Ui) {
        let Some(table) = self.session.table() else {
            return;
        };
        let raw = table.raw.clone();
        let histogram = table.histogram(HISTOGRAM_BINS);

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Save to:");
            ui.text_edit_singleline(&mut self.predictions_save_path);
            if ui.button("Save predictions").clicked() {
                let path = self.predictions_save_path.clone();
                self.save(&path, &raw);
            }
        });

        let bars: Vec<Bar> = histogram
            .iter()
            .map(|&(center, count)| Bar::new(center, count as f64).width(1.0 / HISTOGRAM_BINS as f64))
            .collect();
        Plot::new("prediction_histogram")
            .height(180.0)
            .legend(Legend::default())
            .allow_drag(false)
            .allow_zoom(false)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new("Predictions", bars).color(egui::Color32::from_rgb(100, 200, 255)),
                );
            });

        let Some(table) = self.session.table() else {
            return;
        };
        egui::ScrollArea::vertical()
            .id_salt("predictions_table")
            .auto_shrink([false, true])
            .show(ui, |ui| {
                egui::Grid::new("predictions_grid")
                    .striped(true)
                    .min_col_width(120.0)
                    .show(ui, |ui| {
                        for header in &table.headers {
                            ui.label(egui::RichText::new(header).strong());
                        }
                        ui.end_row();

                        for row in table.rows.iter().take(MAX_TABLE_ROWS) {
                            for cell in row {
                                ui.label(cell);
                            }
                            ui.end_row();
                        }
                    });
                if table.len() > MAX_TABLE_ROWS {
                    ui.label(format!(
                        "Showing first {} of {} rows; save the file for the rest.",
                        MAX_TABLE_ROWS,
                        table.len()
                    ));
                }
            });
    }
}

impl eframe::App for SantanderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events();
        self.handle_dropped_files(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Santander Transaction Prediction");
            });
        });

        egui::TopBottomPanel::bottom("log_panel")
            .resizable(true)
            .default_height(140.0)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new("Logs").strong());
                egui::ScrollArea::vertical()
                    .id_salt("log_scroll")
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.logs {
                            let color = if line.contains("ERROR") {
                                egui::Color32::from_rgb(255, 80, 80)
                            } else if line.contains("WARN") {
                                egui::Color32::from_rgb(255, 255, 100)
                            } else {
                                egui::Color32::from_gray(180)
                            };
                            ui.label(egui::RichText::new(line).monospace().color(color));
                        }
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.sample_section(ui);
            ui.add_space(10.0);
            ui.separator();
            self.upload_section(ui);
            self.results_section(ui);
        });

        // keep polling the background worker
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
