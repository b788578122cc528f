use anyhow::{anyhow, Result};
use eframe::egui::{Color32, ComboBox, RichText, TextEdit, Widget};
use eframe::{egui, Frame, Storage};
use time::UtcOffset;
use egui_extras::{Column, TableBuilder};

use config::{Page, Settings, CATEGORIES};
use ledger::{Ledger, LedgerError};
use store::{RecordStore, COLUMNS};

mod config;
mod ledger;
mod store;

const MENU_WIDTH: f32 = 250.0;

const ABOUT_TEXT: &str = "This application helps you keep track of your daily expenses.

Features include:
  - Adding new expenses
  - Categorizing expenses
  - Viewing expense history
  - Basic reporting";

struct ExpenseForm {
    amount: String,
    category: String,
    description: String,
}

impl Default for ExpenseForm {
    fn default() -> Self {
        Self {
            amount: String::new(),
            category: CATEGORIES[0].to_owned(),
            description: String::new(),
        }
    }
}

pub struct App {
    settings: Settings,
    draft: Settings,
    utc_offset: UtcOffset,
    ledger: Option<Ledger>,
    form: ExpenseForm,
    page: Page,
    menu_open: bool,
    warn: Result<()>,
    status: Option<String>,
    notice: Option<&'static str>,
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if let Err(e) = &self.warn {
            egui::TopBottomPanel::top("warn").show(ctx, |ui| {
                let warn = RichText::from(e.to_string()).color(Color32::RED);
                ui.label(warn);
            });
        }

        if self.settings.notifications {
            if let Some(status) = &self.status {
                egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
                    ui.label(status.as_str());
                });
            }
        }

        egui::SidePanel::left("menu")
            .resizable(false)
            .exact_width(MENU_WIDTH)
            .show_animated(ctx, self.menu_open, |ui| self.menu_ui(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if ui.button("☰").clicked() {
                self.menu_open = !self.menu_open;
            }
            ui.separator();

            match self.page {
                Page::Expenses => self.expenses_ui(ui),
                Page::Settings => self.settings_ui(ui),
                Page::About => about_ui(ui),
            }
        });

        if let Some(message) = self.notice {
            let mut close = false;
            egui::Window::new("Settings Saved")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        close = true;
                    }
                });
            if close {
                self.notice = None;
            }
        }
    }

    fn save(&mut self, storage: &mut dyn Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, utc_offset: UtcOffset) -> Self {
        let settings = cc
            .storage
            .and_then(|storage| eframe::get_value::<Settings>(storage, eframe::APP_KEY))
            .unwrap_or_default();
        apply_visuals(&cc.egui_ctx, settings.dark_mode);

        let (ledger, warn) = match Ledger::initialize(RecordStore::new(&settings.data_file)) {
            Ok(ledger) => (Some(ledger.with_utc_offset(utc_offset)), Ok(())),
            Err(e) => {
                tracing::error!(error = %e, "cannot load expenses");
                (None, Err(anyhow!(e)))
            }
        };
        tracing::info!(
            data_file = %settings.data_file.display(),
            loaded = ledger.as_ref().map(Ledger::len).unwrap_or_default(),
            "expense tracker started"
        );

        Self {
            draft: settings.clone(),
            settings,
            utc_offset,
            ledger,
            form: ExpenseForm::default(),
            page: Page::default(),
            menu_open: false,
            warn,
            status: None,
            notice: None,
        }
    }

    fn menu_ui(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.label(RichText::new("Expense Tracker").heading().strong());
        ui.add_space(10.0);

        for page in Page::ALL {
            if ui
                .selectable_label(self.page == page, page.to_string())
                .clicked()
            {
                if page == Page::Settings {
                    self.draft = self.settings.clone();
                }
                self.page = page;
            }
        }

        ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
            ui.label(RichText::new("@Copyright 2024").small().weak());
        });
    }

    fn expenses_ui(&mut self, ui: &mut egui::Ui) {
        let Some(ledger) = &self.ledger else {
            ui.label("Expenses are unavailable until the data file can be read. Pick another one in Settings.");
            return;
        };

        let mut submit = false;
        let mut delete = None;

        ui.horizontal(|ui| {
            TextEdit::singleline(&mut self.form.amount)
                .hint_text("Amount")
                .desired_width(100.0)
                .ui(ui);
            TextEdit::singleline(&mut self.form.category)
                .hint_text("Category")
                .desired_width(120.0)
                .ui(ui);
            ComboBox::from_id_salt("category")
                .selected_text("")
                .width(20.0)
                .show_ui(ui, |ui| {
                    for category in CATEGORIES {
                        ui.selectable_value(&mut self.form.category, category.to_owned(), category);
                    }
                });
            TextEdit::singleline(&mut self.form.description)
                .hint_text("Description")
                .desired_width(240.0)
                .ui(ui);
            if ui.button("Add Expense").clicked() {
                submit = true;
            }
        });

        if ledger.is_empty() {
            ui.label(format!(
                "No expenses recorded yet in {}.",
                ledger.store().path().display()
            ));
        } else {
            let total = match ledger.total() {
                Some(total) => total.to_string(),
                None => "overflow".to_owned(),
            };
            ui.label(format!("{} expenses, total {}", ledger.len(), total));
        }
        ui.separator();

        let text_height = egui::TextStyle::Body.resolve(ui.style()).size * 2.0;
        let records = ledger.records();

        TableBuilder::new(ui)
            .striped(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::initial(100.0))
            .column(Column::initial(90.0))
            .column(Column::initial(140.0))
            .column(Column::remainder())
            .column(Column::initial(70.0))
            .header(text_height, |mut header| {
                for title in COLUMNS.into_iter().chain(["Action"]) {
                    header.col(|ui| {
                        ui.heading(title);
                    });
                }
            })
            .body(|body| {
                body.rows(text_height, records.len(), |mut row| {
                    let row_index = row.index();
                    if let Some(record) = records.get(row_index) {
                        row.col(|ui| {
                            ui.label(record.date.as_str());
                        });
                        row.col(|ui| {
                            ui.label(record.amount.as_str());
                        });
                        row.col(|ui| {
                            ui.label(record.category.as_str());
                        });
                        row.col(|ui| {
                            ui.label(record.description.as_str());
                        });
                        row.col(|ui| {
                            if ui.button("Delete").clicked() {
                                delete = Some(row_index);
                            }
                        });
                    }
                });
            });

        if submit {
            self.add_expense();
        }
        if let Some(row_index) = delete {
            self.delete_expense(row_index);
        }
    }

    fn settings_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(8.0);
        ui.checkbox(&mut self.draft.dark_mode, "Dark Mode");
        ui.checkbox(&mut self.draft.notifications, "Enable Notifications");
        ui.horizontal(|ui| {
            ui.label("Data file:");
            let mut data_file = self.draft.data_file.display().to_string();
            if ui.text_edit_singleline(&mut data_file).changed() {
                self.draft.data_file = data_file.into();
            }
        });
        ui.add_space(8.0);
        if ui.button("Save Settings").clicked() {
            self.save_settings(ui.ctx());
        }
    }

    fn add_expense(&mut self) {
        let Some(ledger) = self.ledger.as_mut() else {
            return;
        };
        let ExpenseForm {
            amount,
            category,
            description,
        } = &self.form;

        match ledger.add_expense(amount, category, description) {
            Ok(record) => {
                let status = format!(
                    "Added {} for {} on {}",
                    record.amount, record.category, record.date
                );
                self.form = ExpenseForm::default();
                self.succeed(status);
            }
            Err(e) => self.report(e),
        }
    }

    fn delete_expense(&mut self, row_index: usize) {
        let Some(ledger) = self.ledger.as_mut() else {
            return;
        };

        match ledger.delete_expense(row_index) {
            Ok(record) => self.succeed(format!(
                "Deleted {} for {} on {}",
                record.amount, record.category, record.date
            )),
            Err(e) => self.report(e),
        }
    }

    fn save_settings(&mut self, ctx: &egui::Context) {
        let draft = self.draft.clone();

        if self.ledger.is_none() || draft.data_file != self.settings.data_file {
            let store = RecordStore::new(&draft.data_file);
            let utc_offset = self.utc_offset;
            let reloaded = match &mut self.ledger {
                Some(ledger) => ledger.reload(store),
                ledger @ None => Ledger::initialize(store)
                    .map(|loaded| *ledger = Some(loaded.with_utc_offset(utc_offset))),
            };
            if let Err(e) = reloaded {
                self.report(e);
                return;
            }
        }

        apply_visuals(ctx, draft.dark_mode);
        self.settings = draft;
        self.notice = Some("Your settings have been saved.");
        self.succeed(format!(
            "Using {}",
            self.settings.data_file.display()
        ));
    }

    fn succeed(&mut self, status: String) {
        tracing::info!("{status}");
        self.warn = Ok(());
        self.status = Some(status);
    }

    fn report(&mut self, e: LedgerError) {
        match &e {
            LedgerError::Store(_) => tracing::error!(error = %e, "expense action failed"),
            _ => tracing::warn!(error = %e, "expense rejected"),
        }
        self.warn = Err(anyhow!(e));
    }
}

fn about_ui(ui: &mut egui::Ui) {
    ui.heading("Expense Tracker");
    ui.add_space(8.0);
    ui.label(ABOUT_TEXT);
    ui.add_space(8.0);
    ui.label(format!("Version: {}", env!("CARGO_PKG_VERSION")));
}

fn apply_visuals(ctx: &egui::Context, dark_mode: bool) {
    ctx.set_visuals(if dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    });
}
