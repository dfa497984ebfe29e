// lsr_chart/src/main.rs

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use eframe::egui;
use lsr_chart::app::render::{chart_panel, PanelAction};
use lsr_chart::app::{ChartEvent, ChartOptions, ChartRuntime, UiEvent};
use lsr_chart::cli::{build_source, chart_options, CommonArgs};
use lsr_chart::debug_hooks;
use lsr_chart::export::{
    export_image, CapturedView, ChartArea, DesktopTarget, ExportOutcome, PendingCapture, ScreenshotRasterizer,
};
use lsr_chart::feed::{RepaintHook, SeriesSource};
use lsr_chart::model::normalize_symbol;
use lsr_chart::persist::{AppConfig, Persistence};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "lsr_chart", about = "Live long/short ratio charts")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

struct ChartPanel {
    id: u64,
    runtime: ChartRuntime,
    symbol_input: String,
    chart_area: Option<ChartArea>,
}

struct LsrApp {
    rt: tokio::runtime::Runtime,
    source: Arc<dyn SeriesSource>,
    options: ChartOptions,
    repaint: RepaintHook,
    panels: Vec<ChartPanel>,
    next_panel_id: u64,
    new_symbol: String,
    pending_export: Option<PendingCapture>,
    target: DesktopTarget,
    notice: Option<String>,
    alert: Option<String>,
    persistence: Persistence,
}

impl LsrApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        rt: tokio::runtime::Runtime,
        source: Arc<dyn SeriesSource>,
        cfg: &AppConfig,
        persistence: Persistence,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        let repaint: RepaintHook = Arc::new(move || ctx.request_repaint());

        let mut app = Self {
            rt,
            source,
            options: chart_options(cfg),
            repaint,
            panels: Vec::new(),
            next_panel_id: 1,
            new_symbol: String::new(),
            pending_export: None,
            target: DesktopTarget::new(cfg.resolved_download_dir()),
            notice: None,
            alert: None,
            persistence,
        };
        for symbol in &cfg.symbols {
            app.add_chart(symbol);
        }
        app
    }

    fn add_chart(&mut self, raw: &str) -> bool {
        let symbol = normalize_symbol(raw);
        if symbol.is_empty() || self.panels.iter().any(|p| p.runtime.symbol() == symbol) {
            return false;
        }
        let runtime = ChartRuntime::start(
            &symbol,
            self.options.clone(),
            self.source.clone(),
            self.rt.handle().clone(),
            Some(self.repaint.clone()),
        );
        self.panels.push(ChartPanel {
            id: self.next_panel_id,
            runtime,
            symbol_input: symbol,
            chart_area: None,
        });
        self.next_panel_id += 1;
        true
    }

    fn symbols(&self) -> Vec<String> {
        self.panels.iter().map(|p| p.runtime.symbol().to_string()).collect()
    }

    fn apply_action(&mut self, ctx: &egui::Context, panel_id: u64, action: PanelAction) {
        let Some(idx) = self.panels.iter().position(|p| p.id == panel_id) else {
            return;
        };
        match action {
            PanelAction::ChangeSymbol(raw) => {
                let panel = &mut self.panels[idx];
                if panel.runtime.set_symbol(&raw) {
                    panel.chart_area = None;
                }
                panel.symbol_input = panel.runtime.symbol().to_string();
            }
            PanelAction::Export(mode) => {
                if self.pending_export.is_some() {
                    return;
                }
                self.pending_export = Some(PendingCapture::new(
                    panel_id,
                    self.panels[idx].runtime.symbol(),
                    mode,
                    Instant::now(),
                ));
                ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot);
                ctx.request_repaint();
            }
            PanelAction::DismissError => {
                self.panels[idx]
                    .runtime
                    .handle_event(ChartEvent::Ui(UiEvent::DismissError));
            }
            PanelAction::Close => {
                // drop stops the poller
                self.panels.remove(idx);
            }
        }
    }

    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        let shot = ctx.input(|i| {
            i.raw.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let Some(screenshot) = shot else {
            self.expire_pending_export(ctx);
            return;
        };
        let Some(pending) = self.pending_export.take() else {
            return;
        };

        let view = self
            .panels
            .iter()
            .find(|p| p.id == pending.panel_id)
            .and_then(|p| p.chart_area)
            .map(|area| CapturedView {
                screenshot,
                area,
                pixels_per_point: ctx.pixels_per_point(),
            });

        match export_image(view.as_ref(), &pending.symbol, pending.mode, &ScreenshotRasterizer, &mut self.target) {
            ExportOutcome::Saved(path) => self.notice = Some(format!("Saved {}", path.display())),
            ExportOutcome::Copied => self.notice = Some(format!("Copied {} chart to clipboard", pending.symbol)),
            ExportOutcome::Skipped => self.notice = Some(format!("{}: nothing to export yet", pending.symbol)),
            ExportOutcome::Failed(msg) => self.alert = Some(format!("Export of {} failed:\n{msg}", pending.symbol)),
        }
    }

    fn expire_pending_export(&mut self, ctx: &egui::Context) {
        let Some(pending) = &self.pending_export else {
            return;
        };
        if pending.is_expired(Instant::now()) {
            warn!("no screenshot for {} export; giving up", pending.symbol);
            self.alert = Some(format!(
                "Export of {} failed:
the window did not deliver a screenshot",
                pending.symbol
            ));
            self.pending_export = None;
        } else {
            // keep frames coming until the screenshot shows up or we time out
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("lsr_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Long/Short ratio");
                ui.separator();
                ui.label(format!(
                    "{} · {} · every {}s",
                    self.source.name(),
                    self.options.period,
                    self.options.interval.as_secs()
                ));
                ui.separator();

                let edit = ui.add(
                    egui::TextEdit::singleline(&mut self.new_symbol)
                        .desired_width(110.0)
                        .hint_text("e.g. SOLUSDT"),
                );
                let enter = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Add chart").clicked() || enter {
                    let raw = std::mem::take(&mut self.new_symbol);
                    if !self.add_chart(&raw) {
                        self.notice = Some(format!("{:?} is empty or already shown", raw.trim()));
                    }
                }

                if let Some(notice) = &self.notice {
                    ui.separator();
                    ui.label(notice);
                }
            });
        });
    }
}

impl eframe::App for LsrApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_screenshot(ctx);

        for panel in &mut self.panels {
            panel.runtime.pump();
        }

        self.top_bar(ctx);

        let mut actions: Vec<(u64, PanelAction)> = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.panels.is_empty() {
                ui.label("No charts. Add a symbol above.");
                return;
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                for panel in &mut self.panels {
                    let out = chart_panel(ui, panel.id, &panel.runtime.state, &mut panel.symbol_input);
                    panel.chart_area = out.chart_area;
                    if out.painted_chart() {
                        let symbol = panel.runtime.symbol().to_string();
                        panel
                            .runtime
                            .handle_event(ChartEvent::Ui(UiEvent::ChartPainted { symbol }));
                    }
                    if let Some(action) = out.action {
                        actions.push((panel.id, action));
                    }
                    ui.add_space(8.0);
                }
            });
        });

        for (panel_id, action) in actions {
            self.apply_action(ctx, panel_id, action);
        }

        if let Some(msg) = self.alert.clone() {
            let mut open = true;
            egui::Window::new("Export")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(msg);
                    if ui.button("OK").clicked() {
                        self.alert = None;
                    }
                });
            if !open {
                self.alert = None;
            }
        }

        // keeps "updated HH:MM" current between fetches
        ctx.request_repaint_after(Duration::from_secs(30));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let mut saved = self.persistence.load();
        saved.symbols = self.symbols();
        if let Err(err) = self.persistence.save_now(&saved) {
            warn!("config save failed: {err:?}");
        }
        self.panels.clear();
    }
}

fn main() -> Result<()> {
    debug_hooks::init_logging();

    let cli = Cli::parse();
    let (cfg, persistence) = cli.common.load_config();
    info!(
        "config {:?}: symbols={:?} period={} refresh={}s dummy={}",
        persistence.config_path(),
        cfg.symbols,
        cfg.period,
        cfg.refresh_secs,
        cfg.use_dummy_feed
    );

    let source = build_source(&cfg).context("data source")?;

    // one worker: fetches interleave cooperatively, state stays on the UI thread
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("tokio runtime")?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Long/Short Ratio")
            .with_inner_size([900.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "lsr_chart",
        native_options,
        Box::new(move |cc| Box::new(LsrApp::new(cc, rt, source, &cfg, persistence))),
    )
    .map_err(|e| anyhow!("eframe error: {e}"))
}
