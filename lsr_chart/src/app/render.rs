use super::state::*;
use crate::export::{ChartArea, ExportMode};
use crate::view::{build_view, format_time_label, trend_color, SeriesView, TrendColor};
use egui::{Align, Button, Color32, Layout, RichText, Spinner, TextEdit, Ui};
use egui_plot::{Line, Plot, PlotPoints};

pub const CHART_HEIGHT_PX: f32 = 200.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    ChangeSymbol(String),
    Export(ExportMode),
    DismissError,
    Close,
}

#[derive(Debug, Default)]
pub struct PanelOutput {
    pub action: Option<PanelAction>,
    /// Where the plot was drawn, if one was drawn this frame.
    pub chart_area: Option<ChartArea>,
}

impl PanelOutput {
    pub fn painted_chart(&self) -> bool {
        self.chart_area.is_some()
    }
}

pub fn color32(trend: TrendColor) -> Color32 {
    let [r, g, b] = trend.rgb();
    Color32::from_rgb(r, g, b)
}

/// Header, error banner and either the spinner or the line chart for one series.
pub fn chart_panel(ui: &mut Ui, panel_id: u64, state: &SeriesState, symbol_input: &mut String) -> PanelOutput {
    let mut out = PanelOutput::default();
    let view = build_view(state);

    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.heading(&state.symbol);

            let edit = ui.add(TextEdit::singleline(symbol_input).desired_width(110.0).hint_text("symbol"));
            if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                out.action = Some(PanelAction::ChangeSymbol(symbol_input.clone()));
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.small_button("✕").on_hover_text("Close chart").clicked() {
                    out.action = Some(PanelAction::Close);
                }
                let ready = matches!(view, SeriesView::Chart(_));
                if ui
                    .add_enabled(ready, Button::new("Copy"))
                    .on_hover_text("Copy chart image to clipboard")
                    .clicked()
                {
                    out.action = Some(PanelAction::Export(ExportMode::Clipboard));
                }
                if ui
                    .add_enabled(ready, Button::new("Save PNG"))
                    .on_hover_text(format!("Save as {}.png", state.symbol))
                    .clicked()
                {
                    out.action = Some(PanelAction::Export(ExportMode::Download));
                }
            });
        });

        status_line(ui, state);

        if let Some(err) = &state.last_error {
            ui.horizontal(|ui| {
                ui.colored_label(
                    color32(TrendColor::Bearish),
                    format!("⚠ refresh failed at {}: {}", format_time_label(err.at_ms), err.message),
                );
                if ui.small_button("dismiss").clicked() {
                    out.action = Some(PanelAction::DismissError);
                }
            });
        }

        match view {
            SeriesView::Loading { .. } => {
                ui.allocate_ui(egui::vec2(ui.available_width(), CHART_HEIGHT_PX), |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.horizontal(|ui| {
                            ui.add(Spinner::new());
                            ui.label("Loading data...");
                        });
                    });
                });
            }
            SeriesView::Chart(chart) => {
                let points: PlotPoints = chart.points.into();
                let line = Line::new(points).color(color32(chart.stroke)).width(2.0);

                let response = Plot::new(("lsr_plot", panel_id))
                    .height(CHART_HEIGHT_PX)
                    .allow_scroll(false)
                    .x_axis_formatter(|mark, _chars, _range| format_time_label(mark.value as i64))
                    .label_formatter(|_name, value| {
                        format!("{}\nratio {:.4}", format_time_label(value.x as i64), value.y)
                    })
                    .show(ui, |plot_ui| {
                        plot_ui.line(line);
                    });
                out.chart_area = Some(ChartArea {
                    rect: response.response.rect,
                    clip: ui.clip_rect(),
                });
            }
        }
    });

    out
}

fn status_line(ui: &mut Ui, state: &SeriesState) {
    ui.horizontal(|ui| {
        let trend = trend_color(&state.samples);
        match state.last_sample() {
            Some(last) => {
                ui.label(RichText::new(format!("{:.4}", last.ratio)).color(color32(trend)).strong());
                ui.label(trend.token());
            }
            None => {
                ui.label(RichText::new("–").color(color32(trend)));
            }
        }
        if let Some(ts) = state.last_updated_ms {
            ui.separator();
            ui.label(format!("updated {}", format_time_label(ts)));
        }
        if state.is_loading {
            ui.separator();
            ui.label("refreshing");
        }
    });
}
