//! Prompt-guide side panel: an accordion of prompt-technique examples with
//! a one-click "use this prompt" action.

use eframe::egui;
use egui::RichText;

use crate::prompts::PromptExample;

/// Accordion panel state.  At most one entry is expanded at a time,
/// mirroring the openIndex pattern of the reference guide.
#[derive(Default)]
pub struct GuidePanel {
    open_index: Option<usize>,
}

impl GuidePanel {
    /// Render the guide for the given example set.  Returns the example
    /// prompt to apply when the user picked one this frame.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        examples: &'static [PromptExample],
    ) -> Option<&'static str> {
        let mut selected = None;

        ui.heading("Prompt technique guide");
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (index, example) in examples.iter().enumerate() {
                    let open = self.open_index == Some(index);
                    if ui.selectable_label(open, example.title).clicked() {
                        self.open_index = if open { None } else { Some(index) };
                    }
                    if self.open_index == Some(index) {
                        ui.indent(index, |ui| {
                            ui.label(
                                RichText::new(format!("\u{201c}{}\u{201d}", example.template))
                                    .italics()
                                    .weak(),
                            );
                            ui.add_space(4.0);
                            ui.label(example.prompt);
                            ui.add_space(4.0);
                            if ui.button("Use this prompt").clicked() {
                                selected = Some(example.prompt);
                            }
                        });
                    }
                    ui.separator();
                }
            });

        selected
    }
}
