//! Options window
//!
//! One row of radio buttons per option group. Selections made here are
//! pending until the next frame applies them.

use crate::config::{OptionGroup, RuntimeState};

/// Show the options window for `state`.
///
/// In landscape (`aspect_ratio > 1`) each group's options follow its heading
/// on the same line; in portrait they go on the line below it.
pub fn show_options_window(ctx: &egui::Context, state: &mut RuntimeState, aspect_ratio: f32) {
    let landscape = aspect_ratio > 1.0;

    egui::Window::new("Options")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .collapsible(true)
        .show(ctx, |ui| {
            for group in OptionGroup::ALL {
                ui.push_id(group.description(), |ui| {
                    if landscape {
                        ui.horizontal(|ui| option_row(ui, state, group));
                    } else {
                        option_row(ui, state, group);
                    }
                });
            }
        });
}

fn option_row(ui: &mut egui::Ui, state: &mut RuntimeState, group: OptionGroup) {
    ui.label(group.description());
    ui.horizontal(|ui| {
        let selection = state.selection_mut(group);
        for (index, label) in group.options().iter().enumerate() {
            ui.radio_value(selection, index, *label);
        }
    });
}
