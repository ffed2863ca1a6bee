use bevy::input::ButtonInput;
use bevy::prelude::{EventWriter, KeyCode, Res};
use bevy_egui::{egui, EguiContexts};

use crate::props::PropControl;
use crate::screenshot::TakeScreenshot;

pub fn keyboard_controls(
    keys: Res<ButtonInput<KeyCode>>,
    mut props: EventWriter<PropControl>,
    mut screenshots: EventWriter<TakeScreenshot>,
) {
    if keys.just_pressed(KeyCode::ArrowLeft) {
        props.send(PropControl::Previous);
    }
    if keys.just_pressed(KeyCode::ArrowRight) {
        props.send(PropControl::Next);
    }
    if keys.just_pressed(KeyCode::Space) {
        screenshots.send(TakeScreenshot::default());
    }
}

/// Back, capture and forward buttons along the bottom edge.
pub fn control_strip(
    mut contexts: EguiContexts,
    mut props: EventWriter<PropControl>,
    mut screenshots: EventWriter<TakeScreenshot>,
) {
    egui::Area::new(egui::Id::new("control_strip"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -16.0])
        .show(contexts.ctx_mut(), |ui| {
            ui.horizontal(|ui| {
                if ui.add(egui::Button::new(egui::RichText::new("◀").size(44.0))).clicked() {
                    props.send(PropControl::Previous);
                }
                ui.add_space(24.0);
                if ui.add(egui::Button::new(egui::RichText::new("●").size(72.0))).clicked() {
                    screenshots.send(TakeScreenshot::default());
                }
                ui.add_space(24.0);
                if ui.add(egui::Button::new(egui::RichText::new("▶").size(44.0))).clicked() {
                    props.send(PropControl::Next);
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;

    #[test]
    fn arrow_keys_cycle_and_space_captures() {
        let mut app = App::new();
        app.add_event::<PropControl>()
            .add_event::<TakeScreenshot>()
            .init_resource::<ButtonInput<KeyCode>>()
            .add_systems(Update, keyboard_controls);

        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.press(KeyCode::ArrowRight);
            keys.press(KeyCode::Space);
        }
        app.update();

        let events = app.world().resource::<Events<PropControl>>();
        let controls: Vec<_> = events.get_reader().read(events).copied().collect();
        assert_eq!(controls, vec![PropControl::Next]);
        assert_eq!(app.world().resource::<Events<TakeScreenshot>>().len(), 1);
    }
}
