//! Prop selection and scene (re)loading.
//!
//! Exactly one prop is live at a time. Changing the selection despawns the
//! old prop's whole hierarchy and spawns the new scene under the face anchor.

use bevy::asset::{AssetServer, Handle, LoadState};
use bevy::prelude::{
    AppExit, BuildChildren, Commands, Component, DespawnRecursiveExt, Entity, Event, EventReader,
    EventWriter, Name, Query, Res, ResMut, Resource, With,
};
use bevy::scene::{Scene, SceneBundle};
use bevy::utils::default;

use crate::api::SharedPropStatus;
use crate::config::{PropCatalog, RigNames};
use crate::tracking::FaceAnchor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Event)]
pub enum PropControl {
    Previous,
    Next,
    Select(usize),
}

/// Index of the selected prop. Always `< count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Resource)]
pub struct PropSelection {
    index: usize,
    count: usize,
}

impl PropSelection {
    pub fn new(count: usize, initial: usize) -> Self {
        let count = count.max(1);
        Self {
            index: initial.min(count - 1),
            count,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Steps clamp at both ends; an out of range `Select` is ignored.
    /// Returns whether the index changed.
    pub fn apply(&mut self, control: PropControl) -> bool {
        let next = match control {
            PropControl::Previous => self.index.saturating_sub(1),
            PropControl::Next => (self.index + 1).min(self.count - 1),
            PropControl::Select(index) if index < self.count => index,
            PropControl::Select(_) => self.index,
        };

        let changed = next != self.index;
        self.index = next;
        changed
    }
}

/// Root entity of a spawned prop scene.
#[derive(Debug, Component)]
pub struct PropRoot {
    pub index: usize,
    pub rig: Option<RigNames>,
}

#[derive(Debug, Default, Resource)]
pub struct CurrentProp {
    index: Option<usize>,
    entity: Option<Entity>,
    scene: Option<Handle<Scene>>,
}

pub fn apply_prop_controls(
    mut controls: EventReader<PropControl>,
    mut selection: ResMut<PropSelection>,
) {
    let mut next = *selection;
    for control in controls.read() {
        next.apply(*control);
    }

    if next != *selection {
        tracing::info!("selected prop {} of {}", next.index(), next.count());
        *selection = next;
    }
}

pub fn spawn_selected_prop(
    mut commands: Commands,
    selection: Res<PropSelection>,
    catalog: Res<PropCatalog>,
    asset_server: Res<AssetServer>,
    status: Res<SharedPropStatus>,
    mut current: ResMut<CurrentProp>,
    anchors: Query<Entity, With<FaceAnchor>>,
) {
    let index = selection.index();
    if current.index == Some(index) {
        return;
    }

    let Ok(anchor) = anchors.get_single() else {
        return;
    };

    let Some(prop) = catalog.get(index) else {
        return;
    };

    if let Some(previous) = current.entity.take() {
        commands.entity(previous).despawn_recursive();
    }

    let scene = asset_server.load(prop.scene_path());
    let entity = commands.spawn((
        SceneBundle {
            scene: scene.clone(),
            ..default()
        },
        PropRoot {
            index,
            rig: prop.rig.clone(),
        },
        Name::new(format!("prop:{}", prop.name)),
    ))
        .set_parent(anchor)
        .id();

    tracing::info!("loading prop {} ({})", prop.name, prop.scene_path());
    status.set(catalog.status(index));
    *current = CurrentProp {
        index: Some(index),
        entity: Some(entity),
        scene: Some(scene),
    };
}

/// A prop that fails to load is fatal.
pub fn check_prop_load(
    current: Res<CurrentProp>,
    asset_server: Res<AssetServer>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(scene) = current.scene.as_ref() else {
        return;
    };

    if let Some(LoadState::Failed(err)) = asset_server.get_load_state(scene.id()) {
        tracing::error!("failed to load prop {:?}: {}", current.index, err);
        exit.send(AppExit::error());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::prelude::*;
    use bevy::scene::ScenePlugin;

    use super::*;

    fn prop_app(catalog: PropCatalog) -> (App, Entity) {
        let mut app = App::new();
        let selection = PropSelection::new(catalog.len(), 0);
        app.add_plugins((MinimalPlugins, AssetPlugin::default(), ScenePlugin))
            .add_event::<PropControl>()
            .init_resource::<CurrentProp>()
            .init_resource::<SharedPropStatus>()
            .insert_resource(catalog)
            .insert_resource(selection)
            .add_systems(Update, (
                apply_prop_controls,
                spawn_selected_prop,
                check_prop_load,
            ).chain());
        let anchor = app.world_mut()
            .spawn((FaceAnchor, SpatialBundle::default()))
            .id();
        (app, anchor)
    }

    fn prop_roots(app: &mut App) -> Vec<(Entity, usize, Entity)> {
        let mut query = app.world_mut().query::<(Entity, &PropRoot, &Parent)>();
        query.iter(app.world())
            .map(|(entity, root, parent)| (entity, root.index, parent.get()))
            .collect()
    }

    #[test]
    fn steps_clamp_at_both_ends() {
        let mut selection = PropSelection::new(4, 0);
        assert!(!selection.apply(PropControl::Previous));
        assert_eq!(selection.index(), 0);

        assert!(selection.apply(PropControl::Next));
        assert!(selection.apply(PropControl::Next));
        assert!(selection.apply(PropControl::Next));
        assert_eq!(selection.index(), 3);
        assert!(!selection.apply(PropControl::Next));
        assert_eq!(selection.index(), 3);

        assert!(selection.apply(PropControl::Previous));
        assert_eq!(selection.index(), 2);
    }

    #[test]
    fn select_ignores_out_of_range() {
        let mut selection = PropSelection::new(4, 1);
        assert!(!selection.apply(PropControl::Select(4)));
        assert_eq!(selection.index(), 1);
        assert!(selection.apply(PropControl::Select(3)));
        assert_eq!(selection.index(), 3);
        assert!(!selection.apply(PropControl::Select(3)));
    }

    #[test]
    fn initial_index_is_clamped() {
        let selection = PropSelection::new(4, 10);
        assert_eq!(selection.index(), 3);
        assert_eq!(selection.count(), 4);
    }

    #[test]
    fn controls_update_selection_resource() {
        let mut app = App::new();
        app.add_event::<PropControl>()
            .insert_resource(PropSelection::new(4, 0))
            .add_systems(Update, apply_prop_controls);

        app.world_mut().send_event(PropControl::Next);
        app.world_mut().send_event(PropControl::Next);
        app.world_mut().send_event(PropControl::Previous);
        app.update();
        assert_eq!(app.world().resource::<PropSelection>().index(), 1);

        app.world_mut().send_event(PropControl::Select(3));
        app.update();
        assert_eq!(app.world().resource::<PropSelection>().index(), 3);
    }

    #[test]
    fn unchanged_selection_is_not_marked_changed() {
        let mut app = App::new();
        app.add_event::<PropControl>()
            .insert_resource(PropSelection::new(4, 0))
            .add_systems(Update, apply_prop_controls);

        app.update();
        app.world_mut().send_event(PropControl::Previous);
        let before = app.world().resource_ref::<PropSelection>().last_changed();
        app.update();
        let after = app.world().resource_ref::<PropSelection>().last_changed();
        assert_eq!(before, after);
    }

    #[test]
    fn switching_replaces_whole_prop_under_anchor() {
        let (mut app, anchor) = prop_app(PropCatalog::default());
        app.update();

        let roots = prop_roots(&mut app);
        assert_eq!(roots.len(), 1);
        let (old_root, old_index, old_parent) = roots[0];
        assert_eq!((old_index, old_parent), (0, anchor));
        let old_child = app.world_mut()
            .spawn((Name::new("eyeball"), SpatialBundle::default()))
            .set_parent(old_root)
            .id();
        assert_eq!(app.world().resource::<SharedPropStatus>().get().index, 0);

        app.world_mut().send_event(PropControl::Next);
        app.update();

        assert!(app.world().get_entity(old_root).is_none());
        assert!(app.world().get_entity(old_child).is_none());
        let roots = prop_roots(&mut app);
        assert_eq!(roots.len(), 1);
        assert_eq!((roots[0].1, roots[0].2), (1, anchor));
        let status = app.world().resource::<SharedPropStatus>().get();
        assert_eq!((status.index, status.name.as_str()), (1, "glasses"));
    }

    #[test]
    fn unchanged_selection_keeps_prop_entity() {
        let (mut app, _anchor) = prop_app(PropCatalog::default());
        app.update();
        let before = prop_roots(&mut app);

        app.world_mut().send_event(PropControl::Previous);
        app.update();
        assert_eq!(prop_roots(&mut app), before);
    }

    #[test]
    fn missing_prop_asset_exits_with_error() {
        let catalog = PropCatalog::parse(r#"
            [[props]]
            name = "ghost"
            scene = "props/does-not-exist.glb"
        "#).unwrap();
        let (mut app, _anchor) = prop_app(catalog);

        let mut exit = None;
        for _ in 0..500 {
            app.update();
            let events = app.world().resource::<Events<AppExit>>();
            if let Some(event) = events.get_reader().read(events).next() {
                exit = Some(event.clone());
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        let exit = exit.expect("prop load failure should request exit");
        assert!(exit.is_error());
    }
}
