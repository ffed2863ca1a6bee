use bevy::prelude::{Component, DetectChanges, Query, Res, Resource, Transform, With};

use funny_face_api::FaceSample;

/// The most recent face reported by the tracker. Each sample replaces the last.
#[derive(Debug, Default, Resource)]
pub struct LatestFace {
    sample: Option<FaceSample>,
}

impl LatestFace {
    pub fn set(&mut self, sample: Option<FaceSample>) {
        self.sample = sample;
    }

    pub fn sample(&self) -> Option<&FaceSample> {
        self.sample.as_ref()
    }
}

/// Parent of the active prop; follows the tracked face.
#[derive(Debug, Default, Component)]
pub struct FaceAnchor;

pub fn follow_face(
    face: Res<LatestFace>,
    mut anchors: Query<&mut Transform, With<FaceAnchor>>,
) {
    if !face.is_changed() {
        return;
    }

    let Some(matrix) = face.sample().and_then(|sample| sample.transform) else {
        return;
    };

    let transform = Transform::from_matrix(matrix);
    for mut anchor in &mut anchors {
        *anchor = transform;
    }
}
