use bevy::asset::Assets;
use bevy::prelude::{Mesh, Query, Res};
use bevy::render::mesh::morph::MorphWeights;

use funny_face_api::FaceSample;

use crate::tracking::LatestFace;

/// Pairs each morph target named after a blend shape with its coefficient.
pub fn matched_weights(target_names: &[String], sample: &FaceSample) -> Vec<(usize, f32)> {
    target_names.iter()
        .enumerate()
        .filter_map(|(i, name)| sample.coefficient(name).map(|w| (i, w)))
        .collect()
}

pub fn drive_morph_targets(
    face: Res<LatestFace>,
    meshes: Res<Assets<Mesh>>,
    mut morphs: Query<&mut MorphWeights>,
) {
    let Some(sample) = face.sample() else {
        return;
    };

    for mut morph in &mut morphs {
        let Some(names) = morph.first_mesh()
            .and_then(|mesh| meshes.get(mesh))
            .and_then(|mesh| mesh.morph_target_names()) else {
            continue;
        };

        let matched = matched_weights(names, sample);
        if matched.is_empty() {
            continue;
        }

        let weights = morph.weights_mut();
        for (index, weight) in matched {
            if let Some(slot) = weights.get_mut(index) {
                *slot = weight;
            }
        }
    }
}
