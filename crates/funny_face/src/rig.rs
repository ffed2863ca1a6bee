//! Drives the joints of rigged props from face blend shapes.
//!
//! Every frame the eyelid and jaw joints get an orientation computed directly
//! from the latest coefficients. Nothing is smoothed or remembered between
//! frames; a joint whose inputs are missing keeps its current orientation.

use bevy::hierarchy::HierarchyQueryExt;
use bevy::prelude::{Added, Commands, Component, Entity, Name, Parent, Quat, Query, Res, Transform};

use funny_face_api::{blend_shapes, FaceSample};

use crate::config::RigNames;
use crate::props::PropRoot;
use crate::tracking::LatestFace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Component)]
pub enum RigJoint {
    LeftEyelid,
    RightEyelid,
    Jaw,
}

impl RigJoint {
    fn from_name(names: &RigNames, name: &str) -> Option<Self> {
        if name == names.left_eyelid {
            Some(RigJoint::LeftEyelid)
        } else if name == names.right_eyelid {
            Some(RigJoint::RightEyelid)
        } else if name == names.jaw {
            Some(RigJoint::Jaw)
        } else {
            None
        }
    }
}

/// Jaw pitch in degrees: -100 closed, -40 fully open.
pub fn jaw_pitch_degrees(jaw_open: f32) -> f32 {
    -100.0 + 60.0 * jaw_open
}

/// Eyelid pitch in degrees: -120 open, -30 fully closed.
pub fn eyelid_pitch_degrees(blink: f32) -> f32 {
    -120.0 + 90.0 * blink
}

pub fn jaw_rotation(jaw_open: f32) -> Quat {
    Quat::from_rotation_x(jaw_pitch_degrees(jaw_open).to_radians())
}

/// Left eyelid: brow down rolls the lid inwards, inner brow raise rolls it back out.
pub fn left_eyelid_rotation(blink: f32, brow_down: f32, brow_inner_up: f32) -> Quat {
    let roll = 90.0 * brow_down - 30.0 * brow_inner_up;
    Quat::from_rotation_x(eyelid_pitch_degrees(blink).to_radians())
        * Quat::from_rotation_z(roll.to_radians())
}

/// Mirror of [`left_eyelid_rotation`].
pub fn right_eyelid_rotation(blink: f32, brow_down: f32, brow_inner_up: f32) -> Quat {
    let roll = -90.0 * brow_down + 30.0 * brow_inner_up;
    Quat::from_rotation_x(eyelid_pitch_degrees(blink).to_radians())
        * Quat::from_rotation_z(roll.to_radians())
}

/// Joint orientations for one face sample. `None` means "leave the joint alone".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointPose {
    pub left_eyelid: Option<Quat>,
    pub right_eyelid: Option<Quat>,
    pub jaw: Option<Quat>,
}

impl JointPose {
    pub fn from_sample(sample: &FaceSample) -> Self {
        let get = |name| sample.coefficient(name);
        let brow_inner_up = get(blend_shapes::BROW_INNER_UP);

        let left_blink = get(blend_shapes::EYE_BLINK_LEFT);
        let left_brow = get(blend_shapes::BROW_DOWN_LEFT);
        let left_eyelid = match (left_blink, left_brow, brow_inner_up) {
            (Some(blink), Some(brow), Some(inner)) => {
                Some(left_eyelid_rotation(blink, brow, inner))
            }
            _ => None,
        };

        let right_blink = get(blend_shapes::EYE_BLINK_RIGHT);
        let right_brow = get(blend_shapes::BROW_DOWN_RIGHT);
        let right_eyelid = match (right_blink, right_brow, brow_inner_up) {
            (Some(blink), Some(brow), Some(inner)) => {
                Some(right_eyelid_rotation(blink, brow, inner))
            }
            _ => None,
        };

        Self {
            left_eyelid,
            right_eyelid,
            jaw: get(blend_shapes::JAW_OPEN).map(jaw_rotation),
        }
    }

    pub fn get(&self, joint: RigJoint) -> Option<Quat> {
        match joint {
            RigJoint::LeftEyelid => self.left_eyelid,
            RigJoint::RightEyelid => self.right_eyelid,
            RigJoint::Jaw => self.jaw,
        }
    }
}

/// Tags freshly spawned prop nodes whose names match their prop's rig.
pub fn bind_rig_joints(
    mut commands: Commands,
    named: Query<(Entity, &Name), Added<Name>>,
    parents: Query<&Parent>,
    props: Query<&PropRoot>,
) {
    for (entity, name) in &named {
        let mut ancestors = parents.iter_ancestors(entity);
        let Some(prop) = ancestors.find_map(|ancestor| props.get(ancestor).ok()) else {
            continue;
        };
        let Some(rig) = prop.rig.as_ref() else {
            continue;
        };

        if let Some(joint) = RigJoint::from_name(rig, name.as_str()) {
            tracing::debug!("bound {:?} to node {} of prop {}", joint, name, prop.index);
            commands.entity(entity).insert(joint);
        }
    }
}

pub fn drive_rig_joints(
    face: Res<LatestFace>,
    mut joints: Query<(&RigJoint, &mut Transform)>,
) {
    let Some(sample) = face.sample() else {
        return;
    };

    let pose = JointPose::from_sample(sample);
    for (joint, mut transform) in &mut joints {
        if let Some(rotation) = pose.get(*joint) {
            transform.rotation = rotation;
        }
    }
}
