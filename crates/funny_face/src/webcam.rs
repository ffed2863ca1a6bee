use bevy::prelude::{Component, Handle, Image, StandardMaterial, Vec3};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use funny_face_api::SetCameraRequest;

/// Distance from the camera to the camera-feed backdrop.
pub const BACKDROP_DISTANCE: f32 = 5.0;

/// Backdrop quad showing the latest camera frame.
#[derive(Component)]
pub struct WebcamTexture {
    pub image: Handle<Image>,
    pub material: Handle<StandardMaterial>,
}

pub fn camera_image(request: &SetCameraRequest) -> Image {
    let size = Extent3d {
        width: request.width,
        height: request.height,
        depth_or_array_layers: 1,
    };
    Image::new(
        size,
        TextureDimension::D2,
        request.payload.to_vec(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

/// Scale of a unit quad at [`BACKDROP_DISTANCE`] so it fills a vertical field of view.
pub fn backdrop_scale(width: u32, height: u32, fov: f32) -> Vec3 {
    let visible_height = 2.0 * BACKDROP_DISTANCE * (fov * 0.5).tan();
    let aspect = if height == 0 { 1.0 } else { width as f32 / height as f32 };
    Vec3::new(visible_height * aspect, visible_height, 1.0)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use bytes::Bytes;

    use super::*;

    #[test]
    fn image_matches_request() {
        let request = SetCameraRequest {
            width: 2,
            height: 1,
            payload: Bytes::from(vec![255u8; 8]),
        };
        let image = camera_image(&request);
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 1);
        assert_eq!(image.texture_descriptor.format, TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn backdrop_keeps_frame_aspect() {
        let scale = backdrop_scale(1920, 1080, FRAC_PI_2);
        assert!((scale.y - 2.0 * BACKDROP_DISTANCE).abs() < 1e-4);
        assert!((scale.x / scale.y - 1920.0 / 1080.0).abs() < 1e-4);
    }
}
