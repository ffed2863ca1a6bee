use std::net::SocketAddr;
use std::path::PathBuf;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_inspector_egui::quick::WorldInspectorPlugin;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::api::SharedPropStatus;
use crate::config::PropCatalog;
use crate::props::{CurrentProp, PropControl, PropSelection};
use crate::screenshot::{ScreenshotSettings, TakeScreenshot};
use crate::tracking::{FaceAnchor, LatestFace};
use crate::webcam::{backdrop_scale, WebcamTexture, BACKDROP_DISTANCE};

mod api;
mod config;
mod controls;
mod morph;
mod props;
mod rig;
mod screenshot;
mod tracking;
mod webcam;

#[derive(Parser)]
#[command(name = "funny_face", version, about)]
struct Options {
    #[arg(long, default_value = "127.0.0.1:8888")]
    pub api_bind: String,
    /// TOML prop catalog; the built-in props are used when omitted.
    #[arg(long, short = 'c')]
    pub catalog: Option<PathBuf>,
    #[arg(long, short = 's', default_value = "screenshots")]
    pub screenshot_dir: PathBuf,
    #[arg(long, short = 'p', default_value = "0")]
    pub initial_prop: usize,
    /// Show the world inspector.
    #[arg(long)]
    pub inspector: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,wgpu=warn")))
        .init();
    let options = Options::parse();

    let catalog = match &options.catalog {
        Some(path) => PropCatalog::from_file(path)?,
        None => PropCatalog::default(),
    };
    let selection = PropSelection::new(catalog.len(), options.initial_prop);
    let status = SharedPropStatus::default();
    status.set(catalog.status(selection.index()));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let api_addr: SocketAddr = options.api_bind.parse()?;
    let (api_state, api_resource) = api::ApiState::new(status.clone(), options.screenshot_dir.clone());
    runtime.spawn(async move {
        tracing::info!("serving API on {}", api_addr);
        if let Err(err) = axum_server::bind(api_addr)
            .serve(api::new_api().with_state(api_state).into_make_service()).await {
            tracing::error!("failed to serve API: {}", err);
        }
    });

    let mut app = App::new();
    app
        .add_plugins(DefaultPlugins.build()
            .disable::<LogPlugin>()
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Funny Face".to_string(),
                    ..default()
                }),
                ..default()
            }))
        .add_plugins(EguiPlugin)
        .add_event::<PropControl>()
        .add_event::<TakeScreenshot>()
        .init_resource::<LatestFace>()
        .init_resource::<CurrentProp>()
        .insert_resource(api_resource)
        .insert_resource(catalog)
        .insert_resource(selection)
        .insert_resource(status)
        .insert_resource(ScreenshotSettings {
            directory: options.screenshot_dir,
        })
        .add_systems(Startup, init)
        .add_systems(Update, (
            (
                api::update_api,
                controls::keyboard_controls,
                controls::control_strip,
            ),
            props::apply_prop_controls,
            props::spawn_selected_prop,
            props::check_prop_load,
        ).chain())
        .add_systems(Update, (
            tracking::follow_face,
            rig::bind_rig_joints,
            rig::drive_rig_joints,
            morph::drive_morph_targets,
        ).chain().after(api::update_api))
        .add_systems(Update, screenshot::take_screenshots.after(api::update_api));

    if options.inspector {
        app.add_plugins(WorldInspectorPlugin::new());
    }

    let exit = app.run();
    if exit.is_error() {
        anyhow::bail!("funny_face exited with an error");
    }
    Ok(())
}

fn init(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    commands.spawn(DirectionalLightBundle {
        transform: Transform::from_xyz(0., 2., 2.)
            .looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });

    commands.spawn(Camera3dBundle {
        transform: Transform::from_xyz(0., 0., 0.)
            .looking_at(Vec3::NEG_Z, Vec3::Y),
        ..default()
    });

    commands.spawn((
        SpatialBundle {
            transform: Transform::from_xyz(0., 0., -0.5),
            ..default()
        },
        FaceAnchor,
        Name::new("face anchor"),
    ));

    // Camera feed backdrop; blank until the first frame arrives.
    let image = images.add(Image::default());
    let material = materials.add(StandardMaterial {
        base_color_texture: Some(image.clone()),
        unlit: true,
        ..default()
    });
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Rectangle::new(1.0, 1.0)),
            material: material.clone(),
            transform: Transform::from_xyz(0., 0., -BACKDROP_DISTANCE)
                .with_scale(backdrop_scale(16, 9, PerspectiveProjection::default().fov)),
            ..default()
        },
        WebcamTexture {
            image,
            material,
        },
        Name::new("camera feed"),
    ));
}
