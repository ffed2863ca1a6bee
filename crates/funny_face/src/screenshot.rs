use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bevy::prelude::{Entity, Event, EventReader, Query, Res, ResMut, Resource, With};
use bevy::render::view::screenshot::ScreenshotManager;
use bevy::window::PrimaryWindow;

#[derive(Debug, Clone, Default, Event)]
pub struct TakeScreenshot {
    /// Destination; a fresh name in the screenshot directory when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Resource)]
pub struct ScreenshotSettings {
    pub directory: PathBuf,
}

pub fn screenshot_file_name(timestamp: u64, id: &str) -> String {
    format!("funny-face-{}-{}.png", timestamp, id)
}

pub fn next_screenshot_path(directory: &Path) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    directory.join(screenshot_file_name(timestamp, &nanoid::nanoid!(8)))
}

/// Captures the primary window. Failures are logged and otherwise dropped.
pub fn take_screenshots(
    mut requests: EventReader<TakeScreenshot>,
    settings: Res<ScreenshotSettings>,
    windows: Query<Entity, With<PrimaryWindow>>,
    mut screenshots: ResMut<ScreenshotManager>,
) {
    for request in requests.read() {
        let path = request.path.clone()
            .unwrap_or_else(|| next_screenshot_path(&settings.directory));

        let Ok(window) = windows.get_single() else {
            tracing::warn!("no window to capture, screenshot not saved");
            continue;
        };

        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                tracing::warn!("failed to create {}: {}", parent.display(), err);
                continue;
            }
        }

        match screenshots.save_screenshot_to_disk(window, &path) {
            Ok(()) => tracing::info!("saving screenshot to {}", path.display()),
            Err(err) => tracing::warn!("screenshot not saved: {}", err),
        }
    }
}
