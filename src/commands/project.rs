//! Loading camera-project.json and its pointer stream from disk.

use std::path::{Path, PathBuf};

use crate::error::{CameraError, CameraResult};
use crate::models::events::{MouseEventsFile, SCHEMA_VERSION as EVENTS_SCHEMA_VERSION};
use crate::models::project::{CameraProject, SCHEMA_VERSION};

pub const PROJECT_FILE_NAME: &str = "camera-project.json";

/// A validated project together with its pointer stream.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub project_file: PathBuf,
    pub project: CameraProject,
    /// `None` when the events file is missing or unreadable; the camera then
    /// behaves as if the cursor never moved.
    pub events: Option<MouseEventsFile>,
}

/// Loads the project and its events.
///
/// Accepts either the project file or the directory containing it.
pub async fn load_project(project_path: &str) -> CameraResult<LoadedProject> {
    let project_file = resolve_project_file(project_path)?;
    log::info!("load_project: path={}", project_file.display());

    let project = read_project_file(&project_file).await?;
    let project_dir = project_file.parent().unwrap_or_else(|| Path::new("."));

    let events = match read_events_file(project_dir, &project).await {
        Ok(events) => Some(events),
        Err(err @ CameraError::RecordingMismatch { .. }) => return Err(err),
        Err(err) => {
            log::warn!("load_project: cannot load events file: {err}");
            None
        }
    };

    Ok(LoadedProject {
        project_file,
        project,
        events,
    })
}

pub async fn read_project_file(path: &Path) -> CameraResult<CameraProject> {
    let raw = tokio::fs::read_to_string(path).await?;
    let project: CameraProject = serde_json::from_str(&raw)?;

    if project.schema_version != SCHEMA_VERSION {
        return Err(CameraError::UnsupportedSchema {
            file: "project",
            expected: SCHEMA_VERSION,
            found: project.schema_version,
        });
    }
    validate_project(&project)?;

    Ok(project)
}

fn validate_project(project: &CameraProject) -> CameraResult<()> {
    if project.recording.width == 0 || project.recording.height == 0 {
        return Err(CameraError::InvalidDimensions {
            what: "recording",
            width: project.recording.width,
            height: project.recording.height,
        });
    }
    if project.output.width == 0 || project.output.height == 0 {
        return Err(CameraError::InvalidDimensions {
            what: "output",
            width: project.output.width,
            height: project.output.height,
        });
    }
    if !(project.output.fps.is_finite() && project.output.fps > 0.0) {
        return Err(CameraError::InvalidFrameRate(project.output.fps));
    }
    Ok(())
}

pub async fn read_events_file(
    project_dir: &Path,
    project: &CameraProject,
) -> CameraResult<MouseEventsFile> {
    let path = project_dir.join(Path::new(project.events_path.trim()));
    let raw = tokio::fs::read_to_string(&path).await?;
    let events: MouseEventsFile = serde_json::from_str(&raw)?;

    if events.schema_version != EVENTS_SCHEMA_VERSION {
        return Err(CameraError::UnsupportedSchema {
            file: "events",
            expected: EVENTS_SCHEMA_VERSION,
            found: events.schema_version,
        });
    }
    if events.recording_id != project.recording.id {
        return Err(CameraError::RecordingMismatch {
            expected: project.recording.id.clone(),
            found: events.recording_id,
        });
    }
    if (events.screen_width, events.screen_height)
        != (project.recording.width, project.recording.height)
    {
        log::warn!(
            "read_events_file: events recorded at {}x{}, recording is {}x{}",
            events.screen_width,
            events.screen_height,
            project.recording.width,
            project.recording.height
        );
    }

    log::info!(
        "read_events_file: path={} events={}",
        path.display(),
        events.events.len()
    );
    Ok(events)
}

fn resolve_project_file(path: &str) -> CameraResult<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(CameraError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Project path is empty",
        )));
    }

    let input = PathBuf::from(trimmed);
    let resolved = if input
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    {
        input
    } else {
        input.join(PROJECT_FILE_NAME)
    };

    Ok(resolved)
}
