use std::path::{Path, PathBuf};

use crate::capture::domain::camera_device::{
    CameraDescriptor, CameraPosition, DeviceDiscovery, DeviceType,
};
use crate::capture::domain::camera_input::CameraInput;
use crate::capture::error::CaptureError;
use crate::capture::infrastructure::ffmpeg_camera_input::{file_descriptor, FfmpegCameraInput};

/// Finds live cameras the platform capture device format can open.
///
/// Desktop cameras report no position, so they are offered as the fallback
/// for any requested position.
pub struct FfmpegDeviceDiscovery {
    configured: Option<String>,
}

impl FfmpegDeviceDiscovery {
    pub fn new() -> Self {
        Self { configured: None }
    }

    /// Restricts discovery to one device identifier, e.g. `/dev/video2`,
    /// an avfoundation index or a dshow device name.
    pub fn with_device(id: impl Into<String>) -> Self {
        Self {
            configured: Some(id.into()),
        }
    }
}

impl Default for FfmpegDeviceDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDiscovery for FfmpegDeviceDiscovery {
    fn devices(&self) -> Vec<CameraDescriptor> {
        if let Some(ref id) = self.configured {
            return vec![desktop_camera(id.clone(), id.clone())];
        }

        if cfg!(target_os = "macos") {
            vec![desktop_camera("0".to_string(), "Default camera".to_string())]
        } else if cfg!(target_os = "windows") {
            log::warn!("Camera enumeration is not available here; pass a device name");
            Vec::new()
        } else {
            video_nodes(Path::new("/dev"))
        }
    }

    fn open(&self, device: &CameraDescriptor) -> Result<Box<dyn CameraInput>, CaptureError> {
        Ok(Box::new(FfmpegCameraInput::open_device(device)?))
    }
}

/// Offers one recorded clip as the only camera.
pub struct FileReplayDiscovery {
    path: PathBuf,
    paced: bool,
}

impl FileReplayDiscovery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            paced: true,
        }
    }

    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }
}

impl DeviceDiscovery for FileReplayDiscovery {
    fn devices(&self) -> Vec<CameraDescriptor> {
        if self.path.is_file() {
            vec![file_descriptor(&self.path)]
        } else {
            Vec::new()
        }
    }

    fn open(&self, _device: &CameraDescriptor) -> Result<Box<dyn CameraInput>, CaptureError> {
        let input = FfmpegCameraInput::open_file(&self.path)?;
        Ok(if self.paced {
            Box::new(input)
        } else {
            Box::new(input.without_pacing())
        })
    }
}

fn desktop_camera(id: String, name: String) -> CameraDescriptor {
    CameraDescriptor {
        id,
        name,
        device_type: DeviceType::External,
        position: CameraPosition::Unspecified,
    }
}

/// Lists `videoN` device nodes under `dir`, lowest number first.
fn video_nodes(dir: &Path) -> Vec<CameraDescriptor> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut nodes: Vec<(u32, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let number = name.to_str()?.strip_prefix("video")?.parse::<u32>().ok()?;
            Some((number, entry.path()))
        })
        .collect();
    nodes.sort_by_key(|(number, _)| *number);

    nodes
        .into_iter()
        .map(|(number, path)| {
            desktop_camera(path.display().to_string(), format!("Video device {number}"))
        })
        .collect()
}
