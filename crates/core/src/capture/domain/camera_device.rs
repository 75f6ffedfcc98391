use crate::capture::domain::camera_input::CameraInput;
use crate::capture::error::CaptureError;

/// Which side of the device a camera faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraPosition {
    Back,
    Front,
    /// Desktop and USB cameras that report no position.
    Unspecified,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceType {
    DualWide,
    WideAngle,
    External,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraDescriptor {
    /// Identifier understood by the discovery that produced it
    /// (a device node, an index, or a file path).
    pub id: String,
    pub name: String,
    pub device_type: DeviceType,
    pub position: CameraPosition,
}

/// Enumerates cameras and opens them as session inputs.
pub trait DeviceDiscovery: Send + Sync {
    fn devices(&self) -> Vec<CameraDescriptor>;

    fn open(&self, device: &CameraDescriptor) -> Result<Box<dyn CameraInput>, CaptureError>;

    /// The camera the session should use for `device_type` at `position`.
    fn default_device(
        &self,
        device_type: DeviceType,
        position: CameraPosition,
    ) -> Option<CameraDescriptor> {
        select_device(&self.devices(), device_type, position)
    }
}

/// Picks the best match: exact type and position, then any type at the
/// position, then the first camera without a position.
///
/// A camera facing the other way is never picked.
pub fn select_device(
    devices: &[CameraDescriptor],
    device_type: DeviceType,
    position: CameraPosition,
) -> Option<CameraDescriptor> {
    devices
        .iter()
        .find(|d| d.device_type == device_type && d.position == position)
        .or_else(|| devices.iter().find(|d| d.position == position))
        .or_else(|| {
            devices
                .iter()
                .find(|d| d.position == CameraPosition::Unspecified)
        })
        .cloned()
}
