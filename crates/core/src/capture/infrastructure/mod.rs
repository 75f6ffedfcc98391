pub mod ffmpeg_camera_input;
pub mod ffmpeg_device_discovery;
