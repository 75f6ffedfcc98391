pub mod camera_device;
pub mod camera_input;
pub mod frame_delegate;
pub mod video_data_output;
