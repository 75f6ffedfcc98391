pub mod face_detector;
pub mod face_landmarks;
pub mod face_observation;
pub mod image_orientation;
