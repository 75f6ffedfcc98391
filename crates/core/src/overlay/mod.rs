pub mod detection_overlay;
pub mod highlight_shape;
pub mod overlay_event;
pub mod overlay_layer;
pub mod overlay_screen;
pub mod preview_surface;
