//! User-facing status messages

pub const INITIAL: &str = "Upload your URDF and mesh files.";
pub const LOADING: &str = "Loading robot model...";
pub const LOADED: &str = "Robot loaded successfully! Use your body to control the robot.";
pub const CLEARED: &str = "Files cleared. Upload new URDF and mesh files.";
pub const RENDER_FAULT: &str = "Rendering error occurred. Please refresh and try again.";
pub const RETRY: &str = "Try loading the robot again.";

pub const RECORDING_STARTED: &str = "Recording started...";
pub const RECORDING_STOPPED: &str = "Recording stopped. Video is ready to play.";
pub const PLAYING: &str = "Playing recorded video.";
pub const SESSION_EXPORTED: &str = "Recording saved.";
pub const SESSION_IMPORTED: &str = "Recording loaded. Ready to play.";

pub fn urdf_selected(name: &str) -> String {
    format!("URDF file selected: {}", name)
}

pub fn meshes_loaded(count: usize) -> String {
    format!("{} mesh files loaded successfully.", count)
}
