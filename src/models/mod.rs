pub mod decision;
pub mod drm;
pub mod feedback;
pub mod receipt;
pub mod types;
