pub mod autopilot;
pub mod consumption;
pub mod decision;
pub mod drm;
pub mod feedback;
pub mod inventory;
pub mod receipt;
pub mod taste;
pub mod token;

pub use consumption::ConsumptionService;
pub use decision::DecisionService;
pub use drm::DrmService;
pub use feedback::FeedbackService;
pub use receipt::ReceiptService;
pub use taste::TasteService;
pub use token::TokenService;
