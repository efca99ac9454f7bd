pub mod feedback;
pub mod patient;
pub mod template;

pub use feedback::*;
pub use patient::*;
pub use template::*;
