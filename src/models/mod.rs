pub mod feedback;
pub mod record;
pub mod template;

pub use feedback::*;
pub use record::*;
pub use template::*;
