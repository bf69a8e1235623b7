pub mod outreach_handlers;
pub mod profile_handlers;
pub mod run_handlers;
pub mod system_handlers;

pub use outreach_handlers::*;
pub use profile_handlers::*;
pub use run_handlers::*;
pub use system_handlers::*;
