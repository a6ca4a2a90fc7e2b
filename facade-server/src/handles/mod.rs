mod area_handle;
mod simulation_handle;
mod store_handle;
mod topic_handle;

pub use area_handle::*;
pub use simulation_handle::*;
pub use store_handle::*;
pub use topic_handle::*;
