pub mod aggregate;
pub mod rules;

pub use aggregate::{average_by_category, mean_of};
pub use rules::evaluate;
