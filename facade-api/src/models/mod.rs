mod area;
mod category;
mod decision;
mod historian;
mod rule;
mod schedule;

pub use area::*;
pub use category::*;
pub use decision::*;
pub use historian::*;
pub use rule::*;
pub use schedule::*;
