mod schedule;
mod todo;

pub use schedule::{Schedule, normalize_date, normalize_time};
pub use todo::{Filter, Todo, normalize_text};
