pub mod dashboard;

pub use dashboard::{view_stream, DashboardView};
