mod health_check;
pub mod users;

pub use health_check::health_check;
