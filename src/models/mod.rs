pub mod event;
pub mod schedule;
pub mod user;

pub use event::Event;
pub use schedule::{DateOverride, WeeklyRule};
pub use user::User;
