pub mod activity;
pub mod appointment;
pub mod document;
pub mod enums;
pub mod event;
pub mod medication;
pub mod notification;
pub mod task;

pub use activity::*;
pub use appointment::*;
pub use document::*;
pub use event::*;
pub use medication::*;
pub use notification::*;
pub use task::*;
