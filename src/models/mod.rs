pub mod group;
pub mod label;
pub mod notification;
pub mod task;
pub mod user;

pub use group::{Group, Role};
pub use label::Label;
pub use notification::{Notification, NotificationType};
pub use task::{Priority, Task, TaskKind};
pub use user::User;
