pub use super::replies::Entity as Replies;
pub use super::threads::Entity as Threads;
pub use super::users::Entity as Users;
