// Services layer for business logic
// Services own authorization and validation, calling storage directly

pub mod activity;
pub mod note;
pub mod user;

pub use activity::ActivityService;
pub use note::NoteService;
pub use user::UserService;
