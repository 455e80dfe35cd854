pub mod page_context;
pub mod tally_event;
pub mod tally_user;
pub mod validation;

pub use page_context::{PageContext, PageContextProvider};
pub use tally_event::TallyEvent;
pub use tally_user::TallyUser;
