pub mod dispatch;
pub mod user_fill;
pub mod validation;

pub use dispatch::{dispatch, DispatchContext};
pub use user_fill::apply_user_fill;
pub use validation::{EntryValidator, RuleValidator};
