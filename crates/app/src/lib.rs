//! `shelf-app`
//!
//! **Responsibility:** presentation of the product list.
//!
//! - `presenter`: keeps a rendered snapshot in sync with the store and turns user
//!   intents (add, delete) into store calls
//! - `view`: the seam a concrete UI implements
//! - `terminal`: a line-oriented front end used by the `shelf` binary

pub mod presenter;
pub mod terminal;
pub mod view;

pub use presenter::{PresenterError, ProductListPresenter};
pub use terminal::{Command, CommandError, TerminalView};
pub use view::{ProductListView, ProductRow};
