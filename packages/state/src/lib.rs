//! Client-side state shared by the front ends: the user directory, the theme
//! preference, search debouncing, and route guarding.

pub mod debounce;
pub mod directory;
pub mod navigation;
pub mod theme;

pub use debounce::Debouncer;
pub use directory::{Directory, DirectoryState, RequestTicket};
pub use navigation::{after_error, guard, Route};
pub use theme::{Theme, ThemeStore};
