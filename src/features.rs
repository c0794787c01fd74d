//! Feature modules - synchronization logic separated from presentation
//!
//! Nothing here depends on a UI toolkit. Presentation adapters consume
//! `lyrics::SyncEvent`s and feed back gestures and taps.

pub mod lyrics;
pub mod settings;

pub use settings::{SettingsError, SyncSettings};
