//! Storage-domain contracts shared by the runtime and browser adapters.

pub mod prefs;
