//! Core traits defined in `questhub-core` and implemented by other crates.

pub mod push;

pub use push::PushNotifier;
