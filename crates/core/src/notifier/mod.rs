//! Change notifier module - monotonic counter and long-poll wait loop.

mod notifier_model;
mod notifier_service;
mod notifier_traits;


pub use notifier_model::ChangeObservation;
pub use notifier_service::ChangeNotifier;
pub use notifier_traits::ChangeNotifierTrait;
