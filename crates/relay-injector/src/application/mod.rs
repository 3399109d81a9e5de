//! Application layer for the injector.
//!
//! [`inject::InjectInputUseCase`] turns decoded frames into device calls on an
//! [`inject::InputInjector`] trait object.  The concrete devices live in the
//! infrastructure layer.

pub mod inject;

pub use inject::{InjectError, InjectInputUseCase, InjectorRole, InputInjector};
