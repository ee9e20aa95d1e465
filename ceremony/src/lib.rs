//! # Ceremony
//!
//! A small collection of Rust libraries implementing the *client side* of
//! WebAuthn sign-in ceremonies against a FIDO2 relying party. It is comprised
//! of two sub-libraries:
//!
//! - `ceremony-client`, usable as [`client`]: the ceremony codec (exact
//!   wire shapes for the four protocol calls) and the sign-in orchestrator
//!   with its state machine.
//! - `ceremony-types`, usable as [`types`]: type definitions for the
//!   ceremony payloads, including the base64url [`types::Bytes`]
//!   representation every binary field uses on the wire.
//!
//! You can think of the pieces as a chain:
//!
//! RelyingParty ↔ [`client::Transport`] ↔ [`client::SignInFlow`] ↔
//! [`client::AuthenticatorCapability`]
//!
//! The [`client::SignInFlow`] type drives both ceremonies end to end:
//!
//! - [`register()`](client::SignInFlow::register) to register a new credential.
//! - [`authenticate()`](client::SignInFlow::authenticate) to sign in with an
//!   existing credential.
//!
//! or, when the platform hands credentials back through its own UI flow, the
//! split operations
//! [`start_registration()`](client::SignInFlow::start_registration) /
//! [`complete_registration()`](client::SignInFlow::complete_registration) and
//! their authentication mirrors.
//!
//! The flow performs no networking and holds no keys itself: HTTP lives
//! behind [`client::Transport`], the platform authenticator behind
//! [`client::AuthenticatorCapability`], and durable session data behind
//! [`client::SettingsStore`]. Observers follow the sign-in lifecycle through
//! [`client::SignInFlow::state`], which always replays the latest
//! [`client::SignInState`] to new subscribers.
//!
//! A runnable demonstration is provided in `ceremony/examples/usage.rs`.

pub use ceremony_client as client;
pub use ceremony_types as types;
