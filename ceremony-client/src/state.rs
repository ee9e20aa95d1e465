//! The sign-in state published to observers.

/// The current stage of the sign-in lifecycle.
///
/// Exactly one value is current at any time. Values are emitted, never
/// mutated in place: the orchestrator publishes each transition through a
/// single-slot channel, so a late observer immediately receives the most
/// recent state, and when states are produced faster than they are consumed
/// only the newest survives. States are not a work queue, so dropping
/// intermediate values is correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInState {
    /// No user is signed in. Always the initial state on process start,
    /// regardless of any previously persisted session.
    SignedOut,

    /// A ceremony is underway for this username: options have been received
    /// and the platform authenticator has yet to deliver its result.
    SigningIn(String),

    /// A registration ceremony completed and the server verified the new
    /// credential.
    SignedIn(String),

    /// An authentication ceremony completed and the server verified the
    /// assertion.
    CompletedSignIn(String),

    /// The server rejected the ceremony. Carries the server-supplied
    /// indicator verbatim.
    SignInError(String),
}
