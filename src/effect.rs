//! Side effects produced by the controller for the runtime to execute.

use crate::Identity;

/// Instruction emitted by [`SessionController::handle`](crate::SessionController::handle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Redraw from a fresh render plan.
    Render,

    /// Fetch the profile for `identity`.
    LookupProfile {
        /// Auth generation the result must match to be applied.
        generation: u64,
        /// Identity to look up.
        identity: Identity,
    },

    /// Ask the auth backend to end the current session.
    SignOut,

    /// Persist the coin balance for `identity`.
    PersistCoins {
        /// Owner of the balance.
        identity: Identity,
        /// New balance.
        amount: u64,
    },
}
