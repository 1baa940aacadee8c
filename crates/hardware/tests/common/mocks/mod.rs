//! Mocks of the collaborator traits.


/// Memory level mock.
pub mod memory;
