/// Router Module Index
///
/// Routes are split by who may reach them. The edge guard runs in front of all
/// of them; area routes carry a role gate of their own on top.

/// Routes open to anyone, credential or not.
pub mod public;

/// The three role areas of the ProtectedAreaTable.
pub mod areas;
