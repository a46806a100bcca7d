// ABOUTME: PostgreSQL utilities module
// ABOUTME: Exports session setup, identifier quoting, and extension reconciliation

pub mod connection;
pub mod extensions;
pub mod quoting;
pub mod session;

pub use connection::connect;
pub use extensions::{
    decide, extension_exists, find_installation, plan, reconcile, DesiredState, ExtensionAction,
    ExtensionSpec, Installation, PlannedChange, Reconciliation,
};
pub use quoting::{quote_literal, IdentifierQuoter, QuotedIdentifier};
pub use session::{Session, TextRow};
