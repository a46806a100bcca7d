// ABOUTME: Command implementations
// ABOUTME: Exports the single ensure-extension command

pub mod ensure;

pub use ensure::ensure;
