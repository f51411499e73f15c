//! Oracle monitoring plugin for a host monitoring agent.
//!
//! The host drives the components in [`oracle`] through the traits in
//! [`plugin`].

pub mod oracle;
pub mod plugin;
