//! Network path diagnostics: ping series, traceroute, path MTU discovery and
//! TCP connect probing over a shared, serially reused echo sender.

pub mod context;
pub mod diagnostics;
pub mod echo;
pub mod mtu;
pub mod network;
pub mod ping;
pub mod resolver;
pub mod sink;
pub mod traceroute;

#[cfg(test)]
pub(crate) mod testing;
