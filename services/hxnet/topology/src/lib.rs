//! Node-graph topology sub-codec and layout arena for hxnet.
//!
//! A player's network is described by two fields: an authoritative node list
//! and an advisory topology field that places the nodes and wires them
//! together. This crate decodes and encodes the topology field and keeps the
//! decoded graph in an id-addressed arena.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod layout;

pub use codec::{generate, parse, NodeTopology, TopologyError};
pub use layout::{Layout, LayoutError, LayoutStats, DEFAULT_COORDINATE};
