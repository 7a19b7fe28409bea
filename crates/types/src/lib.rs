//! Core types for the linksim workspace.
//!
//! Everything here is plain single-threaded data: simulated time and the
//! shared clock handle, simulated host addresses, the owned packet buffer
//! that moves between nodes, and connection identifiers.

mod address;
mod ids;
mod packet;
mod time;

pub use address::AddressAllocator;
pub use ids::ConnectionId;
pub use packet::Packet;
pub use time::{SimClock, SimTime};
