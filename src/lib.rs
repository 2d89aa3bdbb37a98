//! # snarl-dist: a distance index for variation graphs
//!
//! This crate implements a precomputed distance index for directed sequence
//! graphs with a snarl decomposition. After construction, the index answers
//! two kinds of queries between graph positions:
//!
//! * [`DistanceIndex::min_distance`]: the exact minimum walk distance, in
//!   near-constant time in the depth of the decomposition.
//! * [`DistanceIndex::max_distance`]: an upper bound on the length of any
//!   walk, saturated at a user-supplied cap, in constant time.
//!
//! The index is built bottom-up over the snarl forest: every snarl gets an
//! all-pairs distance table over the boundary visits of its child units,
//! every chain gets prefix sums and loop distances, and every node is
//! mapped to its innermost snarl. Queries walk the decomposition tree
//! upward from both positions and combine precomputed distances at the
//! common ancestors.
//!
//! The graph and the snarl decomposition are external inputs. The graph is
//! anything implementing [`GraphInterface`]; the crate provides the
//! in-memory [`HashGraph`] and an implementation for [`gbwt::GBZ`]. The
//! decomposition is stored in a [`SnarlManager`] populated from boundaries
//! computed elsewhere.
//!
//! See [`DistanceIndex`] for the main interface and [`formats`] for the
//! textual input formats used by the command line tools.

pub mod distance;
pub mod formats;
pub mod graph;
pub mod max_distance;
pub mod snarls;
pub mod utils;

pub use distance::{ChainIndex, DistanceIndex, SnarlIndex};
pub use graph::{GraphInterface, HashGraph, Position, Visit};
pub use max_distance::MaxDistanceIndex;
pub use snarls::{NetGraph, Snarl, SnarlManager};
