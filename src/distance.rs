//! The minimum distance index.
//!
//! [`DistanceIndex`] answers minimum distance queries between positions in a
//! variation graph with a snarl decomposition. It stores an all-pairs
//! distance table for the boundary visits of every snarl, prefix sums and
//! loop distances for every chain, and a map from nodes to their innermost
//! snarls. A query walks the decomposition tree upward from both positions
//! and combines precomputed distances at every common ancestor.
//!
//! The index also owns a [`MaxDistanceIndex`] for capped upper bound
//! queries and serializes itself into a byte stream of typed blocks.
//!
//! Distances are measured in base pairs. The sentinel -1 means unreachable.

use crate::graph::{GraphInterface, Position, Visit};
use crate::max_distance::MaxDistanceIndex;
use crate::snarls::{NetGraph, Snarl, SnarlManager};
use crate::utils::{self, PackedVector};

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::io::{self, Read, Write};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

// Serialization constants.

const MAGIC: [u8; 4] = *b"SDIX";
const FORMAT_VERSION: u8 = 1;

const BLOCK_HEADER: u8 = 1;
const BLOCK_NODE_TO_SNARL: u8 = 2;
const BLOCK_SNARL: u8 = 3;
const BLOCK_CHAIN: u8 = 4;
const BLOCK_MAX_DISTANCE: u8 = 5;

//-----------------------------------------------------------------------------

/// Returns the minimum of two distances, ignoring unreachable values.
#[inline]
pub fn min_defined(a: i64, b: i64) -> i64 {
    if a < 0 {
        b
    } else if b < 0 {
        a
    } else {
        a.min(b)
    }
}

//-----------------------------------------------------------------------------

/// All-pairs distances among the boundary visits of one snarl's child units.
///
/// The indexed visits are the two boundary visits of the snarl itself, both
/// entry visits of every child chain, and both visits of every free node.
/// `snarl_distance` is measured from the start of the first visit to the
/// start of the second visit. The diagonal of the table stores the shortest
/// walk from a visit back to itself through at least one edge; the trivial
/// distance from a visit to itself is 0 and is not stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnarlIndex {
    visit_to_index: HashMap<i64, usize>,
    visits: Vec<i64>,
    distances: PackedVector,
    start: Visit,
    end: Visit,
}

impl SnarlIndex {
    /// Returns the boundary visit pointing into the snarl.
    pub fn snarl_start(&self) -> Visit {
        self.start
    }

    /// Returns the boundary visit pointing out of the snarl.
    pub fn snarl_end(&self) -> Visit {
        self.end
    }

    /// Returns the number of indexed visits.
    pub fn num_visits(&self) -> usize {
        self.visits.len()
    }

    /// Returns `true` if the visit is indexed in this snarl.
    pub fn contains_visit(&self, visit: Visit) -> bool {
        self.visit_to_index.contains_key(&visit.encode())
    }

    // Returns the dense slot of the visit.
    //
    // Querying a visit that is not indexed is a programming error.
    fn slot(&self, visit: Visit) -> usize {
        match self.visit_to_index.get(&visit.encode()) {
            Some(slot) => *slot,
            None => panic!("Visit {} is not indexed in snarl ({}, {})", visit, self.start, self.end),
        }
    }

    /// Returns the minimum distance from the start of `from` to the start of
    /// `to`, traversing only this snarl. Returns -1 if unreachable.
    pub fn snarl_distance(&self, from: Visit, to: Visit) -> i64 {
        if from == to {
            return 0;
        }
        let row = self.slot(from);
        let column = self.slot(to);
        utils::decode_distance(self.distances.get(row * self.visits.len() + column))
    }

    /// Returns the minimum distance from the end of `from` to the start of
    /// `to`, where `from_len` is the length of the unit headed by `from`.
    ///
    /// The result may be negative when the two visits share a node.
    pub fn snarl_distance_short(&self, from: Visit, to: Visit, from_len: i64) -> i64 {
        let distance = self.snarl_distance(from, to);
        if distance < 0 {
            -1
        } else {
            distance - from_len
        }
    }

    /// Returns the shortest walk from the start of the visit back to itself
    /// through at least one edge. Returns -1 if no such walk exists.
    pub fn visit_cycle(&self, visit: Visit) -> i64 {
        let slot = self.slot(visit);
        utils::decode_distance(self.distances.get(slot * self.visits.len() + slot))
    }

    /// Given distances from a position to the two entry visits of one child
    /// unit, returns the distances from the position to the start of the
    /// snarl's start visit and to the far side of its end visit.
    ///
    /// `entry_l` is the visit entering the unit from the side closer to the
    /// snarl start in unit orientation; `dist_l` and `dist_r` are the
    /// distances from the position to the starts of `entry_l` and `entry_r`.
    /// Either distance may be -1 for unreachable.
    pub fn dist_to_ends(&self, entry_l: Visit, entry_r: Visit, dist_l: i64, dist_r: i64) -> (i64, i64) {
        let mut to_start = -1;
        let mut to_end = -1;
        let into_end = self.end.flip();
        for (entry, dist) in [(entry_l, dist_l), (entry_r, dist_r)] {
            if dist < 0 {
                continue;
            }
            let from_start = self.snarl_distance(self.start, entry);
            if from_start >= 0 {
                to_start = min_defined(to_start, from_start + dist);
            }
            let from_end = self.snarl_distance(into_end, entry);
            if from_end >= 0 {
                to_end = min_defined(to_end, from_end + dist);
            }
        }
        (to_start, to_end)
    }

    fn serialize<W: Write>(&self, output: &mut W) -> io::Result<()> {
        utils::write_signed(self.start.encode(), output)?;
        utils::write_signed(self.end.encode(), output)?;
        utils::write_varint(self.visits.len(), output)?;
        for visit in self.visits.iter() {
            utils::write_signed(*visit, output)?;
        }
        self.distances.serialize(output)
    }

    fn load<R: Read>(input: &mut R) -> Result<Self, String> {
        let start = utils::read_signed(input)?;
        let end = utils::read_signed(input)?;
        if start == 0 || end == 0 {
            return Err(String::from("Invalid snarl boundary visit 0"));
        }
        let count = utils::read_varint(input)?;
        let mut visits = Vec::with_capacity(count);
        let mut visit_to_index = HashMap::with_capacity(count);
        for slot in 0..count {
            let visit = utils::read_signed(input)?;
            if visit == 0 {
                return Err(String::from("Invalid indexed visit 0"));
            }
            if visit_to_index.insert(visit, slot).is_some() {
                return Err(format!("Duplicate indexed visit {}", visit));
            }
            visits.push(visit);
        }
        let distances = PackedVector::load(input)?;
        if distances.len() != count * count {
            return Err(format!(
                "Snarl distance table has {} entries for {} visits", distances.len(), count
            ));
        }
        Ok(SnarlIndex {
            visit_to_index, visits, distances,
            start: Visit::decode(start), end: Visit::decode(end),
        })
    }
}

//-----------------------------------------------------------------------------

/// Prefix sums and loop distances for one chain of snarls.
///
/// A chain of `m` snarls has `m + 1` boundary nodes. For boundary `j`,
/// `prefix_sum[2j]` is the distance from the start of the chain to the near
/// side of the node and `prefix_sum[2j + 1]` to its far side, both in chain
/// orientation. The last entry is therefore the length of the chain.
/// `loop_fd[j]` is the shortest walk leaving the far side of boundary `j`
/// forward and returning to the same side, exclusive of the node itself;
/// `loop_rev[j]` is the same for the near side going backward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainIndex {
    node_to_index: HashMap<usize, usize>,
    boundaries: Vec<Visit>,
    prefix_sum: PackedVector,
    loop_fd: PackedVector,
    loop_rev: PackedVector,
}

impl ChainIndex {
    /// Returns the number of snarls in the chain.
    pub fn num_snarls(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Returns the boundary visits in chain orientation.
    pub fn boundaries(&self) -> &[Visit] {
        &self.boundaries
    }

    // Returns the ordinal of the boundary node.
    //
    // Querying a node that is not a boundary of this chain is a programming
    // error.
    fn boundary_index(&self, node_id: usize) -> usize {
        match self.node_to_index.get(&node_id) {
            Some(index) => *index,
            None => panic!("Node {} is not a boundary node of the chain", node_id),
        }
    }

    // Interprets a visit on a boundary node: the ordinal and whether the
    // visit follows chain orientation.
    fn side_of(&self, visit: Visit) -> (usize, bool) {
        let index = self.boundary_index(visit.id);
        (index, self.boundaries[index] == visit)
    }

    // Distance from the start of the chain to the near side of boundary `j`.
    #[inline]
    fn near(&self, index: usize) -> i64 {
        self.prefix_sum.get(2 * index) as i64
    }

    // Distance from the start of the chain to the far side of boundary `j`.
    #[inline]
    fn far(&self, index: usize) -> i64 {
        self.prefix_sum.get(2 * index + 1) as i64
    }

    /// Returns the length of boundary node `j`.
    #[inline]
    pub fn node_len(&self, index: usize) -> i64 {
        self.far(index) - self.near(index)
    }

    /// Returns the length of the entire chain.
    pub fn chain_length(&self) -> i64 {
        self.far(self.num_snarls())
    }

    /// Returns the forward loop distance at boundary `j`, or -1 if there is
    /// no such loop.
    pub fn loop_fd(&self, index: usize) -> i64 {
        utils::decode_distance(self.loop_fd.get(index))
    }

    /// Returns the reverse loop distance at boundary `j`, or -1 if there is
    /// no such loop.
    pub fn loop_rev(&self, index: usize) -> i64 {
        utils::decode_distance(self.loop_rev.get(index))
    }

    /// Returns the minimum distance from the start of visit `from` to the
    /// start of visit `to`, staying within the chain. Returns -1 if
    /// unreachable.
    ///
    /// Both visits must be on boundary nodes of the chain.
    pub fn chain_distance(&self, from: Visit, to: Visit) -> i64 {
        let (i, i_fwd) = self.side_of(from);
        let (j, j_fwd) = self.side_of(to);
        let mut result = -1;
        match (i_fwd, j_fwd) {
            (true, true) => {
                if i <= j {
                    result = min_defined(result, self.near(j) - self.near(i));
                }
                if j <= i && self.loop_fd(i) >= 0 && self.loop_rev(j) >= 0 {
                    result = min_defined(
                        result,
                        self.node_len(i) + self.loop_fd(i) + (self.far(i) - self.near(j)) + self.loop_rev(j)
                    );
                }
            },
            (false, false) => {
                if j <= i {
                    result = min_defined(result, self.far(i) - self.far(j));
                }
                if i <= j && self.loop_rev(i) >= 0 && self.loop_fd(j) >= 0 {
                    result = min_defined(
                        result,
                        self.node_len(i) + self.loop_rev(i) + (self.far(j) - self.near(i)) + self.loop_fd(j)
                    );
                }
            },
            (true, false) => {
                if i <= j && self.loop_fd(j) >= 0 {
                    result = min_defined(result, (self.far(j) - self.near(i)) + self.loop_fd(j));
                }
                if j <= i && self.loop_fd(i) >= 0 {
                    result = min_defined(
                        result,
                        self.node_len(i) + self.loop_fd(i) + (self.far(i) - self.far(j))
                    );
                }
            },
            (false, true) => {
                if j <= i && self.loop_rev(j) >= 0 {
                    result = min_defined(result, (self.far(i) - self.near(j)) + self.loop_rev(j));
                }
                if i <= j && self.loop_rev(i) >= 0 {
                    result = min_defined(
                        result,
                        self.node_len(i) + self.loop_rev(i) + (self.near(j) - self.near(i))
                    );
                }
            },
        }
        result
    }

    /// Returns the minimum distance from the end of visit `from` to the
    /// start of visit `to`.
    ///
    /// The result may be negative when the two visits share a node.
    pub fn chain_distance_short(&self, from: Visit, to: Visit) -> i64 {
        let d1 = self.chain_distance(from, to);
        let d2 = self.chain_distance(to.flip(), from.flip());
        let (i, _) = self.side_of(from);
        let (j, _) = self.side_of(to);
        if d1 < 0 && d2 < 0 {
            -1
        } else if d2 < 0 {
            d1 - self.node_len(i)
        } else if d1 < 0 {
            d2 - self.node_len(j)
        } else {
            (d1 - self.node_len(i)).min(d2 - self.node_len(j))
        }
    }

    /// Given distances from a position to the near side of the entry
    /// boundary and the far side of the exit boundary of snarl `ordinal`,
    /// returns the distances from the position to the two ends of the chain.
    pub fn dist_to_ends(&self, ordinal: usize, dist_l: i64, dist_r: i64) -> (i64, i64) {
        let total = self.chain_length();
        let entry = ordinal;
        let exit = ordinal + 1;
        let mut to_start = -1;
        let mut to_end = -1;
        if dist_l >= 0 {
            to_start = min_defined(to_start, self.near(entry) + dist_l);
            if self.loop_rev(entry) >= 0 {
                to_end = min_defined(to_end, (total - self.near(entry)) + self.loop_rev(entry) + dist_l);
            }
        }
        if dist_r >= 0 {
            to_end = min_defined(to_end, (total - self.far(exit)) + dist_r);
            if self.loop_fd(exit) >= 0 {
                to_start = min_defined(to_start, self.far(exit) + self.loop_fd(exit) + dist_r);
            }
        }
        (to_start, to_end)
    }

    /// Returns the distance of a U-turn through the chain: entering from the
    /// chain start and leaving through the chain start again. Returns -1 if
    /// the chain cannot be re-exited from its start.
    pub fn uturn_start(&self) -> i64 {
        if self.loop_fd(0) < 0 {
            -1
        } else {
            2 * self.node_len(0) + self.loop_fd(0)
        }
    }

    /// Returns the distance of a U-turn through the chain from its end.
    pub fn uturn_end(&self) -> i64 {
        let last = self.num_snarls();
        if self.loop_rev(last) < 0 {
            -1
        } else {
            2 * self.node_len(last) + self.loop_rev(last)
        }
    }

    fn serialize<W: Write>(&self, output: &mut W) -> io::Result<()> {
        utils::write_varint(self.num_snarls(), output)?;
        for visit in self.boundaries.iter() {
            utils::write_signed(visit.encode(), output)?;
        }
        self.prefix_sum.serialize(output)?;
        self.loop_fd.serialize(output)?;
        self.loop_rev.serialize(output)
    }

    fn load<R: Read>(input: &mut R) -> Result<Self, String> {
        let snarls = utils::read_varint(input)?;
        if snarls == 0 {
            return Err(String::from("A chain must contain at least one snarl"));
        }
        let mut boundaries = Vec::with_capacity(snarls + 1);
        let mut node_to_index = HashMap::with_capacity(snarls + 1);
        for index in 0..snarls + 1 {
            let visit = utils::read_signed(input)?;
            if visit == 0 {
                return Err(String::from("Invalid chain boundary visit 0"));
            }
            let visit = Visit::decode(visit);
            if node_to_index.insert(visit.id, index).is_some() {
                return Err(format!("Duplicate chain boundary node {}", visit.id));
            }
            boundaries.push(visit);
        }
        let prefix_sum = PackedVector::load(input)?;
        if prefix_sum.len() != 2 * (snarls + 1) {
            return Err(format!(
                "Chain prefix sums have {} entries for {} snarls", prefix_sum.len(), snarls
            ));
        }
        let loop_fd = PackedVector::load(input)?;
        let loop_rev = PackedVector::load(input)?;
        if loop_fd.len() != snarls + 1 || loop_rev.len() != snarls + 1 {
            return Err(String::from("Chain loop vectors do not match the number of boundary nodes"));
        }
        Ok(ChainIndex { node_to_index, boundaries, prefix_sum, loop_fd, loop_rev })
    }
}

//-----------------------------------------------------------------------------

// An ancestor of a position in the decomposition tree, together with the
// distances from the position to the two entry visits of the child unit of
// that ancestor containing the position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Level {
    InSnarl(usize),
    InChain(usize),
}

#[derive(Clone, Copy, Debug)]
struct AncestorEntry {
    level: Level,
    entry_l: Visit,
    entry_r: Visit,
    unit_len: i64,
    dist_l: i64,
    dist_r: i64,
}

//-----------------------------------------------------------------------------

/// A minimum and maximum distance index over a graph and its snarl
/// decomposition.
///
/// The index borrows the graph and the snarl manager, which must not change
/// while the index is alive. Construction is single-threaded; queries are
/// pure reads and may run concurrently.
///
/// # Examples
///
/// ```
/// use snarl_dist::{DistanceIndex, HashGraph, Position, SnarlManager, Visit};
/// use gbwt::Orientation;
///
/// // A bubble: 1 -> {2, 3} -> 4, with node lengths 2, 4, 6, 2.
/// let mut graph = HashGraph::new();
/// for (id, len) in [(1, 2), (2, 4), (3, 6), (4, 2)] {
///     graph.add_node(id, len).unwrap();
/// }
/// for (from, to) in [(1, 2), (1, 3), (2, 4), (3, 4)] {
///     graph.add_edge(Visit::forward(from), Visit::forward(to)).unwrap();
/// }
/// let mut manager = SnarlManager::new();
/// manager.add_chain(None, &[Visit::forward(1), Visit::forward(4)]).unwrap();
///
/// let index = DistanceIndex::new(&graph, &manager, 1000, false).unwrap();
/// let from = Position::new(1, 0, Orientation::Forward);
/// let to = Position::new(4, 1, Orientation::Forward);
/// assert_eq!(index.min_distance(from, to), Ok(7));
/// ```
#[derive(Debug)]
pub struct DistanceIndex<'a, G: GraphInterface> {
    graph: &'a G,
    manager: &'a SnarlManager,
    snarl_indexes: Vec<SnarlIndex>,
    chain_indexes: Vec<ChainIndex>,
    node_to_snarl: PackedVector,
    min_node_id: usize,
    max_node_id: usize,
    cap: usize,
    max_index: MaxDistanceIndex,
}

impl<'a, G: GraphInterface> PartialEq for DistanceIndex<'a, G> {
    fn eq(&self, other: &Self) -> bool {
        self.snarl_indexes == other.snarl_indexes
            && self.chain_indexes == other.chain_indexes
            && self.node_to_snarl == other.node_to_snarl
            && self.min_node_id == other.min_node_id
            && self.max_node_id == other.max_node_id
            && self.cap == other.cap
            && self.max_index == other.max_index
    }
}

impl<'a, G: GraphInterface> Eq for DistanceIndex<'a, G> {}

//-----------------------------------------------------------------------------

/// Construction.
impl<'a, G: GraphInterface> DistanceIndex<'a, G> {
    /// Builds a distance index for the given graph and snarl decomposition.
    ///
    /// # Arguments
    ///
    /// * `graph`: The graph.
    /// * `manager`: Snarl decomposition of the graph.
    /// * `cap`: Upper limit for maximum distance estimation.
    /// * `verbose`: Print progress information to stderr.
    ///
    /// # Errors
    ///
    /// Fails if the graph is empty or the decomposition is inconsistent with
    /// the graph: a node not contained in any snarl, an edge leaving a snarl
    /// without passing a boundary, or a snarl that cannot be traversed from
    /// start to end.
    pub fn new(graph: &'a G, manager: &'a SnarlManager, cap: usize, verbose: bool) -> Result<Self, String> {
        let (min_node_id, max_node_id) = graph.id_range().ok_or(
            String::from("Cannot index an empty graph")
        )?;
        if min_node_id == 0 {
            return Err(String::from("Node identifiers must be nonzero"));
        }
        if verbose {
            eprintln!("Building distance index for {} nodes", graph.node_count());
        }

        let mut builder = IndexBuilder {
            graph, manager,
            snarl_indexes: vec![None; manager.num_snarls()],
            chain_indexes: vec![None; manager.num_chains()],
            assignments: HashMap::new(),
        };
        for chain_id in manager.top_level_chains() {
            builder.index_chain(*chain_id)?;
        }

        // Every node must be contained in some snarl.
        let mut node_to_snarl: Vec<u64> = vec![0; max_node_id - min_node_id + 1];
        for node_id in graph.node_ids() {
            let snarl_start = builder.assignments.get(&node_id).ok_or(
                format!("Node {} is not contained in any snarl", node_id)
            )?;
            node_to_snarl[node_id - min_node_id] = zigzag(snarl_start.encode());
        }

        let snarl_indexes: Vec<SnarlIndex> = builder.snarl_indexes.into_iter().map(|x| x.unwrap()).collect();
        let chain_indexes: Vec<ChainIndex> = builder.chain_indexes.into_iter().map(|x| x.unwrap()).collect();
        if verbose {
            eprintln!("Indexed {} snarls in {} chains", snarl_indexes.len(), chain_indexes.len());
        }

        let max_index = MaxDistanceIndex::new(graph, cap, verbose)?;

        Ok(DistanceIndex {
            graph, manager,
            snarl_indexes, chain_indexes,
            node_to_snarl: PackedVector::from_values(&node_to_snarl),
            min_node_id, max_node_id,
            cap,
            max_index,
        })
    }
}

#[inline]
fn zigzag(value: i64) -> u64 {
    if value < 0 {
        (-2 * value - 1) as u64
    } else {
        2 * value as u64
    }
}

#[inline]
fn unzigzag(value: u64) -> i64 {
    if value % 2 == 0 {
        (value / 2) as i64
    } else {
        -((value as i64 + 1) / 2)
    }
}

//-----------------------------------------------------------------------------

struct IndexBuilder<'a, G: GraphInterface> {
    graph: &'a G,
    manager: &'a SnarlManager,
    snarl_indexes: Vec<Option<SnarlIndex>>,
    chain_indexes: Vec<Option<ChainIndex>>,
    // Maps a node to the start visit of its innermost snarl.
    assignments: HashMap<usize, Visit>,
}

impl<'a, G: GraphInterface> IndexBuilder<'a, G> {
    // Indexes the snarls of the chain bottom-up and then the chain itself.
    fn index_chain(&mut self, chain_id: usize) -> Result<(), String> {
        for snarl_id in self.manager.chain_snarls(chain_id).to_vec() {
            self.index_snarl(snarl_id)?;
        }

        let boundaries = self.manager.chain_boundaries(chain_id).to_vec();
        let snarl_ids = self.manager.chain_snarls(chain_id).to_vec();
        let count = snarl_ids.len();

        let mut node_lens: Vec<i64> = Vec::with_capacity(count + 1);
        for visit in boundaries.iter() {
            let len = self.graph.node_len(visit.id).ok_or(
                format!("Chain boundary node {} is not in the graph", visit.id)
            )?;
            node_lens.push(len as i64);
        }

        // Distances through each snarl, from the near side of its entry node
        // to the near side of its exit node.
        let mut through: Vec<i64> = Vec::with_capacity(count);
        for (ordinal, snarl_id) in snarl_ids.iter().enumerate() {
            let table = self.snarl_indexes[*snarl_id].as_ref().unwrap();
            let distance = table.snarl_distance(boundaries[ordinal], boundaries[ordinal + 1]);
            if distance < 0 {
                return Err(format!(
                    "Snarl ({}, {}) cannot be traversed from start to end",
                    boundaries[ordinal], boundaries[ordinal + 1]
                ));
            }
            through.push(distance);
        }

        let mut prefix_sum: Vec<u64> = Vec::with_capacity(2 * (count + 1));
        let mut near: i64 = 0;
        for ordinal in 0..count + 1 {
            prefix_sum.push(near as u64);
            prefix_sum.push((near + node_lens[ordinal]) as u64);
            if ordinal < count {
                near += through[ordinal];
            }
        }

        // Forward loops, propagated from the end of the chain.
        let mut loop_fd: Vec<i64> = vec![-1; count + 1];
        for ordinal in (0..count).rev() {
            let table = self.snarl_indexes[snarl_ids[ordinal]].as_ref().unwrap();
            let entry = boundaries[ordinal];
            let exit = boundaries[ordinal + 1];
            let mut best = table.snarl_distance_short(entry, entry.flip(), node_lens[ordinal]);
            if loop_fd[ordinal + 1] >= 0 {
                let onward = table.snarl_distance(entry, exit);
                let backward = table.snarl_distance(exit.flip(), entry.flip());
                if onward >= 0 && backward >= 0 {
                    let via_next = (onward - node_lens[ordinal])
                        + node_lens[ordinal + 1] + loop_fd[ordinal + 1]
                        + (backward - node_lens[ordinal + 1]) + node_lens[ordinal + 1];
                    best = min_defined(best, via_next);
                }
            }
            loop_fd[ordinal] = best;
        }

        // Reverse loops, propagated from the start of the chain.
        let mut loop_rev: Vec<i64> = vec![-1; count + 1];
        for ordinal in 1..count + 1 {
            let table = self.snarl_indexes[snarl_ids[ordinal - 1]].as_ref().unwrap();
            let entry = boundaries[ordinal - 1];
            let exit = boundaries[ordinal];
            let mut best = table.snarl_distance_short(exit.flip(), exit, node_lens[ordinal]);
            if loop_rev[ordinal - 1] >= 0 {
                let backward = table.snarl_distance(exit.flip(), entry.flip());
                let onward = table.snarl_distance(entry, exit);
                if backward >= 0 && onward >= 0 {
                    let via_prev = (backward - node_lens[ordinal])
                        + node_lens[ordinal - 1] + loop_rev[ordinal - 1]
                        + (onward - node_lens[ordinal - 1]) + node_lens[ordinal - 1];
                    best = min_defined(best, via_prev);
                }
            }
            loop_rev[ordinal] = best;
        }

        let mut node_to_index = HashMap::with_capacity(count + 1);
        for (index, visit) in boundaries.iter().enumerate() {
            node_to_index.insert(visit.id, index);
        }

        self.chain_indexes[chain_id] = Some(ChainIndex {
            node_to_index,
            boundaries,
            prefix_sum: PackedVector::from_values(&prefix_sum),
            loop_fd: PackedVector::from_values(&loop_fd.iter().map(|x| utils::encode_distance(*x)).collect::<Vec<u64>>()),
            loop_rev: PackedVector::from_values(&loop_rev.iter().map(|x| utils::encode_distance(*x)).collect::<Vec<u64>>()),
        });
        Ok(())
    }

    // Indexes the child chains of the snarl, then computes its all-pairs
    // distance table and assigns its shallow contents.
    fn index_snarl(&mut self, snarl_id: usize) -> Result<(), String> {
        for chain_id in self.manager.children_of(snarl_id).to_vec() {
            self.index_chain(chain_id)?;
        }

        let snarl = self.manager.snarl(snarl_id);
        let net = self.manager.net_graph(snarl_id);
        let free_nodes = self.discover_free_nodes(&net)?;

        // Indexed visits in a deterministic order: boundaries, child chain
        // entries, free nodes.
        let mut visits: Vec<Visit> = vec![
            snarl.start, snarl.start.flip(), snarl.end.flip(), snarl.end,
        ];
        let mut chain_entries: BTreeSet<i64> = BTreeSet::new();
        for chain_id in self.manager.children_of(snarl_id) {
            chain_entries.insert(self.manager.chain_start(*chain_id).encode());
            chain_entries.insert(self.manager.chain_end(*chain_id).flip().encode());
        }
        for entry in chain_entries.iter() {
            visits.push(Visit::decode(*entry));
        }
        for node_id in free_nodes.iter() {
            visits.push(Visit::forward(*node_id));
            visits.push(Visit::reverse(*node_id));
        }

        let count = visits.len();
        let mut visit_to_index: HashMap<i64, usize> = HashMap::with_capacity(count);
        for (slot, visit) in visits.iter().enumerate() {
            if visit_to_index.insert(visit.encode(), slot).is_some() {
                return Err(format!("Visit {} appears twice in snarl {}", visit, snarl));
            }
        }

        // All-pairs distances by Dijkstra over the net graph from every
        // indexed visit. The diagonal records the shortest nonempty cycle.
        let mut table: Vec<i64> = vec![-1; count * count];
        for source in 0..count {
            let mut dist: Vec<i64> = vec![-1; count];
            let mut cycle: i64 = -1;
            dist[source] = 0;
            let mut heap: BinaryHeap<Reverse<(i64, i64)>> = BinaryHeap::new();
            heap.push(Reverse((0, visits[source].encode())));
            while let Some(Reverse((d, encoded))) = heap.pop() {
                let visit = Visit::decode(encoded);
                let slot = visit_to_index[&encoded];
                if d > dist[slot] {
                    continue;
                }
                for (target, weight) in self.net_successors(&net, visit)? {
                    let target_slot = *visit_to_index.get(&target.encode()).ok_or(
                        format!(
                            "Edge from {} to {} leaves snarl {} without passing a boundary",
                            visit, target, snarl
                        )
                    )?;
                    let candidate = d + weight;
                    if target_slot == source {
                        cycle = min_defined(cycle, candidate);
                        continue;
                    }
                    if dist[target_slot] < 0 || candidate < dist[target_slot] {
                        dist[target_slot] = candidate;
                        heap.push(Reverse((candidate, target.encode())));
                    }
                }
            }
            dist[source] = cycle;
            for (slot, value) in dist.iter().enumerate() {
                insert_distance(&mut table, count, source, slot, *value);
            }
        }

        // Assign the shallow contents to this snarl unless a child snarl
        // already claimed them.
        for node_id in [snarl.start.id, snarl.end.id].into_iter().chain(free_nodes.into_iter()) {
            self.assignments.entry(node_id).or_insert(snarl.start);
        }

        let encoded: Vec<u64> = table.iter().map(|x| utils::encode_distance(*x)).collect();
        self.snarl_indexes[snarl_id] = Some(SnarlIndex {
            visit_to_index,
            visits: visits.iter().map(|x| x.encode()).collect(),
            distances: PackedVector::from_values(&encoded),
            start: snarl.start,
            end: snarl.end,
        });
        Ok(())
    }

    // Finds the nodes of the snarl that do not belong to any child chain,
    // excluding the boundary nodes.
    fn discover_free_nodes(&self, net: &NetGraph) -> Result<BTreeSet<usize>, String> {
        let snarl = net.snarl();
        let mut free: BTreeSet<usize> = BTreeSet::new();
        let mut visited: HashSet<i64> = HashSet::new();
        let mut stack: Vec<Visit> = vec![snarl.start, snarl.end.flip()];
        while let Some(visit) = stack.pop() {
            if !visited.insert(visit.encode()) {
                continue;
            }
            if visit.id != snarl.start.id && visit.id != snarl.end.id && !net.is_chain_head(visit.id) {
                free.insert(visit.id);
            }
            for (target, _) in self.net_successors(net, visit)? {
                stack.push(target);
            }
        }
        Ok(free)
    }

    // The successors of a net graph visit with traversal weights. A visit
    // entering a child chain continues from the far end of the chain after
    // its full length, or from the near end after a U-turn when the chain
    // supports one. Visits leaving the snarl through a boundary have no
    // successors.
    fn net_successors(&self, net: &NetGraph, visit: Visit) -> Result<Vec<(Visit, i64)>, String> {
        if net.is_outward(visit) {
            return Ok(Vec::new());
        }
        let mut result: Vec<(Visit, i64)> = Vec::new();
        match net.chain_entry(visit) {
            Some((chain_id, from_start)) => {
                let chain = self.chain_indexes[chain_id].as_ref().ok_or(
                    format!("Child chain of visit {} has not been indexed", visit)
                )?;
                let (through_exit, back_exit, uturn) = if from_start {
                    (
                        self.manager.chain_end(chain_id),
                        self.manager.chain_start(chain_id).flip(),
                        chain.uturn_start(),
                    )
                } else {
                    (
                        self.manager.chain_start(chain_id).flip(),
                        self.manager.chain_end(chain_id),
                        chain.uturn_end(),
                    )
                };
                for target in self.graph.follow_edges(through_exit) {
                    result.push((target, chain.chain_length()));
                }
                if uturn >= 0 {
                    for target in self.graph.follow_edges(back_exit) {
                        result.push((target, uturn));
                    }
                }
            },
            None => {
                let len = self.graph.node_len(visit.id).ok_or(
                    format!("Node {} is not in the graph", visit.id)
                )? as i64;
                for target in self.graph.follow_edges(visit) {
                    result.push((target, len));
                }
            },
        }
        Ok(result)
    }
}

// Construction-time setter for the distance table: keeps the minimum of the
// existing value and the new one.
fn insert_distance(table: &mut [i64], width: usize, row: usize, column: usize, value: i64) {
    let slot = row * width + column;
    table[slot] = min_defined(table[slot], value);
}

//-----------------------------------------------------------------------------

/// Queries.
impl<'a, G: GraphInterface> DistanceIndex<'a, G> {
    /// Returns the upper limit used for maximum distance estimation.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Returns the smallest node identifier covered by the index.
    pub fn min_node_id(&self) -> usize {
        self.min_node_id
    }

    /// Returns the largest node identifier covered by the index.
    pub fn max_node_id(&self) -> usize {
        self.max_node_id
    }

    /// Returns the number of indexed snarls.
    pub fn num_snarls(&self) -> usize {
        self.snarl_indexes.len()
    }

    /// Returns the number of indexed chains.
    pub fn num_chains(&self) -> usize {
        self.chain_indexes.len()
    }

    /// Returns the distance table of the given snarl.
    pub fn snarl_index(&self, snarl_id: usize) -> &SnarlIndex {
        &self.snarl_indexes[snarl_id]
    }

    /// Returns the chain index of the given chain.
    pub fn chain_index(&self, chain_id: usize) -> &ChainIndex {
        &self.chain_indexes[chain_id]
    }

    /// Returns the maximum distance index.
    pub fn max_distance_index(&self) -> &MaxDistanceIndex {
        &self.max_index
    }

    /// Returns the innermost snarl containing the node.
    ///
    /// Unknown nodes are precondition violations and are reported as errors.
    pub fn snarl_of(&self, node_id: usize) -> Result<Snarl, String> {
        let snarl_id = self.snarl_id_of(node_id)?;
        Ok(self.manager.snarl(snarl_id))
    }

    fn snarl_id_of(&self, node_id: usize) -> Result<usize, String> {
        if node_id < self.min_node_id || node_id > self.max_node_id {
            return Err(format!("Node {} is not in the graph", node_id));
        }
        let value = self.node_to_snarl.get(node_id - self.min_node_id);
        if value == 0 {
            return Err(format!("Node {} is not contained in any snarl", node_id));
        }
        let start = Visit::decode(unzigzag(value));
        self.manager.snarl_with_start(start).ok_or(
            format!("The snarl manager does not know the snarl starting with {}", start)
        )
    }

    /// Returns the length of the child unit of the snarl headed by the
    /// visit: the length of the collapsed chain for a chain entry, and the
    /// node length otherwise.
    pub fn unit_length(&self, snarl_id: usize, visit: Visit) -> Result<i64, String> {
        let net = self.manager.net_graph(snarl_id);
        match net.chain_entry(visit) {
            Some((chain_id, _)) => Ok(self.chain_indexes[chain_id].chain_length()),
            None => {
                let len = self.graph.node_len(visit.id).ok_or(
                    format!("Node {} is not in the graph", visit.id)
                )?;
                Ok(len as i64)
            },
        }
    }

    /// Returns the length of the snarl: the shortest distance from the start
    /// of its start visit to the far side of its end visit.
    pub fn snarl_length(&self, snarl_id: usize) -> i64 {
        let table = &self.snarl_indexes[snarl_id];
        let through = table.snarl_distance(table.snarl_start(), table.snarl_end());
        if through < 0 {
            return -1;
        }
        match self.graph.node_len(table.snarl_end().id) {
            Some(len) => through + len as i64,
            None => -1,
        }
    }

    /// Returns the minimum walk distance between two positions, or -1 if the
    /// positions are not connected.
    ///
    /// Unknown nodes and out-of-range offsets are precondition violations
    /// and are reported as errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use snarl_dist::{DistanceIndex, HashGraph, Position, SnarlManager, Visit};
    /// use gbwt::Orientation;
    ///
    /// // A linear graph: 1 (5 bp) -> 2 (3 bp) -> 3 (4 bp).
    /// let mut graph = HashGraph::new();
    /// for (id, len) in [(1, 5), (2, 3), (3, 4)] {
    ///     graph.add_node(id, len).unwrap();
    /// }
    /// graph.add_edge(Visit::forward(1), Visit::forward(2)).unwrap();
    /// graph.add_edge(Visit::forward(2), Visit::forward(3)).unwrap();
    /// let mut manager = SnarlManager::new();
    /// manager.add_chain(None, &[Visit::forward(1), Visit::forward(2), Visit::forward(3)]).unwrap();
    ///
    /// let index = DistanceIndex::new(&graph, &manager, 1000, false).unwrap();
    /// let from = Position::new(1, 0, Orientation::Forward);
    /// let to = Position::new(3, 0, Orientation::Forward);
    /// assert_eq!(index.min_distance(from, to), Ok(8));
    /// ```
    pub fn min_distance(&self, pos1: Position, pos2: Position) -> Result<i64, String> {
        let snarl1 = self.snarl_id_of(pos1.id)?;
        let snarl2 = self.snarl_id_of(pos2.id)?;
        self.min_distance_between(snarl1, snarl2, pos1, pos2)
    }

    /// Returns the minimum walk distance between two positions whose
    /// innermost snarls are already known.
    ///
    /// `pos1` must be on a node contained in `snarl1` and not in any of its
    /// children, and similarly for `pos2` and `snarl2`.
    pub fn min_distance_in_snarls(
        &self,
        snarl1: &Snarl, snarl2: &Snarl,
        pos1: Position, pos2: Position
    ) -> Result<i64, String> {
        let snarl1 = self.manager.find_snarl(snarl1).ok_or(
            format!("Unknown snarl {}", snarl1)
        )?;
        let snarl2 = self.manager.find_snarl(snarl2).ok_or(
            format!("Unknown snarl {}", snarl2)
        )?;
        self.min_distance_between(snarl1, snarl2, pos1, pos2)
    }

    /// Returns an upper bound on the length of any walk between the two
    /// positions, saturated at the cap. See [`MaxDistanceIndex`].
    pub fn max_distance(&self, pos1: Position, pos2: Position) -> Result<i64, String> {
        self.max_index.max_distance(self.graph, pos1, pos2)
    }

    // The actual minimum distance computation. Walks the decomposition tree
    // upward from both positions and combines the endpoint distances at
    // every common ancestor: walks may leave an ancestor and return through
    // the surrounding structure, so the minimum is taken over all levels.
    fn min_distance_between(
        &self,
        snarl1: usize, snarl2: usize,
        pos1: Position, pos2: Position
    ) -> Result<i64, String> {
        let ancestors1 = self.ancestors(snarl1, pos1)?;
        let ancestors2 = self.ancestors(snarl2, pos2)?;

        let mut best: i64 = -1;
        for entry1 in ancestors1.iter() {
            for entry2 in ancestors2.iter() {
                if entry1.level != entry2.level {
                    continue;
                }
                let candidate = match entry1.level {
                    Level::InSnarl(snarl_id) => self.combine_in_snarl(snarl_id, entry1, entry2),
                    Level::InChain(chain_id) => self.combine_in_chain(chain_id, entry1, entry2),
                };
                best = min_defined(best, candidate);
            }
        }

        // The totals count the bases of both endpoints; the target base is
        // excluded from the reported distance.
        if best < 0 {
            Ok(-1)
        } else {
            Ok(best - 1)
        }
    }

    // The distances from a position to the entry visits of every ancestor
    // unit, innermost first. Distances include the bases of the position's
    // node up to and including the position itself.
    fn ancestors(&self, snarl_id: usize, pos: Position) -> Result<Vec<AncestorEntry>, String> {
        let len = self.graph.node_len(pos.id).ok_or(
            format!("Node {} is not in the graph", pos.id)
        )?;
        if pos.offset >= len {
            return Err(format!("Offset {} is out of range for node {} of length {}", pos.offset, pos.id, len));
        }
        let forward_offset = pos.forward_offset(len);

        let mut entry_l = Visit::forward(pos.id);
        let mut entry_r = Visit::reverse(pos.id);
        let mut unit_len = len as i64;
        let mut dist_l = (forward_offset + 1) as i64;
        let mut dist_r = (len - forward_offset) as i64;
        let mut snarl_id = snarl_id;

        let mut result: Vec<AncestorEntry> = Vec::new();
        loop {
            result.push(AncestorEntry {
                level: Level::InSnarl(snarl_id),
                entry_l, entry_r, unit_len, dist_l, dist_r,
            });

            let table = &self.snarl_indexes[snarl_id];
            let (to_start, to_end) = table.dist_to_ends(entry_l, entry_r, dist_l, dist_r);
            let snarl = self.manager.snarl(snarl_id);
            let chain_id = self.manager.chain_of(snarl_id);
            let ordinal = self.manager.ordinal_of(snarl_id);
            result.push(AncestorEntry {
                level: Level::InChain(chain_id),
                entry_l: snarl.start,
                entry_r: snarl.end.flip(),
                unit_len: self.snarl_length(snarl_id),
                dist_l: to_start,
                dist_r: to_end,
            });

            match self.manager.parent_of(chain_id) {
                None => break,
                Some(parent) => {
                    let chain = &self.chain_indexes[chain_id];
                    let (to_start, to_end) = chain.dist_to_ends(ordinal, to_start, to_end);
                    entry_l = self.manager.chain_start(chain_id);
                    entry_r = self.manager.chain_end(chain_id).flip();
                    unit_len = chain.chain_length();
                    dist_l = to_start;
                    dist_r = to_end;
                    snarl_id = parent;
                },
            }
        }
        Ok(result)
    }

    // Combines two endpoint distance pairs at a common ancestor snarl. The
    // endpoints exit their units through either side, cross the snarl, and
    // enter the other unit. The returned total counts the bases of both
    // endpoints, or -1 if no route exists.
    fn combine_in_snarl(&self, snarl_id: usize, entry1: &AncestorEntry, entry2: &AncestorEntry) -> i64 {
        let table = &self.snarl_indexes[snarl_id];
        let mut best: i64 = -1;
        // Leaving through the far side means having traversed the unit from
        // its near entry, and vice versa.
        for (d1, exit) in [(entry1.dist_r, entry1.entry_l), (entry1.dist_l, entry1.entry_r)] {
            if d1 < 0 {
                continue;
            }
            for (d2, target) in [(entry2.dist_l, entry2.entry_l), (entry2.dist_r, entry2.entry_r)] {
                if d2 < 0 {
                    continue;
                }
                let mut gaps: [Option<i64>; 2] = [None, None];
                if exit != target {
                    let crossing = table.snarl_distance(exit, target);
                    if crossing >= 0 {
                        gaps[0] = Some(crossing - entry1.unit_len);
                    }
                } else {
                    // Both endpoint distances count the shared unit. Splicing
                    // the two segments is only valid within a single node;
                    // routes inside a shared chain are handled at a deeper
                    // level. A walk may also leave the unit and cycle back.
                    if entry1.entry_l.id == entry1.entry_r.id {
                        gaps[0] = Some(-entry1.unit_len);
                    }
                    let cycle = table.visit_cycle(exit);
                    if cycle >= 0 {
                        gaps[1] = Some(cycle - entry1.unit_len);
                    }
                }
                for gap in gaps.into_iter().flatten() {
                    let total = d1 + gap + d2;
                    if total >= 1 {
                        best = min_defined(best, total);
                    }
                }
            }
        }
        best
    }

    // Combines two endpoint distance pairs at a common ancestor chain. Both
    // units are snarls of the chain, identified by their boundary visits.
    fn combine_in_chain(&self, chain_id: usize, entry1: &AncestorEntry, entry2: &AncestorEntry) -> i64 {
        let chain = &self.chain_indexes[chain_id];
        let mut best: i64 = -1;
        // Exiting the snarl to the right means having completed the visit of
        // its exit boundary; to the left, the flipped entry boundary.
        for (d1, exit) in [(entry1.dist_r, entry1.entry_r.flip()), (entry1.dist_l, entry1.entry_l.flip())] {
            if d1 < 0 {
                continue;
            }
            for (d2, target) in [(entry2.dist_l, entry2.entry_l), (entry2.dist_r, entry2.entry_r)] {
                if d2 < 0 {
                    continue;
                }
                let reachable = chain.chain_distance(exit, target) >= 0
                    || chain.chain_distance(target.flip(), exit.flip()) >= 0;
                if !reachable {
                    continue;
                }
                let gap = chain.chain_distance_short(exit, target);
                let total = d1 + gap + d2;
                if total >= 1 {
                    best = min_defined(best, total);
                }
            }
        }
        best
    }
}

//-----------------------------------------------------------------------------

/// Serialization.
impl<'a, G: GraphInterface> DistanceIndex<'a, G> {
    /// Writes the index to the output as a byte stream.
    pub fn serialize<W: Write>(&self, output: &mut W) -> io::Result<()> {
        output.write_all(&MAGIC)?;
        output.write_all(&[FORMAT_VERSION])?;

        output.write_all(&[BLOCK_HEADER])?;
        utils::write_varint(self.min_node_id, output)?;
        utils::write_varint(self.max_node_id, output)?;
        utils::write_varint(self.cap, output)?;
        utils::write_varint(self.snarl_indexes.len(), output)?;
        utils::write_varint(self.chain_indexes.len(), output)?;

        output.write_all(&[BLOCK_NODE_TO_SNARL])?;
        self.node_to_snarl.serialize(output)?;

        for table in self.snarl_indexes.iter() {
            output.write_all(&[BLOCK_SNARL])?;
            table.serialize(output)?;
        }
        for chain in self.chain_indexes.iter() {
            output.write_all(&[BLOCK_CHAIN])?;
            chain.serialize(output)?;
        }

        output.write_all(&[BLOCK_MAX_DISTANCE])?;
        self.max_index.serialize_body(output)?;
        Ok(())
    }

    /// Loads an index written with [`DistanceIndex::serialize`].
    ///
    /// The graph and the snarl manager must be the ones the index was built
    /// for; mismatches are reported as format errors.
    pub fn load<R: Read>(graph: &'a G, manager: &'a SnarlManager, input: &mut R) -> Result<Self, String> {
        let mut magic = [0u8; 5];
        input.read_exact(&mut magic).map_err(|x| x.to_string())?;
        if magic[0..4] != MAGIC {
            return Err(String::from("Invalid magic number"));
        }
        if magic[4] != FORMAT_VERSION {
            return Err(format!("Unsupported format version: {}", magic[4]));
        }

        expect_block(input, BLOCK_HEADER)?;
        let min_node_id = utils::read_varint(input)?;
        let max_node_id = utils::read_varint(input)?;
        let cap = utils::read_varint(input)?;
        let num_snarls = utils::read_varint(input)?;
        let num_chains = utils::read_varint(input)?;
        if min_node_id == 0 || max_node_id < min_node_id {
            return Err(format!("Invalid node id range {}..{}", min_node_id, max_node_id));
        }
        if graph.id_range() != Some((min_node_id, max_node_id)) {
            return Err(String::from("The serialized index does not match the graph"));
        }
        if num_snarls != manager.num_snarls() || num_chains != manager.num_chains() {
            return Err(String::from("The serialized index does not match the snarl decomposition"));
        }

        expect_block(input, BLOCK_NODE_TO_SNARL)?;
        let node_to_snarl = PackedVector::load(input)?;
        if node_to_snarl.len() != max_node_id - min_node_id + 1 {
            return Err(format!(
                "Node to snarl map has {} entries for node range {}..{}",
                node_to_snarl.len(), min_node_id, max_node_id
            ));
        }
        for offset in 0..node_to_snarl.len() {
            let value = node_to_snarl.get(offset);
            if value == 0 {
                continue;
            }
            let start = Visit::decode(unzigzag(value));
            if manager.snarl_with_start(start).is_none() {
                return Err(format!(
                    "Node {} is assigned to an unknown snarl starting with {}",
                    min_node_id + offset, start
                ));
            }
        }

        let mut snarl_indexes: Vec<Option<SnarlIndex>> = vec![None; num_snarls];
        for _ in 0..num_snarls {
            expect_block(input, BLOCK_SNARL)?;
            let table = SnarlIndex::load(input)?;
            let snarl = Snarl::new(table.snarl_start(), table.snarl_end());
            let snarl_id = manager.find_snarl(&snarl).ok_or(
                format!("The snarl manager does not know snarl {}", snarl)
            )?;
            if snarl_indexes[snarl_id].is_some() {
                return Err(format!("Duplicate index for snarl {}", snarl));
            }
            snarl_indexes[snarl_id] = Some(table);
        }

        let mut chain_indexes: Vec<Option<ChainIndex>> = vec![None; num_chains];
        for _ in 0..num_chains {
            expect_block(input, BLOCK_CHAIN)?;
            let chain = ChainIndex::load(input)?;
            let first = chain.boundaries()[0];
            let snarl_id = manager.snarl_with_start(first).ok_or(
                format!("The snarl manager does not know a chain starting with {}", first)
            )?;
            let chain_id = manager.chain_of(snarl_id);
            if manager.chain_boundaries(chain_id) != chain.boundaries() {
                return Err(format!(
                    "Chain boundaries starting with {} do not match the snarl decomposition", first
                ));
            }
            if chain_indexes[chain_id].is_some() {
                return Err(format!("Duplicate index for the chain starting with {}", first));
            }
            chain_indexes[chain_id] = Some(chain);
        }

        expect_block(input, BLOCK_MAX_DISTANCE)?;
        let max_index = MaxDistanceIndex::load_body(
            input, cap, min_node_id, max_node_id - min_node_id + 1
        )?;

        Ok(DistanceIndex {
            graph, manager,
            snarl_indexes: snarl_indexes.into_iter().map(|x| x.unwrap()).collect(),
            chain_indexes: chain_indexes.into_iter().map(|x| x.unwrap()).collect(),
            node_to_snarl,
            min_node_id, max_node_id,
            cap,
            max_index,
        })
    }

    /// Returns the size of the serialized index in bytes.
    pub fn size_in_bytes(&self) -> usize {
        let mut sink = utils::CountingWriter::new();
        // Writing to the counting sink cannot fail.
        self.serialize(&mut sink).unwrap();
        sink.written()
    }
}

fn expect_block<R: Read>(input: &mut R, expected: u8) -> Result<(), String> {
    let mut tag = [0u8];
    input.read_exact(&mut tag).map_err(|x| x.to_string())?;
    if tag[0] != expected {
        return Err(format!("Unexpected block type {} (expected {})", tag[0], expected));
    }
    Ok(())
}

//-----------------------------------------------------------------------------
