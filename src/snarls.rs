//! Snarl decomposition structures.
//!
//! A snarl is a subgraph bounded by two directed visits such that all walks
//! between the boundaries stay inside. Snarls are joined into chains at
//! shared boundary nodes, and chains nest inside parent snarls, forming a
//! forest. [`SnarlManager`] stores a decomposition computed elsewhere and
//! answers structural queries about it. It does not inspect the graph: the
//! decomposition is taken at face value, and the distance index validates it
//! during construction.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use crate::graph::Visit;


//-----------------------------------------------------------------------------

/// A snarl: a subgraph bounded by two directed visits.
///
/// The start visit points into the snarl and the end visit points out of it.
/// Traversing the snarl from start to end therefore reads the start node,
/// the interior, and the end node, in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snarl {
    /// Boundary visit pointing into the snarl.
    pub start: Visit,
    /// Boundary visit pointing out of the snarl.
    pub end: Visit,
}

impl Snarl {
    /// Creates a new snarl with the given boundaries.
    pub fn new(start: Visit, end: Visit) -> Self {
        Snarl { start, end }
    }
}

impl Display for Snarl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

//-----------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct SnarlRecord {
    snarl: Snarl,
    chain: usize,
    ordinal: usize,
    children: Vec<usize>,
}

#[derive(Clone, Debug)]
struct ChainRecord {
    snarls: Vec<usize>,
    boundaries: Vec<Visit>,
    parent: Option<usize>,
}

/// A forest of snarls and chains.
///
/// The manager is populated top-down with [`SnarlManager::add_chain`]:
/// top-level chains first, then the chains nested in their snarls. Snarls
/// and chains are identified by dense integer handles assigned in insertion
/// order.
///
/// # Examples
///
/// ```
/// use snarl_dist::{SnarlManager, Snarl, Visit};
///
/// // A top-level chain of two snarls, 1..4 and 4..5, with a nested chain
/// // between nodes 2 and 3 inside the first snarl.
/// let mut manager = SnarlManager::new();
/// let boundaries = [Visit::forward(1), Visit::forward(4), Visit::forward(5)];
/// manager.add_chain(None, &boundaries).unwrap();
/// let parent = Snarl::new(Visit::forward(1), Visit::forward(4));
/// let inner = [Visit::forward(2), Visit::forward(3)];
/// manager.add_chain(Some(parent), &inner).unwrap();
///
/// assert_eq!(manager.num_snarls(), 3);
/// assert_eq!(manager.num_chains(), 2);
/// let first = manager.snarl_with_start(Visit::forward(1)).unwrap();
/// assert_eq!(manager.snarl(first).end, Visit::forward(4));
/// assert_eq!(manager.children_of(first).len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SnarlManager {
    snarls: Vec<SnarlRecord>,
    chains: Vec<ChainRecord>,
    top_level: Vec<usize>,
    by_start: HashMap<i64, usize>,
}

impl SnarlManager {
    /// Creates an empty snarl manager.
    pub fn new() -> Self {
        SnarlManager::default()
    }

    /// Adds a chain of snarls defined by its boundary visits.
    ///
    /// Boundary visit `i` is the start of snarl `i` and the end of snarl
    /// `i - 1`, so a chain of `m` snarls has `m + 1` boundaries. A top-level
    /// chain has no parent; a nested chain names the snarl that contains it,
    /// which must have been added earlier.
    ///
    /// Returns the handle of the new chain. Fails if the boundaries are
    /// invalid: fewer than two visits, a repeated node, a unary snarl, a
    /// start visit already claimed by another snarl, or an unknown parent.
    pub fn add_chain(&mut self, parent: Option<Snarl>, boundaries: &[Visit]) -> Result<usize, String> {
        if boundaries.len() < 2 {
            return Err(format!("A chain must have at least 2 boundary visits, got {}", boundaries.len()));
        }
        for window in boundaries.windows(2) {
            if window[0].id == window[1].id {
                return Err(format!("Unary snarl at node {} is not supported", window[0].id));
            }
            if self.by_start.contains_key(&window[0].encode()) {
                return Err(format!("Visit {} already starts a snarl", window[0]));
            }
        }
        let mut seen: HashSet<usize> = HashSet::new();
        for visit in boundaries {
            if visit.id == 0 {
                return Err(String::from("Node identifiers must be nonzero"));
            }
            if !seen.insert(visit.id) {
                return Err(format!("Node {} appears twice as a chain boundary", visit.id));
            }
        }

        let parent_id = match parent {
            Some(snarl) => {
                let id = self.find_snarl(&snarl).ok_or(
                    format!("Parent snarl {} does not exist", snarl)
                )?;
                Some(id)
            },
            None => None,
        };

        let chain_id = self.chains.len();
        let mut snarl_ids = Vec::with_capacity(boundaries.len() - 1);
        for (ordinal, window) in boundaries.windows(2).enumerate() {
            let snarl_id = self.snarls.len();
            let snarl = Snarl::new(window[0], window[1]);
            self.snarls.push(SnarlRecord { snarl, chain: chain_id, ordinal, children: Vec::new() });
            self.by_start.insert(window[0].encode(), snarl_id);
            snarl_ids.push(snarl_id);
        }
        self.chains.push(ChainRecord {
            snarls: snarl_ids,
            boundaries: boundaries.to_vec(),
            parent: parent_id,
        });

        match parent_id {
            Some(id) => self.snarls[id].children.push(chain_id),
            None => self.top_level.push(chain_id),
        }
        Ok(chain_id)
    }

    /// Returns the number of snarls in the forest.
    pub fn num_snarls(&self) -> usize {
        self.snarls.len()
    }

    /// Returns the number of chains in the forest.
    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    /// Returns the handles of the top-level chains in insertion order.
    pub fn top_level_chains(&self) -> &[usize] {
        &self.top_level
    }

    /// Returns the boundaries of the given snarl.
    pub fn snarl(&self, snarl_id: usize) -> Snarl {
        self.snarls[snarl_id].snarl
    }

    /// Returns the handles of the snarls in the chain, in chain order.
    pub fn chain_snarls(&self, chain_id: usize) -> &[usize] {
        &self.chains[chain_id].snarls
    }

    /// Returns the boundary visits of the chain, in chain order.
    pub fn chain_boundaries(&self, chain_id: usize) -> &[Visit] {
        &self.chains[chain_id].boundaries
    }

    /// Returns the handles of the chains nested in the snarl.
    pub fn children_of(&self, snarl_id: usize) -> &[usize] {
        &self.snarls[snarl_id].children
    }

    /// Returns the handle of the chain containing the snarl.
    pub fn chain_of(&self, snarl_id: usize) -> usize {
        self.snarls[snarl_id].chain
    }

    /// Returns the position of the snarl in its chain.
    pub fn ordinal_of(&self, snarl_id: usize) -> usize {
        self.snarls[snarl_id].ordinal
    }

    /// Returns the handle of the snarl containing the chain, or [`None`] for
    /// a top-level chain.
    pub fn parent_of(&self, chain_id: usize) -> Option<usize> {
        self.chains[chain_id].parent
    }

    /// Returns the handle of the snarl with the given start visit.
    pub fn snarl_with_start(&self, start: Visit) -> Option<usize> {
        self.by_start.get(&start.encode()).cloned()
    }

    /// Returns the handle of the given snarl, matching both boundaries.
    pub fn find_snarl(&self, snarl: &Snarl) -> Option<usize> {
        let id = self.snarl_with_start(snarl.start)?;
        if self.snarls[id].snarl.end == snarl.end {
            Some(id)
        } else {
            None
        }
    }

    /// Returns the visit entering the chain from its start.
    pub fn chain_start(&self, chain_id: usize) -> Visit {
        *self.chains[chain_id].boundaries.first().unwrap()
    }

    /// Returns the visit leaving the chain through its end.
    pub fn chain_end(&self, chain_id: usize) -> Visit {
        *self.chains[chain_id].boundaries.last().unwrap()
    }

    /// Returns the net graph view of the snarl.
    pub fn net_graph(&self, snarl_id: usize) -> NetGraph {
        let record = &self.snarls[snarl_id];
        let mut entries: HashMap<i64, (usize, bool)> = HashMap::new();
        let mut heads: HashMap<usize, usize> = HashMap::new();
        for chain_id in record.children.iter() {
            let start = self.chain_start(*chain_id);
            let end = self.chain_end(*chain_id);
            entries.insert(start.encode(), (*chain_id, true));
            entries.insert(end.flip().encode(), (*chain_id, false));
            heads.insert(start.id, *chain_id);
            heads.insert(end.id, *chain_id);
        }
        NetGraph { snarl: record.snarl, entries, heads }
    }
}

//-----------------------------------------------------------------------------

/// The view of a snarl's interior with each child chain collapsed into a
/// single unit.
///
/// The units of the net graph are the snarl's boundary nodes, its child
/// chains, and the free nodes that do not belong to any child chain. A child
/// chain has two entry visits: its own start visit and the flip of its end
/// visit. Which graph nodes are free is not stored here; the distance index
/// discovers them by traversal.
#[derive(Clone, Debug)]
pub struct NetGraph {
    snarl: Snarl,
    // Maps a packed chain entry visit to the chain and the side: `true` if
    // the chain is entered from its start.
    entries: HashMap<i64, (usize, bool)>,
    // Maps a chain head node to its chain.
    heads: HashMap<usize, usize>,
}

impl NetGraph {
    /// Returns the boundaries of the underlying snarl.
    pub fn snarl(&self) -> Snarl {
        self.snarl
    }

    /// Returns the chain and entry side if the visit enters a child chain.
    ///
    /// The returned flag is `true` when the chain is entered from its start.
    pub fn chain_entry(&self, visit: Visit) -> Option<(usize, bool)> {
        let (chain, from_start) = self.entries.get(&visit.encode())?;
        Some((*chain, *from_start))
    }

    /// Returns `true` if the node heads a child chain of this snarl.
    pub fn is_chain_head(&self, node_id: usize) -> bool {
        self.heads.contains_key(&node_id)
    }

    /// Returns `true` if the visit leaves the snarl through a boundary.
    pub fn is_outward(&self, visit: Visit) -> bool {
        visit == self.snarl.start.flip() || visit == self.snarl.end
    }
}

//-----------------------------------------------------------------------------
