//! A minimal graph abstraction for distance indexing.
//!
//! The distance index only needs node lengths, edge enumeration from a
//! directed visit, and the range of node identifiers. [`GraphInterface`]
//! captures that contract. [`HashGraph`] is a mutable in-memory
//! implementation used by the command line tools and the tests, and the
//! trait is also implemented for [`GBZ`] so that a real pangenome graph can
//! back the index.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use gbwt::{Orientation, GBZ};

//-----------------------------------------------------------------------------

/// A directed visit to a node: the node identifier and the orientation of
/// the traversal.
///
/// A forward visit enters the node from its left side and a reverse visit
/// from its right side. Visits can be packed into a single signed integer,
/// with positive values for forward visits and negative values for reverse
/// visits. Node identifier 0 is therefore not supported.
///
/// # Examples
///
/// ```
/// use snarl_dist::Visit;
///
/// let visit = Visit::forward(12);
/// assert_eq!(visit.flip(), Visit::reverse(12));
/// assert_eq!(visit.encode(), 12);
/// assert_eq!(visit.flip().encode(), -12);
/// assert_eq!(Visit::decode(-12), Visit::reverse(12));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visit {
    /// Identifier of the node.
    pub id: usize,
    /// Orientation of the traversal.
    pub orientation: Orientation,
}

impl Visit {
    /// Creates a new visit.
    pub fn new(id: usize, orientation: Orientation) -> Self {
        Visit { id, orientation }
    }

    /// Creates a forward visit to the given node.
    pub fn forward(id: usize) -> Self {
        Visit { id, orientation: Orientation::Forward }
    }

    /// Creates a reverse visit to the given node.
    pub fn reverse(id: usize) -> Self {
        Visit { id, orientation: Orientation::Reverse }
    }

    /// Returns `true` if this is a reverse visit.
    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.orientation == Orientation::Reverse
    }

    /// Returns the same node visited in the other orientation.
    #[inline]
    pub fn flip(&self) -> Visit {
        let orientation = match self.orientation {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        };
        Visit { id: self.id, orientation }
    }

    /// Packs the visit into a signed integer.
    #[inline]
    pub fn encode(&self) -> i64 {
        match self.orientation {
            Orientation::Forward => self.id as i64,
            Orientation::Reverse => -(self.id as i64),
        }
    }

    /// Unpacks a visit packed with [`Visit::encode`].
    ///
    /// # Panics
    ///
    /// Panics if `value` is 0.
    #[inline]
    pub fn decode(value: i64) -> Visit {
        assert!(value != 0, "0 is not a valid packed visit");
        if value < 0 {
            Visit::reverse((-value) as usize)
        } else {
            Visit::forward(value as usize)
        }
    }
}

impl Display for Visit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.orientation {
            Orientation::Forward => write!(f, ">{}", self.id),
            Orientation::Reverse => write!(f, "<{}", self.id),
        }
    }
}

//-----------------------------------------------------------------------------

/// A position on a node: node identifier, offset, and orientation.
///
/// The offset is 0-based and relative to the start of the traversal in the
/// given orientation. Hence offset 0 of a reverse position is the last base
/// of the node on the forward strand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    /// Identifier of the node.
    pub id: usize,
    /// Offset in the given orientation.
    pub offset: usize,
    /// Orientation of the position.
    pub orientation: Orientation,
}

impl Position {
    /// Creates a new position.
    pub fn new(id: usize, offset: usize, orientation: Orientation) -> Self {
        Position { id, offset, orientation }
    }

    /// Returns the offset of the position on the forward strand.
    ///
    /// `node_len` must be the length of the node.
    #[inline]
    pub fn forward_offset(&self, node_len: usize) -> usize {
        match self.orientation {
            Orientation::Forward => self.offset,
            Orientation::Reverse => node_len - 1 - self.offset,
        }
    }

    /// Returns `true` if the position is on the reverse strand.
    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.orientation == Orientation::Reverse
    }

    /// Returns the same base on the other strand.
    ///
    /// `node_len` must be the length of the node.
    pub fn flip(&self, node_len: usize) -> Position {
        Position {
            id: self.id,
            offset: node_len - 1 - self.offset,
            orientation: match self.orientation {
                Orientation::Forward => Orientation::Reverse,
                Orientation::Reverse => Orientation::Forward,
            },
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.is_reverse() { '-' } else { '+' };
        write!(f, "{}:{}:{}", self.id, self.offset, sign)
    }
}

//-----------------------------------------------------------------------------

/// The graph functionality needed by the distance index.
///
/// The graph is bidirected: every node has two sides, and an edge connects
/// the far side of one visit to the near side of another. Implementations
/// must report edges consistently: if `to` follows `from`, then `from.flip()`
/// must follow `to.flip()`.
pub trait GraphInterface {
    /// Returns the length of the node, or [`None`] if the node does not exist.
    fn node_len(&self, node_id: usize) -> Option<usize>;

    /// Returns the visits that may follow the given visit, in a stable order.
    fn follow_edges(&self, from: Visit) -> Vec<Visit>;

    /// Returns the smallest and largest node identifiers, or [`None`] if the
    /// graph is empty.
    fn id_range(&self) -> Option<(usize, usize)>;

    /// Returns all node identifiers in ascending order.
    fn node_ids(&self) -> Vec<usize>;

    /// Returns `true` if the node exists.
    fn has_node(&self, node_id: usize) -> bool {
        self.node_len(node_id).is_some()
    }

    /// Returns the number of nodes in the graph.
    fn node_count(&self) -> usize {
        self.node_ids().len()
    }
}

//-----------------------------------------------------------------------------

/// A mutable in-memory bidirected graph.
///
/// Only node lengths are stored, as the distance index never needs the
/// sequences themselves. Edges are symmetric: adding an edge from `a` to `b`
/// also adds the edge from `b.flip()` to `a.flip()`.
///
/// # Examples
///
/// ```
/// use snarl_dist::{GraphInterface, HashGraph, Visit};
///
/// let mut graph = HashGraph::new();
/// graph.add_node(1, 5).unwrap();
/// graph.add_node(2, 3).unwrap();
/// graph.add_edge(Visit::forward(1), Visit::forward(2)).unwrap();
///
/// assert_eq!(graph.node_len(1), Some(5));
/// assert_eq!(graph.follow_edges(Visit::forward(1)), vec![Visit::forward(2)]);
/// assert_eq!(graph.follow_edges(Visit::reverse(2)), vec![Visit::reverse(1)]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HashGraph {
    nodes: BTreeMap<usize, usize>,
    edges: HashMap<i64, Vec<i64>>,
}

impl HashGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        HashGraph::default()
    }

    /// Adds a node with the given identifier and length.
    ///
    /// Returns an error if the identifier is 0, the length is 0, or the node
    /// already exists.
    pub fn add_node(&mut self, node_id: usize, len: usize) -> Result<(), String> {
        if node_id == 0 {
            return Err(String::from("Node identifiers must be nonzero"));
        }
        if len == 0 {
            return Err(format!("Node {} must have a nonzero length", node_id));
        }
        if self.nodes.contains_key(&node_id) {
            return Err(format!("Node {} already exists", node_id));
        }
        self.nodes.insert(node_id, len);
        Ok(())
    }

    /// Adds an edge from the far side of `from` to the near side of `to`,
    /// along with the symmetric reverse edge.
    ///
    /// Returns an error if either node does not exist. Duplicate edges are
    /// ignored.
    pub fn add_edge(&mut self, from: Visit, to: Visit) -> Result<(), String> {
        if !self.nodes.contains_key(&from.id) {
            return Err(format!("Edge endpoint {} does not exist", from));
        }
        if !self.nodes.contains_key(&to.id) {
            return Err(format!("Edge endpoint {} does not exist", to));
        }
        self.insert_edge(from.encode(), to.encode());
        self.insert_edge(to.flip().encode(), from.flip().encode());
        Ok(())
    }

    fn insert_edge(&mut self, from: i64, to: i64) {
        let successors = self.edges.entry(from).or_default();
        if let Err(offset) = successors.binary_search(&to) {
            successors.insert(offset, to);
        }
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        let directed: usize = self.edges.values().map(|x| x.len()).sum();
        directed / 2
    }
}

impl GraphInterface for HashGraph {
    fn node_len(&self, node_id: usize) -> Option<usize> {
        self.nodes.get(&node_id).cloned()
    }

    fn follow_edges(&self, from: Visit) -> Vec<Visit> {
        match self.edges.get(&from.encode()) {
            Some(successors) => successors.iter().map(|x| Visit::decode(*x)).collect(),
            None => Vec::new(),
        }
    }

    fn id_range(&self) -> Option<(usize, usize)> {
        let min = self.nodes.keys().next()?;
        let max = self.nodes.keys().next_back()?;
        Some((*min, *max))
    }

    fn node_ids(&self) -> Vec<usize> {
        self.nodes.keys().cloned().collect()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

//-----------------------------------------------------------------------------

impl GraphInterface for GBZ {
    fn node_len(&self, node_id: usize) -> Option<usize> {
        self.sequence(node_id).map(|x| x.len())
    }

    fn follow_edges(&self, from: Visit) -> Vec<Visit> {
        match self.successors(from.id, from.orientation) {
            Some(iter) => iter.map(|(id, orientation)| Visit::new(id, orientation)).collect(),
            None => Vec::new(),
        }
    }

    fn id_range(&self) -> Option<(usize, usize)> {
        let min = self.node_iter().next()?;
        let max = self.node_iter().last()?;
        Some((min, max))
    }

    fn node_ids(&self) -> Vec<usize> {
        self.node_iter().collect()
    }

    fn node_count(&self) -> usize {
        self.nodes()
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
