//! The maximum distance index.
//!
//! [`MaxDistanceIndex`] answers capped upper bound queries: how long can a
//! walk between two positions be, up to a user-supplied cap? It is a filter,
//! not an exact answer: a result below the cap guarantees that no walk
//! between the positions is longer.
//!
//! Nodes are grouped into connected components. Components containing a
//! cycle of length at most the cap come first in component id space; any
//! query touching them saturates at the cap. The remaining components are
//! acyclic, and the index stores the minimum and maximum distances from
//! each node to the sinks of its component, computed by dynamic programming
//! in topological order.

use crate::graph::{GraphInterface, Position, Visit};
use crate::utils::{self, PackedVector};

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::io::{self, Read, Write};

use gbwt::Orientation;


//-----------------------------------------------------------------------------

// A union-find structure over dense identifiers.
#[derive(Clone, Debug)]
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind { parent: (0..size).collect() }
    }

    fn find(&mut self, element: usize) -> usize {
        let mut element = element;
        while self.parent[element] != element {
            self.parent[element] = self.parent[self.parent[element]];
            element = self.parent[element];
        }
        element
    }

    // Attaches the larger root to the smaller one, keeping the minimum
    // element of a set as its representative.
    fn union(&mut self, a: usize, b: usize) {
        let a = self.find(a);
        let b = self.find(b);
        if a < b {
            self.parent[b] = a;
        } else if b < a {
            self.parent[a] = b;
        }
    }
}

//-----------------------------------------------------------------------------

/// An index for capped upper bound distance queries.
///
/// Built over the same graph as the minimum distance index but independent
/// of the snarl decomposition. See the module documentation for the
/// structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaxDistanceIndex {
    node_to_component: PackedVector,
    min_distances: PackedVector,
    max_distances: PackedVector,
    num_cycles: usize,
    num_components: usize,
    cap: usize,
    min_node_id: usize,
}

impl MaxDistanceIndex {
    /// Builds a maximum distance index for the graph with the given cap.
    pub fn new<G: GraphInterface>(graph: &G, cap: usize, verbose: bool) -> Result<Self, String> {
        if verbose {
            eprintln!("Building maximum distance index with cap {}", cap);
        }
        let (min_node_id, max_node_id) = graph.id_range().ok_or(
            String::from("Cannot index an empty graph")
        )?;
        let size = max_node_id - min_node_id + 1;
        let node_ids = graph.node_ids();

        // A node is cyclic if the shortest cycle through it fits under the cap.
        let mut cyclic: Vec<bool> = vec![false; size];
        for node_id in node_ids.iter() {
            cyclic[node_id - min_node_id] = shortest_cycle_through(graph, *node_id, cap).is_some();
        }

        // Connected components: first among cyclic nodes, then among the rest.
        let mut sets = UnionFind::new(size);
        for node_id in node_ids.iter() {
            let offset = node_id - min_node_id;
            for orientation in [Orientation::Forward, Orientation::Reverse] {
                for target in graph.follow_edges(Visit::new(*node_id, orientation)) {
                    let target_offset = target.id - min_node_id;
                    if cyclic[offset] == cyclic[target_offset] {
                        sets.union(offset, target_offset);
                    }
                }
            }
        }

        // Distances from each visit to the sinks of its component, in
        // topological order. Visits on cycles longer than the cap cannot be
        // ordered and saturate at the cap.
        let visit_order = topological_order(graph, &mut sets, &cyclic, min_node_id, size);
        let (visit_min, visit_max) = sink_distances(graph, &mut sets, &cyclic, &visit_order, min_node_id, cap)?;

        // Number the components: cyclic components first by minimum node id,
        // then acyclic components by the topological rank of their visits.
        let mut component_rank: HashMap<usize, usize> = HashMap::new();
        for (rank, visit) in visit_order.iter().enumerate() {
            let root = sets.find(visit.id - min_node_id);
            component_rank.entry(root).or_insert(rank);
        }
        let mut cyclic_roots: Vec<usize> = Vec::new();
        let mut acyclic_roots: Vec<(usize, usize)> = Vec::new();
        for node_id in node_ids.iter() {
            let offset = node_id - min_node_id;
            let root = sets.find(offset);
            if root != offset {
                continue;
            }
            if cyclic[offset] {
                cyclic_roots.push(root);
            } else {
                let rank = component_rank.get(&root).cloned().unwrap_or(usize::MAX);
                acyclic_roots.push((rank, root));
            }
        }
        cyclic_roots.sort_unstable();
        acyclic_roots.sort_unstable();
        let num_cycles = cyclic_roots.len();
        let num_components = num_cycles + acyclic_roots.len();

        let mut component_ids: HashMap<usize, usize> = HashMap::new();
        for (index, root) in cyclic_roots.iter().enumerate() {
            component_ids.insert(*root, index + 1);
        }
        for (index, (_, root)) in acyclic_roots.iter().enumerate() {
            component_ids.insert(*root, num_cycles + index + 1);
        }

        // Final node-indexed vectors.
        let mut node_to_component: Vec<u64> = vec![0; size];
        let mut min_distances: Vec<u64> = vec![0; size];
        let mut max_distances: Vec<u64> = vec![0; size];
        for node_id in node_ids.iter() {
            let offset = node_id - min_node_id;
            let root = sets.find(offset);
            node_to_component[offset] = component_ids[&root] as u64;
            let forward = 2 * offset;
            let reverse = 2 * offset + 1;
            min_distances[offset] = visit_min[forward].min(visit_min[reverse]).min(cap as u64);
            max_distances[offset] = visit_max[forward].max(visit_max[reverse]).min(cap as u64);
        }

        if verbose {
            eprintln!("Found {} components, {} of them cyclic", num_components, num_cycles);
        }

        Ok(MaxDistanceIndex {
            node_to_component: PackedVector::from_values(&node_to_component),
            min_distances: PackedVector::from_values(&min_distances),
            max_distances: PackedVector::from_values(&max_distances),
            num_cycles, num_components,
            cap,
            min_node_id,
        })
    }

    /// Returns the number of cyclic components.
    pub fn num_cycles(&self) -> usize {
        self.num_cycles
    }

    /// Returns the total number of connected components.
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Returns the cap value used at construction.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Returns the component id of the node, or 0 if the node is unknown.
    pub fn component_of(&self, node_id: usize) -> usize {
        if node_id < self.min_node_id {
            return 0;
        }
        let offset = node_id - self.min_node_id;
        if offset >= self.node_to_component.len() {
            return 0;
        }
        self.node_to_component.get(offset) as usize
    }

    /// Returns an upper bound on the length of any walk between the two
    /// positions, saturated at the cap.
    ///
    /// Returns the cap when the positions are in different components or in
    /// a cyclic component. Unknown nodes and out-of-range offsets are
    /// precondition violations and are reported as errors.
    pub fn max_distance<G: GraphInterface>(&self, graph: &G, pos1: Position, pos2: Position) -> Result<i64, String> {
        let len1 = graph.node_len(pos1.id).ok_or(format!("Node {} is not in the graph", pos1.id))?;
        let len2 = graph.node_len(pos2.id).ok_or(format!("Node {} is not in the graph", pos2.id))?;
        if pos1.offset >= len1 {
            return Err(format!("Offset {} is out of range for node {} of length {}", pos1.offset, pos1.id, len1));
        }
        if pos2.offset >= len2 {
            return Err(format!("Offset {} is out of range for node {} of length {}", pos2.offset, pos2.id, len2));
        }

        let component1 = self.component_of(pos1.id);
        let component2 = self.component_of(pos2.id);
        if component1 != component2 || component1 <= self.num_cycles {
            return Ok(self.cap as i64);
        }

        let offset1 = (pos1.id - self.min_node_id, pos1.forward_offset(len1) as i64);
        let offset2 = (pos2.id - self.min_node_id, pos2.forward_offset(len2) as i64);
        let max1 = self.max_distances.get(offset1.0) as i64;
        let min1 = self.min_distances.get(offset1.0) as i64;
        let max2 = self.max_distances.get(offset2.0) as i64;
        let min2 = self.min_distances.get(offset2.0) as i64;

        // A saturated maximum means that walks from the node can exceed the
        // cap, so nothing below the cap can be guaranteed.
        if max1 >= self.cap as i64 || max2 >= self.cap as i64 {
            return Ok(self.cap as i64);
        }

        let forward = max1 - min2 + offset2.1 - offset1.1;
        let backward = max2 - min1 + offset1.1 - offset2.1;
        Ok(forward.max(backward).clamp(0, self.cap as i64))
    }

    pub(crate) fn serialize_body<W: Write>(&self, output: &mut W) -> io::Result<()> {
        utils::write_varint(self.num_cycles, output)?;
        utils::write_varint(self.num_components, output)?;
        self.node_to_component.serialize(output)?;
        self.min_distances.serialize(output)?;
        self.max_distances.serialize(output)
    }

    pub(crate) fn load_body<R: Read>(
        input: &mut R,
        cap: usize, min_node_id: usize, size: usize
    ) -> Result<Self, String> {
        let num_cycles = utils::read_varint(input)?;
        let num_components = utils::read_varint(input)?;
        if num_cycles > num_components {
            return Err(format!(
                "There cannot be {} cyclic components among {}", num_cycles, num_components
            ));
        }
        let node_to_component = PackedVector::load(input)?;
        let min_distances = PackedVector::load(input)?;
        let max_distances = PackedVector::load(input)?;
        for vector in [&node_to_component, &min_distances, &max_distances] {
            if vector.len() != size {
                return Err(format!(
                    "Maximum distance vectors have {} entries for {} nodes", vector.len(), size
                ));
            }
        }
        Ok(MaxDistanceIndex {
            node_to_component, min_distances, max_distances,
            num_cycles, num_components,
            cap, min_node_id,
        })
    }
}

//-----------------------------------------------------------------------------

// Returns the length of the shortest cycle through the node in its forward
// orientation, or [`None`] if there is no cycle of length at most `cap`.
// A cycle traversing the node in reverse is the same cycle walked backwards,
// so one orientation is enough.
fn shortest_cycle_through<G: GraphInterface>(graph: &G, node_id: usize, cap: usize) -> Option<usize> {
    let node_len = graph.node_len(node_id)? as i64;
    let source = Visit::forward(node_id);
    let mut best: Option<usize> = None;

    let mut dist: HashMap<i64, i64> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<(i64, i64)>> = BinaryHeap::new();
    for target in graph.follow_edges(source) {
        if target == source {
            return Some(node_len as usize).filter(|x| *x <= cap);
        }
        if dist.get(&target.encode()).is_none() {
            dist.insert(target.encode(), 0);
            heap.push(Reverse((0, target.encode())));
        }
    }
    while let Some(Reverse((d, encoded))) = heap.pop() {
        let visit = Visit::decode(encoded);
        if d > *dist.get(&encoded).unwrap() {
            continue;
        }
        if node_len + d > cap as i64 {
            break;
        }
        let len = graph.node_len(visit.id)? as i64;
        for target in graph.follow_edges(visit) {
            if target == source {
                let cycle = (node_len + d + len) as usize;
                if cycle <= cap && best.map_or(true, |x| cycle < x) {
                    best = Some(cycle);
                }
                continue;
            }
            let candidate = d + len;
            let entry = dist.entry(target.encode()).or_insert(i64::MAX);
            if candidate < *entry {
                *entry = candidate;
                heap.push(Reverse((candidate, target.encode())));
            }
        }
    }
    best
}

// Kahn's algorithm over the visits of non-cyclic nodes, with edges
// restricted to endpoints in the same component. Visits on cycles longer
// than the cap are left out of the order.
fn topological_order<G: GraphInterface>(
    graph: &G,
    sets: &mut UnionFind,
    cyclic: &[bool],
    min_node_id: usize,
    size: usize,
) -> Vec<Visit> {
    let mut in_degree: Vec<usize> = vec![0; 2 * size];
    let node_ids = graph.node_ids();

    let restricted = |sets: &mut UnionFind, from: Visit, to: Visit| -> bool {
        let from_offset = from.id - min_node_id;
        let to_offset = to.id - min_node_id;
        !cyclic[from_offset] && !cyclic[to_offset]
            && sets.find(from_offset) == sets.find(to_offset)
    };

    for node_id in node_ids.iter() {
        if cyclic[node_id - min_node_id] {
            continue;
        }
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            let visit = Visit::new(*node_id, orientation);
            for target in graph.follow_edges(visit) {
                if restricted(sets, visit, target) {
                    in_degree[visit_slot(target, min_node_id)] += 1;
                }
            }
        }
    }

    let mut queue: VecDeque<Visit> = VecDeque::new();
    for node_id in node_ids.iter() {
        if cyclic[node_id - min_node_id] {
            continue;
        }
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            let visit = Visit::new(*node_id, orientation);
            if in_degree[visit_slot(visit, min_node_id)] == 0 {
                queue.push_back(visit);
            }
        }
    }

    let mut order: Vec<Visit> = Vec::new();
    while let Some(visit) = queue.pop_front() {
        order.push(visit);
        for target in graph.follow_edges(visit) {
            if restricted(sets, visit, target) {
                let slot = visit_slot(target, min_node_id);
                in_degree[slot] -= 1;
                if in_degree[slot] == 0 {
                    queue.push_back(target);
                }
            }
        }
    }
    order
}

#[inline]
fn visit_slot(visit: Visit, min_node_id: usize) -> usize {
    2 * (visit.id - min_node_id) + if visit.is_reverse() { 1 } else { 0 }
}

// Minimum and maximum distances from each visit to the sinks of its
// component, saturated at the cap. Sinks are visits with no successors in
// their component; their distance is the length of their node.
fn sink_distances<G: GraphInterface>(
    graph: &G,
    sets: &mut UnionFind,
    cyclic: &[bool],
    order: &[Visit],
    min_node_id: usize,
    cap: usize,
) -> Result<(Vec<u64>, Vec<u64>), String> {
    let size = cyclic.len();
    let mut visit_min: Vec<u64> = vec![0; 2 * size];
    let mut visit_max: Vec<u64> = vec![0; 2 * size];
    let mut ordered: Vec<bool> = vec![false; 2 * size];
    for visit in order.iter() {
        ordered[visit_slot(*visit, min_node_id)] = true;
    }

    // Visits that Kahn's algorithm could not order sit on cycles longer than
    // the cap. Walks through them are unbounded, so their distances saturate
    // the bound completely.
    for node_id in graph.node_ids() {
        let offset = node_id - min_node_id;
        if cyclic[offset] {
            continue;
        }
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            let slot = visit_slot(Visit::new(node_id, orientation), min_node_id);
            if !ordered[slot] {
                visit_min[slot] = 0;
                visit_max[slot] = cap as u64;
            }
        }
    }

    for visit in order.iter().rev() {
        let offset = visit.id - min_node_id;
        let len = graph.node_len(visit.id).ok_or(
            format!("Node {} is not in the graph", visit.id)
        )? as u64;
        let mut best_min: Option<u64> = None;
        let mut best_max: Option<u64> = None;
        for target in graph.follow_edges(*visit) {
            let target_offset = target.id - min_node_id;
            if cyclic[target_offset] || sets.find(target_offset) != sets.find(offset) {
                continue;
            }
            let slot = visit_slot(target, min_node_id);
            best_min = Some(best_min.map_or(visit_min[slot], |x| x.min(visit_min[slot])));
            best_max = Some(best_max.map_or(visit_max[slot], |x| x.max(visit_max[slot])));
        }
        let slot = visit_slot(*visit, min_node_id);
        visit_min[slot] = (len + best_min.unwrap_or(0)).min(cap as u64);
        visit_max[slot] = (len + best_max.unwrap_or(0)).min(cap as u64);
    }

    Ok((visit_min, visit_max))
}

//-----------------------------------------------------------------------------
