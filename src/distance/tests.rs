use super::*;

use crate::graph::HashGraph;

use gbwt::Orientation;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

//-----------------------------------------------------------------------------

// Graph and decomposition builders.

fn build_graph(nodes: &[(usize, usize)], edges: &[(i64, i64)]) -> HashGraph {
    let mut graph = HashGraph::new();
    for (id, len) in nodes {
        graph.add_node(*id, *len).unwrap();
    }
    for (from, to) in edges {
        graph.add_edge(Visit::decode(*from), Visit::decode(*to)).unwrap();
    }
    graph
}

fn chain(visits: &[i64]) -> Vec<Visit> {
    visits.iter().map(|x| Visit::decode(*x)).collect()
}

fn build_index<'a>(
    graph: &'a HashGraph,
    manager: &'a SnarlManager,
    cap: usize
) -> DistanceIndex<'a, HashGraph> {
    let index = DistanceIndex::new(graph, manager, cap, false);
    assert!(index.is_ok(), "Failed to build the index: {}", index.unwrap_err());
    index.unwrap()
}

fn pos(id: usize, offset: usize) -> Position {
    Position::new(id, offset, Orientation::Forward)
}

fn rpos(id: usize, offset: usize) -> Position {
    Position::new(id, offset, Orientation::Reverse)
}

// S1: three nodes in a line.
fn linear_graph() -> (HashGraph, SnarlManager) {
    let graph = build_graph(&[(1, 5), (2, 3), (3, 4)], &[(1, 2), (2, 3)]);
    let mut manager = SnarlManager::new();
    manager.add_chain(None, &chain(&[1, 2, 3])).unwrap();
    (graph, manager)
}

// S2: a single bubble with two alleles.
fn bubble_graph() -> (HashGraph, SnarlManager) {
    let graph = build_graph(
        &[(1, 2), (2, 4), (3, 6), (4, 2)],
        &[(1, 2), (1, 3), (2, 4), (3, 4)]
    );
    let mut manager = SnarlManager::new();
    manager.add_chain(None, &chain(&[1, 4])).unwrap();
    (graph, manager)
}

// S3: an outer snarl containing a chain with an inner bubble.
fn nested_graph() -> (HashGraph, SnarlManager) {
    let graph = build_graph(
        &[(1, 2), (2, 5), (3, 3), (4, 7), (5, 5), (6, 2)],
        &[(1, 2), (2, 3), (2, 4), (3, 5), (4, 5), (5, 6)]
    );
    let mut manager = SnarlManager::new();
    manager.add_chain(None, &chain(&[1, 6])).unwrap();
    let parent = Snarl::new(Visit::forward(1), Visit::forward(6));
    manager.add_chain(Some(parent), &chain(&[2, 5])).unwrap();
    (graph, manager)
}

// S4: two disconnected linear components.
fn disconnected_graph() -> (HashGraph, SnarlManager) {
    let graph = build_graph(
        &[(1, 3), (2, 4), (5, 2), (6, 5)],
        &[(1, 2), (5, 6)]
    );
    let mut manager = SnarlManager::new();
    manager.add_chain(None, &chain(&[1, 2])).unwrap();
    manager.add_chain(None, &chain(&[5, 6])).unwrap();
    (graph, manager)
}

// S5: a node with a self-loop, anchored between two boundary nodes.
fn self_loop_graph() -> (HashGraph, SnarlManager) {
    let graph = build_graph(
        &[(1, 1), (2, 2), (3, 1)],
        &[(1, 2), (2, 2), (2, 3)]
    );
    let mut manager = SnarlManager::new();
    manager.add_chain(None, &chain(&[1, 3])).unwrap();
    (graph, manager)
}

// A chain with an inversion inside its second snarl, so that walks can turn
// around in the middle of the chain.
fn inversion_graph() -> (HashGraph, SnarlManager) {
    let graph = build_graph(
        &[(1, 2), (2, 2), (3, 2), (4, 3)],
        &[(1, 2), (2, 3), (3, 4), (3, -3)]
    );
    let mut manager = SnarlManager::new();
    manager.add_chain(None, &chain(&[1, 2, 4])).unwrap();
    (graph, manager)
}

// A nested chain whose inner snarl contains an inversion, so that the
// enclosing snarl can only be re-exited through a U-turn in the child chain.
fn nested_inversion_graph() -> (HashGraph, SnarlManager) {
    let graph = build_graph(
        &[(8, 1), (1, 2), (2, 1), (3, 2), (4, 1), (5, 1), (7, 2)],
        &[(8, 1), (1, 2), (1, 7), (2, 3), (3, -3), (3, 4), (4, 5)]
    );
    let mut manager = SnarlManager::new();
    manager.add_chain(None, &chain(&[8, 1, 5])).unwrap();
    let parent = Snarl::new(Visit::forward(1), Visit::forward(5));
    manager.add_chain(Some(parent), &chain(&[2, 4])).unwrap();
    (graph, manager)
}

//-----------------------------------------------------------------------------

// A reference implementation: Dijkstra over directed visits.

fn reference_min_distance(graph: &HashGraph, pos1: Position, pos2: Position) -> i64 {
    let len1 = graph.node_len(pos1.id).unwrap() as i64;
    let len2 = graph.node_len(pos2.id).unwrap() as i64;
    let c1 = pos1.forward_offset(len1 as usize) as i64;
    let c2 = pos2.forward_offset(len2 as usize) as i64;

    let mut best: i64 = if pos1.id == pos2.id { (c1 - c2).abs() } else { -1 };

    let mut dist: HashMap<i64, i64> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<(i64, i64)>> = BinaryHeap::new();
    for (visit, cost) in [
        (Visit::forward(pos1.id), len1 - c1),
        (Visit::reverse(pos1.id), c1 + 1),
    ] {
        for target in graph.follow_edges(visit) {
            let entry = dist.entry(target.encode()).or_insert(i64::MAX);
            if cost < *entry {
                *entry = cost;
                heap.push(Reverse((cost, target.encode())));
            }
        }
    }

    while let Some(Reverse((d, encoded))) = heap.pop() {
        if d > dist[&encoded] {
            continue;
        }
        let visit = Visit::decode(encoded);
        if visit.id == pos2.id {
            let arrival = if visit.is_reverse() { len2 - 1 - c2 } else { c2 };
            let total = d + arrival;
            if best < 0 || total < best {
                best = total;
            }
        }
        let len = graph.node_len(visit.id).unwrap() as i64;
        for target in graph.follow_edges(visit) {
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

// All positions of the graph in both orientations.
fn all_positions(graph: &HashGraph) -> Vec<Position> {
    let mut result = Vec::new();
    for id in graph.node_ids() {
        let len = graph.node_len(id).unwrap();
        for offset in 0..len {
            result.push(pos(id, offset));
            result.push(rpos(id, offset));
        }
    }
    result
}

fn check_against_reference(graph: &HashGraph, manager: &SnarlManager, name: &str) {
    let index = build_index(graph, manager, 1000);
    let positions = all_positions(graph);
    for from in positions.iter() {
        for to in positions.iter() {
            let truth = reference_min_distance(graph, *from, *to);
            let result = index.min_distance(*from, *to);
            assert_eq!(
                result, Ok(truth),
                "{}: wrong distance from {} to {}", name, from, to
            );
        }
    }
}

//-----------------------------------------------------------------------------

// Scenario tests.

#[test]
fn linear_chain() {
    let (graph, manager) = linear_graph();
    let index = build_index(&graph, &manager, 1000);

    assert_eq!(index.min_distance(pos(1, 0), pos(3, 0)), Ok(8), "Wrong forward distance");
    let flipped = (pos(3, 0).flip(4), pos(1, 0).flip(5));
    assert_eq!(index.min_distance(flipped.0, flipped.1), Ok(8), "Wrong reverse distance");
    assert_eq!(index.max_distance(pos(1, 0), pos(3, 0)), Ok(8), "Wrong maximum distance");

    // Walking backward in a linear graph is impossible beyond the node.
    assert_eq!(index.min_distance(pos(3, 0), pos(1, 0)), Ok(8), "Wrong distance in the other direction");
    assert_eq!(index.min_distance(pos(1, 2), pos(2, 1)), Ok(4), "Wrong distance with offsets");
}

#[test]
fn single_bubble() {
    let (graph, manager) = bubble_graph();
    let index = build_index(&graph, &manager, 1000);

    // Through the shorter allele.
    assert_eq!(index.min_distance(pos(1, 0), pos(4, 1)), Ok(7), "Wrong distance through the bubble");
    // Between the alleles there is no walk inside the bubble.
    let via_outside = index.min_distance(pos(2, 0), pos(3, 0));
    assert_eq!(via_outside, Ok(-1), "Found a walk between the alleles");
}

#[test]
fn nested_bubble() {
    let (graph, manager) = nested_graph();
    let index = build_index(&graph, &manager, 1000);

    // Through the shorter inner allele, descending two levels.
    let truth = reference_min_distance(&graph, pos(1, 0), pos(6, 1));
    assert_eq!(truth, 16, "Wrong reference distance");
    assert_eq!(index.min_distance(pos(1, 0), pos(6, 1)), Ok(truth), "Wrong nested distance");
}

#[test]
fn disconnected_components() {
    let (graph, manager) = disconnected_graph();
    let index = build_index(&graph, &manager, 1000);

    assert_eq!(index.min_distance(pos(1, 0), pos(6, 0)), Ok(-1), "Found a distance between components");
    assert_eq!(index.min_distance(pos(5, 0), pos(2, 0)), Ok(-1), "Found a distance between components");
    assert_eq!(index.max_distance(pos(1, 0), pos(6, 0)), Ok(1000), "Wrong capped maximum distance");
    assert_eq!(index.min_distance(pos(1, 0), pos(2, 2)), Ok(5), "Wrong distance within a component");
}

#[test]
fn short_self_loop() {
    let (graph, manager) = self_loop_graph();
    let index = build_index(&graph, &manager, 100);

    assert_eq!(index.min_distance(pos(2, 0), pos(2, 0)), Ok(0), "Wrong distance from a position to itself");
    assert_eq!(index.max_distance(pos(2, 0), pos(2, 0)), Ok(100), "Wrong maximum distance in a cyclic component");
    // Around the loop from the second base back to the first.
    assert_eq!(index.min_distance(pos(2, 1), pos(2, 0)), Ok(1), "Wrong distance around the loop");
}

#[test]
fn serialization_round_trip() {
    let (graph, manager) = nested_graph();
    let index = build_index(&graph, &manager, 1000);

    let mut buffer: Vec<u8> = Vec::new();
    index.serialize(&mut buffer).unwrap();
    assert_eq!(buffer.len(), index.size_in_bytes(), "Wrong serialized size");

    let loaded = DistanceIndex::load(&graph, &manager, &mut buffer.as_slice());
    assert!(loaded.is_ok(), "Failed to load the index: {}", loaded.unwrap_err());
    let loaded = loaded.unwrap();
    assert!(loaded == index, "The loaded index differs from the original");

    for from in graph.node_ids() {
        for to in graph.node_ids() {
            assert_eq!(
                loaded.min_distance(pos(from, 0), pos(to, 0)),
                index.min_distance(pos(from, 0), pos(to, 0)),
                "Wrong distance from {} to {} after loading", from, to
            );
        }
    }
}

//-----------------------------------------------------------------------------

// Property tests.

#[test]
fn agrees_with_reference() {
    let (graph, manager) = linear_graph();
    check_against_reference(&graph, &manager, "linear");
    let (graph, manager) = bubble_graph();
    check_against_reference(&graph, &manager, "bubble");
    let (graph, manager) = nested_graph();
    check_against_reference(&graph, &manager, "nested");
    let (graph, manager) = disconnected_graph();
    check_against_reference(&graph, &manager, "disconnected");
    let (graph, manager) = self_loop_graph();
    check_against_reference(&graph, &manager, "self-loop");
    let (graph, manager) = inversion_graph();
    check_against_reference(&graph, &manager, "inversion");
    let (graph, manager) = nested_inversion_graph();
    check_against_reference(&graph, &manager, "nested inversion");
}

#[test]
fn uturn_through_nested_chain() {
    let (graph, manager) = nested_inversion_graph();
    let index = build_index(&graph, &manager, 1000);

    // Entering the snarl, turning around inside the child chain, and coming
    // back out reads nodes 1, 2, 3, 3, 2 for 8 bp.
    let outer = manager.snarl_with_start(Visit::forward(1)).unwrap();
    let table = index.snarl_index(outer);
    assert_eq!(table.snarl_distance(Visit::forward(1), Visit::reverse(1)), 8, "Wrong turnaround distance");
    let top = index.chain_index(manager.chain_of(outer));
    assert_eq!(top.loop_fd(1), 6, "Wrong forward loop at the snarl entrance");
    assert_eq!(top.loop_rev(1), -1, "Found a reverse loop at the snarl entrance");
}

#[test]
fn symmetry() {
    let (graph, manager) = nested_graph();
    let index = build_index(&graph, &manager, 1000);
    let positions = all_positions(&graph);
    for from in positions.iter() {
        for to in positions.iter() {
            let forward = index.min_distance(*from, *to).unwrap();
            let from_len = graph.node_len(from.id).unwrap();
            let to_len = graph.node_len(to.id).unwrap();
            let backward = index.min_distance(to.flip(to_len), from.flip(from_len)).unwrap();
            assert_eq!(forward, backward, "Asymmetric distances for {} and {}", from, to);
        }
    }
}

#[test]
fn triangle_bound() {
    let (graph, manager) = bubble_graph();
    let index = build_index(&graph, &manager, 1000);
    let positions: Vec<Position> = graph.node_ids().iter().map(|id| pos(*id, 0)).collect();
    for a in positions.iter() {
        for b in positions.iter() {
            for c in positions.iter() {
                let ab = index.min_distance(*a, *b).unwrap();
                let bc = index.min_distance(*b, *c).unwrap();
                let ac = index.min_distance(*a, *c).unwrap();
                if ab >= 0 && bc >= 0 {
                    assert!(
                        ac == -1 || ac <= ab + bc,
                        "Triangle bound violated for {}, {}, {}: {} > {} + {}",
                        a, b, c, ac, ab, bc
                    );
                }
            }
        }
    }
}

#[test]
fn max_bounds_min() {
    for (graph, manager) in [linear_graph(), bubble_graph(), nested_graph()] {
        let index = build_index(&graph, &manager, 1000);
        let positions = all_positions(&graph);
        for from in positions.iter() {
            for to in positions.iter() {
                let minimum = index.min_distance(*from, *to).unwrap();
                let maximum = index.max_distance(*from, *to).unwrap();
                assert!(maximum <= 1000, "Maximum distance above the cap for {} and {}", from, to);
                if minimum >= 0 {
                    assert!(
                        maximum >= minimum,
                        "Maximum distance {} below minimum {} for {} and {}",
                        maximum, minimum, from, to
                    );
                }
            }
        }
    }
}

#[test]
fn node_to_snarl_consistency() {
    let (graph, manager) = nested_graph();
    let index = build_index(&graph, &manager, 1000);

    let outer = Snarl::new(Visit::forward(1), Visit::forward(6));
    let inner = Snarl::new(Visit::forward(2), Visit::forward(5));
    assert_eq!(index.snarl_of(1), Ok(outer), "Wrong snarl for node 1");
    assert_eq!(index.snarl_of(6), Ok(outer), "Wrong snarl for node 6");
    for id in [2, 3, 4, 5] {
        assert_eq!(index.snarl_of(id), Ok(inner), "Wrong snarl for node {}", id);
    }
    assert!(index.snarl_of(100).is_err(), "Found a snarl for an invalid node");
}

#[test]
fn snarl_hinted_queries() {
    let (graph, manager) = nested_graph();
    let index = build_index(&graph, &manager, 1000);
    let inner = Snarl::new(Visit::forward(2), Visit::forward(5));
    let outer = Snarl::new(Visit::forward(1), Visit::forward(6));

    let hinted = index.min_distance_in_snarls(&inner, &outer, pos(3, 0), pos(6, 1));
    let plain = index.min_distance(pos(3, 0), pos(6, 1));
    assert_eq!(hinted, plain, "Hinted and plain queries disagree");

    let unknown = Snarl::new(Visit::forward(3), Visit::forward(4));
    assert!(
        index.min_distance_in_snarls(&unknown, &outer, pos(3, 0), pos(6, 1)).is_err(),
        "Accepted an unknown snarl"
    );
}

//-----------------------------------------------------------------------------

// Chain index arithmetic on the linear graph.

#[test]
fn chain_arithmetic() {
    let (graph, manager) = linear_graph();
    let index = build_index(&graph, &manager, 1000);
    let chain = index.chain_index(0);

    assert_eq!(chain.num_snarls(), 2, "Wrong number of snarls in the chain");
    assert_eq!(chain.chain_length(), 12, "Wrong chain length");
    assert_eq!(chain.chain_distance(Visit::forward(1), Visit::forward(3)), 8, "Wrong forward distance");
    assert_eq!(chain.chain_distance(Visit::reverse(3), Visit::reverse(1)), 7, "Wrong backward distance");
    assert_eq!(chain.chain_distance(Visit::forward(1), Visit::forward(1)), 0, "Wrong trivial distance");
    // No loops in a linear chain.
    assert_eq!(chain.chain_distance(Visit::forward(1), Visit::reverse(1)), -1, "Found a loop");
    for boundary in 0..3 {
        assert_eq!(chain.loop_fd(boundary), -1, "Found a forward loop at {}", boundary);
        assert_eq!(chain.loop_rev(boundary), -1, "Found a reverse loop at {}", boundary);
    }
}

#[test]
fn snarl_tables() {
    let (graph, manager) = bubble_graph();
    let index = build_index(&graph, &manager, 1000);
    let snarl_id = manager.snarl_with_start(Visit::forward(1)).unwrap();
    let table = index.snarl_index(snarl_id);

    // Two boundary nodes and two free nodes, in both orientations.
    assert_eq!(table.num_visits(), 8, "Wrong number of indexed visits");
    assert_eq!(table.snarl_distance(Visit::forward(1), Visit::forward(2)), 2, "Wrong distance to the allele");
    assert_eq!(table.snarl_distance(Visit::forward(1), Visit::forward(4)), 6, "Wrong distance across");
    assert_eq!(table.snarl_distance(Visit::forward(2), Visit::forward(3)), -1, "Found a walk between the alleles");
    assert_eq!(index.snarl_length(snarl_id), 8, "Wrong snarl length");

    // The snarl cannot be entered through its start in reverse.
    assert_eq!(table.snarl_distance(Visit::reverse(1), Visit::forward(4)), -1, "Entered the snarl backwards");
}

#[test]
fn unit_lengths() {
    let (graph, manager) = nested_graph();
    let index = build_index(&graph, &manager, 1000);

    // In the outer snarl, the inner chain is a single unit of length 13.
    let outer = manager.snarl_with_start(Visit::forward(1)).unwrap();
    assert_eq!(index.unit_length(outer, Visit::forward(2)), Ok(13), "Wrong length for the chain unit");
    assert_eq!(index.unit_length(outer, Visit::reverse(5)), Ok(13), "Wrong length from the other end");
    assert_eq!(index.unit_length(outer, Visit::forward(6)), Ok(2), "Wrong length for a boundary node");

    // In the inner snarl, the alleles are plain nodes.
    let inner = manager.snarl_with_start(Visit::forward(2)).unwrap();
    assert_eq!(index.unit_length(inner, Visit::forward(3)), Ok(3), "Wrong length for an allele");
    assert_eq!(index.unit_length(inner, Visit::forward(4)), Ok(7), "Wrong length for the other allele");
}

//-----------------------------------------------------------------------------

// Error handling.

#[test]
fn rejects_invalid_positions() {
    let (graph, manager) = linear_graph();
    let index = build_index(&graph, &manager, 1000);

    assert!(index.min_distance(pos(100, 0), pos(1, 0)).is_err(), "Accepted an unknown node");
    assert!(index.min_distance(pos(1, 5), pos(2, 0)).is_err(), "Accepted an offset past the node");
    assert!(index.max_distance(pos(1, 0), pos(2, 10)).is_err(), "Accepted an invalid maximum distance query");
}

#[test]
fn rejects_incomplete_decomposition() {
    // Node 4 is not covered by the decomposition.
    let graph = build_graph(&[(1, 3), (2, 4), (4, 2)], &[(1, 2)]);
    let mut manager = SnarlManager::new();
    manager.add_chain(None, &chain(&[1, 2])).unwrap();
    let result = DistanceIndex::new(&graph, &manager, 1000, false);
    assert!(result.is_err(), "Accepted a decomposition that does not cover the graph");
}

#[test]
fn rejects_untraversable_snarl() {
    // The end of the snarl cannot be reached from its start.
    let graph = build_graph(&[(1, 3), (2, 4), (3, 2)], &[(1, 2)]);
    let mut manager = SnarlManager::new();
    manager.add_chain(None, &chain(&[1, 3])).unwrap();
    let result = DistanceIndex::new(&graph, &manager, 1000, false);
    assert!(result.is_err(), "Accepted a snarl that cannot be traversed");
}

#[test]
fn rejects_corrupted_serialization() {
    let (graph, manager) = linear_graph();
    let index = build_index(&graph, &manager, 1000);
    let mut buffer: Vec<u8> = Vec::new();
    index.serialize(&mut buffer).unwrap();

    let truncated = &buffer[0..buffer.len() - 5];
    assert!(
        DistanceIndex::load(&graph, &manager, &mut &truncated[..]).is_err(),
        "Accepted a truncated index"
    );

    let mut corrupted = buffer.clone();
    corrupted[0] = b'X';
    assert!(
        DistanceIndex::load(&graph, &manager, &mut corrupted.as_slice()).is_err(),
        "Accepted a wrong magic number"
    );

    let mut wrong_block = buffer.clone();
    wrong_block[5] = 99;
    assert!(
        DistanceIndex::load(&graph, &manager, &mut wrong_block.as_slice()).is_err(),
        "Accepted an unknown block type"
    );

    // An index for a different graph.
    let (other_graph, other_manager) = bubble_graph();
    assert!(
        DistanceIndex::load(&other_graph, &other_manager, &mut buffer.as_slice()).is_err(),
        "Accepted an index built for a different graph"
    );
}

//-----------------------------------------------------------------------------

// Randomized bubble chains with occasional nesting, checked against the
// reference implementation.

struct RandomGraph {
    graph: HashGraph,
    manager: SnarlManager,
}

fn random_bubble_chain(rng: &mut StdRng) -> RandomGraph {
    let mut graph = HashGraph::new();
    let mut next_id = 1;
    let new_node = |graph: &mut HashGraph, rng: &mut StdRng, next_id: &mut usize| -> usize {
        let id = *next_id;
        *next_id += 1;
        graph.add_node(id, rng.gen_range(1..=5)).unwrap();
        id
    };

    let snarls = rng.gen_range(1..=6);
    let mut boundaries: Vec<usize> = Vec::with_capacity(snarls + 1);
    for _ in 0..snarls + 1 {
        boundaries.push(new_node(&mut graph, rng, &mut next_id));
    }

    // Fill in each snarl and remember the nested chains.
    let mut children: Vec<(usize, usize, Vec<usize>)> = Vec::new();
    for ordinal in 0..snarls {
        let entry = boundaries[ordinal];
        let exit = boundaries[ordinal + 1];
        match rng.gen_range(0..4) {
            // Just an edge.
            0 => {
                graph.add_edge(Visit::forward(entry), Visit::forward(exit)).unwrap();
            },
            // A bubble with 1 to 3 alleles, possibly with a deletion edge.
            1 | 2 => {
                for _ in 0..rng.gen_range(1..=3) {
                    let allele = new_node(&mut graph, rng, &mut next_id);
                    graph.add_edge(Visit::forward(entry), Visit::forward(allele)).unwrap();
                    graph.add_edge(Visit::forward(allele), Visit::forward(exit)).unwrap();
                }
                if rng.gen_bool(0.3) {
                    graph.add_edge(Visit::forward(entry), Visit::forward(exit)).unwrap();
                }
            },
            // A nested chain with its own bubble.
            _ => {
                let inner_entry = new_node(&mut graph, rng, &mut next_id);
                let inner_exit = new_node(&mut graph, rng, &mut next_id);
                graph.add_edge(Visit::forward(entry), Visit::forward(inner_entry)).unwrap();
                graph.add_edge(Visit::forward(inner_exit), Visit::forward(exit)).unwrap();
                for _ in 0..rng.gen_range(1..=2) {
                    let allele = new_node(&mut graph, rng, &mut next_id);
                    graph.add_edge(Visit::forward(inner_entry), Visit::forward(allele)).unwrap();
                    graph.add_edge(Visit::forward(allele), Visit::forward(inner_exit)).unwrap();
                }
                children.push((entry, exit, vec![inner_entry, inner_exit]));
            },
        }
    }

    let mut manager = SnarlManager::new();
    let top: Vec<Visit> = boundaries.iter().map(|x| Visit::forward(*x)).collect();
    manager.add_chain(None, &top).unwrap();
    for (entry, exit, inner) in children {
        let parent = Snarl::new(Visit::forward(entry), Visit::forward(exit));
        let inner: Vec<Visit> = inner.iter().map(|x| Visit::forward(*x)).collect();
        manager.add_chain(Some(parent), &inner).unwrap();
    }

    RandomGraph { graph, manager }
}

#[test]
fn random_graphs_agree_with_reference() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for iteration in 0..20 {
        let random = random_bubble_chain(&mut rng);
        let index = build_index(&random.graph, &random.manager, 1000);

        let ids = random.graph.node_ids();
        for _ in 0..50 {
            let from_id = ids[rng.gen_range(0..ids.len())];
            let to_id = ids[rng.gen_range(0..ids.len())];
            let from_len = random.graph.node_len(from_id).unwrap();
            let to_len = random.graph.node_len(to_id).unwrap();
            let from = Position::new(
                from_id,
                rng.gen_range(0..from_len),
                if rng.gen_bool(0.5) { Orientation::Forward } else { Orientation::Reverse }
            );
            let to = Position::new(
                to_id,
                rng.gen_range(0..to_len),
                if rng.gen_bool(0.5) { Orientation::Forward } else { Orientation::Reverse }
            );
            let truth = reference_min_distance(&random.graph, from, to);
            assert_eq!(
                index.min_distance(from, to), Ok(truth),
                "Iteration {}: wrong distance from {} to {}", iteration, from, to
            );
        }
    }
}

#[test]
fn random_graphs_round_trip() {
    let mut rng = StdRng::seed_from_u64(0xCAFE);
    for iteration in 0..5 {
        let random = random_bubble_chain(&mut rng);
        let index = build_index(&random.graph, &random.manager, 1000);
        let mut buffer: Vec<u8> = Vec::new();
        index.serialize(&mut buffer).unwrap();
        let loaded = DistanceIndex::load(&random.graph, &random.manager, &mut buffer.as_slice());
        assert!(loaded.is_ok(), "Iteration {}: failed to load: {}", iteration, loaded.unwrap_err());
        assert!(loaded.unwrap() == index, "Iteration {}: the loaded index differs", iteration);
    }
}

//-----------------------------------------------------------------------------
