use super::*;

//-----------------------------------------------------------------------------

const EXAMPLE_GFA: &str = "H\tVN:Z:1.1\n\
S\t1\tGA\n\
S\t2\tGATT\n\
S\t3\t*\tLN:i:6\n\
S\t4\tAC\n\
L\t1\t+\t2\t+\t0M\n\
L\t1\t+\t3\t+\t0M\n\
L\t2\t+\t4\t+\t0M\n\
L\t3\t+\t4\t+\t0M\n";

#[test]
fn gfa_parsing() {
    let mut reader = EXAMPLE_GFA.as_bytes();
    let graph = read_gfa(&mut reader);
    assert!(graph.is_ok(), "Failed to parse the GFA file: {}", graph.unwrap_err());
    let graph = graph.unwrap();

    assert_eq!(graph.node_count(), 4, "Wrong number of nodes");
    assert_eq!(graph.node_len(1), Some(2), "Wrong length for node 1");
    assert_eq!(graph.node_len(3), Some(6), "Wrong length for node 3 from the LN tag");
    assert_eq!(graph.edge_count(), 4, "Wrong number of edges");
    assert_eq!(
        graph.follow_edges(Visit::forward(1)),
        vec![Visit::forward(2), Visit::forward(3)],
        "Wrong successors for node 1"
    );
}

#[test]
fn gfa_round_trip() {
    let mut reader = EXAMPLE_GFA.as_bytes();
    let graph = read_gfa(&mut reader).unwrap();

    let mut buffer: Vec<u8> = Vec::new();
    write_gfa(&graph, &mut buffer).unwrap();
    let parsed = read_gfa(&mut buffer.as_slice());
    assert_eq!(parsed, Ok(graph), "Wrong graph after a round trip");
}

#[test]
fn gfa_links_before_segments() {
    let gfa = "L\t1\t+\t2\t+\t0M\nS\t1\tGA\nS\t2\tTT\n";
    let graph = read_gfa(&mut gfa.as_bytes()).unwrap();
    assert_eq!(graph.edge_count(), 1, "Wrong number of edges");
}

#[test]
fn gfa_rejects_bad_input() {
    let missing_length = "S\t1\t*\n";
    assert!(read_gfa(&mut missing_length.as_bytes()).is_err(), "Accepted a segment without a length");

    let bad_orientation = "S\t1\tGA\nS\t2\tTT\nL\t1\t?\t2\t+\t0M\n";
    assert!(read_gfa(&mut bad_orientation.as_bytes()).is_err(), "Accepted a bad orientation");

    let bad_overlap = "S\t1\tGA\nS\t2\tTT\nL\t1\t+\t2\t+\t5M\n";
    assert!(read_gfa(&mut bad_overlap.as_bytes()).is_err(), "Accepted a nontrivial overlap");

    let missing_node = "S\t1\tGA\nL\t1\t+\t2\t+\t0M\n";
    assert!(read_gfa(&mut missing_node.as_bytes()).is_err(), "Accepted a link to a missing segment");

    let named_segment = "S\tchr1\tGA\n";
    assert!(read_gfa(&mut named_segment.as_bytes()).is_err(), "Accepted a non-integer segment name");
}

//-----------------------------------------------------------------------------

const EXAMPLE_SNARLS: &str = "# top-level chain and a nested chain\n\
C\t.\t1\t6\t8\n\
C\t1\t2\t4\t5\n";

#[test]
fn snarl_parsing() {
    let mut reader = EXAMPLE_SNARLS.as_bytes();
    let manager = read_snarls(&mut reader);
    assert!(manager.is_ok(), "Failed to parse the snarls file: {}", manager.unwrap_err());
    let manager = manager.unwrap();

    assert_eq!(manager.num_chains(), 2, "Wrong number of chains");
    assert_eq!(manager.num_snarls(), 4, "Wrong number of snarls");
    let inner = manager.snarl_with_start(Visit::forward(2)).unwrap();
    let outer = manager.snarl_with_start(Visit::forward(1)).unwrap();
    assert_eq!(manager.parent_of(manager.chain_of(inner)), Some(outer), "Wrong nesting");
}

#[test]
fn snarl_round_trip() {
    let mut reader = EXAMPLE_SNARLS.as_bytes();
    let manager = read_snarls(&mut reader).unwrap();

    let mut buffer: Vec<u8> = Vec::new();
    write_snarls(&manager, &mut buffer).unwrap();
    let parsed = read_snarls(&mut buffer.as_slice());
    assert!(parsed.is_ok(), "Failed to parse the written snarls: {}", parsed.unwrap_err());
    let parsed = parsed.unwrap();

    assert_eq!(parsed.num_chains(), manager.num_chains(), "Wrong number of chains after a round trip");
    for chain_id in 0..manager.num_chains() {
        assert_eq!(
            parsed.chain_boundaries(chain_id), manager.chain_boundaries(chain_id),
            "Wrong boundaries for chain {}", chain_id
        );
        assert_eq!(
            parsed.parent_of(chain_id), manager.parent_of(chain_id),
            "Wrong parent for chain {}", chain_id
        );
    }
}

#[test]
fn snarl_rejects_bad_input() {
    let unknown_record = "X\t.\t1\t2\n";
    assert!(read_snarls(&mut unknown_record.as_bytes()).is_err(), "Accepted an unknown record type");

    let unknown_parent = "C\t9\t1\t2\n";
    assert!(read_snarls(&mut unknown_parent.as_bytes()).is_err(), "Accepted an unknown parent");

    let too_short = "C\t.\t1\n";
    assert!(read_snarls(&mut too_short.as_bytes()).is_err(), "Accepted a chain with one boundary");

    let zero_visit = "C\t.\t0\t2\n";
    assert!(read_snarls(&mut zero_visit.as_bytes()).is_err(), "Accepted packed visit 0");
}

//-----------------------------------------------------------------------------

#[test]
fn position_parsing() {
    assert_eq!(parse_position("12:4"), Ok(Position::new(12, 4, Orientation::Forward)), "Wrong default orientation");
    assert_eq!(parse_position("12:4:+"), Ok(Position::new(12, 4, Orientation::Forward)), "Wrong forward position");
    assert_eq!(parse_position("12:4:-"), Ok(Position::new(12, 4, Orientation::Reverse)), "Wrong reverse position");
    assert!(parse_position("12").is_err(), "Accepted a position without an offset");
    assert!(parse_position("12:4:?").is_err(), "Accepted a bad orientation");
    assert!(parse_position("x:4").is_err(), "Accepted a bad node id");
}

//-----------------------------------------------------------------------------
