//! Reading and writing graphs and snarl decompositions in textual formats.
//!
//! The graph format is a GFA subset with `S` and `L` lines. Segment
//! sequences may be given literally or replaced with `*` and an `LN:i:`
//! tag, as only the lengths matter for distance indexing. Links must have
//! a trivial overlap.
//!
//! A snarl decomposition file has one chain per line: a `C` record type,
//! the packed start visit of the parent snarl (or `.` for a top-level
//! chain), and the packed boundary visits of the chain. Packed visits are
//! signed integers, negative for reverse visits. Chains must be listed
//! parents first, which is the order [`write_snarls`] produces.

use crate::graph::{GraphInterface, HashGraph, Position, Visit};
use crate::snarls::SnarlManager;

use std::io::{self, BufRead, Write};

use gbwt::Orientation;
use gbwt::support;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Reads a graph in the GFA format.
///
/// Unknown line types are ignored. Links may refer to segments that are
/// defined later in the file.
pub fn read_gfa<R: BufRead>(input: &mut R) -> Result<HashGraph, String> {
    let mut graph = HashGraph::new();
    let mut edges: Vec<(Visit, Visit)> = Vec::new();
    let mut line_num = 0;
    for line in input.lines() {
        line_num += 1;
        let line = line.map_err(|x| format!("Line {}: {}", line_num, x))?;
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match fields[0] {
            "S" => {
                let (id, len) = parse_segment(&fields).map_err(|x| format!("Line {}: {}", line_num, x))?;
                graph.add_node(id, len).map_err(|x| format!("Line {}: {}", line_num, x))?;
            },
            "L" => {
                let (from, to) = parse_link(&fields).map_err(|x| format!("Line {}: {}", line_num, x))?;
                edges.push((from, to));
            },
            _ => (),
        }
    }
    for (from, to) in edges {
        graph.add_edge(from, to)?;
    }
    Ok(graph)
}

fn parse_segment(fields: &[&str]) -> Result<(usize, usize), String> {
    if fields.len() < 3 {
        return Err(String::from("Segment line with fewer than 3 fields"));
    }
    let id = fields[1].parse::<usize>().map_err(
        |_| format!("Invalid segment name {} (only integer names are supported)", fields[1])
    )?;
    if fields[2] != "*" {
        return Ok((id, fields[2].len()));
    }
    for field in fields[3..].iter() {
        if let Some(value) = field.strip_prefix("LN:i:") {
            let len = value.parse::<usize>().map_err(|_| format!("Invalid segment length {}", value))?;
            return Ok((id, len));
        }
    }
    Err(format!("Segment {} has no sequence and no LN tag", id))
}

fn parse_link(fields: &[&str]) -> Result<(Visit, Visit), String> {
    if fields.len() < 6 {
        return Err(String::from("Link line with fewer than 6 fields"));
    }
    if fields[5] != "0M" && fields[5] != "*" {
        return Err(format!("Nontrivial link overlap {}", fields[5]));
    }
    let from = parse_link_end(fields[1], fields[2])?;
    let to = parse_link_end(fields[3], fields[4])?;
    Ok((from, to))
}

fn parse_link_end(name: &str, orientation: &str) -> Result<Visit, String> {
    let id = name.parse::<usize>().map_err(
        |_| format!("Invalid segment name {} (only integer names are supported)", name)
    )?;
    match orientation {
        "+" => Ok(Visit::forward(id)),
        "-" => Ok(Visit::reverse(id)),
        _ => Err(format!("Invalid orientation {}", orientation)),
    }
}

/// Writes the graph in the GFA format.
///
/// Sequences are not stored in the graph, so segments are written with `*`
/// and an `LN:i:` tag.
pub fn write_gfa<T: Write>(graph: &HashGraph, output: &mut T) -> io::Result<()> {
    output.write_all(b"H\tVN:Z:1.1\n")?;
    for id in graph.node_ids() {
        output.write_all(
            format!("S\t{}\t*\tLN:i:{}\n", id, graph.node_len(id).unwrap()).as_bytes()
        )?;
    }
    for id in graph.node_ids() {
        for orientation in [Orientation::Forward, Orientation::Reverse] {
            let from = Visit::new(id, orientation);
            for to in graph.follow_edges(from) {
                if support::edge_is_canonical((from.id, from.orientation), (to.id, to.orientation)) {
                    output.write_all(format!(
                        "L\t{}\t{}\t{}\t{}\t0M\n",
                        from.id, orientation_char(from.orientation),
                        to.id, orientation_char(to.orientation)
                    ).as_bytes())?;
                }
            }
        }
    }
    Ok(())
}

fn orientation_char(orientation: Orientation) -> char {
    match orientation {
        Orientation::Forward => '+',
        Orientation::Reverse => '-',
    }
}

//-----------------------------------------------------------------------------

/// Reads a snarl decomposition file.
///
/// Empty lines and lines starting with `#` are ignored.
pub fn read_snarls<R: BufRead>(input: &mut R) -> Result<SnarlManager, String> {
    let mut manager = SnarlManager::new();
    let mut line_num = 0;
    for line in input.lines() {
        line_num += 1;
        let line = line.map_err(|x| format!("Line {}: {}", line_num, x))?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields[0] != "C" {
            return Err(format!("Line {}: Unknown record type {}", line_num, fields[0]));
        }
        if fields.len() < 4 {
            return Err(format!("Line {}: A chain needs a parent and at least 2 boundary visits", line_num));
        }

        let parent = if fields[1] == "." {
            None
        } else {
            let start = parse_packed_visit(fields[1]).map_err(|x| format!("Line {}: {}", line_num, x))?;
            let snarl_id = manager.snarl_with_start(start).ok_or(
                format!("Line {}: Unknown parent snarl starting with {}", line_num, start)
            )?;
            Some(manager.snarl(snarl_id))
        };

        let mut boundaries: Vec<Visit> = Vec::with_capacity(fields.len() - 2);
        for field in fields[2..].iter() {
            boundaries.push(parse_packed_visit(field).map_err(|x| format!("Line {}: {}", line_num, x))?);
        }
        manager.add_chain(parent, &boundaries).map_err(|x| format!("Line {}: {}", line_num, x))?;
    }
    Ok(manager)
}

fn parse_packed_visit(field: &str) -> Result<Visit, String> {
    let value = field.parse::<i64>().map_err(|_| format!("Invalid packed visit {}", field))?;
    if value == 0 {
        return Err(String::from("0 is not a valid packed visit"));
    }
    Ok(Visit::decode(value))
}

/// Writes the snarl decomposition in the format read by [`read_snarls`].
pub fn write_snarls<T: Write>(manager: &SnarlManager, output: &mut T) -> io::Result<()> {
    for chain_id in 0..manager.num_chains() {
        let mut buffer = String::from("C\t");
        match manager.parent_of(chain_id) {
            Some(snarl_id) => buffer.push_str(&manager.snarl(snarl_id).start.encode().to_string()),
            None => buffer.push('.'),
        }
        for visit in manager.chain_boundaries(chain_id) {
            buffer.push('\t');
            buffer.push_str(&visit.encode().to_string());
        }
        buffer.push('\n');
        output.write_all(buffer.as_bytes())?;
    }
    Ok(())
}

//-----------------------------------------------------------------------------

/// Parses a position given as `node:offset` or `node:offset:+` /
/// `node:offset:-`.
pub fn parse_position(field: &str) -> Result<Position, String> {
    let parts: Vec<&str> = field.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("Invalid position {} (expected node:offset[:+/-])", field));
    }
    let id = parts[0].parse::<usize>().map_err(|_| format!("Invalid node id {}", parts[0]))?;
    let offset = parts[1].parse::<usize>().map_err(|_| format!("Invalid offset {}", parts[1]))?;
    let orientation = match parts.get(2) {
        None | Some(&"+") => Orientation::Forward,
        Some(&"-") => Orientation::Reverse,
        Some(other) => return Err(format!("Invalid orientation {}", other)),
    };
    Ok(Position::new(id, offset, orientation))
}

//-----------------------------------------------------------------------------
