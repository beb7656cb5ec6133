//! Packed topology field codec.
//!
//! ```text
//! topology := coords '|' relations '|' ids
//! coords    := (x '*' y '*' z '_')*
//! relations := (i '*' j '_')*        positions into the node list
//! ids       := (id '_')*
//! ```

use hxnet_wire::subfield::{join_list, parse_num, split_list, split_tuple};
use hxnet_wire::subfield::{LIST_TERMINATOR, TUPLE_SEPARATOR};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::warn;

/// Separator between the three segments of a topology field
pub const SEGMENT_SEPARATOR: char = '|';

/// Placement and adjacency of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTopology {
    /// Node id, a key into the separately parsed node list
    pub id: u64,
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
    /// Z coordinate
    pub z: i32,
    /// Ids of nodes this node is connected to
    pub relations: BTreeSet<u64>,
}

impl NodeTopology {
    /// Create a node with no relations
    pub fn new(id: u64, x: i32, y: i32, z: i32) -> Self {
        Self {
            id,
            x,
            y,
            z,
            relations: BTreeSet::new(),
        }
    }
}

/// Structural violations of the topology grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The field does not have exactly three segments
    #[error("expected 3 segments, found {0}")]
    MissingSegment(usize),

    /// A token is not a number
    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    /// A coordinate tuple does not have three members
    #[error("coordinate tuple {0:?} is not x*y*z")]
    CoordinateArity(String),

    /// A relation tuple does not have two members
    #[error("relation tuple {0:?} is not i*j")]
    RelationArity(String),

    /// Coordinate and id segments disagree on the node count
    #[error("{coords} coordinate tuples for {ids} node ids")]
    LengthMismatch {
        /// Number of coordinate tuples
        coords: usize,
        /// Number of node ids
        ids: usize,
    },

    /// A node id is absent from the node list
    #[error("unknown node id {0}")]
    UnknownNode(u64),

    /// A node id appears more than once
    #[error("node id {0} appears more than once")]
    DuplicateNode(u64),

    /// A relation references a position outside the node list
    #[error("position {position} out of range for {count} nodes")]
    PositionOutOfRange {
        /// Referenced position
        position: usize,
        /// Number of nodes
        count: usize,
    },
}

fn num<T: std::str::FromStr>(text: &str) -> Result<T, TopologyError> {
    parse_num(text).map_err(|_| TopologyError::InvalidNumber(text.to_string()))
}

/// Parse a topology field against the ids of the known node list.
pub fn parse(field: &str, known_ids: &HashSet<u64>) -> Result<Vec<NodeTopology>, TopologyError> {
    let segments: Vec<&str> = field.split(SEGMENT_SEPARATOR).collect();
    if segments.len() != 3 {
        return Err(TopologyError::MissingSegment(segments.len()));
    }
    let (coords, relations, ids) = (segments[0], segments[1], segments[2]);

    let ids: Vec<u64> = split_list(ids, LIST_TERMINATOR)
        .into_iter()
        .map(num::<u64>)
        .collect::<Result<_, _>>()?;
    if let Some(unknown) = ids.iter().find(|id| !known_ids.contains(*id)) {
        return Err(TopologyError::UnknownNode(*unknown));
    }
    let mut seen = HashSet::with_capacity(ids.len());
    if let Some(repeated) = ids.iter().find(|id| !seen.insert(**id)) {
        return Err(TopologyError::DuplicateNode(*repeated));
    }

    let coords = split_list(coords, LIST_TERMINATOR);
    if coords.len() != ids.len() {
        return Err(TopologyError::LengthMismatch {
            coords: coords.len(),
            ids: ids.len(),
        });
    }

    let mut nodes = Vec::with_capacity(ids.len());
    for (id, tuple) in ids.iter().zip(coords) {
        let parts = split_tuple(tuple, TUPLE_SEPARATOR);
        if parts.len() != 3 {
            return Err(TopologyError::CoordinateArity(tuple.to_string()));
        }
        nodes.push(NodeTopology::new(
            *id,
            num(parts[0])?,
            num(parts[1])?,
            num(parts[2])?,
        ));
    }

    let count = nodes.len();
    let check = |position: usize| {
        if position < count {
            Ok(position)
        } else {
            Err(TopologyError::PositionOutOfRange { position, count })
        }
    };
    for tuple in split_list(relations, LIST_TERMINATOR) {
        let parts = split_tuple(tuple, TUPLE_SEPARATOR);
        if parts.len() != 2 {
            return Err(TopologyError::RelationArity(tuple.to_string()));
        }
        let from = check(num(parts[0])?)?;
        let to = check(num(parts[1])?)?;
        let target = nodes[to].id;
        nodes[from].relations.insert(target);
    }

    Ok(nodes)
}

/// Encode nodes back into a topology field.
///
/// Relations to ids that are not part of `nodes` cannot be expressed
/// positionally and are dropped.
pub fn generate(nodes: &[NodeTopology]) -> String {
    let positions: HashMap<u64, usize> = nodes
        .iter()
        .enumerate()
        .map(|(pos, node)| (node.id, pos))
        .collect();

    let coords = join_list(
        nodes
            .iter()
            .map(|n| format!("{}{sep}{}{sep}{}", n.x, n.y, n.z, sep = TUPLE_SEPARATOR)),
        LIST_TERMINATOR,
    );

    let mut relations = Vec::new();
    for (from, node) in nodes.iter().enumerate() {
        for target in &node.relations {
            match positions.get(target) {
                Some(to) => relations.push(format!("{}{}{}", from, TUPLE_SEPARATOR, to)),
                None => warn!(
                    "Dropping relation {} -> {}: target is not in the topology",
                    node.id, target
                ),
            }
        }
    }
    let relations = join_list(relations, LIST_TERMINATOR);

    let ids = join_list(nodes.iter().map(|n| n.id.to_string()), LIST_TERMINATOR);

    format!(
        "{}{sep}{}{sep}{}",
        coords,
        relations,
        ids,
        sep = SEGMENT_SEPARATOR
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(ids: &[u64]) -> HashSet<u64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_parse_two_nodes() {
        let nodes = parse("1*2*3_4*5*6_|0*1_|100_200_", &known(&[100, 200])).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, 100);
        assert_eq!((nodes[0].x, nodes[0].y, nodes[0].z), (1, 2, 3));
        assert_eq!(nodes[0].relations, BTreeSet::from([200]));
        assert_eq!(nodes[1].id, 200);
        assert_eq!((nodes[1].x, nodes[1].y, nodes[1].z), (4, 5, 6));
        assert!(nodes[1].relations.is_empty());
    }

    #[test]
    fn test_parse_negative_coordinates_and_shared_source() {
        let nodes = parse(
            "0*0*0_-3*7*1_2*-2*0_|0*1_0*2_2*0_|7_8_9_",
            &known(&[7, 8, 9]),
        )
        .unwrap();

        assert_eq!(nodes[1].x, -3);
        assert_eq!(nodes[0].relations, BTreeSet::from([8, 9]));
        assert_eq!(nodes[2].relations, BTreeSet::from([7]));
    }

    #[test]
    fn test_parse_empty_topology() {
        assert!(parse("||", &known(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        assert_eq!(
            parse("1*1*1_|_|5_", &known(&[6])),
            Err(TopologyError::UnknownNode(5))
        );
    }

    #[test]
    fn test_position_out_of_range_is_rejected() {
        assert_eq!(
            parse("1*2*3_4*5*6_|0*2_|100_200_", &known(&[100, 200])),
            Err(TopologyError::PositionOutOfRange {
                position: 2,
                count: 2
            })
        );
    }

    #[test]
    fn test_unknown_node_checked_before_positions() {
        assert_eq!(
            parse("1*2*3_|0*9_|300_", &known(&[100])),
            Err(TopologyError::UnknownNode(300))
        );
    }

    #[test]
    fn test_repeated_id_is_rejected() {
        assert_eq!(
            parse("1*1*1_2*2*2_3*3*3_|0*1_|100_200_100_", &known(&[100, 200])),
            Err(TopologyError::DuplicateNode(100))
        );
    }

    #[test]
    fn test_malformed_fields() {
        let ids = known(&[1, 2]);
        assert_eq!(parse("", &ids), Err(TopologyError::MissingSegment(1)));
        assert_eq!(
            parse("1*1_|_|1_", &ids),
            Err(TopologyError::CoordinateArity("1*1".to_string()))
        );
        assert_eq!(
            parse("1*1*1_|0_|1_", &ids),
            Err(TopologyError::RelationArity("0".to_string()))
        );
        assert_eq!(
            parse("1*1*1_|_|1_2_", &ids),
            Err(TopologyError::LengthMismatch { coords: 1, ids: 2 })
        );
        assert_eq!(
            parse("1*a*1_|_|1_", &ids),
            Err(TopologyError::InvalidNumber("a".to_string()))
        );
    }

    #[test]
    fn test_generate_terminates_every_member() {
        let mut a = NodeTopology::new(100, 1, 2, 3);
        a.relations.insert(200);
        let b = NodeTopology::new(200, 4, 5, 6);

        assert_eq!(generate(&[a, b]), "1*2*3_4*5*6_|0*1_|100_200_");
        assert_eq!(generate(&[]), "||");
    }

    #[test]
    fn test_generate_drops_dangling_relations() {
        let mut a = NodeTopology::new(1, 0, 0, 0);
        a.relations.insert(99);
        assert_eq!(generate(&[a]), "0*0*0_||1_");
    }

    #[test]
    fn test_parse_generate_roundtrip() {
        let mut nodes = vec![
            NodeTopology::new(10, 1, 1, 1),
            NodeTopology::new(20, 2, 0, -1),
            NodeTopology::new(30, 5, 5, 5),
            NodeTopology::new(40, 0, 9, 0),
        ];
        nodes[0].relations.extend([20, 30]);
        nodes[2].relations.extend([40, 10]);
        nodes[3].relations.insert(20);

        let ids: HashSet<u64> = nodes.iter().map(|n| n.id).collect();
        let parsed = parse(&generate(&nodes), &ids).unwrap();

        assert_eq!(parsed, nodes);
    }
}
