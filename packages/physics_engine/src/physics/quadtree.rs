//! Region quadtree over bounding boxes.
//!
//! Each entry lives in the deepest node whose bounds fully contain it, so boxes straddling a split
//! line stay in the parent. A query visits every node whose bounds intersect the query box and
//! tests the entries stored there. Entries that do not fit inside the root at all are kept in the
//! root, so nothing is ever lost, just tested more often.

use super::{
    aa_box::AaBox,
    entity::EntityId,
};


/// Quadtree spatial index. Nodes are stored in a flat arena and reused across `clear` calls.
#[derive(Debug, Clone)]
pub struct QuadTree {
    bounds: AaBox,
    node_capacity: usize,
    max_depth: u32,
    nodes: Vec<Node>,
    len: usize,
}

#[derive(Debug, Clone)]
struct Node {
    bounds: AaBox,
    depth: u32,
    entries: Vec<(EntityId, AaBox)>,
    // index of the first of four consecutive child nodes
    children: Option<usize>,
}

impl Node {
    fn new(bounds: AaBox, depth: u32) -> Self {
        Node {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }
}

impl QuadTree {
    /// Construct empty, covering `bounds`.
    ///
    /// A node splits into quadrants when it holds more than `node_capacity` entries, unless it is
    /// already `max_depth` deep.
    pub fn new(bounds: AaBox, node_capacity: usize, max_depth: u32) -> Self {
        QuadTree {
            bounds,
            node_capacity: node_capacity.max(1),
            max_depth,
            nodes: vec![Node::new(bounds, 0)],
            len: 0,
        }
    }

    pub fn bounds(&self) -> AaBox {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0].entries.clear();
        self.nodes[0].children = None;
        self.len = 0;
    }

    /// Insert an entry.
    pub fn insert(&mut self, id: EntityId, bbox: AaBox) {
        if !self.bounds.contains_box(bbox) {
            debug!(id, ?bbox, "entity bounding box extends outside the world extent");
        }
        self.len += 1;

        let mut n = 0;
        loop {
            if let Some(first) = self.nodes[n].children {
                if let Some(c) = (first..first + 4).find(|&c| self.nodes[c].bounds.contains_box(bbox)) {
                    n = c;
                    continue;
                }
                self.nodes[n].entries.push((id, bbox));
                return;
            }

            self.nodes[n].entries.push((id, bbox));
            if self.nodes[n].entries.len() > self.node_capacity
                && self.nodes[n].depth < self.max_depth
            {
                self.split(n);
            }
            return;
        }
    }

    // subdivide a leaf and push down the entries that fit in a quadrant
    fn split(&mut self, n: usize) {
        let first = self.nodes.len();
        let depth = self.nodes[n].depth + 1;
        for quad in self.nodes[n].bounds.quadrants() {
            self.nodes.push(Node::new(quad, depth));
        }
        self.nodes[n].children = Some(first);

        let entries = std::mem::take(&mut self.nodes[n].entries);
        for (id, bbox) in entries {
            match (first..first + 4).find(|&c| self.nodes[c].bounds.contains_box(bbox)) {
                Some(c) => self.nodes[c].entries.push((id, bbox)),
                None => self.nodes[n].entries.push((id, bbox)),
            }
        }

        // everything may have landed in one quadrant
        for c in first..first + 4 {
            if self.nodes[c].entries.len() > self.node_capacity && depth < self.max_depth {
                self.split(c);
            }
        }
    }

    /// Ids of all entries whose box intersects `bbox`, in no particular order.
    pub fn query(&self, bbox: AaBox) -> Vec<EntityId> {
        let mut found = Vec::new();
        self.query_into(bbox, &mut found);
        found
    }

    /// Like `query`, but appends to `found`.
    pub fn query_into(&self, bbox: AaBox, found: &mut Vec<EntityId>) {
        let mut stack = vec![0];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            found.extend(node.entries.iter()
                .filter(|&&(_, entry)| entry.intersects(bbox))
                .map(|&(id, _)| id));
            if let Some(first) = node.children {
                stack.extend((first..first + 4)
                    .filter(|&c| self.nodes[c].bounds.intersects(bbox)));
            }
        }
    }
}


#[cfg(test)]
fn random_boxes(seed: u64, count: usize, spread: f64, max_half: f64) -> Vec<AaBox> {
    use rand::prelude::*;
    use vek::*;

    let mut rng = rand_pcg::Pcg64Mcg::seed_from_u64(seed);
    (0..count)
        .map(|_| AaBox::around(
            [rng.gen_range(-spread..spread), rng.gen_range(-spread..spread)],
            Extent2::new(rng.gen_range(0.01..max_half), rng.gen_range(0.01..max_half)),
        ))
        .collect()
}

#[test]
fn query_matches_brute_force() {
    for seed in 0..8 {
        let boxes = random_boxes(seed, 300, 500.0, 40.0);
        let mut tree = QuadTree::new(AaBox::centered_square(1000.0), 4, 10);
        for (i, &bbox) in boxes.iter().enumerate() {
            tree.insert(i as EntityId, bbox);
        }
        assert_eq!(tree.len(), boxes.len());

        for &q in &boxes {
            let mut got = tree.query(q);
            got.sort_unstable();
            let expected = boxes.iter().enumerate()
                .filter(|(_, b)| b.intersects(q))
                .map(|(i, _)| i as EntityId)
                .collect::<Vec<_>>();
            assert_eq!(got, expected);
        }
    }
}

#[test]
fn out_of_bounds_entries_are_kept() {
    let mut tree = QuadTree::new(AaBox::centered_square(10.0), 1, 4);
    let outside = AaBox::centered_square(1.0).translate([50.0, 50.0]);
    tree.insert(1, outside);
    tree.insert(2, AaBox::centered_square(1.0));
    tree.insert(3, AaBox::centered_square(1.0).translate([5.0, 5.0]));
    assert_eq!(tree.query(outside), vec![1]);
}

#[test]
fn clear_resets() {
    let mut tree = QuadTree::new(AaBox::centered_square(100.0), 1, 8);
    for (i, bbox) in random_boxes(42, 50, 90.0, 5.0).into_iter().enumerate() {
        tree.insert(i as EntityId, bbox);
    }
    tree.clear();
    assert!(tree.is_empty());
    assert!(tree.query(AaBox::centered_square(100.0)).is_empty());
}
