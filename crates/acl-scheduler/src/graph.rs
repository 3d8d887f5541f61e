//! Minimal directed-graph contract and acyclicity check

use std::collections::VecDeque;

/// Directed graph over vertices `0..order()`
pub trait Graph {
    /// Number of vertices
    fn order(&self) -> usize;

    /// Call `f` for every successor of `v` until it returns `true`.
    ///
    /// Returns `true` if the enumeration was aborted.
    fn visit(&self, v: usize, f: &mut dyn FnMut(usize) -> bool) -> bool;
}

/// Topological order by Kahn's algorithm, or `None` if the graph has a cycle
pub fn topological_order<G: Graph + ?Sized>(graph: &G) -> Option<Vec<usize>> {
    let order = graph.order();
    let mut in_degree = vec![0usize; order];
    for v in 0..order {
        graph.visit(v, &mut |w| {
            if let Some(deg) = in_degree.get_mut(w) {
                *deg += 1;
            }
            false
        });
    }

    let mut queue: VecDeque<usize> = (0..order).filter(|&v| in_degree[v] == 0).collect();
    let mut result = Vec::with_capacity(order);

    while let Some(v) = queue.pop_front() {
        result.push(v);
        graph.visit(v, &mut |w| {
            if let Some(deg) = in_degree.get_mut(w) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(w);
                }
            }
            false
        });
    }

    (result.len() == order).then_some(result)
}

/// Check that `graph` has no directed cycle
pub fn is_acyclic<G: Graph + ?Sized>(graph: &G) -> bool {
    topological_order(graph).is_some()
}
