use std::collections::HashMap;

use crate::domain::demand_profile::DemandProfile;
use crate::domain::server_type::{ACTIVE_LEVEL, ServerTypes};

/// Node `u(i, k)`: server type `i` at the start of breakpoint `k`. `k == N` is the horizon end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub server_type: usize,
    pub breakpoint: usize,
}

pub fn u(server_type: usize, breakpoint: usize) -> NodeId {
    NodeId { server_type, breakpoint }
}

/// Commodity 1 are serving servers, commodity 2 are idle ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commodity {
    Serving,
    Idle,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub tail: NodeId,
    pub head: NodeId,
    pub level: usize,
    pub cost: f64,
    pub capacity: f64,
    pub flow: f64,
}

impl Edge {
    pub fn commodity(&self) -> Commodity {
        if self.level == ACTIVE_LEVEL { Commodity::Serving } else { Commodity::Idle }
    }

    /// Flow of serving servers.
    pub fn flow1(&self) -> f64 {
        match self.commodity() {
            Commodity::Serving => self.flow,
            Commodity::Idle => 0.0,
        }
    }

    /// Flow of idle servers.
    pub fn flow2(&self) -> f64 {
        match self.commodity() {
            Commodity::Idle => self.flow,
            Commodity::Serving => 0.0,
        }
    }
}

/// Time-expanded network of a server farm.
///
/// Each type `i` forms a layer of nodes `u(i, 0..=N)`. All `m_i` servers enter at `u(i, 0)` and
/// leave at `u(i, N)`. Between consecutive nodes an active edge carries serving servers at the
/// running cost of level 0. For every idle level `j` and every pair `k < p` an idle edge carries
/// servers resting in `j` from `t[k]` to `t[p]`; it includes the power-up energy of `j` unless it
/// ends at the horizon.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    pub edges: Vec<Edge>,
    supplies: HashMap<NodeId, f64>,
    active_edges: HashMap<(usize, usize), usize>,
    num_server_types: usize,
    num_breakpoints: usize,
}

impl FlowNetwork {
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.num_server_types).flat_map(move |i| (0..=self.num_breakpoints).map(move |k| u(i, k)))
    }

    /// Net supply of a node: positive at sources, negative at sinks.
    pub fn supply(&self, node: NodeId) -> f64 {
        self.supplies.get(&node).copied().unwrap_or(0.0)
    }

    pub fn num_server_types(&self) -> usize {
        self.num_server_types
    }

    pub fn num_breakpoints(&self) -> usize {
        self.num_breakpoints
    }

    pub fn active_edge_index(&self, i: usize, k: usize) -> usize {
        self.active_edges[&(i, k)]
    }

    /// Active edge `u(i, k) -> u(i, k + 1)`.
    pub fn active_edge(&self, i: usize, k: usize) -> &Edge {
        &self.edges[self.active_edge_index(i, k)]
    }

    pub fn total_cost(&self) -> f64 {
        self.edges.iter().map(|edge| edge.cost * edge.flow).sum()
    }

    pub fn reset_flows(&mut self) {
        for edge in self.edges.iter_mut() {
            edge.flow = 0.0;
        }
    }
}

pub fn construct_network(server_types: &ServerTypes, demand_profile: &DemandProfile) -> FlowNetwork {
    let n = demand_profile.len();
    let mut edges = Vec::new();
    let mut supplies = HashMap::new();
    let mut active_edges = HashMap::new();

    for (i, server_type) in server_types.iter().enumerate() {
        let units = server_type.max_units() as f64;

        supplies.insert(u(i, 0), units);
        supplies.insert(u(i, n), -units);

        for k in 0..n {
            active_edges.insert((i, k), edges.len());
            edges.push(Edge {
                tail: u(i, k),
                head: u(i, k + 1),
                level: ACTIVE_LEVEL,
                cost: server_type.rate(ACTIVE_LEVEL) * demand_profile.duration(k),
                capacity: units,
                flow: 0.0,
            });
        }

        for j in server_type.idle_levels() {
            for k in 0..n {
                for p in k + 1..=n {
                    let power_up = if p < n { server_type.power_up_energy(j) } else { 0.0 };

                    edges.push(Edge {
                        tail: u(i, k),
                        head: u(i, p),
                        level: j,
                        cost: server_type.rate(j) * demand_profile.span(k, p) + power_up,
                        capacity: units,
                        flow: 0.0,
                    });
                }
            }
        }
    }

    log::debug!("Constructed flow network with {} edges for {} server types over {} breakpoints.", edges.len(), server_types.len(), n);

    FlowNetwork { edges, supplies, active_edges, num_server_types: server_types.len(), num_breakpoints: n }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::server_type::{PowerState, ServerType};
    use crate::domain::utils::id::ServerTypeName;

    #[test]
    fn edge_layout_and_costs() {
        let server_type = ServerType::new(ServerTypeName::new("a"), 2.0, vec![PowerState::new(0.5, 3.0)], 4).unwrap();
        let server_types = ServerTypes::new(vec![server_type]).unwrap();
        let profile = DemandProfile::new(vec![0.0, 1.0, 3.0], vec![1.0, 1.0]).unwrap();

        let network = construct_network(&server_types, &profile);

        // Two active edges plus idle edges (0,1), (0,2), (1,2).
        assert_eq!(network.edges.len(), 5);
        assert_eq!(network.active_edge(0, 1).cost, 4.0);
        assert_eq!(network.active_edge(0, 1).commodity(), Commodity::Serving);
        assert_eq!(network.supply(u(0, 0)), 4.0);
        assert_eq!(network.supply(u(0, 2)), -4.0);
        assert_eq!(network.supply(u(0, 1)), 0.0);

        let idle: Vec<(usize, usize, f64)> =
            network.edges.iter().filter(|edge| edge.commodity() == Commodity::Idle).map(|edge| (edge.tail.breakpoint, edge.head.breakpoint, edge.cost)).collect();

        // Resting until the horizon end needs no power-up.
        assert_eq!(idle, vec![(0, 1, 3.5), (0, 2, 1.5), (1, 2, 1.0)]);
    }
}
