use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::builder::{EdgeId, RateTable};
use crate::errors::{ConvertError, Result};

/// An ordered sequence of rate edges describing one concrete conversion
/// route out of a fixed origin currency.
///
/// Chains hold edge ids, not edge data; branching candidates are plain
/// clones of the id list, so sibling chains share edges (and their single
/// `active` bit) through the table without aliasing each other's route.
#[derive(Debug, Clone)]
pub struct Chain {
    origin: String,
    /// Currency reached after the last edge, updated on every extension.
    frontier: String,
    edges: Vec<EdgeId>,
}

impl Chain {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            frontier: origin.to_string(),
            edges: Vec::new(),
        }
    }

    pub fn frontier(&self) -> &str {
        &self.frontier
    }

    pub fn hop_count(&self) -> usize {
        self.edges.len()
    }

    /// Append an edge to the chain. The edge must involve the current
    /// frontier currency; anything else is an internal consistency bug
    /// surfaced as [`ConvertError::CurrencyMismatch`].
    pub fn extend(&mut self, table: &RateTable, id: EdgeId) -> Result<()> {
        let edge = table.edge(id);
        let next = edge
            .other(&self.frontier)
            .ok_or_else(|| edge.mismatch(&self.frontier))?
            .to_string();
        self.frontier = next;
        self.edges.push(id);
        Ok(())
    }

    /// Amount in the frontier currency after applying every edge in order
    /// to `initial_amount`, each hop rounded before feeding the next.
    pub fn value_of(&self, table: &RateTable, initial_amount: Decimal) -> Result<Decimal> {
        let mut amount = initial_amount;
        let mut current = self.origin.clone();
        for &id in &self.edges {
            let edge = table.edge(id);
            amount = edge.apply(amount, &current)?;
            current = edge
                .other(&current)
                .ok_or_else(|| edge.mismatch(&current))?
                .to_string();
        }
        Ok(amount)
    }

    /// Currency sequence from origin to frontier, for display and logging.
    pub fn currencies(&self, table: &RateTable) -> Result<Vec<String>> {
        let mut path = vec![self.origin.clone()];
        let mut current = self.origin.clone();
        for &id in &self.edges {
            let edge = table.edge(id);
            current = edge
                .other(&current)
                .ok_or_else(|| edge.mismatch(&current))?
                .to_string();
            path.push(current.clone());
        }
        Ok(path)
    }
}

/// The winning conversion route.
#[derive(Debug, Clone)]
pub struct BestRoute {
    /// Currency sequence, source first, target last.
    pub path: Vec<String>,
    pub hops: usize,
    /// Exact accumulated amount before the final integer rounding.
    pub amount: Decimal,
    /// Amount rounded half away from zero to a whole unit.
    pub rounded: i64,
}

impl BestRoute {
    pub fn path_display(&self) -> String {
        self.path.join(" -> ")
    }
}

/// Layered, edge-consuming search for the best conversion route.
///
/// Chains grow one edge per layer; every edge used anywhere in a layer is
/// deactivated once the whole layer has been expanded, so a route class
/// that reaches an edge first claims it for good. That is what makes the
/// search prefer the fewest intermediate conversions, with the best rate
/// only deciding among routes of equal length.
pub struct RouteSearch {
    table: RateTable,
    source: String,
    target: String,
}

impl RouteSearch {
    pub fn new(table: RateTable, source: &str, target: &str) -> Self {
        Self {
            table,
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    /// Run the search and evaluate the surviving chains against
    /// `initial_amount`.
    pub fn run(mut self, initial_amount: Decimal) -> Result<BestRoute> {
        let mut chains = self.seed()?;
        tracing::debug!(
            "seeded {} chains from {} over {} edges",
            chains.len(),
            self.source,
            self.table.len()
        );

        while self.table.any_active() && !chains.iter().any(|c| c.frontier() == self.target) {
            let mut spawned: Vec<Chain> = Vec::new();
            let mut dead: Vec<usize> = Vec::new();
            let mut used: Vec<EdgeId> = Vec::new();

            // Read phase: every chain picks its candidates against the
            // activity flags as they stood at the start of the layer.
            for (i, chain) in chains.iter_mut().enumerate() {
                if chain.frontier() == self.target {
                    continue;
                }

                let candidates = self.table.active_edges_touching(chain.frontier());
                let Some((&last, rest)) = candidates.split_last() else {
                    // Dead end: nothing active touches this frontier.
                    dead.push(i);
                    continue;
                };

                for &id in &candidates {
                    if !used.contains(&id) {
                        used.push(id);
                    }
                }

                // The last candidate extends the chain in place; every
                // other candidate branches off a clone.
                for &id in rest {
                    let mut branch = chain.clone();
                    branch.extend(&self.table, id)?;
                    spawned.push(branch);
                }
                chain.extend(&self.table, last)?;
            }

            for &i in dead.iter().rev() {
                chains.remove(i);
            }
            chains.append(&mut spawned);

            if used.is_empty() {
                break;
            }

            tracing::debug!("layer consumed {} edges, {} chains live", used.len(), chains.len());

            // Mutation phase: only now are the layer's edges consumed.
            for id in used {
                self.table.deactivate(id);
            }
        }

        chains.retain(|c| c.frontier() == self.target);
        if chains.is_empty() {
            return Err(ConvertError::UnreachableTarget);
        }

        let mut scored = Vec::with_capacity(chains.len());
        for chain in &chains {
            scored.push((chain.value_of(&self.table, initial_amount)?, chain));
        }
        let (amount, best) = scored
            .into_iter()
            .max_by(|a, b| a.0.cmp(&b.0))
            .ok_or(ConvertError::UnreachableTarget)?;

        let rounded = amount
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(ConvertError::AmountOverflow)?;
        let path = best.currencies(&self.table)?;

        tracing::info!(
            "best route {} | {} hops | yields {} ({} exact)",
            path.join(" -> "),
            best.hop_count(),
            rounded,
            amount
        );

        Ok(BestRoute {
            hops: best.hop_count(),
            path,
            amount,
            rounded,
        })
    }

    /// One chain per edge touching the source currency; all seed edges
    /// are consumed immediately afterwards.
    fn seed(&mut self) -> Result<Vec<Chain>> {
        let seeds = self.table.active_edges_touching(&self.source);
        let mut chains = Vec::with_capacity(seeds.len());
        for &id in &seeds {
            let mut chain = Chain::new(&self.source);
            chain.extend(&self.table, id)?;
            chains.push(chain);
        }
        for &id in &seeds {
            self.table.deactivate(id);
        }
        Ok(chains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table(records: &[(&str, &str, &str)]) -> RateTable {
        let mut table = RateTable::new();
        for (from, to, rate) in records {
            table.add_record(from, to, rate.parse().unwrap()).unwrap();
        }
        table
    }

    #[test]
    fn test_chain_tracks_frontier() {
        let table = table(&[("EUR", "CHF", "1.2053"), ("AUD", "CHF", "0.9661")]);
        let mut chain = Chain::new("EUR");
        assert_eq!(chain.frontier(), "EUR");
        chain.extend(&table, 0).unwrap();
        assert_eq!(chain.frontier(), "CHF");
        chain.extend(&table, 1).unwrap();
        assert_eq!(chain.frontier(), "AUD");
        assert_eq!(chain.hop_count(), 2);
        assert_eq!(chain.currencies(&table).unwrap(), ["EUR", "CHF", "AUD"]);
    }

    #[test]
    fn test_chain_rejects_edge_off_the_frontier() {
        let table = table(&[("EUR", "CHF", "1.2053"), ("JPY", "KRW", "13.1151")]);
        let mut chain = Chain::new("EUR");
        chain.extend(&table, 0).unwrap();
        let err = chain.extend(&table, 1).unwrap_err();
        assert!(matches!(err, ConvertError::CurrencyMismatch { .. }));
    }

    #[test]
    fn test_chain_value_compounds_rounded_hops() {
        let table = table(&[
            ("EUR", "CHF", "1.2053"),
            ("AUD", "CHF", "0.9661"),
            ("AUD", "JPY", "86.0305"),
        ]);
        let mut chain = Chain::new("EUR");
        chain.extend(&table, 0).unwrap();
        chain.extend(&table, 1).unwrap();
        chain.extend(&table, 2).unwrap();
        // 550 -> 662.915 -> 686.1833 -> 59032.6924
        assert_eq!(chain.value_of(&table, dec!(550)).unwrap(), dec!(59032.6924));
    }

    #[test]
    fn test_cloned_chain_is_independent() {
        let table = table(&[("EUR", "CHF", "1.2053"), ("AUD", "CHF", "0.9661")]);
        let mut chain = Chain::new("EUR");
        chain.extend(&table, 0).unwrap();
        let branch = chain.clone();
        chain.extend(&table, 1).unwrap();
        assert_eq!(chain.frontier(), "AUD");
        assert_eq!(branch.frontier(), "CHF");
        assert_eq!(branch.hop_count(), 1);
    }

    #[test]
    fn test_single_edge_route() {
        let search = RouteSearch::new(table(&[("EUR", "USD", "1.2989")]), "EUR", "USD");
        let route = search.run(dec!(100)).unwrap();
        assert_eq!(route.rounded, 130); // 129.89 rounds up
        assert_eq!(route.path, ["EUR", "USD"]);
        assert_eq!(route.hops, 1);
    }

    #[test]
    fn test_branching_keeps_the_best_equal_length_route() {
        // S-A then A splits toward T through B (x2 then x5) or C (x3 then
        // x4); both routes are 3 hops, the C branch pays more.
        let search = RouteSearch::new(
            table(&[
                ("SRC", "AAA", "1.0"),
                ("AAA", "BBB", "2.0"),
                ("AAA", "CCC", "3.0"),
                ("CCC", "TGT", "4.0"),
                ("BBB", "TGT", "5.0"),
            ]),
            "SRC",
            "TGT",
        );
        let route = search.run(dec!(100)).unwrap();
        assert_eq!(route.rounded, 1200);
        assert_eq!(route.path, ["SRC", "AAA", "CCC", "TGT"]);
    }

    #[test]
    fn test_shorter_route_beats_richer_longer_route() {
        // Two disjoint routes: 2 hops paying x4 total, 3 hops paying
        // x1000 total. The search stops as soon as the short route lands.
        let search = RouteSearch::new(
            table(&[
                ("SRC", "AAA", "2.0"),
                ("AAA", "TGT", "2.0"),
                ("SRC", "CCC", "10.0"),
                ("CCC", "DDD", "10.0"),
                ("DDD", "TGT", "10.0"),
            ]),
            "SRC",
            "TGT",
        );
        let route = search.run(dec!(100)).unwrap();
        assert_eq!(route.rounded, 400);
        assert_eq!(route.hops, 2);
    }

    #[test]
    fn test_four_hop_alternative_is_never_evaluated() {
        // 8-edge table: a modest 3-hop route and a lucrative 4-hop one.
        // The search terminates the layer the 3-hop route completes, so
        // the 4-hop alternative never reaches the target at all.
        let search = RouteSearch::new(
            table(&[
                ("SRC", "AAA", "1.1"),
                ("AAA", "BBB", "1.1"),
                ("BBB", "TGT", "1.1"),
                ("SRC", "CCC", "3.0"),
                ("CCC", "DDD", "3.0"),
                ("DDD", "EEE", "3.0"),
                ("EEE", "TGT", "3.0"),
                ("XXX", "YYY", "5.0"),
            ]),
            "SRC",
            "TGT",
        );
        let route = search.run(dec!(100)).unwrap();
        // 100 -> 110 -> 121 -> 133.1, against 8100 on the pruned route.
        assert_eq!(route.rounded, 133);
        assert_eq!(route.hops, 3);
    }

    #[test]
    fn test_unreachable_target() {
        let search = RouteSearch::new(
            table(&[("EUR", "CHF", "1.2053"), ("JPY", "KRW", "13.1151")]),
            "EUR",
            "JPY",
        );
        assert!(matches!(
            search.run(dec!(550)),
            Err(ConvertError::UnreachableTarget)
        ));
    }

    #[test]
    fn test_no_edge_touches_the_source() {
        let search = RouteSearch::new(table(&[("EUR", "CHF", "1.2053")]), "ZZZ", "CHF");
        assert!(matches!(
            search.run(dec!(1)),
            Err(ConvertError::UnreachableTarget)
        ));
    }

    #[test]
    fn test_identity_table_short_circuit() {
        let search = RouteSearch::new(RateTable::identity("EUR").unwrap(), "EUR", "EUR");
        let route = search.run(dec!(550)).unwrap();
        assert_eq!(route.rounded, 550);
        assert_eq!(route.hops, 1);
    }

    #[test]
    fn test_reference_scenario() {
        let search = RouteSearch::new(
            table(&[
                ("AUD", "CHF", "0.9661"),
                ("JPY", "KRW", "13.1151"),
                ("EUR", "CHF", "1.2053"),
                ("AUD", "JPY", "86.0305"),
                ("EUR", "USD", "1.2989"),
                ("JPY", "INR", "0.6571"),
            ]),
            "EUR",
            "JPY",
        );
        let route = search.run(dec!(550)).unwrap();
        assert_eq!(route.rounded, 59033);
        assert_eq!(route.path, ["EUR", "CHF", "AUD", "JPY"]);
        assert_eq!(route.hops, 3);
    }
}
