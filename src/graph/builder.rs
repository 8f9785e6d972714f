use rust_decimal::Decimal;

use super::types::RateEdge;
use crate::errors::Result;

/// Index of an edge in the table arena. Chains store these instead of
/// edge copies, so the single `active` bit per edge is shared.
pub type EdgeId = usize;

/// Deduplicated collection of rate edges, at most one per unordered
/// currency pair.
///
/// Edges live in insertion order and are addressed by index; insertion
/// order is the iteration order everywhere, which keeps the route search
/// deterministic for a given input.
#[derive(Debug, Default)]
pub struct RateTable {
    edges: Vec<RateEdge>,
}

impl RateTable {
    pub fn new() -> Self {
        Self { edges: Vec::new() }
    }

    /// Table holding the single identity edge used when the source and
    /// target currencies coincide.
    pub fn identity(currency: &str) -> Result<Self> {
        let mut table = Self::new();
        table
            .edges
            .push(RateEdge::new(currency, currency, Decimal::ONE)?);
        Ok(table)
    }

    /// Merge one input record into the table.
    ///
    /// Self-conversions are dropped. A record for an already-known
    /// unordered pair updates the matching direction of the existing edge
    /// in place; rates only ever move up (see [`RateEdge::set_rate`]).
    pub fn add_record(&mut self, from: &str, to: &str, rate: Decimal) -> Result<()> {
        if from == to {
            tracing::trace!("ignoring self-conversion record for {}", from);
            return Ok(());
        }

        if let Some(edge) = self
            .edges
            .iter_mut()
            .find(|e| e.touches(from) && e.touches(to))
        {
            // direction_from cannot miss here: the edge touches `from`.
            if let Some(direction) = edge.direction_from(from) {
                edge.set_rate(direction, rate)?;
            }
            return Ok(());
        }

        self.edges.push(RateEdge::new(from, to, rate)?);
        Ok(())
    }

    pub fn edge(&self, id: EdgeId) -> &RateEdge {
        &self.edges[id]
    }

    pub fn deactivate(&mut self, id: EdgeId) {
        self.edges[id].deactivate();
    }

    pub fn any_active(&self) -> bool {
        self.edges.iter().any(|e| e.is_active())
    }

    /// Ids of the still-active edges involving `currency`, in insertion
    /// order.
    pub fn active_edges_touching(&self, currency: &str) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_active() && e.touches(currency))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_self_conversion_is_dropped() {
        let mut table = RateTable::new();
        table.add_record("EUR", "EUR", dec!(1.5)).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_pair_merges_into_one_edge() {
        let mut table = RateTable::new();
        table.add_record("EUR", "USD", dec!(1.1)).unwrap();
        table.add_record("USD", "EUR", dec!(0.5)).unwrap();
        table.add_record("EUR", "USD", dec!(1.2)).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_merge_keeps_the_larger_rate_per_direction() {
        let mut table = RateTable::new();
        table.add_record("EUR", "USD", dec!(1.1)).unwrap();
        // Reversed orientation maps onto the backward slot of the same
        // edge; 0.9 < 0.9091 (the derived inverse) so it is ignored.
        table.add_record("USD", "EUR", dec!(0.9)).unwrap();
        assert_eq!(table.edge(0).rate_from("EUR").unwrap(), dec!(1.1));
        assert_eq!(table.edge(0).rate_from("USD").unwrap(), dec!(0.9091));

        // A genuinely better backward quote does land.
        table.add_record("USD", "EUR", dec!(0.95)).unwrap();
        assert_eq!(table.edge(0).rate_from("USD").unwrap(), dec!(0.95));
        assert_eq!(table.edge(0).rate_from("EUR").unwrap(), dec!(1.1));
    }

    #[test]
    fn test_active_edges_in_insertion_order() {
        let mut table = RateTable::new();
        table.add_record("AUD", "CHF", dec!(0.9661)).unwrap();
        table.add_record("EUR", "CHF", dec!(1.2053)).unwrap();
        table.add_record("CHF", "JPY", dec!(120.0)).unwrap();
        assert_eq!(table.active_edges_touching("CHF"), vec![0, 1, 2]);

        table.deactivate(1);
        assert_eq!(table.active_edges_touching("CHF"), vec![0, 2]);
        assert!(table.any_active());
    }

    #[test]
    fn test_identity_table() {
        let table = RateTable::identity("EUR").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.edge(0).rate_from("EUR").unwrap(), dec!(1));
        assert_eq!(table.edge(0).other("EUR"), Some("EUR"));
    }
}
