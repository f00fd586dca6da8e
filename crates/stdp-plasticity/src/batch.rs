// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parallel delivery to many connections sharing one target history
//!
//! Each connection is owned exclusively by one rayon task while the target's
//! history is read concurrently through `&H`. Connections commit independently:
//! a failing connection is left unchanged and does not stop the others.

use rayon::prelude::*;
use tracing::{debug, error};

use crate::error::{ConfigurationError, Result};
use crate::event_driven::{EventDrivenUpdater, PreSynapticSpike};
use crate::host::{OutgoingSpike, SpikeHistory};

#[derive(Debug, Clone, Copy, PartialEq)]
struct BatchEntry {
    connection: EventDrivenUpdater,
    t_lastspike: f64,
}

/// Event-driven connections fanning into one post-synaptic target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionBatch {
    entries: Vec<BatchEntry>,
}

impl ConnectionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection whose previous pre-synaptic spike was at `t_lastspike`
    ///
    /// Returns the connection index.
    pub fn push(&mut self, connection: EventDrivenUpdater, t_lastspike: f64) -> usize {
        self.entries.push(BatchEntry {
            connection,
            t_lastspike,
        });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EventDrivenUpdater> {
        self.entries.get(index).map(|entry| &entry.connection)
    }

    pub fn connections(&self) -> impl Iterator<Item = &EventDrivenUpdater> {
        self.entries.iter().map(|entry| &entry.connection)
    }

    /// Register every connection as a reader of `history`
    pub fn register_all<H>(&self, history: &H)
    where
        H: SpikeHistory + ?Sized,
    {
        for entry in &self.entries {
            entry.connection.check_connection(history, entry.t_lastspike);
        }
    }

    /// Deliver `(connection index, t_spike)` arrivals in parallel
    ///
    /// Arrivals for one connection are processed in the order given. Outgoing
    /// spikes come back in connection order. If any connection fails, the first
    /// error in connection order is returned once all connections have run.
    pub fn deliver<H>(
        &mut self,
        arrivals: &[(usize, f64)],
        history: &H,
    ) -> Result<Vec<(usize, OutgoingSpike)>>
    where
        H: SpikeHistory + Sync + ?Sized,
    {
        let mut per_connection: Vec<Vec<f64>> = vec![Vec::new(); self.entries.len()];
        for &(index, t_spike) in arrivals {
            per_connection
                .get_mut(index)
                .ok_or(ConfigurationError::UnknownConnection(index))?
                .push(t_spike);
        }

        let results: Vec<Result<Vec<OutgoingSpike>>> = self
            .entries
            .par_iter_mut()
            .zip(per_connection.par_iter())
            .map(|(entry, times)| deliver_one(entry, times, history))
            .collect();

        let mut outgoing = Vec::with_capacity(arrivals.len());
        let mut first_error = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(spikes) => outgoing.extend(spikes.into_iter().map(|spike| (index, spike))),
                Err(err) => {
                    error!(connection = index, %err, "Connection rejected spike delivery");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        debug!(
            connections = self.entries.len(),
            arrivals = arrivals.len(),
            "Delivered pre-synaptic spikes"
        );
        Ok(outgoing)
    }
}

fn deliver_one<H>(entry: &mut BatchEntry, times: &[f64], history: &H) -> Result<Vec<OutgoingSpike>>
where
    H: SpikeHistory + ?Sized,
{
    let mut connection = entry.connection;
    let mut t_lastspike = entry.t_lastspike;
    let mut spikes = Vec::with_capacity(times.len());
    for &t_spike in times {
        let spike = PreSynapticSpike {
            t_spike,
            t_lastspike,
            multiplicity: 1,
        };
        connection.send(spike, history, &mut spikes)?;
        t_lastspike = t_spike;
    }
    entry.connection = connection;
    entry.t_lastspike = t_lastspike;
    Ok(spikes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TripletParameters;
    use crate::ConnectionSettings;

    fn batch(n: usize) -> ConnectionBatch {
        let mut batch = ConnectionBatch::new();
        for i in 0..n {
            let connection = EventDrivenUpdater::new(
                TripletParameters::default(),
                1.0 + i as f64,
                ConnectionSettings::default(),
            )
            .unwrap();
            batch.push(connection, 0.0);
        }
        batch
    }

    #[test]
    fn test_matches_sequential_delivery() {
        let history = vec![4.0, 12.0, 30.0];
        let mut parallel = batch(8);
        let mut sequential = parallel.clone();

        let arrivals: Vec<(usize, f64)> = (0..8).flat_map(|i| [(i, 10.0), (i, 25.0)]).collect();
        let spikes = parallel.deliver(&arrivals, &history).unwrap();
        assert_eq!(spikes.len(), 16);

        for entry in sequential.entries.iter_mut() {
            deliver_one(entry, &[10.0, 25.0], &history).unwrap();
        }
        for (a, b) in parallel.connections().zip(sequential.connections()) {
            assert_eq!(a.state(), b.state());
        }
        // connection order is preserved
        assert!(spikes.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_failing_connection_left_unchanged() {
        let history: Vec<f64> = Vec::new();
        let mut batch = batch(3);
        let before = batch.clone();
        // connection 1 sees time run backwards
        let arrivals = [(0, 5.0), (1, 5.0), (1, 2.0), (2, 5.0)];
        let err = batch.deliver(&arrivals, &history).unwrap_err();
        assert!(err.is_fatal());

        assert_eq!(batch.get(1), before.get(1));
        assert_ne!(batch.get(0), before.get(0));
        assert_ne!(batch.get(2), before.get(2));
    }

    #[test]
    fn test_unknown_index_rejected() {
        let history: Vec<f64> = Vec::new();
        let mut batch = batch(1);
        assert!(batch.deliver(&[(3, 1.0)], &history).is_err());
    }
}
