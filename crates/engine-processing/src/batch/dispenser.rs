use model::{
    error::ModelError,
    records::{row::RowData, source::RowSource},
};
use std::sync::{
    Condvar, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};
use tracing::{debug, warn};

/// A contiguous run of source rows handed to one batch builder.
#[derive(Debug)]
pub struct Claim {
    pub ticket: u64,
    /// Offset of `rows[0]` within the source.
    pub first_row: u64,
    pub rows: Vec<RowData>,
}

struct DispenserState {
    source: Box<dyn RowSource>,
    /// Ticket allowed to pull next.
    next_ticket: u64,
    /// Rows handed out so far.
    position: u64,
    aborted: bool,
}

/// Hands out slices of a one-pass row source in strict ticket order.
///
/// Ticket `n` may only pull once tickets `0..n` have pulled, so the slice a
/// builder gets depends on its ticket and never on which thread runs first.
/// Pulling happens under the lock; conversion happens after it is released.
pub struct RowDispenser {
    state: Mutex<DispenserState>,
    turn: Condvar,
    exhausted: AtomicBool,
}

impl RowDispenser {
    pub fn new(source: Box<dyn RowSource>) -> Self {
        Self {
            state: Mutex::new(DispenserState {
                source,
                next_ticket: 0,
                position: 0,
                aborted: false,
            }),
            turn: Condvar::new(),
            exhausted: AtomicBool::new(false),
        }
    }

    /// True once a claim has observed the end of the source, or the
    /// dispenser failed or was aborted.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }

    /// Waits for `ticket`'s turn and pulls up to `max_rows` rows.
    ///
    /// After exhaustion or abort every claim returns immediately with no rows.
    /// A source error ends the run for all later tickets too.
    pub fn claim(&self, ticket: u64, max_rows: usize) -> Result<Claim, ModelError> {
        let mut state = self.lock()?;
        while state.next_ticket != ticket && !state.aborted && !self.is_exhausted() {
            state = self
                .turn
                .wait(state)
                .map_err(|_| ModelError::Source("row dispenser lock poisoned".into()))?;
        }

        let first_row = state.position;
        if state.aborted || self.is_exhausted() {
            return Ok(Claim {
                ticket,
                first_row,
                rows: Vec::new(),
            });
        }

        let mut rows = Vec::with_capacity(max_rows);
        let mut failure = None;
        while rows.len() < max_rows {
            match state.source.next_row() {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => {
                    debug!(ticket, rows = state.position + rows.len() as u64, "Row source exhausted");
                    self.exhausted.store(true, Ordering::Release);
                    break;
                }
                Err(err) => {
                    warn!(ticket, error = %err, "Row source failed");
                    self.exhausted.store(true, Ordering::Release);
                    failure = Some(err);
                    break;
                }
            }
        }

        state.position += rows.len() as u64;
        state.next_ticket = ticket + 1;
        drop(state);
        self.turn.notify_all();

        match failure {
            Some(err) => Err(err),
            None => Ok(Claim {
                ticket,
                first_row,
                rows,
            }),
        }
    }

    /// Releases every waiting and future claim with an empty slice.
    pub fn abort(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.aborted = true;
        }
        self.exhausted.store(true, Ordering::Release);
        self.turn.notify_all();
    }

    fn lock(&self) -> Result<MutexGuard<'_, DispenserState>, ModelError> {
        self.state
            .lock()
            .map_err(|_| ModelError::Source("row dispenser lock poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        core::{data_type::SourceType, value::Value},
        records::{
            source::TableSchema,
            table::{Series, Table},
        },
    };
    use std::{sync::Arc, thread};

    fn source(n: i64) -> Box<dyn RowSource> {
        let values = (0..n).map(Value::Int).collect();
        let table = Table::new(vec![Series::new("id", SourceType::Int64, values)]).unwrap();
        Box::new(table.into_rows())
    }

    fn ids(claim: &Claim) -> Vec<i64> {
        claim
            .rows
            .iter()
            .map(|r| match r.get_value("id") {
                Value::Int(v) => v,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_sequential_claims() {
        let dispenser = RowDispenser::new(source(5));
        let first = dispenser.claim(0, 2).unwrap();
        let second = dispenser.claim(1, 2).unwrap();
        let third = dispenser.claim(2, 2).unwrap();

        assert_eq!(ids(&first), vec![0, 1]);
        assert_eq!((second.first_row, ids(&second)), (2, vec![2, 3]));
        assert_eq!(ids(&third), vec![4]);
        assert!(dispenser.is_exhausted());
        assert!(dispenser.claim(3, 2).unwrap().rows.is_empty());
    }

    #[test]
    fn test_tickets_are_served_in_order() {
        let dispenser = Arc::new(RowDispenser::new(source(40)));

        // Later tickets start first and must wait for earlier ones.
        let handles: Vec<_> = (0..8u64)
            .rev()
            .map(|ticket| {
                let dispenser = dispenser.clone();
                thread::spawn(move || dispenser.claim(ticket, 5).unwrap())
            })
            .collect();

        let mut claims: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        claims.sort_by_key(|c| c.ticket);

        for claim in &claims {
            let start = claim.ticket as i64 * 5;
            assert_eq!(ids(claim), (start..start + 5).collect::<Vec<_>>());
        }
    }

    struct FailingSource {
        schema: TableSchema,
        emitted: usize,
        fail_at: usize,
    }

    impl RowSource for FailingSource {
        fn schema(&self) -> &TableSchema {
            &self.schema
        }

        fn row_count(&self) -> usize {
            self.fail_at + 1
        }

        fn next_row(&mut self) -> Result<Option<RowData>, ModelError> {
            if self.emitted == self.fail_at {
                return Err(ModelError::Source("disk on fire".into()));
            }
            self.emitted += 1;
            Ok(Some(RowData::new(Vec::new())))
        }
    }

    #[test]
    fn test_source_error_releases_later_tickets() {
        let dispenser = Arc::new(RowDispenser::new(Box::new(FailingSource {
            schema: TableSchema::default(),
            emitted: 0,
            fail_at: 3,
        })));

        let waiter = {
            let dispenser = dispenser.clone();
            thread::spawn(move || dispenser.claim(1, 10))
        };

        assert!(dispenser.claim(0, 10).is_err());
        assert!(waiter.join().unwrap().unwrap().rows.is_empty());
        assert!(dispenser.is_exhausted());
    }

    #[test]
    fn test_abort_wakes_waiters() {
        let dispenser = Arc::new(RowDispenser::new(source(10)));
        let waiter = {
            let dispenser = dispenser.clone();
            thread::spawn(move || dispenser.claim(5, 2).unwrap())
        };

        dispenser.abort();
        assert!(waiter.join().unwrap().rows.is_empty());
    }
}
