//! K-way run merger.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::prelude::*;
use std::sync::atomic::AtomicBool;

use crate::error::{ensure_not_cancelled, IntegrityError, SortError};
use crate::line::Line;
use crate::run::{RunCursor, RunFormat, RunWriter};
use crate::sink::OutputSink;

/// Binary heap merger of sorted runs.
/// The heap holds the head line of every non-exhausted run, so its minimum is the smallest unconsumed line
/// overall. Time complexity is *m* \* log(*n*) where *m* is the number of lines, *n* is the number of runs.
pub struct KWayMerger<F: RunFormat> {
    // binary heap is max-heap by default so we reverse it to convert it to min-heap
    frontier: BinaryHeap<Reverse<(Line, usize)>>,
    cursors: Vec<RunCursor<F>>,
}

impl<F: RunFormat> KWayMerger<F> {
    /// Creates a merger over run cursors. Exhausted cursors are left out of the frontier.
    ///
    /// # Arguments
    /// * `cursors` - Cursors of runs sorted in ascending order
    pub fn new<I>(cursors: I) -> Result<Self, SortError>
    where
        I: IntoIterator<Item = RunCursor<F>>,
    {
        let mut cursors = Vec::from_iter(cursors);
        let mut frontier = BinaryHeap::with_capacity(cursors.len());

        // a single run is drained directly
        if cursors.len() > 1 {
            for (idx, cursor) in cursors.iter_mut().enumerate() {
                if let Some(line) = cursor.pop()? {
                    frontier.push(Reverse((line, idx)));
                }
            }
        }

        return Ok(KWayMerger { frontier, cursors });
    }

    /// Returns the next line in ascending order or [`None`] once every run is exhausted.
    pub fn next_line(&mut self) -> Result<Option<Line>, SortError> {
        if self.cursors.len() == 1 {
            return self.cursors[0].pop();
        }

        let Reverse((line, idx)) = match self.frontier.pop() {
            Some(entry) => entry,
            None => return Ok(None),
        };
        if let Some(next) = self.cursors[idx].pop()? {
            self.frontier.push(Reverse((next, idx)));
        }

        return Ok(Some(line));
    }

    /// Writes all lines to the sink and checks that exactly `expected` lines were merged.
    pub fn merge_into<W: Write>(
        mut self,
        sink: &mut OutputSink<W>,
        expected: u64,
        cancel: Option<&AtomicBool>,
    ) -> Result<u64, SortError> {
        let mut merged = 0;
        while let Some(line) = self.next_line()? {
            ensure_not_cancelled(cancel)?;
            sink.write(&line)?;
            merged += 1;
        }

        return check_line_count(expected, merged);
    }

    /// Appends all lines to an intermediate run and checks that exactly `expected` lines were merged.
    /// The run stays unfinalized, so it is discarded if the merge fails.
    pub fn merge_into_run(
        mut self,
        writer: &mut RunWriter<F>,
        expected: u64,
        cancel: Option<&AtomicBool>,
    ) -> Result<u64, SortError> {
        let mut merged = 0;
        let mut last: Option<Line> = None;
        while let Some(line) = self.next_line()? {
            ensure_not_cancelled(cancel)?;
            if matches!(&last, Some(last) if line < *last) {
                return Err(IntegrityError::OutOfOrder { position: merged }.into());
            }
            writer.append(&line)?;
            last = Some(line);
            merged += 1;
        }

        return check_line_count(expected, merged);
    }
}

fn check_line_count(expected: u64, merged: u64) -> Result<u64, SortError> {
    if merged != expected {
        return Err(IntegrityError::LineCountMismatch {
            expected,
            actual: merged,
        }
        .into());
    }

    return Ok(merged);
}

impl<F: RunFormat> Iterator for KWayMerger<F> {
    type Item = Result<Line, SortError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
