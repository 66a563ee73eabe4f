//! Gauss–Jordan elimination over GF(2).
//!
//! Row addition is XOR of the coefficient bits together with XOR of the
//! payload bytes. Multiplication by a coefficient in {0, 1} is a no-op, so
//! elimination needs nothing but row additions and swaps.
//!
//! Each column is pivoted on the first row at or after the pivot position
//! with that bit set, and the pivot row is then added to every other row
//! with the bit set, above the pivot included. After k columns the matrix
//! is fully reduced and row `i` holds fragment `i` directly; there is no
//! back-substitution pass.

use sliver_proto::{CoefficientVector, Slice};
use tracing::{debug, trace};

struct Row {
    coefficients: CoefficientVector,
    payload: Vec<u8>,
}

impl Row {
    fn add(&mut self, other: &Row) {
        self.coefficients.xor_assign(&other.coefficients);
        for (a, b) in self.payload.iter_mut().zip(&other.payload) {
            *a ^= *b;
        }
    }
}

/// Adds `rows[source]` into `rows[target]`.
fn add_row(rows: &mut [Row], target: usize, source: usize) {
    debug_assert_ne!(target, source);
    if target < source {
        let (head, tail) = rows.split_at_mut(source);
        head[target].add(&tail[0]);
    } else {
        let (head, tail) = rows.split_at_mut(target);
        tail[0].add(&head[source]);
    }
}

/// Solves for the fragments combined into `slices`.
///
/// Every slice must describe the same fragment count k and carry a payload
/// of the same length m. Returns the k fragments in index order, or `None`
/// when the slices do not determine them: fewer than k independent rows, a
/// pair of rows that contradict each other, mismatched geometry or an empty
/// input. The reason is logged at debug level.
///
/// The input is not modified; elimination runs on a private copy.
pub fn solve(slices: &[Slice]) -> Option<Vec<Vec<u8>>> {
    let first = match slices.first() {
        Some(first) => first,
        None => {
            debug!("No slices to solve");
            return None;
        }
    };
    let k = first.fragment_count();

    if let Some(odd) = slices.iter().find(|s| !s.same_geometry(first)) {
        debug!(
            expected_fragments = k,
            expected_symbol_len = first.symbol_len(),
            fragments = odd.fragment_count(),
            symbol_len = odd.symbol_len(),
            "Slice geometry mismatch"
        );
        return None;
    }

    let mut rows: Vec<Row> = slices
        .iter()
        .map(|s| Row {
            coefficients: s.coefficients.clone(),
            payload: s.encoding_symbol.clone(),
        })
        .collect();

    for column in 0..k {
        let pivot = column;
        let found = (pivot..rows.len()).find(|&r| rows[r].coefficients.get(column));
        let Some(found) = found else {
            debug!(column, fragments = k, rows = rows.len(), "System is unsolvable");
            return None;
        };
        rows.swap(pivot, found);

        for r in 0..rows.len() {
            if r != pivot && rows[r].coefficients.get(column) {
                add_row(&mut rows, r, pivot);
            }
        }
        trace!(column, "Column reduced");
    }

    // Rows past k are redundant equations; after full reduction their
    // coefficients are zero and so must be their payloads.
    for row in &rows[k..] {
        debug_assert!(row.coefficients.is_zero());
        if row.payload.iter().any(|b| *b != 0) {
            debug!(fragments = k, rows = rows.len(), "System is contradictory");
            return None;
        }
    }

    rows.truncate(k);
    debug!(fragments = k, "System solved");
    Some(rows.into_iter().map(|row| row.payload).collect())
}

/// Number of linearly independent coefficient vectors among `slices`.
///
/// Only slices sharing the first slice's fragment count are considered.
/// A client holding slices of rank k can solve without fetching more.
pub fn rank(slices: &[Slice]) -> usize {
    let Some(first) = slices.first() else {
        return 0;
    };
    let k = first.fragment_count();

    let mut rows: Vec<CoefficientVector> = slices
        .iter()
        .filter(|s| s.fragment_count() == k)
        .map(|s| s.coefficients.clone())
        .collect();

    let mut pivot = 0;
    for column in 0..k {
        let Some(found) = (pivot..rows.len()).find(|&r| rows[r].get(column)) else {
            continue;
        };
        rows.swap(pivot, found);
        let pivot_row = rows[pivot].clone();
        for row in rows.iter_mut().skip(pivot + 1) {
            if row.get(column) {
                row.xor_assign(&pivot_row);
            }
        }
        pivot += 1;
        if pivot == rows.len() {
            break;
        }
    }
    pivot
}
