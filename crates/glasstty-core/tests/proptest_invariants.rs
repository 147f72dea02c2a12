//! Property-based invariant tests.
//!
//! These verify structural invariants that must hold for **any** input:
//!
//! 1. The engine never panics on arbitrary byte streams.
//! 2. The cursor and scroll region stay within bounds after any sequence
//!    of ingest and resize calls.
//! 3. Rows that changed are reported dirty until drained.
//! 4. Output is deterministic regardless of how the stream is chunked.

use glasstty_core::{Cell, Grid, Pen, Terminal};
use proptest::prelude::*;

/// Dimensions inside the supported range, small enough to keep cases fast.
fn dims() -> impl Strategy<Value = (u16, u16)> {
    (10u16..=40, 20u16..=100)
}

/// Byte soup weighted toward escape-sequence structure so the parser
/// actually leaves ground state.
fn stream() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(
        prop_oneof![
            3 => any::<u8>(),
            2 => 0x20u8..0x7f,
            2 => prop_oneof![Just(0x1bu8), Just(b'['), Just(b';'), Just(b'm')],
            1 => b'0'..=b'9',
            1 => prop_oneof![
                Just(b'H'), Just(b'J'), Just(b'K'), Just(b'r'), Just(b'L'),
                Just(b'@'), Just(b'P'), Just(b'S'), Just(b'T'), Just(b'X'),
                Just(b'A'), Just(b'B'), Just(b'C'), Just(b'D'), Just(b'G'),
                Just(b'd'), Just(b'n'), Just(b'c'), Just(0x08), Just(b'\t'),
                Just(b'\n'), Just(b'\r'),
            ],
        ],
        0..512,
    )
}

fn assert_invariants(t: &Terminal) {
    let (x, y) = t.cursor();
    assert!(x <= t.cols(), "cursor.x {} > cols {}", x, t.cols());
    assert!(y < t.rows(), "cursor.y {} >= rows {}", y, t.rows());

    let (top, bottom) = t.scroll_region();
    assert!(top < bottom, "scroll region {top}..{bottom} inverted");
    assert!(bottom < t.rows(), "scroll bottom {bottom} out of range");

    for row in 0..t.rows() {
        assert_eq!(t.row(row).unwrap().len(), t.cols() as usize);
    }
    assert!(t.row(t.rows()).is_none());
}

proptest! {
    #[test]
    fn arbitrary_streams_never_break_invariants(
        (rows, cols) in dims(),
        bytes in stream(),
    ) {
        let mut t = Terminal::new(rows, cols);
        t.ingest(&bytes);
        assert_invariants(&t);
    }

    #[test]
    fn ingest_resize_interleavings_keep_invariants(
        (rows, cols) in dims(),
        ops in proptest::collection::vec(
            prop_oneof![
                stream().prop_map(Op::Ingest),
                dims().prop_map(|(r, c)| Op::Resize(r, c)),
                // Hostile sizes below the minimums must clamp, not fault.
                (0u16..10, 0u16..20).prop_map(|(r, c)| Op::Resize(r, c)),
            ],
            0..12,
        ),
    ) {
        let mut t = Terminal::new(rows, cols);
        for op in ops {
            match op {
                Op::Ingest(bytes) => t.ingest(&bytes),
                Op::Resize(r, c) => t.resize(r, c),
            }
            assert_invariants(&t);
        }
    }

    #[test]
    fn changed_rows_are_reported_dirty(
        bytes in stream(),
    ) {
        let mut t = Terminal::new(25, 80);
        t.take_dirty();

        let before: Vec<Vec<Cell>> =
            (0..t.rows()).map(|y| t.row(y).unwrap().to_vec()).collect();
        t.ingest(&bytes);
        let dirty = t.take_dirty();

        for y in 0..t.rows() {
            if t.row(y).unwrap() != before[y as usize].as_slice() {
                prop_assert!(
                    dirty.contains(&y),
                    "row {y} changed but was not reported dirty"
                );
            }
        }
    }

    #[test]
    fn chunking_does_not_change_the_outcome(
        bytes in stream(),
        split in any::<proptest::sample::Index>(),
    ) {
        let mut whole = Terminal::new(25, 80);
        whole.ingest(&bytes);

        let at = if bytes.is_empty() { 0 } else { split.index(bytes.len()) };
        let mut parts = Terminal::new(25, 80);
        parts.ingest(&bytes[..at]);
        parts.ingest(&bytes[at..]);

        prop_assert_eq!(whole.cursor(), parts.cursor());
        prop_assert_eq!(whole.scroll_region(), parts.scroll_region());
        for y in 0..whole.rows() {
            prop_assert_eq!(whole.row(y), parts.row(y), "row {}", y);
        }
    }

    #[test]
    fn sgr_reset_always_restores_the_default_pen(
        params in proptest::collection::vec(0u16..120, 0..10),
    ) {
        let mut t = Terminal::new(25, 80);
        let body: Vec<String> = params.iter().map(u16::to_string).collect();
        let seq = format!("\x1b[{}m\x1b[0m", body.join(";"));
        t.ingest(seq.as_bytes());
        prop_assert_eq!(t.pen(), Pen::default());
    }

    #[test]
    fn run_of_glyphs_fills_exactly_the_written_columns(
        n in 1usize..=80,
    ) {
        let mut t = Terminal::new(25, 80);
        t.ingest("g".repeat(n).as_bytes());
        let row = t.row(0).unwrap();
        for x in 0..n {
            prop_assert_eq!(row[x].glyph, 'g');
        }
        for x in n..80 {
            prop_assert_eq!(&row[x], &Cell::default());
        }
    }

    #[test]
    fn scroll_up_law_holds_on_the_grid(
        k in 1u16..=6,
        top in 0u16..4,
        height in 3u16..=6,
    ) {
        let bottom = top + height - 1;
        let mut grid = Grid::new(10, 20);
        for y in 0..10u16 {
            for x in 0..20u16 {
                grid.cell_mut(y, x).unwrap().glyph =
                    char::from_digit(u32::from(y), 10).unwrap();
            }
        }
        let before: Vec<String> = (0..10)
            .map(|y| grid.row_cells(y).unwrap().iter().map(|c| c.glyph).collect())
            .collect();

        grid.scroll_up(top, bottom, k);
        let k = k.min(height);

        for y in 0..10u16 {
            let row: String = grid.row_cells(y).unwrap().iter().map(|c| c.glyph).collect();
            if y < top || y > bottom {
                prop_assert_eq!(&row, &before[y as usize], "outside region, row {}", y);
            } else if y + k <= bottom {
                prop_assert_eq!(&row, &before[(y + k) as usize], "shifted row {}", y);
            } else {
                prop_assert_eq!(row, " ".repeat(20), "blanked row {}", y);
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    Ingest(Vec<u8>),
    Resize(u16, u16),
}
