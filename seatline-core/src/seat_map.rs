//! Seat identifiers for a plane configuration.
//!
//! Cabins are six abreast (`A`..`F`) and filled row by row. A seat is named by
//! its column letter followed by the row, zero-padded to two digits: `A01`,
//! `F01`, `A02`, ... `A100`. When the seat count is not a multiple of six the
//! last row only holds its leading columns.

use crate::models::Plane;

pub const COLUMNS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatMap {
    total_seats: u32,
}

impl SeatMap {
    pub fn new(total_seats: u32) -> Self {
        Self { total_seats }
    }

    pub fn for_plane(plane: &Plane) -> Self {
        Self::new(u32::try_from(plane.total_seats).unwrap_or(0))
    }

    pub fn len(&self) -> usize {
        self.total_seats as usize
    }

    pub fn is_empty(&self) -> bool {
        self.total_seats == 0
    }

    pub fn rows(&self) -> u32 {
        self.total_seats.div_ceil(COLUMNS.len() as u32)
    }

    /// Membership test on the canonical spelling only.
    pub fn contains(&self, seat: &str) -> bool {
        match Self::parse(seat) {
            Some(index) => index < self.total_seats,
            None => false,
        }
    }

    /// Seats in cabin order.
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.total_seats).map(Self::label)
    }

    pub fn label(index: u32) -> String {
        let columns = COLUMNS.len() as u32;
        let column = COLUMNS[(index % columns) as usize];
        let row = index / columns + 1;
        format!("{}{:02}", column, row)
    }

    /// Zero-based cabin index of a canonically spelled seat.
    fn parse(seat: &str) -> Option<u32> {
        let mut chars = seat.chars();
        let letter = chars.next()?;
        let column = COLUMNS.iter().position(|c| *c == letter)? as u32;

        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let row: u32 = digits.parse().ok()?;
        if row == 0 || format!("{:02}", row) != digits {
            return None;
        }

        (row - 1)
            .checked_mul(COLUMNS.len() as u32)?
            .checked_add(column)
    }
}
