//! Case classification of canonical cells and quadrilateral faces

use crate::tables::{SQUARE_TABLE, TRIANGLE_TABLE};

/// 8-bit case index: bit `k` is set when `levels[k] >= reference`
pub fn case_index(levels: &[f32; 8], reference: f32) -> u8 {
    levels
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v >= reference)
        .fold(0u8, |case, (k, _)| case | (1 << k))
}

/// Edge triples of the triangles for a case, in table order
pub fn case_triangles(case: u8) -> impl Iterator<Item = [usize; 3]> {
    TRIANGLE_TABLE[case as usize]
        .chunks_exact(3)
        .take_while(|tri| tri[0] >= 0)
        .map(|tri| [tri[0] as usize, tri[1] as usize, tri[2] as usize])
}

/// Number of triangles produced by a case
pub fn triangle_count(case: u8) -> usize {
    case_triangles(case).count()
}

/// 4-bit case index of a quadrilateral face
pub fn square_case_index(levels: &[f32; 4], reference: f32) -> u8 {
    levels
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v >= reference)
        .fold(0u8, |case, (k, _)| case | (1 << k))
}

/// Edge pairs of the segments for a quadrilateral case
pub fn square_segments(case: u8) -> impl Iterator<Item = [usize; 2]> {
    SQUARE_TABLE[(case & 0x0f) as usize]
        .chunks_exact(2)
        .take_while(|seg| seg[0] >= 0)
        .map(|seg| [seg[0] as usize, seg[1] as usize])
}
