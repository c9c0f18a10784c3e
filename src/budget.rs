//! Duration budgeting for scripts and chapters.
//!
//! Converts a requested total duration into word-count targets for the script
//! stages and, in the planned topology, an even per-chapter time allocation.

/// Assumed narration speaking rate.
pub const WORDS_PER_MINUTE: u32 = 150;

/// Word-count target for a narration of the given length.
///
/// This is supplied to the script stages as an instruction floor; the
/// pipeline never rejects an under-length result.
pub fn target_words(minutes: u32) -> u32 {
    minutes * WORDS_PER_MINUTE
}

/// Word-count floor for a fractional chapter allocation.
pub fn chapter_words(minutes: f64) -> u32 {
    (minutes * WORDS_PER_MINUTE as f64).round() as u32
}

/// Allocate a total duration evenly across `chapter_count` chapters.
///
/// Division is exact even when it produces fractional minutes; there is no
/// remainder redistribution. Returns an empty allocation for zero chapters.
pub fn allocate_minutes(total_minutes: u32, chapter_count: usize) -> Vec<f64> {
    if chapter_count == 0 {
        return Vec::new();
    }
    let per_chapter = total_minutes as f64 / chapter_count as f64;
    vec![per_chapter; chapter_count]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_words_fifteen_minutes() {
        assert_eq!(target_words(15), 2250);
    }

    #[test]
    fn test_allocations_sum_to_total() {
        let allocations = allocate_minutes(15, 3);
        assert_eq!(allocations, vec![5.0, 5.0, 5.0]);
        assert_eq!(allocations.iter().sum::<f64>(), 15.0);
    }

    #[test]
    fn test_fractional_allocation_preserved() {
        let allocations = allocate_minutes(10, 3);
        assert_eq!(allocations.len(), 3);
        for a in &allocations {
            assert!((a - 10.0 / 3.0).abs() < f64::EPSILON);
        }
        let sum: f64 = allocations.iter().sum();
        assert!((sum - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_chapters() {
        assert!(allocate_minutes(10, 0).is_empty());
    }

    #[test]
    fn test_chapter_words_rounds_fractional_minutes() {
        // 10 / 3 minutes at 150 wpm
        assert_eq!(chapter_words(10.0 / 3.0), 500);
        assert_eq!(chapter_words(5.0), 750);
    }
}
