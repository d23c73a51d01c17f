//! Splits availability windows into fixed-length slot keys.

use crate::types::{AvailabilityWindow, SlotTime, TemporalKey};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("representative name is mandatory")]
    MissingRepresentative,

    #[error("end time {end} is not after start time {start}")]
    EmptyRange { start: u32, end: u32 },

    #[error("time {minute} is not a multiple of the {interval} minute meeting interval")]
    Misaligned { minute: u32, interval: u32 },

    #[error("meeting interval must be positive")]
    ZeroInterval,
}

/// Produces `(end - start) / interval` contiguous keys covering `[start, end)`.
pub fn partition(window: &AvailabilityWindow, interval: u32) -> Result<Vec<TemporalKey>, WindowError> {
    if interval == 0 {
        return Err(WindowError::ZeroInterval);
    }
    if window.representative.trim().is_empty() {
        return Err(WindowError::MissingRepresentative);
    }
    if window.end_minute <= window.start_minute {
        return Err(WindowError::EmptyRange {
            start: window.start_minute,
            end: window.end_minute,
        });
    }
    for minute in [window.start_minute, window.end_minute] {
        if minute % interval != 0 {
            return Err(WindowError::Misaligned { minute, interval });
        }
    }

    let count = (window.end_minute - window.start_minute) / interval;
    Ok((0..count)
        .map(|k| {
            let start_minute = window.start_minute + k * interval;
            TemporalKey {
                time: SlotTime {
                    year: window.year,
                    month: window.month,
                    day: window.day,
                    start_minute,
                    end_minute: start_minute + interval,
                },
                representative: window.representative.clone(),
            }
        })
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn window(start_minute: u32, end_minute: u32, representative: &str) -> AvailabilityWindow {
        AvailabilityWindow {
            day: 5,
            month: 6,
            year: 2024,
            start_minute,
            end_minute,
            representative: representative.into(),
        }
    }

    #[test]
    fn test_partition_one_hour_into_ten_minute_slots() {
        let keys = partition(&window(540, 600, "alice"), 10).unwrap();

        assert_eq!(keys.len(), 6);
        let bounds: Vec<(u32, u32)> = keys
            .iter()
            .map(|key| (key.time.start_minute, key.time.end_minute))
            .collect();
        assert_eq!(
            bounds,
            vec![
                (540, 550),
                (550, 560),
                (560, 570),
                (570, 580),
                (580, 590),
                (590, 600)
            ]
        );
        for key in &keys {
            assert_eq!(key.representative, "alice");
            assert_eq!((key.time.day, key.time.month, key.time.year), (5, 6, 2024));
        }
    }

    #[test_case(window(540, 600, ""), WindowError::MissingRepresentative ; "missing representative")]
    #[test_case(window(540, 600, "  "), WindowError::MissingRepresentative ; "blank representative")]
    #[test_case(window(600, 540, "alice"), WindowError::EmptyRange { start: 600, end: 540 } ; "end before start")]
    #[test_case(window(600, 600, "alice"), WindowError::EmptyRange { start: 600, end: 600 } ; "end equals start")]
    #[test_case(window(545, 600, "alice"), WindowError::Misaligned { minute: 545, interval: 10 } ; "misaligned start")]
    #[test_case(window(540, 605, "alice"), WindowError::Misaligned { minute: 605, interval: 10 } ; "misaligned end")]
    fn test_malformed_window_is_rejected(window: AvailabilityWindow, expected: WindowError) {
        assert_eq!(partition(&window, 10).unwrap_err(), expected);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        assert_eq!(
            partition(&window(540, 600, "alice"), 0).unwrap_err(),
            WindowError::ZeroInterval
        );
    }

    proptest! {
        #[test]
        fn prop_slots_cover_window_without_gaps(
            interval in 1u32..=60,
            start_units in 0u32..48,
            k in 1u32..48,
        ) {
            let start = start_units * interval;
            let end = start + k * interval;
            let keys = partition(&window(start, end, "bob"), interval).unwrap();

            prop_assert_eq!(keys.len() as u32, k);
            prop_assert_eq!(keys[0].time.start_minute, start);
            prop_assert_eq!(keys[keys.len() - 1].time.end_minute, end);
            for key in &keys {
                prop_assert_eq!(key.time.end_minute - key.time.start_minute, interval);
            }
            for pair in keys.windows(2) {
                prop_assert_eq!(pair[0].time.end_minute, pair[1].time.start_minute);
            }
        }
    }
}
