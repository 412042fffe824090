use chrono::NaiveDate;

use freeweek_types::models::{BusyBlock, DAYS_PER_WEEK, FreeSlot, MINUTES_PER_DAY, hour_minute};

/// Free runs shorter than this are discarded entirely, never merged
/// or reported.
pub const MIN_SLOT_MINUTES: u32 = 30;

/// Computes the time windows where no group member is busy.
///
/// A minute is busy if *any* block of *any* user covers it, so the
/// free set is the complement of the union of all busy intervals.
/// Blocks may overlap and arrive in any order; the union marking
/// absorbs both. Output is ordered by day, then by start time.
///
/// `week_start` is accepted for interface symmetry with the block
/// fetch but does not affect the result: blocks are week-independent
/// and count as busy in every week they are queried in.
///
/// A run still open at midnight closes at 23:59 rather than rolling
/// into the next day; the day-indexed model has no cross-day slots.
///
/// Runs in O(1440 × 7) per call via a per-minute sweep. An equivalent
/// formulation sorts each day's intervals by start, merges overlaps,
/// and emits the gaps; any substitute must keep the same boundaries,
/// the ≥30-minute filter, and the 23:59 clamp.
pub fn common_free_slots(blocks: &[BusyBlock], _week_start: NaiveDate) -> Vec<FreeSlot> {
    let mut slots = Vec::new();

    for day in 0..DAYS_PER_WEEK {
        let mut busy = [false; MINUTES_PER_DAY as usize];

        for block in blocks.iter().filter(|b| b.interval.day == day) {
            let start = block.interval.start_minute_of_day().min(MINUTES_PER_DAY);
            let end = block.interval.end_minute_of_day().min(MINUTES_PER_DAY);
            for minute in start..end {
                busy[minute as usize] = true;
            }
        }

        let mut run_start: Option<u32> = None;

        for minute in 0..MINUTES_PER_DAY {
            match (busy[minute as usize], run_start) {
                (false, None) => run_start = Some(minute),
                (true, Some(start)) => {
                    if minute - start >= MIN_SLOT_MINUTES {
                        slots.push(slot(day, start, minute - 1));
                    }
                    run_start = None;
                }
                _ => {}
            }
        }

        // Run still open at end of day
        if let Some(start) = run_start {
            if MINUTES_PER_DAY - start >= MIN_SLOT_MINUTES {
                slots.push(slot(day, start, MINUTES_PER_DAY - 1));
            }
        }
    }

    slots
}

/// Builds a slot from a free run; `last` is the last free minute, so
/// the end lands on 23:59 for runs reaching midnight.
fn slot(day: u8, start: u32, last: u32) -> FreeSlot {
    let (start_hour, start_minute) = hour_minute(start);
    let (end_hour, end_minute) = hour_minute(last);
    FreeSlot { day, start_hour, start_minute, end_hour, end_minute }
}

/// Renders a slot as `"9:00 AM - 5:30 PM"`: 12-hour clock, zero-padded
/// minutes, midnight as 12 AM, noon as 12 PM.
pub fn format_free_slot(slot: &FreeSlot) -> String {
    format!(
        "{} - {}",
        format_time(slot.start_hour, slot.start_minute),
        format_time(slot.end_hour, slot.end_minute)
    )
}

fn format_time(hour: u8, minute: u8) -> String {
    let period = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use freeweek_types::models::TimeInterval;

    fn week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn block(user: &str, day: u8, start: (u8, u8), end: (u8, u8)) -> BusyBlock {
        BusyBlock {
            id: format!("{user}-{day}-{}:{}", start.0, start.1),
            user_id: user.to_string(),
            user_name: user.to_string(),
            group_code: "ABCD".to_string(),
            interval: TimeInterval {
                day,
                start_hour: start.0,
                start_minute: start.1,
                end_hour: end.0,
                end_minute: end.1,
            },
            label: "Busy".to_string(),
            recurring: false,
        }
    }

    fn free(day: u8, start: (u8, u8), end: (u8, u8)) -> FreeSlot {
        FreeSlot {
            day,
            start_hour: start.0,
            start_minute: start.1,
            end_hour: end.0,
            end_minute: end.1,
        }
    }

    #[test]
    fn empty_week_is_fully_free() {
        let slots = common_free_slots(&[], week());
        assert_eq!(slots.len(), 7);
        for (day, slot) in slots.iter().enumerate() {
            assert_eq!(*slot, free(day as u8, (0, 0), (23, 59)));
        }
    }

    #[test]
    fn fully_covered_day_has_no_slots() {
        // 23:59 is the latest representable end, so minute 1439 stays
        // free; a one-minute run is under the 30-minute floor and the
        // day reports no slots at all
        let blocks = vec![block("u1", 2, (0, 0), (12, 0)), block("u2", 2, (12, 0), (23, 59))];
        let slots = common_free_slots(&blocks, week());
        assert!(slots.iter().all(|s| s.day != 2));
        // every other day is untouched
        assert_eq!(slots.len(), 6);
    }

    #[test]
    fn scenario_two_blocks_split_the_day() {
        // Blocks 9:00-10:00 and 14:00-15:30 on Monday
        let blocks = vec![block("u1", 0, (9, 0), (10, 0)), block("u1", 0, (14, 0), (15, 30))];
        let slots: Vec<_> = common_free_slots(&blocks, week())
            .into_iter()
            .filter(|s| s.day == 0)
            .collect();
        assert_eq!(
            slots,
            vec![
                free(0, (0, 0), (8, 59)),
                free(0, (10, 0), (13, 59)),
                free(0, (15, 30), (23, 59)),
            ]
        );
    }

    #[test]
    fn scenario_two_users_block_monday_workday() {
        let blocks = vec![block("u1", 0, (9, 0), (17, 0)), block("u2", 0, (9, 0), (17, 0))];
        let slots = common_free_slots(&blocks, week());

        let monday: Vec<_> = slots.iter().filter(|s| s.day == 0).collect();
        assert_eq!(
            monday,
            vec![&free(0, (0, 0), (8, 59)), &free(0, (17, 0), (23, 59))]
        );

        for day in 1..7 {
            let rest: Vec<_> = slots.iter().filter(|s| s.day == day).collect();
            assert_eq!(rest, vec![&free(day, (0, 0), (23, 59))]);
        }
    }

    #[test]
    fn overlapping_blocks_behave_like_their_union() {
        let overlapping = vec![block("u1", 3, (9, 0), (12, 0)), block("u2", 3, (11, 0), (14, 0))];
        let merged = vec![block("u1", 3, (9, 0), (14, 0))];
        assert_eq!(
            common_free_slots(&overlapping, week()),
            common_free_slots(&merged, week())
        );
    }

    #[test]
    fn short_gaps_are_discarded() {
        // 20-minute gap between the two blocks: below the floor
        let blocks = vec![block("u1", 1, (9, 0), (12, 0)), block("u1", 1, (12, 20), (18, 0))];
        let tuesday: Vec<_> = common_free_slots(&blocks, week())
            .into_iter()
            .filter(|s| s.day == 1)
            .collect();
        assert_eq!(tuesday, vec![free(1, (0, 0), (8, 59)), free(1, (18, 0), (23, 59))]);
    }

    #[test]
    fn exactly_thirty_minutes_survives() {
        let blocks = vec![block("u1", 4, (0, 0), (9, 0)), block("u1", 4, (9, 30), (23, 59))];
        let friday: Vec<_> = common_free_slots(&blocks, week())
            .into_iter()
            .filter(|s| s.day == 4)
            .collect();
        assert_eq!(friday, vec![free(4, (9, 0), (9, 29))]);
    }

    #[test]
    fn every_slot_meets_the_minimum_duration() {
        let blocks = vec![
            block("u1", 0, (8, 0), (8, 45)),
            block("u2", 0, (9, 0), (9, 10)),
            block("u1", 0, (9, 20), (23, 30)),
            block("u2", 5, (0, 0), (23, 40)),
        ];
        for slot in common_free_slots(&blocks, week()) {
            let start = slot.start_hour as u32 * 60 + slot.start_minute as u32;
            let end = slot.end_hour as u32 * 60 + slot.end_minute as u32;
            // end is the last included minute
            assert!(end + 1 - start >= MIN_SLOT_MINUTES, "slot too short: {slot:?}");
        }
    }

    #[test]
    fn aggregation_is_pure() {
        let blocks = vec![block("u1", 0, (9, 0), (10, 0)), block("u2", 6, (20, 0), (22, 0))];
        let first = common_free_slots(&blocks, week());
        let second = common_free_slots(&blocks, week());
        assert_eq!(first, second);
    }

    #[test]
    fn week_start_does_not_change_the_result() {
        let blocks = vec![block("u1", 0, (9, 0), (10, 0))];
        let a = common_free_slots(&blocks, week());
        let b = common_free_slots(&blocks, NaiveDate::from_ymd_opt(2031, 1, 6).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn off_grid_minutes_are_handled() {
        // The UI snaps to :00/:30 but the aggregator must not rely on it
        let blocks = vec![block("u1", 0, (9, 17), (10, 3))];
        let monday: Vec<_> = common_free_slots(&blocks, week())
            .into_iter()
            .filter(|s| s.day == 0)
            .collect();
        assert_eq!(monday, vec![free(0, (0, 0), (9, 16)), free(0, (10, 3), (23, 59))]);
    }

    #[test]
    fn formats_twelve_hour_clock() {
        assert_eq!(format_free_slot(&free(0, (0, 0), (8, 59))), "12:00 AM - 8:59 AM");
        assert_eq!(format_free_slot(&free(0, (12, 0), (13, 5))), "12:00 PM - 1:05 PM");
        assert_eq!(format_free_slot(&free(0, (15, 30), (23, 59))), "3:30 PM - 11:59 PM");
    }
}
