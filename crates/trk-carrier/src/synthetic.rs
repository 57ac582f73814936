//! Deterministic synthetic-history generator.
//!
//! Used whenever live carrier data is unavailable (failed capability call)
//! or a live base-info payload carries no history at all. Pure function of
//! `(tracking_number, now)` so tests can freeze the clock and compare
//! bit-for-bit.

use chrono::{DateTime, Duration, Utc};
use trk_schemas::{DeliveryStatus, HistoryEvent};

/// Origin hub named in the first (packaging) event.
pub const ORIGIN_HUB: &str = "물류 센터";
/// Regional warehouse named in the collection event.
pub const REGIONAL_WAREHOUSE: &str = "경기도 화성시 물류창고";
/// Destination-side hub named in the final event and used as the fallback
/// snapshot's current location.
pub const DESTINATION_HUB: &str = "서울 물류센터";

/// Line-haul hubs cycled through by the intermediate events, in order.
const LINE_HAUL_HUBS: [&str; 4] = [
    "경기도 수원시 물류센터",
    "용인 허브",
    "강원도 원주 물류센터",
    "경북 대구 물류센터",
];

/// Number of events synthesized for a tracking number: last decimal digit
/// mod 5, plus 2 (range 2..=6). A non-digit trailing character counts as 0.
pub fn event_count(tracking_number: &str) -> usize {
    let digit = tracking_number
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0) as usize;
    digit % 5 + 2
}

/// Fabricate a plausible shipment history ending at `now`.
///
/// Events are one day apart, oldest first. The first is always the packaging
/// event (`발송준비중`), the last is always the in-transit arrival at the
/// destination hub; with three or more events the second is the collection
/// event, and any further middle events walk the line-haul hubs with
/// alternating load/unload descriptions.
pub fn synthetic_history(tracking_number: &str, now: DateTime<Utc>) -> Vec<HistoryEvent> {
    let count = event_count(tracking_number);
    let mut history = Vec::with_capacity(count);

    for idx in 0..count {
        let time = now - Duration::days((count - 1 - idx) as i64);

        let event = if idx == 0 {
            HistoryEvent {
                time,
                location: ORIGIN_HUB.to_string(),
                status: DeliveryStatus::Preparing,
                description: "상품 포장 완료".to_string(),
            }
        } else if idx == count - 1 {
            HistoryEvent {
                time,
                location: DESTINATION_HUB.to_string(),
                status: DeliveryStatus::InTransit,
                description: "배송지 이동 중".to_string(),
            }
        } else if idx == 1 {
            HistoryEvent {
                time,
                location: REGIONAL_WAREHOUSE.to_string(),
                status: DeliveryStatus::Collected,
                description: "집화처리".to_string(),
            }
        } else {
            let i = idx - 2;
            HistoryEvent {
                time,
                location: LINE_HAUL_HUBS[i % LINE_HAUL_HUBS.len()].to_string(),
                status: DeliveryStatus::InTransit,
                description: if i % 2 == 0 { "간선상차" } else { "간선하차" }.to_string(),
            }
        };

        history.push(event);
    }

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn frozen_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap()
    }

    #[test]
    fn event_count_is_last_digit_mod_five_plus_two() {
        assert_eq!(event_count("AB12345670"), 2);
        assert_eq!(event_count("1231"), 3);
        assert_eq!(event_count("1234"), 6);
        assert_eq!(event_count("1239"), 6);
        assert_eq!(event_count("1235"), 2);
    }

    #[test]
    fn non_digit_trailing_char_falls_back_to_two_events() {
        assert_eq!(event_count("TRACK-X"), 2);
        assert_eq!(event_count(""), 2);
    }

    #[test]
    fn history_is_reproducible_bit_for_bit() {
        let a = synthetic_history("9876543214", frozen_now());
        let b = synthetic_history("9876543214", frozen_now());
        assert_eq!(a, b);
    }

    #[test]
    fn same_last_digit_yields_same_shape() {
        let a = synthetic_history("1111111117", frozen_now());
        let b = synthetic_history("2222222227", frozen_now());
        assert_eq!(a, b, "history depends only on the trailing digit");
    }

    #[test]
    fn bounds_and_ordering_hold_for_every_digit() {
        for d in 0..10 {
            let nr = format!("100000000{d}");
            let history = synthetic_history(&nr, frozen_now());

            assert!(history.len() >= 2 && history.len() <= 6, "len={}", history.len());
            assert_eq!(history.first().unwrap().status, DeliveryStatus::Preparing);
            assert_eq!(history.last().unwrap().status, DeliveryStatus::InTransit);
            assert_eq!(history.last().unwrap().time, frozen_now());

            for pair in history.windows(2) {
                assert!(pair[0].time <= pair[1].time, "events must be oldest-first");
            }
        }
    }

    #[test]
    fn two_event_history_skips_collection() {
        let history = synthetic_history("AB12345670", frozen_now());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].location, ORIGIN_HUB);
        assert_eq!(history[0].description, "상품 포장 완료");
        assert_eq!(history[1].location, DESTINATION_HUB);
        assert_eq!(history[1].description, "배송지 이동 중");
    }

    #[test]
    fn six_event_history_walks_line_haul_hubs() {
        let history = synthetic_history("1234", frozen_now());
        assert_eq!(history.len(), 6);
        assert_eq!(history[1].status, DeliveryStatus::Collected);
        assert_eq!(history[1].location, REGIONAL_WAREHOUSE);
        assert_eq!(history[2].location, "경기도 수원시 물류센터");
        assert_eq!(history[2].description, "간선상차");
        assert_eq!(history[3].location, "용인 허브");
        assert_eq!(history[3].description, "간선하차");
        assert_eq!(history[4].location, "강원도 원주 물류센터");
        assert_eq!(history[4].description, "간선상차");
    }
}
