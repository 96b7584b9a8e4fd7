//! Counter-delta to bandwidth conversion.

use crate::types::Snapshot;

/// Instantaneous bandwidth between two samples, in kbit/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rate {
    pub rx_kbps: f64,
    pub tx_kbps: f64,
}

/// Rate between two adjacent snapshots.
///
/// A non-positive interval is treated as one second so duplicate or
/// reordered timestamps still yield a finite point. A counter that went
/// backwards (restart, wrap) yields zero for that direction.
pub fn rate(prev: &Snapshot, curr: &Snapshot) -> Rate {
    let dt = curr.t - prev.t;
    let dt = if dt > 0.0 { dt } else { 1.0 };
    Rate {
        rx_kbps: kbps(curr.rx_bytes.saturating_sub(prev.rx_bytes), dt),
        tx_kbps: kbps(curr.tx_bytes.saturating_sub(prev.tx_bytes), dt),
    }
}

fn kbps(delta_bytes: u64, dt: f64) -> f64 {
    delta_bytes as f64 * 8.0 / dt / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(t: f64, rx: u64, tx: u64) -> Snapshot {
        Snapshot { t, rx_bytes: rx, tx_bytes: tx, ..Default::default() }
    }

    #[test]
    fn bytes_to_kilobits_per_second() {
        // 2048 bytes over 2s = 1024 B/s = 8 kbit/s
        let r = rate(&snap(0.0, 0, 0), &snap(2.0, 2048, 128));
        assert_eq!(r.rx_kbps, 8.0);
        assert_eq!(r.tx_kbps, 0.5);
    }

    #[test]
    fn counter_reset_clamps_to_zero() {
        let r = rate(&snap(0.0, 10_000, 500), &snap(2.0, 10, 900));
        assert_eq!(r.rx_kbps, 0.0);
        assert!(r.tx_kbps > 0.0);
    }

    #[test]
    fn equal_timestamps_use_one_second() {
        let r = rate(&snap(5.0, 0, 0), &snap(5.0, 1024, 1024));
        assert!(r.rx_kbps.is_finite());
        assert_eq!(r.rx_kbps, 8.0);
        assert_eq!(r.tx_kbps, 8.0);
    }

    #[test]
    fn reordered_timestamps_use_one_second() {
        let r = rate(&snap(9.0, 0, 0), &snap(4.0, 128, 0));
        assert_eq!(r.rx_kbps, 1.0);
        assert_eq!(r.tx_kbps, 0.0);
    }
}
