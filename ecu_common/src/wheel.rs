//! Trigger-wheel pattern constants.
//!
//! Two physical wheels are supported, chosen at configuration time
//! (the original chooses at compile/config time; here it's a runtime
//! enum read from TOML, since nothing about the decoder's arithmetic
//! actually requires a compile-time choice).

use std::fmt;

/// Which physical trigger wheel is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelPattern {
    /// 36 nominal 10° teeth, three pairs of missing teeth (Subaru-style).
    Subaru3622,
    /// 60 nominal 6° teeth, one pair of missing teeth (Hyundai-style).
    Hyundai602,
}

/// Per-wheel constants the decoder and angle table need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelConstants {
    /// Total nominal tooth count around one crank revolution (includes
    /// the missing slots).
    pub tooth_count: u16,
    /// Number of teeth physically missing (fiducial gap width).
    pub missing: u16,
    /// Angular distance between consecutive teeth, in degrees.
    pub resolution_deg: u16,
    /// Minimum accepted tooth period, microseconds.
    pub min_period_us: u16,
    /// Maximum accepted tooth period, microseconds.
    pub max_period_us: u32,
    /// `average` threshold above which the engine is still considered
    /// cranking rather than running, once in the main ticker state.
    pub average_run_period_us: u16,
    /// Minimum number of stable samples required in the debounce state.
    pub min_sample: u16,
}

impl WheelPattern {
    /// Look up this pattern's constants.
    pub const fn constants(self) -> WheelConstants {
        match self {
            // 36-2-2-2: 10us/tooth nominal, 277us..41664us (3 * 13888).
            WheelPattern::Subaru3622 => WheelConstants {
                tooth_count: 36,
                missing: 6, // three pairs of missing teeth
                resolution_deg: 10,
                min_period_us: 277,
                max_period_us: 3 * 13_888,
                average_run_period_us: 4_000,
                min_sample: 10,
            },
            // 60-2: 6deg/tooth, 166us..125000us.
            WheelPattern::Hyundai602 => WheelConstants {
                tooth_count: 60,
                missing: 2,
                resolution_deg: 6,
                min_period_us: 166,
                max_period_us: 125_000,
                average_run_period_us: 2_000,
                min_sample: 10,
            },
        }
    }

    /// Number of angle-event-table slots for this wheel: `720 / resolution`
    /// (a 72-slot ring for a 10deg wheel, 120 for a 6deg wheel). See
    /// DESIGN.md for why this formula is applied uniformly to both
    /// wheels rather than reading "60 slots" as the table size for the
    /// 60-2 wheel — here that number names the wheel's own tooth count,
    /// not the angle-table size.
    pub const fn event_table_size(self) -> usize {
        (720 / self.constants().resolution_deg) as usize
    }

    /// Teeth actually present per crank revolution (720°), i.e. nominal
    /// count minus the missing fiducial teeth.
    pub const fn teeth_per_rev(self) -> u16 {
        self.constants().tooth_count - self.constants().missing
    }

    /// Tooth-counter values (1-based, post-wrap) at which the decoder's
    /// main ticker state expects a missing-tooth (long) period.
    pub fn missing_positions(self) -> &'static [u16] {
        match self {
            WheelPattern::Subaru3622 => &[11, 14, 29],
            // Single recurring fiducial, detected right after the wrap
            // back to tooth 1 (tooth_ctr := 1 on the gap).
            WheelPattern::Hyundai602 => &[1],
        }
    }
}

impl fmt::Display for WheelPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WheelPattern::Subaru3622 => f.write_str("36-2-2-2"),
            WheelPattern::Hyundai602 => f.write_str("60-2"),
        }
    }
}
