//! SSTV tone frequencies in Hz

/// Lowest frequency of interest
pub const FREQ_MIN: f64 = 500.0;

/// Highest frequency of interest
pub const FREQ_MAX: f64 = 3300.0;

/// Video level 0
pub const FREQ_BLACK: f64 = 1500.0;

/// Video level 255
pub const FREQ_WHITE: f64 = 2300.0;

/// Line sync pulse, leader break and VIS start/stop bits
pub const FREQ_SYNC: f64 = 1200.0;

/// Calibration leader tone
pub const FREQ_LEADER: f64 = 1900.0;
