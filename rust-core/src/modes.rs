//! SSTV modes
//!
//! Only what the demodulator needs to know about a mode lives here; line
//! timing and color layout belong to the image assembler.

/// Transmission modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SstvMode {
    Martin1,
    Martin2,
    Martin3,
    Martin4,
    Scottie1,
    Scottie2,
    ScottieDx,
    Robot72,
    Robot36,
    Robot24,
    Robot24Bw,
    Robot12Bw,
    Robot8Bw,
    Pd50,
    Pd90,
    Pd120,
    Pd160,
    Pd180,
    Pd240,
    Pd290,
    Pasokon3,
    Pasokon5,
    Pasokon7,
    Wraase2120,
    Wraase2180,
}

impl SstvMode {
    pub fn name(&self) -> &'static str {
        match self {
            SstvMode::Martin1 => "Martin M1",
            SstvMode::Martin2 => "Martin M2",
            SstvMode::Martin3 => "Martin M3",
            SstvMode::Martin4 => "Martin M4",
            SstvMode::Scottie1 => "Scottie S1",
            SstvMode::Scottie2 => "Scottie S2",
            SstvMode::ScottieDx => "Scottie DX",
            SstvMode::Robot72 => "Robot 72",
            SstvMode::Robot36 => "Robot 36",
            SstvMode::Robot24 => "Robot 24",
            SstvMode::Robot24Bw => "Robot 24 B/W",
            SstvMode::Robot12Bw => "Robot 12 B/W",
            SstvMode::Robot8Bw => "Robot 8 B/W",
            SstvMode::Pd50 => "PD-50",
            SstvMode::Pd90 => "PD-90",
            SstvMode::Pd120 => "PD-120",
            SstvMode::Pd160 => "PD-160",
            SstvMode::Pd180 => "PD-180",
            SstvMode::Pd240 => "PD-240",
            SstvMode::Pd290 => "PD-290",
            SstvMode::Pasokon3 => "Pasokon P3",
            SstvMode::Pasokon5 => "Pasokon P5",
            SstvMode::Pasokon7 => "Pasokon P7",
            SstvMode::Wraase2120 => "Wraase SC-2 120",
            SstvMode::Wraase2180 => "Wraase SC-2 180",
        }
    }

    /// Whether the Dolph-Chebyshev window is allowed at high SNR
    ///
    /// PD-180 and Scottie DX are excluded; their images come out worse with it.
    pub fn allows_chebyshev_window(&self) -> bool {
        !matches!(self, SstvMode::Pd180 | SstvMode::ScottieDx)
    }
}

impl std::fmt::Display for SstvMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
