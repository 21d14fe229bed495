//! AR0144 register programs.
//!
//! Each program is an ordered batch of 16-bit register writes configuring one
//! functional aspect of the chip. The chip applies them as plain writes, so a
//! program that fails partway through stays partially applied; the runner in
//! [`crate::transport`] surfaces that instead of hiding it.

/// Bus address of the sensor's register interface.
pub const AR0144_I2C_ADDR: u8 = 0x10;

/// Read-only chip version register.
pub const REG_CHIP_VERSION: u16 = 0x3000;
/// Expected value of [`REG_CHIP_VERSION`] for the AR0144.
pub const CHIP_VERSION: u16 = 0x1356;

/// One register write in a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegWrite {
    pub reg: u16,
    pub val: u16,
}

/// An ordered, immutable register write sequence.
#[derive(Debug, Clone, Copy)]
pub struct RegisterProgram {
    pub name: &'static str,
    pub regs: &'static [RegWrite],
}

const fn w(reg: u16, val: u16) -> RegWrite {
    RegWrite { reg, val }
}

/// Vendor-recommended settings for the AT rev4 silicon, applied right after
/// identity verification.
pub const REV4_RECOMMENDED: RegisterProgram = RegisterProgram {
    name: "rev4-recommended",
    regs: &[
        w(0x3ED6, 0x3CB5),
        w(0x3ED8, 0x8765),
        w(0x3EDA, 0x8888),
        w(0x3EDC, 0x97FF),
        w(0x3EF8, 0x6522),
        w(0x3EFA, 0x2222),
        w(0x3EFC, 0x6666),
        w(0x3F00, 0xAA05),
        w(0x3EE2, 0x180E),
        w(0x3EE4, 0x0808),
        w(0x3EEA, 0x2A09),
        w(0x3060, 0x000D),
        w(0x3092, 0x00CF),
        w(0x3268, 0x0030),
        w(0x3786, 0x0060),
        w(0x3F4A, 0x0F70),
        w(0x306E, 0x4810),
        w(0x3064, 0x1802),
        w(0x3EF6, 0x804D),
        w(0x3180, 0xC08F),
        w(0x30BA, 0x7623),
        w(0x3176, 0x0480),
        w(0x3178, 0x0480),
        w(0x317A, 0x0480),
        w(0x317C, 0x0480),
    ],
};

/// PLL configuration for a 27 MHz input clock.
pub const PLL_27MHZ: RegisterProgram = RegisterProgram {
    name: "pll-27mhz",
    regs: &[
        w(0x302A, 0x0006),
        w(0x302C, 0x0001),
        w(0x302E, 0x0004),
        w(0x3030, 0x0042),
        w(0x3036, 0x000C),
        w(0x3038, 0x0001),
    ],
};

/// MIPI serial output, two lanes, 12-bit depth. Lane timing derives from the
/// PLL output, so [`PLL_27MHZ`] must have been applied and locked first.
pub const MIPI_2LANE_12BIT: RegisterProgram = RegisterProgram {
    name: "mipi-2lane-12bit",
    regs: &[
        w(0x31AE, 0x0202),
        w(0x31AC, 0x0C0C),
        w(0x31B0, 0x0042),
        w(0x31B2, 0x002E),
        w(0x31B4, 0x1665),
        w(0x31B6, 0x110E),
        w(0x31B8, 0x2047),
        w(0x31BA, 0x0105),
        w(0x31BC, 0x0004),
    ],
};

/// Readout window and frame timing for 1280x800 at 60 fps.
pub const RES_1280X800_60FPS: RegisterProgram = RegisterProgram {
    name: "1280x800-60fps",
    regs: &[
        w(0x3002, 0x0000),
        w(0x3004, 0x0004),
        w(0x3006, 0x031F),
        w(0x3008, 0x0503),
        w(0x300A, 0x0339),
        w(0x300C, 0x05D0),
        w(0x3012, 0x0064),
        w(0x30A2, 0x0001),
        w(0x30A6, 0x0001),
        w(0x3040, 0x0000),
    ],
};

/// 2x2 binning for readout context B. Note the two staged writes to the
/// read-mode register 0x3040.
pub const CONTEXT_B_2X2_BINNING: RegisterProgram = RegisterProgram {
    name: "context-b-2x2-binning",
    regs: &[
        w(0x3040, 0x1000),
        w(0x30A8, 0x0003),
        w(0x3040, 0x3000),
        w(0x30AE, 0x0003),
    ],
};

/// Enable embedded data and statistics rows. Alters the per-frame line
/// counts, so it must precede [`START_STREAM`].
pub const EMBEDDED_DATA_STATS: RegisterProgram = RegisterProgram {
    name: "embedded-data-stats",
    regs: &[w(0x3064, 0x1982)],
};

/// Begin video output.
pub const START_STREAM: RegisterProgram = RegisterProgram {
    name: "start-stream",
    regs: &[w(0x3028, 0x0010), w(0x301A, 0x005C)],
};

/// Return to idle (soft standby).
pub const STOP_STREAM: RegisterProgram = RegisterProgram {
    name: "stop-stream",
    regs: &[w(0x301A, 0x0058)],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_lengths() {
        assert_eq!(REV4_RECOMMENDED.regs.len(), 25);
        assert_eq!(PLL_27MHZ.regs.len(), 6);
        assert_eq!(MIPI_2LANE_12BIT.regs.len(), 9);
        assert_eq!(RES_1280X800_60FPS.regs.len(), 10);
        assert_eq!(CONTEXT_B_2X2_BINNING.regs.len(), 4);
        assert_eq!(EMBEDDED_DATA_STATS.regs.len(), 1);
        assert_eq!(START_STREAM.regs.len(), 2);
        assert_eq!(STOP_STREAM.regs.len(), 1);
    }

    #[test]
    fn test_stream_commands_toggle_reset_register() {
        // Start and stop differ only in the streaming bit of 0x301A.
        assert_eq!(START_STREAM.regs[1].reg, 0x301A);
        assert_eq!(START_STREAM.regs[1].val, 0x005C);
        assert_eq!(STOP_STREAM.regs[0].reg, 0x301A);
        assert_eq!(STOP_STREAM.regs[0].val, 0x0058);
    }

    #[test]
    fn test_binning_stages_read_mode_writes() {
        // The read-mode register is written twice, in order, with the
        // context-B bit set before the binning enable completes.
        let stages: Vec<_> = CONTEXT_B_2X2_BINNING
            .regs
            .iter()
            .filter(|e| e.reg == 0x3040)
            .map(|e| e.val)
            .collect();
        assert_eq!(stages, vec![0x1000, 0x3000]);
    }
}
