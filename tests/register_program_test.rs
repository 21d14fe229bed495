//! Register transport and program runner tests: wire frame layout, read
//! composition and the stop-on-first-failure contract.

use ar0144::mock::{EventLog, MockBus};
use ar0144::sequence;
use ar0144::{BusDirection, RegisterTransport};

#[test]
fn test_write_reg_frame_layout() {
    let log = EventLog::new();
    let bus = MockBus::new(&log);
    let frames = bus.sent_frames.clone();
    let mut transport = RegisterTransport::new(bus);

    transport.write_reg(0x301A, 0x0058).expect("write");

    // One 4-byte frame: address high/low, value high/low.
    assert_eq!(frames.lock().unwrap().clone(), vec![vec![0x30, 0x1A, 0x00, 0x58]]);
}

#[test]
fn test_read_reg_sends_address_then_composes_big_endian() {
    let log = EventLog::new();
    let bus = MockBus::new(&log);
    let frames = bus.sent_frames.clone();
    bus.queue_read_value(0x1356);
    let mut transport = RegisterTransport::new(bus);

    let val = transport.read_reg(0x3000).expect("read");
    assert_eq!(val, 0x1356);
    // The address prelude is its own 2-byte frame.
    assert_eq!(frames.lock().unwrap().clone(), vec![vec![0x30, 0x00]]);
}

#[test]
fn test_read_failure_carries_address_and_direction() {
    let log = EventLog::new();
    let bus = MockBus::new(&log);
    bus.set_read_error(true);
    let mut transport = RegisterTransport::new(bus);

    let err = transport.read_reg(sequence::REG_CHIP_VERSION).unwrap_err();
    assert_eq!(err.reg, sequence::REG_CHIP_VERSION);
    assert_eq!(err.dir, BusDirection::Read);
}

#[test]
fn test_apply_program_writes_all_entries_in_order() {
    let log = EventLog::new();
    let bus = MockBus::new(&log);
    let mut transport = RegisterTransport::new(bus);

    transport
        .apply_program(sequence::PLL_27MHZ)
        .expect("apply program");

    let expected: Vec<(u16, u16)> = sequence::PLL_27MHZ
        .regs
        .iter()
        .map(|e| (e.reg, e.val))
        .collect();
    assert_eq!(log.writes(), expected);
}

#[test]
fn test_apply_program_stops_at_the_failing_entry() {
    // Four-entry program, entry index 2 NACKs: exactly three writes reach
    // the bus and the error names the entry.
    let program = sequence::CONTEXT_B_2X2_BINNING;
    assert_eq!(program.regs.len(), 4);

    let log = EventLog::new();
    let bus = MockBus::new(&log);
    bus.fail_write_at(2);
    let mut transport = RegisterTransport::new(bus);

    let err = transport.apply_program(program).unwrap_err();
    assert_eq!(err.name, program.name);
    assert_eq!(err.index, 2);
    assert_eq!(err.source.reg, program.regs[2].reg);
    assert_eq!(err.source.dir, BusDirection::Write);

    let writes = log.writes();
    assert_eq!(writes.len(), 3);
    // Entries before the failure are applied; the one after it never was.
    assert_eq!(writes[0], (program.regs[0].reg, program.regs[0].val));
    assert_eq!(writes[1], (program.regs[1].reg, program.regs[1].val));
    assert!(!writes.contains(&(program.regs[3].reg, program.regs[3].val)));
}
