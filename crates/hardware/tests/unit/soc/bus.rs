//! # Cache Bus Tests
//!
//! The bus stamps every request before handing it to the lower level and
//! collects the level's responses.

use std::collections::VecDeque;

use o3sim_core::core::instruction::InstrId;
use o3sim_core::soc::bus::AccessType;
use o3sim_core::soc::{CacheBus, MemPacket};

use crate::common::mocks::memory::MockLevel;

#[test]
fn read_is_stamped_with_core_and_access() {
    let mut level = MockLevel::new();
    let _ = level
        .expect_add_rq()
        .withf(|p| p.address == 0x1040 && p.v_address == 0x1040 && p.cpu == 3 && p.access == AccessType::Load)
        .times(1)
        .return_const(true);

    let mut bus = CacheBus::new(3, Box::new(level));
    let packet = MemPacket::new(0x1040, InstrId(7), 0x400).with_dependents([InstrId(7), InstrId(8)]);
    assert!(bus.issue_read(packet));
}

#[test]
fn write_drops_dependents() {
    let mut level = MockLevel::new();
    let _ = level
        .expect_add_wq()
        .withf(|p| p.access == AccessType::Write && p.instr_depend_on_me.is_empty() && p.instr_id == InstrId(9))
        .times(1)
        .return_const(false);

    let mut bus = CacheBus::new(0, Box::new(level));
    let packet = MemPacket::new(0x2000, InstrId(9), 0x404).with_dependents([InstrId(9)]);
    assert!(!bus.issue_write(packet), "a rejection is reported to the caller");
}

#[test]
fn responses_collect_in_the_processed_queue() {
    let mut level = MockLevel::new();
    let _ = level
        .expect_operate()
        .withf(|cycle, _| *cycle == 5)
        .times(1)
        .returning(|_, returned: &mut VecDeque<MemPacket>| {
            returned.push_back(MemPacket::new(0x40, InstrId(1), 0));
        });

    let mut bus = CacheBus::new(0, Box::new(level));
    bus.operate(5);
    bus.return_data(MemPacket::new(0x80, InstrId(2), 0));

    let ids: Vec<InstrId> = bus.processed().iter().map(|p| p.instr_id).collect();
    assert_eq!(ids, vec![InstrId(1), InstrId(2)]);
    let _ = bus.processed_mut().pop_front();
    assert_eq!(bus.processed().len(), 1);
}

#[test]
fn max_read_comes_from_the_lower_level() {
    let mut level = MockLevel::new();
    let _ = level.expect_max_read().return_const(3_usize);
    let bus = CacheBus::new(0, Box::new(level));
    assert_eq!(bus.max_read(), 3);
}
