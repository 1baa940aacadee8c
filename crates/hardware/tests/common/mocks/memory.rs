use std::collections::VecDeque;

use mockall::mock;
use o3sim_core::soc::{LowerLevel, MemPacket};

mock! {
    pub Level {}
    impl LowerLevel for Level {
        fn max_read(&self) -> usize;
        fn add_rq(&mut self, packet: MemPacket) -> bool;
        fn add_wq(&mut self, packet: MemPacket) -> bool;
        fn operate(&mut self, cycle: u64, returned: &mut VecDeque<MemPacket>);
    }
}
